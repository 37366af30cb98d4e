// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Per-frame pooling of constant buffers.
//!
//! ```text
//! Frame N:     [Slot 0: active]   leased, written, released into its freed list
//! Frame N+1:   [Slot 1: active]   the GPU is still reading slot 0
//! Frame N+2:   [Slot 0: active]   freed list recycled, GPU finished with it
//! ```
//!
//! A buffer only becomes reusable when the slot it was leased from comes back
//! around, which is what keeps CPU writes from racing GPU reads.

mod buffer_pool;
mod frame_slot;
mod settings;
mod stats;

pub use self::buffer_pool::{BufferLease, ConstantBufferPool};
pub use self::frame_slot::SlotCounts;
pub use self::settings::{PoolSettings, SettingsError};
pub use self::stats::PoolStats;
