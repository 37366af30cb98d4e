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

//! Handles into bindless resource heaps.

use serde::{Deserialize, Serialize};

/// An index into a bindless descriptor heap, passed to shaders as plain data.
///
/// The shader reads it back as a 32-bit unsigned integer and uses it to index
/// the heap, so it is copied into constant buffers without any conversion.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    bytemuck::Pod,
    bytemuck::Zeroable,
    Serialize,
    Deserialize,
)]
#[repr(transparent)]
pub struct BindlessHandle(pub u32);

impl BindlessHandle {
    /// The handle shaders treat as "no resource bound".
    pub const INVALID: Self = Self(u32::MAX);

    /// Returns `true` unless this is [`BindlessHandle::INVALID`].
    pub const fn is_valid(&self) -> bool {
        self.0 != u32::MAX
    }
}
