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

//! Provides the public, backend-agnostic buffer contracts used by the parameter system.
//!
//! This module defines the "common language" between the constant-buffer pool and
//! whatever graphics backend actually owns GPU memory. It contains the abstract
//! [`GraphicsDevice`] trait, the data structures passed across it (like
//! [`BufferDescriptor`] and [`MappedSpan`]), and the [`ResourceError`] type.
//!
//! This module defines the 'what' of buffer management, while the 'how' is handled
//! by a concrete device implementation in the `pallas-infra` crate.

pub mod api;
pub mod error;
pub mod traits;

// Re-export the most important traits and types for easier use.
pub use self::api::*;
pub use self::error::ResourceError;
pub use self::traits::GraphicsDevice;
