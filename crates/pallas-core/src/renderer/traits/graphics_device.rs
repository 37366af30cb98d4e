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

use crate::renderer::api::{BufferDescriptor, BufferId, MappedSpan};
use crate::renderer::error::ResourceError;
use std::fmt::Debug;

/// The buffer half of a graphics device, as seen by the constant-buffer pool.
///
/// Implementations own the actual GPU (or host) memory. The pool only ever
/// creates constant buffers, keeps them mapped for their whole pooled lifetime,
/// and destroys them on shutdown.
pub trait GraphicsDevice: Send + Sync + Debug + 'static {
    /// Creates a new GPU buffer.
    /// ## Arguments
    /// * `descriptor` - The buffer's label, size and usage.
    /// ## Returns
    /// The ID of the created buffer.
    /// ## Errors
    /// * `ResourceError::OutOfMemory` - If the device cannot back the allocation.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError>;

    /// Destroys a GPU buffer, unmapping it first if needed.
    /// Any [`MappedSpan`] previously returned for it becomes dangling.
    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError>;

    /// Maps a buffer for CPU writes.
    /// ## Returns
    /// A span over the whole buffer, valid until [`unmap_buffer`](Self::unmap_buffer)
    /// or [`destroy_buffer`](Self::destroy_buffer) is called for `id`.
    /// ## Errors
    /// * `ResourceError::InvalidHandle` - If `id` does not name a live buffer.
    /// * `ResourceError::AlreadyMapped` - If the buffer is already mapped.
    fn map_buffer(&self, id: BufferId) -> Result<MappedSpan, ResourceError>;

    /// Unmaps a buffer previously mapped with [`map_buffer`](Self::map_buffer).
    fn unmap_buffer(&self, id: BufferId) -> Result<(), ResourceError>;

    /// Sets the debug label of a buffer. Diagnostic only; never fails.
    fn set_buffer_label(&self, id: BufferId, label: &str);

    /// Returns the size of a buffer in bytes.
    fn buffer_size(&self, id: BufferId) -> Result<u64, ResourceError>;
}
