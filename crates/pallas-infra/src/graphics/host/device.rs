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

use pallas_core::renderer::{
    BufferDescriptor, BufferId, BufferUsage, GraphicsDevice, MappedSpan, ResourceError,
};
use std::collections::HashMap;
use std::fmt;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Zero-initialized heap memory backing one host buffer.
///
/// Held as a raw pointer so spans handed out by `map_buffer` stay valid while
/// the device keeps touching its own bookkeeping.
struct HostAllocation {
    ptr: NonNull<u8>,
    len: usize,
}

// SAFETY: the allocation is plain bytes owned by the device; access is
// serialized by the device's buffer lock or by the mapping contract.
unsafe impl Send for HostAllocation {}
unsafe impl Sync for HostAllocation {}

impl HostAllocation {
    fn zeroed(len: usize) -> Self {
        let memory: &'static mut [u8] = Box::leak(vec![0u8; len].into_boxed_slice());
        Self {
            ptr: NonNull::from(memory).cast::<u8>(),
            len,
        }
    }

    fn to_vec(&self) -> Vec<u8> {
        // SAFETY: `ptr` covers `len` initialized bytes for the allocation's lifetime.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }.to_vec()
    }
}

impl Drop for HostAllocation {
    fn drop(&mut self) {
        // SAFETY: `ptr`/`len` come from the leaked boxed slice in `zeroed`.
        unsafe {
            drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                self.ptr.as_ptr(),
                self.len,
            )));
        }
    }
}

struct HostBuffer {
    allocation: HostAllocation,
    label: Option<String>,
    usage: BufferUsage,
    mapped: bool,
}

/// A [`GraphicsDevice`] that allocates buffers on the heap.
///
/// Mapping a buffer hands out a span over its memory, which stays valid until
/// the buffer is destroyed. An optional byte budget makes `create_buffer` fail
/// with [`ResourceError::OutOfMemory`] once exceeded, which is how device
/// exhaustion is simulated.
pub struct HostGraphicsDevice {
    buffers: Mutex<HashMap<BufferId, HostBuffer>>,
    next_buffer_id: AtomicUsize,
    budget: Option<u64>,
    allocated_bytes: AtomicU64,
    peak_allocated_bytes: AtomicU64,
    buffers_created: AtomicUsize,
    fail_next_map: AtomicBool,
}

impl HostGraphicsDevice {
    /// Creates a device with unlimited memory.
    pub fn new() -> Self {
        Self {
            buffers: Mutex::new(HashMap::new()),
            next_buffer_id: AtomicUsize::new(0),
            budget: None,
            allocated_bytes: AtomicU64::new(0),
            peak_allocated_bytes: AtomicU64::new(0),
            buffers_created: AtomicUsize::new(0),
            fail_next_map: AtomicBool::new(false),
        }
    }

    /// Creates a device that can hold at most `bytes` of live buffers.
    pub fn with_budget(bytes: u64) -> Self {
        let mut device = Self::new();
        device.budget = Some(bytes);
        device
    }

    /// Makes the next `map_buffer` call fail with a backend error.
    pub fn fail_next_map(&self) {
        self.fail_next_map.store(true, Ordering::Relaxed);
    }

    /// Copies the current contents of a buffer.
    ///
    /// Must not race with writes through a mapped span.
    pub fn read_buffer(&self, id: BufferId) -> Result<Vec<u8>, ResourceError> {
        let buffers = self.buffers();
        let buffer = buffers.get(&id).ok_or(ResourceError::InvalidHandle(id))?;
        Ok(buffer.allocation.to_vec())
    }

    /// Returns the debug label of a live buffer.
    pub fn buffer_label(&self, id: BufferId) -> Option<String> {
        self.buffers().get(&id).and_then(|b| b.label.clone())
    }

    /// Returns `true` if the buffer is live and mapped.
    pub fn is_mapped(&self, id: BufferId) -> bool {
        self.buffers().get(&id).is_some_and(|b| b.mapped)
    }

    /// Returns the number of buffers not yet destroyed.
    pub fn live_buffer_count(&self) -> usize {
        self.buffers().len()
    }

    /// Returns the bytes held by live buffers.
    pub fn allocated_bytes(&self) -> u64 {
        self.allocated_bytes.load(Ordering::Relaxed)
    }

    /// Returns the highest value [`allocated_bytes`](Self::allocated_bytes) reached.
    pub fn peak_allocated_bytes(&self) -> u64 {
        self.peak_allocated_bytes.load(Ordering::Relaxed)
    }

    /// Returns how many buffers were ever created.
    pub fn buffers_created(&self) -> usize {
        self.buffers_created.load(Ordering::Relaxed)
    }

    /// Returns the memory budget, if any.
    pub fn budget(&self) -> Option<u64> {
        self.budget
    }

    fn buffers(&self) -> MutexGuard<'_, HashMap<BufferId, HostBuffer>> {
        self.buffers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn generate_buffer_id(&self) -> BufferId {
        BufferId(self.next_buffer_id.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for HostGraphicsDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsDevice for HostGraphicsDevice {
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        if descriptor.size == 0 {
            return Err(ResourceError::InvalidDescriptor(format!(
                "buffer '{}' has zero size",
                descriptor.label.as_deref().unwrap_or_default()
            )));
        }

        let mut buffers = self.buffers();
        let allocated = self.allocated_bytes.load(Ordering::Relaxed);
        if let Some(budget) = self.budget {
            let available = budget.saturating_sub(allocated);
            if descriptor.size > available {
                log::warn!(
                    "HostGraphicsDevice: budget exhausted creating '{}' ({} bytes, {} available)",
                    descriptor.label.as_deref().unwrap_or_default(),
                    descriptor.size,
                    available
                );
                return Err(ResourceError::OutOfMemory {
                    requested: descriptor.size,
                    available,
                });
            }
        }
        let len = usize::try_from(descriptor.size).map_err(|_| ResourceError::OutOfMemory {
            requested: descriptor.size,
            available: usize::MAX as u64,
        })?;

        let id = self.generate_buffer_id();
        buffers.insert(
            id,
            HostBuffer {
                allocation: HostAllocation::zeroed(len),
                label: descriptor.label.as_ref().map(|s| s.to_string()),
                usage: descriptor.usage,
                mapped: false,
            },
        );

        let current = allocated + descriptor.size;
        self.allocated_bytes.store(current, Ordering::Relaxed);
        self.peak_allocated_bytes
            .fetch_max(current, Ordering::Relaxed);
        self.buffers_created.fetch_add(1, Ordering::Relaxed);

        log::info!(
            "HostGraphicsDevice: Created buffer '{}' with ID: {}, size: {} bytes",
            descriptor.label.as_deref().unwrap_or_default(),
            id,
            descriptor.size
        );
        Ok(id)
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        let entry = self
            .buffers()
            .remove(&id)
            .ok_or(ResourceError::InvalidHandle(id))?;
        self.allocated_bytes
            .fetch_sub(entry.allocation.len as u64, Ordering::Relaxed);
        log::debug!("HostGraphicsDevice: Destroyed buffer {id}");
        Ok(())
    }

    fn map_buffer(&self, id: BufferId) -> Result<MappedSpan, ResourceError> {
        let mut buffers = self.buffers();
        let buffer = buffers
            .get_mut(&id)
            .ok_or(ResourceError::InvalidHandle(id))?;

        if self.fail_next_map.swap(false, Ordering::Relaxed) {
            return Err(ResourceError::BackendError(format!(
                "mapping {id} failed"
            )));
        }
        if !buffer
            .usage
            .contains(BufferUsage::MAP_WRITE)
            && !buffer.usage.contains(BufferUsage::MAP_READ)
        {
            return Err(ResourceError::InvalidDescriptor(format!(
                "{id} was not created with a map usage"
            )));
        }
        if buffer.mapped {
            return Err(ResourceError::AlreadyMapped(id));
        }

        buffer.mapped = true;
        // SAFETY: the allocation outlives the span until `destroy_buffer`, and
        // only one span exists per mapping.
        Ok(unsafe { MappedSpan::from_raw_parts(buffer.allocation.ptr, buffer.allocation.len) })
    }

    fn unmap_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        let mut buffers = self.buffers();
        let buffer = buffers
            .get_mut(&id)
            .ok_or(ResourceError::InvalidHandle(id))?;
        if !buffer.mapped {
            return Err(ResourceError::NotMapped(id));
        }
        buffer.mapped = false;
        Ok(())
    }

    fn set_buffer_label(&self, id: BufferId, label: &str) {
        match self.buffers().get_mut(&id) {
            Some(buffer) => buffer.label = Some(label.to_owned()),
            None => log::warn!("HostGraphicsDevice: cannot label unknown buffer {id}"),
        }
    }

    fn buffer_size(&self, id: BufferId) -> Result<u64, ResourceError> {
        self.buffers()
            .get(&id)
            .map(|b| b.allocation.len as u64)
            .ok_or(ResourceError::InvalidHandle(id))
    }
}

impl fmt::Debug for HostGraphicsDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostGraphicsDevice")
            .field("live_buffers", &self.live_buffer_count())
            .field("allocated_bytes", &self.allocated_bytes())
            .field("budget", &self.budget)
            .finish()
    }
}

impl Drop for HostGraphicsDevice {
    fn drop(&mut self) {
        let buffers = self.buffers.get_mut().unwrap_or_else(PoisonError::into_inner);
        if !buffers.is_empty() {
            log::warn!(
                "HostGraphicsDevice: {} buffers were never destroyed",
                buffers.len()
            );
            buffers.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(size: u64) -> BufferDescriptor<'static> {
        BufferDescriptor::constant("Test", size)
    }

    #[test]
    fn create_map_write_read() {
        let device = HostGraphicsDevice::new();
        let id = device.create_buffer(&constant(32)).unwrap();
        assert_eq!(device.buffer_size(id).unwrap(), 32);
        assert_eq!(device.read_buffer(id).unwrap(), vec![0u8; 32]);

        let mut span = device.map_buffer(id).unwrap();
        assert!(device.is_mapped(id));
        span.write(4, &[1, 2, 3]);

        let bytes = device.read_buffer(id).unwrap();
        assert_eq!(&bytes[4..7], &[1, 2, 3]);

        device.unmap_buffer(id).unwrap();
        device.destroy_buffer(id).unwrap();
        assert_eq!(device.live_buffer_count(), 0);
    }

    #[test]
    fn map_errors() {
        let device = HostGraphicsDevice::new();
        let id = device.create_buffer(&constant(16)).unwrap();

        assert_eq!(device.unmap_buffer(id), Err(ResourceError::NotMapped(id)));
        let _span = device.map_buffer(id).unwrap();
        assert!(matches!(
            device.map_buffer(id),
            Err(ResourceError::AlreadyMapped(found)) if found == id
        ));

        let storage = BufferDescriptor {
            label: None,
            size: 16,
            usage: BufferUsage::STORAGE,
        };
        let unmappable = device.create_buffer(&storage).unwrap();
        assert!(matches!(
            device.map_buffer(unmappable),
            Err(ResourceError::InvalidDescriptor(_))
        ));

        device.destroy_buffer(id).unwrap();
        device.destroy_buffer(unmappable).unwrap();
        assert!(matches!(
            device.map_buffer(id),
            Err(ResourceError::InvalidHandle(_))
        ));
    }

    #[test]
    fn injected_map_failure_fires_once() {
        let device = HostGraphicsDevice::new();
        let id = device.create_buffer(&constant(16)).unwrap();
        device.fail_next_map();
        assert!(matches!(
            device.map_buffer(id),
            Err(ResourceError::BackendError(_))
        ));
        assert!(device.map_buffer(id).is_ok());
        device.destroy_buffer(id).unwrap();
    }

    #[test]
    fn zero_size_is_rejected() {
        let device = HostGraphicsDevice::new();
        assert!(matches!(
            device.create_buffer(&constant(0)),
            Err(ResourceError::InvalidDescriptor(_))
        ));
        assert_eq!(device.buffers_created(), 0);
    }

    #[test]
    fn budget_and_byte_accounting() {
        let device = HostGraphicsDevice::with_budget(100);
        let a = device.create_buffer(&constant(64)).unwrap();
        assert_eq!(
            device.create_buffer(&constant(64)),
            Err(ResourceError::OutOfMemory {
                requested: 64,
                available: 36,
            })
        );
        let b = device.create_buffer(&constant(36)).unwrap();
        assert_eq!(device.allocated_bytes(), 100);

        device.destroy_buffer(a).unwrap();
        assert_eq!(device.allocated_bytes(), 36);
        assert_eq!(device.peak_allocated_bytes(), 100);
        assert_eq!(device.buffers_created(), 2);
        device.destroy_buffer(b).unwrap();
    }

    #[test]
    fn labels_follow_renames() {
        let device = HostGraphicsDevice::new();
        let id = device.create_buffer(&constant(16)).unwrap();
        assert_eq!(device.buffer_label(id).as_deref(), Some("Test"));
        device.set_buffer_label(id, "Renamed");
        assert_eq!(device.buffer_label(id).as_deref(), Some("Renamed"));
        device.destroy_buffer(id).unwrap();
        assert_eq!(device.buffer_label(id), None);
    }
}
