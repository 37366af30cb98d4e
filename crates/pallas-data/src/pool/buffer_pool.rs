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

//! The frame-slotted constant-buffer pool.

use super::frame_slot::{FrameSlotPool, PooledBuffer, SlotCounts};
use super::settings::PoolSettings;
use super::stats::PoolStats;
use crate::params::{LayoutRegistry, ParameterLayout, ShaderParameters, CONSTANT_REGISTER_SIZE};
use pallas_core::renderer::{
    BufferDescriptor, BufferId, GraphicsDevice, MappedSpan, ResourceError,
};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Temporary ownership of one pooled buffer.
///
/// A lease remembers the slot it was drawn from and must be handed back with
/// [`ConstantBufferPool::release`]; [`ParameterSet`](crate::ParameterSet) does
/// that automatically. Leases cannot be cloned.
///
/// The lease shares ownership of its buffer with the pool, so the mapping stays
/// valid even if the pool shuts down first.
#[derive(Debug)]
pub struct BufferLease {
    buffer: BufferId,
    slot: usize,
    index: usize,
    capacity: u64,
    issued_frame: u64,
    generation: u64,
    mapping: MappedSpan,
    memory: Rc<PooledBuffer>,
}

impl BufferLease {
    /// Returns the leased buffer.
    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    /// Returns the frame slot the buffer belongs to.
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Returns the buffer's index within its slot.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the real size of the buffer, which may exceed the requested size.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Returns the pool frame counter at the time of the lease.
    pub fn issued_frame(&self) -> u64 {
        self.issued_frame
    }

    /// Returns the buffer's mapped memory.
    pub fn mapping(&self) -> &MappedSpan {
        &self.mapping
    }

    /// Returns the buffer's mapped memory for writing.
    pub fn mapping_mut(&mut self) -> &mut MappedSpan {
        &mut self.mapping
    }
}

#[derive(Debug)]
struct PoolState {
    device: Arc<dyn GraphicsDevice>,
    settings: PoolSettings,
    slots: Vec<FrameSlotPool>,
    active: usize,
    frame: u64,
    generation: u64,
    initialized: bool,
    stats: PoolStats,
}

impl PoolState {
    fn setup(&mut self, settings: &PoolSettings) {
        assert!(
            settings.frames_in_flight > 0,
            "ConstantBufferPool: frames_in_flight must be at least 1"
        );
        self.settings = settings.clone();
        self.slots = (0..settings.frames_in_flight)
            .map(FrameSlotPool::new)
            .collect();
        self.active = 0;
        self.initialized = true;
        log::info!(
            "ConstantBufferPool({}): initialized with {} frame slots",
            self.settings.label_prefix,
            self.slots.len()
        );
    }

    fn assert_initialized(&self, operation: &str) {
        assert!(
            self.initialized,
            "ConstantBufferPool({}): {} on an uninitialized pool",
            self.settings.label_prefix, operation
        );
    }

    fn debug_name(&self, slot: usize, label: &str) -> String {
        format!("{}[{}] {}", self.settings.label_prefix, slot, label)
    }

    fn create_buffer(&self, size: u64, name: String) -> Result<PooledBuffer, ResourceError> {
        let id = self
            .device
            .create_buffer(&BufferDescriptor::constant(name, size))?;

        let mapped = self
            .device
            .buffer_size(id)
            .and_then(|capacity| Ok((capacity, self.device.map_buffer(id)?)));
        match mapped {
            Ok((capacity, mapping)) => Ok(PooledBuffer::new(
                Arc::clone(&self.device),
                id,
                capacity,
                mapping,
            )),
            Err(e) => {
                if let Err(destroy_err) = self.device.destroy_buffer(id) {
                    log::warn!(
                        "ConstantBufferPool({}): Failed to destroy half-created buffer {}: {}",
                        self.settings.label_prefix,
                        id,
                        destroy_err
                    );
                }
                Err(e)
            }
        }
    }

    /// Lets go of every buffer and leaves the pool uninitialized.
    ///
    /// Buffers nobody else holds are unmapped and destroyed here. Buffers still
    /// held by a lease are destroyed when that lease is dropped.
    fn teardown(&mut self) {
        let mut destroyed = 0usize;
        let mut deferred = 0usize;
        for slot in &mut self.slots {
            slot.check_consistency();
            let counts = slot.counts();
            if counts.leased > 0 {
                log::warn!(
                    "ConstantBufferPool({}): shutting down with {} buffers still leased",
                    self.settings.label_prefix,
                    counts.leased
                );
            }
            for buffer in slot.drain_buffers() {
                if Rc::strong_count(&buffer) > 1 {
                    deferred += 1;
                } else {
                    destroyed += 1;
                }
            }
        }
        self.slots.clear();
        self.initialized = false;
        self.generation += 1;
        log::info!(
            "ConstantBufferPool({}): shut down, {} buffers destroyed, {} deferred until released",
            self.settings.label_prefix,
            destroyed,
            deferred
        );
    }
}

impl Drop for PoolState {
    fn drop(&mut self) {
        if self.initialized {
            log::warn!(
                "ConstantBufferPool({}): dropped without shutdown, releasing buffers now",
                self.settings.label_prefix
            );
            self.teardown();
        }
    }
}

/// A pool of constant buffers partitioned into frame slots.
///
/// The pool is a cheap, clonable handle; clones share the same state. It is
/// meant to live on the render-submission thread and is neither `Send` nor
/// `Sync`. No operation blocks.
///
/// Each frame:
/// 1. lease buffers (usually through [`ParameterSet`](crate::ParameterSet)) and write them,
/// 2. release them once the frame no longer needs them,
/// 3. call [`advance_slot`](Self::advance_slot) once the GPU is done with the
///    slot about to become active.
#[derive(Clone)]
pub struct ConstantBufferPool {
    state: Rc<RefCell<PoolState>>,
    layouts: Rc<LayoutRegistry>,
}

impl ConstantBufferPool {
    /// Creates a pool with `settings.frames_in_flight` empty frame slots.
    ///
    /// # Panics
    ///
    /// Panics if `settings.frames_in_flight` is zero.
    pub fn new(device: Arc<dyn GraphicsDevice>, settings: &PoolSettings) -> Self {
        let mut state = PoolState {
            device,
            settings: settings.clone(),
            slots: Vec::new(),
            active: 0,
            frame: 0,
            generation: 0,
            initialized: false,
            stats: PoolStats::default(),
        };
        state.setup(settings);
        Self {
            state: Rc::new(RefCell::new(state)),
            layouts: Rc::new(LayoutRegistry::new()),
        }
    }

    /// Re-initializes a pool after [`shutdown`](Self::shutdown).
    ///
    /// Calling this on a pool that is already initialized logs a warning and
    /// keeps the current slots and settings.
    pub fn init(&self, settings: &PoolSettings) {
        let mut state = self.state.borrow_mut();
        if state.initialized {
            log::warn!(
                "ConstantBufferPool({}): init called on an initialized pool, keeping {} slots",
                state.settings.label_prefix,
                state.slots.len()
            );
            return;
        }
        state.setup(settings);
    }

    /// Leases a buffer of at least `size` bytes from the active slot.
    ///
    /// Reuses the smallest available buffer that fits and relabels it;
    /// otherwise creates a buffer of exactly `size` bytes (16 for an empty request).
    ///
    /// # Errors
    ///
    /// Returns the device's [`ResourceError`] if a new buffer cannot be created or mapped.
    ///
    /// # Panics
    ///
    /// Panics if the pool is not initialized.
    pub fn lease(&self, size: u64, label: &str) -> Result<BufferLease, ResourceError> {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.assert_initialized("lease");

        let size = if size == 0 { CONSTANT_REGISTER_SIZE } else { size };
        let active = state.active;
        let name = state.debug_name(active, label);

        let index = match state.slots[active].take_best_fit(size) {
            Some(index) => {
                let buffer = state.slots[active].buffer(index);
                state.device.set_buffer_label(buffer.id, &name);
                state.stats.reuses += 1;
                log::debug!(
                    "ConstantBufferPool({}): slot {} reused {} ({} bytes) for {} bytes '{}'",
                    state.settings.label_prefix,
                    active,
                    buffer.id,
                    buffer.capacity,
                    size,
                    label
                );
                index
            }
            None => {
                let buffer = Rc::new(state.create_buffer(size, name)?);
                state.stats.allocations += 1;
                state.stats.bytes_allocated += buffer.capacity;
                log::debug!(
                    "ConstantBufferPool({}): slot {} created {} ({} bytes) for '{}'",
                    state.settings.label_prefix,
                    active,
                    buffer.id,
                    buffer.capacity,
                    label
                );
                state.slots[active].insert_leased(buffer)
            }
        };
        state.stats.leases += 1;

        let buffer = state.slots[active].buffer(index);
        Ok(BufferLease {
            buffer: buffer.id,
            slot: active,
            index,
            capacity: buffer.capacity,
            issued_frame: state.frame,
            generation: state.generation,
            // SAFETY: the index was just moved into the slot's leased set, so this
            // lease is the only writer until it is released. The pool never writes
            // through its own mapping, and `memory` keeps the buffer mapped for as
            // long as the lease exists.
            mapping: unsafe { buffer.mapping.alias() },
            memory: Rc::clone(buffer),
        })
    }

    /// Returns a lease to the slot it was drawn from.
    ///
    /// The buffer becomes leasable again once that slot is next activated. A
    /// warning is logged when the lease is returned while another slot is
    /// active, or after its own slot was re-activated underneath it.
    ///
    /// # Panics
    ///
    /// Panics if the lease's index is not currently leased in its slot.
    pub fn release(&self, lease: BufferLease) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;

        if !state.initialized || lease.generation != state.generation {
            // The pool already let go of the buffer; dropping the lease destroys it.
            log::warn!(
                "ConstantBufferPool({}): dropping lease of {} issued before the last shutdown",
                state.settings.label_prefix,
                lease.buffer
            );
            return;
        }

        assert!(
            lease.slot < state.slots.len(),
            "ConstantBufferPool({}): lease names slot {} but the pool has {}",
            state.settings.label_prefix,
            lease.slot,
            state.slots.len()
        );
        let holds = state.slots[lease.slot]
            .get(lease.index)
            .is_some_and(|buffer| Rc::ptr_eq(buffer, &lease.memory));
        assert!(
            holds,
            "ConstantBufferPool({}): lease index {} in slot {} does not hold {}",
            state.settings.label_prefix,
            lease.index,
            lease.slot,
            lease.buffer
        );

        if lease.slot != state.active {
            log::warn!(
                "ConstantBufferPool({}): {} released while slot {} is active, returning it to slot {}",
                state.settings.label_prefix,
                lease.buffer,
                state.active,
                lease.slot
            );
        }
        if state.frame - lease.issued_frame >= state.slots.len() as u64 {
            log::warn!(
                "ConstantBufferPool({}): {} outlived a full rotation; slot {} was re-activated while it was still leased",
                state.settings.label_prefix,
                lease.buffer,
                lease.slot
            );
        }

        state.slots[lease.slot].release(lease.index);
        state.stats.releases += 1;
    }

    /// Rotates to the next frame slot and recycles the buffers freed into it.
    ///
    /// Must be called once per frame, after every lease from the new slot's
    /// previous rotation has been released and the GPU has finished reading them.
    ///
    /// # Panics
    ///
    /// Panics if the pool is not initialized, or if `check_on_advance` is set and
    /// the new slot's bookkeeping is inconsistent.
    pub fn advance_slot(&self) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.assert_initialized("advance_slot");

        state.active = (state.active + 1) % state.slots.len();
        state.frame += 1;
        state.stats.advances += 1;

        let slot = &mut state.slots[state.active];
        let recycled = slot.recycle();
        let counts = slot.counts();
        if counts.leased > 0 {
            log::warn!(
                "ConstantBufferPool({}): slot {} activated with {} buffers still leased",
                state.settings.label_prefix,
                state.active,
                counts.leased
            );
        }
        if state.settings.check_on_advance {
            slot.check_consistency();
        }

        log::debug!(
            "ConstantBufferPool({}): frame {} on slot {}, recycled {}, {} of {} available",
            state.settings.label_prefix,
            state.frame,
            state.active,
            recycled,
            counts.available,
            counts.total
        );
    }

    /// Verifies the active slot's bookkeeping.
    ///
    /// # Panics
    ///
    /// Panics if an index is lost or tracked twice.
    pub fn check_consistency(&self) {
        let state = self.state.borrow();
        state.assert_initialized("check_consistency");
        state.slots[state.active].check_consistency();
    }

    /// Destroys every pooled buffer and leaves the pool uninitialized.
    ///
    /// Leases still outstanding are reported and later ignored when released.
    pub fn shutdown(&self) {
        let mut state = self.state.borrow_mut();
        if !state.initialized {
            log::warn!(
                "ConstantBufferPool({}): shutdown called on an uninitialized pool",
                state.settings.label_prefix
            );
            return;
        }
        state.teardown();
    }

    /// Returns the planned layout of `T`, planning it on first use.
    pub fn layout<T: ShaderParameters>(&self) -> Rc<ParameterLayout<T>> {
        self.layouts.get::<T>()
    }

    /// Returns the pool's layout cache.
    pub fn layouts(&self) -> &LayoutRegistry {
        &self.layouts
    }

    /// Returns the device buffers are created on.
    pub fn device(&self) -> Arc<dyn GraphicsDevice> {
        Arc::clone(&self.state.borrow().device)
    }

    /// Returns `true` between initialization and shutdown.
    pub fn is_initialized(&self) -> bool {
        self.state.borrow().initialized
    }

    /// Returns the index of the active frame slot.
    pub fn active_slot(&self) -> usize {
        self.state.borrow().active
    }

    /// Returns the number of frame slots.
    pub fn slot_count(&self) -> usize {
        self.state.borrow().slots.len()
    }

    /// Returns how many times the pool has advanced.
    pub fn frame(&self) -> u64 {
        self.state.borrow().frame
    }

    /// Returns the distribution of `slot`'s buffers.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is out of range.
    pub fn slot_counts(&self, slot: usize) -> SlotCounts {
        self.state.borrow().slots[slot].counts()
    }

    /// Returns the pool's lifetime counters.
    pub fn stats(&self) -> PoolStats {
        self.state.borrow().stats
    }

    /// Returns the settings the pool was initialized with.
    pub fn settings(&self) -> PoolSettings {
        self.state.borrow().settings.clone()
    }
}

impl fmt::Debug for ConstantBufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ConstantBufferPool")
            .field("label_prefix", &state.settings.label_prefix)
            .field("slots", &state.slots.len())
            .field("active", &state.active)
            .field("frame", &state.frame)
            .field("stats", &state.stats)
            .finish()
    }
}
