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

//! The buffers belonging to one frame slot and their bookkeeping.

use pallas_core::renderer::{BufferId, GraphicsDevice, MappedSpan};
use std::collections::BTreeSet;
use std::rc::Rc;
use std::sync::Arc;

/// A device buffer mapped once at creation.
///
/// Shared between its slot and the lease currently holding it. The buffer is
/// unmapped and destroyed when the last owner lets go, so a lease that outlives
/// the pool still points at live memory.
#[derive(Debug)]
pub(crate) struct PooledBuffer {
    pub id: BufferId,
    pub capacity: u64,
    pub mapping: MappedSpan,
    device: Arc<dyn GraphicsDevice>,
}

impl PooledBuffer {
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        id: BufferId,
        capacity: u64,
        mapping: MappedSpan,
    ) -> Self {
        Self {
            id,
            capacity,
            mapping,
            device,
        }
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let Err(e) = self.device.unmap_buffer(self.id) {
            log::warn!("PooledBuffer: Failed to unmap buffer {}: {}", self.id, e);
        }
        if let Err(e) = self.device.destroy_buffer(self.id) {
            log::error!("PooledBuffer: Failed to destroy buffer {}: {}", self.id, e);
        }
    }
}

/// How the indices of one frame slot are currently distributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotCounts {
    /// Buffers ever created for the slot and not yet destroyed.
    pub total: usize,
    /// Buffers ready to be leased.
    pub available: usize,
    /// Buffers released since the slot was last active.
    pub freed: usize,
    /// Buffers currently leased.
    pub leased: usize,
}

impl SlotCounts {
    /// Returns `true` if every buffer is accounted for exactly once.
    pub fn is_conserved(&self) -> bool {
        self.available + self.freed + self.leased == self.total
    }
}

/// One frame slot's buffers.
///
/// Every index into `buffers` is in exactly one of `available`, `freed` or `leased`.
#[derive(Debug)]
pub(crate) struct FrameSlotPool {
    slot: usize,
    buffers: Vec<Rc<PooledBuffer>>,
    /// `(capacity, index)`, so a range query finds the smallest buffer that fits.
    available: BTreeSet<(u64, usize)>,
    freed: Vec<usize>,
    leased: BTreeSet<usize>,
}

impl FrameSlotPool {
    pub fn new(slot: usize) -> Self {
        Self {
            slot,
            buffers: Vec::new(),
            available: BTreeSet::new(),
            freed: Vec::new(),
            leased: BTreeSet::new(),
        }
    }

    pub fn buffer(&self, index: usize) -> &Rc<PooledBuffer> {
        &self.buffers[index]
    }

    pub fn get(&self, index: usize) -> Option<&Rc<PooledBuffer>> {
        self.buffers.get(index)
    }

    /// Leases the smallest available buffer of at least `size` bytes.
    pub fn take_best_fit(&mut self, size: u64) -> Option<usize> {
        let (capacity, index) = self.available.range((size, 0)..).next().copied()?;
        self.available.remove(&(capacity, index));
        self.leased.insert(index);
        Some(index)
    }

    /// Adopts a newly created buffer and leases it straight away.
    pub fn insert_leased(&mut self, buffer: Rc<PooledBuffer>) -> usize {
        let index = self.buffers.len();
        self.buffers.push(buffer);
        self.leased.insert(index);
        index
    }

    /// Queues a leased buffer for recycling on the slot's next activation.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not currently leased.
    pub fn release(&mut self, index: usize) {
        assert!(
            self.leased.remove(&index),
            "FrameSlotPool(slot {}): released index {} that is not leased (double release?)",
            self.slot,
            index
        );
        self.freed.push(index);
    }

    /// Moves every freed buffer back into the available set, keyed by its real capacity.
    /// Returns how many buffers were recycled.
    pub fn recycle(&mut self) -> usize {
        let recycled = self.freed.len();
        for index in self.freed.drain(..) {
            self.available.insert((self.buffers[index].capacity, index));
        }
        recycled
    }

    pub fn counts(&self) -> SlotCounts {
        SlotCounts {
            total: self.buffers.len(),
            available: self.available.len(),
            freed: self.freed.len(),
            leased: self.leased.len(),
        }
    }

    /// Verifies that every index is tracked exactly once.
    ///
    /// # Panics
    ///
    /// Panics with the offending indices if an index was lost or duplicated.
    pub fn check_consistency(&self) {
        let mut seen = vec![0u32; self.buffers.len()];
        let mut out_of_range = Vec::new();
        let tracked = self
            .available
            .iter()
            .map(|(_, index)| *index)
            .chain(self.freed.iter().copied())
            .chain(self.leased.iter().copied());
        for index in tracked {
            match seen.get_mut(index) {
                Some(count) => *count += 1,
                None => out_of_range.push(index),
            }
        }

        let lost: Vec<usize> = (0..seen.len()).filter(|i| seen[*i] == 0).collect();
        let duplicated: Vec<usize> = (0..seen.len()).filter(|i| seen[*i] > 1).collect();
        assert!(
            lost.is_empty() && duplicated.is_empty() && out_of_range.is_empty(),
            "FrameSlotPool(slot {}): inconsistent bookkeeping: lost {:?}, duplicated {:?}, unknown {:?}",
            self.slot,
            lost,
            duplicated,
            out_of_range
        );

        for (capacity, index) in &self.available {
            assert_eq!(
                *capacity, self.buffers[*index].capacity,
                "FrameSlotPool(slot {}): index {} is keyed by a stale capacity",
                self.slot, index
            );
        }
    }

    /// Removes every buffer from the slot, leaving it empty.
    ///
    /// Buffers still held by a lease survive until that lease is dropped.
    pub fn drain_buffers(&mut self) -> Vec<Rc<PooledBuffer>> {
        self.available.clear();
        self.freed.clear();
        self.leased.clear();
        std::mem::take(&mut self.buffers)
    }
}
