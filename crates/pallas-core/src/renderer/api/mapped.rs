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

//! A bounds-known view over CPU-mapped buffer memory.
//!
//! Devices hand out a [`MappedSpan`] when a buffer is mapped. Every write goes
//! through an explicit byte offset and is checked against the span's length, so
//! a layout that does not fit its buffer aborts instead of scribbling past it.

use std::fmt;
use std::ptr::NonNull;

/// A writable window of `len` bytes onto a mapped buffer.
///
/// A span is only valid while its buffer stays mapped. It is deliberately not
/// `Clone`, `Send` or `Sync`: the single owner of a span is the only writer of
/// those bytes.
pub struct MappedSpan {
    ptr: NonNull<u8>,
    len: usize,
}

impl MappedSpan {
    /// Creates a span over `len` bytes starting at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads and writes of `len` bytes until the underlying
    /// buffer is unmapped or destroyed, and no other span may write the same bytes
    /// while this one is in use.
    pub unsafe fn from_raw_parts(ptr: NonNull<u8>, len: usize) -> Self {
        Self { ptr, len }
    }

    /// Creates a second span over the same bytes.
    ///
    /// # Safety
    ///
    /// The caller must guarantee that at most one of the two spans is used at a
    /// time, and that neither outlives the mapping.
    pub unsafe fn alias(&self) -> Self {
        Self {
            ptr: self.ptr,
            len: self.len,
        }
    }

    /// Returns the number of writable bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the span covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the start of the span.
    pub fn as_ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    /// Views the mapped bytes.
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: `from_raw_parts` guarantees `ptr` is valid for `len` bytes.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Views the mapped bytes mutably.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: `from_raw_parts` guarantees `ptr` is valid for `len` bytes and that
        // this span is the only writer.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Copies `bytes` into the span starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset + bytes.len()` exceeds the span.
    pub fn write(&mut self, offset: usize, bytes: &[u8]) {
        let end = offset.checked_add(bytes.len());
        match end {
            Some(end) if end <= self.len => {
                self.as_mut_slice()[offset..end].copy_from_slice(bytes);
            }
            _ => panic!(
                "MappedSpan: write of {} bytes at offset {} exceeds span of {} bytes",
                bytes.len(),
                offset,
                self.len
            ),
        }
    }
}

impl fmt::Debug for MappedSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedSpan")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span_over(storage: &mut [u8]) -> MappedSpan {
        let ptr = NonNull::new(storage.as_mut_ptr()).unwrap();
        unsafe { MappedSpan::from_raw_parts(ptr, storage.len()) }
    }

    #[test]
    fn write_lands_at_offset() {
        let mut storage = [0u8; 8];
        let mut span = span_over(&mut storage);
        span.write(2, &[1, 2, 3]);
        assert_eq!(span.as_slice(), &[0, 0, 1, 2, 3, 0, 0, 0]);
        span.write(5, &[9, 9, 9]);
        assert_eq!(storage, [0, 0, 1, 2, 3, 9, 9, 9]);
    }

    #[test]
    #[should_panic(expected = "exceeds span")]
    fn write_past_end_panics() {
        let mut storage = [0u8; 4];
        let mut span = span_over(&mut storage);
        span.write(2, &[1, 2, 3]);
    }

    #[test]
    #[should_panic(expected = "exceeds span")]
    fn write_with_overflowing_offset_panics() {
        let mut storage = [0u8; 4];
        let mut span = span_over(&mut storage);
        span.write(usize::MAX, &[1]);
    }

    #[test]
    fn length_queries() {
        let mut storage = [0u8; 5];
        let span = span_over(&mut storage);
        assert_eq!(span.len(), 5);
        assert!(!span.is_empty());
    }
}
