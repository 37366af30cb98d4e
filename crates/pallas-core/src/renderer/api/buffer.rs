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

//! Defines data structures related to GPU buffer resources.

use std::borrow::Cow;
use std::fmt;

/// A set of flags describing the allowed usages of a [`BufferId`].
///
/// The graphics driver uses them to place the buffer in the most suitable memory
/// type (GPU-only vs. CPU-visible) and to validate how the buffer is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BufferUsage {
    bits: u32,
}

impl BufferUsage {
    /// No usage.
    pub const NONE: Self = Self { bits: 0 };
    /// The buffer can be mapped for reading on the CPU.
    pub const MAP_READ: Self = Self { bits: 1 << 0 };
    /// The buffer can be mapped for writing on the CPU.
    pub const MAP_WRITE: Self = Self { bits: 1 << 1 };
    /// The buffer can be used as the source of a copy operation.
    pub const COPY_SRC: Self = Self { bits: 1 << 2 };
    /// The buffer can be used as the destination of a copy operation.
    pub const COPY_DST: Self = Self { bits: 1 << 3 };
    /// The buffer can be bound as a uniform (constant) buffer.
    pub const UNIFORM: Self = Self { bits: 1 << 6 };
    /// The buffer can be bound as a storage buffer.
    pub const STORAGE: Self = Self { bits: 1 << 7 };

    /// CPU-writable, GPU-readable constant buffer memory.
    pub const CONSTANT: Self = Self {
        bits: Self::UNIFORM.bits | Self::MAP_WRITE.bits,
    };

    /// Creates a set of usage flags from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Combines two sets of flags.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Checks if every flag in `other` is also set in `self`.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Checks if no flag is set.
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

impl std::ops::BitOr for BufferUsage {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for BufferUsage {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// A descriptor used to create a [`BufferId`].
#[derive(Debug, Clone)]
pub struct BufferDescriptor<'a> {
    /// An optional debug label for the buffer.
    pub label: Option<Cow<'a, str>>,
    /// The total size of the buffer in bytes.
    pub size: u64,
    /// A bitmask of [`BufferUsage`] flags describing how the buffer will be used.
    pub usage: BufferUsage,
}

impl<'a> BufferDescriptor<'a> {
    /// Describes a CPU-writable, GPU-readable constant buffer of `size` bytes.
    pub fn constant(label: impl Into<Cow<'a, str>>, size: u64) -> Self {
        Self {
            label: Some(label.into()),
            size,
            usage: BufferUsage::CONSTANT,
        }
    }
}

/// An opaque handle to a GPU buffer resource.
///
/// This ID is returned by [`GraphicsDevice::create_buffer`](crate::renderer::GraphicsDevice::create_buffer)
/// and is used to reference the buffer in all subsequent operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub usize);

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buffer#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_usage_is_uniform_and_map_write() {
        assert!(BufferUsage::CONSTANT.contains(BufferUsage::UNIFORM));
        assert!(BufferUsage::CONSTANT.contains(BufferUsage::MAP_WRITE));
        assert!(!BufferUsage::CONSTANT.contains(BufferUsage::MAP_READ));
    }

    #[test]
    fn flags_combine() {
        let mut usage = BufferUsage::UNIFORM;
        assert!(!usage.contains(BufferUsage::COPY_DST));
        usage |= BufferUsage::COPY_DST;
        assert!(usage.contains(BufferUsage::UNIFORM | BufferUsage::COPY_DST));
        assert!(BufferUsage::NONE.is_empty());
    }

    #[test]
    fn constant_descriptor() {
        let desc = BufferDescriptor::constant("Sun", 64);
        assert_eq!(desc.label.as_deref(), Some("Sun"));
        assert_eq!(desc.size, 64);
        assert_eq!(desc.usage, BufferUsage::CONSTANT);
    }
}
