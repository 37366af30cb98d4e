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

//! Constant-buffer layout planning.
//!
//! Offsets follow the usual HLSL packing rules: every value is aligned to its
//! type's alignment, and a value smaller than a constant register is pushed to
//! the next 16-byte boundary if it would otherwise straddle one.

use super::schema::{SchemaBuilder, ShaderParameters};
use super::types::ParamType;
use pallas_core::memory::align_up;
use std::fmt;

/// The size of one constant register, and the window no small value may straddle.
pub const CONSTANT_REGISTER_SIZE: u64 = 16;

pub(crate) type SlotEncoder<T> = Box<dyn Fn(&T, &mut [u8])>;

/// One declared parameter and its place in the constant buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSlot {
    /// The field name, for diagnostics.
    pub name: &'static str,
    /// The parameter's type table entry.
    pub ty: ParamType,
    /// Byte offset of the field inside the CPU-side struct.
    pub cpu_offset: usize,
    /// Size of the encoded value in the constant buffer.
    pub gpu_size: u64,
    /// Byte offset of the encoded value in the constant buffer. Zero until planned.
    pub gpu_offset: u64,
}

impl ParameterSlot {
    /// Creates an unplanned slot.
    pub fn new(name: &'static str, ty: ParamType, cpu_offset: usize) -> Self {
        Self {
            name,
            ty,
            cpu_offset,
            gpu_size: ty.gpu_size(),
            gpu_offset: 0,
        }
    }

    /// Returns the first byte past the encoded value.
    pub fn gpu_end(&self) -> u64 {
        self.gpu_offset + self.gpu_size
    }
}

#[inline]
fn straddles_register(offset: u64, size: u64) -> bool {
    size > 0 && offset / CONSTANT_REGISTER_SIZE != (offset + size - 1) / CONSTANT_REGISTER_SIZE
}

/// Assigns a GPU offset to every slot, in order, and returns the total buffer size.
///
/// The result depends only on the order and types of the slots.
pub fn plan_layout(slots: &mut [ParameterSlot]) -> u64 {
    let mut current_offset = 0;
    for slot in slots.iter_mut() {
        let mut offset = align_up(current_offset, slot.ty.gpu_alignment());
        if straddles_register(offset, slot.gpu_size) {
            offset = align_up(offset, CONSTANT_REGISTER_SIZE);
        }
        slot.gpu_offset = offset;
        current_offset = offset + slot.gpu_size;
    }
    current_offset
}

/// The planned layout of one [`ShaderParameters`] type.
///
/// Built once per type and shared by every instance through the
/// [`LayoutRegistry`](super::LayoutRegistry).
pub struct ParameterLayout<T> {
    type_name: &'static str,
    slots: Vec<ParameterSlot>,
    pub(crate) encoders: Vec<SlotEncoder<T>>,
    size: u64,
}

impl<T: ShaderParameters> ParameterLayout<T> {
    /// Collects the schema of `T` and plans its offsets.
    pub fn build() -> Self {
        let mut schema = SchemaBuilder::new();
        T::declare(&mut schema);
        let (mut slots, encoders) = schema.into_parts();
        let size = plan_layout(&mut slots);
        let type_name = std::any::type_name::<T>();

        log::debug!(
            "ParameterLayout({}): planned {} parameters into {} bytes",
            type_name,
            slots.len(),
            size
        );

        Self {
            type_name,
            slots,
            encoders,
            size,
        }
    }
}

impl<T> ParameterLayout<T> {
    /// Returns the Rust type name the layout was planned for.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the planned slots, in declaration order.
    pub fn slots(&self) -> &[ParameterSlot] {
        &self.slots
    }

    /// Looks a slot up by field name.
    pub fn slot(&self, name: &str) -> Option<&ParameterSlot> {
        self.slots.iter().find(|slot| slot.name == name)
    }

    /// Returns the total buffer size the layout requires.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns the highest `gpu_offset + gpu_size` over all slots.
    pub fn required_capacity(&self) -> u64 {
        self.slots.iter().map(ParameterSlot::gpu_end).max().unwrap_or(0)
    }
}

impl<T> fmt::Debug for ParameterLayout<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterLayout")
            .field("type_name", &self.type_name)
            .field("slots", &self.slots)
            .field("size", &self.size)
            .finish()
    }
}
