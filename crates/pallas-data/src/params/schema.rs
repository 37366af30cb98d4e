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

//! Declaring which fields of a struct are shader parameters.

use super::layout::{ParameterSlot, SlotEncoder};
use super::types::GpuParam;

/// A CPU-side struct whose fields are uploaded to one constant buffer.
///
/// # Example
///
/// ```
/// use pallas_core::math::Vec3;
/// use pallas_data::{param_schema, ParameterLayout, SchemaBuilder, ShaderParameters};
///
/// struct SunParams {
///     direction: Vec3,
///     intensity: f32,
/// }
///
/// impl ShaderParameters for SunParams {
///     fn declare(schema: &mut SchemaBuilder<Self>) {
///         param_schema!(schema, SunParams { direction, intensity });
///     }
/// }
///
/// let layout = ParameterLayout::<SunParams>::build();
/// assert_eq!(layout.size(), 16);
/// ```
pub trait ShaderParameters: Sized + 'static {
    /// Registers every parameter of `Self`, in the order the shader declares them.
    fn declare(schema: &mut SchemaBuilder<Self>);
}

/// Collects the ordered parameter slots of one [`ShaderParameters`] type.
pub struct SchemaBuilder<T> {
    slots: Vec<ParameterSlot>,
    encoders: Vec<SlotEncoder<T>>,
}

impl<T: 'static> SchemaBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            encoders: Vec::new(),
        }
    }

    /// Appends a parameter.
    ///
    /// `cpu_offset` is the field's offset inside `T` (see [`std::mem::offset_of!`]),
    /// and `accessor` borrows the field from an instance.
    ///
    /// # Panics
    ///
    /// Panics if a parameter with the same name was already declared.
    pub fn param<F: GpuParam + 'static>(
        &mut self,
        name: &'static str,
        cpu_offset: usize,
        accessor: fn(&T) -> &F,
    ) -> &mut Self {
        assert!(
            self.slots.iter().all(|slot| slot.name != name),
            "SchemaBuilder({}): parameter '{}' declared twice",
            std::any::type_name::<T>(),
            name
        );
        self.slots
            .push(ParameterSlot::new(name, F::PARAM_TYPE, cpu_offset));
        self.encoders
            .push(Box::new(move |source: &T, dst: &mut [u8]| {
                accessor(source).write_gpu(dst)
            }));
        self
    }

    /// Returns the number of parameters declared so far.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if nothing has been declared.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Vec<ParameterSlot>, Vec<SlotEncoder<T>>) {
        (self.slots, self.encoders)
    }
}

/// Declares struct fields as parameters, in the order listed.
///
/// `param_schema!(schema, Type { a, b, c })` expands to one
/// [`SchemaBuilder::param`] call per field, filling in the field name and its
/// CPU offset.
#[macro_export]
macro_rules! param_schema {
    ($schema:expr, $ty:ty { $($field:ident),+ $(,)? }) => {{
        let schema: &mut $crate::SchemaBuilder<$ty> = $schema;
        $(
            schema.param(
                ::std::stringify!($field),
                ::std::mem::offset_of!($ty, $field),
                |params| &params.$field,
            );
        )+
    }};
}
