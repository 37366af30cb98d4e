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

//! The parameter type table: GPU size, alignment and CPU to GPU conversion per type.

use pallas_core::math::{Mat4, Vec2, Vec3, Vec4};
use pallas_core::renderer::BindlessHandle;
use std::fmt;

/// The semantic type of one shader parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// A boolean, widened to a 32-bit integer on the GPU.
    Bool,
    /// A signed 32-bit integer.
    Int,
    /// A 32-bit float.
    Float,
    /// Two packed floats.
    Float2,
    /// Three packed floats.
    Float3,
    /// Four packed floats.
    Float4,
    /// A 4x4 float matrix, stored as four row vectors.
    Matrix,
    /// An index into a bindless descriptor heap.
    BindlessHandle,
}

impl ParamType {
    /// Returns the number of bytes the value occupies in a constant buffer.
    pub const fn gpu_size(self) -> u64 {
        match self {
            ParamType::Bool | ParamType::Int | ParamType::Float => 4,
            ParamType::Float2 => 8,
            ParamType::Float3 => 12,
            ParamType::Float4 => 16,
            ParamType::Matrix => 64,
            ParamType::BindlessHandle => std::mem::size_of::<BindlessHandle>() as u64,
        }
    }

    /// Returns the alignment of the value's offset in a constant buffer.
    pub const fn gpu_alignment(self) -> u64 {
        match self {
            ParamType::Matrix => 16,
            _ => 4,
        }
    }

    /// Returns the HLSL spelling of the type, for diagnostics.
    pub const fn hlsl_name(self) -> &'static str {
        match self {
            ParamType::Bool => "bool",
            ParamType::Int => "int",
            ParamType::Float => "float",
            ParamType::Float2 => "float2",
            ParamType::Float3 => "float3",
            ParamType::Float4 => "float4",
            ParamType::Matrix => "float4x4",
            ParamType::BindlessHandle => "uint",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hlsl_name())
    }
}

/// A CPU-side value that can be stored in a constant buffer.
///
/// Every implementation names its [`ParamType`] and knows how to encode itself.
/// Types without an implementation cannot be declared in a schema at all.
pub trait GpuParam {
    /// The table entry this value is laid out as.
    const PARAM_TYPE: ParamType;

    /// Encodes the value into `dst`, which is exactly `PARAM_TYPE.gpu_size()` bytes.
    fn write_gpu(&self, dst: &mut [u8]);
}

#[inline]
fn put<T: bytemuck::Pod>(dst: &mut [u8], value: &T) {
    dst.copy_from_slice(bytemuck::bytes_of(value));
}

impl GpuParam for bool {
    const PARAM_TYPE: ParamType = ParamType::Bool;

    fn write_gpu(&self, dst: &mut [u8]) {
        put(dst, &u32::from(*self));
    }
}

impl GpuParam for i32 {
    const PARAM_TYPE: ParamType = ParamType::Int;

    fn write_gpu(&self, dst: &mut [u8]) {
        put(dst, self);
    }
}

impl GpuParam for f32 {
    const PARAM_TYPE: ParamType = ParamType::Float;

    fn write_gpu(&self, dst: &mut [u8]) {
        put(dst, self);
    }
}

impl GpuParam for Vec2 {
    const PARAM_TYPE: ParamType = ParamType::Float2;

    fn write_gpu(&self, dst: &mut [u8]) {
        put(dst, &self.to_array());
    }
}

impl GpuParam for Vec3 {
    const PARAM_TYPE: ParamType = ParamType::Float3;

    fn write_gpu(&self, dst: &mut [u8]) {
        put(dst, &self.to_array());
    }
}

impl GpuParam for Vec4 {
    const PARAM_TYPE: ParamType = ParamType::Float4;

    fn write_gpu(&self, dst: &mut [u8]) {
        put(dst, &self.to_array());
    }
}

impl GpuParam for [f32; 2] {
    const PARAM_TYPE: ParamType = ParamType::Float2;

    fn write_gpu(&self, dst: &mut [u8]) {
        put(dst, self);
    }
}

impl GpuParam for [f32; 3] {
    const PARAM_TYPE: ParamType = ParamType::Float3;

    fn write_gpu(&self, dst: &mut [u8]) {
        put(dst, self);
    }
}

impl GpuParam for [f32; 4] {
    const PARAM_TYPE: ParamType = ParamType::Float4;

    fn write_gpu(&self, dst: &mut [u8]) {
        put(dst, self);
    }
}

impl GpuParam for Mat4 {
    const PARAM_TYPE: ParamType = ParamType::Matrix;

    // The engine matrix is column-major; constant buffers get it row by row.
    fn write_gpu(&self, dst: &mut [u8]) {
        for (row, chunk) in dst.chunks_exact_mut(16).enumerate() {
            put(chunk, &self.row(row).to_array());
        }
    }
}

impl GpuParam for BindlessHandle {
    const PARAM_TYPE: ParamType = ParamType::BindlessHandle;

    fn write_gpu(&self, dst: &mut [u8]) {
        put(dst, self);
    }
}
