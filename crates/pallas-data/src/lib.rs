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

//! # Pallas Data
//!
//! Turns strongly-typed shader parameter structs into packed constant-buffer
//! bytes, and manages the pooled GPU buffers those bytes are written into.
//!
//! - [`params`]: the parameter type table, schema declaration, layout planner and writer.
//! - [`pool`]: per-frame-slot buffer pools behind the [`ConstantBufferPool`] handle.
//! - [`parameter_set`]: [`ParameterSet`], which ties one set of parameters to a leased buffer.

#![warn(missing_docs)]

pub mod parameter_set;
pub mod params;
pub mod pool;

pub use parameter_set::ParameterSet;
pub use params::{
    GpuParam, LayoutRegistry, ParamType, ParameterLayout, ParameterSlot, SchemaBuilder,
    ShaderParameters,
};
pub use pool::{BufferLease, ConstantBufferPool, PoolSettings, PoolStats, SettingsError, SlotCounts};
