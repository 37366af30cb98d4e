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

//! Shader parameter schemas and their constant-buffer layout.
//!
//! A parameter struct declares its fields once through [`ShaderParameters`]. The
//! planner turns that ordered declaration into GPU offsets following the
//! constant-buffer packing rules, the result is cached per type in a
//! [`LayoutRegistry`], and the writer uses it to pack instances into mapped memory.

mod layout;
mod registry;
mod schema;
mod types;
mod writer;

pub use self::layout::{plan_layout, ParameterLayout, ParameterSlot, CONSTANT_REGISTER_SIZE};
pub use self::registry::LayoutRegistry;
pub use self::schema::{SchemaBuilder, ShaderParameters};
pub use self::types::{GpuParam, ParamType};
pub use self::writer::{encode_parameters, write_parameters, write_parameters_mapped};
