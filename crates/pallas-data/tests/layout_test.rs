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

use pallas_core::math::{Mat4, Vec2, Vec3, Vec4};
use pallas_core::memory::align_up;
use pallas_core::renderer::BindlessHandle;
use pallas_data::params::{encode_parameters, plan_layout, CONSTANT_REGISTER_SIZE};
use pallas_data::{param_schema, ParamType, ParameterLayout, ParameterSlot, SchemaBuilder, ShaderParameters};

// --- Test Setup: parameter types ---
struct RoundTrip {
    direction: Vec3,
    intensity: f32,
    color: Vec4,
}

impl ShaderParameters for RoundTrip {
    fn declare(schema: &mut SchemaBuilder<Self>) {
        param_schema!(schema, RoundTrip { direction, intensity, color });
    }
}

struct Straddle {
    position: Vec3,
    extent: Vec2,
}

impl ShaderParameters for Straddle {
    fn declare(schema: &mut SchemaBuilder<Self>) {
        param_schema!(schema, Straddle { position, extent });
    }
}

struct Material {
    enabled: bool,
    world: Mat4,
    albedo: BindlessHandle,
    uv_scale: [f32; 2],
    layer: i32,
    emissive: Vec3,
    tiles: Vec2,
}

impl ShaderParameters for Material {
    fn declare(schema: &mut SchemaBuilder<Self>) {
        param_schema!(
            schema,
            Material { enabled, world, albedo, uv_scale, layer, emissive, tiles }
        );
    }
}
// ---

fn offsets<T: ShaderParameters>() -> (Vec<u64>, u64) {
    let layout = ParameterLayout::<T>::build();
    let offsets = layout.slots().iter().map(|s| s.gpu_offset).collect();
    (offsets, layout.size())
}

#[test]
fn test_align_up_properties() {
    for shift in 0..8 {
        let alignment = 1u64 << shift;
        for offset in 0..200u64 {
            let aligned = align_up(offset, alignment);
            assert_eq!(align_up(aligned, alignment), aligned);
            assert!(aligned >= offset && aligned <= offset + alignment - 1);
            assert_eq!(aligned % alignment, 0);
        }
    }
}

#[test]
fn test_round_trip_example() {
    assert_eq!(offsets::<RoundTrip>(), (vec![0, 12, 16], 32));
}

#[test]
fn test_straddle_example() {
    assert_eq!(offsets::<Straddle>(), (vec![0, 16], 24));
}

#[test]
fn test_mixed_layout() {
    // bool 0..4, matrix realigned to 16..80, handle 80..84, float2 84..92,
    // int 92..96, float3 96..108, float2 pushed from 108 to 112.
    assert_eq!(
        offsets::<Material>(),
        (vec![0, 16, 80, 84, 92, 96, 112], 120)
    );
}

#[test]
fn test_layout_is_deterministic() {
    let first = ParameterLayout::<Material>::build();
    for _ in 0..4 {
        let again = ParameterLayout::<Material>::build();
        assert_eq!(again.slots(), first.slots());
        assert_eq!(again.size(), first.size());
    }
}

#[test]
fn test_cpu_offsets_do_not_move_gpu_offsets() {
    let types = [
        ParamType::Float3,
        ParamType::Float2,
        ParamType::Bool,
        ParamType::Matrix,
        ParamType::Float,
    ];
    let mut forward: Vec<_> = types
        .iter()
        .enumerate()
        .map(|(i, ty)| ParameterSlot::new("p", *ty, i * 64))
        .collect();
    let mut reversed: Vec<_> = types
        .iter()
        .enumerate()
        .map(|(i, ty)| ParameterSlot::new("p", *ty, (types.len() - i) * 8))
        .collect();

    let size_a = plan_layout(&mut forward);
    let size_b = plan_layout(&mut reversed);

    assert_eq!(size_a, size_b);
    for (a, b) in forward.iter().zip(&reversed) {
        assert_eq!(a.gpu_offset, b.gpu_offset);
    }
}

#[test]
fn test_no_small_slot_straddles_a_register() {
    let all = [
        ParamType::Bool,
        ParamType::Int,
        ParamType::Float,
        ParamType::Float2,
        ParamType::Float3,
        ParamType::Float4,
        ParamType::Matrix,
        ParamType::BindlessHandle,
    ];

    // Walk a deterministic spread of type sequences.
    let mut state = 0x2545_f491_u32;
    for _ in 0..500 {
        let mut slots = Vec::new();
        for _ in 0..12 {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let ty = all[state as usize % all.len()];
            slots.push(ParameterSlot::new("p", ty, 0));
        }
        let size = plan_layout(&mut slots);

        let mut previous_end = 0;
        for slot in &slots {
            assert_eq!(slot.gpu_offset % slot.ty.gpu_alignment(), 0);
            assert!(slot.gpu_offset >= previous_end);
            if slot.gpu_size < CONSTANT_REGISTER_SIZE {
                assert_eq!(
                    slot.gpu_offset / CONSTANT_REGISTER_SIZE,
                    (slot.gpu_end() - 1) / CONSTANT_REGISTER_SIZE,
                    "{:?} straddles a register at {}",
                    slot.ty,
                    slot.gpu_offset
                );
            }
            previous_end = slot.gpu_end();
        }
        assert_eq!(size, previous_end);
    }
}

#[test]
fn test_encoded_matrix_is_row_major() {
    let material = Material {
        enabled: true,
        world: Mat4::from_rows(
            Vec4::new(1.0, 2.0, 3.0, 4.0),
            Vec4::new(5.0, 6.0, 7.0, 8.0),
            Vec4::new(9.0, 10.0, 11.0, 12.0),
            Vec4::new(13.0, 14.0, 15.0, 16.0),
        ),
        albedo: BindlessHandle(7),
        uv_scale: [0.5, 2.0],
        layer: -3,
        emissive: Vec3::ZERO,
        tiles: Vec2::ONE,
    };
    let layout = ParameterLayout::<Material>::build();
    let bytes = encode_parameters(&layout, &material);
    let float = |at: usize| f32::from_ne_bytes(bytes[at..at + 4].try_into().unwrap());
    let word = |at: usize| u32::from_ne_bytes(bytes[at..at + 4].try_into().unwrap());

    assert_eq!(word(0), 1);
    for i in 0..16 {
        assert_eq!(float(16 + i * 4), (i + 1) as f32);
    }
    assert_eq!(word(80), 7);
    assert_eq!(float(84), 0.5);
    assert_eq!(word(92) as i32, -3);
    assert_eq!(float(116), 1.0);
}
