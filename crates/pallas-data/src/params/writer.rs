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

//! Packs parameter values into constant-buffer memory.

use super::layout::ParameterLayout;
use super::types::ParamType;
use pallas_core::renderer::MappedSpan;

/// Encodes every parameter of `source` into `dst` at its planned offset.
///
/// Bytes between parameters are left untouched.
///
/// # Panics
///
/// Panics if the layout does not fit in `dst`. That means the buffer was sized
/// for a different schema, which is a programming error.
pub fn write_parameters<T>(layout: &ParameterLayout<T>, source: &T, dst: &mut [u8]) {
    assert_fits(layout, dst.len());

    for (slot, encode) in layout.slots().iter().zip(&layout.encoders) {
        let start = slot.gpu_offset as usize;
        let end = start + slot.gpu_size as usize;
        encode(source, &mut dst[start..end]);
    }
}

/// Encodes `source` straight into a mapped buffer.
///
/// Each parameter is staged in a register-sized scratch block and copied with
/// [`MappedSpan::write`], so every store into mapped memory is bounds-checked.
///
/// # Panics
///
/// Panics if the layout does not fit in `dst`.
pub fn write_parameters_mapped<T>(layout: &ParameterLayout<T>, source: &T, dst: &mut MappedSpan) {
    assert_fits(layout, dst.len());

    let mut scratch = [0u8; ParamType::Matrix.gpu_size() as usize];
    for (slot, encode) in layout.slots().iter().zip(&layout.encoders) {
        let bytes = &mut scratch[..slot.gpu_size as usize];
        encode(source, bytes);
        dst.write(slot.gpu_offset as usize, bytes);
    }
}

fn assert_fits<T>(layout: &ParameterLayout<T>, len: usize) {
    let required = layout.required_capacity();
    assert!(
        required <= len as u64,
        "ParameterWriter({}): layout needs {} bytes but the destination holds {}",
        layout.type_name(),
        required,
        len
    );
}

/// Encodes `source` into a freshly zeroed byte vector of exactly `layout.size()` bytes.
pub fn encode_parameters<T>(layout: &ParameterLayout<T>, source: &T) -> Vec<u8> {
    let mut bytes = vec![0u8; layout.size() as usize];
    write_parameters(layout, source, &mut bytes);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param_schema;
    use crate::params::{SchemaBuilder, ShaderParameters};
    use pallas_core::math::{Vec2, Vec3};

    struct Straddle {
        position: Vec3,
        size: Vec2,
        visible: bool,
    }

    impl ShaderParameters for Straddle {
        fn declare(schema: &mut SchemaBuilder<Self>) {
            param_schema!(schema, Straddle { position, size, visible });
        }
    }

    fn sample() -> Straddle {
        Straddle {
            position: Vec3::new(1.0, 2.0, 3.0),
            size: Vec2::new(4.0, 5.0),
            visible: true,
        }
    }

    fn f32_at(bytes: &[u8], offset: usize) -> f32 {
        f32::from_ne_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    #[test]
    fn values_land_at_planned_offsets() {
        let layout = ParameterLayout::<Straddle>::build();
        let bytes = encode_parameters(&layout, &sample());

        assert_eq!(bytes.len(), 28);
        assert_eq!(f32_at(&bytes, 0), 1.0);
        assert_eq!(f32_at(&bytes, 8), 3.0);
        // float2 pushed past the register boundary; 12..16 stays padding.
        assert_eq!(&bytes[12..16], &[0, 0, 0, 0]);
        assert_eq!(f32_at(&bytes, 16), 4.0);
        assert_eq!(f32_at(&bytes, 20), 5.0);
        assert_eq!(u32::from_ne_bytes(bytes[24..28].try_into().unwrap()), 1);
    }

    #[test]
    fn padding_is_left_untouched() {
        let layout = ParameterLayout::<Straddle>::build();
        let mut bytes = vec![0xCDu8; 32];
        write_parameters(&layout, &sample(), &mut bytes);
        assert_eq!(&bytes[12..16], &[0xCD; 4]);
        assert_eq!(&bytes[28..32], &[0xCD; 4]);
    }

    #[test]
    #[should_panic(expected = "layout needs 28 bytes")]
    fn undersized_destination_is_fatal() {
        let layout = ParameterLayout::<Straddle>::build();
        let mut bytes = vec![0u8; 24];
        write_parameters(&layout, &sample(), &mut bytes);
    }

    #[test]
    fn mapped_write_matches_encoding() {
        let layout = ParameterLayout::<Straddle>::build();
        let mut storage = vec![0xCDu8; 32];
        let ptr = std::ptr::NonNull::new(storage.as_mut_ptr()).unwrap();
        // SAFETY: `storage` outlives the span and nothing else touches it meanwhile.
        let mut span = unsafe { MappedSpan::from_raw_parts(ptr, storage.len()) };

        write_parameters_mapped(&layout, &sample(), &mut span);

        let encoded = encode_parameters(&layout, &sample());
        assert_eq!(&storage[..12], &encoded[..12]);
        assert_eq!(&storage[12..16], &[0xCD; 4]);
        assert_eq!(&storage[16..28], &encoded[16..28]);
    }

    #[test]
    #[should_panic(expected = "layout needs 28 bytes")]
    fn undersized_mapping_is_fatal() {
        let layout = ParameterLayout::<Straddle>::build();
        let mut storage = vec![0u8; 16];
        let ptr = std::ptr::NonNull::new(storage.as_mut_ptr()).unwrap();
        let mut span = unsafe { MappedSpan::from_raw_parts(ptr, storage.len()) };
        write_parameters_mapped(&layout, &sample(), &mut span);
    }
}
