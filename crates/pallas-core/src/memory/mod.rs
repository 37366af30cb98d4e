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

//! Alignment helpers for laying out data in GPU-visible memory.
//!
//! Every alignment in this module must be a power of two. Passing anything else
//! is a programming error and aborts with a diagnostic rather than returning an
//! error, since no caller can meaningfully recover from a broken layout rule.

/// Returns the smallest multiple of `alignment` that is greater than or equal to `offset`.
///
/// # Panics
///
/// Panics if `alignment` is not a power of two, or if the aligned value does not
/// fit in a `u64`.
///
/// # Examples
///
/// ```
/// use pallas_core::memory::align_up;
/// assert_eq!(align_up(0, 16), 0);
/// assert_eq!(align_up(13, 4), 16);
/// assert_eq!(align_up(32, 16), 32);
/// ```
#[inline]
pub fn align_up(offset: u64, alignment: u64) -> u64 {
    assert!(
        alignment.is_power_of_two(),
        "align_up: alignment {alignment} is not a power of two"
    );
    let mask = alignment - 1;
    match offset.checked_add(mask) {
        Some(bumped) => bumped & !mask,
        None => panic!("align_up: offset {offset} overflows when aligned to {alignment}"),
    }
}

/// Returns `true` if `offset` is a multiple of `alignment`.
///
/// # Panics
///
/// Panics if `alignment` is not a power of two.
#[inline]
pub fn is_aligned(offset: u64, alignment: u64) -> bool {
    assert!(
        alignment.is_power_of_two(),
        "is_aligned: alignment {alignment} is not a power of two"
    );
    offset & (alignment - 1) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_up_rounds_to_next_multiple() {
        assert_eq!(align_up(0, 4), 0);
        assert_eq!(align_up(1, 4), 4);
        assert_eq!(align_up(4, 4), 4);
        assert_eq!(align_up(5, 16), 16);
        assert_eq!(align_up(17, 16), 32);
        assert_eq!(align_up(7, 1), 7);
    }

    #[test]
    fn align_up_is_idempotent_and_bounded() {
        for shift in 0..8 {
            let alignment = 1u64 << shift;
            for offset in 0..300u64 {
                let aligned = align_up(offset, alignment);
                assert_eq!(align_up(aligned, alignment), aligned);
                assert!(aligned >= offset);
                assert!(aligned <= offset + alignment - 1);
                assert!(is_aligned(aligned, alignment));
            }
        }
    }

    #[test]
    #[should_panic(expected = "not a power of two")]
    fn align_up_rejects_non_power_of_two() {
        align_up(10, 12);
    }

    #[test]
    #[should_panic(expected = "not a power of two")]
    fn align_up_rejects_zero_alignment() {
        align_up(10, 0);
    }

    #[test]
    #[should_panic(expected = "overflows")]
    fn align_up_detects_overflow() {
        align_up(u64::MAX, 16);
    }
}
