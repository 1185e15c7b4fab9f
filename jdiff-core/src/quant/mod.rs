//! Quantization tables mapping signed pixel deltas into bytes.
//!
//! A lossy image codec spends far fewer bits on a flat, low-contrast image
//! than on a busy one. Every table is monotonic non-decreasing in the delta
//! and keeps small deltas distinguishable while pushing large ones towards
//! the extremes.
//!
//! The viewer inverts a table with [`reverse_table`]: each output byte maps
//! back to the smallest-magnitude delta that produces it, and bytes no delta
//! produces borrow the value of the nearest byte that one does.

mod tables;

use std::sync::LazyLock;

use crate::version::Version;

/// Number of entries in an encode table (deltas `-255..=255`).
pub const TABLE_LEN: usize = 511;

/// Offset added to a signed delta to index an encode table.
pub const DELTA_OFFSET: i16 = 255;

/// Delta index → output byte.
pub type QuantizationTable = [u8; TABLE_LEN];

/// Output byte → signed delta.
pub type ReverseTable = [i16; 256];

static REVERSE: LazyLock<[ReverseTable; 4]> = LazyLock::new(|| {
    Version::ALL.map(|v| build_reverse(encode_table(v)))
});

/// The encode table for `version`.
pub fn encode_table(version: Version) -> &'static QuantizationTable {
    match version {
        Version::V1 => &tables::ENCODE_V1,
        Version::V2 => &tables::ENCODE_V2,
        Version::V3 => &tables::ENCODE_V3,
        Version::V4 => &tables::ENCODE_V4,
    }
}

/// The viewer-side reversal table for `version`.
pub fn reverse_table(version: Version) -> &'static ReverseTable {
    &REVERSE[version.index()]
}

/// Quantize a single signed delta in `-255..=255`.
///
/// # Panics
///
/// Panics if `delta` is outside `-255..=255`.
#[inline]
pub fn quantize(version: Version, delta: i16) -> u8 {
    encode_table(version)[(delta + DELTA_OFFSET) as usize]
}

/// Map a quantized byte back to the delta the viewer applies.
#[inline]
pub fn dequantize(version: Version, byte: u8) -> i16 {
    reverse_table(version)[byte as usize]
}

fn build_reverse(table: &QuantizationTable) -> ReverseTable {
    let mut nearest: [Option<i16>; 256] = [None; 256];
    for (index, &byte) in table.iter().enumerate() {
        let delta = index as i16 - DELTA_OFFSET;
        let slot = &mut nearest[byte as usize];
        match *slot {
            Some(best) if best.abs() <= delta.abs() => {}
            _ => *slot = Some(delta),
        }
    }

    let mut reverse = [0i16; 256];
    for (byte, out) in reverse.iter_mut().enumerate() {
        *out = match nearest[byte] {
            Some(delta) => delta,
            None => nearest_reachable(&nearest, byte),
        };
    }
    reverse
}

/// Value of the closest byte that some delta encodes to.
fn nearest_reachable(nearest: &[Option<i16>; 256], byte: usize) -> i16 {
    for distance in 1..256 {
        let below = byte.checked_sub(distance).and_then(|b| nearest[b]);
        let above = nearest.get(byte + distance).copied().flatten();
        if let Some(delta) = below.or(above) {
            return delta;
        }
    }
    0
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn any_version() -> impl Strategy<Value = Version> {
        prop::sample::select(Version::ALL.to_vec())
    }

    #[test]
    fn tables_are_monotonic() {
        for v in Version::ALL {
            let table = encode_table(v);
            assert!(
                table.windows(2).all(|w| w[0] <= w[1]),
                "{v} table is not monotonic"
            );
        }
    }

    #[test]
    fn zero_delta_lands_mid_band() {
        assert_eq!(quantize(Version::V1, 0), 128);
        assert_eq!(quantize(Version::V2, 0), 127);
        assert_eq!(quantize(Version::V3, 0), 128);
        assert_eq!(quantize(Version::V4, 0), 128);
    }

    #[test]
    fn extremes_match_policy() {
        // V1 plateaus.
        assert_eq!(quantize(Version::V1, -255), 0);
        assert_eq!(quantize(Version::V1, -128), 0);
        assert_eq!(quantize(Version::V1, 255), 255);
        // V3 stays inside the half-height band.
        let v3 = encode_table(Version::V3);
        assert_eq!(v3.iter().min(), Some(&64));
        assert_eq!(v3.iter().max(), Some(&192));
        // V2 and V4 span the whole byte range.
        for v in [Version::V2, Version::V4] {
            assert_eq!(quantize(v, -255), 0);
            assert_eq!(quantize(v, 255), 255);
        }
    }

    #[test]
    fn uniform_plus_ten_under_v2() {
        assert_eq!(encode_table(Version::V2)[265], 132);
        assert_eq!(quantize(Version::V2, 10), 132);
    }

    #[test]
    fn reverse_is_right_inverse_on_reachable_bytes() {
        for v in Version::ALL {
            let table = encode_table(v);
            for &byte in table.iter() {
                assert_eq!(quantize(v, dequantize(v, byte)), byte, "{v} byte {byte}");
            }
        }
    }

    #[test]
    fn unreachable_bytes_borrow_nearest_band_edge() {
        assert_eq!(dequantize(Version::V3, 0), dequantize(Version::V3, 64));
        assert_eq!(dequantize(Version::V3, 255), dequantize(Version::V3, 192));
    }

    #[test]
    fn v1_clamps_to_plus_minus_128() {
        assert_eq!(dequantize(Version::V1, 0), -128);
        assert_eq!(dequantize(Version::V1, 255), 127);
    }

    proptest! {
        #[test]
        fn quantize_matches_table(v in any_version(), delta in -255i16..=255) {
            let byte = quantize(v, delta);
            prop_assert_eq!(byte, encode_table(v)[(delta + 255) as usize]);
            prop_assert_eq!(byte, quantize(v, delta));
        }

        #[test]
        fn v1_exact_within_127(delta in -127i16..=127) {
            prop_assert_eq!(dequantize(Version::V1, quantize(Version::V1, delta)), delta);
        }

        #[test]
        fn v4_exact_within_64(delta in -64i16..=64) {
            prop_assert_eq!(dequantize(Version::V4, quantize(Version::V4, delta)), delta);
        }

        #[test]
        fn reconstruction_error_is_bounded(delta in -255i16..=255) {
            let err = |v| (dequantize(v, quantize(v, delta)) - delta).abs();
            prop_assert!(err(Version::V2) <= 1);
            prop_assert!(err(Version::V3) <= 7);
            prop_assert!(err(Version::V4) <= 3);
        }
    }
}
