//! Per-channel difference images.
//!
//! The encoder replaces a candidate frame with
//! `table[255 + (candidate[i] - reference[i])]` for every channel sample;
//! the viewer applies the reverse mapping on top of its previous frame.
//! Both operate in place on caller-owned buffers and never allocate.

use crate::error::{JdiffError, Result};
use crate::quant::{self, DELTA_OFFSET};
use crate::version::Version;

/// Overwrite `candidate` with its quantized difference from `reference`.
///
/// Fails with [`JdiffError::LengthMismatch`] when the buffers differ in
/// length; `candidate` is left untouched in that case.
pub fn compute_diff_in_place(candidate: &mut [u8], reference: &[u8], version: Version) -> Result<()> {
    check_lengths(candidate.len(), reference.len())?;
    let table = quant::encode_table(version);

    for (sample, &previous) in candidate.iter_mut().zip(reference) {
        let index = (*sample as i16 - previous as i16 + DELTA_OFFSET) as usize;
        *sample = table[index];
    }
    Ok(())
}

/// Apply a decoded difference image to `frame`, producing the next frame.
///
/// Results are clamped to `0..=255`.
pub fn reverse_diff_in_place(frame: &mut [u8], diff: &[u8], version: Version) -> Result<()> {
    check_lengths(diff.len(), frame.len())?;
    let reverse = quant::reverse_table(version);

    for (sample, &byte) in frame.iter_mut().zip(diff) {
        *sample = (*sample as i16 + reverse[byte as usize]).clamp(0, 255) as u8;
    }
    Ok(())
}

fn check_lengths(actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        return Err(JdiffError::LengthMismatch { expected, actual });
    }
    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────
