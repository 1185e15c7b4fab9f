//! Viewer-side frame reconstruction.
//!
//! [`DiffDecoder`] is what a remote viewer runs: the first frame of a
//! stream is an ordinary image, every later frame is a quantized
//! difference image that is reversed on top of the previous frame.
//!
//! The encoder runs its own instance on the reconstruction thread so its
//! reference frame is exactly what the viewer ends up displaying.

use crate::codec::{ImageCodec, JpegCodec};
use crate::diff;
use crate::error::{JdiffError, Result};
use crate::types::Dimensions;
use crate::version::{SUPPORTED_VERSIONS, Version};

// ── DiffReverser ─────────────────────────────────────────────────

/// Reconstructs viewer-visible frames from an encoded stream.
pub trait DiffReverser: Send {
    /// Versions this reverser can decode.
    fn supported_versions(&self) -> &[u32] {
        &SUPPORTED_VERSIONS
    }

    /// Dimensions fixed by the first decoded frame, if any.
    fn dimensions(&self) -> Option<Dimensions>;

    /// Decode the next frame of the stream and return the full
    /// reconstructed image as packed RGB8.
    fn decode_frame(&mut self, data: &[u8], version: Version) -> Result<&[u8]>;
}

// ── DiffDecoder ──────────────────────────────────────────────────

/// Stateful stream decoder holding the viewer's current frame.
pub struct DiffDecoder<C = JpegCodec> {
    codec: C,
    /// Most recently reconstructed frame.
    frame: Vec<u8>,
    /// Decoded difference image, reused across frames.
    scratch: Vec<u8>,
    dims: Option<Dimensions>,
    frames_decoded: u64,
}

impl DiffDecoder<JpegCodec> {
    /// Decoder backed by the bundled JPEG codec.
    pub fn new() -> Self {
        Self::with_codec(JpegCodec::new())
    }
}

impl Default for DiffDecoder<JpegCodec> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ImageCodec> DiffDecoder<C> {
    pub fn with_codec(codec: C) -> Self {
        Self {
            codec,
            frame: Vec::new(),
            scratch: Vec::new(),
            dims: None,
            frames_decoded: 0,
        }
    }

    /// Number of frames decoded so far.
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }
}

impl<C: ImageCodec> DiffReverser for DiffDecoder<C> {
    fn dimensions(&self) -> Option<Dimensions> {
        self.dims
    }

    fn decode_frame(&mut self, data: &[u8], version: Version) -> Result<&[u8]> {
        match self.dims {
            None => {
                let dims = self.codec.decompress(data, &mut self.frame)?;
                self.dims = Some(dims);
            }
            Some(expected) => {
                let actual = self.codec.decompress(data, &mut self.scratch)?;
                if actual != expected {
                    return Err(JdiffError::DimensionMismatch { expected, actual });
                }
                diff::reverse_diff_in_place(&mut self.frame, &self.scratch, version)?;
            }
        }

        self.frames_decoded += 1;
        Ok(&self.frame)
    }
}

// ── Tests ────────────────────────────────────────────────────────
