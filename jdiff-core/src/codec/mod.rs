//! Image codec seam.
//!
//! The pipeline never looks inside a compressed frame. It only needs to turn
//! codec-native bytes into packed RGB8 samples and back, reusing buffers
//! across calls. [`JpegCodec`] is the bundled backend.

pub mod jpeg;

use bytes::BytesMut;

use crate::error::Result;
use crate::types::Dimensions;

pub use jpeg::JpegCodec;

/// Lowest accepted compression quality.
pub const MIN_QUALITY: u8 = 1;
/// Highest accepted compression quality.
pub const MAX_QUALITY: u8 = 100;

/// Clamp an arbitrary quality request into `MIN_QUALITY..=MAX_QUALITY`.
pub fn clamp_quality(quality: i32) -> u8 {
    quality.clamp(MIN_QUALITY as i32, MAX_QUALITY as i32) as u8
}

/// A lossy image codec working on packed RGB8 buffers.
///
/// Implementations are single-owner and need not be thread safe; the
/// pipeline serializes every call.
pub trait ImageCodec: Send {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Decode `data` into `out`, replacing its contents.
    fn decompress(&mut self, data: &[u8], out: &mut Vec<u8>) -> Result<Dimensions>;

    /// Encode `pixels` into `out`, replacing its contents, and return the
    /// compressed length.
    fn compress(
        &mut self,
        pixels: &[u8],
        dims: Dimensions,
        quality: u8,
        out: &mut BytesMut,
    ) -> Result<usize>;

    /// Length produced by the most recent successful [`compress`](Self::compress).
    fn last_compressed_size(&self) -> usize;
}

impl<T: ImageCodec + ?Sized> ImageCodec for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn decompress(&mut self, data: &[u8], out: &mut Vec<u8>) -> Result<Dimensions> {
        (**self).decompress(data, out)
    }

    fn compress(
        &mut self,
        pixels: &[u8],
        dims: Dimensions,
        quality: u8,
        out: &mut BytesMut,
    ) -> Result<usize> {
        (**self).compress(pixels, dims, quality, out)
    }

    fn last_compressed_size(&self) -> usize {
        (**self).last_compressed_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_is_clamped() {
        assert_eq!(clamp_quality(-4), 1);
        assert_eq!(clamp_quality(0), 1);
        assert_eq!(clamp_quality(80), 80);
        assert_eq!(clamp_quality(101), 100);
        assert_eq!(clamp_quality(i32::MAX), 100);
    }
}
