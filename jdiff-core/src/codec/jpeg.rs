//! Pure-Rust JPEG backend built on the `image` crate.

use std::io::Cursor;

use bytes::{BufMut, BytesMut};
use image::codecs::jpeg::{JpegDecoder, JpegEncoder};
use image::{ColorType, DynamicImage, ExtendedColorType, ImageDecoder, ImageEncoder};

use crate::codec::ImageCodec;
use crate::error::{JdiffError, Result};
use crate::types::Dimensions;

/// Baseline JPEG codec. Decoded frames are always converted to RGB8.
#[derive(Debug, Default)]
pub struct JpegCodec {
    last_size: usize,
}

impl JpegCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ImageCodec for JpegCodec {
    fn name(&self) -> &str {
        "jpeg"
    }

    fn decompress(&mut self, data: &[u8], out: &mut Vec<u8>) -> Result<Dimensions> {
        let decoder = JpegDecoder::new(Cursor::new(data))?;
        let (width, height) = decoder.dimensions();
        let dims = Dimensions::new(width, height);

        out.clear();
        if decoder.color_type() == ColorType::Rgb8 {
            // Same-size frames land in the existing allocation.
            out.resize(dims.byte_len(), 0);
            decoder.read_image(out)?;
        } else {
            let image = DynamicImage::from_decoder(decoder)?.into_rgb8();
            out.extend_from_slice(image.as_raw());
        }
        Ok(dims)
    }

    fn compress(
        &mut self,
        pixels: &[u8],
        dims: Dimensions,
        quality: u8,
        out: &mut BytesMut,
    ) -> Result<usize> {
        if pixels.len() != dims.byte_len() {
            return Err(JdiffError::LengthMismatch {
                expected: dims.byte_len(),
                actual: pixels.len(),
            });
        }

        out.clear();
        let mut writer = (&mut *out).writer();
        JpegEncoder::new_with_quality(&mut writer, quality).write_image(
            pixels,
            dims.width,
            dims.height,
            ExtendedColorType::Rgb8,
        )?;

        self.last_size = out.len();
        Ok(self.last_size)
    }

    fn last_compressed_size(&self) -> usize {
        self.last_size
    }
}

// ── Tests ────────────────────────────────────────────────────────
