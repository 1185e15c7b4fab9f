//! Async front-end for [`DiffEncoder`].
//!
//! `encode_frame` can block on the reconstruction barrier, which must not
//! happen on a Tokio worker. [`EncoderService`] moves each call onto the
//! blocking pool and can be cloned freely across tasks; clones share one
//! encoder and therefore one stream.
//!
//! ```no_run
//! # use jdiff_core::{DiffEncoder, EncoderService};
//! # async fn example(frames: Vec<bytes::Bytes>) -> jdiff_core::Result<()> {
//! let service = EncoderService::new(DiffEncoder::new()?);
//! for frame in frames {
//!     let encoded = service.encode(frame, 2).await?;
//!     // … transmit encoded.data with encoded.version …
//! }
//! service.dispose().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use bytes::Bytes;

use crate::codec::{ImageCodec, JpegCodec};
use crate::encoder::{DiffEncoder, EncodedFrame};
use crate::error::Result;
use crate::stats::EncoderStats;

/// Cloneable async handle to a shared [`DiffEncoder`].
pub struct EncoderService<C = JpegCodec> {
    encoder: Arc<DiffEncoder<C>>,
}

impl<C> Clone for EncoderService<C> {
    fn clone(&self) -> Self {
        Self {
            encoder: Arc::clone(&self.encoder),
        }
    }
}

impl<C: ImageCodec + 'static> EncoderService<C> {
    pub fn new(encoder: DiffEncoder<C>) -> Self {
        Self {
            encoder: Arc::new(encoder),
        }
    }

    /// The shared encoder, for synchronous access.
    pub fn encoder(&self) -> &DiffEncoder<C> {
        &self.encoder
    }

    /// Encode the next frame on the blocking pool.
    pub async fn encode(&self, input: Bytes, version: u32) -> Result<EncodedFrame> {
        let encoder = Arc::clone(&self.encoder);
        tokio::task::spawn_blocking(move || encoder.encode_frame(&input, version)).await?
    }

    /// Set the compression quality (clamped to 1..=100).
    pub fn set_quality(&self, quality: i32) {
        self.encoder.set_quality(quality);
    }

    pub fn stats(&self) -> EncoderStats {
        self.encoder.stats()
    }

    /// Dispose the shared encoder; every clone observes it.
    pub async fn dispose(&self) -> Result<()> {
        let encoder = Arc::clone(&self.encoder);
        tokio::task::spawn_blocking(move || encoder.dispose()).await?;
        Ok(())
    }
}
