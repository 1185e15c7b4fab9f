//! Encoder configuration.

use serde::{Deserialize, Serialize};

use crate::codec;

/// Settings for a [`crate::DiffEncoder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Compression quality for diff frames, 1..=100.
    pub quality: u8,
    /// Name given to the reconstruction thread.
    pub thread_name: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            quality: 80,
            thread_name: "jdiff-reconstruct".into(),
        }
    }
}

impl EncoderConfig {
    /// Quality clamped into the accepted range.
    pub fn effective_quality(&self) -> u8 {
        codec::clamp_quality(self.quality as i32)
    }
}
