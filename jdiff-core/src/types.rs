//! Shared frame types used across the pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Channels per decoded pixel. Every codec in this crate works in packed RGB8.
pub const CHANNELS: usize = 3;

// ── Dimensions ───────────────────────────────────────────────────

/// Width and height of a decoded frame, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Length of the packed RGB8 buffer for a frame of this size.
    pub const fn byte_len(self) -> usize {
        self.width as usize * self.height as usize * CHANNELS
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
