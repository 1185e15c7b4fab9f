//! Domain-specific error types for the jdiff pipeline.
//!
//! Only the caller path surfaces errors. Failures on the reconstruction
//! thread are logged and counted, never returned (see [`crate::reference`]).

use thiserror::Error;

use crate::types::Dimensions;

/// Convenience alias used throughout the crate.
pub type Result<T, E = JdiffError> = std::result::Result<T, E>;

/// The canonical error type for jdiff.
#[derive(Debug, Error)]
pub enum JdiffError {
    // ── Stream Errors ────────────────────────────────────────────
    /// The requested quantization version is not in [`crate::SUPPORTED_VERSIONS`].
    #[error("unsupported diff version: {0}")]
    UnsupportedVersion(u32),

    /// A frame did not match the dimensions fixed by the first frame.
    #[error("frame dimensions {actual} do not match the first frame ({expected})")]
    DimensionMismatch {
        expected: Dimensions,
        actual: Dimensions,
    },

    /// Two pixel buffers that must be the same length were not.
    #[error("pixel buffer length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    // ── Codec Errors ─────────────────────────────────────────────
    /// The image codec failed to compress or decompress a frame.
    #[error("codec error: {0}")]
    Codec(String),

    // ── Pipeline Errors ──────────────────────────────────────────
    /// The reconstruction thread exited while it still owned the reference frame.
    #[error("reconstruction thread stopped; reference frame unavailable")]
    ReconstructionStalled,

    /// The reconstruction thread could not be started.
    #[error("failed to start reconstruction thread: {0}")]
    Spawn(#[source] std::io::Error),

    // ── Surface Errors ───────────────────────────────────────────
    /// File-system I/O failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration or manifest file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Catch-all for errors that do not fit another variant.
    #[error("{0}")]
    Other(String),
}

// ── Convenient From implementations ──────────────────────────────

impl From<String> for JdiffError {
    fn from(s: String) -> Self {
        JdiffError::Other(s)
    }
}

impl From<&str> for JdiffError {
    fn from(s: &str) -> Self {
        JdiffError::Other(s.to_string())
    }
}

impl From<image::ImageError> for JdiffError {
    fn from(e: image::ImageError) -> Self {
        JdiffError::Codec(e.to_string())
    }
}

impl From<tokio::task::JoinError> for JdiffError {
    fn from(e: tokio::task::JoinError) -> Self {
        JdiffError::Other(format!("blocking task failed: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = JdiffError::UnsupportedVersion(9);
        assert!(e.to_string().contains('9'));

        let e = JdiffError::DimensionMismatch {
            expected: Dimensions::new(64, 64),
            actual: Dimensions::new(32, 64),
        };
        assert!(e.to_string().contains("32x64"));
        assert!(e.to_string().contains("64x64"));
    }

    #[test]
    fn from_string() {
        let e: JdiffError = "something broke".into();
        assert!(matches!(e, JdiffError::Other(_)));
    }

    #[test]
    fn from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let e: JdiffError = io_err.into();
        assert!(matches!(e, JdiffError::Io(_)));
    }
}
