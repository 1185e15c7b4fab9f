//! # jdiff-core
//!
//! Drift-free difference video over a lossy image codec.
//!
//! Instead of compressing every frame on its own, the encoder compresses the
//! per-channel difference between the new frame and the frame the viewer
//! already has. It then decodes its own output on a background thread,
//! exactly like the viewer will, and diffs the next frame against *that*
//! result. Compression error never accumulates.
//!
//! ```text
//! input JPEG ─► decompress ─► diff vs reference ─► compress ─► output JPEG
//!                                   ▲                              │
//!                                   └──── reconstruct (thread) ◄───┘
//! ```
//!
//! This crate contains:
//! - **Quantization**: `quant` tables remapping deltas into bytes, selected by `Version`
//! - **Diff**: in-place diff and reverse-diff kernels
//! - **Codec**: the `ImageCodec` seam and the bundled `JpegCodec`
//! - **Decoder**: `DiffDecoder`, the viewer-side `DiffReverser`
//! - **Reference**: the reconstruction thread and its handoff
//! - **Encoder**: `DiffEncoder`, the synchronized pipeline
//! - **Service**: `EncoderService`, an async handle for Tokio callers
//! - **Error**: `JdiffError`, a `thiserror`-based error hierarchy

pub mod codec;
pub mod config;
pub mod decoder;
pub mod diff;
pub mod encoder;
pub mod error;
pub mod quant;
pub mod reference;
pub mod service;
pub mod stats;
pub mod types;
pub mod version;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use codec::{ImageCodec, JpegCodec};
pub use config::EncoderConfig;
pub use decoder::{DiffDecoder, DiffReverser};
pub use encoder::{DiffEncoder, EncodedFrame};
pub use error::{JdiffError, Result};
pub use reference::ReferenceFrame;
pub use service::EncoderService;
pub use stats::{EncoderStats, Throughput, ThroughputMeter};
pub use types::{CHANNELS, Dimensions};
pub use version::{SUPPORTED_VERSIONS, Version};
