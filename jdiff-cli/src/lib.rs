//! # jdiff-cli — command-line front-end
//!
//! Encodes a directory of JPEG frames into a difference stream on disk
//! and replays such a stream the way a remote viewer would.
//!
//! ## Layout
//!
//! - **config**: TOML configuration with defaults for every field.
//! - **manifest**: `manifest.json`, the per-frame version and keyframe record.
//! - **pipeline**: the async encode and decode runs.

pub mod config;
pub mod manifest;
pub mod pipeline;
