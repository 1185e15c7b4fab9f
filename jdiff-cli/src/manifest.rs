//! Stream manifest written next to encoded frames.
//!
//! The version of each frame travels out of band; on disk that band is a
//! `manifest.json` listing every frame in stream order.

use std::path::Path;

use serde::{Deserialize, Serialize};

use jdiff_core::{Dimensions, EncodedFrame, JdiffError, Result, Version};

/// File name of the manifest inside an encoded directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Ordered description of an encoded stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Frame size fixed by the keyframe.
    pub dimensions: Dimensions,
    /// Frames in stream order.
    pub frames: Vec<ManifestEntry>,
}

/// One encoded frame on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// File name relative to the manifest.
    pub file: String,
    pub version: Version,
    pub keyframe: bool,
    pub bytes: usize,
}

impl ManifestEntry {
    pub fn from_frame(file: String, frame: &EncodedFrame) -> Self {
        Self {
            file,
            version: frame.version,
            keyframe: frame.keyframe,
            bytes: frame.len(),
        }
    }
}

impl Manifest {
    pub fn push(&mut self, entry: ManifestEntry, dims: Dimensions) {
        if self.frames.is_empty() {
            self.dimensions = dims;
        }
        self.frames.push(entry);
    }

    pub fn total_bytes(&self) -> usize {
        self.frames.iter().map(|f| f.bytes).sum()
    }

    pub fn load(dir: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(dir.join(MANIFEST_FILE))?;
        let manifest: Manifest =
            serde_json::from_str(&text).map_err(|e| JdiffError::Config(e.to_string()))?;
        if manifest.frames.first().is_some_and(|f| !f.keyframe) {
            return Err(JdiffError::Config(
                "manifest does not start with a keyframe".into(),
            ));
        }
        Ok(manifest)
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        let text =
            serde_json::to_string_pretty(self).map_err(|e| JdiffError::Config(e.to_string()))?;
        std::fs::write(dir.join(MANIFEST_FILE), text)?;
        Ok(())
    }
}
