//! Configuration for the `jdiff` command-line tool.

use std::path::Path;

use serde::{Deserialize, Serialize};

use jdiff_core::{EncoderConfig, Version};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Encoder settings.
    pub encoder: EncoderSection,
    /// Input/output file handling.
    pub io: IoConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Encoder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSection {
    /// Diff version applied to every frame after the first.
    pub version: Version,
    /// Compression quality, 1..=100.
    pub quality: u8,
    /// Name of the reconstruction thread.
    pub thread_name: String,
}

/// File handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    /// File extensions (case-insensitive) treated as input frames.
    pub extensions: Vec<String>,
    /// Prefix for frame files written by `encode` and `decode`.
    pub frame_prefix: String,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for EncoderSection {
    fn default() -> Self {
        let core = EncoderConfig::default();
        Self {
            version: Version::V4,
            quality: core.quality,
            thread_name: core.thread_name,
        }
    }
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["jpg".into(), "jpeg".into()],
            frame_prefix: "frame".into(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl CliConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Whether `path` has one of the configured frame extensions.
    pub fn is_frame_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.io
                    .extensions
                    .iter()
                    .any(|want| want.eq_ignore_ascii_case(ext))
            })
    }

    /// Convert encoder settings into the core `EncoderConfig`.
    pub fn to_encoder_config(&self) -> EncoderConfig {
        EncoderConfig {
            quality: self.encoder.quality.clamp(1, 100),
            thread_name: self.encoder.thread_name.clone(),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let text = toml::to_string_pretty(&CliConfig::default()).unwrap();
        assert!(text.contains("quality"));
        assert!(text.contains("version = 4"));
    }

    #[test]
    fn roundtrip_config() {
        let text = toml::to_string_pretty(&CliConfig::default()).unwrap();
        let parsed: CliConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.encoder.quality, 80);
        assert_eq!(parsed.encoder.version, Version::V4);
        assert_eq!(parsed.logging.level, "info");
    }

    #[test]
    fn unsupported_version_in_file_is_rejected() {
        assert!(toml::from_str::<CliConfig>("[encoder]\nversion = 7\n").is_err());
    }

    #[test]
    fn to_encoder_config_clamps() {
        let mut cfg = CliConfig::default();
        cfg.encoder.quality = 0;
        assert_eq!(cfg.to_encoder_config().quality, 1);
    }

    #[test]
    fn frame_files_match_extension_case_insensitively() {
        let cfg = CliConfig::default();
        assert!(cfg.is_frame_file(Path::new("a/0001.JPG")));
        assert!(cfg.is_frame_file(Path::new("0002.jpeg")));
        assert!(!cfg.is_frame_file(Path::new("manifest.json")));
        assert!(!cfg.is_frame_file(Path::new("README")));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = CliConfig::load(Path::new("/definitely/not/here.toml"));
        assert_eq!(cfg.io.frame_prefix, "frame");
    }
}
