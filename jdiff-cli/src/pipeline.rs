//! Directory-to-directory encode and decode runs.
//!
//! `encode_sequence` feeds every frame file of an input directory, in
//! name order, through one shared [`EncoderService`] and writes the
//! encoded frames plus a [`Manifest`]. `decode_sequence` replays such a
//! directory through a [`DiffDecoder`], producing what a viewer would show.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};
use tracing::{debug, info, warn};

use jdiff_core::{
    DiffDecoder, DiffEncoder, DiffReverser, EncoderService, EncoderStats, ImageCodec, JdiffError,
    JpegCodec, Result, Throughput, ThroughputMeter, Version,
};

use crate::config::CliConfig;
use crate::manifest::{Manifest, ManifestEntry};

/// Quality used when re-compressing reconstructed frames for inspection.
const DECODE_OUTPUT_QUALITY: u8 = 95;

// ── Summaries ────────────────────────────────────────────────────

/// Result of an encode run.
#[derive(Debug, Clone)]
pub struct EncodeSummary {
    pub frames_written: usize,
    /// Inputs skipped as undecodable or wrongly sized.
    pub frames_skipped: usize,
    pub stats: EncoderStats,
    pub elapsed: Duration,
    /// Output rate over the final frames; `None` for very short runs.
    pub throughput: Option<Throughput>,
}

/// Result of a decode run.
#[derive(Debug, Clone, Copy)]
pub struct DecodeSummary {
    pub frames_written: usize,
    /// Encoded bytes listed in the manifest.
    pub bytes_read: usize,
    pub elapsed: Duration,
}

// ── Encode ───────────────────────────────────────────────────────

/// Frame files of `dir` matching the configured extensions, sorted by name.
pub async fn list_frames(config: &CliConfig, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut frames = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && config.is_frame_file(&path) {
            frames.push(path);
        }
    }
    frames.sort();
    Ok(frames)
}

fn frame_file_name(prefix: &str, index: u64) -> String {
    format!("{prefix}_{index:05}.jpg")
}

/// Encode every frame in `input` into `output` with one diff version.
///
/// Frames that fail to decode or do not match the stream size are logged
/// and skipped. Stops early when `running` is cleared. The manifest is
/// written on every exit after the output directory exists, so frame
/// files on disk are always described.
pub async fn encode_sequence(
    config: &CliConfig,
    input: &Path,
    output: &Path,
    version: Version,
    running: Arc<AtomicBool>,
) -> Result<EncodeSummary> {
    let started = Instant::now();
    let frames = list_frames(config, input).await?;
    if frames.is_empty() {
        return Err(JdiffError::Other(format!(
            "no frame files in {}",
            input.display()
        )));
    }
    tokio::fs::create_dir_all(output).await?;

    let service = EncoderService::new(DiffEncoder::with_config(config.to_encoder_config())?);
    let mut progress = Progress::default();

    info!(
        "encoding {} frames from {} with {version}",
        frames.len(),
        input.display()
    );

    let run = encode_frames(config, &service, &frames, output, version, &running, &mut progress).await;
    progress.manifest.save(output)?;
    let stats = service.stats();
    service.dispose().await?;
    run?;

    Ok(EncodeSummary {
        frames_written: progress.manifest.frames.len(),
        frames_skipped: progress.skipped,
        stats,
        elapsed: started.elapsed(),
        throughput: progress.meter.throughput(),
    })
}

#[derive(Default)]
struct Progress {
    manifest: Manifest,
    meter: ThroughputMeter,
    skipped: usize,
}

async fn encode_frames(
    config: &CliConfig,
    service: &EncoderService,
    frames: &[PathBuf],
    output: &Path,
    version: Version,
    running: &AtomicBool,
    progress: &mut Progress,
) -> Result<()> {
    for path in frames {
        if !running.load(Ordering::SeqCst) {
            info!("stop requested; finishing early");
            break;
        }

        let data = Bytes::from(tokio::fs::read(path).await?);
        let frame = match service.encode(data, version.number()).await {
            Ok(frame) => frame,
            Err(JdiffError::DimensionMismatch { expected, actual }) => {
                warn!(
                    "skipping {}: {actual} does not match stream size {expected}",
                    path.display()
                );
                progress.skipped += 1;
                continue;
            }
            Err(JdiffError::Codec(reason)) => {
                warn!("skipping {}: {reason}", path.display());
                progress.skipped += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        let file = frame_file_name(&config.io.frame_prefix, frame.sequence);
        tokio::fs::write(output.join(&file), &frame.data).await?;
        progress.meter.record(frame.len() as u64);
        debug!(
            "{} -> {file} ({} bytes{})",
            path.display(),
            frame.len(),
            if frame.keyframe { ", keyframe" } else { "" }
        );
        progress
            .manifest
            .push(ManifestEntry::from_frame(file, &frame), frame.dimensions);
    }

    Ok(())
}

// ── Decode ───────────────────────────────────────────────────────

/// Reconstruct every frame listed in `input`'s manifest into `output`.
pub async fn decode_sequence(
    config: &CliConfig,
    input: &Path,
    output: &Path,
    running: Arc<AtomicBool>,
) -> Result<DecodeSummary> {
    let started = Instant::now();
    let manifest = Manifest::load(input)?;
    tokio::fs::create_dir_all(output).await?;

    info!(
        "decoding {} frames ({}) from {}",
        manifest.frames.len(),
        manifest.dimensions,
        input.display()
    );

    let bytes_read = manifest.total_bytes();
    let input = input.to_path_buf();
    let output = output.to_path_buf();
    let prefix = config.io.frame_prefix.clone();
    let frames_written = tokio::task::spawn_blocking(move || {
        replay(&manifest, &input, &output, &prefix, &running)
    })
    .await??;

    Ok(DecodeSummary {
        frames_written,
        bytes_read,
        elapsed: started.elapsed(),
    })
}

fn replay(
    manifest: &Manifest,
    input: &Path,
    output: &Path,
    prefix: &str,
    running: &AtomicBool,
) -> Result<usize> {
    let mut decoder = DiffDecoder::new();
    let mut codec = JpegCodec::new();
    let mut out = BytesMut::new();

    for (index, entry) in manifest.frames.iter().enumerate() {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        let data = std::fs::read(input.join(&entry.file))?;
        let pixels = decoder.decode_frame(&data, entry.version)?;
        if pixels.len() != manifest.dimensions.byte_len() {
            return Err(JdiffError::LengthMismatch {
                expected: manifest.dimensions.byte_len(),
                actual: pixels.len(),
            });
        }

        out.clear();
        codec.compress(pixels, manifest.dimensions, DECODE_OUTPUT_QUALITY, &mut out)?;
        std::fs::write(output.join(frame_file_name(prefix, index as u64)), &out)?;
    }
    Ok(decoder.frames_decoded() as usize)
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use jdiff_core::Dimensions;

    const DIMS: Dimensions = Dimensions::new(48, 32);

    fn jpeg(dims: Dimensions, shift: u32) -> Vec<u8> {
        let mut pixels = Vec::with_capacity(dims.byte_len());
        for y in 0..dims.height {
            for x in 0..dims.width {
                pixels.push(((x + shift) * 4).min(255) as u8);
                pixels.push((y * 6).min(255) as u8);
                pixels.push(120);
            }
        }
        let mut out = BytesMut::new();
        JpegCodec::new().compress(&pixels, dims, 95, &mut out).unwrap();
        out.to_vec()
    }

    fn pixels_of(path: &Path) -> Vec<u8> {
        let mut pixels = Vec::new();
        JpegCodec::new()
            .decompress(&std::fs::read(path).unwrap(), &mut pixels)
            .unwrap();
        pixels
    }

    fn running() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(true))
    }

    #[tokio::test]
    async fn encode_then_decode_directory() {
        let input = tempfile::tempdir().unwrap();
        let encoded = tempfile::tempdir().unwrap();
        let decoded = tempfile::tempdir().unwrap();
        for i in 0..5u32 {
            std::fs::write(input.path().join(format!("{i:03}.jpg")), jpeg(DIMS, i)).unwrap();
        }
        std::fs::write(input.path().join("notes.txt"), "not a frame").unwrap();

        let config = CliConfig::default();
        let summary = encode_sequence(
            &config,
            input.path(),
            encoded.path(),
            Version::V3,
            running(),
        )
        .await
        .unwrap();
        assert_eq!(summary.frames_written, 5);
        assert_eq!(summary.frames_skipped, 0);
        assert_eq!(summary.stats.keyframes, 1);
        let rate = summary.throughput.expect("five frames give a rate");
        assert!(rate.frames_per_sec > 0.0);

        let manifest = Manifest::load(encoded.path()).unwrap();
        assert_eq!(manifest.dimensions, DIMS);
        assert!(manifest.frames[0].keyframe);
        assert!(manifest.frames.iter().all(|f| f.version == Version::V3));

        let result = decode_sequence(&config, encoded.path(), decoded.path(), running())
            .await
            .unwrap();
        assert_eq!(result.frames_written, 5);
        assert_eq!(result.bytes_read as u64, summary.stats.output_bytes);

        for i in 0..5u64 {
            let original = pixels_of(&input.path().join(format!("{i:03}.jpg")));
            let shown = pixels_of(&decoded.path().join(frame_file_name("frame", i)));
            let error: u64 = original
                .iter()
                .zip(&shown)
                .map(|(&a, &b)| a.abs_diff(b) as u64)
                .sum();
            let mean = error as f64 / original.len() as f64;
            assert!(mean < 12.0, "frame {i}: mean abs error {mean:.2}");
        }
    }

    #[tokio::test]
    async fn mismatched_frames_are_skipped() {
        let input = tempfile::tempdir().unwrap();
        let encoded = tempfile::tempdir().unwrap();
        std::fs::write(input.path().join("a.jpg"), jpeg(DIMS, 0)).unwrap();
        std::fs::write(input.path().join("b.jpg"), jpeg(Dimensions::new(16, 16), 0)).unwrap();
        std::fs::write(input.path().join("c.jpg"), jpeg(DIMS, 1)).unwrap();

        let summary = encode_sequence(
            &CliConfig::default(),
            input.path(),
            encoded.path(),
            Version::V1,
            running(),
        )
        .await
        .unwrap();
        assert_eq!(summary.frames_written, 2);
        assert_eq!(summary.frames_skipped, 1);
    }

    #[tokio::test]
    async fn corrupt_frames_are_skipped_and_stream_still_decodes() {
        let input = tempfile::tempdir().unwrap();
        let encoded = tempfile::tempdir().unwrap();
        let decoded = tempfile::tempdir().unwrap();
        std::fs::write(input.path().join("a.jpg"), jpeg(DIMS, 0)).unwrap();
        std::fs::write(input.path().join("b.jpg"), b"\xff\xd8 truncated").unwrap();
        std::fs::write(input.path().join("c.jpg"), jpeg(DIMS, 2)).unwrap();

        let config = CliConfig::default();
        let summary = encode_sequence(
            &config,
            input.path(),
            encoded.path(),
            Version::V4,
            running(),
        )
        .await
        .unwrap();
        assert_eq!(summary.frames_written, 2);
        assert_eq!(summary.frames_skipped, 1);

        let manifest = Manifest::load(encoded.path()).unwrap();
        assert_eq!(manifest.frames.len(), 2);
        let result = decode_sequence(&config, encoded.path(), decoded.path(), running())
            .await
            .unwrap();
        assert_eq!(result.frames_written, 2);
    }

    #[tokio::test]
    async fn stop_flag_ends_run() {
        let input = tempfile::tempdir().unwrap();
        let encoded = tempfile::tempdir().unwrap();
        std::fs::write(input.path().join("a.jpg"), jpeg(DIMS, 0)).unwrap();

        let summary = encode_sequence(
            &CliConfig::default(),
            input.path(),
            encoded.path(),
            Version::V2,
            Arc::new(AtomicBool::new(false)),
        )
        .await
        .unwrap();
        assert_eq!(summary.frames_written, 0);
        assert!(encoded.path().join(crate::manifest::MANIFEST_FILE).exists());
    }

    #[tokio::test]
    async fn empty_input_is_an_error() {
        let input = tempfile::tempdir().unwrap();
        let encoded = tempfile::tempdir().unwrap();
        let err = encode_sequence(
            &CliConfig::default(),
            input.path(),
            encoded.path(),
            Version::V4,
            running(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, JdiffError::Other(_)));
    }
}
