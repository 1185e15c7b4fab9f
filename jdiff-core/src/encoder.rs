//! Drift-free difference encoder.
//!
//! [`DiffEncoder`] turns a sequence of compressed frames into a sequence of
//! compressed *difference* frames. The first frame is passed through
//! unchanged; every later frame is diffed against the reference frame kept
//! by [`crate::reference`], quantized with the requested [`Version`], and
//! recompressed.
//!
//! ## Per-call cycle
//!
//! 1. Decompress the candidate into the diff buffer and check its size.
//! 2. Wait for the reconstruction of the previous output to finish.
//! 3. Diff in place against the reference.
//! 4. Compress the diff at the configured quality.
//! 5. Hand the output to the reconstruction thread.
//! 6. Return the output.
//!
//! Steps 1 and 5 let decoding of the new candidate overlap with
//! reconstruction of the previous frame.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use bytes::{Bytes, BytesMut};
use tracing::{debug, info};

use crate::codec::{self, ImageCodec, JpegCodec};
use crate::config::EncoderConfig;
use crate::decoder::{DiffDecoder, DiffReverser};
use crate::diff;
use crate::error::{JdiffError, Result};
use crate::reference::{ReferenceFrame, ReferenceTracker};
use crate::stats::{EncoderCounters, EncoderStats};
use crate::types::Dimensions;
use crate::version::{SUPPORTED_VERSIONS, Version};

// ── EncodedFrame ─────────────────────────────────────────────────

/// One encoded frame, ready for transmission.
///
/// `version` must reach the viewer alongside `data`.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    /// Zero-based position in the stream.
    pub sequence: u64,
    /// Version the frame was encoded with.
    pub version: Version,
    /// `true` for the pass-through first frame.
    pub keyframe: bool,
    /// Frame size in pixels.
    pub dimensions: Dimensions,
    /// Codec-native compressed bytes.
    pub data: Bytes,
}

impl EncodedFrame {
    fn empty(version: Version) -> Self {
        Self {
            sequence: 0,
            version,
            keyframe: false,
            dimensions: Dimensions::default(),
            data: Bytes::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// ── DiffEncoder ──────────────────────────────────────────────────

struct EncoderState<C> {
    codec: C,
    tracker: ReferenceTracker,
    /// Fixed by the first frame.
    dims: Option<Dimensions>,
    /// Candidate pixels, then the diff, reused across calls.
    diff: Vec<u8>,
    /// Compressed output; frozen slices are handed to callers.
    output: BytesMut,
    sequence: u64,
    disposed: bool,
}

/// Difference encoder for a single stream.
///
/// Every method takes `&self`; concurrent callers are serialized on one
/// internal lock, so sharing an instance behind an `Arc` is safe. Frames
/// from different callers are still one stream.
pub struct DiffEncoder<C = JpegCodec> {
    state: Mutex<EncoderState<C>>,
    quality: AtomicU8,
    counters: Arc<EncoderCounters>,
}

impl DiffEncoder<JpegCodec> {
    /// Encoder with the bundled JPEG codec and default settings.
    pub fn new() -> Result<Self> {
        Self::with_config(EncoderConfig::default())
    }

    pub fn with_config(config: EncoderConfig) -> Result<Self> {
        Self::with_parts(JpegCodec::new(), DiffDecoder::new(), config)
    }
}

impl<C: ImageCodec> DiffEncoder<C> {
    /// Build an encoder from explicit collaborators.
    ///
    /// `reverser` moves onto the reconstruction thread and must decode
    /// exactly like the viewer does.
    pub fn with_parts<R>(codec: C, reverser: R, config: EncoderConfig) -> Result<Self>
    where
        R: DiffReverser + 'static,
    {
        let counters = Arc::new(EncoderCounters::default());
        let tracker = ReferenceTracker::spawn(reverser, &config.thread_name, Arc::clone(&counters))?;

        info!(
            codec = codec.name(),
            quality = config.effective_quality(),
            "diff encoder started"
        );

        Ok(Self {
            state: Mutex::new(EncoderState {
                codec,
                tracker,
                dims: None,
                diff: Vec::new(),
                output: BytesMut::new(),
                sequence: 0,
                disposed: false,
            }),
            quality: AtomicU8::new(config.effective_quality()),
            counters,
        })
    }

    /// Encode the next frame of the stream.
    ///
    /// - An unknown `version` fails with [`JdiffError::UnsupportedVersion`]
    ///   before any state is touched.
    /// - After [`dispose`](Self::dispose) this returns an empty frame.
    /// - The first frame is returned byte-for-byte as a keyframe.
    /// - A frame whose size differs from the first fails with
    ///   [`JdiffError::DimensionMismatch`]; the reference frame is untouched.
    pub fn encode_frame(&self, input: &[u8], version: u32) -> Result<EncodedFrame> {
        let version = Version::try_from(version)?;

        let mut guard = self.lock();
        let state = &mut *guard;
        if state.disposed {
            return Ok(EncodedFrame::empty(version));
        }

        match state.dims {
            None => self.encode_keyframe(state, input, version),
            Some(dims) => self.encode_diff(state, dims, input, version),
        }
    }

    fn encode_keyframe(
        &self,
        state: &mut EncoderState<C>,
        input: &[u8],
        version: Version,
    ) -> Result<EncodedFrame> {
        let dims = state.codec.decompress(input, &mut state.diff)?;
        let payload = Bytes::copy_from_slice(input);

        let reference = ReferenceFrame::new(dims, std::mem::take(&mut state.diff));
        state.tracker.seed(reference, payload.clone(), version)?;
        state.dims = Some(dims);

        let frame = self.finish(state, version, true, dims, payload, input.len());
        info!(%dims, bytes = frame.len(), "keyframe passed through");
        Ok(frame)
    }

    fn encode_diff(
        &self,
        state: &mut EncoderState<C>,
        dims: Dimensions,
        input: &[u8],
        version: Version,
    ) -> Result<EncodedFrame> {
        let actual = state.codec.decompress(input, &mut state.diff)?;
        if actual != dims {
            return Err(JdiffError::DimensionMismatch {
                expected: dims,
                actual,
            });
        }

        let Some(reference) = state.tracker.wait_ready()? else {
            return Err(JdiffError::ReconstructionStalled);
        };
        diff::compute_diff_in_place(&mut state.diff, reference.pixels(), version)?;

        let quality = self.quality();
        state.codec.compress(&state.diff, dims, quality, &mut state.output)?;
        let payload = state.output.split().freeze();

        state.tracker.submit(payload.clone(), version)?;

        let frame = self.finish(state, version, false, dims, payload, input.len());
        debug!(
            sequence = frame.sequence,
            %version,
            quality,
            bytes = frame.len(),
            "diff frame encoded"
        );
        Ok(frame)
    }

    fn finish(
        &self,
        state: &mut EncoderState<C>,
        version: Version,
        keyframe: bool,
        dimensions: Dimensions,
        data: Bytes,
        input_len: usize,
    ) -> EncodedFrame {
        let sequence = state.sequence;
        state.sequence += 1;
        self.counters.record_frame(input_len, data.len(), keyframe);

        EncodedFrame {
            sequence,
            version,
            keyframe,
            dimensions,
            data,
        }
    }

    /// Copy of the current reference frame, once any pending
    /// reconstruction has finished. `None` before the first frame.
    pub fn reference_frame(&self) -> Result<Option<ReferenceFrame>> {
        let mut state = self.lock();
        Ok(state.tracker.wait_ready()?.cloned())
    }

    /// Dimensions fixed by the first frame.
    pub fn dimensions(&self) -> Option<Dimensions> {
        self.lock().dims
    }
}

impl<C> DiffEncoder<C> {
    /// Versions accepted by [`encode_frame`](DiffEncoder::encode_frame).
    pub fn supported_versions() -> &'static [u32] {
        &SUPPORTED_VERSIONS
    }

    /// Current compression quality.
    pub fn quality(&self) -> u8 {
        self.quality.load(Ordering::Relaxed)
    }

    /// Set the compression quality; values outside 1..=100 are clamped.
    ///
    /// Takes effect from the next diff frame, without waiting for an
    /// in-progress call.
    pub fn set_quality(&self, quality: i32) {
        self.quality
            .store(codec::clamp_quality(quality), Ordering::Relaxed);
    }

    pub fn stats(&self) -> EncoderStats {
        self.counters.snapshot()
    }

    pub fn is_disposed(&self) -> bool {
        self.lock().disposed
    }

    /// Stop the reconstruction thread and release buffers.
    ///
    /// Idempotent. Waits for an in-progress `encode_frame` to return first.
    pub fn dispose(&self) {
        let mut state = self.lock();
        if state.disposed {
            return;
        }
        state.disposed = true;
        state.tracker.shutdown();
        state.diff = Vec::new();
        state.output = BytesMut::new();
        info!(frames = state.sequence, "diff encoder disposed");
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, EncoderState<C>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C> Drop for DiffEncoder<C> {
    fn drop(&mut self) {
        self.dispose();
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg(dims: Dimensions, value: u8) -> Vec<u8> {
        let mut out = BytesMut::new();
        JpegCodec::new()
            .compress(&vec![value; dims.byte_len()], dims, 95, &mut out)
            .unwrap();
        out.to_vec()
    }

    #[test]
    fn first_frame_passes_through() {
        let enc = DiffEncoder::new().unwrap();
        let input = jpeg(Dimensions::new(16, 16), 100);

        let frame = enc.encode_frame(&input, 1).unwrap();
        assert!(frame.keyframe);
        assert_eq!(frame.sequence, 0);
        assert_eq!(&frame.data[..], &input[..]);
        assert_eq!(enc.dimensions(), Some(Dimensions::new(16, 16)));
    }

    #[test]
    fn second_frame_is_a_diff() {
        let enc = DiffEncoder::new().unwrap();
        let dims = Dimensions::new(16, 16);
        enc.encode_frame(&jpeg(dims, 100), 2).unwrap();

        let frame = enc.encode_frame(&jpeg(dims, 110), 2).unwrap();
        assert!(!frame.keyframe);
        assert_eq!(frame.sequence, 1);
        assert_eq!(frame.version, Version::V2);
        assert!(!frame.is_empty());
    }

    #[test]
    fn unsupported_version_is_rejected_up_front() {
        let enc = DiffEncoder::new().unwrap();
        let err = enc.encode_frame(&jpeg(Dimensions::new(8, 8), 0), 9).unwrap_err();
        assert!(matches!(err, JdiffError::UnsupportedVersion(9)));
        assert!(enc.dimensions().is_none());
    }

    #[test]
    fn corrupt_first_frame_leaves_encoder_unseeded() {
        let enc = DiffEncoder::new().unwrap();
        assert!(enc.encode_frame(b"garbage", 1).is_err());
        assert!(enc.reference_frame().unwrap().is_none());

        let frame = enc.encode_frame(&jpeg(Dimensions::new(8, 8), 0), 1).unwrap();
        assert!(frame.keyframe);
    }

    #[test]
    fn quality_is_clamped() {
        let enc = DiffEncoder::new().unwrap();
        assert_eq!(enc.quality(), 80);
        enc.set_quality(0);
        assert_eq!(enc.quality(), 1);
        enc.set_quality(250);
        assert_eq!(enc.quality(), 100);
    }

    #[test]
    fn dispose_twice_then_encode_returns_empty() {
        let enc = DiffEncoder::new().unwrap();
        enc.encode_frame(&jpeg(Dimensions::new(8, 8), 0), 1).unwrap();

        enc.dispose();
        enc.dispose();
        assert!(enc.is_disposed());

        let frame = enc.encode_frame(&jpeg(Dimensions::new(8, 8), 0), 1).unwrap();
        assert!(frame.is_empty());
    }

    #[test]
    fn stats_track_frames() {
        let enc = DiffEncoder::new().unwrap();
        let dims = Dimensions::new(16, 16);
        let first = jpeg(dims, 40);
        enc.encode_frame(&first, 3).unwrap();
        enc.encode_frame(&jpeg(dims, 44), 3).unwrap();

        let stats = enc.stats();
        assert_eq!(stats.frames_encoded, 2);
        assert_eq!(stats.keyframes, 1);
        assert!(stats.input_bytes >= first.len() as u64);
    }

    #[test]
    fn supported_versions_are_shared_with_decoder() {
        assert_eq!(DiffEncoder::<JpegCodec>::supported_versions(), &SUPPORTED_VERSIONS);
    }
}
