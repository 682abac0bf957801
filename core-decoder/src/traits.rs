//! # Core Decoder Traits
//!
//! This module defines the uniform contract shared by the decoder backends.
//!
//! ## Architecture
//!
//! A decoder turns an immutable, in-memory compressed audio buffer into a
//! continuous sequence of interleaved little-endian PCM frames, delivered
//! through a caller-supplied bounded buffer. Two structurally different
//! backends implement the contract:
//!
//! - [`Mp3Decoder`](crate::Mp3Decoder): table-driven, with an explicit seek
//!   index over compressed frames built once at open time.
//! - [`SourceReaderDecoder`](crate::SourceReaderDecoder): an opaque
//!   container/codec reader that seeks via presentation timestamps.
//!
//! Backend selection belongs to an external dispatcher; each backend exposes
//! a static `accepts` capability query for that purpose.
//!
//! ## Threading Model
//!
//! All calls are synchronous and blocking. A decoder instance owns mutable
//! cursor state and is not safe for concurrent use without external
//! synchronization; independent instances (including clones) may run on
//! separate threads.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use core_decoder::{AudioDecoder, SourceReaderDecoder};
//! use bytes::Bytes;
//!
//! # fn example(data: Bytes) -> core_decoder::Result<()> {
//! let mut decoder = SourceReaderDecoder::new(data, 16384)?;
//! let mut chunk = vec![0u8; decoder.chunk_size()];
//!
//! while !decoder.is_finished() {
//!     let n = decoder.decode(&mut chunk);
//!     let _pcm = &chunk[..n]; // whole interleaved PCM frames
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};

// ============================================================================
// Stream Parameters
// ============================================================================

/// Immutable PCM stream parameters derived at open time.
///
/// These values are fixed for the lifetime of a decoder instance once
/// construction succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamParams {
    /// Sample rate in Hz (e.g., 44100, 48000).
    pub sample_rate: u32,
    /// Number of audio channels (1 = mono, 2 = stereo, etc.).
    pub channels: u16,
    /// Bits per sample of the decoded output.
    pub bits_per_sample: u16,
}

impl StreamParams {
    /// Create a new parameter set.
    pub fn new(sample_rate: u32, channels: u16, bits_per_sample: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample,
        }
    }

    /// Byte size of one PCM frame (one sample per channel).
    pub fn frame_stride(&self) -> usize {
        self.channels as usize * (self.bits_per_sample as usize / 8)
    }

    /// Decoded bytes per second of audio.
    pub fn byte_rate(&self) -> usize {
        self.sample_rate as usize * self.frame_stride()
    }
}

// ============================================================================
// Decoder Contract
// ============================================================================

/// Uniform contract over the heterogeneous decoder backends.
///
/// Implementations decode into a caller-owned byte buffer at whole-frame
/// granularity: every call writes an exact multiple of
/// [`StreamParams::frame_stride`] bytes, frames decoded beyond the caller's
/// capacity are carried over to the next call, and no PCM frame is ever
/// duplicated or dropped across call boundaries.
pub trait AudioDecoder: Send {
    /// The immutable stream parameters derived at open time.
    fn params(&self) -> &StreamParams;

    /// Decode PCM data into `out` and return the number of bytes written.
    ///
    /// Returns at most `out.len()` bytes, always a whole number of frames.
    /// A return shorter than the requested capacity marks the end of the
    /// stream; subsequent calls return 0 until a successful seek or rewind.
    ///
    /// Ordinary end-of-stream is not an error. Backend read or decode
    /// failures mid-stream also end the stream rather than raising: the
    /// stream is truncated at the failure point and playback simply ends
    /// there.
    ///
    /// A capacity smaller than one frame stride yields 0 bytes and leaves
    /// the decoder state unchanged.
    fn decode(&mut self, out: &mut [u8]) -> usize;

    /// Reposition the decode cursor to the nearest representable point at or
    /// before `seconds` (backend-dependent granularity).
    ///
    /// On success, clears end-of-stream, discards carried-over frames, and
    /// returns `true`. Returns `false` if the backend rejects the target;
    /// position, end-of-stream, and carry-over state are then untouched.
    fn seek(&mut self, seconds: f64) -> bool;

    /// Seek back to the start of the stream.
    fn rewind(&mut self) -> bool {
        self.seek(0.0)
    }

    /// Whether this decoder supports seeking.
    fn is_seekable(&self) -> bool {
        true
    }

    /// Whether the end of the stream has been reached.
    ///
    /// Cleared by a successful seek or rewind.
    fn is_finished(&self) -> bool;

    /// Total stream duration in seconds, or `None` when the backend cannot
    /// report one. `None` is distinct from a known zero-length stream.
    fn duration(&self) -> Option<f64>;

    /// The target output chunk size (bytes) this decoder was opened with.
    fn chunk_size(&self) -> usize;

    /// Number of audio channels.
    fn channel_count(&self) -> u16 {
        self.params().channels
    }

    /// Bits per sample of the decoded output.
    fn bit_depth(&self) -> u16 {
        self.params().bits_per_sample
    }

    /// Sample rate in Hz.
    fn sample_rate(&self) -> u32 {
        self.params().sample_rate
    }

    /// Construct an independent decoder over the same compressed data and
    /// chunk size, positioned at the start of the stream.
    ///
    /// The clone shares no mutable state with the original.
    fn clone_decoder(&self) -> Result<Box<dyn AudioDecoder>>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_stride_covers_all_channels() {
        let mono = StreamParams::new(8000, 1, 16);
        assert_eq!(mono.frame_stride(), 2);

        let stereo = StreamParams::new(44100, 2, 16);
        assert_eq!(stereo.frame_stride(), 4);

        let surround = StreamParams::new(48000, 6, 16);
        assert_eq!(surround.frame_stride(), 12);
    }

    #[test]
    fn byte_rate_for_cd_quality() {
        let params = StreamParams::new(44100, 2, 16);
        assert_eq!(params.byte_rate(), 176400);
    }
}
