//! # Table-Driven MP3 Decoder
//!
//! Backend built on frame-level MPEG audio decoding. The whole compressed
//! stream is indexed at open time: one header pass counts compressed and PCM
//! frames (which fixes the duration), a second pass computes the seek table
//! that is then bound to the decoder for its lifetime. Decoding feeds the
//! codec one compressed frame at a time, sliced out of the input by the
//! index; seeking is a table lookup plus a short decode-forward to the exact
//! sample.

use crate::decoder::carry::CarryBuffer;
use crate::decoder::mp3_index::{self, FrameHeader, SeekIndex};
use crate::decoder::sample_converter::SampleConverter;
use crate::error::{DecoderError, Result};
use crate::traits::{AudioDecoder, StreamParams};
use bytes::Bytes;
use symphonia::core::codecs::{CodecParameters, Decoder, DecoderOptions, CODEC_TYPE_MP3};
use symphonia::core::formats::Packet;
use symphonia_bundle_mp3::MpaDecoder;
use tracing::{debug, warn};

/// Compressed frames decoded and discarded ahead of a seek target so the
/// codec's bit reservoir is warm when the target frame is reached.
const PRE_ROLL_FRAMES: usize = 2;

/// MP3 decoder with a precomputed seek index over compressed frames.
///
/// Stream parameters and duration are derived eagerly at open time from a
/// header-only scan; no payload is decoded until the first `decode` call.
pub struct Mp3Decoder {
    data: Bytes,
    chunk_size: usize,
    codec: MpaDecoder,
    index: SeekIndex,
    params: StreamParams,
    duration: f64,
    total_pcm: u64,
    /// Index of the next compressed frame to decode.
    cursor: usize,
    /// PCM frames to discard before emitting, after a seek.
    pending_skip: u64,
    carry: CarryBuffer,
    eof: bool,
}

impl Mp3Decoder {
    /// Open a decoder over an in-memory MPEG audio stream.
    ///
    /// # Errors
    ///
    /// - [`DecoderError::UnsupportedFormat`] when no decodable frame exists
    ///   in the data.
    /// - [`DecoderError::InitializationFailed`] when the duration pass, the
    ///   seek-index bind, or codec construction fails.
    pub fn new(data: Bytes, chunk_size: usize) -> Result<Self> {
        let (start, first) = mp3_index::first_frame(&data).ok_or_else(|| {
            DecoderError::UnsupportedFormat("could not read mp3 data".to_string())
        })?;

        let (frame_count, pcm_count) = mp3_index::count_frames(&data, start);
        if frame_count == 0 {
            return Err(DecoderError::InitializationFailed(
                "could not compute stream duration".to_string(),
            ));
        }
        let duration = pcm_count as f64 / f64::from(first.sample_rate);

        // The computation may return fewer usable points than requested;
        // never bind more entries than it produced.
        let points = mp3_index::calculate_seek_points(&data, start, frame_count);
        let bound = (frame_count as usize).min(points.len());
        let index = SeekIndex::bind(points, bound).ok_or_else(|| {
            DecoderError::InitializationFailed("could not bind seek index".to_string())
        })?;

        let mut codec_params = CodecParameters::new();
        codec_params
            .for_codec(CODEC_TYPE_MP3)
            .with_sample_rate(first.sample_rate);
        let codec = MpaDecoder::try_new(&codec_params, &DecoderOptions::default())
            .map_err(|e| {
                DecoderError::InitializationFailed(format!("could not create codec: {e}"))
            })?;

        let params = StreamParams::new(first.sample_rate, first.channels, 16);
        let carry = CarryBuffer::new(params.frame_stride(), chunk_size);

        debug!(
            sample_rate = params.sample_rate,
            channels = params.channels,
            frames = frame_count,
            duration,
            "mp3 decoder opened"
        );

        Ok(Self {
            data,
            chunk_size,
            codec,
            index,
            params,
            duration,
            total_pcm: pcm_count,
            cursor: 0,
            pending_skip: 0,
            carry,
            eof: false,
        })
    }

    /// Whether this backend handles the given extension or MIME hint.
    pub fn accepts(hint: &str) -> bool {
        const SUPPORTED: [&str; 3] = ["mp3", "audio/mpeg", "audio/mp3"];
        SUPPORTED.iter().any(|s| s.eq_ignore_ascii_case(hint))
    }

    /// Decode the next compressed frame into interleaved s16-LE bytes,
    /// applying any pending post-seek discard. `None` ends the stream.
    fn next_chunk(&mut self) -> Option<Vec<u8>> {
        let stride = self.params.frame_stride();

        loop {
            if self.cursor >= self.index.len() {
                return None;
            }

            let point = self.index.point(self.cursor);
            let offset = point.byte_offset as usize;
            let Some(header) = FrameHeader::parse(&self.data[offset..]) else {
                // The index was built from this very parse; a mismatch means
                // the data changed under us. Truncate.
                return None;
            };
            self.cursor += 1;

            let packet = Packet::new_from_slice(
                0,
                point.pcm_offset,
                u64::from(header.samples_per_frame),
                &self.data[offset..offset + header.frame_len],
            );

            let decoded = match self.codec.decode(&packet) {
                Ok(decoded) => decoded,
                Err(e) => {
                    if self.pending_skip > 0 {
                        // Pre-roll frame after a seek; its output is
                        // discarded anyway.
                        self.pending_skip = self
                            .pending_skip
                            .saturating_sub(u64::from(header.samples_per_frame));
                        continue;
                    }
                    warn!("frame decode failed, truncating stream: {e}");
                    return None;
                }
            };

            if decoded.spec().channels.count() != usize::from(self.params.channels) {
                warn!("channel layout changed mid-stream, truncating");
                return None;
            }

            let mut bytes = SampleConverter::to_interleaved_s16(&decoded);

            if self.pending_skip > 0 {
                let frames = (bytes.len() / stride) as u64;
                if frames <= self.pending_skip {
                    self.pending_skip -= frames;
                    continue;
                }
                bytes.drain(..self.pending_skip as usize * stride);
                self.pending_skip = 0;
            }

            if bytes.is_empty() {
                continue;
            }
            return Some(bytes);
        }
    }
}

impl AudioDecoder for Mp3Decoder {
    fn params(&self) -> &StreamParams {
        &self.params
    }

    fn decode(&mut self, out: &mut [u8]) -> usize {
        let stride = self.params.frame_stride();
        let max_frames = out.len() / stride;
        if max_frames == 0 {
            return 0;
        }

        let mut delivered = self.carry.drain_into(out);

        while delivered < max_frames && !self.eof {
            match self.next_chunk() {
                Some(chunk) => {
                    let got = chunk.len() / stride;
                    let take = got.min(max_frames - delivered);
                    let dst = delivered * stride;
                    out[dst..dst + take * stride].copy_from_slice(&chunk[..take * stride]);
                    delivered += take;
                    if got > take {
                        self.carry.stash(&chunk[take * stride..]);
                    }
                }
                None => self.eof = true,
            }
        }

        if delivered < max_frames {
            self.eof = true;
        }
        delivered * stride
    }

    fn seek(&mut self, seconds: f64) -> bool {
        if !seconds.is_finite() || seconds < 0.0 {
            return false;
        }

        let target = (seconds * f64::from(self.params.sample_rate)) as u64;
        self.codec.reset();

        if target >= self.total_pcm {
            // Position at end-of-stream; the next decode returns 0 bytes.
            self.cursor = self.index.len();
            self.pending_skip = 0;
        } else {
            let frame = self.index.locate(target);
            let start = frame.saturating_sub(PRE_ROLL_FRAMES);
            self.cursor = start;
            self.pending_skip = target - self.index.point(start).pcm_offset;
        }

        self.carry.clear();
        self.eof = false;
        true
    }

    fn is_finished(&self) -> bool {
        self.eof
    }

    fn duration(&self) -> Option<f64> {
        Some(self.duration)
    }

    fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn clone_decoder(&self) -> Result<Box<dyn AudioDecoder>> {
        Ok(Box::new(Self::new(self.data.clone(), self.chunk_size)?))
    }
}
