//! # Source-Reader Decoder
//!
//! Backend built on the process-wide container/codec runtime. The byte
//! stream is probed without an extension hint (an in-memory stream carries
//! no filename), the first audio track is selected, and decoding pulls
//! opaque packets whose frame counts are whatever the container yields.
//! Seeking goes through the reader by presentation timestamp, refined by a
//! decode-forward discard to the exact requested sample.

use crate::decoder::carry::CarryBuffer;
use crate::decoder::sample_converter::SampleConverter;
use crate::error::{DecoderError, Result};
use crate::runtime::{self, ReaderRuntime};
use crate::traits::{AudioDecoder, StreamParams};
use bytes::Bytes;
use std::io::Cursor;
use std::sync::Arc;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::Time;
use tracing::{debug, warn};

/// Decoder over an opaque source reader that seeks via timestamps.
///
/// Handles every container/codec pair the reader runtime registers. The
/// output contract (sample rate, channel count, 16-bit depth) is fixed at
/// open time; a mid-stream change the contract cannot represent truncates
/// the stream at that point rather than erroring.
pub struct SourceReaderDecoder {
    data: Bytes,
    chunk_size: usize,
    // Held so the registries outlive a later runtime shutdown.
    _runtime: Arc<ReaderRuntime>,
    reader: Box<dyn FormatReader>,
    codec: Box<dyn Decoder>,
    track_id: u32,
    params: StreamParams,
    duration: Option<f64>,
    /// PCM frames to discard before emitting, after an accurate seek.
    pending_skip: u64,
    carry: CarryBuffer,
    eof: bool,
}

impl SourceReaderDecoder {
    /// Open a decoder over an in-memory compressed stream.
    ///
    /// The first packet is decoded during construction to pin down the
    /// definitive output signal parameters (some codecs only report the
    /// channel layout after one decode); its frames are carried over to the
    /// first `decode` call, so nothing is lost.
    ///
    /// # Errors
    ///
    /// - [`DecoderError::RuntimeUnavailable`] when the reader runtime could
    ///   not be initialized.
    /// - [`DecoderError::UnsupportedFormat`] when probing rejects the data
    ///   or no decodable audio track exists.
    /// - [`DecoderError::InitializationFailed`] when codec construction or
    ///   the first-packet decode fails.
    pub fn new(data: Bytes, chunk_size: usize) -> Result<Self> {
        let runtime = runtime::acquire().ok_or(DecoderError::RuntimeUnavailable)?;

        let source = Box::new(Cursor::new(data.clone()));
        let stream = MediaSourceStream::new(source, Default::default());

        let probed = runtime
            .probe()
            .format(
                &Hint::new(),
                stream,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| {
                DecoderError::UnsupportedFormat(format!("could not probe container: {e}"))
            })?;
        let mut reader = probed.format;

        let track = reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| {
                DecoderError::UnsupportedFormat("no decodable audio track".to_string())
            })?;
        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let duration = codec_params
            .time_base
            .zip(codec_params.n_frames)
            .map(|(time_base, frames)| {
                let time = time_base.calc_time(frames);
                time.seconds as f64 + time.frac
            });

        let mut codec = runtime
            .codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| {
                DecoderError::InitializationFailed(format!("could not create codec: {e}"))
            })?;

        // First-packet decode; falls back to the track parameters when the
        // stream holds no packets at all (a valid zero-length stream).
        let mut preload = Vec::new();
        let (sample_rate, channels) = loop {
            let packet = match reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    let sample_rate = codec_params.sample_rate.ok_or_else(|| {
                        DecoderError::InitializationFailed("missing sample rate".to_string())
                    })?;
                    let channels = codec_params
                        .channels
                        .map(|ch| ch.count() as u16)
                        .unwrap_or(2);
                    break (sample_rate, channels);
                }
                Err(e) => {
                    return Err(DecoderError::InitializationFailed(format!(
                        "could not read first packet: {e}"
                    )));
                }
            };
            if packet.track_id() != track_id {
                continue;
            }
            let decoded = codec.decode(&packet).map_err(|e| {
                DecoderError::InitializationFailed(format!(
                    "could not decode first packet: {e}"
                ))
            })?;
            let spec = decoded.spec();
            preload = SampleConverter::to_interleaved_s16(&decoded);
            break (spec.rate, spec.channels.count() as u16);
        };

        let params = StreamParams::new(sample_rate, channels, 16);
        let mut carry = CarryBuffer::new(params.frame_stride(), chunk_size);
        carry.stash(&preload);

        debug!(
            sample_rate = params.sample_rate,
            channels = params.channels,
            ?duration,
            "source-reader decoder opened"
        );

        Ok(Self {
            data,
            chunk_size,
            _runtime: runtime,
            reader,
            codec,
            track_id,
            params,
            duration,
            pending_skip: 0,
            carry,
            eof: false,
        })
    }

    /// Whether this backend handles the given extension or MIME hint.
    ///
    /// Returns `false` for everything when the reader runtime is
    /// unavailable; the availability probe runs at most once per process.
    pub fn accepts(hint: &str) -> bool {
        if !runtime::initialize() {
            return false;
        }

        const SUPPORTED: [&str; 17] = [
            "mp3",
            "m4a",
            "mp4",
            "aac",
            "wav",
            "wave",
            "flac",
            "ogg",
            "oga",
            "audio/mpeg",
            "audio/mp3",
            "audio/mp4",
            "audio/aac",
            "audio/wav",
            "audio/x-wav",
            "audio/flac",
            "audio/ogg",
        ];
        SUPPORTED.iter().any(|s| s.eq_ignore_ascii_case(hint))
    }

    /// Decode the next packet of the selected track into interleaved s16-LE
    /// bytes, applying any pending post-seek discard. `None` ends the
    /// stream; read and decode failures truncate rather than raise.
    fn next_chunk(&mut self) -> Option<Vec<u8>> {
        let stride = self.params.frame_stride();

        loop {
            let packet = match self.reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    debug!("end of stream");
                    return None;
                }
                Err(SymphoniaError::ResetRequired) => {
                    // Track list changed mid-stream; the output contract
                    // cannot represent it, so playback ends here.
                    warn!("track list changed mid-stream, truncating");
                    return None;
                }
                Err(e) => {
                    warn!("packet read failed, truncating stream: {e}");
                    return None;
                }
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.codec.decode(&packet) {
                Ok(decoded) => decoded,
                Err(e) => {
                    warn!("packet decode failed, truncating stream: {e}");
                    return None;
                }
            };

            let spec = decoded.spec();
            if spec.rate != self.params.sample_rate
                || spec.channels.count() != usize::from(self.params.channels)
            {
                warn!("output format changed mid-stream, truncating");
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

impl AudioDecoder for SourceReaderDecoder {
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

        let seek_to = SeekTo::Time {
            time: Time::from(seconds),
            track_id: Some(self.track_id),
        };
        match self.reader.seek(SeekMode::Accurate, seek_to) {
            Ok(seeked) => {
                self.codec.reset();
                self.pending_skip = seeked.required_ts.saturating_sub(seeked.actual_ts);
                self.carry.clear();
                self.eof = false;
                true
            }
            Err(e) => {
                debug!("seek rejected: {e}");
                false
            }
        }
    }

    fn is_finished(&self) -> bool {
        self.eof
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn clone_decoder(&self) -> Result<Box<dyn AudioDecoder>> {
        Ok(Box::new(Self::new(self.data.clone(), self.chunk_size)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unparseable_data() {
        let result = SourceReaderDecoder::new(Bytes::from_static(&[0x13, 0x37, 0x00, 0x01]), 4096);
        assert!(matches!(result, Err(DecoderError::UnsupportedFormat(_))));
    }

    #[test]
    fn accepts_reports_reader_formats() {
        assert!(SourceReaderDecoder::accepts("wav"));
        assert!(SourceReaderDecoder::accepts("m4a"));
        assert!(SourceReaderDecoder::accepts("audio/flac"));
        assert!(!SourceReaderDecoder::accepts("wma"));
        assert!(!SourceReaderDecoder::accepts("txt"));
    }
}
