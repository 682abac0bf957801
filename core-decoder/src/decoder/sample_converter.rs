//! # Sample Format Converter
//!
//! Normalizes decoded audio buffers to the decoder output format.

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::conv::IntoSample;
use symphonia::core::sample::Sample;

/// Sample converter that normalizes audio to interleaved s16 output.
///
/// The codec layer produces audio in various formats (i16, i24, i32, f32,
/// f64, ...) and planar layout. This converter normalizes everything to the
/// wire format of the decoder contract: interleaved little-endian signed
/// 16-bit PCM.
pub(crate) struct SampleConverter;

impl SampleConverter {
    /// Convert a decoded audio buffer to interleaved little-endian s16 bytes.
    ///
    /// For stereo audio the output is ordered `[L0, R0, L1, R1, ...]`, two
    /// bytes per sample.
    pub(crate) fn to_interleaved_s16(buffer: &AudioBufferRef<'_>) -> Vec<u8> {
        match buffer {
            AudioBufferRef::U8(buf) => Self::pack(buf),
            AudioBufferRef::U16(buf) => Self::pack(buf),
            AudioBufferRef::U24(buf) => Self::pack(buf),
            AudioBufferRef::U32(buf) => Self::pack(buf),
            AudioBufferRef::S8(buf) => Self::pack(buf),
            AudioBufferRef::S16(buf) => Self::pack(buf),
            AudioBufferRef::S24(buf) => Self::pack(buf),
            AudioBufferRef::S32(buf) => Self::pack(buf),
            AudioBufferRef::F32(buf) => Self::pack(buf),
            AudioBufferRef::F64(buf) => Self::pack(buf),
        }
    }

    /// Interleave the channel planes of `buf`, converting each sample to s16.
    fn pack<T>(buf: &AudioBuffer<T>) -> Vec<u8>
    where
        T: Sample + IntoSample<i16> + Copy,
    {
        let num_channels = buf.spec().channels.count();
        let num_frames = buf.frames();
        let mut out = Vec::with_capacity(num_frames * num_channels * 2);

        for frame_idx in 0..num_frames {
            for chan_idx in 0..num_channels {
                let sample: i16 = buf.chan(chan_idx)[frame_idx].into_sample();
                out.extend_from_slice(&sample.to_le_bytes());
            }
        }

        out
    }
}
