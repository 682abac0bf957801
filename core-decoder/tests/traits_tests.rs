//! Contract tests for the `AudioDecoder` trait surface.
//!
//! A hand-rolled mock verifies the provided methods (rewind, parameter
//! accessors, seekability default) and that the whole-frame decode contract
//! composes through a trait object, independent of any real backend.

use core_decoder::{AudioDecoder, Result, StreamParams};

/// Mock decoder producing `total_frames` frames whose first byte is the
/// frame index modulo 256.
struct MockDecoder {
    params: StreamParams,
    total_frames: usize,
    position: usize,
    finished: bool,
    last_seek: Option<f64>,
}

impl MockDecoder {
    fn new(sample_rate: u32, channels: u16, total_frames: usize) -> Self {
        Self {
            params: StreamParams::new(sample_rate, channels, 16),
            total_frames,
            position: 0,
            finished: false,
            last_seek: None,
        }
    }
}

impl AudioDecoder for MockDecoder {
    fn params(&self) -> &StreamParams {
        &self.params
    }

    fn decode(&mut self, out: &mut [u8]) -> usize {
        let stride = self.params.frame_stride();
        let max_frames = out.len() / stride;
        let available = self.total_frames - self.position;
        let produced = max_frames.min(available);

        for i in 0..produced {
            let frame = &mut out[i * stride..(i + 1) * stride];
            frame.fill(0);
            frame[0] = ((self.position + i) % 256) as u8;
        }
        self.position += produced;

        if produced < max_frames {
            self.finished = true;
        }
        produced * stride
    }

    fn seek(&mut self, seconds: f64) -> bool {
        let target = (seconds * f64::from(self.params.sample_rate)) as usize;
        if target > self.total_frames {
            return false;
        }
        self.position = target;
        self.finished = false;
        self.last_seek = Some(seconds);
        true
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn duration(&self) -> Option<f64> {
        Some(self.total_frames as f64 / f64::from(self.params.sample_rate))
    }

    fn chunk_size(&self) -> usize {
        4096
    }

    fn clone_decoder(&self) -> Result<Box<dyn AudioDecoder>> {
        Ok(Box::new(MockDecoder::new(
            self.params.sample_rate,
            self.params.channels,
            self.total_frames,
        )))
    }
}

#[test]
fn parameter_accessors_read_through_params() {
    let decoder = MockDecoder::new(48000, 2, 1000);
    assert_eq!(decoder.sample_rate(), 48000);
    assert_eq!(decoder.channel_count(), 2);
    assert_eq!(decoder.bit_depth(), 16);
    assert_eq!(decoder.params().frame_stride(), 4);
}

#[test]
fn seeking_defaults_to_supported() {
    let decoder = MockDecoder::new(48000, 2, 1000);
    assert!(decoder.is_seekable());
}

#[test]
fn rewind_is_seek_to_zero() {
    let mut decoder = MockDecoder::new(8000, 1, 8000);

    let mut chunk = vec![0u8; 512];
    decoder.decode(&mut chunk);
    assert!(decoder.rewind());
    assert_eq!(decoder.last_seek, Some(0.0));

    // Output restarts from frame zero.
    decoder.decode(&mut chunk);
    assert_eq!(chunk[0], 0);
    assert_eq!(chunk[2], 1);
}

#[test]
fn short_read_marks_end_of_stream() {
    let mut decoder = MockDecoder::new(8000, 1, 100);
    let mut chunk = vec![0u8; 512]; // room for 256 frames

    assert_eq!(decoder.decode(&mut chunk), 200);
    assert!(decoder.is_finished());
    assert_eq!(decoder.decode(&mut chunk), 0);
}

#[test]
fn trait_object_composes_through_boxing() {
    let decoder = MockDecoder::new(44100, 2, 44100);
    let mut boxed: Box<dyn AudioDecoder> = decoder.clone_decoder().expect("clone");

    assert_eq!(boxed.duration(), Some(1.0));
    let mut chunk = vec![0u8; 400];
    assert_eq!(boxed.decode(&mut chunk), 400);
}
