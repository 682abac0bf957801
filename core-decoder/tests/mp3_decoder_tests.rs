//! Tests for the table-driven MP3 backend.
//!
//! Streams are synthesized at the frame-header level: headers are real
//! MPEG-1 Layer III headers, payloads are zeroed. That pins down everything
//! the open path derives without decoding (parameters, duration, seek
//! index), and exercises the decode path's degrade-to-end-of-stream
//! contract on payloads that may not decode.

use bytes::Bytes;
use core_decoder::{AudioDecoder, DecoderError, Mp3Decoder};

// MPEG-1 Layer III, 128 kbps, 44100 Hz, stereo; 417-byte frames of
// 1152 PCM frames each.
const FRAME_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x00];
const FRAME_LEN: usize = 417;
const SAMPLES_PER_FRAME: u64 = 1152;

fn synth_mp3(frames: usize) -> Bytes {
    let mut data = Vec::with_capacity(frames * FRAME_LEN);
    for _ in 0..frames {
        data.extend_from_slice(&FRAME_HEADER);
        data.extend_from_slice(&vec![0u8; FRAME_LEN - 4]);
    }
    Bytes::from(data)
}

#[test]
fn open_derives_parameters_and_duration_eagerly() {
    let decoder = Mp3Decoder::new(synth_mp3(20), 8192).expect("open");

    assert_eq!(decoder.sample_rate(), 44100);
    assert_eq!(decoder.channel_count(), 2);
    assert_eq!(decoder.bit_depth(), 16);
    assert_eq!(decoder.chunk_size(), 8192);
    assert!(decoder.is_seekable());

    let expected = (20 * SAMPLES_PER_FRAME) as f64 / 44100.0;
    let duration = decoder.duration().expect("duration known at open");
    assert!((duration - expected).abs() < 1e-9);
}

#[test]
fn open_skips_leading_id3_tag() {
    let mut data = vec![b'I', b'D', b'3', 4, 0, 0, 0, 0, 1, 0];
    data.extend_from_slice(&[0u8; 128]); // syncsafe size 0x80 = 128
    data.extend_from_slice(&synth_mp3(4));

    let decoder = Mp3Decoder::new(Bytes::from(data), 4096).expect("open");
    let expected = (4 * SAMPLES_PER_FRAME) as f64 / 44100.0;
    assert!((decoder.duration().unwrap() - expected).abs() < 1e-9);
}

#[test]
fn open_rejects_non_mp3_data() {
    let result = Mp3Decoder::new(Bytes::from(vec![0u8; 512]), 4096);
    assert!(matches!(result, Err(DecoderError::UnsupportedFormat(_))));
}

#[test]
fn decode_returns_whole_frames_and_terminates() {
    let mut decoder = Mp3Decoder::new(synth_mp3(20), 4096).expect("open");
    let stride = 4; // stereo s16
    let mut chunk = vec![0u8; 4096];
    let mut total = 0usize;

    for _ in 0..200 {
        let n = decoder.decode(&mut chunk);
        assert_eq!(n % stride, 0, "partial frame returned");
        total += n;
        if decoder.is_finished() {
            break;
        }
    }

    assert!(decoder.is_finished(), "decoder failed to reach end-of-stream");
    // Zeroed payloads either decode to silence or truncate the stream;
    // in both cases output is bounded by the indexed sample count.
    assert!(total <= (20 * SAMPLES_PER_FRAME) as usize * stride);
    assert_eq!(decoder.decode(&mut chunk), 0);
}

#[test]
fn seek_resolves_through_the_index() {
    let mut decoder = Mp3Decoder::new(synth_mp3(40), 4096).expect("open");

    // Within the indexed range.
    assert!(decoder.seek(0.25));
    assert!(!decoder.is_finished());

    // Back to the start.
    assert!(decoder.rewind());

    // Nonsense targets are rejected with state untouched.
    assert!(!decoder.seek(-0.5));
    assert!(!decoder.seek(f64::INFINITY));
}

#[test]
fn seek_past_end_positions_at_end_of_stream() {
    let mut decoder = Mp3Decoder::new(synth_mp3(10), 4096).expect("open");

    assert!(decoder.seek(100.0));
    let mut chunk = vec![0u8; 4096];
    assert_eq!(decoder.decode(&mut chunk), 0);
    assert!(decoder.is_finished());

    // Rewind clears end-of-stream again.
    assert!(decoder.rewind());
    assert!(!decoder.is_finished());
}

#[test]
fn clone_opens_an_independent_instance() {
    let decoder = Mp3Decoder::new(synth_mp3(10), 2048).expect("open");
    let clone = decoder.clone_decoder().expect("clone");

    assert_eq!(clone.sample_rate(), decoder.sample_rate());
    assert_eq!(clone.channel_count(), decoder.channel_count());
    assert_eq!(clone.chunk_size(), decoder.chunk_size());
    assert_eq!(clone.duration(), decoder.duration());
    assert!(!clone.is_finished());
}

#[test]
fn sub_stride_capacity_yields_nothing() {
    let mut decoder = Mp3Decoder::new(synth_mp3(5), 4096).expect("open");
    let mut tiny = [0u8; 3];
    assert_eq!(decoder.decode(&mut tiny), 0);
    assert!(!decoder.is_finished());
}
