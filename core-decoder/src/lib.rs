//! # Streaming Audio Decoder Core
//!
//! Turns compressed audio data held in memory into a continuous sequence of
//! interleaved little-endian 16-bit PCM frames, delivered through a
//! caller-supplied bounded buffer, with random-access seeking and accurate
//! duration reporting.
//!
//! ## Overview
//!
//! This crate handles:
//! - A uniform decode/seek/rewind/duration contract over heterogeneous
//!   backends ([`AudioDecoder`])
//! - A table-driven MP3 backend with a precomputed seek index
//!   ([`Mp3Decoder`])
//! - An opaque source-reader backend that seeks via presentation timestamps
//!   ([`SourceReaderDecoder`])
//! - Process-wide reader-runtime lifecycle ([`runtime`])
//!
//! Backend selection (trying `accepts` across backends) belongs to the
//! embedding pipeline; mixing, playback clocking, and device output are
//! likewise out of scope.

pub mod decoder;
pub mod error;
pub mod runtime;
pub mod traits;

pub use decoder::{Mp3Decoder, SourceReaderDecoder};
pub use error::{DecoderError, Result};
pub use traits::{AudioDecoder, StreamParams};
