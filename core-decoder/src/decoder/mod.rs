//! # Decoder Backends
//!
//! Two structurally different implementations of the
//! [`AudioDecoder`](crate::AudioDecoder) contract:
//!
//! 1. **[`Mp3Decoder`]**: table-driven. A header-only scan at open time
//!    yields the exact duration and a per-frame seek index; the codec is fed
//!    one compressed frame at a time and seeks resolve through the index.
//! 2. **[`SourceReaderDecoder`]**: opaque source reader. The container is
//!    probed by the process-wide runtime, packets arrive in whatever chunk
//!    sizes the container dictates, and seeks go through the reader by
//!    presentation timestamp.
//!
//! Both deliver interleaved little-endian 16-bit PCM through the shared
//! carry-over buffered decode loop: a caller-supplied buffer is filled at
//! whole-frame granularity, and frames decoded beyond its capacity are
//! replayed on the next call.
//!
//! ```text
//! Bytes → frame index → MpaDecoder ─┐
//!                                   ├─ carry-over loop → caller buffer
//! Bytes → probe → FormatReader ─────┘
//! ```

mod carry;
mod mp3;
mod mp3_index;
mod sample_converter;
mod source_reader;

pub use mp3::Mp3Decoder;
pub use source_reader::SourceReaderDecoder;
