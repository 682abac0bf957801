//! # MPEG Audio Frame Index
//!
//! Header-level scanning of an MPEG audio byte stream. The scan never
//! touches frame payloads: frame boundaries, per-frame sample counts, and
//! the total decodable sample count all fall out of the 4-byte frame
//! headers, which is what makes the one-pass duration computation and the
//! precomputed seek index cheap enough to run at open time.

use tracing::trace;

/// MPEG audio version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MpegVersion {
    Mpeg1,
    Mpeg2,
    Mpeg2_5,
}

/// MPEG audio layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MpegLayer {
    Layer1,
    Layer2,
    Layer3,
}

/// One parsed MPEG audio frame header.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameHeader {
    pub sample_rate: u32,
    pub channels: u16,
    /// PCM frames this compressed frame decodes to.
    pub samples_per_frame: u32,
    /// Whole compressed frame length in bytes, header included.
    pub frame_len: usize,
}

impl FrameHeader {
    /// Parse a frame header from the first four bytes of `data`.
    ///
    /// Returns `None` for anything that is not a valid, non-free-format
    /// MPEG audio frame header.
    pub(crate) fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }

        // Sync word: 11 set bits.
        if data[0] != 0xFF || (data[1] & 0xE0) != 0xE0 {
            return None;
        }

        let version = match (data[1] >> 3) & 0x03 {
            0 => MpegVersion::Mpeg2_5,
            2 => MpegVersion::Mpeg2,
            3 => MpegVersion::Mpeg1,
            _ => return None,
        };

        let layer = match (data[1] >> 1) & 0x03 {
            1 => MpegLayer::Layer3,
            2 => MpegLayer::Layer2,
            3 => MpegLayer::Layer1,
            _ => return None,
        };

        // Free-format (index 0) and the forbidden index are both rejected;
        // free-format frames have no computable length.
        let bitrate = bitrate_bps(version, layer, (data[2] >> 4) & 0x0F)?;
        let sample_rate = sample_rate_hz(version, (data[2] >> 2) & 0x03)?;
        let padding = (data[2] >> 1) & 0x01 != 0;

        let channel_mode = (data[3] >> 6) & 0x03;
        let channels = if channel_mode == 3 { 1 } else { 2 };

        let samples_per_frame = match (version, layer) {
            (_, MpegLayer::Layer1) => 384,
            (_, MpegLayer::Layer2) => 1152,
            (MpegVersion::Mpeg1, MpegLayer::Layer3) => 1152,
            (_, MpegLayer::Layer3) => 576,
        };

        let frame_len = match layer {
            MpegLayer::Layer1 => {
                ((12 * bitrate / sample_rate) as usize + padding as usize) * 4
            }
            MpegLayer::Layer2 | MpegLayer::Layer3 => {
                (samples_per_frame as usize / 8) * bitrate as usize / sample_rate as usize
                    + padding as usize
            }
        };

        if frame_len < 4 {
            return None;
        }

        Some(Self {
            sample_rate,
            channels,
            samples_per_frame,
            frame_len,
        })
    }
}

fn bitrate_bps(version: MpegVersion, layer: MpegLayer, index: u8) -> Option<u32> {
    if index == 0 || index == 15 {
        return None;
    }

    const V1_L1: [u32; 16] = [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448, 0];
    const V1_L2: [u32; 16] = [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 0];
    const V1_L3: [u32; 16] = [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 0];
    const V2_L1: [u32; 16] = [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256, 0];
    const V2_L23: [u32; 16] = [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0];

    let table = match (version, layer) {
        (MpegVersion::Mpeg1, MpegLayer::Layer1) => &V1_L1,
        (MpegVersion::Mpeg1, MpegLayer::Layer2) => &V1_L2,
        (MpegVersion::Mpeg1, MpegLayer::Layer3) => &V1_L3,
        (_, MpegLayer::Layer1) => &V2_L1,
        (_, _) => &V2_L23,
    };

    Some(table[index as usize] * 1000)
}

fn sample_rate_hz(version: MpegVersion, index: u8) -> Option<u32> {
    if index > 2 {
        return None;
    }

    let rates = match version {
        MpegVersion::Mpeg1 => [44100, 48000, 32000],
        MpegVersion::Mpeg2 => [22050, 24000, 16000],
        MpegVersion::Mpeg2_5 => [11025, 12000, 8000],
    };

    Some(rates[index as usize])
}

/// Byte length of a leading ID3v2 tag, or 0 when none is present.
pub(crate) fn id3v2_len(data: &[u8]) -> usize {
    if data.len() < 10 || &data[..3] != b"ID3" {
        return 0;
    }

    // Syncsafe 28-bit tag size, header excluded.
    let size = ((data[6] as usize & 0x7F) << 21)
        | ((data[7] as usize & 0x7F) << 14)
        | ((data[8] as usize & 0x7F) << 7)
        | (data[9] as usize & 0x7F);

    10 + size
}

/// Iterator over whole compressed frames, resynchronizing past junk bytes.
///
/// Stops at the first frame whose declared length runs past the end of the
/// data; a truncated tail frame is not decodable and does not count.
struct FrameIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> FrameIter<'a> {
    fn new(data: &'a [u8], start: usize) -> Self {
        Self { data, pos: start }
    }
}

impl Iterator for FrameIter<'_> {
    type Item = (usize, FrameHeader);

    fn next(&mut self) -> Option<(usize, FrameHeader)> {
        while self.pos + 4 <= self.data.len() {
            match FrameHeader::parse(&self.data[self.pos..]) {
                Some(header) => {
                    if self.pos + header.frame_len > self.data.len() {
                        return None;
                    }
                    let offset = self.pos;
                    self.pos += header.frame_len;
                    return Some((offset, header));
                }
                None => self.pos += 1,
            }
        }
        None
    }
}

/// Locate the first decodable frame, skipping any ID3v2 tag and junk bytes.
pub(crate) fn first_frame(data: &[u8]) -> Option<(usize, FrameHeader)> {
    FrameIter::new(data, id3v2_len(data)).next()
}

/// Count compressed frames and accumulated PCM frames in one header pass.
pub(crate) fn count_frames(data: &[u8], start: usize) -> (u64, u64) {
    let mut frames = 0u64;
    let mut pcm = 0u64;
    for (_, header) in FrameIter::new(data, start) {
        frames += 1;
        pcm += u64::from(header.samples_per_frame);
    }
    (frames, pcm)
}

/// One seek point: a compressed-frame byte offset paired with the PCM frame
/// count accumulated before it. The point's position in the index is its
/// compressed-frame index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SeekPoint {
    pub byte_offset: u64,
    pub pcm_offset: u64,
}

/// Compute up to `requested` seek points over the stream.
///
/// The scan may produce fewer points than requested (a damaged tail shrinks
/// the decodable range); callers clamp the count they bind accordingly.
pub(crate) fn calculate_seek_points(data: &[u8], start: usize, requested: u64) -> Vec<SeekPoint> {
    let mut points = Vec::with_capacity(requested.min(1 << 20) as usize);
    let mut pcm = 0u64;

    for (offset, header) in FrameIter::new(data, start).take(requested as usize) {
        points.push(SeekPoint {
            byte_offset: offset as u64,
            pcm_offset: pcm,
        });
        pcm += u64::from(header.samples_per_frame);
    }

    trace!(requested, returned = points.len(), "seek points computed");
    points
}

/// Immutable seek index bound to a table-driven decoder for its lifetime.
pub(crate) struct SeekIndex {
    points: Vec<SeekPoint>,
}

impl SeekIndex {
    /// Bind at most `bound` points, validating the ordering invariant.
    ///
    /// Returns `None` if the points are not monotonically non-decreasing in
    /// both byte offset and PCM offset.
    pub(crate) fn bind(mut points: Vec<SeekPoint>, bound: usize) -> Option<Self> {
        points.truncate(bound);

        let monotonic = points
            .windows(2)
            .all(|w| w[1].byte_offset >= w[0].byte_offset && w[1].pcm_offset >= w[0].pcm_offset);
        if !monotonic {
            return None;
        }

        Some(Self { points })
    }

    pub(crate) fn len(&self) -> usize {
        self.points.len()
    }

    pub(crate) fn point(&self, frame_index: usize) -> SeekPoint {
        self.points[frame_index]
    }

    /// Index of the compressed frame containing `target_pcm`.
    ///
    /// The caller guarantees the target lies within the indexed range.
    pub(crate) fn locate(&self, target_pcm: u64) -> usize {
        self.points
            .partition_point(|p| p.pcm_offset <= target_pcm)
            .saturating_sub(1)
    }
}
