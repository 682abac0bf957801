//! # Carry-Over Buffer
//!
//! Backends produce decode units whose frame counts rarely divide evenly
//! into the caller's output capacity. The carry-over buffer holds the excess
//! frames of the most recent backend read and replays them at the start of
//! the next `decode` call, so no frame is ever dropped or emitted twice.

/// Holding area for decoded PCM frames produced beyond the caller's current
/// request capacity.
///
/// Frames are stored contiguously in stream order and consumed from the
/// front; after partial consumption the unconsumed remainder is shifted back
/// to the front so the region never contains gaps. The valid frame count
/// times the frame stride never exceeds the allocated length.
pub(crate) struct CarryBuffer {
    buf: Vec<u8>,
    frames: usize,
    stride: usize,
}

impl CarryBuffer {
    /// Create an empty buffer for frames of `stride` bytes, with room for
    /// roughly one target chunk pre-allocated.
    pub(crate) fn new(stride: usize, initial_capacity: usize) -> Self {
        debug_assert!(stride > 0);
        Self {
            buf: Vec::with_capacity(initial_capacity),
            frames: 0,
            stride,
        }
    }

    /// Number of valid frames currently held.
    pub(crate) fn frames(&self) -> usize {
        self.frames
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.frames == 0
    }

    /// Copy up to `out.len() / stride` frames into the front of `out`,
    /// compacting the unconsumed remainder. Returns the number of frames
    /// copied.
    pub(crate) fn drain_into(&mut self, out: &mut [u8]) -> usize {
        let wanted = out.len() / self.stride;
        let taken = self.frames.min(wanted);
        if taken == 0 {
            return 0;
        }

        let taken_bytes = taken * self.stride;
        out[..taken_bytes].copy_from_slice(&self.buf[..taken_bytes]);
        self.frames -= taken;

        if self.frames > 0 {
            // Shift the remainder to the front; the region stays gap-free.
            self.buf.copy_within(taken_bytes.., 0);
        }
        self.buf.truncate(self.frames * self.stride);

        taken
    }

    /// Append whole frames to the back of the buffer, growing it if needed.
    pub(crate) fn stash(&mut self, bytes: &[u8]) {
        debug_assert_eq!(bytes.len() % self.stride, 0);
        self.buf.extend_from_slice(bytes);
        self.frames += bytes.len() / self.stride;
    }

    /// Discard all held frames.
    pub(crate) fn clear(&mut self) {
        self.buf.clear();
        self.frames = 0;
    }
}
