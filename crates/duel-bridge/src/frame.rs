//! Frame reader for the engine's output buffer
//!
//! The engine batches its messages into one buffer. Each frame is a 4-byte
//! little-endian length followed by that many payload bytes. Frames are
//! borrowed from the buffer; nothing is copied here.

use tracing::warn;

/// Size of the length prefix
pub const LENGTH_PREFIX: usize = 4;

/// Why framing stopped before the end of the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truncation {
    /// Fewer than four bytes left for a length prefix
    ShortPrefix { remaining: usize },
    /// Declared payload runs past the end of the buffer
    ShortPayload { declared: usize, available: usize },
    /// Declared payload exceeds the configured frame limit
    Oversized { declared: usize, max: usize },
}

/// Iterator over the complete frames of one engine buffer
#[derive(Debug)]
pub struct FrameReader<'a> {
    buf: &'a [u8],
    pos: usize,
    max_frame_len: usize,
    truncation: Option<Truncation>,
    done: bool,
}

impl<'a> FrameReader<'a> {
    pub fn new(buf: &'a [u8], max_frame_len: usize) -> Self {
        Self {
            buf,
            pos: 0,
            max_frame_len,
            truncation: None,
            done: false,
        }
    }

    /// Set once iteration hit an incomplete or oversized frame
    pub fn truncation(&self) -> Option<Truncation> {
        self.truncation
    }

    /// Bytes covered by the frames yielded so far
    pub fn consumed(&self) -> usize {
        self.pos
    }

    fn stop(&mut self, truncation: Option<Truncation>) -> Option<&'a [u8]> {
        if let Some(t) = truncation {
            warn!(offset = self.pos, ?t, "Engine buffer truncated, dropping tail");
        }
        self.truncation = truncation;
        self.done = true;
        None
    }
}

impl<'a> Iterator for FrameReader<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        if self.done {
            return None;
        }

        let remaining = self.buf.len() - self.pos;
        if remaining == 0 {
            return self.stop(None);
        }
        if remaining < LENGTH_PREFIX {
            return self.stop(Some(Truncation::ShortPrefix { remaining }));
        }

        let mut len_bytes = [0u8; LENGTH_PREFIX];
        len_bytes.copy_from_slice(&self.buf[self.pos..self.pos + LENGTH_PREFIX]);
        let declared = u32::from_le_bytes(len_bytes) as usize;

        if declared > self.max_frame_len {
            let max = self.max_frame_len;
            return self.stop(Some(Truncation::Oversized { declared, max }));
        }

        let start = self.pos + LENGTH_PREFIX;
        let available = self.buf.len() - start;
        if declared > available {
            return self.stop(Some(Truncation::ShortPayload { declared, available }));
        }

        self.pos = start + declared;
        Some(&self.buf[start..self.pos])
    }
}

/// Prefix a payload with its length, as the engine does
pub fn encode_frame(payload: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
}
