//! Little-endian cursor over a frame payload

use super::CodecError;
use duel_core::Place;

/// Bounds-checked reader; every read fails cleanly on a short frame
#[derive(Debug)]
pub struct RawReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> RawReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        if self.remaining() < N {
            return Err(CodecError::Truncated {
                needed: N,
                available: self.remaining(),
            });
        }
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take::<1>()?[0])
    }

    pub fn bool(&mut self) -> Result<bool, CodecError> {
        Ok(self.u8()? != 0)
    }

    pub fn u16(&mut self) -> Result<u16, CodecError> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    pub fn u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    pub fn u64(&mut self) -> Result<u64, CodecError> {
        Ok(u64::from_le_bytes(self.take()?))
    }

    /// A list count, refusing counts the rest of the frame cannot hold
    pub fn count(&mut self, min_entry_len: usize) -> Result<usize, CodecError> {
        let count = self.u32()? as usize;
        let needed = count.saturating_mul(min_entry_len);
        if needed > self.remaining() {
            return Err(CodecError::Truncated {
                needed,
                available: self.remaining(),
            });
        }
        Ok(count)
    }

    /// `loc_info`: controller u8, location u8, sequence u32, position u32.
    ///
    /// For overlay places the position word carries the material index.
    pub fn loc_info(&mut self) -> Result<(Place, u32), CodecError> {
        let controller = self.u8()?;
        let location = self.u8()? as u32;
        let sequence = self.u32()?;
        let position = self.u32()?;
        let mut place = Place::new(controller, location, sequence);
        if place.is_overlay() {
            place.overlay_sequence = Some(position);
            return Ok((place, 0));
        }
        Ok((place, position))
    }
}
