//! Big-endian field reading shared by every decoder.
//!
//! WSR-88D messages are sequences of fixed-width big-endian fields. Decoders
//! pull fields one at a time through a [`FieldReader`] so byte order is
//! converted at the point of reading, and finish with [`validate_message`]
//! to confirm they consumed exactly the declared size.

use std::ops::RangeInclusive;

use tracing::warn;

use crate::error::{DecodeError, DecodeResult};

/// Cursor over an in-memory message buffer.
#[derive(Debug, Clone)]
pub struct FieldReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset from the start of the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Total length of the underlying buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Bytes from the current position to the end of the buffer.
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Move to an absolute offset. Seeking past the end is an error.
    pub fn seek(&mut self, pos: usize) -> DecodeResult<()> {
        if pos > self.data.len() {
            return Err(self.eof(pos.saturating_sub(self.pos)));
        }
        self.pos = pos;
        Ok(())
    }

    /// Move to an absolute offset, stopping at the end of the buffer.
    pub fn seek_clamped(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
    }

    pub fn skip(&mut self, n: usize) -> DecodeResult<()> {
        self.read_bytes(n).map(|_| ())
    }

    pub fn read_bytes(&mut self, n: usize) -> DecodeResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(self.eof(n));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> DecodeResult<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> DecodeResult<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> DecodeResult<i8> {
        Ok(i8::from_be_bytes(self.read_array()?))
    }

    pub fn read_u16(&mut self) -> DecodeResult<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub fn read_i16(&mut self) -> DecodeResult<i16> {
        Ok(i16::from_be_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> DecodeResult<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> DecodeResult<i32> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    pub fn read_f32(&mut self) -> DecodeResult<f32> {
        Ok(f32::from_be_bytes(self.read_array()?))
    }

    /// Read `count` consecutive big-endian halfwords.
    pub fn read_u16_vec(&mut self, count: usize) -> DecodeResult<Vec<u16>> {
        let bytes = self.read_bytes(count * 2)?;
        Ok(bytes
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect())
    }

    /// Read a fixed-width character field.
    pub fn read_string(&mut self, n: usize) -> DecodeResult<String> {
        let bytes = self.read_bytes(n)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn peek_u8(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    pub fn peek_u16(&self) -> Option<u16> {
        self.data
            .get(self.pos..self.pos + 2)
            .map(|b| u16::from_be_bytes([b[0], b[1]]))
    }

    /// Split off a reader over the next `n` bytes and advance past them.
    pub fn sub_reader(&mut self, n: usize) -> DecodeResult<FieldReader<'a>> {
        self.read_bytes(n).map(FieldReader::new)
    }

    fn eof(&self, needed: usize) -> DecodeError {
        DecodeError::UnexpectedEof {
            offset: self.pos,
            needed,
            available: self.remaining(),
        }
    }
}

/// Confirm a decoder consumed exactly the declared number of bytes.
pub fn validate_message(bytes_read: usize, declared: usize) -> DecodeResult<()> {
    if bytes_read != declared {
        if bytes_read > declared {
            warn!(bytes_read, declared, "Message contents larger than size");
        } else {
            warn!(bytes_read, declared, "Message contents smaller than size");
        }
        return Err(DecodeError::SizeMismatch {
            read: bytes_read,
            declared,
        });
    }
    Ok(())
}

/// Check a field against its valid range, logging when it falls outside.
pub fn check_range(
    field: &'static str,
    value: impl Into<i64>,
    range: RangeInclusive<i64>,
) -> DecodeResult<()> {
    let value = value.into();
    if !range.contains(&value) {
        warn!(field, value, "Invalid field value");
        return Err(DecodeError::field(field, value));
    }
    Ok(())
}
