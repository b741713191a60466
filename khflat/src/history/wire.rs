//! Minimal protobuf wire-format reader.
//!
//! The historical packet schema is small and fixed, so the reader covers
//! just what it needs: varints, field keys, length-delimited slices, and
//! skipping of unknown fields. Unknown fields are tolerated (skipped);
//! structurally broken input is a fatal [`DecodeError::Wire`].

use crate::error::DecodeError;

pub(crate) const WIRE_VARINT: u8 = 0;
pub(crate) const WIRE_FIXED64: u8 = 1;
pub(crate) const WIRE_LEN: u8 = 2;
pub(crate) const WIRE_FIXED32: u8 = 5;

/// Forward-only reader over one message's bytes.
pub(crate) struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Reads one base-128 varint.
    pub(crate) fn varint(&mut self) -> Result<u64, DecodeError> {
        let mut value: u64 = 0;
        let mut shift = 0u32;
        loop {
            let Some(&byte) = self.buf.get(self.pos) else {
                return Err(DecodeError::Wire("varint past end of buffer"));
            };
            self.pos += 1;
            if shift >= 64 {
                return Err(DecodeError::Wire("varint longer than 10 bytes"));
            }
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }

    /// Reads a field key, returning `(field_number, wire_type)`.
    pub(crate) fn field(&mut self) -> Result<(u32, u8), DecodeError> {
        let key = self.varint()?;
        Ok(((key >> 3) as u32, (key & 0x07) as u8))
    }

    /// Reads one length-delimited payload.
    pub(crate) fn bytes(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.varint()? as usize;
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or(DecodeError::Wire("length-delimited field past end"))?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Skips one field's value of the given wire type.
    pub(crate) fn skip(&mut self, wire_type: u8) -> Result<(), DecodeError> {
        match wire_type {
            WIRE_VARINT => {
                self.varint()?;
            }
            WIRE_FIXED64 => self.advance(8)?,
            WIRE_LEN => {
                self.bytes()?;
            }
            WIRE_FIXED32 => self.advance(4)?,
            _ => return Err(DecodeError::Wire("unsupported wire type")),
        }
        Ok(())
    }

    fn advance(&mut self, n: usize) -> Result<(), DecodeError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.buf.len())
            .ok_or(DecodeError::Wire("fixed field past end"))?;
        self.pos = end;
        Ok(())
    }
}

/// Appends a varint; test fixtures and the encoder tests use this.
#[cfg(test)]
pub(crate) fn put_varint(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Appends a field key.
#[cfg(test)]
pub(crate) fn put_key(out: &mut Vec<u8>, field: u32, wire_type: u8) {
    put_varint(out, (u64::from(field) << 3) | u64::from(wire_type));
}

/// Appends a length-delimited payload.
#[cfg(test)]
pub(crate) fn put_bytes(out: &mut Vec<u8>, field: u32, payload: &[u8]) {
    put_key(out, field, WIRE_LEN);
    put_varint(out, payload.len() as u64);
    out.extend_from_slice(payload);
}
