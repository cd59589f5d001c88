use bytes::{Buf, BufMut, Bytes};

use crate::error::{Result, WireError};

/// Checked little-endian field reader over one device payload.
///
/// Every read verifies the remaining length first, so a short payload
/// surfaces as [`WireError::Truncated`] instead of a panic inside `bytes`.
#[derive(Debug, Clone)]
pub struct FieldReader {
    buf: Bytes,
}

impl FieldReader {
    pub fn new(buf: impl Into<Bytes>) -> Self {
        Self { buf: buf.into() }
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub fn is_empty(&self) -> bool {
        !self.buf.has_remaining()
    }

    fn ensure(&self, field: &'static str, needed: usize) -> Result<()> {
        let remaining = self.buf.remaining();
        if remaining < needed {
            return Err(WireError::Truncated {
                field,
                needed,
                remaining,
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self, field: &'static str) -> Result<u8> {
        self.ensure(field, 1)?;
        Ok(self.buf.get_u8())
    }

    pub fn read_bool(&mut self, field: &'static str) -> Result<bool> {
        Ok(self.read_u8(field)? != 0)
    }

    pub fn read_u16(&mut self, field: &'static str) -> Result<u16> {
        self.ensure(field, 2)?;
        Ok(self.buf.get_u16_le())
    }

    pub fn read_u32(&mut self, field: &'static str) -> Result<u32> {
        self.ensure(field, 4)?;
        Ok(self.buf.get_u32_le())
    }

    pub fn read_i32(&mut self, field: &'static str) -> Result<i32> {
        self.ensure(field, 4)?;
        Ok(self.buf.get_i32_le())
    }

    pub fn read_f64(&mut self, field: &'static str) -> Result<f64> {
        self.ensure(field, 8)?;
        Ok(self.buf.get_f64_le())
    }

    pub fn read_f64_array<const N: usize>(&mut self, field: &'static str) -> Result<[f64; N]> {
        self.ensure(field, 8 * N)?;
        let mut out = [0.0; N];
        for slot in &mut out {
            *slot = self.buf.get_f64_le();
        }
        Ok(out)
    }

    pub fn read_i32_array<const N: usize>(&mut self, field: &'static str) -> Result<[i32; N]> {
        self.ensure(field, 4 * N)?;
        let mut out = [0; N];
        for slot in &mut out {
            *slot = self.buf.get_i32_le();
        }
        Ok(out)
    }

    /// Read a signed element count, rejecting negative values.
    pub fn read_count(&mut self, field: &'static str) -> Result<usize> {
        let value = self.read_i32(field)?;
        usize::try_from(value).map_err(|_| WireError::NegativeCount { field, value })
    }

    /// Read a NUL-terminated UTF-8 string.
    pub fn read_string(&mut self, field: &'static str) -> Result<String> {
        let end = self
            .buf
            .iter()
            .position(|b| *b == 0)
            .ok_or_else(|| WireError::MalformedString(format!("{field}: missing terminator")))?;
        let raw = self.buf.split_to(end);
        self.buf.advance(1);
        String::from_utf8(raw.to_vec())
            .map_err(|err| WireError::MalformedString(format!("{field}: {err}")))
    }

    /// Split off exactly `len` bytes.
    pub fn read_bytes(&mut self, field: &'static str, len: usize) -> Result<Bytes> {
        self.ensure(field, len)?;
        Ok(self.buf.split_to(len))
    }
}

/// Write a NUL-terminated string.
///
/// A string with an interior NUL byte cannot be represented and is rejected.
pub fn put_string(dst: &mut impl BufMut, field: &'static str, value: &str) -> Result<()> {
    if let Some(at) = value.bytes().position(|b| b == 0) {
        return Err(WireError::MalformedString(format!(
            "{field}: interior NUL byte at offset {at}"
        )));
    }
    dst.put_slice(value.as_bytes());
    dst.put_u8(0);
    Ok(())
}
