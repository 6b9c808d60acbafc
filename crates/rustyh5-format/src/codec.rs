//! Little-endian record cursors shared by the image codec and the
//! datatype encoder.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::FormatError;

/// Append-only little-endian writer.
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn u16(&mut self, v: u16) {
        let mut b = [0u8; 2];
        LittleEndian::write_u16(&mut b, v);
        self.buf.extend_from_slice(&b);
    }

    pub fn u32(&mut self, v: u32) {
        let mut b = [0u8; 4];
        LittleEndian::write_u32(&mut b, v);
        self.buf.extend_from_slice(&b);
    }

    pub fn u64(&mut self, v: u64) {
        let mut b = [0u8; 8];
        LittleEndian::write_u64(&mut b, v);
        self.buf.extend_from_slice(&b);
    }

    /// Length-prefixed (u64) byte block.
    pub fn bytes(&mut self, v: &[u8]) {
        self.u64(v.len() as u64);
        self.buf.extend_from_slice(v);
    }

    /// Length-prefixed (u16) UTF-8 name.
    pub fn name(&mut self, v: &str) -> Result<(), FormatError> {
        self.u16(fit("name length", v.len())?);
        self.buf.extend_from_slice(v.as_bytes());
        Ok(())
    }

    /// Rank (u8) followed by the extents.
    pub fn dims(&mut self, dims: &[u64]) -> Result<(), FormatError> {
        self.u8(fit("rank", dims.len())?);
        for &d in dims {
            self.u64(d);
        }
        Ok(())
    }

    pub fn raw(&mut self, v: &[u8]) {
        self.buf.extend_from_slice(v);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Narrow a length to the unsigned width of its prefix field.
pub fn fit<T: TryFrom<usize>>(what: &'static str, len: usize) -> Result<T, FormatError> {
    T::try_from(len).map_err(|_| FormatError::LimitExceeded {
        what,
        len,
        max: u64::MAX >> (64 - 8 * std::mem::size_of::<T>()),
    })
}

/// Bounds-checked little-endian reader over a byte slice.
#[derive(Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        if self.remaining() < n {
            return Err(FormatError::UnexpectedEof {
                expected: n,
                available: self.remaining(),
            });
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.take(1)?[0])
    }

    pub fn u16(&mut self) -> Result<u16, FormatError> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn u32(&mut self) -> Result<u32, FormatError> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn u64(&mut self) -> Result<u64, FormatError> {
        Ok(LittleEndian::read_u64(self.take(8)?))
    }

    pub fn bytes(&mut self) -> Result<&'a [u8], FormatError> {
        let n = self.u64()?;
        let n = usize::try_from(n).map_err(|_| FormatError::UnexpectedEof {
            expected: usize::MAX,
            available: self.remaining(),
        })?;
        self.take(n)
    }

    pub fn name(&mut self) -> Result<String, FormatError> {
        let n = self.u16()? as usize;
        let raw = self.take(n)?;
        String::from_utf8(raw.to_vec())
            .map_err(|_| FormatError::InvalidName(String::from_utf8_lossy(raw).into_owned()))
    }

    pub fn dims(&mut self) -> Result<Vec<u64>, FormatError> {
        let rank = self.u8()? as usize;
        (0..rank).map(|_| self.u64()).collect()
    }
}
