//! Sequential big-endian cursors over byte buffers
//!
//! `ByteReader` and `ByteWriter` are the foundation of every record codec in
//! this crate. All multi-byte integers on the wire are big-endian. Reads are
//! bounds-checked: running past the end of the buffer is `Error::Truncated`,
//! never an implicit zero-fill.

use crate::error::{Error, Result};
use crate::text;

/// Bounds-checked big-endian reader over a fixed byte slice
#[derive(Debug)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Create a reader over the whole slice
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes left to read
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Current read position
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    fn check(&self, n: usize) -> Result<()> {
        if self.remaining() < n {
            return Err(Error::Truncated {
                needed: n,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    /// Read one byte
    pub fn read_u8(&mut self) -> Result<u8> {
        self.check(1)?;
        let v = self.buf[self.pos];
        self.pos += 1;
        Ok(v)
    }

    /// Read a big-endian u16
    pub fn read_u16(&mut self) -> Result<u16> {
        self.check(2)?;
        let v = u16::from_be_bytes([self.buf[self.pos], self.buf[self.pos + 1]]);
        self.pos += 2;
        Ok(v)
    }

    /// Read a big-endian 24-bit unsigned integer into a u32
    pub fn read_u24(&mut self) -> Result<u32> {
        self.check(3)?;
        let v = ((self.buf[self.pos] as u32) << 16)
            | ((self.buf[self.pos + 1] as u32) << 8)
            | (self.buf[self.pos + 2] as u32);
        self.pos += 3;
        Ok(v)
    }

    /// Read a big-endian u32
    pub fn read_u32(&mut self) -> Result<u32> {
        self.check(4)?;
        let v = u32::from_be_bytes([
            self.buf[self.pos],
            self.buf[self.pos + 1],
            self.buf[self.pos + 2],
            self.buf[self.pos + 3],
        ]);
        self.pos += 4;
        Ok(v)
    }

    /// Read a big-endian i16
    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(self.read_u16()? as i16)
    }

    /// Read exactly `n` bytes
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.check(n)?;
        let s = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(s)
    }

    /// Read everything left in the buffer
    pub fn read_remaining(&mut self) -> &'a [u8] {
        let s = &self.buf[self.pos..];
        self.pos = self.buf.len();
        s
    }

    /// Skip `n` bytes
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.check(n)?;
        self.pos += n;
        Ok(())
    }

    /// Move the read position back `n` bytes (lookahead-then-reparse)
    pub fn rewind(&mut self, n: usize) -> Result<()> {
        if n > self.pos {
            return Err(Error::InvalidParameter(format!(
                "cannot rewind {} bytes at position {}",
                n, self.pos
            )));
        }
        self.pos -= n;
        Ok(())
    }

    /// Split off an isolated reader over the next `n` bytes
    ///
    /// Record payloads are always decoded through a sub-reader so a
    /// malformed variant parser cannot read into a sibling record.
    pub fn sub_reader(&mut self, n: usize) -> Result<ByteReader<'a>> {
        Ok(ByteReader::new(self.read_bytes(n)?))
    }

    /// Read `n` bytes of EBCDIC (code page 500) text
    pub fn read_ebcdic(&mut self, n: usize) -> Result<String> {
        let bytes = self.read_bytes(n)?;
        Ok(text::ebcdic_to_string(bytes))
    }

    /// Read `n` bytes of UCS-2 big-endian text (`n` must be even)
    pub fn read_ucs2(&mut self, n: usize) -> Result<String> {
        let bytes = self.read_bytes(n)?;
        text::ucs2_to_string(bytes)
    }
}

/// Big-endian writer over a growable buffer
///
/// Mirrors `ByteReader`, plus `mark_u16`/`patch_u16` for the
/// write-placeholder-then-patch-length pattern used by records whose length
/// is only known after payload construction.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Create an empty writer
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Bytes written so far
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Write one byte
    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    /// Write a big-endian u16
    pub fn write_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    /// Write the low 24 bits of `v` big-endian
    pub fn write_u24(&mut self, v: u32) {
        self.buf.push((v >> 16) as u8);
        self.buf.push((v >> 8) as u8);
        self.buf.push(v as u8);
    }

    /// Write a big-endian u32
    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    /// Write a big-endian i16
    pub fn write_i16(&mut self, v: i16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    /// Write raw bytes
    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Reserve a u16 slot and return its offset for later patching
    pub fn mark_u16(&mut self) -> usize {
        let mark = self.buf.len();
        self.buf.extend_from_slice(&[0, 0]);
        mark
    }

    /// Patch a previously reserved u16 slot
    pub fn patch_u16(&mut self, mark: usize, v: u16) {
        self.buf[mark..mark + 2].copy_from_slice(&v.to_be_bytes());
    }

    /// Write EBCDIC (code page 500) text, space-padded to `width` bytes
    pub fn write_ebcdic(&mut self, s: &str, width: usize) -> Result<()> {
        let bytes = text::string_to_ebcdic(s)?;
        if bytes.len() > width {
            return Err(Error::InvalidParameter(format!(
                "string {:?} exceeds field width {}",
                s, width
            )));
        }
        self.buf.extend_from_slice(&bytes);
        // EBCDIC space is 0x40
        self.buf.extend(std::iter::repeat(0x40).take(width - bytes.len()));
        Ok(())
    }

    /// Write UCS-2 big-endian text
    pub fn write_ucs2(&mut self, s: &str) -> Result<()> {
        let bytes = text::string_to_ucs2(s)?;
        self.buf.extend_from_slice(&bytes);
        Ok(())
    }

    /// Consume the writer and return the buffer
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Borrow the buffer
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_integers() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.read_u8().unwrap(), 0x01);
        assert_eq!(r.read_u16().unwrap(), 0x0203);
        assert_eq!(r.read_u24().unwrap(), 0x040506);
        assert_eq!(r.read_u32().unwrap(), 0x0708090A);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_read_i16() {
        let mut r = ByteReader::new(&[0xFF, 0xFE]);
        assert_eq!(r.read_i16().unwrap(), -2);
    }

    #[test]
    fn test_truncated_read() {
        let mut r = ByteReader::new(&[0x01]);
        let err = r.read_u16().unwrap_err();
        match err {
            crate::Error::Truncated { needed, available } => {
                assert_eq!(needed, 2);
                assert_eq!(available, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rewind() {
        let data = [0x11, 0x22, 0x33];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.read_u16().unwrap(), 0x1122);
        r.rewind(1).unwrap();
        assert_eq!(r.read_u8().unwrap(), 0x22);
        assert!(r.rewind(10).is_err());
    }

    #[test]
    fn test_sub_reader_isolation() {
        let data = [0xAA, 0xBB, 0xCC, 0xDD];
        let mut r = ByteReader::new(&data);
        let mut sub = r.sub_reader(2).unwrap();
        assert_eq!(sub.read_u8().unwrap(), 0xAA);
        assert_eq!(sub.read_u8().unwrap(), 0xBB);
        // Sub-reader is exhausted even though the parent has bytes left
        assert!(sub.read_u8().is_err());
        assert_eq!(r.read_u16().unwrap(), 0xCCDD);
    }

    #[test]
    fn test_writer_roundtrip() {
        let mut w = ByteWriter::new();
        w.write_u8(0x01);
        w.write_u16(0x0203);
        w.write_u24(0x040506);
        w.write_u32(0x0708090A);
        w.write_i16(-2);
        assert_eq!(
            w.into_bytes(),
            vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0xFF, 0xFE]
        );
    }

    #[test]
    fn test_mark_and_patch() {
        let mut w = ByteWriter::new();
        let mark = w.mark_u16();
        w.write_bytes(&[0xAA, 0xBB, 0xCC]);
        let total = w.len() as u16;
        w.patch_u16(mark, total);
        assert_eq!(w.into_bytes(), vec![0x00, 0x05, 0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn test_skip_and_remaining() {
        let data = [1, 2, 3, 4];
        let mut r = ByteReader::new(&data);
        r.skip(3).unwrap();
        assert_eq!(r.read_remaining(), &[4]);
        assert!(r.skip(1).is_err());
    }
}
