//! Bounds-checked little-endian readers and writers.
//!
//! All Level-5 blobs are decoded from in-memory buffers. [`ByteReader`]
//! turns every out-of-range access into [`Error::UnexpectedEof`] so codecs
//! can use `?` throughout instead of slicing by hand.

use byteorder::{ByteOrder, LittleEndian};
use glam::{Quat, Vec3};

use super::error::{Error, Result};
use super::hash::ContentHash;

/// Cursor over a byte slice.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current read position.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Total buffer length.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left after the current position.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Move to an absolute position (may equal the buffer length).
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(Error::UnexpectedEof {
                offset: pos,
                needed: 0,
                available: self.data.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Borrow `len` bytes at an absolute offset without moving the cursor.
    pub fn slice_at(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        let end = offset.checked_add(len).filter(|&end| end <= self.data.len());
        match end {
            Some(end) => Ok(&self.data[offset..end]),
            None => Err(Error::UnexpectedEof {
                offset,
                needed: len,
                available: self.data.len().saturating_sub(offset),
            }),
        }
    }

    /// Consume `len` bytes.
    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let out = self.slice_at(self.pos, len)?;
        self.pos += len;
        Ok(out)
    }

    /// Consume a fixed-size array.
    pub fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    /// Skip `len` bytes.
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.bytes(len).map(|_| ())
    }

    /// Skip to the next multiple of `align`.
    pub fn align(&mut self, align: usize) -> Result<()> {
        let pad = padding(self.pos, align);
        self.skip(pad)
    }

    /// Check a magic tag at the current position.
    pub fn expect_magic(&mut self, magic: &[u8], format: &'static str) -> Result<()> {
        let found = self.slice_at(self.pos, magic.len()).map_err(|_| Error::InvalidMagic {
            format,
            found: self.data[self.pos.min(self.data.len())..].to_vec(),
        })?;
        if found != magic {
            return Err(Error::InvalidMagic {
                format,
                found: found.to_vec(),
            });
        }
        self.pos += magic.len();
        Ok(())
    }

    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.bytes(1)?[0])
    }

    pub fn u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.bytes(2)?))
    }

    pub fn u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.bytes(4)?))
    }

    pub fn u64(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.bytes(8)?))
    }

    pub fn f32(&mut self) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.bytes(4)?))
    }

    pub fn hash(&mut self) -> Result<ContentHash> {
        self.u32().map(ContentHash)
    }

    pub fn vec3(&mut self) -> Result<Vec3> {
        Ok(Vec3::new(self.f32()?, self.f32()?, self.f32()?))
    }

    /// Quaternion stored as x, y, z, w.
    pub fn quat(&mut self) -> Result<Quat> {
        Ok(Quat::from_xyzw(self.f32()?, self.f32()?, self.f32()?, self.f32()?))
    }

    /// Read a `u32` count and reject values that cannot fit in the rest of
    /// the buffer given a minimum per-item size.
    pub fn count(&mut self, min_item_size: usize) -> Result<usize> {
        let offset = self.pos;
        let count = self.u32()? as usize;
        let needed = count.saturating_mul(min_item_size.max(1));
        if min_item_size > 0 && needed > self.remaining() {
            return Err(Error::UnexpectedEof {
                offset,
                needed,
                available: self.remaining(),
            });
        }
        Ok(count)
    }
}

/// Append-only little-endian writer.
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Current write position.
    #[inline]
    pub fn pos(&self) -> usize {
        self.buf.len()
    }

    pub fn bytes(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    pub fn u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn u16(&mut self, value: u16) {
        let mut b = [0u8; 2];
        LittleEndian::write_u16(&mut b, value);
        self.bytes(&b);
    }

    pub fn u32(&mut self, value: u32) {
        let mut b = [0u8; 4];
        LittleEndian::write_u32(&mut b, value);
        self.bytes(&b);
    }

    pub fn u64(&mut self, value: u64) {
        let mut b = [0u8; 8];
        LittleEndian::write_u64(&mut b, value);
        self.bytes(&b);
    }

    pub fn f32(&mut self, value: f32) {
        let mut b = [0u8; 4];
        LittleEndian::write_f32(&mut b, value);
        self.bytes(&b);
    }

    pub fn hash(&mut self, value: ContentHash) {
        self.u32(value.0);
    }

    pub fn vec3(&mut self, v: Vec3) {
        self.f32(v.x);
        self.f32(v.y);
        self.f32(v.z);
    }

    /// Quaternion as x, y, z, w.
    pub fn quat(&mut self, q: Quat) {
        self.f32(q.x);
        self.f32(q.y);
        self.f32(q.z);
        self.f32(q.w);
    }

    /// Write `len` zero bytes.
    pub fn zeros(&mut self, len: usize) {
        self.buf.resize(self.buf.len() + len, 0);
    }

    /// Zero-pad to the next multiple of `align`.
    pub fn align(&mut self, align: usize) {
        let pad = padding(self.buf.len(), align);
        self.zeros(pad);
    }

    /// Overwrite a `u32` at an earlier position (for back-patched offsets).
    pub fn patch_u32(&mut self, pos: usize, value: u32) {
        LittleEndian::write_u32(&mut self.buf[pos..pos + 4], value);
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Bytes needed to pad `pos` up to a multiple of `align`.
#[inline]
pub fn padding(pos: usize, align: usize) -> usize {
    if align <= 1 {
        0
    } else {
        (align - pos % align) % align
    }
}

/// Convert a length to `u32`, failing with a structure error.
pub fn to_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::invalid(format!("{what} {value} does not fit in 32 bits")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write_roundtrip() {
        let mut w = ByteWriter::new();
        w.u8(7);
        w.u16(0x1234);
        w.u32(0xDEADBEEF);
        w.f32(1.5);
        w.vec3(Vec3::new(1.0, 2.0, 3.0));
        w.quat(Quat::IDENTITY);
        let data = w.into_inner();

        let mut r = ByteReader::new(&data);
        assert_eq!(r.u8().unwrap(), 7);
        assert_eq!(r.u16().unwrap(), 0x1234);
        assert_eq!(r.u32().unwrap(), 0xDEADBEEF);
        assert_eq!(r.f32().unwrap(), 1.5);
        assert_eq!(r.vec3().unwrap(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(r.quat().unwrap(), Quat::IDENTITY);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_eof() {
        let data = [1u8, 2, 3];
        let mut r = ByteReader::new(&data);
        let err = r.u32().unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof { offset: 0, needed: 4, available: 3 }));
        // Position is unchanged after a failed read
        assert_eq!(r.pos(), 0);
    }

    #[test]
    fn test_slice_at_overflow() {
        let data = [0u8; 8];
        let r = ByteReader::new(&data);
        assert!(r.slice_at(usize::MAX, 2).is_err());
        assert!(r.slice_at(4, 5).is_err());
        assert_eq!(r.slice_at(4, 4).unwrap().len(), 4);
    }

    #[test]
    fn test_magic() {
        let mut r = ByteReader::new(b"XPCKrest");
        r.expect_magic(b"XPCK", "XPCK").unwrap();
        assert_eq!(r.pos(), 4);

        let mut r = ByteReader::new(b"NOPE");
        assert!(matches!(
            r.expect_magic(b"XPCK", "XPCK"),
            Err(Error::InvalidMagic { .. })
        ));

        let mut r = ByteReader::new(b"XP");
        assert!(matches!(
            r.expect_magic(b"XPCK", "XPCK"),
            Err(Error::InvalidMagic { .. })
        ));
    }

    #[test]
    fn test_count_guard() {
        let mut w = ByteWriter::new();
        w.u32(1_000_000);
        let data = w.into_inner();
        let mut r = ByteReader::new(&data);
        assert!(r.count(4).is_err());
    }

    #[test]
    fn test_align_and_patch() {
        let mut w = ByteWriter::new();
        w.u8(1);
        w.align(4);
        assert_eq!(w.pos(), 4);
        w.u32(0);
        w.patch_u32(4, 99);
        let data = w.into_inner();
        let mut r = ByteReader::new(&data);
        r.skip(1).unwrap();
        r.align(4).unwrap();
        assert_eq!(r.u32().unwrap(), 99);
        assert_eq!(padding(8, 4), 0);
        assert_eq!(padding(9, 4), 3);
    }
}
