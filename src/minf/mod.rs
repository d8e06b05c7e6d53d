//! MINF split-animation metadata (`.mtninf`, `.mtninf2`).
//!
//! A split names a frame range of a parent clip. Records are 56 bytes:
//!
//! ```text
//! 0x00  u32      split name hash
//! 0x04  u32      parent clip hash
//! 0x08  u32      first frame
//! 0x0C  u32      last frame (inclusive)
//! 0x10  [u8;40]  split name, NUL padded
//! ```
//!
//! `.mtninf` holds one record after `"MINF"` and version 1; `.mtninf2` holds
//! `"MINF"`, version 2, a record count and the records.

use tracing::debug;

use crate::util::{decode_cstr, encode_name_checked, hash_name, to_u32, ByteReader, ByteWriter, ContentHash, Error, Result};

pub const MINF_MAGIC: &[u8; 4] = b"MINF";

/// Size of one record.
pub const RECORD_SIZE: usize = 56;

/// Size of the name field; names keep one byte for the terminator.
pub const NAME_FIELD_SIZE: usize = 40;

const VERSION_SINGLE: u32 = 1;
const VERSION_BATCH: u32 = 2;

/// How split records are framed on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitFraming {
    /// One `.mtninf` entry per split.
    #[default]
    Single,
    /// All splits in one `.mtninf2` entry.
    Batch,
}

/// A named frame range of a parent clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitAnimationInfo {
    pub name: String,
    pub parent: ContentHash,
    pub frame_start: u32,
    pub frame_end: u32,
}

impl SplitAnimationInfo {
    pub fn new(name: impl Into<String>, parent_clip: &str, frame_start: u32, frame_end: u32) -> Self {
        Self {
            name: name.into(),
            parent: hash_name(parent_clip),
            frame_start,
            frame_end,
        }
    }

    #[inline]
    pub fn name_hash(&self) -> ContentHash {
        hash_name(&self.name)
    }

    /// Number of frames covered, both ends included.
    #[inline]
    pub fn duration(&self) -> u32 {
        self.frame_end.saturating_sub(self.frame_start) + 1
    }

    /// Check the range against the parent clip's frame count.
    pub fn validate_against(&self, frame_count: u32) -> Result<()> {
        if self.frame_end > frame_count {
            return Err(Error::invalid(format!(
                "split {} ends at frame {} past clip length {frame_count}",
                self.name, self.frame_end
            )));
        }
        Ok(())
    }

    /// Pick the clip name whose hash is this split's parent.
    pub fn resolve_parent<'a, I>(&self, names: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names.into_iter().find(|name| hash_name(name) == self.parent)
    }

    fn check(&self) -> Result<()> {
        if self.frame_start > self.frame_end {
            return Err(Error::invalid(format!(
                "split {}: frame_start {} > frame_end {}",
                self.name, self.frame_start, self.frame_end
            )));
        }
        Ok(())
    }

    fn read(r: &mut ByteReader<'_>) -> Result<Self> {
        let hash = r.hash()?;
        let parent = r.hash()?;
        let frame_start = r.u32()?;
        let frame_end = r.u32()?;
        let name = decode_cstr(r.bytes(NAME_FIELD_SIZE)?).ok_or_else(|| {
            Error::invalid(format!("split name is not terminated within {NAME_FIELD_SIZE} bytes"))
        })?;
        if hash_name(&name) != hash {
            return Err(Error::invalid(format!(
                "split name {name:?} does not match stored hash {hash}"
            )));
        }
        let info = Self {
            name,
            parent,
            frame_start,
            frame_end,
        };
        info.check()?;
        Ok(info)
    }

    fn write(&self, w: &mut ByteWriter) -> Result<()> {
        self.check()?;
        let name = encode_name_checked(&self.name)?;
        if name.len() >= NAME_FIELD_SIZE {
            return Err(Error::invalid(format!(
                "split name {:?} does not fit in {NAME_FIELD_SIZE} bytes",
                self.name
            )));
        }
        w.hash(self.name_hash());
        w.hash(self.parent);
        w.u32(self.frame_start);
        w.u32(self.frame_end);
        w.bytes(&name);
        w.zeros(NAME_FIELD_SIZE - name.len());
        Ok(())
    }
}

fn read_version(r: &mut ByteReader<'_>, expected: u32) -> Result<()> {
    r.expect_magic(MINF_MAGIC, "MINF")?;
    let version = r.u32()?;
    if version != expected {
        return Err(Error::invalid(format!("MINF version {version}, expected {expected}")));
    }
    Ok(())
}

fn expect_end(r: &ByteReader<'_>) -> Result<()> {
    if r.remaining() != 0 {
        return Err(Error::invalid(format!(
            "{} trailing bytes after MINF records",
            r.remaining()
        )));
    }
    Ok(())
}

/// Decode a singular `.mtninf` blob.
pub fn decode_single(data: &[u8]) -> Result<SplitAnimationInfo> {
    let mut r = ByteReader::new(data);
    read_version(&mut r, VERSION_SINGLE)?;
    let info = SplitAnimationInfo::read(&mut r)?;
    expect_end(&r)?;
    Ok(info)
}

/// Decode a batched `.mtninf2` blob.
pub fn decode_batch(data: &[u8]) -> Result<Vec<SplitAnimationInfo>> {
    let mut r = ByteReader::new(data);
    read_version(&mut r, VERSION_BATCH)?;
    let count = r.count(RECORD_SIZE)?;
    let splits = (0..count)
        .map(|_| SplitAnimationInfo::read(&mut r))
        .collect::<Result<Vec<_>>>()?;
    expect_end(&r)?;
    debug!("decoded MINF batch with {} splits", splits.len());
    Ok(splits)
}

pub fn encode_single(info: &SplitAnimationInfo) -> Result<Vec<u8>> {
    let mut w = ByteWriter::with_capacity(8 + RECORD_SIZE);
    w.bytes(MINF_MAGIC);
    w.u32(VERSION_SINGLE);
    info.write(&mut w)?;
    Ok(w.into_inner())
}

pub fn encode_batch(splits: &[SplitAnimationInfo]) -> Result<Vec<u8>> {
    let mut w = ByteWriter::with_capacity(12 + RECORD_SIZE * splits.len());
    w.bytes(MINF_MAGIC);
    w.u32(VERSION_BATCH);
    w.u32(to_u32(splits.len(), "split count")?);
    for info in splits {
        info.write(&mut w)?;
    }
    Ok(w.into_inner())
}
