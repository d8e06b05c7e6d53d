//! XPCK archive container.
//!
//! An XPCK archive is an ordered list of named blobs. Entry names carry the
//! routing information (file extension) for every other codec in this crate.
//!
//! ## File Structure
//!
//! ```text
//! +----------------------+
//! | Magic: "XPCK"        |  4 bytes
//! | Entry count          |  u16
//! | Flags                |  u16
//! | Entry table offset   |  u32
//! | Name table offset    |  u32
//! | Data offset          |  u32
//! | Data size            |  u32
//! +----------------------+
//! | Entries (16 bytes)   |  name crc, name offset, data offset, size
//! +----------------------+
//! | Name table           |  NUL-terminated names
//! +----------------------+
//! | Data                 |  payloads, 4-byte aligned
//! +----------------------+
//! ```

mod format;
mod reader;
mod writer;

pub use format::*;
pub use reader::decode;
pub use writer::encode;

use crate::util::{Error, Result};

/// One named blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub data: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Extension including the dot (`".mbn"`), or `""`.
    pub fn extension(&self) -> &str {
        match self.name.rfind('.') {
            Some(i) => &self.name[i..],
            None => "",
        }
    }
}

/// Ordered collection of uniquely named blobs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Archive {
    entries: Vec<ArchiveEntry>,
}

impl Archive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from entries, rejecting duplicate names.
    pub fn from_entries(entries: impl IntoIterator<Item = ArchiveEntry>) -> Result<Self> {
        let mut archive = Self::new();
        for entry in entries {
            archive.push_entry(entry)?;
        }
        Ok(archive)
    }

    /// Append a blob. Fails if the name is already present.
    pub fn push(&mut self, name: impl Into<String>, data: Vec<u8>) -> Result<()> {
        self.push_entry(ArchiveEntry::new(name, data))
    }

    pub fn push_entry(&mut self, entry: ArchiveEntry) -> Result<()> {
        if self.contains(&entry.name) {
            return Err(Error::DuplicateName(entry.name));
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Payload of the entry with this exact name.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.data.as_slice())
    }

    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ArchiveEntry> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode an archive from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        decode(data)
    }

    /// Encode this archive to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode(self)
    }
}

impl<'a> IntoIterator for &'a Archive {
    type Item = &'a ArchiveEntry;
    type IntoIter = std::slice::Iter<'a, ArchiveEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
