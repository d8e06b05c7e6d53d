//! Shared string table.
//!
//! Names are interned by [`StringTableBuilder`] while a table is being
//! built; the finished [`StringTable`] is immutable.

use std::collections::HashMap;

use crate::util::{decode_cstr, encode_name_checked, to_u32, Error, Result};

/// Deduplicated, NUL-terminated names in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringTable {
    data: Vec<u8>,
    strings: Vec<String>,
    offsets: HashMap<String, u32>,
}

impl StringTable {
    /// Offset of a name, if it was interned.
    pub fn offset_of(&self, name: &str) -> Option<u32> {
        self.offsets.get(name).copied()
    }

    /// Distinct names in the order they were first seen.
    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    /// Serialized form.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Read the name at `offset` from a serialized string table.
    pub fn read(data: &[u8], offset: u32) -> Result<String> {
        let start = offset as usize;
        if start >= data.len() {
            return Err(Error::invalid(format!(
                "string offset {start:#x} outside string table ({} bytes)",
                data.len()
            )));
        }
        decode_cstr(&data[start..])
            .ok_or_else(|| Error::invalid(format!("unterminated string at offset {start:#x}")))
    }
}

/// Mutable interning state, owned by a single build.
#[derive(Debug, Default)]
pub struct StringTableBuilder {
    table: StringTable,
}

impl StringTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a name and return its offset. Repeated names share one entry.
    pub fn intern(&mut self, name: &str) -> Result<u32> {
        if let Some(offset) = self.table.offset_of(name) {
            return Ok(offset);
        }
        let encoded = encode_name_checked(name)?;
        let offset = to_u32(self.table.data.len(), "string table size")?;
        self.table.data.extend_from_slice(&encoded);
        self.table.data.push(0);
        self.table.strings.push(name.to_string());
        self.table.offsets.insert(name.to_string(), offset);
        Ok(offset)
    }

    pub fn finish(self) -> StringTable {
        self.table
    }
}
