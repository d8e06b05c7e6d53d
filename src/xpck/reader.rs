//! XPCK archive reader.

use std::collections::HashSet;

use tracing::debug;

use super::format::*;
use super::{Archive, ArchiveEntry};
use crate::util::{decode_cstr, encode_name, ByteReader, Error, Result};

/// Decode an archive from bytes.
///
/// Fails if the header or entry table is truncated, a name or payload range
/// lies outside the buffer, an entry's name hash is wrong, or a name repeats.
pub fn decode(data: &[u8]) -> Result<Archive> {
    let mut r = ByteReader::new(data);
    r.expect_magic(XPCK_MAGIC, "XPCK")?;

    let count = r.u16()? as usize;
    let _flags = r.u16()?;
    let entry_table = r.u32()? as usize;
    let name_table = r.u32()? as usize;
    let data_offset = r.u32()? as usize;
    let data_size = r.u32()? as usize;

    // Sections must be in order and inside the buffer
    if entry_table < HEADER_SIZE || name_table < entry_table || data_offset < name_table {
        return Err(Error::invalid(format!(
            "XPCK section offsets out of order: entries {entry_table:#x}, names {name_table:#x}, data {data_offset:#x}"
        )));
    }
    let names = r.slice_at(name_table, data_offset - name_table)?;
    let payloads = r.slice_at(data_offset, data_size)?;

    r.seek(entry_table)?;
    let table_len = count * ENTRY_SIZE;
    if entry_table + table_len > name_table {
        return Err(Error::UnexpectedEof {
            offset: entry_table,
            needed: table_len,
            available: name_table - entry_table,
        });
    }

    let mut seen = HashSet::with_capacity(count);
    let mut entries = Vec::with_capacity(count);
    for i in 0..count {
        let record = EntryRecord {
            name_crc: r.u32()?,
            name_offset: r.u32()?,
            data_offset: r.u32()?,
            size: r.u32()?,
        };

        let name_start = record.name_offset as usize;
        if name_start >= names.len() {
            return Err(Error::invalid(format!(
                "entry {i}: name offset {name_start:#x} outside name table ({} bytes)",
                names.len()
            )));
        }
        let name = decode_cstr(&names[name_start..])
            .ok_or_else(|| Error::invalid(format!("entry {i}: unterminated name")))?;

        let crc = crc32::checksum(&encode_name(&name));
        if crc != record.name_crc {
            return Err(Error::invalid(format!(
                "entry {i} ({name}): name hash {:#010x} does not match stored {:#010x}",
                crc, record.name_crc
            )));
        }

        let start = record.data_offset as usize;
        let len = record.size as usize;
        let payload = start
            .checked_add(len)
            .filter(|&end| end <= payloads.len())
            .map(|end| &payloads[start..end])
            .ok_or(Error::UnexpectedEof {
                offset: data_offset + start,
                needed: len,
                available: payloads.len().saturating_sub(start),
            })?;

        if !seen.insert(name.clone()) {
            return Err(Error::DuplicateName(name));
        }
        entries.push(ArchiveEntry::new(name, payload.to_vec()));
    }

    debug!("decoded XPCK archive: {} entries, {} data bytes", entries.len(), data_size);
    Ok(Archive { entries })
}
