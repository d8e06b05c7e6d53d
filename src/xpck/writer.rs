//! XPCK archive writer.

use tracing::debug;

use super::format::*;
use super::Archive;
use crate::util::{encode_name_checked, padding, to_u32, ByteWriter, Error, Result};

/// Encode an archive.
///
/// Output depends only on entry order and content, so encoding the same
/// archive twice yields identical bytes.
pub fn encode(archive: &Archive) -> Result<Vec<u8>> {
    let count = archive.len();
    if count > MAX_ENTRIES {
        return Err(Error::invalid(format!(
            "XPCK holds at most {MAX_ENTRIES} entries, got {count}"
        )));
    }

    // Name table and per-entry offsets
    let mut names = ByteWriter::new();
    let mut records = Vec::with_capacity(count);
    let mut data_cursor = 0usize;
    for entry in archive {
        let encoded = encode_name_checked(&entry.name)?;
        let name_offset = names.pos();
        names.bytes(&encoded);
        names.u8(0);

        records.push(EntryRecord {
            name_crc: crc32::checksum(&encoded),
            name_offset: to_u32(name_offset, "name offset")?,
            data_offset: to_u32(data_cursor, "data offset")?,
            size: to_u32(entry.data.len(), "entry size")?,
        });
        data_cursor += entry.data.len();
        data_cursor += padding(data_cursor, DATA_ALIGN);
    }
    names.align(DATA_ALIGN);
    let names = names.into_inner();

    let entry_table = HEADER_SIZE;
    let name_table = entry_table + count * ENTRY_SIZE;
    let data_offset = name_table + names.len();
    let data_size = data_cursor;

    let mut w = ByteWriter::with_capacity(data_offset + data_size);
    w.bytes(XPCK_MAGIC);
    w.u16(count as u16);
    w.u16(0);
    w.u32(to_u32(entry_table, "entry table offset")?);
    w.u32(to_u32(name_table, "name table offset")?);
    w.u32(to_u32(data_offset, "data offset")?);
    w.u32(to_u32(data_size, "data size")?);

    for record in &records {
        w.u32(record.name_crc);
        w.u32(record.name_offset);
        w.u32(record.data_offset);
        w.u32(record.size);
    }
    w.bytes(&names);

    for entry in archive {
        w.bytes(&entry.data);
        w.align(DATA_ALIGN);
    }

    debug!("encoded XPCK archive: {} entries, {} bytes", count, w.pos());
    Ok(w.into_inner())
}
