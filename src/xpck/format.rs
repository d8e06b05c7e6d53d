//! XPCK format constants.

/// Magic bytes at the start of an archive.
pub const XPCK_MAGIC: &[u8; 4] = b"XPCK";

/// Size of the archive header in bytes.
pub const HEADER_SIZE: usize = 0x18;

/// Size of one entry table record.
pub const ENTRY_SIZE: usize = 16;

/// Alignment of the name table end and of every payload.
pub const DATA_ALIGN: usize = 4;

/// Maximum number of entries (the count field is 16 bits).
pub const MAX_ENTRIES: usize = u16::MAX as usize;

/// Raw entry table record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryRecord {
    pub name_crc: u32,
    pub name_offset: u32,
    pub data_offset: u32,
    pub size: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic() {
        assert_eq!(XPCK_MAGIC, b"XPCK");
        assert_eq!(HEADER_SIZE % DATA_ALIGN, 0);
        assert_eq!(ENTRY_SIZE % DATA_ALIGN, 0);
    }
}
