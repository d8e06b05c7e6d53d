//! RES format constants.

use crate::util::{Error, Result};

/// Size of the fixed header.
pub const HEADER_SIZE: usize = 0x10;

/// Size of a section header (tag, record size, count).
pub const SECTION_HEADER_SIZE: usize = 8;

/// Texture slots per material record.
pub const MATERIAL_TEXTURE_SLOTS: usize = 4;

/// What the table describes; stored as the 8-byte magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResourceKind {
    /// Character model table.
    #[default]
    Character,
    /// Scene / prop table.
    Scene,
}

impl ResourceKind {
    pub const fn magic(self) -> &'static [u8; 8] {
        match self {
            ResourceKind::Character => b"CHRC00\0\0",
            ResourceKind::Scene => b"CHRN01\0\0",
        }
    }

    pub fn from_magic(magic: &[u8; 8]) -> Result<Self> {
        [ResourceKind::Character, ResourceKind::Scene]
            .into_iter()
            .find(|k| k.magic() == magic)
            .ok_or_else(|| Error::InvalidMagic {
                format: "RES",
                found: magic.to_vec(),
            })
    }
}

/// Section type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u16)]
pub enum SectionType {
    Bone = 0x0001,
    Texture = 0x0002,
    MaterialData = 0x0003,
    Animation = 0x0004,
}

impl SectionType {
    /// All sections in the order they are written.
    pub const ALL: [SectionType; 4] = [
        SectionType::Bone,
        SectionType::Texture,
        SectionType::MaterialData,
        SectionType::Animation,
    ];

    pub fn from_tag(tag: u16) -> Result<Self> {
        match tag {
            0x0001 => Ok(SectionType::Bone),
            0x0002 => Ok(SectionType::Texture),
            0x0003 => Ok(SectionType::MaterialData),
            0x0004 => Ok(SectionType::Animation),
            other => Err(Error::invalid(format!("unknown RES section tag {other:#06x}"))),
        }
    }

    #[inline]
    pub const fn tag(self) -> u16 {
        self as u16
    }

    /// Fixed record size in bytes.
    pub const fn record_size(self) -> usize {
        match self {
            SectionType::Bone | SectionType::Animation => 8,
            SectionType::Texture => 16,
            SectionType::MaterialData => 12 + 4 * MATERIAL_TEXTURE_SLOTS,
        }
    }
}
