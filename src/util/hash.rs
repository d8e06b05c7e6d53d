//! Content hashes.
//!
//! Every cross reference between blobs is a [`ContentHash`]: the CRC-32 of
//! the name in its legacy single-byte encoding. Blobs never embed pointers
//! into one another, only these hashes.

use std::fmt;

use super::text::encode_name;

/// 32-bit identifier derived from a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ContentHash(pub u32);

impl ContentHash {
    /// The reserved "no parent" / "none" value.
    pub const NONE: ContentHash = ContentHash(0);

    /// Hash a name.
    #[inline]
    pub fn of(name: &str) -> Self {
        hash_name(name)
    }

    /// Raw value.
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// True for the reserved zero hash.
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for ContentHash {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl fmt::LowerHex for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// Derive the content hash of a name.
pub fn hash_name(name: &str) -> ContentHash {
    ContentHash(crc32::checksum(&encode_name(name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        assert_eq!(hash_name("pelvis"), hash_name("pelvis"));
        assert_eq!(ContentHash::of("spine"), hash_name("spine"));
    }

    #[test]
    fn test_distinct_names() {
        let names = ["pelvis", "spine", "spine1", "head", "Head", "l_arm", "r_arm"];
        for (i, a) in names.iter().enumerate() {
            for b in &names[i + 1..] {
                assert_ne!(hash_name(a), hash_name(b), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn test_matches_crc32() {
        assert_eq!(hash_name("123456789"), ContentHash(0xCBF4_3926));
        assert_eq!(hash_name(""), ContentHash::NONE);
    }

    #[test]
    fn test_legacy_encoding_is_hashed() {
        // The hash input is the single-byte form, not UTF-8
        assert_eq!(hash_name("caf\u{e9}").0, crc32::checksum(&[b'c', b'a', b'f', 0xE9]));
    }

    #[test]
    fn test_display() {
        assert_eq!(ContentHash(0xAB).to_string(), "0x000000ab");
    }
}
