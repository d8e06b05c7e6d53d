//! Legacy text encoding for names.
//!
//! Level-5 tools store names in a single-byte code page. Hashing goes through
//! [`encode_name`]; every name written into a blob goes through
//! [`encode_name_checked`], which refuses names the code page cannot hold.

use std::borrow::Cow;

use encoding_rs::WINDOWS_1252;

use super::error::{Error, Result};

/// Encode a name into its single-byte representation for hashing.
///
/// Unmappable characters become numeric character references, so this never
/// fails; use [`encode_name_checked`] for bytes that get stored.
pub fn encode_name(name: &str) -> Cow<'_, [u8]> {
    WINDOWS_1252.encode(name).0
}

/// Encode a name for storage, failing when it would not decode back unchanged.
pub fn encode_name_checked(name: &str) -> Result<Cow<'_, [u8]>> {
    let (bytes, _, had_unmappable) = WINDOWS_1252.encode(name);
    if had_unmappable {
        return Err(Error::invalid(format!(
            "name {name:?} has characters outside the Windows-1252 code page"
        )));
    }
    if bytes.contains(&0) {
        return Err(Error::invalid(format!("name {name:?} contains NUL")));
    }
    Ok(bytes)
}

/// Decode on-disk name bytes (without terminator).
pub fn decode_name(bytes: &[u8]) -> String {
    WINDOWS_1252
        .decode_without_bom_handling(bytes)
        .0
        .into_owned()
}

/// Decode a NUL-terminated name that starts at the beginning of `bytes`.
///
/// Returns `None` when no terminator is found.
pub fn decode_cstr(bytes: &[u8]) -> Option<String> {
    let end = bytes.iter().position(|&b| b == 0)?;
    Some(decode_name(&bytes[..end]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_roundtrip() {
        let bytes = encode_name("pelvis");
        assert_eq!(&*bytes, b"pelvis");
        assert_eq!(decode_name(&bytes), "pelvis");
    }

    #[test]
    fn test_single_byte_per_char() {
        // é is a single byte (0xE9) in the legacy code page
        let bytes = encode_name("caf\u{e9}");
        assert_eq!(&*bytes, &[b'c', b'a', b'f', 0xE9]);
        assert_eq!(decode_name(&bytes), "caf\u{e9}");
    }

    #[test]
    fn test_checked_rejects_unmappable() {
        assert_eq!(&*encode_name_checked("caf\u{e9}").unwrap(), &[b'c', b'a', b'f', 0xE9]);
        assert!(encode_name_checked("\u{65e5}\u{672c}.mbn").unwrap_err().is_format_error());
        assert!(encode_name_checked("a\0b").is_err());
        // Hashing still accepts anything
        assert!(!encode_name("\u{9aa8}").is_empty());
    }

    #[test]
    fn test_cstr() {
        assert_eq!(decode_cstr(b"abc\0def").as_deref(), Some("abc"));
        assert_eq!(decode_cstr(b"abc"), None);
    }
}
