//! MBN bone records (`.mbn`).
//!
//! Each bone is stored in its own archive entry as a fixed 52-byte record:
//!
//! ```text
//! 0x00  u32     bone hash
//! 0x04  u32     parent hash (0 = root)
//! 0x08  u32     reserved
//! 0x0C  f32×3   local translation
//! 0x18  f32×4   local rotation (x, y, z, w)
//! 0x28  f32×3   local scale
//! ```
//!
//! Records are decoded one by one; [`Skeleton`] links them into a forest.

mod skeleton;

pub use skeleton::*;

use crate::util::{hash_name, ByteReader, ByteWriter, ContentHash, Error, Quat, Result, Transform, Vec3};

/// Size of one record.
pub const RECORD_SIZE: usize = 52;

/// One joint with its transform relative to the parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneRecord {
    pub hash: ContentHash,
    /// [`ContentHash::NONE`] for roots.
    pub parent: ContentHash,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl BoneRecord {
    /// Record keyed by bone name, with an optional parent name.
    ///
    /// The empty name hashes to [`ContentHash::NONE`], so `Some("")` as a
    /// parent yields a root; the pack pipeline rejects empty names.
    pub fn from_named(name: &str, parent: Option<&str>, transform: Transform) -> Self {
        Self {
            hash: hash_name(name),
            parent: parent.map_or(ContentHash::NONE, hash_name),
            translation: transform.translation,
            rotation: transform.rotation,
            scale: transform.scale,
        }
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    #[inline]
    pub fn transform(&self) -> Transform {
        Transform::new(self.translation, self.rotation, self.scale)
    }

    /// Decode one record; the blob must be exactly [`RECORD_SIZE`] bytes.
    pub fn decode(blob: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(blob);
        let hash = r.hash()?;
        let parent = r.hash()?;
        let _reserved = r.u32()?;
        let record = Self {
            hash,
            parent,
            translation: r.vec3()?,
            rotation: r.quat()?,
            scale: r.vec3()?,
        };
        if r.remaining() != 0 {
            return Err(Error::invalid(format!(
                "MBN record is {} bytes, expected {RECORD_SIZE}",
                blob.len()
            )));
        }
        Ok(record)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(RECORD_SIZE);
        w.hash(self.hash);
        w.hash(self.parent);
        w.u32(0);
        w.vec3(self.translation);
        w.quat(self.rotation);
        w.vec3(self.scale);
        w.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_layout() {
        let record = BoneRecord::from_named(
            "spine",
            Some("pelvis"),
            Transform::new(Vec3::new(0.0, 1.5, 0.0), Quat::from_rotation_z(0.5), Vec3::ONE),
        );
        let blob = record.encode();
        assert_eq!(blob.len(), RECORD_SIZE);
        assert_eq!(&blob[0..4], &hash_name("spine").0.to_le_bytes());
        assert_eq!(&blob[4..8], &hash_name("pelvis").0.to_le_bytes());
        assert_eq!(&blob[8..12], &[0; 4]);
        assert_eq!(&blob[16..20], &1.5f32.to_le_bytes());
        assert_eq!(BoneRecord::decode(&blob).unwrap(), record);
    }

    #[test]
    fn test_root() {
        let record = BoneRecord::from_named("pelvis", None, Transform::IDENTITY);
        assert!(record.is_root());
        let decoded = BoneRecord::decode(&record.encode()).unwrap();
        assert_eq!(decoded.parent, ContentHash::NONE);
        assert_eq!(decoded.transform(), Transform::IDENTITY);
    }

    #[test]
    fn test_size_checked() {
        let blob = BoneRecord::from_named("a", None, Transform::IDENTITY).encode();
        assert!(matches!(
            BoneRecord::decode(&blob[..RECORD_SIZE - 1]),
            Err(Error::UnexpectedEof { .. })
        ));
        let mut long = blob.clone();
        long.push(0);
        assert!(BoneRecord::decode(&long).unwrap_err().is_format_error());
    }
}
