//! XCMA camera animation (`.cmr2`).
//!
//! ```text
//! 0x00  [u8;4]  magic "XCMA"
//! 0x04  u32     camera name hash
//! 0x08  u32     frame count
//! 0x0C  u32     location key count
//! 0x10  u32     rotation key count
//! ....  location keys: u32 frame, f32×3
//! ....  rotation keys: u32 frame, f32×3 (x, y, z; w is implied >= 0)
//! ```

use tracing::debug;

use crate::util::{canonical_quat, quat_from_xyz, to_u32, ByteReader, ByteWriter, ContentHash, Error, Quat, Result, Vec3};
use crate::xmtn::{sample, Interpolation, Key};

pub const XCMA_MAGIC: &[u8; 4] = b"XCMA";

const KEY_SIZE: usize = 16;

/// Camera path. Location keys interpolate linearly, rotation keys hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CameraClip {
    pub name_hash: ContentHash,
    pub frame_count: u32,
    pub location: Vec<Key<Vec3>>,
    pub rotation: Vec<Key<Quat>>,
}

impl CameraClip {
    pub fn new(name_hash: ContentHash, frame_count: u32) -> Self {
        Self {
            name_hash,
            frame_count,
            ..Self::default()
        }
    }

    pub fn push_location(&mut self, frame: u32, location: Vec3) {
        self.location.push(Key::linear(frame, location));
    }

    pub fn push_rotation(&mut self, frame: u32, rotation: Quat) {
        self.rotation
            .push(Key::new(frame, rotation, Interpolation::Constant));
    }

    pub fn location_at(&self, frame: u32) -> Vec3 {
        sample(&self.location, frame, Vec3::ZERO)
    }

    /// Rotation of the last key at or before `frame`.
    pub fn rotation_at(&self, frame: u32) -> Quat {
        sample(&self.rotation, frame, Quat::IDENTITY)
    }

    fn check_order<T>(keys: &[Key<T>], channel: &str) -> Result<()> {
        match keys.windows(2).find(|pair| pair[1].frame <= pair[0].frame) {
            Some(pair) => Err(Error::invalid(format!(
                "XCMA {channel} key frames not increasing at {}",
                pair[1].frame
            ))),
            None => Ok(()),
        }
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(data);
        r.expect_magic(XCMA_MAGIC, "XCMA")?;
        let mut clip = Self::new(r.hash()?, r.u32()?);
        let location_count = r.u32()? as usize;
        let rotation_count = r.u32()? as usize;
        let needed = location_count.saturating_add(rotation_count).saturating_mul(KEY_SIZE);
        if needed > r.remaining() {
            return Err(Error::UnexpectedEof {
                offset: r.pos(),
                needed,
                available: r.remaining(),
            });
        }

        for _ in 0..location_count {
            let frame = r.u32()?;
            clip.push_location(frame, r.vec3()?);
        }
        for _ in 0..rotation_count {
            let frame = r.u32()?;
            let v = r.vec3()?;
            clip.push_rotation(frame, quat_from_xyz(v.x, v.y, v.z));
        }
        Self::check_order(&clip.location, "location")?;
        Self::check_order(&clip.rotation, "rotation")?;

        debug!(
            "decoded XCMA {} ({} frames, {} location keys, {} rotation keys)",
            clip.name_hash,
            clip.frame_count,
            location_count,
            rotation_count
        );
        Ok(clip)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Self::check_order(&self.location, "location")?;
        Self::check_order(&self.rotation, "rotation")?;

        let mut w = ByteWriter::with_capacity(20 + KEY_SIZE * (self.location.len() + self.rotation.len()));
        w.bytes(XCMA_MAGIC);
        w.hash(self.name_hash);
        w.u32(self.frame_count);
        w.u32(to_u32(self.location.len(), "location key count")?);
        w.u32(to_u32(self.rotation.len(), "rotation key count")?);
        for key in &self.location {
            w.u32(key.frame);
            w.vec3(key.value);
        }
        for key in &self.rotation {
            let q = canonical_quat(key.value.normalize());
            w.u32(key.frame);
            w.vec3(Vec3::new(q.x, q.y, q.z));
        }
        Ok(w.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::hash_name;

    fn camera() -> CameraClip {
        let mut clip = CameraClip::new(hash_name("cam_main"), 30);
        clip.push_location(0, Vec3::ZERO);
        clip.push_location(10, Vec3::new(10.0, 0.0, 5.0));
        clip.push_rotation(0, Quat::from_rotation_y(0.3));
        clip.push_rotation(20, Quat::from_rotation_x(-0.8));
        clip
    }

    #[test]
    fn test_roundtrip() {
        let clip = camera();
        let bytes = clip.encode().unwrap();
        assert_eq!(bytes.len(), 20 + 4 * KEY_SIZE);
        let decoded = CameraClip::decode(&bytes).unwrap();
        assert_eq!(decoded.name_hash, clip.name_hash);
        assert_eq!(decoded.location, clip.location);
        for (a, b) in decoded.rotation.iter().zip(&clip.rotation) {
            assert_eq!(a.frame, b.frame);
            assert!(a.value.angle_between(b.value) < 1e-3);
        }
    }

    #[test]
    fn test_negative_w_canonicalized() {
        let mut clip = CameraClip::new(ContentHash(1), 2);
        let q = Quat::from_rotation_z(0.4);
        clip.push_rotation(0, -q);
        let decoded = CameraClip::decode(&clip.encode().unwrap()).unwrap();
        assert!(decoded.rotation[0].value.w >= 0.0);
        assert!(decoded.rotation[0].value.angle_between(q) < 1e-3);
    }

    #[test]
    fn test_sampling() {
        let clip = camera();
        assert_eq!(clip.location_at(5), Vec3::new(5.0, 0.0, 2.5));
        assert_eq!(clip.location_at(25), Vec3::new(10.0, 0.0, 5.0));
        assert_eq!(clip.rotation_at(19), clip.rotation[0].value);
        assert_eq!(clip.rotation_at(29), clip.rotation[1].value);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            CameraClip::decode(b"XCMB"),
            Err(Error::InvalidMagic { format: "XCMA", .. })
        ));
        let bytes = camera().encode().unwrap();
        assert!(CameraClip::decode(&bytes[..bytes.len() - 4]).unwrap_err().is_format_error());

        let mut unordered = camera();
        unordered.location.swap(0, 1);
        assert!(unordered.encode().is_err());
    }
}
