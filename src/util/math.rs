//! Math type re-exports and transform helpers.
//!
//! This module re-exports the `glam` types used by the codecs and provides
//! the local TRS transform shared by bone records and animation samples.

pub use glam::{Mat4, Quat, Vec3};

/// Local translation / rotation / scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    #[inline]
    pub const fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Matrix applying scale, then rotation, then translation.
    #[inline]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Flip a quaternion into the hemisphere with `w >= 0`.
///
/// `q` and `-q` are the same rotation; formats that drop `w` rely on this.
#[inline]
pub fn canonical_quat(q: Quat) -> Quat {
    if q.w < 0.0 {
        -q
    } else {
        q
    }
}

/// Rebuild a unit quaternion from its imaginary part, assuming `w >= 0`.
#[inline]
pub fn quat_from_xyz(x: f32, y: f32, z: f32) -> Quat {
    let w = (1.0 - x * x - y * y - z * z).max(0.0).sqrt();
    Quat::from_xyzw(x, y, z, w)
}
