//! Clip model shared by both animation generations.

use std::collections::HashSet;
use std::fmt;

use crate::util::{hash_name, ContentHash, Error, Quat, Result, Transform, Vec3};

/// Interpolation mode of a key, matching the host's keyframe modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Interpolation {
    Constant = 0,
    #[default]
    Linear = 1,
    Bezier = 2,
    Sine = 3,
    Quad = 4,
    Cubic = 5,
    Quart = 6,
    Quint = 7,
    Expo = 8,
    Circ = 9,
    Back = 10,
    Bounce = 11,
    Elastic = 12,
}

impl Interpolation {
    pub const ALL: [Interpolation; 13] = [
        Interpolation::Constant,
        Interpolation::Linear,
        Interpolation::Bezier,
        Interpolation::Sine,
        Interpolation::Quad,
        Interpolation::Cubic,
        Interpolation::Quart,
        Interpolation::Quint,
        Interpolation::Expo,
        Interpolation::Circ,
        Interpolation::Back,
        Interpolation::Bounce,
        Interpolation::Elastic,
    ];

    pub fn from_tag(tag: u8) -> Result<Self> {
        Self::ALL
            .get(tag as usize)
            .copied()
            .ok_or_else(|| Error::unsupported(format!("interpolation tag {tag}")))
    }

    #[inline]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Host name, as used in keyframe UIs.
    pub const fn name(self) -> &'static str {
        match self {
            Interpolation::Constant => "CONSTANT",
            Interpolation::Linear => "LINEAR",
            Interpolation::Bezier => "BEZIER",
            Interpolation::Sine => "SINE",
            Interpolation::Quad => "QUAD",
            Interpolation::Cubic => "CUBIC",
            Interpolation::Quart => "QUART",
            Interpolation::Quint => "QUINT",
            Interpolation::Expo => "EXPO",
            Interpolation::Circ => "CIRC",
            Interpolation::Back => "BACK",
            Interpolation::Bounce => "BOUNCE",
            Interpolation::Elastic => "ELASTIC",
        }
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Keyframe value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Key<T> {
    pub frame: u32,
    pub value: T,
    pub interpolation: Interpolation,
}

impl<T> Key<T> {
    pub fn new(frame: u32, value: T, interpolation: Interpolation) -> Self {
        Self {
            frame,
            value,
            interpolation,
        }
    }

    pub fn linear(frame: u32, value: T) -> Self {
        Self::new(frame, value, Interpolation::Linear)
    }
}

/// Values that can be blended between two keys.
pub trait Sample: Copy {
    fn blend(a: Self, b: Self, t: f32) -> Self;
}

impl Sample for Vec3 {
    #[inline]
    fn blend(a: Self, b: Self, t: f32) -> Self {
        a.lerp(b, t)
    }
}

impl Sample for Quat {
    #[inline]
    fn blend(a: Self, b: Self, t: f32) -> Self {
        a.slerp(b, t)
    }
}

/// Evaluate a channel at `frame`.
///
/// Holds the first value before the first key and the last value after the
/// last one. `Constant` keys step; every other mode blends linearly.
pub fn sample<T: Sample>(keys: &[Key<T>], frame: u32, default: T) -> T {
    let (first, last) = match (keys.first(), keys.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return default,
    };
    if frame <= first.frame {
        return first.value;
    }
    if frame >= last.frame {
        return last.value;
    }
    // First key strictly after `frame`; both neighbors exist here
    let next = keys.partition_point(|k| k.frame <= frame);
    let (k0, k1) = (&keys[next - 1], &keys[next]);
    if k0.interpolation == Interpolation::Constant || k0.frame == frame {
        return k0.value;
    }
    let t = (frame - k0.frame) as f32 / (k1.frame - k0.frame) as f32;
    T::blend(k0.value, k1.value, t)
}

/// Keys of one bone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoneTrack {
    /// Index into [`AnimationClip::bones`].
    pub bone: usize,
    pub location: Vec<Key<Vec3>>,
    pub rotation: Vec<Key<Quat>>,
    pub scale: Vec<Key<Vec3>>,
}

impl BoneTrack {
    pub fn new(bone: usize) -> Self {
        Self {
            bone,
            ..Self::default()
        }
    }

    /// Local transform at `frame`; empty channels give identity values.
    pub fn sample(&self, frame: u32) -> Transform {
        Transform::new(
            sample(&self.location, frame, Vec3::ZERO),
            sample(&self.rotation, frame, Quat::IDENTITY),
            sample(&self.scale, frame, Vec3::ONE),
        )
    }

    pub fn key_count(&self) -> usize {
        self.location.len() + self.rotation.len() + self.scale.len()
    }
}

/// Keyframe animation over a set of bones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub frame_count: u32,
    /// Animated bones, in the order they are stored.
    pub bones: Vec<ContentHash>,
    pub tracks: Vec<BoneTrack>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, frame_count: u32) -> Self {
        Self {
            name: name.into(),
            frame_count,
            ..Self::default()
        }
    }

    #[inline]
    pub fn name_hash(&self) -> ContentHash {
        hash_name(&self.name)
    }

    /// Register a bone and return its index; existing bones are reused.
    pub fn add_bone(&mut self, hash: ContentHash) -> usize {
        match self.bones.iter().position(|&b| b == hash) {
            Some(i) => i,
            None => {
                self.bones.push(hash);
                self.bones.len() - 1
            }
        }
    }

    /// Track of a bone, if it is animated.
    pub fn track_for(&self, hash: ContentHash) -> Option<&BoneTrack> {
        let index = self.bones.iter().position(|&b| b == hash)?;
        self.tracks.iter().find(|t| t.bone == index)
    }

    /// Check the invariants both wire formats rely on.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.bones.len());
        for bone in &self.bones {
            if !seen.insert(*bone) {
                return Err(Error::invalid(format!(
                    "clip {}: bone {bone} listed twice",
                    self.name
                )));
            }
        }

        let mut tracked = vec![false; self.bones.len()];
        for track in &self.tracks {
            match tracked.get_mut(track.bone) {
                None => {
                    return Err(Error::invalid(format!(
                        "clip {}: track bone index {} out of range ({} bones)",
                        self.name,
                        track.bone,
                        self.bones.len()
                    )));
                }
                Some(true) => {
                    return Err(Error::invalid(format!(
                        "clip {}: bone {} tracked twice",
                        self.name, self.bones[track.bone]
                    )));
                }
                Some(flag) => *flag = true,
            }
            self.validate_frames(track.location.iter().map(|k| k.frame))?;
            self.validate_frames(track.rotation.iter().map(|k| k.frame))?;
            self.validate_frames(track.scale.iter().map(|k| k.frame))?;
        }
        Ok(())
    }

    fn validate_frames(&self, frames: impl Iterator<Item = u32>) -> Result<()> {
        let mut previous: Option<u32> = None;
        for frame in frames {
            if frame >= self.frame_count {
                return Err(Error::invalid(format!(
                    "clip {}: key frame {frame} outside [0, {})",
                    self.name, self.frame_count
                )));
            }
            if previous.is_some_and(|p| frame <= p) {
                return Err(Error::invalid(format!(
                    "clip {}: key frames not strictly increasing at {frame}",
                    self.name
                )));
            }
            previous = Some(frame);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolation_tags() {
        for mode in Interpolation::ALL {
            assert_eq!(Interpolation::from_tag(mode.tag()).unwrap(), mode);
        }
        assert_eq!(Interpolation::Elastic.tag(), 12);
        assert!(Interpolation::from_tag(13).is_err());
    }

    #[test]
    fn test_sample_linear_and_hold() {
        let keys = [
            Key::linear(10, Vec3::ZERO),
            Key::linear(20, Vec3::new(10.0, 0.0, 0.0)),
        ];
        assert_eq!(sample(&keys, 0, Vec3::ONE), Vec3::ZERO);
        assert_eq!(sample(&keys, 15, Vec3::ONE), Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(sample(&keys, 99, Vec3::ONE), Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(sample(&[], 5, Vec3::ONE), Vec3::ONE);
    }

    #[test]
    fn test_sample_constant_steps() {
        let keys = [
            Key::new(0, Vec3::ZERO, Interpolation::Constant),
            Key::linear(4, Vec3::ONE),
        ];
        assert_eq!(sample(&keys, 3, Vec3::ZERO), Vec3::ZERO);
        assert_eq!(sample(&keys, 4, Vec3::ZERO), Vec3::ONE);
    }

    #[test]
    fn test_sample_slerp() {
        let keys = [
            Key::linear(0, Quat::IDENTITY),
            Key::linear(2, Quat::from_rotation_y(1.0)),
        ];
        let mid = sample(&keys, 1, Quat::IDENTITY);
        assert!(mid.angle_between(Quat::from_rotation_y(0.5)) < 1e-4);
    }

    #[test]
    fn test_validate() {
        let mut clip = AnimationClip::new("walk", 10);
        let b = clip.add_bone(hash_name("pelvis"));
        assert_eq!(clip.add_bone(hash_name("pelvis")), b);
        let mut track = BoneTrack::new(b);
        track.location.push(Key::linear(0, Vec3::ZERO));
        track.location.push(Key::linear(9, Vec3::ONE));
        clip.tracks.push(track.clone());
        clip.validate().unwrap();

        let mut late = clip.clone();
        late.tracks[0].location.push(Key::linear(10, Vec3::ONE));
        assert!(late.validate().is_err());

        let mut unordered = clip.clone();
        unordered.tracks[0].location.swap(0, 1);
        assert!(unordered.validate().is_err());

        let mut twice = clip.clone();
        twice.tracks.push(track);
        assert!(twice.validate().is_err());

        let mut dangling = clip.clone();
        dangling.tracks[0].bone = 5;
        assert!(dangling.validate().is_err());

        let mut dup = clip;
        dup.bones.push(hash_name("pelvis"));
        assert!(dup.validate().is_err());
    }
}
