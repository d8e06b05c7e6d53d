//! Generation 2 tracks: `u32 bone index`, then per frame
//! `location f32×3, rotation f32×4, scale f32×3`.

use super::{AnimationClip, BoneTrack, Header, Key};
use crate::util::{ByteReader, ByteWriter, Error, Result};

const SAMPLE_SIZE: usize = 40;

pub(super) fn read_tracks(r: &mut ByteReader<'_>, header: Header) -> Result<AnimationClip> {
    let Header { mut clip, track_count } = header;
    let track_size = (clip.frame_count as usize)
        .checked_mul(SAMPLE_SIZE)
        .and_then(|n| n.checked_add(4))
        .ok_or_else(|| Error::invalid(format!("MTN2 frame count {} too large", clip.frame_count)))?;
    if track_count.saturating_mul(track_size) > r.remaining() {
        return Err(Error::UnexpectedEof {
            offset: r.pos(),
            needed: track_count.saturating_mul(track_size),
            available: r.remaining(),
        });
    }

    clip.tracks.reserve(track_count);
    for _ in 0..track_count {
        let mut track = BoneTrack::new(r.u32()? as usize);
        let frames = clip.frame_count as usize;
        track.location.reserve(frames);
        track.rotation.reserve(frames);
        track.scale.reserve(frames);
        for frame in 0..clip.frame_count {
            track.location.push(Key::linear(frame, r.vec3()?));
            track.rotation.push(Key::linear(frame, r.quat()?));
            track.scale.push(Key::linear(frame, r.vec3()?));
        }
        clip.tracks.push(track);
    }
    Ok(clip)
}

/// Bake every bone, tracked or not, in bone order.
pub(super) fn write_tracks(w: &mut ByteWriter, clip: &AnimationClip) {
    let identity = BoneTrack::default();
    for bone in 0..clip.bones.len() {
        let track = clip.tracks.iter().find(|t| t.bone == bone).unwrap_or(&identity);
        w.u32(bone as u32);
        for frame in 0..clip.frame_count {
            let sample = track.sample(frame);
            w.vec3(sample.translation);
            w.quat(sample.rotation);
            w.vec3(sample.scale);
        }
    }
}
