//! Generation 3 tracks: `u32 bone index`, then location, rotation and scale
//! channels, each `u32 key count` followed by
//! `u32 frame, u8 interpolation, u8[3] reserved, value`.

use super::{AnimationClip, BoneTrack, Header, Interpolation, Key};
use crate::util::{to_u32, ByteReader, ByteWriter, Quat, Result, Vec3};

const KEY_HEADER_SIZE: usize = 8;

fn read_channel<T>(
    r: &mut ByteReader<'_>,
    value_size: usize,
    mut read_value: impl FnMut(&mut ByteReader<'_>) -> Result<T>,
) -> Result<Vec<Key<T>>> {
    let count = r.count(KEY_HEADER_SIZE + value_size)?;
    let mut keys = Vec::with_capacity(count);
    for _ in 0..count {
        let frame = r.u32()?;
        let interpolation = Interpolation::from_tag(r.u8()?)?;
        r.skip(3)?;
        keys.push(Key::new(frame, read_value(r)?, interpolation));
    }
    Ok(keys)
}

fn write_channel<T: Copy>(
    w: &mut ByteWriter,
    keys: &[Key<T>],
    mut write_value: impl FnMut(&mut ByteWriter, T),
) -> Result<()> {
    w.u32(to_u32(keys.len(), "key count")?);
    for key in keys {
        w.u32(key.frame);
        w.u8(key.interpolation.tag());
        w.zeros(3);
        write_value(w, key.value);
    }
    Ok(())
}

pub(super) fn read_tracks(r: &mut ByteReader<'_>, header: Header) -> Result<AnimationClip> {
    let Header { mut clip, track_count } = header;
    for _ in 0..track_count {
        let mut track = BoneTrack::new(r.u32()? as usize);
        track.location = read_channel(r, 12, |r| r.vec3())?;
        track.rotation = read_channel(r, 16, |r| r.quat())?;
        track.scale = read_channel(r, 12, |r| r.vec3())?;
        clip.tracks.push(track);
    }
    Ok(clip)
}

pub(super) fn write_tracks(w: &mut ByteWriter, clip: &AnimationClip) -> Result<()> {
    for track in &clip.tracks {
        w.u32(to_u32(track.bone, "bone index")?);
        write_channel(w, &track.location, |w, v: Vec3| w.vec3(v))?;
        write_channel(w, &track.rotation, |w, q: Quat| w.quat(q))?;
        write_channel(w, &track.scale, |w, v: Vec3| w.vec3(v))?;
    }
    Ok(())
}
