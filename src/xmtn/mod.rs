//! XMTN keyframe animations (`.mtn2`, `.mtn3`).
//!
//! Both generations share a header and a bone hash table:
//!
//! ```text
//! 0x00  [u8;4]  magic "MTN2" / "MTN3"
//! 0x04  u32     clip name hash
//! 0x08  u32     frame count
//! 0x0C  u32     bone count
//! 0x10  u32     track count
//! 0x14  u32     name length, then the name padded to 4
//! ....  bone count × u32 bone hash
//! ....  tracks (generation specific)
//! ```
//!
//! Generation 2 stores one dense sample per frame for every bone;
//! generation 3 stores sparse keys with a per-key interpolation tag.

mod mtn2;
mod mtn3;
mod types;

pub use types::*;

use tracing::debug;

use crate::util::{decode_name, encode_name_checked, hash_name, to_u32, ByteReader, ByteWriter, Error, Result};

pub const MTN2_MAGIC: &[u8; 4] = b"MTN2";
pub const MTN3_MAGIC: &[u8; 4] = b"MTN3";

/// Animation generation on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Generation {
    /// Dense per-frame samples (`.mtn2`).
    Mtn2,
    /// Sparse keys (`.mtn3`).
    #[default]
    Mtn3,
}

impl Generation {
    pub const fn magic(self) -> &'static [u8; 4] {
        match self {
            Generation::Mtn2 => MTN2_MAGIC,
            Generation::Mtn3 => MTN3_MAGIC,
        }
    }

    /// Archive entry extension, with the dot.
    pub const fn extension(self) -> &'static str {
        match self {
            Generation::Mtn2 => ".mtn2",
            Generation::Mtn3 => ".mtn3",
        }
    }
}

/// A decoded clip tagged with the generation it was stored as.
#[derive(Debug, Clone, PartialEq)]
pub enum Motion {
    Mtn2(AnimationClip),
    Mtn3(AnimationClip),
}

impl Motion {
    pub fn new(generation: Generation, clip: AnimationClip) -> Self {
        match generation {
            Generation::Mtn2 => Motion::Mtn2(clip),
            Generation::Mtn3 => Motion::Mtn3(clip),
        }
    }

    pub fn generation(&self) -> Generation {
        match self {
            Motion::Mtn2(_) => Generation::Mtn2,
            Motion::Mtn3(_) => Generation::Mtn3,
        }
    }

    pub fn clip(&self) -> &AnimationClip {
        match self {
            Motion::Mtn2(clip) | Motion::Mtn3(clip) => clip,
        }
    }

    pub fn into_clip(self) -> AnimationClip {
        match self {
            Motion::Mtn2(clip) | Motion::Mtn3(clip) => clip,
        }
    }

    /// Decode either generation, picked by magic.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let magic = data.get(..4).unwrap_or(data);
        if magic == MTN2_MAGIC {
            Ok(Motion::Mtn2(decode_mtn2(data)?))
        } else if magic == MTN3_MAGIC {
            Ok(Motion::Mtn3(decode_mtn3(data)?))
        } else {
            Err(Error::InvalidMagic {
                format: "XMTN",
                found: magic.to_vec(),
            })
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        match self {
            Motion::Mtn2(clip) => encode_mtn2(clip),
            Motion::Mtn3(clip) => encode_mtn3(clip),
        }
    }
}

/// Decode a dense generation 2 clip.
pub fn decode_mtn2(data: &[u8]) -> Result<AnimationClip> {
    let mut r = ByteReader::new(data);
    let header = Header::read(&mut r, Generation::Mtn2)?;
    if header.track_count != header.clip.bones.len() {
        return Err(Error::invalid(format!(
            "MTN2 clip {}: {} tracks for {} bones",
            header.clip.name,
            header.track_count,
            header.clip.bones.len()
        )));
    }
    let clip = mtn2::read_tracks(&mut r, header)?;
    clip.validate()?;
    debug!("decoded MTN2 {} ({} frames, {} bones)", clip.name, clip.frame_count, clip.bones.len());
    Ok(clip)
}

/// Decode a sparse generation 3 clip.
pub fn decode_mtn3(data: &[u8]) -> Result<AnimationClip> {
    let mut r = ByteReader::new(data);
    let header = Header::read(&mut r, Generation::Mtn3)?;
    if header.track_count > header.clip.bones.len() {
        return Err(Error::invalid(format!(
            "MTN3 clip {}: {} tracks for {} bones",
            header.clip.name,
            header.track_count,
            header.clip.bones.len()
        )));
    }
    let clip = mtn3::read_tracks(&mut r, header)?;
    clip.validate()?;
    debug!("decoded MTN3 {} ({} frames, {} tracks)", clip.name, clip.frame_count, clip.tracks.len());
    Ok(clip)
}

/// Encode as generation 2, baking every bone to one sample per frame.
pub fn encode_mtn2(clip: &AnimationClip) -> Result<Vec<u8>> {
    clip.validate()?;
    let mut w = ByteWriter::new();
    write_header(&mut w, clip, Generation::Mtn2, clip.bones.len())?;
    mtn2::write_tracks(&mut w, clip);
    debug!("encoded MTN2 {} ({} bytes)", clip.name, w.pos());
    Ok(w.into_inner())
}

/// Encode as generation 3.
pub fn encode_mtn3(clip: &AnimationClip) -> Result<Vec<u8>> {
    clip.validate()?;
    let mut w = ByteWriter::new();
    write_header(&mut w, clip, Generation::Mtn3, clip.tracks.len())?;
    mtn3::write_tracks(&mut w, clip)?;
    debug!("encoded MTN3 {} ({} bytes)", clip.name, w.pos());
    Ok(w.into_inner())
}

/// Header fields plus a clip with name, frame count and bones filled in.
pub(crate) struct Header {
    pub clip: AnimationClip,
    pub track_count: usize,
}

impl Header {
    fn read(r: &mut ByteReader<'_>, generation: Generation) -> Result<Self> {
        r.expect_magic(generation.magic(), "XMTN")?;
        let name_hash = r.hash()?;
        let frame_count = r.u32()?;
        let bone_count = r.u32()? as usize;
        let track_count = r.u32()? as usize;
        let name_len = r.u32()? as usize;
        let name = decode_name(r.bytes(name_len)?);
        r.align(4)?;
        if hash_name(&name) != name_hash {
            return Err(Error::invalid(format!(
                "clip name {name:?} does not match stored hash {name_hash}"
            )));
        }

        if bone_count.saturating_mul(4) > r.remaining() {
            return Err(Error::UnexpectedEof {
                offset: r.pos(),
                needed: bone_count.saturating_mul(4),
                available: r.remaining(),
            });
        }
        let mut clip = AnimationClip::new(name, frame_count);
        clip.bones = (0..bone_count).map(|_| r.hash()).collect::<Result<_>>()?;
        Ok(Self { clip, track_count })
    }
}

fn write_header(w: &mut ByteWriter, clip: &AnimationClip, generation: Generation, track_count: usize) -> Result<()> {
    let name = encode_name_checked(&clip.name)?;
    w.bytes(generation.magic());
    w.hash(clip.name_hash());
    w.u32(clip.frame_count);
    w.u32(to_u32(clip.bones.len(), "bone count")?);
    w.u32(to_u32(track_count, "track count")?);
    w.u32(to_u32(name.len(), "clip name length")?);
    w.bytes(&name);
    w.align(4);
    for &bone in &clip.bones {
        w.hash(bone);
    }
    Ok(())
}

#[cfg(test)]
mod tests;
