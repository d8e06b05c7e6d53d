//! Entry routing by file extension.

use tracing::trace;

use crate::imgc::{self, DecodedTexture};
use crate::mbn::BoneRecord;
use crate::minf::{self, SplitAnimationInfo};
use crate::res::ResourceTable;
use crate::util::Result;
use crate::xcma::CameraClip;
use crate::xmtn::Motion;

/// Name of the resource table entry.
pub const RESOURCE_TABLE_NAME: &str = "RES.bin";

/// What an archive entry holds, judged by its name alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Mesh,
    Bone,
    Texture,
    Animation,
    SplitAnimation,
    SplitAnimations,
    Camera,
    ResourceTable,
    Unrecognized,
}

impl EntryKind {
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case(RESOURCE_TABLE_NAME) {
            return EntryKind::ResourceTable;
        }
        let ext = match name.rfind('.') {
            Some(i) => &name[i + 1..],
            None => return EntryKind::Unrecognized,
        };
        const TABLE: [(&str, EntryKind); 8] = [
            ("prm", EntryKind::Mesh),
            ("mbn", EntryKind::Bone),
            ("xi", EntryKind::Texture),
            ("mtn2", EntryKind::Animation),
            ("mtn3", EntryKind::Animation),
            ("mtninf", EntryKind::SplitAnimation),
            ("mtninf2", EntryKind::SplitAnimations),
            ("cmr2", EntryKind::Camera),
        ];
        TABLE
            .iter()
            .find(|(e, _)| e.eq_ignore_ascii_case(ext))
            .map_or(EntryKind::Unrecognized, |&(_, kind)| kind)
    }
}

/// A decoded archive entry.
#[derive(Debug, Clone)]
pub enum Entry {
    Bone(BoneRecord),
    Texture(DecodedTexture),
    Animation(Motion),
    SplitAnimation(SplitAnimationInfo),
    SplitAnimations(Vec<SplitAnimationInfo>),
    Camera(CameraClip),
    ResourceTable(ResourceTable),
    /// Mesh payloads are passed through undecoded.
    Mesh(Vec<u8>),
    Unrecognized(Vec<u8>),
}

impl Entry {
    pub fn kind(&self) -> EntryKind {
        match self {
            Entry::Bone(_) => EntryKind::Bone,
            Entry::Texture(_) => EntryKind::Texture,
            Entry::Animation(_) => EntryKind::Animation,
            Entry::SplitAnimation(_) => EntryKind::SplitAnimation,
            Entry::SplitAnimations(_) => EntryKind::SplitAnimations,
            Entry::Camera(_) => EntryKind::Camera,
            Entry::ResourceTable(_) => EntryKind::ResourceTable,
            Entry::Mesh(_) => EntryKind::Mesh,
            Entry::Unrecognized(_) => EntryKind::Unrecognized,
        }
    }
}

/// Decode one entry with the codec its name selects.
pub fn route_entry(name: &str, data: &[u8]) -> Result<Entry> {
    let kind = EntryKind::from_name(name);
    trace!("routing {name} ({} bytes) as {kind:?}", data.len());
    Ok(match kind {
        EntryKind::Mesh => Entry::Mesh(data.to_vec()),
        EntryKind::Bone => Entry::Bone(BoneRecord::decode(data)?),
        EntryKind::Texture => Entry::Texture(imgc::decode(data)?),
        EntryKind::Animation => Entry::Animation(Motion::decode(data)?),
        EntryKind::SplitAnimation => Entry::SplitAnimation(minf::decode_single(data)?),
        EntryKind::SplitAnimations => Entry::SplitAnimations(minf::decode_batch(data)?),
        EntryKind::Camera => Entry::Camera(CameraClip::decode(data)?),
        EntryKind::ResourceTable => Entry::ResourceTable(ResourceTable::decode(data)?),
        EntryKind::Unrecognized => Entry::Unrecognized(data.to_vec()),
    })
}
