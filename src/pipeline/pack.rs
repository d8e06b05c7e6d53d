//! Package assembly: encode every entity and pack the archive.

use tracing::{debug, info};

use super::config::PackOptions;
use super::route::RESOURCE_TABLE_NAME;
use crate::imgc::{self, Image, PixelFormat};
use crate::mbn::BoneRecord;
use crate::minf::{self, SplitAnimationInfo, SplitFraming};
use crate::res::{MaterialDesc, ResourceTableBuilder, TextureDesc};
use crate::util::{Error, Result, Transform};
use crate::xmtn::{AnimationClip, Motion};
use crate::xpck::{Archive, ArchiveEntry};

/// A bone as the host describes it.
#[derive(Debug, Clone, PartialEq)]
pub struct BoneSource {
    pub name: String,
    pub parent: Option<String>,
    pub transform: Transform,
}

impl BoneSource {
    pub fn new(name: impl Into<String>, parent: Option<&str>, transform: Transform) -> Self {
        Self {
            name: name.into(),
            parent: parent.map(str::to_string),
            transform,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureSource {
    pub name: String,
    pub image: Image,
    /// Overrides [`PackOptions::texture_format`].
    pub format: Option<PixelFormat>,
}

/// A frame range of the package's animation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitSource {
    pub name: String,
    pub frame_start: u32,
    pub frame_end: u32,
}

/// Named entities to pack.
#[derive(Debug, Clone, Default)]
pub struct PackageSource {
    pub bones: Vec<BoneSource>,
    pub textures: Vec<TextureSource>,
    pub materials: Vec<MaterialDesc>,
    pub animation: Option<AnimationClip>,
    pub splits: Vec<SplitSource>,
    /// Mesh entries, packed as given.
    pub meshes: Vec<ArchiveEntry>,
}

/// Encode every entity into an archive, with `RES.bin` last.
pub fn build_archive(source: &PackageSource, options: &PackOptions) -> Result<Archive> {
    let mut archive = Archive::new();
    let mut table = ResourceTableBuilder::new(options.kind);

    for mesh in &source.meshes {
        archive.push_entry(mesh.clone())?;
    }

    for (i, bone) in source.bones.iter().enumerate() {
        if bone.parent.as_deref() == Some("") {
            return Err(Error::invalid(format!("bone {}: empty parent name", bone.name)));
        }
        let record = BoneRecord::from_named(&bone.name, bone.parent.as_deref(), bone.transform);
        archive.push(format!("{i:03}.mbn"), record.encode())?;
        table.add_bone(&bone.name)?;
    }

    for (i, texture) in source.textures.iter().enumerate() {
        let format = texture.format.unwrap_or(options.texture_format);
        archive.push(format!("{i:03}.xi"), imgc::encode(&texture.image, format)?)?;
        table.add_texture(&TextureDesc::new(
            texture.name.clone(),
            format,
            texture.image.width(),
            texture.image.height(),
        ))?;
    }

    for material in &source.materials {
        table.add_material(material)?;
    }

    if let Some(clip) = &source.animation {
        let motion = Motion::new(options.generation, clip.clone());
        archive.push(format!("000{}", options.generation.extension()), motion.encode()?)?;
        table.add_animation(&clip.name)?;

        let splits = source
            .splits
            .iter()
            .map(|split| -> Result<SplitAnimationInfo> {
                let info = SplitAnimationInfo::new(split.name.clone(), &clip.name, split.frame_start, split.frame_end);
                info.validate_against(clip.frame_count)?;
                Ok(info)
            })
            .collect::<Result<Vec<_>>>()?;
        match options.split_framing {
            SplitFraming::Single => {
                for (i, info) in splits.iter().enumerate() {
                    archive.push(format!("{i:03}.mtninf"), minf::encode_single(info)?)?;
                }
            }
            SplitFraming::Batch if !splits.is_empty() => {
                archive.push("000.mtninf2", minf::encode_batch(&splits)?)?;
            }
            SplitFraming::Batch => {}
        }
        for info in &splits {
            table.add_animation(&info.name)?;
        }
    } else if !source.splits.is_empty() {
        return Err(Error::invalid("split animations need an animation to split"));
    }

    let (table, strings) = table.build();
    debug!("resource table interns {} names", strings.len());
    archive.push(RESOURCE_TABLE_NAME, table.encode_with(&strings)?)?;
    Ok(archive)
}

/// Encode every entity and return the packed archive bytes.
pub fn build_and_pack(source: &PackageSource, options: &PackOptions) -> Result<Vec<u8>> {
    let archive = build_archive(source, options)?;
    let bytes = archive.to_bytes()?;
    info!("packed {} entries ({} bytes)", archive.len(), bytes.len());
    Ok(bytes)
}
