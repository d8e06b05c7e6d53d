//! Archive loading and hash resolution.

use std::fmt;
use std::fs::{self, File};
use std::path::Path;

use memmap2::Mmap;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::config::LoadOptions;
use super::route::{route_entry, Entry};
use crate::imgc::DecodedTexture;
use crate::mbn::{BoneRecord, Skeleton};
use crate::minf::SplitAnimationInfo;
use crate::res::{placeholder_name, ResourceTable};
use crate::util::{ContentHash, Error, ReferenceKind, Result};
use crate::xcma::CameraClip;
use crate::xmtn::Motion;
use crate::xpck::{Archive, ArchiveEntry};

/// Open and decode an archive file.
pub fn open_archive(path: impl AsRef<Path>) -> Result<Archive> {
    open_archive_opts(path, cfg!(feature = "mmap"))
}

/// Open an archive, optionally through a read-only memory map.
pub fn open_archive_opts(path: impl AsRef<Path>, use_mmap: bool) -> Result<Archive> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(path.to_path_buf())
        } else {
            Error::Io(e)
        }
    })?;

    let size = file.metadata()?.len();
    let archive = if use_mmap && size > 0 {
        // Safety: the mapping is read-only and dropped before returning
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::MmapFailed(e.to_string()))?;
        Archive::from_bytes(&mmap)?
    } else {
        Archive::from_bytes(&fs::read(path)?)?
    };
    info!("opened {} ({} entries)", path.display(), archive.len());
    Ok(archive)
}

/// Encode an archive and write it in one call.
pub fn write_archive(path: impl AsRef<Path>, archive: &Archive) -> Result<()> {
    let path = path.as_ref();
    let bytes = archive.to_bytes()?;
    fs::write(path, &bytes)?;
    info!("wrote {} ({} entries, {} bytes)", path.display(), archive.len(), bytes.len());
    Ok(())
}

/// A hash that did not resolve and the name used in its place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceWarning {
    /// Archive entry the reference came from.
    pub entry: String,
    pub kind: ReferenceKind,
    pub hash: ContentHash,
    /// Placeholder substituted for the missing name, if any.
    pub substitute: Option<String>,
}

impl fmt::Display for ReferenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: unresolved {} {}", self.entry, self.kind, self.hash)?;
        if let Some(name) = &self.substitute {
            write!(f, " (using {name})")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NamedTexture {
    pub entry: String,
    pub name: String,
    pub texture: DecodedTexture,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMaterial {
    pub name: String,
    pub textures: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NamedMotion {
    pub entry: String,
    pub motion: Motion,
    /// Names of the clip's bones, in clip order.
    pub bone_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSplit {
    pub info: SplitAnimationInfo,
    /// Name of the parent clip, when it could be found.
    pub parent_name: Option<String>,
}

/// Everything an archive holds, with hashes resolved to names.
#[derive(Debug, Clone, Default)]
pub struct Package {
    pub resources: ResourceTable,
    pub skeleton: Skeleton,
    /// Display name of each skeleton bone.
    pub bone_names: Vec<String>,
    pub textures: Vec<NamedTexture>,
    pub materials: Vec<ResolvedMaterial>,
    pub animations: Vec<NamedMotion>,
    pub splits: Vec<ResolvedSplit>,
    pub cameras: Vec<CameraClip>,
    /// Raw mesh entries.
    pub meshes: Vec<ArchiveEntry>,
    pub unrecognized: Vec<ArchiveEntry>,
    pub warnings: Vec<ReferenceWarning>,
}

impl Package {
    /// Name of a bone's parent, `None` for roots.
    pub fn parent_name(&self, bone: usize) -> Option<&str> {
        self.skeleton
            .parent(bone)
            .map(|parent| self.bone_names[parent].as_str())
    }

    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.bone_names.iter().position(|n| n == name)
    }
}

/// Collects reference failures as warnings, or fails in strict mode.
struct Resolver<'a> {
    table: &'a ResourceTable,
    strict: bool,
    warnings: Vec<ReferenceWarning>,
}

impl Resolver<'_> {
    fn miss(&mut self, entry: &str, kind: ReferenceKind, hash: ContentHash, substitute: Option<String>) -> Result<()> {
        if self.strict {
            return Err(Error::UnresolvedReference { kind, hash });
        }
        let warning = ReferenceWarning {
            entry: entry.to_string(),
            kind,
            hash,
            substitute,
        };
        warn!("{warning}");
        self.warnings.push(warning);
        Ok(())
    }

    fn bone(&mut self, entry: &str, hash: ContentHash, index: usize) -> Result<String> {
        if let Some(name) = self.table.bone_name(hash) {
            return Ok(name.to_string());
        }
        let name = placeholder_name(ReferenceKind::Bone, index);
        self.miss(entry, ReferenceKind::Bone, hash, Some(name.clone()))?;
        Ok(name)
    }

    fn texture(&mut self, entry: &str, hash: ContentHash, index: usize) -> Result<String> {
        if let Some(texture) = self.table.texture(hash) {
            return Ok(texture.name.clone());
        }
        let name = placeholder_name(ReferenceKind::Texture, index);
        self.miss(entry, ReferenceKind::Texture, hash, Some(name.clone()))?;
        Ok(name)
    }
}

fn decode_entry(entry: &ArchiveEntry) -> Result<(&ArchiveEntry, Entry)> {
    route_entry(&entry.name, &entry.data).map(|decoded| (entry, decoded))
}

/// Decode every entry in archive order.
fn decode_entries(archive: &Archive, parallel: bool) -> Result<Vec<(&ArchiveEntry, Entry)>> {
    if parallel {
        archive.entries().par_iter().map(decode_entry).collect()
    } else {
        archive.entries().iter().map(decode_entry).collect()
    }
}

/// Decode an archive and resolve every hash against its `RES.bin`.
pub fn load_package(archive: &Archive, options: &LoadOptions) -> Result<Package> {
    let decoded = decode_entries(archive, options.parallel)?;

    let mut resources: Option<ResourceTable> = None;
    let mut bones: Vec<(&ArchiveEntry, BoneRecord)> = Vec::new();
    let mut textures = Vec::new();
    let mut motions = Vec::new();
    let mut splits: Vec<SplitAnimationInfo> = Vec::new();
    let mut package = Package::default();

    for (entry, value) in decoded {
        match value {
            Entry::ResourceTable(table) => {
                if resources.replace(table).is_some() {
                    return Err(Error::invalid(format!(
                        "archive holds more than one resource table ({})",
                        entry.name
                    )));
                }
            }
            Entry::Bone(record) => bones.push((entry, record)),
            Entry::Texture(texture) => textures.push((entry, texture)),
            Entry::Animation(motion) => motions.push((entry, motion)),
            Entry::SplitAnimation(info) => splits.push(info),
            Entry::SplitAnimations(batch) => splits.extend(batch),
            Entry::Camera(camera) => package.cameras.push(camera),
            Entry::Mesh(_) => package.meshes.push(entry.clone()),
            Entry::Unrecognized(_) => package.unrecognized.push(entry.clone()),
        }
    }

    let table = match resources {
        Some(table) => table,
        None => {
            warn!("archive has no {}; names fall back to placeholders", super::RESOURCE_TABLE_NAME);
            ResourceTable::default()
        }
    };
    let mut resolver = Resolver {
        table: &table,
        strict: options.strict_references,
        warnings: Vec::new(),
    };

    // Bones
    for (i, (entry, record)) in bones.iter().enumerate() {
        let name = resolver.bone(&entry.name, record.hash, i)?;
        package.bone_names.push(name);
    }
    package.skeleton = Skeleton::new(bones.into_iter().map(|(_, record)| record).collect())?;
    for &i in package.skeleton.unresolved_parents() {
        let record = &package.skeleton.bones()[i];
        resolver.miss(&package.bone_names[i], ReferenceKind::Bone, record.parent, None)?;
    }

    // Textures are named by their position in the table's texture section
    for (i, (entry, texture)) in textures.into_iter().enumerate() {
        let name = match table.textures().get(i) {
            Some(record) => record.name.clone(),
            None => {
                let name = placeholder_name(ReferenceKind::Texture, i);
                resolver.miss(&entry.name, ReferenceKind::Texture, ContentHash::NONE, Some(name.clone()))?;
                name
            }
        };
        package.textures.push(NamedTexture {
            entry: entry.name.clone(),
            name,
            texture,
        });
    }

    for material in table.materials() {
        let mut names = Vec::with_capacity(material.textures.len());
        for (slot, &hash) in material.textures.iter().enumerate() {
            names.push(resolver.texture(&material.name, hash, slot)?);
        }
        package.materials.push(ResolvedMaterial {
            name: material.name.clone(),
            textures: names,
        });
    }

    for (entry, motion) in motions {
        let clip = motion.clip();
        let mut bone_names = Vec::with_capacity(clip.bones.len());
        for (i, &hash) in clip.bones.iter().enumerate() {
            bone_names.push(resolver.bone(&entry.name, hash, i)?);
        }
        package.animations.push(NamedMotion {
            entry: entry.name.clone(),
            motion,
            bone_names,
        });
    }

    // Split parents resolve against loaded clips first, then the table
    let clip_names: Vec<String> = package
        .animations
        .iter()
        .map(|m| m.motion.clip().name.clone())
        .chain(table.animations().iter().map(|a| a.name.clone()))
        .collect();
    for info in splits {
        let parent_name = info
            .resolve_parent(clip_names.iter().map(String::as_str))
            .map(str::to_string);
        match &parent_name {
            Some(parent) => {
                let clip = package
                    .animations
                    .iter()
                    .map(|m| m.motion.clip())
                    .find(|c| &c.name == parent);
                if let Some(clip) = clip {
                    if let Err(e) = info.validate_against(clip.frame_count) {
                        warn!("{e}");
                    }
                }
            }
            None => resolver.miss(&info.name, ReferenceKind::Animation, info.parent, None)?,
        }
        package.splits.push(ResolvedSplit { info, parent_name });
    }

    package.warnings = resolver.warnings;
    package.resources = table;
    debug!(
        "loaded package: {} bones, {} textures, {} materials, {} animations, {} splits, {} warnings",
        package.bone_names.len(),
        package.textures.len(),
        package.materials.len(),
        package.animations.len(),
        package.splits.len(),
        package.warnings.len()
    );
    Ok(package)
}
