//! Resource table model, decoder and encoder.

use std::borrow::Cow;
use std::collections::HashMap;

use smallvec::SmallVec;
use tracing::{debug, warn};

use super::format::*;
use super::strings::{StringTable, StringTableBuilder};
use crate::imgc::PixelFormat;
use crate::util::{
    to_u32, ByteReader, ByteWriter, ContentHash, Error, ReferenceKind, Result,
};

/// Texture hashes of one material.
pub type TextureList = SmallVec<[ContentHash; MATERIAL_TEXTURE_SLOTS]>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoneEntry {
    pub hash: ContentHash,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureEntry {
    pub hash: ContentHash,
    pub name: String,
    /// Raw pixel format tag as stored.
    pub format_tag: u8,
    pub has_alpha: bool,
    pub width: u16,
    pub height: u16,
}

impl TextureEntry {
    /// Pixel format, if the tag is one this crate implements.
    pub fn format(&self) -> Result<PixelFormat> {
        PixelFormat::from_tag(self.format_tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialEntry {
    pub hash: ContentHash,
    pub name: String,
    pub textures: TextureList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationEntry {
    pub hash: ContentHash,
    pub name: String,
}

/// Hash-keyed registry of names.
///
/// Records keep their on-disk order (the host pairs texture blobs with
/// texture records by position). Lookups go through per-section maps; when
/// two records share a hash the first one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceTable {
    kind: ResourceKind,
    bones: Vec<BoneEntry>,
    textures: Vec<TextureEntry>,
    materials: Vec<MaterialEntry>,
    animations: Vec<AnimationEntry>,
    bone_index: HashMap<ContentHash, usize>,
    texture_index: HashMap<ContentHash, usize>,
    material_index: HashMap<ContentHash, usize>,
    animation_index: HashMap<ContentHash, usize>,
}

/// Insert into a hash index keeping the first record on collision.
fn index_insert(
    index: &mut HashMap<ContentHash, usize>,
    hash: ContentHash,
    position: usize,
    section: &str,
) {
    if let Some(&existing) = index.get(&hash) {
        warn!(
            "RES {section} hash collision on {hash}: record {position} shadowed by record {existing}"
        );
        return;
    }
    index.insert(hash, position);
}

impl ResourceTable {
    /// Empty table of the given kind.
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn bones(&self) -> &[BoneEntry] {
        &self.bones
    }

    pub fn textures(&self) -> &[TextureEntry] {
        &self.textures
    }

    pub fn materials(&self) -> &[MaterialEntry] {
        &self.materials
    }

    pub fn animations(&self) -> &[AnimationEntry] {
        &self.animations
    }

    pub(crate) fn push_bone(&mut self, entry: BoneEntry) {
        index_insert(&mut self.bone_index, entry.hash, self.bones.len(), "bone");
        self.bones.push(entry);
    }

    pub(crate) fn push_texture(&mut self, entry: TextureEntry) {
        index_insert(&mut self.texture_index, entry.hash, self.textures.len(), "texture");
        self.textures.push(entry);
    }

    pub(crate) fn push_material(&mut self, entry: MaterialEntry) {
        index_insert(&mut self.material_index, entry.hash, self.materials.len(), "material");
        self.materials.push(entry);
    }

    pub(crate) fn push_animation(&mut self, entry: AnimationEntry) {
        index_insert(&mut self.animation_index, entry.hash, self.animations.len(), "animation");
        self.animations.push(entry);
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    pub fn bone_name(&self, hash: ContentHash) -> Option<&str> {
        self.bone_index.get(&hash).map(|&i| self.bones[i].name.as_str())
    }

    pub fn texture(&self, hash: ContentHash) -> Option<&TextureEntry> {
        self.texture_index.get(&hash).map(|&i| &self.textures[i])
    }

    pub fn material(&self, hash: ContentHash) -> Option<&MaterialEntry> {
        self.material_index.get(&hash).map(|&i| &self.materials[i])
    }

    pub fn animation_name(&self, hash: ContentHash) -> Option<&str> {
        self.animation_index
            .get(&hash)
            .map(|&i| self.animations[i].name.as_str())
    }

    /// Bone name or a reference error.
    pub fn resolve_bone(&self, hash: ContentHash) -> Result<&str> {
        self.bone_name(hash).ok_or(Error::UnresolvedReference {
            kind: ReferenceKind::Bone,
            hash,
        })
    }

    /// Texture record or a reference error.
    pub fn resolve_texture(&self, hash: ContentHash) -> Result<&TextureEntry> {
        self.texture(hash).ok_or(Error::UnresolvedReference {
            kind: ReferenceKind::Texture,
            hash,
        })
    }

    /// Animation name or a reference error.
    pub fn resolve_animation(&self, hash: ContentHash) -> Result<&str> {
        self.animation_name(hash).ok_or(Error::UnresolvedReference {
            kind: ReferenceKind::Animation,
            hash,
        })
    }

    /// Bone name, falling back to `bone_{index}`.
    pub fn bone_name_or_placeholder(&self, hash: ContentHash, index: usize) -> Cow<'_, str> {
        match self.bone_name(hash) {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(placeholder_name(ReferenceKind::Bone, index)),
        }
    }

    // ------------------------------------------------------------------
    // Wire format
    // ------------------------------------------------------------------

    /// Decode a table.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(data);
        let magic: [u8; 8] = r.array().map_err(|_| Error::InvalidMagic {
            format: "RES",
            found: data.to_vec(),
        })?;
        let kind = ResourceKind::from_magic(&magic)?;
        let section_count = r.u16()? as usize;
        let _reserved = r.u16()?;
        let strings_offset = r.u32()? as usize;
        if strings_offset < HEADER_SIZE || strings_offset > data.len() {
            return Err(Error::invalid(format!(
                "RES string table offset {strings_offset:#x} outside buffer ({} bytes)",
                data.len()
            )));
        }
        let strings = &data[strings_offset..];

        let mut table = ResourceTable::new(kind);
        let mut seen = Vec::with_capacity(section_count);
        for _ in 0..section_count {
            let section = SectionType::from_tag(r.u16()?)?;
            let record_size = r.u16()? as usize;
            let count = r.u32()? as usize;
            if seen.contains(&section) {
                return Err(Error::invalid(format!("RES section {section:?} appears twice")));
            }
            seen.push(section);
            if record_size != section.record_size() {
                return Err(Error::invalid(format!(
                    "RES section {section:?}: record size {record_size}, expected {}",
                    section.record_size()
                )));
            }
            let section_end = count
                .checked_mul(record_size)
                .and_then(|len| len.checked_add(r.pos()))
                .filter(|&end| end <= strings_offset);
            if section_end.is_none() {
                return Err(Error::UnexpectedEof {
                    offset: r.pos(),
                    needed: count.saturating_mul(record_size),
                    available: strings_offset.saturating_sub(r.pos()),
                });
            }

            for _ in 0..count {
                table.read_record(section, &mut r, strings)?;
            }
        }

        debug!(
            "decoded RES table: {} bones, {} textures, {} materials, {} animations",
            table.bones.len(),
            table.textures.len(),
            table.materials.len(),
            table.animations.len()
        );
        Ok(table)
    }

    fn read_record(&mut self, section: SectionType, r: &mut ByteReader<'_>, strings: &[u8]) -> Result<()> {
        let hash = r.hash()?;
        let name = StringTable::read(strings, r.u32()?)?;
        match section {
            SectionType::Bone => self.push_bone(BoneEntry { hash, name }),
            SectionType::Animation => self.push_animation(AnimationEntry { hash, name }),
            SectionType::Texture => {
                let format_tag = r.u8()?;
                let flags = r.u8()?;
                let _reserved = r.u16()?;
                let width = r.u16()?;
                let height = r.u16()?;
                self.push_texture(TextureEntry {
                    hash,
                    name,
                    format_tag,
                    has_alpha: flags & 1 != 0,
                    width,
                    height,
                });
            }
            SectionType::MaterialData => {
                let count = r.u16()? as usize;
                let _reserved = r.u16()?;
                if count > MATERIAL_TEXTURE_SLOTS {
                    return Err(Error::invalid(format!(
                        "material {name}: {count} textures exceeds {MATERIAL_TEXTURE_SLOTS} slots"
                    )));
                }
                let mut textures = TextureList::new();
                for slot in 0..MATERIAL_TEXTURE_SLOTS {
                    let texture = r.hash()?;
                    if slot < count {
                        textures.push(texture);
                    }
                }
                self.push_material(MaterialEntry { hash, name, textures });
            }
        }
        Ok(())
    }

    /// Number of records in a section.
    pub fn record_count(&self, section: SectionType) -> usize {
        match section {
            SectionType::Bone => self.bones.len(),
            SectionType::Texture => self.textures.len(),
            SectionType::MaterialData => self.materials.len(),
            SectionType::Animation => self.animations.len(),
        }
    }

    /// Collect the string table this table encodes with.
    ///
    /// Names are interned section by section in record order, which is the
    /// same order [`ResourceTableBuilder`](super::ResourceTableBuilder) uses.
    pub fn string_table(&self) -> Result<StringTable> {
        let mut strings = StringTableBuilder::new();
        for bone in &self.bones {
            strings.intern(&bone.name)?;
        }
        for texture in &self.textures {
            strings.intern(&texture.name)?;
        }
        for material in &self.materials {
            strings.intern(&material.name)?;
        }
        for animation in &self.animations {
            strings.intern(&animation.name)?;
        }
        Ok(strings.finish())
    }

    /// Encode the table with its own string table.
    pub fn encode(&self) -> Result<Vec<u8>> {
        self.encode_with(&self.string_table()?)
    }

    /// Encode the table with a string table from
    /// [`ResourceTableBuilder::build`](super::ResourceTableBuilder::build).
    ///
    /// Every record name must be present in `strings`.
    pub fn encode_with(&self, strings: &StringTable) -> Result<Vec<u8>> {
        let offset = |name: &str| -> Result<u32> {
            strings
                .offset_of(name)
                .ok_or_else(|| Error::invalid(format!("name {name:?} missing from string table")))
        };

        let sections: Vec<(SectionType, usize)> = SectionType::ALL
            .into_iter()
            .map(|section| (section, self.record_count(section)))
            .filter(|&(_, count)| count > 0)
            .collect();

        let mut w = ByteWriter::new();
        w.bytes(self.kind.magic());
        w.u16(sections.len() as u16);
        w.u16(0);
        let strings_offset_pos = w.pos();
        w.u32(0);

        for (section, count) in sections {
            w.u16(section.tag());
            w.u16(section.record_size() as u16);
            w.u32(to_u32(count, "record count")?);

            match section {
                SectionType::Bone => {
                    for bone in &self.bones {
                        w.hash(bone.hash);
                        w.u32(offset(&bone.name)?);
                    }
                }
                SectionType::Texture => {
                    for texture in &self.textures {
                        w.hash(texture.hash);
                        w.u32(offset(&texture.name)?);
                        w.u8(texture.format_tag);
                        w.u8(u8::from(texture.has_alpha));
                        w.u16(0);
                        w.u16(texture.width);
                        w.u16(texture.height);
                    }
                }
                SectionType::MaterialData => {
                    for material in &self.materials {
                        if material.textures.len() > MATERIAL_TEXTURE_SLOTS {
                            return Err(Error::invalid(format!(
                                "material {}: {} textures exceeds {MATERIAL_TEXTURE_SLOTS} slots",
                                material.name,
                                material.textures.len()
                            )));
                        }
                        w.hash(material.hash);
                        w.u32(offset(&material.name)?);
                        w.u16(material.textures.len() as u16);
                        w.u16(0);
                        for slot in 0..MATERIAL_TEXTURE_SLOTS {
                            w.hash(material.textures.get(slot).copied().unwrap_or_default());
                        }
                    }
                }
                SectionType::Animation => {
                    for animation in &self.animations {
                        w.hash(animation.hash);
                        w.u32(offset(&animation.name)?);
                    }
                }
            }
        }

        let strings_offset = to_u32(w.pos(), "string table offset")?;
        w.patch_u32(strings_offset_pos, strings_offset);
        w.bytes(strings.as_bytes());

        debug!("encoded RES table: {} bytes, {} strings", w.pos(), strings.len());
        Ok(w.into_inner())
    }
}

/// Synthetic display name used when a hash does not resolve.
pub fn placeholder_name(kind: ReferenceKind, index: usize) -> String {
    format!("{kind}_{index}")
}
