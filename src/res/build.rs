//! Resource table assembly.

use tracing::{debug, warn};

use super::format::{ResourceKind, MATERIAL_TEXTURE_SLOTS};
use super::strings::{StringTable, StringTableBuilder};
use super::table::*;
use crate::imgc::PixelFormat;
use crate::util::{hash_name, Error, Result};

/// Texture as the caller describes it before hashing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDesc {
    pub name: String,
    pub format: PixelFormat,
    pub width: u16,
    pub height: u16,
    pub has_alpha: bool,
}

impl TextureDesc {
    /// Describe a texture; the alpha flag follows the pixel format.
    pub fn new(name: impl Into<String>, format: PixelFormat, width: u16, height: u16) -> Self {
        Self {
            name: name.into(),
            format,
            width,
            height,
            has_alpha: format.has_alpha(),
        }
    }
}

/// Material and the names of the textures it samples, in slot order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialDesc {
    pub name: String,
    pub textures: Vec<String>,
}

impl MaterialDesc {
    pub fn new<I, S>(name: impl Into<String>, textures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            textures: textures.into_iter().map(Into::into).collect(),
        }
    }
}

/// Accumulates entities and interns their names.
///
/// The string table lives inside the builder until [`build`](Self::build)
/// hands out the finished, immutable pair.
#[derive(Debug, Default)]
pub struct ResourceTableBuilder {
    table: ResourceTable,
    strings: StringTableBuilder,
}

impl ResourceTableBuilder {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            table: ResourceTable::new(kind),
            strings: StringTableBuilder::new(),
        }
    }

    /// Intern a record name; empty names would hash to
    /// [`ContentHash::NONE`](crate::util::ContentHash::NONE).
    fn intern(&mut self, section: &str, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::invalid(format!("{section} name is empty")));
        }
        self.strings.intern(name)?;
        Ok(())
    }

    pub fn add_bone(&mut self, name: &str) -> Result<&mut Self> {
        self.intern("bone", name)?;
        self.table.push_bone(BoneEntry {
            hash: hash_name(name),
            name: name.to_string(),
        });
        Ok(self)
    }

    pub fn add_texture(&mut self, desc: &TextureDesc) -> Result<&mut Self> {
        self.intern("texture", &desc.name)?;
        self.table.push_texture(TextureEntry {
            hash: hash_name(&desc.name),
            name: desc.name.clone(),
            format_tag: desc.format.tag(),
            has_alpha: desc.has_alpha,
            width: desc.width,
            height: desc.height,
        });
        Ok(self)
    }

    pub fn add_material(&mut self, desc: &MaterialDesc) -> Result<&mut Self> {
        if desc.textures.len() > MATERIAL_TEXTURE_SLOTS {
            return Err(Error::invalid(format!(
                "material {}: {} textures exceeds {MATERIAL_TEXTURE_SLOTS} slots",
                desc.name,
                desc.textures.len()
            )));
        }
        if desc.textures.iter().any(String::is_empty) {
            return Err(Error::invalid(format!("material {}: empty texture name", desc.name)));
        }
        self.intern("material", &desc.name)?;
        let textures: TextureList = desc.textures.iter().map(|t| hash_name(t)).collect();
        for (name, hash) in desc.textures.iter().zip(&textures) {
            if self.table.texture(*hash).is_none() {
                warn!("material {} samples texture {name:?} not added to the table", desc.name);
            }
        }
        self.table.push_material(MaterialEntry {
            hash: hash_name(&desc.name),
            name: desc.name.clone(),
            textures,
        });
        Ok(self)
    }

    pub fn add_animation(&mut self, name: &str) -> Result<&mut Self> {
        self.intern("animation", name)?;
        self.table.push_animation(AnimationEntry {
            hash: hash_name(name),
            name: name.to_string(),
        });
        Ok(self)
    }

    /// Finish the table.
    pub fn build(self) -> (ResourceTable, StringTable) {
        let strings = self.strings.finish();
        debug!(
            "built RES table: {} bones, {} textures, {} materials, {} animations, {} strings",
            self.table.bones().len(),
            self.table.textures().len(),
            self.table.materials().len(),
            self.table.animations().len(),
            strings.len()
        );
        (self.table, strings)
    }
}

/// Build a character table from the four entity lists.
pub fn build<B, A>(
    bones: B,
    textures: &[TextureDesc],
    materials: &[MaterialDesc],
    animations: A,
) -> Result<(ResourceTable, StringTable)>
where
    B: IntoIterator,
    B::Item: AsRef<str>,
    A: IntoIterator,
    A::Item: AsRef<str>,
{
    let mut builder = ResourceTableBuilder::new(ResourceKind::Character);
    for bone in bones {
        builder.add_bone(bone.as_ref())?;
    }
    for texture in textures {
        builder.add_texture(texture)?;
    }
    for material in materials {
        builder.add_material(material)?;
    }
    for animation in animations {
        builder.add_animation(animation.as_ref())?;
    }
    Ok(builder.build())
}
