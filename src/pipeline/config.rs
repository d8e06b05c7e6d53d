//! Load and pack options.

use crate::imgc::PixelFormat;
use crate::minf::SplitFraming;
use crate::res::ResourceKind;
use crate::xmtn::Generation;

/// Options for [`load_package`](super::load_package).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Decode entries on the rayon pool.
    pub parallel: bool,
    /// Fail on the first unresolved hash instead of substituting a
    /// placeholder name.
    pub strict_references: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            strict_references: false,
        }
    }
}

impl LoadOptions {
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    pub fn strict() -> Self {
        Self {
            strict_references: true,
            ..Self::default()
        }
    }
}

/// Options for [`build_and_pack`](super::build_and_pack).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackOptions {
    /// Resource table kind written to `RES.bin`.
    pub kind: ResourceKind,
    /// Animation generation for the clip entry.
    pub generation: Generation,
    /// One `.mtninf` per split or a single `.mtninf2`.
    pub split_framing: SplitFraming,
    /// Pixel format for textures that do not specify one.
    pub texture_format: PixelFormat,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            kind: ResourceKind::Character,
            generation: Generation::Mtn3,
            split_framing: SplitFraming::Single,
            texture_format: PixelFormat::Etc1A4,
        }
    }
}
