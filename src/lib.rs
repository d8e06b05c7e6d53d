//! # Level-5
//!
//! Rust implementation of the Level-5 asset archive formats.
//!
//! An archive (`.xc`, XPCK) is a list of named blobs: bones, textures,
//! animations and split metadata that refer to each other only through
//! [`ContentHash`](util::ContentHash) keys, plus a `RES.bin` resource table
//! that maps those keys back to names. Every codec here is a pure function
//! over byte buffers; [`pipeline`] ties them together.
//!
//! ## Modules
//!
//! - [`util`] - Basic types (hashes, errors, byte readers, math)
//! - [`xpck`] - Archive container
//! - [`res`] - Resource table and shared string table
//! - [`mbn`] - Bone records and skeleton
//! - [`imgc`] - Textures (direct and ETC1 block formats)
//! - [`xmtn`] - Keyframe animations, generations 2 and 3
//! - [`minf`] - Split-animation metadata
//! - [`xcma`] - Camera animations
//! - [`pipeline`] - Entry routing, package loading and packing
//!
//! ## Example
//!
//! ```ignore
//! use level5::prelude::*;
//!
//! let archive = open_archive("chara.xc")?;
//! let package = load_package(&archive, &LoadOptions::default())?;
//!
//! for texture in &package.textures {
//!     println!("{} {}x{}", texture.name, texture.texture.image.width(), texture.texture.image.height());
//! }
//! ```

pub mod util;
pub mod xpck;
pub mod res;
pub mod mbn;
pub mod imgc;
pub mod xmtn;
pub mod minf;
pub mod xcma;
pub mod pipeline;

// Re-export commonly used types
pub use util::{hash_name, ContentHash, Error, ErrorKind, Result};
pub use xpck::Archive;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{hash_name, ContentHash, Error, ErrorKind, Result, Transform};
    pub use crate::xpck::{Archive, ArchiveEntry};
    pub use crate::res::{ResourceKind, ResourceTable, ResourceTableBuilder};
    pub use crate::mbn::{BoneRecord, Skeleton};
    pub use crate::imgc::{DecodedTexture, Image, PixelFormat, Rgba};
    pub use crate::xmtn::{AnimationClip, BoneTrack, Generation, Interpolation, Key, Motion};
    pub use crate::minf::{SplitAnimationInfo, SplitFraming};
    pub use crate::xcma::CameraClip;
    pub use crate::pipeline::*;
}
