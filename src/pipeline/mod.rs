//! Collaborator-facing load and save flow.
//!
//! Loading routes every archive entry to its codec by extension, decodes
//! `RES.bin` once and resolves every hash against it. Saving encodes each
//! entity to its blob and assembles the resource table last.
//!
//! # Example
//!
//! ```ignore
//! use level5::pipeline::{load_package, open_archive, LoadOptions};
//!
//! let archive = open_archive("chara.xc")?;
//! let package = load_package(&archive, &LoadOptions::default())?;
//! for (i, name) in package.bone_names.iter().enumerate() {
//!     println!("{name} <- {:?}", package.parent_name(i));
//! }
//! ```

mod config;
mod load;
mod pack;
mod route;

pub use config::*;
pub use load::*;
pub use pack::*;
pub use route::*;
