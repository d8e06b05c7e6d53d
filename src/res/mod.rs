//! RES resource table.
//!
//! The resource table (`RES.bin`) is the name registry of an archive. Bone,
//! texture, animation and split blobs carry only [`ContentHash`] keys; this
//! table maps those keys back to display names and records which textures
//! each material uses.
//!
//! ## Layout
//!
//! ```text
//! +---------------------------+
//! | Kind magic                |  8 bytes ("CHRC00\0\0", "CHRN01\0\0")
//! | Section count             |  u16
//! | Reserved                  |  u16
//! | String table offset       |  u32
//! +---------------------------+
//! | Sections                  |  u16 tag, u16 record size, u32 count, records
//! +---------------------------+
//! | String table              |  NUL-terminated, deduplicated names
//! +---------------------------+
//! ```

mod build;
mod format;
mod strings;
mod table;

pub use build::*;
pub use format::*;
pub use strings::*;
pub use table::*;

#[cfg(test)]
mod tests;
