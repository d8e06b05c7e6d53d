//! Utility types and functions for the Level-5 codecs.
//!
//! This module contains fundamental types used throughout the library:
//! - [`ContentHash`] / [`hash_name`] - Name hashing
//! - [`Error`] / [`Result`] - Error handling
//! - [`ByteReader`] / [`ByteWriter`] - Bounds-checked binary I/O
//! - Legacy text encoding and math re-exports

mod bytes;
mod error;
mod hash;
mod math;
mod text;

pub use bytes::*;
pub use error::*;
pub use hash::*;
pub use math::*;
pub use text::*;
