//! Error types for the Level-5 codec layer.

use std::path::PathBuf;
use thiserror::Error;

use super::hash::ContentHash;

/// Broad classification of an [`Error`].
///
/// Callers that only need to decide between "the buffer is broken",
/// "the variant is not implemented" and "a name could not be resolved"
/// match on this instead of the individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Structurally invalid buffer.
    Format,
    /// Recognized but unimplemented pixel/animation variant.
    Unsupported,
    /// A hash that cannot be resolved against the resource table.
    Reference,
    /// File system failure.
    Io,
}

/// Kind of entity a hashed reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Bone,
    Texture,
    Material,
    Animation,
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReferenceKind::Bone => "bone",
            ReferenceKind::Texture => "texture",
            ReferenceKind::Material => "material",
            ReferenceKind::Animation => "animation",
        };
        f.write_str(name)
    }
}

/// Main error type for Level-5 codec operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Magic bytes at the start of a blob do not match the expected format
    #[error("Invalid {format} data: bad magic {found:02X?}")]
    InvalidMagic {
        format: &'static str,
        found: Vec<u8>,
    },

    /// Buffer ends before a field or section does
    #[error("Unexpected end of data at offset {offset} (needed {needed} bytes, {available} available)")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Invalid data structure in a blob
    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    /// Two entries share a name where names must be unique
    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    /// Recognized but unimplemented variant tag
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A hash that the resource table does not know about
    #[error("Unresolved {kind} reference {hash}")]
    UnresolvedReference {
        kind: ReferenceKind,
        hash: ContentHash,
    },

    /// Memory mapping failed
    #[error("Memory mapping failed: {0}")]
    MmapFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    /// Create an unsupported format error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidMagic { .. }
            | Error::UnexpectedEof { .. }
            | Error::InvalidStructure(_)
            | Error::DuplicateName(_) => ErrorKind::Format,
            Error::UnsupportedFormat(_) => ErrorKind::Unsupported,
            Error::UnresolvedReference { .. } => ErrorKind::Reference,
            Error::FileNotFound(_) | Error::MmapFailed(_) | Error::Io(_) => ErrorKind::Io,
        }
    }

    /// True for structurally invalid buffers.
    #[inline]
    pub fn is_format_error(&self) -> bool {
        self.kind() == ErrorKind::Format
    }
}

/// Result type alias for Level-5 codec operations.
pub type Result<T> = std::result::Result<T, Error>;
