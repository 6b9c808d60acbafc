//! Error types for the typed API.

use rustyh5_format::FormatError;
use thiserror::Error;

/// Errors raised by typed reads and writes.
///
/// Most variants carry the operation that failed plus the key and the group
/// it was looked up in, so a failed read deep inside a nested structure
/// still names where it happened.
#[derive(Debug, Error)]
pub enum Error {
    /// A key, group, dataset or attribute is absent.
    #[error("{op}: no object {key:?} in {group}")]
    NotFound {
        op: &'static str,
        key: String,
        group: String,
    },
    /// Creating something whose name is taken.
    #[error("{op}: {key:?} already exists in {object}")]
    AlreadyExists {
        op: &'static str,
        key: String,
        object: String,
    },
    /// Stored dimensions differ from the receiving value.
    #[error("{op}: shape mismatch for {key:?} in {group}: expected {expected:?}, stored {found:?}")]
    ShapeMismatch {
        op: &'static str,
        key: String,
        group: String,
        expected: Vec<u64>,
        found: Vec<u64>,
    },
    /// Stored rank differs from the receiving value.
    #[error("{op}: rank mismatch for {key:?} in {group}: expected {expected}, stored {found}")]
    RankMismatch {
        op: &'static str,
        key: String,
        group: String,
        expected: usize,
        found: usize,
    },
    /// Stored element type belongs to a different class than requested.
    #[error("{op}: incompatible element type for {key:?} in {group}: expected {expected}, stored {found}")]
    TypeClassMismatch {
        op: &'static str,
        key: String,
        group: String,
        expected: String,
        found: String,
    },
    /// A group's format tag names a different type.
    #[error("format tag mismatch in {group}: expected {expected:?}, stored {found:?}")]
    FormatMismatch {
        group: String,
        expected: String,
        found: String,
    },
    /// A hyperslab does not fit its dataspace or its buffer.
    #[error("{op}: incompatible selection for {key:?} in {group}: {reason}")]
    IncompatibleSelection {
        op: &'static str,
        key: String,
        group: String,
        reason: String,
    },
    /// Memory strides given for a different rank than the shape.
    #[error("{} strides for a view of rank {}", strides.len(), shape.len())]
    InvalidStrides { shape: Vec<u64>, strides: Vec<u64> },
    /// Writing through a read-only file.
    #[error("{op}: {object} is opened read-only")]
    ReadOnly { op: &'static str, object: String },
    /// Unknown file mode character.
    #[error("invalid file mode {0:?}: expected one of 'r', 'w', 'a', 'e'")]
    InvalidMode(char),
    /// Operation not supported for the stored representation.
    #[error("{0}")]
    Unsupported(String),
    /// Filesystem error while loading or flushing a file.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// Error from the container engine.
    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
