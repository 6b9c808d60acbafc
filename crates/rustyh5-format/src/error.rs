//! Error types for the container engine.

use thiserror::Error;

/// Errors raised while manipulating or (de)serializing a container.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// The image does not start with the container signature.
    #[error("container signature not found")]
    SignatureNotFound,
    /// The image was written by an incompatible version of the codec.
    #[error("unsupported container image version: {0}")]
    UnsupportedVersion(u8),
    /// The image ended before a record was complete.
    #[error("unexpected end of image: need {expected} bytes, have {available}")]
    UnexpectedEof { expected: usize, available: usize },
    /// The trailing image checksum does not match its content.
    #[error("checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },
    /// Unknown datatype class byte in an image.
    #[error("invalid datatype class: {0}")]
    InvalidDatatype(u8),
    /// Unknown link record tag in an image.
    #[error("invalid link tag: {0}")]
    InvalidLink(u8),
    /// Unknown storage layout tag in an image.
    #[error("invalid storage layout tag: {0}")]
    InvalidLayout(u8),
    /// An object or attribute name is empty or contains a path separator.
    #[error("invalid name: {0:?}")]
    InvalidName(String),
    /// A name, rank or count is too large for its field in the image.
    #[error("{what} {len} exceeds the image limit of {max}")]
    LimitExceeded {
        what: &'static str,
        len: usize,
        max: u64,
    },
    /// No link exists at the given path.
    #[error("{0} does not exist")]
    NotFound(String),
    /// A link or attribute with this name already exists.
    #[error("{0} already exists")]
    AlreadyExists(String),
    /// The path resolves to something other than a group.
    #[error("{0} is not a group")]
    NotAGroup(String),
    /// The path resolves to something other than a dataset.
    #[error("{0} is not a dataset")]
    NotADataset(String),
    /// A soft link points nowhere, or soft links form a cycle.
    #[error("cannot resolve soft link at {0}")]
    DanglingLink(String),
    /// Inconsistent hyperslab vectors.
    #[error("invalid selection: {0}")]
    InvalidSelection(String),
    /// A selection reaches past the extent of the dataspace.
    #[error("selection out of bounds: {0}")]
    SelectionOutOfBounds(String),
    /// A buffer does not hold the number of bytes a selection needs.
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },
    /// Chunk dimensions that do not fit the dataset.
    #[error("invalid chunk dimensions {chunk:?} for dataset shape {shape:?}")]
    InvalidChunkDims { chunk: Vec<u64>, shape: Vec<u64> },
    /// Filter id not known to this build.
    #[error("unsupported filter id {0}")]
    UnsupportedFilter(u16),
    /// A filter failed on malformed data.
    #[error("filter error: {0}")]
    FilterError(String),
    #[error("compression failed: {0}")]
    CompressionError(String),
    #[error("decompression failed: {0}")]
    DecompressionError(String),
    /// No conversion path exists between the two datatypes.
    #[error("cannot convert {from} to {to}")]
    UnsupportedConversion { from: String, to: String },
}
