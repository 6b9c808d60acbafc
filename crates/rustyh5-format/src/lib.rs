//! Container engine for rustyh5.
//!
//! A container is an in-memory tree of groups and typed n-dimensional
//! datasets, each carrying named attributes. Datasets are read and written
//! through hyperslab selections, stored contiguously or in filtered chunks,
//! and the whole tree serializes to a checksummed little-endian image.
//!
//! # Modules
//!
//! - [`datatype`]: element datatypes and their classes
//! - [`convert`]: element conversion and byte-order fix-ups
//! - [`selection`]: hyperslab selections
//! - [`storage`]: contiguous and chunked element storage
//! - [`filters`]: shuffle and deflate chunk filters
//! - [`property_list`]: dataset creation properties
//! - [`node`]: groups, datasets, links and attributes
//! - [`container`]: path-addressed tree operations
//! - [`image`]: the serialized container image

pub mod checksum;
pub mod codec;
pub mod container;
pub mod convert;
pub mod datatype;
pub mod error;
pub mod filters;
pub mod image;
pub mod node;
pub mod property_list;
pub mod selection;
pub mod storage;

pub use container::{display_path, Container};
pub use datatype::{CompoundMember, Datatype, StringSize, TypeClass};
pub use error::FormatError;
pub use node::{Attribute, Attributes, DatasetNode, GroupNode, Link, ObjectKind};
pub use property_list::DatasetCreateProps;
pub use selection::{Hyperslab, Selection};
pub use storage::Layout;
