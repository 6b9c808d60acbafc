//! The in-memory object tree: groups, datasets, soft links and attributes.

use std::collections::BTreeMap;

use crate::datatype::Datatype;
use crate::storage::Layout;

/// A small named value attached to a group or dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub datatype: Datatype,
    pub shape: Vec<u64>,
    /// Packed little-endian elements, or the UTF-8 bytes of a
    /// variable-length string.
    pub data: Vec<u8>,
}

impl Attribute {
    pub fn string(value: &str) -> Self {
        Self {
            datatype: Datatype::variable_string(),
            shape: Vec::new(),
            data: value.as_bytes().to_vec(),
        }
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }
}

/// Attribute table of an object, ordered by name.
pub type Attributes = BTreeMap<String, Attribute>;

/// A container of named links.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupNode {
    pub(crate) links: BTreeMap<String, Link>,
    pub(crate) attributes: Attributes,
}

impl GroupNode {
    pub fn links(&self) -> impl Iterator<Item = (&str, &Link)> {
        self.links.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

/// A typed n-dimensional array of elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetNode {
    pub datatype: Datatype,
    pub shape: Vec<u64>,
    pub layout: Layout,
    pub(crate) attributes: Attributes,
}

impl DatasetNode {
    pub fn new(datatype: Datatype, shape: Vec<u64>, layout: Layout) -> Self {
        Self {
            datatype,
            shape,
            layout,
            attributes: Attributes::new(),
        }
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn num_elements(&self) -> u64 {
        self.shape.iter().product()
    }
}

/// What a name inside a group refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Link {
    Group(GroupNode),
    Dataset(DatasetNode),
    /// Path to another object, absolute if it starts with `/`, otherwise
    /// relative to the group holding the link.
    Soft(String),
}

/// Kind of object a key resolves to after following soft links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Group,
    Dataset,
    None,
}
