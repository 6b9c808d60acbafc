//! Group and dataset handles.

use std::fmt;

use rustyh5_format::{
    display_path, Attribute, DatasetCreateProps, DatasetNode, Datatype, Hyperslab, Layout,
    ObjectKind, Selection,
};

use crate::error::{Error, Result};
use crate::file::File;

/// Anything that carries attributes: groups and datasets.
pub trait H5Object {
    fn file(&self) -> &File;

    /// Canonical path from the root, soft links resolved.
    fn path(&self) -> &[String];

    fn object_name(&self) -> String {
        display_path(self.path())
    }

    fn has_attribute(&self, name: &str) -> bool {
        self.file()
            .container()
            .attributes(self.path())
            .map(|a| a.contains_key(name))
            .unwrap_or(false)
    }

    /// Attribute names in name order.
    fn attribute_names(&self) -> Vec<String> {
        self.file()
            .container()
            .attributes(self.path())
            .map(|a| a.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn attribute(&self, name: &str) -> Option<Attribute> {
        self.file()
            .container()
            .attributes(self.path())
            .ok()
            .and_then(|a| a.get(name).cloned())
    }

    /// Attach a new attribute. Fails if one of that name exists.
    fn create_attribute(&self, name: &str, attr: Attribute) -> Result<()> {
        let mut c = self.file().container_mut("create_attribute")?;
        let attrs = c.attributes_mut(self.path())?;
        if attrs.contains_key(name) {
            return Err(Error::AlreadyExists {
                op: "create_attribute",
                key: name.to_string(),
                object: display_path(self.path()),
            });
        }
        attrs.insert(name.to_string(), attr);
        Ok(())
    }

    /// Remove an attribute; returns false if there was none.
    fn delete_attribute(&self, name: &str) -> Result<bool> {
        let mut c = self.file().container_mut("delete_attribute")?;
        Ok(c.attributes_mut(self.path())?.remove(name).is_some())
    }
}

/// A group: a named container of datasets and subgroups.
#[derive(Clone)]
pub struct Group {
    file: File,
    path: Vec<String>,
}

impl Group {
    pub(crate) fn new(file: File, path: Vec<String>) -> Self {
        Self { file, path }
    }

    /// Full path of the group, `/` for the root.
    pub fn name(&self) -> String {
        display_path(&self.path)
    }

    /// True if a link named `key` exists, including dangling soft links.
    pub fn has_key(&self, key: &str) -> bool {
        self.file.container().link_exists(&self.path, key)
    }

    pub fn has_subgroup(&self, key: &str) -> bool {
        self.child_kind(key) == ObjectKind::Group
    }

    pub fn has_dataset(&self, key: &str) -> bool {
        self.child_kind(key) == ObjectKind::Dataset
    }

    /// What `key` resolves to, soft links followed.
    pub fn child_kind(&self, key: &str) -> ObjectKind {
        self.file.container().kind(&self.path, key)
    }

    fn not_found(&self, op: &'static str, key: &str) -> Error {
        Error::NotFound {
            op,
            key: key.to_string(),
            group: self.name(),
        }
    }

    /// Remove the link `key`. Absent keys are an error only if
    /// `error_if_absent`.
    pub fn unlink(&self, key: &str, error_if_absent: bool) -> Result<()> {
        if !self.has_key(key) {
            if error_if_absent {
                return Err(self.not_found("unlink", key));
            }
            return Ok(());
        }
        self.file.container_mut("unlink")?.unlink(&self.path, key)?;
        Ok(())
    }

    /// Open the subgroup `key`; an empty key opens this group again.
    pub fn open_group(&self, key: &str) -> Result<Group> {
        if key.is_empty() {
            return Ok(self.clone());
        }
        if !self.has_key(key) {
            return Err(self.not_found("open_group", key));
        }
        let c = self.file.container();
        let path = c.resolve(&self.path, key)?;
        c.group(&path)?;
        Ok(Group::new(self.file.clone(), path))
    }

    /// Create the subgroup `key`, replacing an existing link of that name
    /// when `delete_if_exists`. An empty key returns this group.
    pub fn create_group(&self, key: &str, delete_if_exists: bool) -> Result<Group> {
        if key.is_empty() {
            return Ok(self.clone());
        }
        let mut c = self.file.container_mut("create_group")?;
        if delete_if_exists {
            c.unlink(&self.path, key)?;
        }
        let path = c.create_group(&self.path, key).map_err(|e| match e {
            rustyh5_format::FormatError::AlreadyExists(_) => Error::AlreadyExists {
                op: "create_group",
                key: key.to_string(),
                object: self.name(),
            },
            e => e.into(),
        })?;
        Ok(Group::new(self.file.clone(), path))
    }

    /// Make `key` a soft link to `target`. Empty keys are ignored. The
    /// target must exist.
    pub fn create_softlink(&self, target: &str, key: &str, delete_if_exists: bool) -> Result<()> {
        if target.is_empty() || key.is_empty() {
            return Ok(());
        }
        if !self.has_key(target) {
            return Err(self.not_found("create_softlink", target));
        }
        if delete_if_exists {
            self.unlink(key, false)?;
        } else if self.has_key(key) {
            return Err(Error::AlreadyExists {
                op: "create_softlink",
                key: key.to_string(),
                object: self.name(),
            });
        }
        let target = if target.starts_with('/') {
            target.to_string()
        } else {
            let c = self.file.container();
            display_path(&c.resolve(&self.path, target)?)
        };
        self.file
            .container_mut("create_softlink")?
            .create_soft_link(&self.path, key, &target)?;
        Ok(())
    }

    pub fn open_dataset(&self, key: &str) -> Result<Dataset> {
        if !self.has_key(key) {
            return Err(self.not_found("open_dataset", key));
        }
        let c = self.file.container();
        let path = c.resolve(&self.path, key)?;
        c.dataset(&path)?;
        Ok(Dataset {
            file: self.file.clone(),
            path,
        })
    }

    /// Create a dataset, replacing any existing link named `key`.
    pub fn create_dataset(
        &self,
        key: &str,
        datatype: Datatype,
        shape: &[u64],
        props: &DatasetCreateProps,
    ) -> Result<Dataset> {
        let layout = Layout::allocate(shape, datatype.size(), props)?;
        self.insert_dataset(key, DatasetNode::new(datatype, shape.to_vec(), layout))
    }

    /// Create a scalar variable-length string dataset.
    pub(crate) fn create_string_dataset(&self, key: &str, value: &str) -> Result<Dataset> {
        let node = DatasetNode::new(
            Datatype::variable_string(),
            Vec::new(),
            Layout::VarString(value.as_bytes().to_vec()),
        );
        self.insert_dataset(key, node)
    }

    fn insert_dataset(&self, key: &str, node: DatasetNode) -> Result<Dataset> {
        let mut c = self.file.container_mut("create_dataset")?;
        c.unlink(&self.path, key)?;
        let path = c.create_dataset(&self.path, key, node)?;
        Ok(Dataset {
            file: self.file.clone(),
            path,
        })
    }

    /// Open whatever `key` names, group or dataset.
    pub fn open_object(&self, key: &str) -> Result<Object> {
        match self.child_kind(key) {
            ObjectKind::Group => Ok(Object::Group(self.open_group(key)?)),
            ObjectKind::Dataset => Ok(Object::Dataset(self.open_dataset(key)?)),
            ObjectKind::None => Err(self.not_found("open_object", key)),
        }
    }

    fn names_of(&self, want: impl Fn(ObjectKind) -> bool) -> Vec<String> {
        self.file
            .container()
            .list(&self.path)
            .map(|children| {
                children
                    .into_iter()
                    .filter(|(_, k)| want(*k))
                    .map(|(n, _)| n)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Names of all subgroups, in name order.
    pub fn get_all_subgroup_names(&self) -> Vec<String> {
        self.names_of(|k| k == ObjectKind::Group)
    }

    /// Names of all datasets, in name order.
    pub fn get_all_dataset_names(&self) -> Vec<String> {
        self.names_of(|k| k == ObjectKind::Dataset)
    }

    /// Names of all subgroups and datasets, in name order.
    pub fn get_all_subgroup_dataset_names(&self) -> Vec<String> {
        self.names_of(|k| k != ObjectKind::None)
    }

    pub fn file(&self) -> &File {
        &self.file
    }
}

impl H5Object for Group {
    fn file(&self) -> &File {
        &self.file
    }

    fn path(&self) -> &[String] {
        &self.path
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Group({}:{})", self.file.name(), self.name())
    }
}

/// A dataset: a typed n-dimensional array.
#[derive(Clone)]
pub struct Dataset {
    file: File,
    path: Vec<String>,
}

impl Dataset {
    pub fn name(&self) -> String {
        display_path(&self.path)
    }

    pub fn shape(&self) -> Result<Vec<u64>> {
        Ok(self.file.container().dataset(&self.path)?.shape.clone())
    }

    pub fn datatype(&self) -> Result<Datatype> {
        Ok(self.file.container().dataset(&self.path)?.datatype.clone())
    }

    /// Bytes held by the dataset's storage, after compression.
    pub fn stored_bytes(&self) -> Result<usize> {
        Ok(self.file.container().dataset(&self.path)?.layout.stored_bytes())
    }

    /// True if the storage is chunked.
    pub fn is_chunked(&self) -> Result<bool> {
        Ok(matches!(
            self.file.container().dataset(&self.path)?.layout,
            Layout::Chunked(_)
        ))
    }

    /// Chunk shape of chunked storage, `None` otherwise.
    pub fn chunk_dims(&self) -> Result<Option<Vec<u64>>> {
        Ok(match &self.file.container().dataset(&self.path)?.layout {
            Layout::Chunked(cs) => Some(cs.chunk_dims.clone()),
            _ => None,
        })
    }

    /// Packed little-endian bytes of the selected elements.
    pub fn read_raw(&self, selection: &Selection) -> Result<Vec<u8>> {
        let c = self.file.container();
        let node = c.dataset(&self.path)?;
        let slab = selection.resolve(&node.shape);
        Ok(node.layout.read(&node.shape, node.datatype.size(), &slab)?)
    }

    /// Store packed little-endian bytes into the selected elements.
    pub fn write_raw(&self, selection: &Selection, data: &[u8]) -> Result<()> {
        let mut c = self.file.container_mut("write")?;
        let node = c.dataset_mut(&self.path)?;
        let slab: Hyperslab = selection.resolve(&node.shape);
        let elem = node.datatype.size();
        node.layout.write(&node.shape, elem, &slab, data)?;
        Ok(())
    }

    /// Payload of a scalar variable-length string dataset.
    pub(crate) fn read_var_string(&self) -> Result<Option<Vec<u8>>> {
        let c = self.file.container();
        match &c.dataset(&self.path)?.layout {
            Layout::VarString(b) => Ok(Some(b.clone())),
            _ => Ok(None),
        }
    }
}

impl H5Object for Dataset {
    fn file(&self) -> &File {
        &self.file
    }

    fn path(&self) -> &[String] {
        &self.path
    }
}

impl fmt::Debug for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dataset({}:{})", self.file.name(), self.name())
    }
}

/// A group or a dataset, for attribute access by key.
#[derive(Debug, Clone)]
pub enum Object {
    Group(Group),
    Dataset(Dataset),
}

impl H5Object for Object {
    fn file(&self) -> &File {
        match self {
            Object::Group(g) => &g.file,
            Object::Dataset(d) => &d.file,
        }
    }

    fn path(&self) -> &[String] {
        match self {
            Object::Group(g) => &g.path,
            Object::Dataset(d) => &d.path,
        }
    }
}
