//! Path-addressed operations on the object tree.
//!
//! Objects are addressed by a base group path plus a key. Keys may contain
//! `/` to reach into nested groups; a leading `/` makes the key absolute.
//! Every resolved path returned here is canonical: it names only real
//! groups and datasets, with soft links already followed.

use crate::error::FormatError;
use crate::node::{Attributes, DatasetNode, GroupNode, Link, ObjectKind};

/// Soft links nested deeper than this are treated as a cycle.
const MAX_SOFT_LINK_DEPTH: usize = 32;

/// Render a canonical path for diagnostics.
pub fn display_path(path: &[String]) -> String {
    format!("/{}", path.join("/"))
}

fn child_path(path: &[String], name: &str) -> String {
    if path.is_empty() {
        format!("/{name}")
    } else {
        format!("{}/{name}", display_path(path))
    }
}

fn split_key<'k>(base: &[String], key: &'k str) -> (Vec<String>, Vec<&'k str>) {
    let start = if key.starts_with('/') {
        Vec::new()
    } else {
        base.to_vec()
    };
    (start, key.split('/').filter(|c| !c.is_empty()).collect())
}

/// A tree of groups and datasets rooted at an anonymous group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Container {
    pub(crate) root: GroupNode,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> &GroupNode {
        &self.root
    }

    /// Resolve `key` relative to the group at `base`, following soft links.
    pub fn resolve(&self, base: &[String], key: &str) -> Result<Vec<String>, FormatError> {
        self.resolve_depth(base, key, 0)
    }

    fn resolve_depth(
        &self,
        base: &[String],
        key: &str,
        depth: usize,
    ) -> Result<Vec<String>, FormatError> {
        let (mut path, comps) = split_key(base, key);
        if depth > MAX_SOFT_LINK_DEPTH {
            return Err(FormatError::DanglingLink(display_path(&path)));
        }
        for comp in comps {
            let group = self.group(&path)?;
            match group.links.get(comp) {
                None => return Err(FormatError::NotFound(child_path(&path, comp))),
                Some(Link::Soft(target)) => {
                    path = self
                        .resolve_depth(&path, target, depth + 1)
                        .map_err(|e| match e {
                            FormatError::NotFound(_) => {
                                FormatError::DanglingLink(child_path(&path, comp))
                            }
                            e => e,
                        })?;
                }
                Some(_) => path.push(comp.to_string()),
            }
        }
        Ok(path)
    }

    /// Resolve all but the last component of `key`; return the parent group
    /// path and the final name.
    fn split_parent(&self, base: &[String], key: &str) -> Result<(Vec<String>, String), FormatError> {
        let (start, mut comps) = split_key(base, key);
        let name = comps
            .pop()
            .ok_or_else(|| FormatError::InvalidName(key.to_string()))?;
        let mut parent = start;
        for comp in comps {
            parent = self.resolve(&parent, comp)?;
        }
        self.group(&parent)?;
        Ok((parent, name.to_string()))
    }

    /// Kind of the object `key` names, following soft links.
    pub fn kind(&self, base: &[String], key: &str) -> ObjectKind {
        match self.resolve(base, key) {
            Ok(path) => self.kind_at(&path),
            Err(_) => ObjectKind::None,
        }
    }

    fn kind_at(&self, path: &[String]) -> ObjectKind {
        let Some((last, parent)) = path.split_last() else {
            return ObjectKind::Group;
        };
        match self.group(parent).ok().and_then(|g| g.links.get(last)) {
            Some(Link::Group(_)) => ObjectKind::Group,
            Some(Link::Dataset(_)) => ObjectKind::Dataset,
            _ => ObjectKind::None,
        }
    }

    /// True if a link named by `key` exists, even a dangling soft link.
    pub fn link_exists(&self, base: &[String], key: &str) -> bool {
        match self.split_parent(base, key) {
            Ok((parent, name)) => self
                .group(&parent)
                .map(|g| g.links.contains_key(&name))
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    /// The group at a canonical path.
    pub fn group(&self, path: &[String]) -> Result<&GroupNode, FormatError> {
        let mut g = &self.root;
        for (i, comp) in path.iter().enumerate() {
            g = match g.links.get(comp) {
                Some(Link::Group(child)) => child,
                Some(_) => return Err(FormatError::NotAGroup(display_path(&path[..=i]))),
                None => return Err(FormatError::NotFound(display_path(&path[..=i]))),
            };
        }
        Ok(g)
    }

    fn group_mut(&mut self, path: &[String]) -> Result<&mut GroupNode, FormatError> {
        let mut g = &mut self.root;
        for (i, comp) in path.iter().enumerate() {
            g = match g.links.get_mut(comp) {
                Some(Link::Group(child)) => child,
                Some(_) => return Err(FormatError::NotAGroup(display_path(&path[..=i]))),
                None => return Err(FormatError::NotFound(display_path(&path[..=i]))),
            };
        }
        Ok(g)
    }

    /// The dataset at a canonical path.
    pub fn dataset(&self, path: &[String]) -> Result<&DatasetNode, FormatError> {
        let (last, parent) = path
            .split_last()
            .ok_or_else(|| FormatError::NotADataset("/".into()))?;
        match self.group(parent)?.links.get(last) {
            Some(Link::Dataset(d)) => Ok(d),
            Some(_) => Err(FormatError::NotADataset(display_path(path))),
            None => Err(FormatError::NotFound(display_path(path))),
        }
    }

    pub fn dataset_mut(&mut self, path: &[String]) -> Result<&mut DatasetNode, FormatError> {
        let (last, parent) = path
            .split_last()
            .ok_or_else(|| FormatError::NotADataset("/".into()))?;
        match self.group_mut(parent)?.links.get_mut(last) {
            Some(Link::Dataset(d)) => Ok(d),
            Some(_) => Err(FormatError::NotADataset(display_path(path))),
            None => Err(FormatError::NotFound(display_path(path))),
        }
    }

    fn insert_link(&mut self, base: &[String], key: &str, link: Link) -> Result<Vec<String>, FormatError> {
        let (parent, name) = self.split_parent(base, key)?;
        let group = self.group_mut(&parent)?;
        if group.links.contains_key(&name) {
            return Err(FormatError::AlreadyExists(child_path(&parent, &name)));
        }
        group.links.insert(name.clone(), link);
        let mut path = parent;
        path.push(name);
        Ok(path)
    }

    /// Create an empty group. The parent must exist; the name must be free.
    pub fn create_group(&mut self, base: &[String], key: &str) -> Result<Vec<String>, FormatError> {
        self.insert_link(base, key, Link::Group(GroupNode::default()))
    }

    /// Link a new dataset under `key`. The name must be free.
    pub fn create_dataset(
        &mut self,
        base: &[String],
        key: &str,
        node: DatasetNode,
    ) -> Result<Vec<String>, FormatError> {
        self.insert_link(base, key, Link::Dataset(node))
    }

    /// Make `key` an alias of `target`. The target is not required to exist.
    pub fn create_soft_link(
        &mut self,
        base: &[String],
        key: &str,
        target: &str,
    ) -> Result<(), FormatError> {
        self.insert_link(base, key, Link::Soft(target.to_string()))
            .map(|_| ())
    }

    /// Remove the link named by `key`. Returns false if there was none.
    pub fn unlink(&mut self, base: &[String], key: &str) -> Result<bool, FormatError> {
        let (parent, name) = self.split_parent(base, key)?;
        Ok(self.group_mut(&parent)?.links.remove(&name).is_some())
    }

    /// Names of the children of a group, in name order, with their kinds.
    pub fn list(&self, path: &[String]) -> Result<Vec<(String, ObjectKind)>, FormatError> {
        let group = self.group(path)?;
        Ok(group
            .links
            .iter()
            .map(|(name, link)| {
                let kind = match link {
                    Link::Group(_) => ObjectKind::Group,
                    Link::Dataset(_) => ObjectKind::Dataset,
                    Link::Soft(_) => self.kind(path, name),
                };
                (name.clone(), kind)
            })
            .collect())
    }

    /// Attribute table of the group or dataset at a canonical path.
    pub fn attributes(&self, path: &[String]) -> Result<&Attributes, FormatError> {
        let Some((last, parent)) = path.split_last() else {
            return Ok(&self.root.attributes);
        };
        match self.group(parent)?.links.get(last) {
            Some(Link::Group(g)) => Ok(&g.attributes),
            Some(Link::Dataset(d)) => Ok(&d.attributes),
            _ => Err(FormatError::NotFound(display_path(path))),
        }
    }

    pub fn attributes_mut(&mut self, path: &[String]) -> Result<&mut Attributes, FormatError> {
        let Some((last, parent)) = path.split_last() else {
            return Ok(&mut self.root.attributes);
        };
        match self.group_mut(parent)?.links.get_mut(last) {
            Some(Link::Group(g)) => Ok(&mut g.attributes),
            Some(Link::Dataset(d)) => Ok(&mut d.attributes),
            _ => Err(FormatError::NotFound(display_path(path))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::Datatype;
    use crate::storage::Layout;

    fn p(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn scalar_i32() -> DatasetNode {
        DatasetNode::new(Datatype::integer(4, true), vec![], Layout::Contiguous(vec![0; 4]))
    }

    #[test]
    fn nested_keys() {
        let mut c = Container::new();
        c.create_group(&[], "a").unwrap();
        let b = c.create_group(&p(&["a"]), "b").unwrap();
        assert_eq!(b, p(&["a", "b"]));
        c.create_dataset(&[], "a/b/x", scalar_i32()).unwrap();
        assert_eq!(c.kind(&[], "a/b/x"), ObjectKind::Dataset);
        assert_eq!(c.kind(&p(&["a"]), "/a/b"), ObjectKind::Group);
        assert_eq!(c.kind(&[], "a/zz"), ObjectKind::None);
    }

    #[test]
    fn missing_parent() {
        let mut c = Container::new();
        assert!(matches!(
            c.create_group(&[], "no/such"),
            Err(FormatError::NotFound(_))
        ));
    }

    #[test]
    fn duplicate_names() {
        let mut c = Container::new();
        c.create_group(&[], "g").unwrap();
        assert_eq!(
            c.create_dataset(&[], "g", scalar_i32()),
            Err(FormatError::AlreadyExists("/g".into()))
        );
    }

    #[test]
    fn soft_links() {
        let mut c = Container::new();
        c.create_group(&[], "data").unwrap();
        c.create_dataset(&p(&["data"]), "x", scalar_i32()).unwrap();
        c.create_soft_link(&[], "alias", "/data").unwrap();
        c.create_soft_link(&p(&["data"]), "y", "x").unwrap();
        assert_eq!(c.resolve(&[], "alias/x").unwrap(), p(&["data", "x"]));
        assert_eq!(c.resolve(&[], "alias/y").unwrap(), p(&["data", "x"]));

        c.create_soft_link(&[], "broken", "nowhere").unwrap();
        assert!(c.link_exists(&[], "broken"));
        assert_eq!(c.kind(&[], "broken"), ObjectKind::None);

        c.create_soft_link(&[], "loop", "loop").unwrap();
        assert!(matches!(c.resolve(&[], "loop"), Err(FormatError::DanglingLink(_))));
    }

    #[test]
    fn list_and_unlink() {
        let mut c = Container::new();
        c.create_group(&[], "b").unwrap();
        c.create_dataset(&[], "a", scalar_i32()).unwrap();
        assert_eq!(
            c.list(&[]).unwrap(),
            vec![("a".to_string(), ObjectKind::Dataset), ("b".to_string(), ObjectKind::Group)]
        );
        assert!(c.unlink(&[], "a").unwrap());
        assert!(!c.unlink(&[], "a").unwrap());
    }

    #[test]
    fn dataset_path_is_not_a_group() {
        let mut c = Container::new();
        c.create_dataset(&[], "x", scalar_i32()).unwrap();
        assert!(matches!(c.group(&p(&["x"])), Err(FormatError::NotAGroup(_))));
        assert!(matches!(c.dataset(&[]), Err(FormatError::NotADataset(_))));
    }
}
