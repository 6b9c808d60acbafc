//! File handles.
//!
//! A [`File`] owns one [`Container`]. Handles are reference counted: cloning
//! a file, or opening groups and datasets inside it, shares the same tree,
//! and the tree is released when the last handle is dropped. Disk-backed
//! files opened for writing are flushed to disk on [`File::flush`] and again
//! when the last handle goes away.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use rustyh5_format::Container;

use crate::error::{Error, Result};
use crate::group::Group;

/// How to open a file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// `'r'`: read-only; the file must exist.
    Read,
    /// `'w'`: create, truncating any existing file.
    Write,
    /// `'a'`: open read-write, creating the file if it does not exist.
    Append,
    /// `'e'`: create; fail if the file already exists.
    Exclusive,
}

impl FileMode {
    pub fn is_writable(self) -> bool {
        !matches!(self, FileMode::Read)
    }
}

impl TryFrom<char> for FileMode {
    type Error = Error;

    fn try_from(c: char) -> Result<Self> {
        match c {
            'r' => Ok(FileMode::Read),
            'w' => Ok(FileMode::Write),
            'a' => Ok(FileMode::Append),
            'e' => Ok(FileMode::Exclusive),
            other => Err(Error::InvalidMode(other)),
        }
    }
}

struct FileInner {
    container: RefCell<Container>,
    path: Option<PathBuf>,
    writable: bool,
}

impl FileInner {
    fn name(&self) -> String {
        match &self.path {
            Some(p) => p.display().to_string(),
            None => "MemoryBuffer".to_string(),
        }
    }

    fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if !self.writable {
            return Ok(());
        }
        let image = self.container.borrow().to_image()?;
        fs::write(path, &image).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;
        log::debug!("flushed {} bytes to {}", image.len(), path.display());
        Ok(())
    }
}

impl Drop for FileInner {
    fn drop(&mut self) {
        if let Err(e) = self.persist() {
            log::error!("failed to flush {} on close: {e}", self.name());
        }
    }
}

/// A handle to an open file, on disk or in memory.
#[derive(Clone)]
pub struct File {
    inner: Rc<FileInner>,
}

impl File {
    /// Open the file at `path` in the given mode.
    pub fn open(path: impl AsRef<Path>, mode: FileMode) -> Result<Self> {
        let path = path.as_ref();
        let io_err = |source| Error::Io {
            path: path.display().to_string(),
            source,
        };
        let container = match mode {
            FileMode::Read => Container::from_image(&fs::read(path).map_err(io_err)?)?,
            FileMode::Write => Container::new(),
            FileMode::Append if path.exists() => {
                Container::from_image(&fs::read(path).map_err(io_err)?)?
            }
            FileMode::Append => Container::new(),
            FileMode::Exclusive => {
                if path.exists() {
                    return Err(Error::AlreadyExists {
                        op: "open",
                        key: path.display().to_string(),
                        object: "the filesystem".to_string(),
                    });
                }
                Container::new()
            }
        };
        log::debug!("opened {} in mode {mode:?}", path.display());
        let file = Self::from_parts(container, Some(path.to_path_buf()), mode.is_writable());
        if mode.is_writable() {
            file.flush()?;
        }
        Ok(file)
    }

    /// Open using the single-character mode names `'r'`, `'w'`, `'a'`, `'e'`.
    pub fn open_with(path: impl AsRef<Path>, mode: char) -> Result<Self> {
        Self::open(path, FileMode::try_from(mode)?)
    }

    /// An empty writable file held entirely in memory.
    pub fn memory() -> Self {
        Self::from_parts(Container::new(), None, true)
    }

    /// A writable in-memory file initialized from an image produced by
    /// [`File::as_buffer`].
    pub fn from_buffer(buf: &[u8]) -> Result<Self> {
        Ok(Self::from_parts(Container::from_image(buf)?, None, true))
    }

    fn from_parts(container: Container, path: Option<PathBuf>, writable: bool) -> Self {
        Self {
            inner: Rc::new(FileInner {
                container: RefCell::new(container),
                path,
                writable,
            }),
        }
    }

    /// The serialized image of the current content.
    pub fn as_buffer(&self) -> Result<Vec<u8>> {
        Ok(self.inner.container.borrow().to_image()?)
    }

    /// The path of a disk-backed file, or `"MemoryBuffer"`.
    pub fn name(&self) -> String {
        self.inner.name()
    }

    pub fn is_writable(&self) -> bool {
        self.inner.writable
    }

    /// Write the current content to disk. A no-op for memory files and
    /// read-only files.
    pub fn flush(&self) -> Result<()> {
        self.inner.persist()
    }

    /// The root group.
    pub fn root(&self) -> Group {
        Group::new(self.clone(), Vec::new())
    }

    /// Number of live handles sharing this file.
    pub fn handle_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }

    pub(crate) fn container(&self) -> Ref<'_, Container> {
        self.inner.container.borrow()
    }

    /// Mutable access for a write operation; fails on read-only files.
    pub(crate) fn container_mut(&self, op: &'static str) -> Result<RefMut<'_, Container>> {
        if !self.inner.writable {
            return Err(Error::ReadOnly {
                op,
                object: self.name(),
            });
        }
        Ok(self.inner.container.borrow_mut())
    }
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("name", &self.name())
            .field("writable", &self.is_writable())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_chars() {
        assert_eq!(FileMode::try_from('a').unwrap(), FileMode::Append);
        assert!(matches!(FileMode::try_from('x'), Err(Error::InvalidMode('x'))));
    }

    #[test]
    fn memory_file_name_and_handles() {
        let f = File::memory();
        assert_eq!(f.name(), "MemoryBuffer");
        let g = f.root();
        assert_eq!(f.handle_count(), 2);
        drop(g);
        assert_eq!(f.handle_count(), 1);
    }

    #[test]
    fn buffer_round_trip() {
        let f = File::memory();
        f.root().create_group("g", true).unwrap();
        let copy = File::from_buffer(&f.as_buffer().unwrap()).unwrap();
        assert!(copy.root().has_subgroup("g"));
    }

    #[test]
    fn read_mode_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = File::open(dir.path().join("missing.rh5"), FileMode::Read).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn exclusive_refuses_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.rh5");
        drop(File::open(&path, FileMode::Write).unwrap());
        assert!(matches!(
            File::open(&path, FileMode::Exclusive),
            Err(Error::AlreadyExists { .. })
        ));
    }

    #[test]
    fn read_only_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ro.rh5");
        drop(File::open(&path, FileMode::Write).unwrap());
        let f = File::open(&path, FileMode::Read).unwrap();
        assert!(matches!(
            f.root().create_group("g", true),
            Err(Error::ReadOnly { .. })
        ));
    }
}
