//! `Option<T>` codec. `None` is the absence of the key.

use crate::error::Result;
use crate::format::H5Format;
use crate::generic::{H5Construct, H5Read, H5Write};
use crate::group::Group;

impl<T: H5Write> H5Write for Option<T> {
    /// Writes the value, or removes `name` for `None` so that a later read
    /// sees the absence.
    fn h5_write(&self, g: &Group, name: &str) -> Result<()> {
        match self {
            Some(x) => x.h5_write(g, name),
            None => g.unlink(name, false),
        }
    }
}

impl<T: H5Construct> H5Read for Option<T> {
    fn h5_read(&mut self, g: &Group, name: &str) -> Result<()> {
        *self = None;
        if g.has_key(name) {
            *self = Some(T::h5_construct(g, name)?);
        }
        Ok(())
    }
}

impl<T: H5Format> H5Format for Option<T> {
    fn hdf5_format() -> String {
        T::hdf5_format()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::File;
    use crate::generic::{read, write};

    #[test]
    fn some_and_none() {
        let root = File::memory().root();
        write(&root, "x", &Some(4i32)).unwrap();
        assert_eq!(read::<Option<i32>>(&root, "x").unwrap(), Some(4));
        write(&root, "x", &None::<i32>).unwrap();
        assert!(!root.has_key("x"));
        assert_eq!(read::<Option<i32>>(&root, "x").unwrap(), None);
    }

    #[test]
    fn wrong_type_still_fails() {
        let root = File::memory().root();
        write(&root, "s", "text").unwrap();
        assert!(read::<Option<f64>>(&root, "s").is_err());
    }

    #[test]
    fn format_of_inner() {
        assert_eq!(crate::format::get_hdf5_format::<Option<f64>>(), "double");
    }
}
