//! `Vec<T>` codec.
//!
//! The element type picks the encoding through [`H5Element`]: numeric
//! elements become one compressed dataset, strings a char buffer, anything
//! else a group tagged `List` with one child per index.

use crate::element::H5Element;
use crate::error::{Error, Result};
use crate::format::{write_hdf5_format_as_string, H5Format};
use crate::generic::{H5Construct, H5Read, H5ReadAttribute, H5Write, H5WriteAttribute};
use crate::group::{Group, H5Object};
use crate::string::{from_char_buf, from_char_buf_2d, to_char_buf, to_char_buf_2d, CharBuf};

/// Write `items` as a group tagged with the format of `Vec<T>`, children
/// named `"0"`, `"1"`, ...
pub fn write_list<T: H5Element>(items: &[T], g: &Group, name: &str) -> Result<()> {
    let gr = g.create_group(name, true)?;
    write_hdf5_format_as_string(&gr, &T::seq_format())?;
    for (i, x) in items.iter().enumerate() {
        x.h5_write(&gr, &i.to_string())?;
    }
    Ok(())
}

/// Read the group `name` as a list. The number of elements is the number
/// of children; they must be named `"0"` to `"n-1"`.
pub fn read_list<T: H5Construct>(g: &Group, name: &str) -> Result<Vec<T>> {
    if !g.has_key(name) {
        return Err(Error::NotFound {
            op: "read",
            key: name.to_string(),
            group: g.name(),
        });
    }
    let gr = g.open_group(name)?;
    let n = gr.get_all_subgroup_dataset_names().len();
    (0..n).map(|i| T::h5_construct(&gr, &i.to_string())).collect()
}

impl<T: H5Element> H5Format for Vec<T> {
    fn hdf5_format() -> String {
        T::seq_format()
    }
}

impl<T: H5Element> H5Write for Vec<T> {
    fn h5_write(&self, g: &Group, name: &str) -> Result<()> {
        T::write_seq(self, g, name)
    }
}

impl<T: H5Element> H5Write for [T] {
    fn h5_write(&self, g: &Group, name: &str) -> Result<()> {
        T::write_seq(self, g, name)
    }
}

impl<T: H5Element> H5Read for Vec<T> {
    fn h5_read(&mut self, g: &Group, name: &str) -> Result<()> {
        if !g.has_key(name) {
            return Err(Error::NotFound {
                op: "read",
                key: name.to_string(),
                group: g.name(),
            });
        }
        *self = T::read_seq(g, name)?;
        Ok(())
    }
}

impl<T: H5Element> H5Element for Vec<T> {
    fn write_seq(items: &[Self], g: &Group, name: &str) -> Result<()> {
        T::write_nested(items, g, name)
    }

    fn read_seq(g: &Group, name: &str) -> Result<Vec<Self>> {
        T::read_nested(g, name)
    }
}

impl H5WriteAttribute for Vec<String> {
    fn h5_write_attribute(&self, obj: &dyn H5Object, name: &str) -> Result<()> {
        to_char_buf(self).h5_write_attribute(obj, name)
    }
}

impl H5ReadAttribute for Vec<String> {
    fn h5_read_attribute(&mut self, obj: &dyn H5Object, name: &str) -> Result<()> {
        let mut cb = CharBuf::default();
        cb.h5_read_attribute(obj, name)?;
        *self = from_char_buf(&cb)?;
        Ok(())
    }
}

impl H5WriteAttribute for Vec<Vec<String>> {
    fn h5_write_attribute(&self, obj: &dyn H5Object, name: &str) -> Result<()> {
        to_char_buf_2d(self).h5_write_attribute(obj, name)
    }
}

impl H5ReadAttribute for Vec<Vec<String>> {
    fn h5_read_attribute(&mut self, obj: &dyn H5Object, name: &str) -> Result<()> {
        let mut cb = CharBuf::default();
        cb.h5_read_attribute(obj, name)?;
        *self = from_char_buf_2d(&cb)?;
        Ok(())
    }
}
