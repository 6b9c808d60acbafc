//! Format tags: the `Format` string attribute naming the type stored in a
//! group.
//!
//! Files written by older versions carry the tag as
//! `TRIQS_HDF5_data_scheme`; reads fall back to it when `Format` is absent.

use crate::error::{Error, Result};
use crate::group::{Group, H5Object};
use crate::string::read_string_attribute;

/// Name of the format tag attribute.
pub const FORMAT_ATTRIBUTE: &str = "Format";

/// Legacy name of the format tag attribute.
pub const LEGACY_FORMAT_ATTRIBUTE: &str = "TRIQS_HDF5_data_scheme";

/// A type with a format tag.
pub trait H5Format {
    fn hdf5_format() -> String;
}

/// The format tag of `T`.
pub fn get_hdf5_format<T: H5Format + ?Sized>() -> String {
    T::hdf5_format()
}

/// Tag `obj` with `tag`. Fails if the object is already tagged.
pub fn write_hdf5_format_as_string(obj: &dyn H5Object, tag: &str) -> Result<()> {
    crate::string::write_string_attribute(obj, FORMAT_ATTRIBUTE, tag)
}

/// Tag `obj` with the format tag of `T`.
pub fn write_hdf5_format<T: H5Format + ?Sized>(obj: &dyn H5Object, _x: &T) -> Result<()> {
    write_hdf5_format_as_string(obj, &T::hdf5_format())
}

/// The format tag of `obj`, or an empty string if it has none.
pub fn read_hdf5_format(obj: &dyn H5Object) -> Result<String> {
    let tag = read_string_attribute(obj, FORMAT_ATTRIBUTE)?;
    if tag.is_empty() {
        return read_string_attribute(obj, LEGACY_FORMAT_ATTRIBUTE);
    }
    Ok(tag)
}

/// The format tag of the object `key` in `g`.
pub fn read_hdf5_format_from_key(g: &Group, key: &str) -> Result<String> {
    read_hdf5_format(&g.open_object(key)?)
}

/// Fail with [`Error::FormatMismatch`] unless `g` is tagged `expected`.
/// With `ignore_if_absent`, an untagged group passes.
pub fn assert_hdf5_format_as_string(g: &Group, expected: &str, ignore_if_absent: bool) -> Result<()> {
    let tag = read_hdf5_format(g)?;
    if ignore_if_absent && tag.is_empty() {
        return Ok(());
    }
    if tag != expected {
        return Err(Error::FormatMismatch {
            group: g.name(),
            expected: expected.to_string(),
            found: tag,
        });
    }
    Ok(())
}

/// [`assert_hdf5_format_as_string`] with the tag of `T`.
pub fn assert_hdf5_format<T: H5Format + ?Sized>(g: &Group, ignore_if_absent: bool) -> Result<()> {
    assert_hdf5_format_as_string(g, &T::hdf5_format(), ignore_if_absent)
}
