//! Generic read/write dispatch.
//!
//! A type becomes storable by implementing [`H5Write`] and either
//! [`H5Read`] (read in place, for types with a [`Default`]) or
//! [`H5Construct`] (build a new value). The blanket impl turns every
//! `H5Read + Default` type into an `H5Construct` one, so the free functions
//! [`read`] and [`try_read`] work for both.

use crate::error::Result;
use crate::group::{Group, H5Object};

/// Store a value under a name in a group.
pub trait H5Write {
    fn h5_write(&self, g: &Group, name: &str) -> Result<()>;
}

/// Overwrite a value in place from a name in a group.
pub trait H5Read {
    fn h5_read(&mut self, g: &Group, name: &str) -> Result<()>;
}

/// Build a value from a name in a group.
pub trait H5Construct: Sized {
    fn h5_construct(g: &Group, name: &str) -> Result<Self>;
}

impl<T: H5Read + Default> H5Construct for T {
    fn h5_construct(g: &Group, name: &str) -> Result<Self> {
        let mut x = T::default();
        x.h5_read(g, name)?;
        Ok(x)
    }
}

/// Store a value as an attribute of a group or dataset.
pub trait H5WriteAttribute {
    fn h5_write_attribute(&self, obj: &dyn H5Object, name: &str) -> Result<()>;
}

/// Overwrite a value in place from an attribute.
pub trait H5ReadAttribute {
    fn h5_read_attribute(&mut self, obj: &dyn H5Object, name: &str) -> Result<()>;
}

impl<T: H5Write + ?Sized> H5Write for Box<T> {
    fn h5_write(&self, g: &Group, name: &str) -> Result<()> {
        (**self).h5_write(g, name)
    }
}

impl<T: H5Write + ?Sized> H5Write for &T {
    fn h5_write(&self, g: &Group, name: &str) -> Result<()> {
        (**self).h5_write(g, name)
    }
}

/// Write `x` under `key` in `g`.
pub fn write<T: H5Write + ?Sized>(g: &Group, key: &str, x: &T) -> Result<()> {
    x.h5_write(g, key)
}

/// Read a new value from `key` in `g`.
pub fn read<T: H5Construct>(g: &Group, key: &str) -> Result<T> {
    T::h5_construct(g, key)
}

/// Read `key` in `g` into an existing value.
pub fn read_into<T: H5Read + ?Sized>(g: &Group, key: &str, x: &mut T) -> Result<()> {
    x.h5_read(g, key)
}

/// Read `key` into `x` if the key exists. Returns whether it did.
pub fn try_read<T: H5Construct>(g: &Group, key: &str, x: &mut T) -> Result<bool> {
    if !g.has_key(key) {
        return Ok(false);
    }
    *x = T::h5_construct(g, key)?;
    Ok(true)
}

pub fn write_attribute<T: H5WriteAttribute + ?Sized>(obj: &dyn H5Object, key: &str, x: &T) -> Result<()> {
    x.h5_write_attribute(obj, key)
}

pub fn read_attribute<T: H5ReadAttribute + Default>(obj: &dyn H5Object, key: &str) -> Result<T> {
    let mut x = T::default();
    x.h5_read_attribute(obj, key)?;
    Ok(x)
}

pub fn read_attribute_into<T: H5ReadAttribute + ?Sized>(obj: &dyn H5Object, key: &str, x: &mut T) -> Result<()> {
    x.h5_read_attribute(obj, key)
}

/// Read attribute `name` of the object `key` in `g`.
pub fn read_attribute_from_key<T: H5ReadAttribute + Default>(g: &Group, key: &str, name: &str) -> Result<T> {
    read_attribute(&g.open_object(key)?, name)
}

/// Write attribute `name` of the object `key` in `g`.
pub fn write_attribute_to_key<T: H5WriteAttribute + ?Sized>(
    g: &Group,
    key: &str,
    name: &str,
    x: &T,
) -> Result<()> {
    write_attribute(&g.open_object(key)?, name, x)
}
