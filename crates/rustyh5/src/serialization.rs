//! Round-trip any storable value through a byte buffer.
//!
//! The value is written under the key `"object"` of an in-memory file and
//! the buffer is that file's image, so it can also be saved to disk and
//! opened as a regular file.

use crate::error::Result;
use crate::file::File;
use crate::generic::{H5Construct, H5Write};

/// Key the value is stored under.
pub const OBJECT_KEY: &str = "object";

pub fn serialize<T: H5Write + ?Sized>(x: &T) -> Result<Vec<u8>> {
    let f = File::memory();
    x.h5_write(&f.root(), OBJECT_KEY)?;
    f.as_buffer()
}

pub fn deserialize<T: H5Construct>(buf: &[u8]) -> Result<T> {
    let f = File::from_buffer(buf)?;
    T::h5_construct(&f.root(), OBJECT_KEY)
}
