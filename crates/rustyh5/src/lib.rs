//! Typed storage of Rust values in hierarchical containers of
//! n-dimensional arrays.
//!
//! Values are written into and read back from named children of a
//! [`Group`]. The codec is picked from the static type of the value:
//! numbers become scalar datasets, vectors of numbers compressed 1-D
//! datasets, strings variable-length strings, and structured values
//! (maps, tuples, derived records) subgroups tagged with a `Format`
//! attribute that is checked on the way back.
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use rustyh5::{read, write, File, FileMode};
//!
//! let file = File::open("run.h5", FileMode::Write).unwrap();
//! let root = file.root();
//! write(&root, "beta", &10.0f64).unwrap();
//! write(&root, "mesh", &vec![0.0f64, 0.5, 1.0]).unwrap();
//! let mut params = BTreeMap::new();
//! params.insert("n_iter".to_string(), 100i64);
//! write(&root, "params", &params).unwrap();
//!
//! let beta: f64 = read(&root, "beta").unwrap();
//! # let _ = beta;
//! ```
//!
//! User types take part by implementing [`H5Write`] and either [`H5Read`]
//! or [`H5Construct`], or with `#[derive(H5Group)]` for structs and
//! `#[derive(H5Variant)]` for enums of leaf types.
//!
//! Strided arrays and partial reads and writes go through the
//! [`array_interface`] module directly.

// Lets the derive macros name `::rustyh5` from inside this crate too.
extern crate self as rustyh5;

pub mod array;
pub mod array_interface;
pub mod element;
pub mod error;
pub mod file;
pub mod format;
pub mod generic;
pub mod group;
pub mod map;
pub mod optional;
pub mod scalar;
pub mod serialization;
pub mod string;
pub mod tuple;
pub mod types;
pub mod variant;
pub mod vector;

pub use array_interface::{get_dataset_info, ArrayMut, ArrayRef, ArrayView, DatasetInfo};
pub use element::H5Element;
pub use error::{Error, Result};
pub use file::{File, FileMode};
pub use format::{
    assert_hdf5_format, assert_hdf5_format_as_string, get_hdf5_format, read_hdf5_format,
    read_hdf5_format_from_key, write_hdf5_format, write_hdf5_format_as_string, H5Format,
};
pub use generic::{
    read, read_attribute, read_attribute_from_key, read_attribute_into, read_into, try_read,
    write, write_attribute, write_attribute_to_key, H5Construct, H5Read, H5ReadAttribute,
    H5Write, H5WriteAttribute,
};
pub use group::{Dataset, Group, H5Object, Object};
pub use serialization::{deserialize, serialize};
pub use string::{from_char_buf, from_char_buf_2d, to_char_buf, to_char_buf_2d, CharBuf};
pub use types::{hdf5_type, DComplex, H5Scalar, H5Type};

pub use num_complex::{Complex, Complex32, Complex64};
pub use rustyh5_format::{Datatype, DatasetCreateProps, Hyperslab, Selection, TypeClass};

#[cfg(feature = "derive")]
pub use rustyh5_derive::{H5Group, H5Variant};
