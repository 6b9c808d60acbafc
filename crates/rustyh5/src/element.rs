//! How a type is stored when it sits inside a container: a vector, a
//! fixed-size array, a nested vector, or a map key.
//!
//! The provided methods store elements one child per index inside a
//! tagged group, which works for any storable type. Numeric types and
//! strings override them with a single packed dataset.

use crate::error::Result;
use crate::generic::{H5Construct, H5Write};
use crate::group::Group;
use crate::{array, vector};

/// A type usable as the element of a `Vec`, array or map.
pub trait H5Element: H5Write + H5Construct {
    /// True if map keys of this type name the map's children directly.
    const NAMED_KEY: bool = false;

    /// Format tag of a `Vec<Self>`.
    fn seq_format() -> String {
        "List".to_string()
    }

    fn write_seq(items: &[Self], g: &Group, name: &str) -> Result<()> {
        vector::write_list(items, g, name)
    }

    fn read_seq(g: &Group, name: &str) -> Result<Vec<Self>> {
        vector::read_list(g, name)
    }

    fn write_array(items: &[Self], g: &Group, name: &str) -> Result<()> {
        array::write_group_array(items, g, name)
    }

    /// Read exactly `n` elements.
    fn read_array(g: &Group, name: &str, n: usize) -> Result<Vec<Self>> {
        array::read_group_array(g, name, n)
    }

    /// Store a `Vec<Vec<Self>>`.
    fn write_nested(rows: &[Vec<Self>], g: &Group, name: &str) -> Result<()> {
        vector::write_list(rows, g, name)
    }

    fn read_nested(g: &Group, name: &str) -> Result<Vec<Vec<Self>>> {
        vector::read_list(g, name)
    }

    /// Child name for this value as a map key, if `NAMED_KEY`.
    fn key_name(&self) -> Option<String> {
        None
    }

    /// Inverse of [`key_name`](Self::key_name).
    fn from_key_name(_name: &str) -> Option<Self> {
        None
    }
}
