//! Fixed-size array codec.
//!
//! `[T; N]` of numbers or strings is stored like a `Vec<T>` of length `N`.
//! Other element types are stored as a group holding a `shape` dataset
//! `[N]` and the elements as children `"0"` to `"N-1"`.

use crate::element::H5Element;
use crate::error::{Error, Result};
use crate::format::H5Format;
use crate::generic::{H5Construct, H5Write};
use crate::group::Group;

/// Name of the dataset holding the length of a group-encoded array.
pub const SHAPE_KEY: &str = "shape";

pub fn write_group_array<T: H5Write>(items: &[T], g: &Group, name: &str) -> Result<()> {
    let gr = g.create_group(name, true)?;
    // `[i64; 1]` is itself a numeric array, stored as a 1-D dataset
    [items.len() as i64].h5_write(&gr, SHAPE_KEY)?;
    for (i, x) in items.iter().enumerate() {
        x.h5_write(&gr, &i.to_string())?;
    }
    Ok(())
}

pub fn read_group_array<T: H5Construct>(g: &Group, name: &str, n: usize) -> Result<Vec<T>> {
    let gr = g.open_group(name)?;
    let shape = <[i64; 1]>::h5_construct(&gr, SHAPE_KEY)?;
    if shape[0] != n as i64 {
        return Err(Error::ShapeMismatch {
            op: "read",
            key: name.to_string(),
            group: g.name(),
            expected: vec![n as u64],
            found: vec![shape[0].max(0) as u64],
        });
    }
    (0..n).map(|i| T::h5_construct(&gr, &i.to_string())).collect()
}

impl<T: H5Element, const N: usize> H5Write for [T; N] {
    fn h5_write(&self, g: &Group, name: &str) -> Result<()> {
        T::write_array(self, g, name)
    }
}

impl<T: H5Element, const N: usize> H5Construct for [T; N] {
    fn h5_construct(g: &Group, name: &str) -> Result<Self> {
        let v = T::read_array(g, name, N)?;
        let found = v.len();
        v.try_into().map_err(|_| Error::ShapeMismatch {
            op: "read",
            key: name.to_string(),
            group: g.name(),
            expected: vec![N as u64],
            found: vec![found as u64],
        })
    }
}

impl<T: H5Element, const N: usize> H5Format for [T; N] {
    fn hdf5_format() -> String {
        "List".to_string()
    }
}

impl<T: H5Element, const N: usize> H5Element for [T; N] {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::File;
    use crate::generic::{read, write};
    use num_complex::Complex64;

    #[test]
    fn numeric_arrays() {
        let root = File::memory().root();
        write(&root, "a", &[1i64, 2, 3]).unwrap();
        assert_eq!(root.open_dataset("a").unwrap().shape().unwrap(), vec![3]);
        assert_eq!(read::<[i64; 3]>(&root, "a").unwrap(), [1, 2, 3]);
        assert!(matches!(
            read::<[i64; 4]>(&root, "a"),
            Err(Error::ShapeMismatch { .. })
        ));
        let z = [Complex64::new(1.0, 1.0), Complex64::new(0.0, -1.0)];
        write(&root, "z", &z).unwrap();
        assert_eq!(read::<[Complex64; 2]>(&root, "z").unwrap(), z);
    }

    #[test]
    fn string_arrays() {
        let root = File::memory().root();
        let a = ["ab".to_string(), "c".to_string()];
        write(&root, "s", &a).unwrap();
        assert!(root.has_dataset("s"));
        assert_eq!(read::<[String; 2]>(&root, "s").unwrap(), a);
    }

    #[test]
    fn group_arrays() {
        let root = File::memory().root();
        let a = [vec![1.0f64], vec![2.0, 3.0]];
        write(&root, "g", &a).unwrap();
        let gr = root.open_group("g").unwrap();
        assert_eq!(read::<[i64; 1]>(&gr, SHAPE_KEY).unwrap(), [2]);
        assert_eq!(read::<[Vec<f64>; 2]>(&root, "g").unwrap(), a);
        assert!(matches!(
            read::<[Vec<f64>; 3]>(&root, "g"),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn empty_array() {
        let root = File::memory().root();
        let a: [f64; 0] = [];
        write(&root, "e", &a).unwrap();
        assert_eq!(read::<[f64; 0]>(&root, "e").unwrap(), a);
    }
}
