//! Codecs for arithmetic scalars, complex numbers and `bool`, and for
//! sequences and arrays of them.
//!
//! A scalar is a rank-0 dataset (rank 1 of length 2 for complex numbers).
//! A sequence is one compressed 1-D dataset.

use num_complex::Complex;
use rustyh5_format::{Datatype, TypeClass};

use crate::array_interface::{self, ArrayMut, ArrayRef, DatasetInfo};
use crate::element::H5Element;
use crate::error::{Error, Result};
use crate::format::H5Format;
use crate::generic::{H5Read, H5ReadAttribute, H5Write, H5WriteAttribute};
use crate::group::{Group, H5Object};
use crate::types::{DComplex, H5Scalar};
use crate::vector;

fn rank_mismatch(g: &Group, name: &str, expected: usize, found: usize) -> Error {
    Error::RankMismatch {
        op: "read",
        key: name.to_string(),
        group: g.name(),
        expected,
        found,
    }
}

fn length_mismatch(g: &Group, name: &str, expected: usize, found: usize) -> Error {
    Error::ShapeMismatch {
        op: "read",
        key: name.to_string(),
        group: g.name(),
        expected: vec![expected as u64],
        found: vec![found as u64],
    }
}

fn write_scalar_seq<T: H5Scalar>(items: &[T], g: &Group, name: &str) -> Result<()> {
    let v = ArrayRef::from_slice(items, &[items.len() as u64]);
    array_interface::write(g, name, &v, true)
}

/// Read a 1-D dataset (2-D with the complex dimension) into a new vector.
fn read_scalar_seq<T: H5Scalar>(g: &Group, name: &str, info: &DatasetInfo) -> Result<Vec<T>> {
    let expected = 1 + usize::from(T::IS_COMPLEX);
    if info.rank() != expected {
        return Err(rank_mismatch(g, name, expected, info.rank()));
    }
    let n = info.lengths[0];
    let mut v = vec![T::default(); n as usize];
    array_interface::read(g, name, &mut ArrayMut::from_slice_mut(&mut v, &[n]), None)?;
    Ok(v)
}

macro_rules! impl_numeric_common {
    ($($t:ty => $tag:literal),* $(,)?) => {$(
        impl H5Write for $t {
            fn h5_write(&self, g: &Group, name: &str) -> Result<()> {
                array_interface::write(g, name, &ArrayRef::scalar(self), false)
            }
        }

        impl H5Format for $t {
            fn hdf5_format() -> String {
                $tag.to_string()
            }
        }

        impl H5WriteAttribute for $t {
            fn h5_write_attribute(&self, obj: &dyn H5Object, name: &str) -> Result<()> {
                array_interface::write_attribute(obj, name, &ArrayRef::scalar(self))
            }
        }

        impl H5ReadAttribute for $t {
            fn h5_read_attribute(&mut self, obj: &dyn H5Object, name: &str) -> Result<()> {
                array_interface::read_attribute(obj, name, &mut ArrayMut::scalar_mut(self))
            }
        }
    )*};
}

macro_rules! impl_real {
    ($($t:ty => $tag:literal),* $(,)?) => {$(
        impl_numeric_common!($t => $tag);

        impl H5Read for $t {
            fn h5_read(&mut self, g: &Group, name: &str) -> Result<()> {
                array_interface::read(g, name, &mut ArrayMut::scalar_mut(self), None)
            }
        }

        impl H5Element for $t {
            fn write_seq(items: &[Self], g: &Group, name: &str) -> Result<()> {
                write_scalar_seq(items, g, name)
            }

            fn read_seq(g: &Group, name: &str) -> Result<Vec<Self>> {
                if g.has_subgroup(name) {
                    return vector::read_list(g, name);
                }
                read_scalar_seq(g, name, &array_interface::get_dataset_info(g, name)?)
            }

            fn write_array(items: &[Self], g: &Group, name: &str) -> Result<()> {
                write_scalar_seq(items, g, name)
            }

            fn read_array(g: &Group, name: &str, n: usize) -> Result<Vec<Self>> {
                let v = Self::read_seq(g, name)?;
                if v.len() != n {
                    return Err(length_mismatch(g, name, n, v.len()));
                }
                Ok(v)
            }
        }
    )*};
}

impl_real!(
    i8 => "signed char",
    i16 => "short",
    i32 => "int",
    i64 => "long",
    u8 => "unsigned char",
    u16 => "unsigned short",
    u32 => "unsigned int",
    u64 => "unsigned long",
    f32 => "float",
    f64 => "double",
    DComplex => "dcomplex",
);

/// True if `info` describes complex numbers stored without the trailing
/// dimension: real values, or the `{r, i}` compound.
fn is_compound_complex(info: &DatasetInfo) -> bool {
    info.datatype.type_equal(&Datatype::complex_compound())
}

fn is_plain_real(info: &DatasetInfo) -> bool {
    !info.has_complex_attribute
        && matches!(info.datatype.class(), TypeClass::Integer | TypeClass::Float)
}

macro_rules! impl_complex {
    ($($t:ty => $tag:literal),* $(,)?) => {$(
        impl_numeric_common!(Complex<$t> => $tag);

        impl H5Read for Complex<$t> {
            fn h5_read(&mut self, g: &Group, name: &str) -> Result<()> {
                if g.has_subgroup(name) {
                    let gr = g.open_group(name)?;
                    let r: f64 = crate::generic::read(&gr, "r")?;
                    let i: f64 = crate::generic::read(&gr, "i")?;
                    *self = Complex::new(r as $t, i as $t);
                    return Ok(());
                }
                let info = array_interface::get_dataset_info(g, name)?;
                if is_compound_complex(&info) {
                    let mut z = DComplex::default();
                    z.h5_read(g, name)?;
                    *self = Complex::new(z.r as $t, z.i as $t);
                    return Ok(());
                }
                if is_plain_real(&info) && info.rank() == 0 {
                    log::warn!(
                        "reading real {} into complex {} in {}",
                        info.datatype.name(),
                        name,
                        g.name()
                    );
                    let mut re: $t = 0.0;
                    re.h5_read(g, name)?;
                    *self = Complex::new(re, 0.0);
                    return Ok(());
                }
                array_interface::read(g, name, &mut ArrayMut::scalar_mut(self), None)
            }
        }

        impl H5Element for Complex<$t> {
            fn write_seq(items: &[Self], g: &Group, name: &str) -> Result<()> {
                write_scalar_seq(items, g, name)
            }

            fn read_seq(g: &Group, name: &str) -> Result<Vec<Self>> {
                if g.has_subgroup(name) {
                    return vector::read_list(g, name);
                }
                let info = array_interface::get_dataset_info(g, name)?;
                if is_compound_complex(&info) {
                    let v: Vec<DComplex> = read_scalar_seq(g, name, &info)?;
                    return Ok(v.into_iter().map(|z| Complex::new(z.r as $t, z.i as $t)).collect());
                }
                if is_plain_real(&info) && info.rank() == 1 {
                    log::warn!(
                        "reading real {} into complex {} in {}",
                        info.datatype.name(),
                        name,
                        g.name()
                    );
                    let v: Vec<$t> = read_scalar_seq(g, name, &info)?;
                    return Ok(v.into_iter().map(|re| Complex::new(re, 0.0)).collect());
                }
                read_scalar_seq(g, name, &info)
            }

            fn write_array(items: &[Self], g: &Group, name: &str) -> Result<()> {
                write_scalar_seq(items, g, name)
            }

            fn read_array(g: &Group, name: &str, n: usize) -> Result<Vec<Self>> {
                let v = Self::read_seq(g, name)?;
                if v.len() != n {
                    return Err(length_mismatch(g, name, n, v.len()));
                }
                Ok(v)
            }
        }
    )*};
}

impl_complex!(f32 => "complex<float>", f64 => "complex");

// bool is not `Pod`; it goes through a byte buffer typed as the 1-byte
// enumeration.

fn bool_bytes(items: &[bool]) -> Vec<u8> {
    items.iter().map(|&b| u8::from(b)).collect()
}

impl H5Write for bool {
    fn h5_write(&self, g: &Group, name: &str) -> Result<()> {
        let data = [u8::from(*self)];
        let v = ArrayRef::contiguous(Datatype::Bool, &data[..], &[], false);
        array_interface::write(g, name, &v, false)
    }
}

impl H5Read for bool {
    fn h5_read(&mut self, g: &Group, name: &str) -> Result<()> {
        let mut data = [0u8];
        let mut v = ArrayMut::contiguous(Datatype::Bool, &mut data[..], &[], false);
        array_interface::read(g, name, &mut v, None)?;
        *self = data[0] != 0;
        Ok(())
    }
}

impl H5Format for bool {
    fn hdf5_format() -> String {
        "bool".to_string()
    }
}

impl H5WriteAttribute for bool {
    fn h5_write_attribute(&self, obj: &dyn H5Object, name: &str) -> Result<()> {
        let data = [u8::from(*self)];
        let v = ArrayRef::contiguous(Datatype::Bool, &data[..], &[], false);
        array_interface::write_attribute(obj, name, &v)
    }
}

impl H5ReadAttribute for bool {
    fn h5_read_attribute(&mut self, obj: &dyn H5Object, name: &str) -> Result<()> {
        let mut data = [0u8];
        let mut v = ArrayMut::contiguous(Datatype::Bool, &mut data[..], &[], false);
        array_interface::read_attribute(obj, name, &mut v)?;
        *self = data[0] != 0;
        Ok(())
    }
}

impl H5Element for bool {
    fn write_seq(items: &[Self], g: &Group, name: &str) -> Result<()> {
        let data = bool_bytes(items);
        let v = ArrayRef::contiguous(Datatype::Bool, &data[..], &[items.len() as u64], false);
        array_interface::write(g, name, &v, true)
    }

    fn read_seq(g: &Group, name: &str) -> Result<Vec<Self>> {
        if g.has_subgroup(name) {
            return vector::read_list(g, name);
        }
        let info = array_interface::get_dataset_info(g, name)?;
        if info.rank() != 1 {
            return Err(rank_mismatch(g, name, 1, info.rank()));
        }
        let mut data = vec![0u8; info.lengths[0] as usize];
        let mut v = ArrayMut::contiguous(Datatype::Bool, &mut data[..], &info.lengths, false);
        array_interface::read(g, name, &mut v, None)?;
        Ok(data.into_iter().map(|b| b != 0).collect())
    }

    fn write_array(items: &[Self], g: &Group, name: &str) -> Result<()> {
        Self::write_seq(items, g, name)
    }

    fn read_array(g: &Group, name: &str, n: usize) -> Result<Vec<Self>> {
        let v = Self::read_seq(g, name)?;
        if v.len() != n {
            return Err(length_mismatch(g, name, n, v.len()));
        }
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::File;
    use crate::generic::{read, read_attribute, write, write_attribute};
    use num_complex::Complex64;

    #[test]
    fn scalars_round_trip() {
        let root = File::memory().root();
        write(&root, "i", &-7i32).unwrap();
        write(&root, "u", &9u64).unwrap();
        write(&root, "x", &2.5f64).unwrap();
        write(&root, "b", &true).unwrap();
        assert_eq!(read::<i32>(&root, "i").unwrap(), -7);
        assert_eq!(read::<u64>(&root, "u").unwrap(), 9);
        assert_eq!(read::<f64>(&root, "x").unwrap(), 2.5);
        assert!(read::<bool>(&root, "b").unwrap());
        assert!(root.open_dataset("i").unwrap().shape().unwrap().is_empty());
    }

    #[test]
    fn scalar_widening_and_class_mismatch() {
        let root = File::memory().root();
        write(&root, "i", &300i16).unwrap();
        assert_eq!(read::<i64>(&root, "i").unwrap(), 300);
        assert_eq!(read::<u8>(&root, "i").unwrap(), 255);
        assert!(matches!(
            read::<f64>(&root, "i"),
            Err(Error::TypeClassMismatch { .. })
        ));
    }

    #[test]
    fn complex_scalar() {
        let root = File::memory().root();
        let z = Complex64::new(1.5, -2.0);
        write(&root, "z", &z).unwrap();
        assert_eq!(root.open_dataset("z").unwrap().shape().unwrap(), vec![2]);
        assert_eq!(read::<Complex64>(&root, "z").unwrap(), z);
    }

    #[test]
    fn complex_from_legacy_subgroup() {
        let root = File::memory().root();
        let g = root.create_group("z", true).unwrap();
        write(&g, "r", &3.0f64).unwrap();
        write(&g, "i", &4.0f64).unwrap();
        assert_eq!(read::<Complex64>(&root, "z").unwrap(), Complex64::new(3.0, 4.0));
    }

    #[test]
    fn complex_from_compound() {
        let root = File::memory().root();
        write(&root, "z", &DComplex { r: 1.0, i: 2.0 }).unwrap();
        assert_eq!(read::<Complex64>(&root, "z").unwrap(), Complex64::new(1.0, 2.0));
        write(&root, "zs", &vec![DComplex { r: 0.5, i: 0.25 }]).unwrap();
        assert_eq!(
            read::<Vec<Complex64>>(&root, "zs").unwrap(),
            vec![Complex64::new(0.5, 0.25)]
        );
    }

    #[test]
    fn complex_from_real() {
        let root = File::memory().root();
        write(&root, "x", &2.0f64).unwrap();
        assert_eq!(read::<Complex64>(&root, "x").unwrap(), Complex64::new(2.0, 0.0));
        write(&root, "v", &vec![1.0f64, 2.0]).unwrap();
        assert_eq!(
            read::<Vec<Complex64>>(&root, "v").unwrap(),
            vec![Complex64::new(1.0, 0.0), Complex64::new(2.0, 0.0)]
        );
    }

    #[test]
    fn numeric_vectors() {
        let root = File::memory().root();
        let v: Vec<f64> = (0..10).map(f64::from).collect();
        write(&root, "v", &v).unwrap();
        assert!(root.open_dataset("v").unwrap().is_chunked().unwrap());
        assert_eq!(read::<Vec<f64>>(&root, "v").unwrap(), v);
        let empty: Vec<i32> = Vec::new();
        write(&root, "e", &empty).unwrap();
        assert_eq!(read::<Vec<i32>>(&root, "e").unwrap(), empty);
        let flags = vec![true, false, true];
        write(&root, "f", &flags).unwrap();
        assert_eq!(read::<Vec<bool>>(&root, "f").unwrap(), flags);
    }

    #[test]
    fn vector_from_scalar_fails() {
        let root = File::memory().root();
        write(&root, "x", &1.0f64).unwrap();
        assert!(matches!(
            read::<Vec<f64>>(&root, "x"),
            Err(Error::RankMismatch { .. })
        ));
    }

    #[test]
    fn scalar_attributes() {
        let root = File::memory().root();
        write_attribute(&root, "n", &5u32).unwrap();
        write_attribute(&root, "z", &Complex64::new(0.0, 1.0)).unwrap();
        write_attribute(&root, "flag", &true).unwrap();
        assert_eq!(read_attribute::<u32>(&root, "n").unwrap(), 5);
        assert_eq!(read_attribute::<Complex64>(&root, "z").unwrap(), Complex64::new(0.0, 1.0));
        assert!(read_attribute::<bool>(&root, "flag").unwrap());
        assert!(matches!(
            read_attribute::<u32>(&root, "missing"),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn format_tags() {
        assert_eq!(crate::format::get_hdf5_format::<i32>(), "int");
        assert_eq!(crate::format::get_hdf5_format::<f64>(), "double");
        assert_eq!(crate::format::get_hdf5_format::<Complex64>(), "complex");
        assert_eq!(crate::format::get_hdf5_format::<bool>(), "bool");
    }
}
