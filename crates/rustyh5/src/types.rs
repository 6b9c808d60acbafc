//! Mapping from Rust element types to stored datatypes.

use bytemuck::{Pod, Zeroable};
use num_complex::Complex;
use rustyh5_format::Datatype;

/// Plain-old-data element that can be viewed directly as stored bytes.
///
/// Complex numbers are stored as their real element type with a trailing
/// dimension of 2 and report `IS_COMPLEX`.
pub trait H5Scalar: Pod + Default + 'static {
    const IS_COMPLEX: bool = false;

    /// Datatype of one stored element; for complex numbers, of one part.
    fn element_type() -> Datatype;
}

/// Datatype a value of this type is stored as, used to pick the matching
/// alternative when reading an enum of leaf types.
pub trait H5Type {
    fn hdf5_type() -> Datatype;
}

macro_rules! impl_int {
    ($($t:ty),*) => {$(
        impl H5Scalar for $t {
            fn element_type() -> Datatype {
                Datatype::integer(std::mem::size_of::<$t>() as u8, <$t>::MIN != 0)
            }
        }
        impl H5Type for $t {
            fn hdf5_type() -> Datatype {
                <$t as H5Scalar>::element_type()
            }
        }
    )*};
}

impl_int!(i8, i16, i32, i64, u8, u16, u32, u64);

impl H5Scalar for f32 {
    fn element_type() -> Datatype {
        Datatype::float(4)
    }
}

impl H5Scalar for f64 {
    fn element_type() -> Datatype {
        Datatype::float(8)
    }
}

impl H5Type for f32 {
    fn hdf5_type() -> Datatype {
        Datatype::float(4)
    }
}

impl H5Type for f64 {
    fn hdf5_type() -> Datatype {
        Datatype::float(8)
    }
}

macro_rules! impl_complex {
    ($($t:ty),*) => {$(
        impl H5Scalar for Complex<$t> {
            const IS_COMPLEX: bool = true;

            fn element_type() -> Datatype {
                <$t as H5Scalar>::element_type()
            }
        }
        impl H5Type for Complex<$t> {
            fn hdf5_type() -> Datatype {
                <$t as H5Scalar>::element_type()
            }
        }
    )*};
}

impl_complex!(f32, f64);

impl H5Type for bool {
    fn hdf5_type() -> Datatype {
        Datatype::Bool
    }
}

impl H5Type for String {
    fn hdf5_type() -> Datatype {
        Datatype::variable_string()
    }
}

/// Double-precision complex number stored as a `{ r, i }` compound.
///
/// Older files hold complex data in this layout; reads of complex values
/// accept it transparently.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct DComplex {
    pub r: f64,
    pub i: f64,
}

impl H5Scalar for DComplex {
    fn element_type() -> Datatype {
        Datatype::complex_compound()
    }
}

impl H5Type for DComplex {
    fn hdf5_type() -> Datatype {
        Datatype::complex_compound()
    }
}

impl From<DComplex> for Complex<f64> {
    fn from(z: DComplex) -> Self {
        Complex::new(z.r, z.i)
    }
}

impl From<Complex<f64>> for DComplex {
    fn from(z: Complex<f64>) -> Self {
        DComplex { r: z.re, i: z.im }
    }
}

/// Stored datatype of a Rust value.
pub fn hdf5_type<T: H5Type>() -> Datatype {
    T::hdf5_type()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_types() {
        assert_eq!(hdf5_type::<i32>(), Datatype::integer(4, true));
        assert_eq!(hdf5_type::<u16>(), Datatype::integer(2, false));
        assert_eq!(hdf5_type::<u64>().name(), "uint64");
    }

    #[test]
    fn complex_is_real_parts() {
        assert!(<Complex<f64> as H5Scalar>::IS_COMPLEX);
        assert_eq!(<Complex<f32> as H5Scalar>::element_type(), Datatype::float(4));
        assert_eq!(std::mem::size_of::<DComplex>(), 16);
        assert_eq!(hdf5_type::<DComplex>(), Datatype::complex_compound());
    }
}
