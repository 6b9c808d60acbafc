//! Tuple codec, arities 1 to 8: a group tagged `PythonTupleWrap` with the
//! components as children `"0"`, `"1"`, ...

use crate::element::H5Element;
use crate::error::{Error, Result};
use crate::format::{write_hdf5_format_as_string, H5Format};
use crate::generic::{H5Construct, H5Write};
use crate::group::Group;

pub const TUPLE_FORMAT: &str = "PythonTupleWrap";

/// Open the tuple group `name` and check it has exactly `arity` children.
fn open_tuple_group(g: &Group, name: &str, arity: usize) -> Result<Group> {
    let gr = g.open_group(name)?;
    let found = gr.get_all_subgroup_dataset_names().len();
    if found != arity {
        return Err(Error::ShapeMismatch {
            op: "read",
            key: name.to_string(),
            group: g.name(),
            expected: vec![arity as u64],
            found: vec![found as u64],
        });
    }
    Ok(gr)
}

macro_rules! impl_tuple {
    ($n:expr; $($T:ident $i:tt),+) => {
        impl<$($T: H5Write),+> H5Write for ($($T,)+) {
            fn h5_write(&self, g: &Group, name: &str) -> Result<()> {
                let gr = g.create_group(name, true)?;
                write_hdf5_format_as_string(&gr, TUPLE_FORMAT)?;
                $( self.$i.h5_write(&gr, stringify!($i))?; )+
                Ok(())
            }
        }

        impl<$($T: H5Construct),+> H5Construct for ($($T,)+) {
            fn h5_construct(g: &Group, name: &str) -> Result<Self> {
                let gr = open_tuple_group(g, name, $n)?;
                Ok(($($T::h5_construct(&gr, stringify!($i))?,)+))
            }
        }

        impl<$($T),+> H5Format for ($($T,)+) {
            fn hdf5_format() -> String {
                TUPLE_FORMAT.to_string()
            }
        }

        impl<$($T: H5Write + H5Construct),+> H5Element for ($($T,)+) {}
    };
}

impl_tuple!(1; A 0);
impl_tuple!(2; A 0, B 1);
impl_tuple!(3; A 0, B 1, C 2);
impl_tuple!(4; A 0, B 1, C 2, D 3);
impl_tuple!(5; A 0, B 1, C 2, D 3, E 4);
impl_tuple!(6; A 0, B 1, C 2, D 3, E 4, F 5);
impl_tuple!(7; A 0, B 1, C 2, D 3, E 4, F 5, G 6);
impl_tuple!(8; A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);
