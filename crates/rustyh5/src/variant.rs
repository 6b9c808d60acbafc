//! Support for enums of leaf types (`#[derive(H5Variant)]`).
//!
//! Writing forwards to the held value. Reading looks at the stored
//! datatype and constructs the first alternative whose [`H5Type`] is equal
//! to it.
//!
//! ```ignore
//! #[derive(H5Variant)]
//! enum Value {
//!     Int(i64),
//!     Real(f64),
//!     Text(String),
//! }
//! ```

use rustyh5_format::Datatype;

use crate::error::{Error, Result};
use crate::group::Group;
use crate::types::H5Type;

/// Datatype of the dataset `name` in `g`.
pub fn stored_datatype(g: &Group, name: &str) -> Result<Datatype> {
    g.open_dataset(name)?.datatype()
}

/// True if a value of type `T` is stored as `dt`.
pub fn matches<T: H5Type>(dt: &Datatype) -> bool {
    T::hdf5_type().type_equal(dt)
}

/// The error for a stored datatype that no alternative of `type_name`
/// matches.
pub fn no_matching_alternative(g: &Group, name: &str, dt: &Datatype, type_name: &str) -> Error {
    Error::TypeClassMismatch {
        op: "read",
        key: name.to_string(),
        group: g.name(),
        expected: format!("an alternative of {type_name}"),
        found: dt.name(),
    }
}
