//! Strings and string tables.
//!
//! A single string is stored as a scalar variable-length UTF-8 string. A
//! table of strings (`Vec<String>`, `Vec<Vec<String>>`) is packed into a
//! [`CharBuf`]: an n-dimensional array of null-padded fixed-width strings,
//! the width being one more than the longest string.

use rustyh5_format::{Attribute, Datatype, Selection, TypeClass};

use crate::array_interface::{self, ArrayMut, ArrayRef};
use crate::element::H5Element;
use crate::error::{Error, Result};
use crate::format::H5Format;
use crate::generic::{H5Read, H5ReadAttribute, H5Write, H5WriteAttribute};
use crate::group::{Group, H5Object};

/// Bytes up to the first null, as a string.
fn c_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

impl H5Write for str {
    fn h5_write(&self, g: &Group, name: &str) -> Result<()> {
        g.create_string_dataset(name, self)?;
        Ok(())
    }
}

impl H5Write for String {
    fn h5_write(&self, g: &Group, name: &str) -> Result<()> {
        self.as_str().h5_write(g, name)
    }
}

impl H5Read for String {
    fn h5_read(&mut self, g: &Group, name: &str) -> Result<()> {
        self.clear();
        let ds = g.open_dataset(name)?;
        let shape = ds.shape()?;
        if !shape.is_empty() {
            return Err(Error::RankMismatch {
                op: "read string",
                key: name.to_string(),
                group: g.name(),
                expected: 0,
                found: shape.len(),
            });
        }
        let dt = ds.datatype()?;
        if dt.class() != TypeClass::String {
            return Err(Error::TypeClassMismatch {
                op: "read string",
                key: name.to_string(),
                group: g.name(),
                expected: "string".into(),
                found: dt.name(),
            });
        }
        match ds.read_var_string()? {
            Some(bytes) => self.push_str(&String::from_utf8_lossy(&bytes)),
            None => self.push_str(&c_string(&ds.read_raw(&Selection::All)?)),
        }
        Ok(())
    }
}

impl H5Format for String {
    fn hdf5_format() -> String {
        "string".to_string()
    }
}

impl H5Format for str {
    fn hdf5_format() -> String {
        "string".to_string()
    }
}

/// Attach a scalar string attribute. Fails if the attribute exists.
pub fn write_string_attribute(obj: &dyn H5Object, name: &str, value: &str) -> Result<()> {
    obj.create_attribute(name, Attribute::string(value))
}

/// Read a scalar string attribute; an absent attribute reads as `""`.
pub fn read_string_attribute(obj: &dyn H5Object, name: &str) -> Result<String> {
    let Some(attr) = obj.attribute(name) else {
        return Ok(String::new());
    };
    if attr.rank() != 0 {
        return Err(Error::RankMismatch {
            op: "read_attribute",
            key: name.to_string(),
            group: obj.object_name(),
            expected: 0,
            found: attr.rank(),
        });
    }
    if attr.datatype.class() != TypeClass::String {
        return Err(Error::TypeClassMismatch {
            op: "read_attribute",
            key: name.to_string(),
            group: obj.object_name(),
            expected: "string".into(),
            found: attr.datatype.name(),
        });
    }
    if attr.datatype.is_variable_string() {
        Ok(String::from_utf8_lossy(&attr.data).into_owned())
    } else {
        Ok(c_string(&attr.data))
    }
}

impl H5WriteAttribute for str {
    fn h5_write_attribute(&self, obj: &dyn H5Object, name: &str) -> Result<()> {
        write_string_attribute(obj, name, self)
    }
}

impl H5WriteAttribute for String {
    fn h5_write_attribute(&self, obj: &dyn H5Object, name: &str) -> Result<()> {
        write_string_attribute(obj, name, self)
    }
}

impl H5ReadAttribute for String {
    fn h5_read_attribute(&mut self, obj: &dyn H5Object, name: &str) -> Result<()> {
        *self = read_string_attribute(obj, name)?;
        Ok(())
    }
}

/// An n-dimensional array of fixed-width, null-padded strings.
///
/// `lengths` holds the array dimensions followed by the string width.
/// `buffer` always holds at least one byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharBuf {
    pub buffer: Vec<u8>,
    pub lengths: Vec<u64>,
}

impl Default for CharBuf {
    fn default() -> Self {
        Self {
            buffer: vec![0],
            lengths: vec![0, 1],
        }
    }
}

impl CharBuf {
    /// Width of one string slot.
    pub fn stride(&self) -> usize {
        self.lengths.last().copied().unwrap_or(1) as usize
    }

    /// Array dimensions, without the string width.
    pub fn dims(&self) -> &[u64] {
        &self.lengths[..self.lengths.len().saturating_sub(1)]
    }

    pub fn datatype(&self) -> Datatype {
        Datatype::fixed_string(self.stride() as u32)
    }

    fn used_bytes(&self) -> usize {
        self.dims().iter().product::<u64>() as usize * self.stride()
    }

    fn from_stored(dims: &[u64], width: usize, mut buffer: Vec<u8>) -> Self {
        if buffer.is_empty() {
            buffer.push(0);
        }
        let mut lengths = dims.to_vec();
        lengths.push(width as u64);
        Self { buffer, lengths }
    }
}

fn char_buf_type_check(dt: &Datatype, op: &'static str, key: &str, group: String) -> Result<usize> {
    match dt {
        Datatype::String(rustyh5_format::StringSize::Fixed(n)) => Ok(*n as usize),
        other => Err(Error::TypeClassMismatch {
            op,
            key: key.to_string(),
            group,
            expected: "fixed-width string".into(),
            found: other.name(),
        }),
    }
}

impl H5Write for CharBuf {
    fn h5_write(&self, g: &Group, name: &str) -> Result<()> {
        let v = ArrayRef::contiguous(self.datatype(), &self.buffer[..], self.dims(), false);
        array_interface::write(g, name, &v, false)
    }
}

impl H5Read for CharBuf {
    fn h5_read(&mut self, g: &Group, name: &str) -> Result<()> {
        let info = array_interface::get_dataset_info(g, name)?;
        let width = char_buf_type_check(&info.datatype, "read", name, g.name())?;
        let n = info.lengths.iter().product::<u64>() as usize;
        let mut buffer = vec![0u8; (n * width).max(1)];
        let mut v = ArrayMut::contiguous(info.datatype.clone(), &mut buffer[..], &info.lengths, false);
        array_interface::read(g, name, &mut v, None)?;
        *self = CharBuf::from_stored(&info.lengths, width, buffer);
        Ok(())
    }
}

impl H5WriteAttribute for CharBuf {
    fn h5_write_attribute(&self, obj: &dyn H5Object, name: &str) -> Result<()> {
        obj.create_attribute(
            name,
            Attribute {
                datatype: self.datatype(),
                shape: self.dims().to_vec(),
                data: self.buffer[..self.used_bytes()].to_vec(),
            },
        )
    }
}

impl H5ReadAttribute for CharBuf {
    fn h5_read_attribute(&mut self, obj: &dyn H5Object, name: &str) -> Result<()> {
        let attr = obj.attribute(name).ok_or_else(|| Error::NotFound {
            op: "read_attribute",
            key: name.to_string(),
            group: obj.object_name(),
        })?;
        let width = char_buf_type_check(&attr.datatype, "read_attribute", name, obj.object_name())?;
        *self = CharBuf::from_stored(&attr.shape, width, attr.data);
        Ok(())
    }
}

/// Pack strings into a one-dimensional [`CharBuf`].
pub fn to_char_buf<S: AsRef<str>>(v: &[S]) -> CharBuf {
    let s = v.iter().map(|x| x.as_ref().len() + 1).max().unwrap_or(1);
    let mut buffer = vec![0u8; (v.len() * s).max(1)];
    for (i, x) in v.iter().enumerate() {
        let b = x.as_ref().as_bytes();
        buffer[i * s..i * s + b.len()].copy_from_slice(b);
    }
    CharBuf {
        buffer,
        lengths: vec![v.len() as u64, s as u64],
    }
}

/// Pack rows of strings into a two-dimensional [`CharBuf`]; short rows are
/// padded with empty slots up to the longest row.
pub fn to_char_buf_2d<S: AsRef<str>>(v: &[Vec<S>]) -> CharBuf {
    let lv = v.iter().map(Vec::len).max().unwrap_or(0);
    let s = v
        .iter()
        .flatten()
        .map(|x| x.as_ref().len() + 1)
        .max()
        .unwrap_or(1);
    let mut buffer = vec![0u8; (v.len() * lv * s).max(1)];
    for (i, row) in v.iter().enumerate() {
        for (j, x) in row.iter().enumerate() {
            let k = (i * lv + j) * s;
            let b = x.as_ref().as_bytes();
            buffer[k..k + b.len()].copy_from_slice(b);
        }
    }
    CharBuf {
        buffer,
        lengths: vec![v.len() as u64, lv as u64, s as u64],
    }
}

fn expect_rank(cb: &CharBuf, rank: usize) -> Result<()> {
    if cb.lengths.len() != rank + 1 {
        return Err(Error::Unsupported(format!(
            "string table of rank {} cannot be unpacked as rank {rank}",
            cb.lengths.len().saturating_sub(1)
        )));
    }
    let need = cb.used_bytes();
    if cb.buffer.len() < need {
        return Err(Error::Unsupported(format!(
            "string table needs {need} bytes, buffer holds {}",
            cb.buffer.len()
        )));
    }
    Ok(())
}

/// Unpack a one-dimensional [`CharBuf`]. Each string ends at its first
/// null byte.
pub fn from_char_buf(cb: &CharBuf) -> Result<Vec<String>> {
    expect_rank(cb, 1)?;
    let s = cb.stride();
    Ok((0..cb.lengths[0] as usize)
        .map(|i| c_string(&cb.buffer[i * s..(i + 1) * s]))
        .collect())
}

/// Unpack a two-dimensional [`CharBuf`]. Every row comes back with the
/// full row width; padding slots read as empty strings.
pub fn from_char_buf_2d(cb: &CharBuf) -> Result<Vec<Vec<String>>> {
    expect_rank(cb, 2)?;
    let s = cb.stride();
    let lv = cb.lengths[1] as usize;
    Ok((0..cb.lengths[0] as usize)
        .map(|i| {
            (0..lv)
                .map(|j| {
                    let k = (i * lv + j) * s;
                    c_string(&cb.buffer[k..k + s])
                })
                .collect()
        })
        .collect())
}

fn string_table_rank(g: &Group, name: &str, rank: usize) -> Result<()> {
    let info = array_interface::get_dataset_info(g, name)?;
    if info.rank() != rank {
        return Err(Error::RankMismatch {
            op: "read",
            key: name.to_string(),
            group: g.name(),
            expected: rank,
            found: info.rank(),
        });
    }
    Ok(())
}

impl H5Element for String {
    const NAMED_KEY: bool = true;

    fn seq_format() -> String {
        "vector<string>".to_string()
    }

    fn write_seq(items: &[Self], g: &Group, name: &str) -> Result<()> {
        to_char_buf(items).h5_write(g, name)
    }

    fn read_seq(g: &Group, name: &str) -> Result<Vec<Self>> {
        if g.has_subgroup(name) {
            return crate::vector::read_list(g, name);
        }
        string_table_rank(g, name, 1)?;
        let mut cb = CharBuf::default();
        cb.h5_read(g, name)?;
        from_char_buf(&cb)
    }

    fn write_array(items: &[Self], g: &Group, name: &str) -> Result<()> {
        Self::write_seq(items, g, name)
    }

    fn read_array(g: &Group, name: &str, n: usize) -> Result<Vec<Self>> {
        let v = Self::read_seq(g, name)?;
        if v.len() != n {
            return Err(Error::ShapeMismatch {
                op: "read",
                key: name.to_string(),
                group: g.name(),
                expected: vec![n as u64],
                found: vec![v.len() as u64],
            });
        }
        Ok(v)
    }

    fn write_nested(rows: &[Vec<Self>], g: &Group, name: &str) -> Result<()> {
        to_char_buf_2d(rows).h5_write(g, name)
    }

    fn read_nested(g: &Group, name: &str) -> Result<Vec<Vec<Self>>> {
        if g.has_subgroup(name) {
            return crate::vector::read_list(g, name);
        }
        string_table_rank(g, name, 2)?;
        let mut cb = CharBuf::default();
        cb.h5_read(g, name)?;
        from_char_buf_2d(&cb)
    }

    fn key_name(&self) -> Option<String> {
        Some(self.clone())
    }

    fn from_key_name(name: &str) -> Option<Self> {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::File;
    use crate::generic::{read, write};

    #[test]
    fn char_buf_layout() {
        let cb = to_char_buf(&["a", "abc", ""]);
        assert_eq!(cb.lengths, vec![3, 4]);
        assert_eq!(cb.buffer, b"a\0\0\0abc\0\0\0\0\0");
        assert_eq!(from_char_buf(&cb).unwrap(), vec!["a", "abc", ""]);
    }

    #[test]
    fn empty_tables_keep_one_byte() {
        let empty: [&str; 0] = [];
        let cb = to_char_buf(&empty);
        assert_eq!(cb.lengths, vec![0, 1]);
        assert_eq!(cb.buffer.len(), 1);
        let cb2 = to_char_buf_2d::<&str>(&[]);
        assert_eq!(cb2.lengths, vec![0, 0, 1]);
        assert_eq!(cb2.buffer.len(), 1);
    }

    #[test]
    fn ragged_rows_pad() {
        let rows = vec![vec!["x"], vec!["yy", "zzz"]];
        let cb = to_char_buf_2d(&rows);
        assert_eq!(cb.lengths, vec![2, 2, 4]);
        assert_eq!(
            from_char_buf_2d(&cb).unwrap(),
            vec![vec!["x", ""], vec!["yy", "zzz"]]
        );
    }

    #[test]
    fn missing_slot_is_zero_filled() {
        let flat = to_char_buf(&["a", "b"]);
        assert_eq!(flat.lengths, vec![2, 2]);

        let cb = to_char_buf_2d(&[vec!["a", "b"], vec!["c"]]);
        assert_eq!(cb.lengths, vec![2, 2, 2]);
        assert_eq!(&cb.buffer[6..8], &[0, 0]);
        assert_eq!(
            from_char_buf_2d(&cb).unwrap(),
            vec![vec!["a", "b"], vec!["c", ""]]
        );
    }

    #[test]
    fn null_bytes_truncate() {
        let cb = to_char_buf(&["ab\0cd"]);
        assert_eq!(from_char_buf(&cb).unwrap(), vec!["ab"]);
    }

    #[test]
    fn wrong_rank_rejected() {
        let cb = to_char_buf(&["a"]);
        assert!(from_char_buf_2d(&cb).is_err());
    }

    #[test]
    fn scalar_string_dataset() {
        let root = File::memory().root();
        write(&root, "s", "héllo").unwrap();
        assert_eq!(read::<String>(&root, "s").unwrap(), "héllo");
        let ds = root.open_dataset("s").unwrap();
        assert!(ds.datatype().unwrap().is_variable_string());
    }

    #[test]
    fn fixed_width_string_dataset_reads() {
        let root = File::memory().root();
        let ds = root
            .create_dataset("f", Datatype::fixed_string(6), &[], &Default::default())
            .unwrap();
        ds.write_raw(&Selection::All, b"abc\0\0\0").unwrap();
        assert_eq!(read::<String>(&root, "f").unwrap(), "abc");
    }

    #[test]
    fn string_from_array_fails() {
        let root = File::memory().root();
        write(&root, "v", &vec![1i32, 2]).unwrap();
        assert!(read::<String>(&root, "v").is_err());
    }

    #[test]
    fn string_attributes() {
        let root = File::memory().root();
        write_string_attribute(&root, "note", "hi").unwrap();
        assert_eq!(read_string_attribute(&root, "note").unwrap(), "hi");
        assert_eq!(read_string_attribute(&root, "absent").unwrap(), "");
        assert!(write_string_attribute(&root, "note", "again").is_err());
    }

    #[test]
    fn char_buf_attribute() {
        let root = File::memory().root();
        let cb = to_char_buf(&["one", "three"]);
        cb.h5_write_attribute(&root, "names").unwrap();
        let mut back = CharBuf::default();
        back.h5_read_attribute(&root, "names").unwrap();
        assert_eq!(from_char_buf(&back).unwrap(), vec!["one", "three"]);
    }
}
