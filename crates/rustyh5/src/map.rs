//! Map codec for `BTreeMap` and `HashMap`, tagged `Dict`.
//!
//! With string keys every value is stored under its key. Other keys give
//! one subgroup per entry, `"0"`, `"1"`, ..., holding `key` and `val`.

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use crate::element::H5Element;
use crate::error::Result;
use crate::format::{write_hdf5_format_as_string, H5Format};
use crate::generic::{H5Construct, H5Read, H5Write};
use crate::group::Group;

pub const DICT_FORMAT: &str = "Dict";

fn write_entries<'a, K, V>(
    entries: impl Iterator<Item = (&'a K, &'a V)>,
    g: &Group,
    name: &str,
) -> Result<()>
where
    K: H5Element + 'a,
    V: H5Write + 'a,
{
    let gr = g.create_group(name, true)?;
    write_hdf5_format_as_string(&gr, DICT_FORMAT)?;
    for (idx, (k, v)) in entries.enumerate() {
        if let (true, Some(key)) = (K::NAMED_KEY, k.key_name()) {
            v.h5_write(&gr, &key)?;
        } else {
            let entry = gr.create_group(&idx.to_string(), true)?;
            k.h5_write(&entry, "key")?;
            v.h5_write(&entry, "val")?;
        }
    }
    Ok(())
}

fn read_entries<K, V>(g: &Group, name: &str) -> Result<Vec<(K, V)>>
where
    K: H5Element,
    V: H5Construct,
{
    let gr = g.open_group(name)?;
    let mut out = Vec::new();
    for child in gr.get_all_subgroup_dataset_names() {
        if K::NAMED_KEY {
            if let Some(k) = K::from_key_name(&child) {
                out.push((k, V::h5_construct(&gr, &child)?));
                continue;
            }
        }
        let entry = gr.open_group(&child)?;
        out.push((K::h5_construct(&entry, "key")?, V::h5_construct(&entry, "val")?));
    }
    Ok(out)
}

impl<K: H5Element + Ord, V: H5Write> H5Write for BTreeMap<K, V> {
    fn h5_write(&self, g: &Group, name: &str) -> Result<()> {
        write_entries(self.iter(), g, name)
    }
}

impl<K: H5Element + Ord, V: H5Construct> H5Read for BTreeMap<K, V> {
    fn h5_read(&mut self, g: &Group, name: &str) -> Result<()> {
        self.clear();
        self.extend(read_entries(g, name)?);
        Ok(())
    }
}

impl<K, V> H5Format for BTreeMap<K, V> {
    fn hdf5_format() -> String {
        DICT_FORMAT.to_string()
    }
}

impl<K, V> H5Element for BTreeMap<K, V>
where
    K: H5Element + Ord,
    V: H5Write + H5Construct,
{
}

impl<K, V, S> H5Write for HashMap<K, V, S>
where
    K: H5Element + Eq + Hash,
    V: H5Write,
{
    fn h5_write(&self, g: &Group, name: &str) -> Result<()> {
        write_entries(self.iter(), g, name)
    }
}

impl<K, V, S> H5Read for HashMap<K, V, S>
where
    K: H5Element + Eq + Hash,
    V: H5Construct,
    S: BuildHasher,
{
    fn h5_read(&mut self, g: &Group, name: &str) -> Result<()> {
        self.clear();
        self.extend(read_entries(g, name)?);
        Ok(())
    }
}

impl<K, V, S> H5Format for HashMap<K, V, S> {
    fn hdf5_format() -> String {
        DICT_FORMAT.to_string()
    }
}

impl<K, V, S> H5Element for HashMap<K, V, S>
where
    K: H5Element + Eq + Hash,
    V: H5Write + H5Construct,
    S: BuildHasher + Default,
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::File;
    use crate::format::read_hdf5_format_from_key;
    use crate::generic::{read, write};

    #[test]
    fn string_keys_name_children() {
        let root = File::memory().root();
        let mut m = BTreeMap::new();
        m.insert("alpha".to_string(), 1.5f64);
        m.insert("beta".to_string(), -2.0);
        write(&root, "m", &m).unwrap();
        let gr = root.open_group("m").unwrap();
        assert_eq!(gr.get_all_dataset_names(), vec!["alpha", "beta"]);
        assert_eq!(read_hdf5_format_from_key(&root, "m").unwrap(), "Dict");
        assert_eq!(read::<BTreeMap<String, f64>>(&root, "m").unwrap(), m);
    }

    #[test]
    fn other_keys_use_entry_groups() {
        let root = File::memory().root();
        let m: BTreeMap<i32, String> = [(3, "three".to_string()), (-1, "minus".to_string())]
            .into_iter()
            .collect();
        write(&root, "m", &m).unwrap();
        let gr = root.open_group("m").unwrap();
        assert_eq!(gr.get_all_subgroup_names(), vec!["0", "1"]);
        let first = gr.open_group("0").unwrap();
        assert_eq!(read::<i32>(&first, "key").unwrap(), -1);
        assert_eq!(read::<BTreeMap<i32, String>>(&root, "m").unwrap(), m);
    }

    #[test]
    fn hash_map_and_empty_map() {
        let root = File::memory().root();
        let mut m = HashMap::new();
        m.insert("k".to_string(), vec![1u8, 2]);
        write(&root, "h", &m).unwrap();
        assert_eq!(read::<HashMap<String, Vec<u8>>>(&root, "h").unwrap(), m);
        let empty: BTreeMap<String, i32> = BTreeMap::new();
        write(&root, "e", &empty).unwrap();
        assert!(read::<BTreeMap<String, i32>>(&root, "e").unwrap().is_empty());
    }

    #[test]
    fn nested_maps() {
        let root = File::memory().root();
        let mut inner = BTreeMap::new();
        inner.insert("x".to_string(), 1i64);
        let mut outer = BTreeMap::new();
        outer.insert("in".to_string(), inner);
        write(&root, "o", &outer).unwrap();
        assert_eq!(read::<BTreeMap<String, BTreeMap<String, i64>>>(&root, "o").unwrap(), outer);
    }
}
