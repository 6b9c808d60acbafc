//! End-to-end tests of the type codecs and file handles: round trips of
//! every supported type through memory and disk files, open modes,
//! attributes addressed by key, format tags and failure kinds.

use std::collections::{BTreeMap, HashMap};

use rustyh5::{
    read, read_attribute, read_attribute_from_key, read_hdf5_format_from_key, read_into,
    try_read, write, write_attribute, write_attribute_to_key, Complex64, Error, File, FileMode,
    H5Object,
};

// ---------------------------------------------------------------------------
// 1. Round trips through a memory file
// ---------------------------------------------------------------------------

#[test]
fn round_trip_leaf_types() {
    let root = File::memory().root();
    write(&root, "i8", &-3i8).unwrap();
    write(&root, "u16", &65535u16).unwrap();
    write(&root, "f32", &0.25f32).unwrap();
    write(&root, "z", &Complex64::new(-1.0, 0.5)).unwrap();
    write(&root, "t", &true).unwrap();
    write(&root, "s", "a string").unwrap();
    write(&root, "empty", "").unwrap();

    assert_eq!(read::<i8>(&root, "i8").unwrap(), -3);
    assert_eq!(read::<u16>(&root, "u16").unwrap(), 65535);
    assert_eq!(read::<f32>(&root, "f32").unwrap(), 0.25);
    assert_eq!(read::<Complex64>(&root, "z").unwrap(), Complex64::new(-1.0, 0.5));
    assert!(read::<bool>(&root, "t").unwrap());
    assert_eq!(read::<String>(&root, "s").unwrap(), "a string");
    assert_eq!(read::<String>(&root, "empty").unwrap(), "");
}

#[test]
fn round_trip_collections() {
    let root = File::memory().root();

    let v = vec![Complex64::new(1.0, 2.0), Complex64::new(3.0, 4.0)];
    write(&root, "vz", &v).unwrap();
    assert_eq!(read::<Vec<Complex64>>(&root, "vz").unwrap(), v);

    let nested = vec![vec!["a".to_string()], vec![], vec!["b".to_string(), "c".to_string()]];
    write(&root, "nested", &nested).unwrap();
    // ragged rows come back padded to the widest row
    assert_eq!(
        read::<Vec<Vec<String>>>(&root, "nested").unwrap(),
        vec![
            vec!["a".to_string(), String::new()],
            vec![String::new(), String::new()],
            vec!["b".to_string(), "c".to_string()],
        ]
    );

    let arr = [[1i32, 2], [3, 4], [5, 6]];
    write(&root, "arr", &arr).unwrap();
    assert_eq!(read::<[[i32; 2]; 3]>(&root, "arr").unwrap(), arr);

    let mut m: HashMap<(i32, i32), Vec<f64>> = HashMap::new();
    m.insert((0, 1), vec![0.5]);
    m.insert((2, 3), vec![]);
    write(&root, "m", &m).unwrap();
    assert_eq!(read::<HashMap<(i32, i32), Vec<f64>>>(&root, "m").unwrap(), m);

    let t = (Some(1i64), None::<f64>, "x".to_string());
    write(&root, "t", &t).unwrap();
    // the `None` component leaves no child, so the tuple has 2 of 3
    assert!(matches!(
        read::<(Option<i64>, Option<f64>, String)>(&root, "t"),
        Err(Error::ShapeMismatch { .. })
    ));

    let o: Option<Vec<String>> = Some(vec!["k".into()]);
    write(&root, "o", &o).unwrap();
    assert_eq!(read::<Option<Vec<String>>>(&root, "o").unwrap(), o);
}

#[test]
fn empty_collections() {
    let root = File::memory().root();
    write(&root, "v", &Vec::<f64>::new()).unwrap();
    write(&root, "s", &Vec::<String>::new()).unwrap();
    write(&root, "l", &Vec::<Vec<i32>>::new()).unwrap();
    write(&root, "m", &BTreeMap::<String, f64>::new()).unwrap();
    assert!(read::<Vec<f64>>(&root, "v").unwrap().is_empty());
    assert!(read::<Vec<String>>(&root, "s").unwrap().is_empty());
    assert!(read::<Vec<Vec<i32>>>(&root, "l").unwrap().is_empty());
    assert!(read::<BTreeMap<String, f64>>(&root, "m").unwrap().is_empty());
}

#[test]
fn overwrite_replaces() {
    let root = File::memory().root();
    write(&root, "x", &vec![1.0f64, 2.0, 3.0]).unwrap();
    write(&root, "x", "now a string").unwrap();
    assert_eq!(read::<String>(&root, "x").unwrap(), "now a string");
    write(&root, "x", &BTreeMap::from([("k".to_string(), 1i32)])).unwrap();
    assert!(root.has_subgroup("x"));
}

#[test]
fn overwrite_leaves_no_stale_children() {
    let root = File::memory().root();
    let three = BTreeMap::from([
        ("a".to_string(), 1i32),
        ("b".to_string(), 2),
        ("c".to_string(), 3),
    ]);
    write(&root, "m", &three).unwrap();
    write(&root, "m", &BTreeMap::from([("z".to_string(), 9i32)])).unwrap();
    let g = root.open_group("m").unwrap();
    assert_eq!(g.get_all_subgroup_dataset_names(), vec!["z".to_string()]);
    assert_eq!(
        read::<BTreeMap<String, i32>>(&root, "m").unwrap(),
        BTreeMap::from([("z".to_string(), 9)])
    );
}

// ---------------------------------------------------------------------------
// 2. Dispatch helpers
// ---------------------------------------------------------------------------

#[test]
fn try_read_and_read_into() {
    let root = File::memory().root();
    let mut x = 5i32;
    assert!(!try_read(&root, "absent", &mut x).unwrap());
    assert_eq!(x, 5);
    write(&root, "present", &9i32).unwrap();
    assert!(try_read(&root, "present", &mut x).unwrap());
    assert_eq!(x, 9);

    let mut v = vec![0.0f64; 10];
    write(&root, "v", &vec![1.0f64]).unwrap();
    read_into(&root, "v", &mut v).unwrap();
    assert_eq!(v, vec![1.0]);
}

#[test]
fn failure_kinds() {
    let root = File::memory().root();
    assert!(matches!(read::<f64>(&root, "nope"), Err(Error::NotFound { .. })));
    write(&root, "v", &vec![1i32, 2]).unwrap();
    assert!(matches!(read::<i32>(&root, "v"), Err(Error::RankMismatch { .. })));
    assert!(matches!(read::<[i32; 3]>(&root, "v"), Err(Error::ShapeMismatch { .. })));
    write(&root, "s", "text").unwrap();
    assert!(matches!(read::<f64>(&root, "s"), Err(Error::TypeClassMismatch { .. })));
    let m = BTreeMap::from([("a".to_string(), 1i32)]);
    write(&root, "m", &m).unwrap();
    assert!(matches!(
        read::<(i32, i32)>(&root, "m"),
        Err(Error::ShapeMismatch { .. })
    ));
}

// ---------------------------------------------------------------------------
// 3. Attributes and format tags
// ---------------------------------------------------------------------------

#[test]
fn attributes_by_key() {
    let root = File::memory().root();
    write(&root, "data", &vec![1.0f64, 2.0]).unwrap();
    write_attribute_to_key(&root, "data", "units", "eV").unwrap();
    write_attribute_to_key(&root, "data", "scale", &2.0f64).unwrap();
    assert_eq!(read_attribute_from_key::<String>(&root, "data", "units").unwrap(), "eV");
    assert_eq!(read_attribute_from_key::<f64>(&root, "data", "scale").unwrap(), 2.0);
    assert_eq!(read_attribute_from_key::<String>(&root, "data", "none").unwrap(), "");

    let ds = root.open_dataset("data").unwrap();
    assert_eq!(ds.attribute_names(), vec!["scale", "units"]);
    assert!(matches!(
        write_attribute(&ds, "units", "meV"),
        Err(Error::AlreadyExists { .. })
    ));
    let labels = vec!["up".to_string(), "down".to_string()];
    write_attribute(&root, "labels", &labels).unwrap();
    assert_eq!(read_attribute::<Vec<String>>(&root, "labels").unwrap(), labels);
}

#[test]
fn format_tags_written() {
    let root = File::memory().root();
    write(&root, "list", &vec![vec![1i32]]).unwrap();
    write(&root, "dict", &BTreeMap::from([("a".to_string(), 1i32)])).unwrap();
    write(&root, "pair", &(1i32, 2i32)).unwrap();
    write(&root, "arr", &[vec![1i32], vec![1i32]]).unwrap();
    assert_eq!(read_hdf5_format_from_key(&root, "list").unwrap(), "List");
    assert_eq!(read_hdf5_format_from_key(&root, "dict").unwrap(), "Dict");
    assert_eq!(read_hdf5_format_from_key(&root, "pair").unwrap(), "PythonTupleWrap");
    assert_eq!(read_hdf5_format_from_key(&root, "arr").unwrap(), "");
}

// ---------------------------------------------------------------------------
// 4. Files on disk
// ---------------------------------------------------------------------------

#[test]
fn disk_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.h5");
    {
        let f = File::open(&path, FileMode::Write).unwrap();
        let g = f.root().create_group("results", true).unwrap();
        write(&g, "energy", &-1.25f64).unwrap();
        write(&g, "labels", &vec!["a".to_string(), "b".to_string()]).unwrap();
    }
    let f = File::open(&path, FileMode::Read).unwrap();
    let g = f.root().open_group("results").unwrap();
    assert_eq!(read::<f64>(&g, "energy").unwrap(), -1.25);
    assert_eq!(read::<Vec<String>>(&g, "labels").unwrap(), vec!["a", "b"]);
    assert!(matches!(write(&g, "x", &1i32), Err(Error::ReadOnly { .. })));
}

#[test]
fn open_modes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("modes.h5");

    assert!(matches!(File::open(&path, FileMode::Read), Err(Error::Io { .. })));

    let f = File::open_with(&path, 'e').unwrap();
    write(&f.root(), "a", &1i32).unwrap();
    drop(f);
    assert!(matches!(
        File::open(&path, FileMode::Exclusive),
        Err(Error::AlreadyExists { .. })
    ));

    let f = File::open(&path, FileMode::Append).unwrap();
    assert_eq!(read::<i32>(&f.root(), "a").unwrap(), 1);
    write(&f.root(), "b", &2i32).unwrap();
    f.flush().unwrap();
    drop(f);

    let f = File::open(&path, FileMode::Write).unwrap();
    assert!(!f.root().has_key("a"));
    drop(f);

    assert!(matches!(File::open_with(&path, 'x'), Err(Error::InvalidMode('x'))));
}

#[test]
fn memory_image_matches_disk() {
    let mem = File::memory();
    write(&mem.root(), "v", &vec![1u32, 2, 3]).unwrap();
    let image = mem.as_buffer().unwrap();
    assert_eq!(mem.name(), "MemoryBuffer");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("image.h5");
    std::fs::write(&path, &image).unwrap();
    let disk = File::open(&path, FileMode::Read).unwrap();
    assert_eq!(read::<Vec<u32>>(&disk.root(), "v").unwrap(), vec![1, 2, 3]);
    assert_eq!(disk.as_buffer().unwrap(), image);

    let copy = File::from_buffer(&image).unwrap();
    assert_eq!(read::<Vec<u32>>(&copy.root(), "v").unwrap(), vec![1, 2, 3]);
}

#[test]
fn handles_share_one_file() {
    let f = File::memory();
    let g = f.root().create_group("g", true).unwrap();
    assert!(f.handle_count() >= 2);
    write(&g, "x", &1i32).unwrap();
    assert_eq!(read::<i32>(&f.root(), "g/x").unwrap(), 1);
    let alias = f.clone();
    alias.root().create_softlink("g", "h", true).unwrap();
    assert_eq!(read::<i32>(&f.root(), "h/x").unwrap(), 1);
}

#[test]
fn serialize_facade() {
    let value = (vec![1.5f64, 2.5], BTreeMap::from([("n".to_string(), 3i64)]));
    let buf = rustyh5::serialize(&value).unwrap();
    let back: (Vec<f64>, BTreeMap<String, i64>) = rustyh5::deserialize(&buf).unwrap();
    assert_eq!(back, value);
}
