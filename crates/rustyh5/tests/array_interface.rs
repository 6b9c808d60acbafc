//! Integration tests for the array interface: strided views, hyperslab
//! sub-selections, compression and the parent-shape reconstruction.

use rustyh5::array_interface::{
    self, get_parent_shape_and_h5_strides, ArrayMut, ArrayRef, COMPLEX_ATTRIBUTE,
};
use rustyh5::{read, write, Complex64, Error, File, H5Object, Hyperslab};

fn strided_slab(offset: u64, stride: u64, count: u64, block: u64) -> Hyperslab {
    Hyperslab {
        offset: vec![offset],
        stride: vec![stride],
        count: vec![count],
        block: vec![block],
    }
}

// ---------------------------------------------------------------------------
// 1. Sub-selection equivalence
// ---------------------------------------------------------------------------

#[test]
fn strided_read_equals_standalone_write() {
    let root = File::memory().root();
    let full: Vec<i64> = (0..100).collect();
    write(&root, "full", &full).unwrap();

    let slab = strided_slab(10, 20, 5, 10);
    let mut picked = vec![0i64; 50];
    array_interface::read(
        &root,
        "full",
        &mut ArrayMut::from_slice_mut(&mut picked, &[50]),
        Some(&slab),
    )
    .unwrap();

    let expected: Vec<i64> = (0..5).flat_map(|k| 10 + 20 * k..20 + 20 * k).collect();
    assert_eq!(picked, expected);

    write(&root, "part", &picked).unwrap();
    assert_eq!(read::<Vec<i64>>(&root, "part").unwrap(), picked);
}

#[test]
fn slab_outside_dataset_rejected() {
    let root = File::memory().root();
    write(&root, "v", &vec![0f64; 10]).unwrap();
    let mut out = vec![0f64; 4];
    let err = array_interface::read(
        &root,
        "v",
        &mut ArrayMut::from_slice_mut(&mut out, &[4]),
        Some(&strided_slab(8, 1, 4, 1)),
    );
    assert!(matches!(err, Err(Error::IncompatibleSelection { .. })));
}

#[test]
fn slab_count_must_match_view() {
    let root = File::memory().root();
    write(&root, "v", &vec![0f64; 10]).unwrap();
    let mut out = vec![0f64; 3];
    let err = array_interface::read(
        &root,
        "v",
        &mut ArrayMut::from_slice_mut(&mut out, &[3]),
        Some(&strided_slab(0, 2, 4, 1)),
    );
    assert!(matches!(err, Err(Error::IncompatibleSelection { .. })));
}

// ---------------------------------------------------------------------------
// 2. Strided memory views
// ---------------------------------------------------------------------------

#[test]
fn strided_view_write_and_read() {
    let root = File::memory().root();
    // every second column of the first five rows of a 10 x 10 matrix
    let matrix: Vec<f64> = (0..100).map(f64::from).collect();
    let view = ArrayRef::from_strided(&matrix, &[5, 5], &[20, 2]).unwrap();
    array_interface::write(&root, "sub", &view, false).unwrap();

    let mut dense = vec![0f64; 25];
    array_interface::read(&root, "sub", &mut ArrayMut::from_slice_mut(&mut dense, &[5, 5]), None)
        .unwrap();
    let expected: Vec<f64> = (0..5)
        .flat_map(|i| (0..5).map(move |j| f64::from(20 * i + 2 * j)))
        .collect();
    assert_eq!(dense, expected);

    // scatter back into a strided view of a fresh buffer
    let mut target = vec![-1f64; 100];
    array_interface::read(
        &root,
        "sub",
        &mut ArrayMut::from_strided_mut(&mut target, &[5, 5], &[20, 2]).unwrap(),
        None,
    )
    .unwrap();
    for i in 0..5usize {
        for j in 0..5usize {
            assert_eq!(target[20 * i + 2 * j], (20 * i + 2 * j) as f64);
            assert_eq!(target[20 * i + 2 * j + 1], -1.0);
        }
    }
}

#[test]
fn write_slice_into_existing_dataset() {
    let root = File::memory().root();
    write(&root, "v", &vec![0i32; 8]).unwrap();
    let patch = [7i32, 8, 9];
    array_interface::write_slice(
        &root,
        "v",
        &ArrayRef::from_slice(&patch, &[3]),
        &strided_slab(1, 3, 3, 1),
    )
    .unwrap();
    assert_eq!(read::<Vec<i32>>(&root, "v").unwrap(), vec![0, 7, 0, 0, 8, 0, 0, 9]);

    // an empty slab is a no-op
    array_interface::write_slice(&root, "v", &ArrayRef::from_slice(&patch, &[3]), &Hyperslab::default())
        .unwrap();

    let wrong = [1.0f64, 2.0, 3.0];
    assert!(matches!(
        array_interface::write_slice(&root, "v", &ArrayRef::from_slice(&wrong, &[3]), &strided_slab(0, 1, 3, 1)),
        Err(Error::TypeClassMismatch { .. })
    ));
}

// ---------------------------------------------------------------------------
// 3. Complex arrays and compression
// ---------------------------------------------------------------------------

#[test]
fn complex_arrays_carry_marker() {
    let root = File::memory().root();
    let z: Vec<Complex64> = (0..4).map(|k| Complex64::new(k as f64, -(k as f64))).collect();
    array_interface::write(&root, "z", &ArrayRef::from_slice(&z, &[2, 2]), true).unwrap();
    let info = array_interface::get_dataset_info(&root, "z").unwrap();
    assert_eq!(info.lengths, vec![2, 2, 2]);
    assert!(info.has_complex_attribute);
    assert!(root.open_dataset("z").unwrap().has_attribute(COMPLEX_ATTRIBUTE));

    let mut back = vec![Complex64::default(); 4];
    array_interface::read(&root, "z", &mut ArrayMut::from_slice_mut(&mut back, &[2, 2]), None)
        .unwrap();
    assert_eq!(back, z);
}

#[test]
fn compression_shrinks_regular_data() {
    let root = File::memory().root();
    let v = vec![1.0f64; 4096];
    array_interface::write(&root, "packed", &ArrayRef::from_slice(&v, &[4096]), true).unwrap();
    array_interface::write(&root, "plain", &ArrayRef::from_slice(&v, &[4096]), false).unwrap();
    let packed = root.open_dataset("packed").unwrap();
    let plain = root.open_dataset("plain").unwrap();
    assert!(packed.is_chunked().unwrap());
    assert!(!plain.is_chunked().unwrap());
    assert!(packed.stored_bytes().unwrap() < plain.stored_bytes().unwrap());
    assert_eq!(read::<Vec<f64>>(&root, "packed").unwrap(), v);
}

#[test]
fn chunk_ceiling_clamps_leading_dimension() {
    let root = File::memory().root();
    let m: Vec<f64> = (0..3000).map(f64::from).collect();
    // 240 bytes hold one whole row of 3 doubles ten times over
    array_interface::write_compressed(&root, "m", &ArrayRef::from_slice(&m, &[1000, 3]), 240)
        .unwrap();
    let ds = root.open_dataset("m").unwrap();
    assert_eq!(ds.chunk_dims().unwrap(), Some(vec![10, 3]));

    let mut back = vec![0f64; 3000];
    array_interface::read(&root, "m", &mut ArrayMut::from_slice_mut(&mut back, &[1000, 3]), None)
        .unwrap();
    assert_eq!(back, m);

    let mut tail = vec![0f64; 6];
    array_interface::read(
        &root,
        "m",
        &mut ArrayMut::from_slice_mut(&mut tail, &[6]),
        Some(&Hyperslab::slice(&[998..1000, 0..3])),
    )
    .unwrap();
    assert_eq!(tail, vec![2994.0, 2995.0, 2996.0, 2997.0, 2998.0, 2999.0]);
}

#[test]
fn strides_of_the_wrong_rank_rejected() {
    let data = [0f64; 10];
    assert!(matches!(
        ArrayRef::from_strided(&data, &[2, 2], &[1]),
        Err(Error::InvalidStrides { .. })
    ));
}

// ---------------------------------------------------------------------------
// 4. Parent shape reconstruction
// ---------------------------------------------------------------------------

fn check(strides: &[u64], shape: &[u64]) {
    let size: u64 = shape.iter().product();
    let (parent, h5) = get_parent_shape_and_h5_strides(strides, size);
    assert_eq!(parent.len(), strides.len());
    for d in (0..strides.len()).rev() {
        let tail: u64 = parent[d + 1..].iter().product();
        assert_eq!(strides[d], h5[d] * tail, "strides {strides:?} dim {d}");
        if d > 0 {
            assert!(parent[d] >= shape[d] * h5[d], "strides {strides:?} dim {d}");
        }
    }
    // the slowest dimension only has to hold the whole view
    assert!(parent[0] >= shape[0]);
}

#[test]
fn reconstruction_identity() {
    check(&[1], &[7]);
    check(&[3], &[4]);
    check(&[20, 2], &[5, 5]);
    check(&[10, 1], &[3, 10]);
    check(&[6, 2], &[4, 3]);
    check(&[200, 20, 2], &[5, 5, 5]);
    check(&[12, 4, 1], &[2, 3, 4]);
    check(&[30, 3, 1], &[2, 10, 3]);
}

#[test]
fn reconstruction_of_empty_views() {
    for rank in 1..4 {
        let strides = vec![3u64; rank];
        assert_eq!(
            get_parent_shape_and_h5_strides(&strides, 0),
            (vec![0; rank], vec![1; rank])
        );
    }
}

#[test]
fn strided_views_round_trip_for_all_ranks() {
    let root = File::memory().root();
    let data: Vec<i32> = (0..1000).collect();
    let cases: [(&[u64], &[u64]); 3] = [
        (&[4], &[3]),
        (&[5, 6], &[40, 2]),
        (&[4, 5, 5], &[200, 20, 2]),
    ];
    for (k, (shape, strides)) in cases.iter().enumerate() {
        let name = format!("v{k}");
        let view = ArrayRef::from_strided(&data, shape, strides).unwrap();
        array_interface::write(&root, &name, &view, false).unwrap();
        let n: u64 = shape.iter().product();
        let mut out = vec![0i32; n as usize];
        array_interface::read(&root, &name, &mut ArrayMut::from_slice_mut(&mut out, shape), None)
            .unwrap();
        let mut expected = Vec::new();
        let mut idx = vec![0u64; shape.len()];
        for _ in 0..n {
            let off: u64 = idx.iter().zip(strides.iter()).map(|(i, s)| i * s).sum();
            expected.push(data[off as usize]);
            for d in (0..shape.len()).rev() {
                idx[d] += 1;
                if idx[d] < shape[d] {
                    break;
                }
                idx[d] = 0;
            }
        }
        assert_eq!(out, expected, "case {k}");
    }
}
