//! Type-erased transfer of strided n-dimensional memory to and from datasets.
//!
//! An [`ArrayView`] pairs raw element bytes with a datatype, the shape of
//! the parent array the bytes belong to, and a [`Hyperslab`] selecting the
//! view's elements inside that parent. Complex numbers are handled by
//! viewing them as their real element type with a trailing dimension of 2;
//! datasets written that way carry a `__complex__` attribute.
//!
//! All element codecs for numeric arrays funnel through [`write`],
//! [`write_slice`], [`read`], [`write_attribute`] and [`read_attribute`].

use rustyh5_format::convert::{convert, swap_to_little_endian};
use rustyh5_format::selection::{linear_index, row_major_pitch};
use rustyh5_format::{Attribute, DatasetCreateProps, Datatype, Hyperslab, Selection};

use crate::error::{Error, Result};
use crate::group::{Group, H5Object};
use crate::types::H5Scalar;

/// Name of the attribute marking complex-valued datasets.
pub const COMPLEX_ATTRIBUTE: &str = "__complex__";

/// Largest chunk, in bytes, a compressed dataset may use.
pub const MAX_CHUNK_BYTES: u64 = (1 << 32) - 1;

/// Deflate level used for compressed datasets.
pub const DEFLATE_LEVEL: u32 = 1;

/// Stored shape and element type of a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetInfo {
    /// Extent of every dimension, including a trailing complex dimension.
    pub lengths: Vec<u64>,
    pub datatype: Datatype,
    pub has_complex_attribute: bool,
}

impl DatasetInfo {
    pub fn rank(&self) -> usize {
        self.lengths.len()
    }
}

/// Raw elements plus their layout inside a parent array.
///
/// `D` is `&[u8]` for writes and `&mut [u8]` for reads; see [`ArrayRef`]
/// and [`ArrayMut`].
#[derive(Debug)]
pub struct ArrayView<D> {
    pub datatype: Datatype,
    pub data: D,
    /// Shape of the parent array, including the complex dimension.
    pub parent_shape: Vec<u64>,
    /// Selection of the view inside the parent array.
    pub slab: Hyperslab,
    pub is_complex: bool,
}

pub type ArrayRef<'a> = ArrayView<&'a [u8]>;
pub type ArrayMut<'a> = ArrayView<&'a mut [u8]>;

impl<D> ArrayView<D> {
    /// A view of logical rank `rank` with zero counts, to be filled in by
    /// the caller.
    pub fn new(datatype: Datatype, data: D, rank: usize, is_complex: bool) -> Self {
        let mut parent_shape = vec![0; rank];
        if is_complex {
            parent_shape.push(2);
        }
        Self {
            datatype,
            data,
            parent_shape,
            slab: Hyperslab::new(rank, is_complex),
            is_complex,
        }
    }

    /// A view of the whole of a contiguous row-major array of `shape`.
    pub fn contiguous(datatype: Datatype, data: D, shape: &[u64], is_complex: bool) -> Self {
        let mut v = Self::new(datatype, data, shape.len(), is_complex);
        v.slab.count[..shape.len()].copy_from_slice(shape);
        v.parent_shape[..shape.len()].copy_from_slice(shape);
        v
    }

    /// A view of `shape` whose elements are `strides` elements apart in
    /// memory, starting at the first element of `data`. There must be one
    /// stride per dimension.
    pub fn strided(
        datatype: Datatype,
        data: D,
        shape: &[u64],
        strides: &[u64],
        is_complex: bool,
    ) -> Result<Self> {
        if strides.len() != shape.len() {
            return Err(Error::InvalidStrides {
                shape: shape.to_vec(),
                strides: strides.to_vec(),
            });
        }
        let mut v = Self::new(datatype, data, shape.len(), is_complex);
        let size = shape.iter().product();
        let (parent, h5_strides) = get_parent_shape_and_h5_strides(strides, size);
        v.slab.count[..shape.len()].copy_from_slice(shape);
        v.slab.stride[..shape.len()].copy_from_slice(&h5_strides);
        v.parent_shape[..shape.len()].copy_from_slice(&parent);
        Ok(v)
    }

    /// Logical rank, excluding the complex dimension.
    pub fn rank(&self) -> usize {
        self.slab.rank() - usize::from(self.is_complex)
    }

    /// Logical shape of the view.
    pub fn shape(&self) -> Vec<u64> {
        let mut s = self.slab.shape();
        s.truncate(self.rank());
        s
    }

    fn element_size(&self) -> usize {
        self.datatype.size()
    }

    /// Check the memory selection and return its row-major pitch.
    fn memory_layout(&self, len: usize, op: &'static str, key: &str, group: &str) -> Result<Vec<u64>> {
        let bad = |reason: String| selection_error(op, key, group, reason);
        self.slab.validate().map_err(|e| bad(e.to_string()))?;
        if self.parent_shape.len() != self.slab.rank() {
            return Err(bad(format!(
                "parent shape {:?} does not match slab rank {}",
                self.parent_shape,
                self.slab.rank()
            )));
        }
        let pitch = row_major_pitch(&self.parent_shape);
        if self.slab.size() > 0 {
            let last: u64 = (0..self.slab.rank())
                .map(|d| (self.slab.extent(d) - 1) * pitch[d])
                .sum();
            let need = (last as usize + 1) * self.element_size();
            if need > len {
                return Err(bad(format!(
                    "view reaches byte {need} of a {len}-byte buffer"
                )));
            }
        }
        Ok(pitch)
    }
}

impl<D: AsRef<[u8]>> ArrayView<D> {
    /// Pack the selected elements in row-major order, little-endian.
    /// `op`, `key` and `group` name the transfer in errors.
    pub fn gather(&self, op: &'static str, key: &str, group: &str) -> Result<Vec<u8>> {
        let data = self.data.as_ref();
        let pitch = self.memory_layout(data.len(), op, key, group)?;
        let esize = self.element_size();
        let mut out = Vec::with_capacity(self.slab.size() as usize * esize);
        let outside = |o: usize| selection_error(op, key, group, format!("byte {o} is outside the view"));
        self.slab.for_each_coord(|c| {
            let o = linear_index(c, &pitch) as usize * esize;
            let e = data.get(o..o + esize).ok_or_else(|| outside(o))?;
            out.extend_from_slice(e);
            Ok::<(), Error>(())
        })?;
        swap_to_little_endian(&mut out, &self.datatype);
        Ok(out)
    }
}

impl<D: AsMut<[u8]>> ArrayView<D> {
    /// Unpack little-endian elements in row-major order into the selection.
    pub fn scatter(
        &mut self,
        mut packed: Vec<u8>,
        op: &'static str,
        key: &str,
        group: &str,
    ) -> Result<()> {
        let len = self.data.as_mut().len();
        let pitch = self.memory_layout(len, op, key, group)?;
        let esize = self.element_size();
        if packed.len() != self.slab.size() as usize * esize {
            return Err(selection_error(
                op,
                key,
                group,
                format!("{} bytes for {} selected elements", packed.len(), self.slab.size()),
            ));
        }
        swap_to_little_endian(&mut packed, &self.datatype);
        let data = self.data.as_mut();
        let mut src = packed.chunks_exact(esize.max(1));
        let outside = |o: usize| selection_error(op, key, group, format!("byte {o} is outside the view"));
        self.slab.for_each_coord(|c| {
            let o = linear_index(c, &pitch) as usize * esize;
            let dst = data.get_mut(o..o + esize).ok_or_else(|| outside(o))?;
            if let Some(e) = src.next() {
                dst.copy_from_slice(e);
            }
            Ok::<(), Error>(())
        })
    }
}

impl<'a> ArrayRef<'a> {
    /// Contiguous view of a typed slice.
    pub fn from_slice<T: H5Scalar>(data: &'a [T], shape: &[u64]) -> Self {
        Self::contiguous(T::element_type(), bytemuck::cast_slice(data), shape, T::IS_COMPLEX)
    }

    /// Strided view of a typed slice; strides count elements of `T`.
    pub fn from_strided<T: H5Scalar>(data: &'a [T], shape: &[u64], strides: &[u64]) -> Result<Self> {
        Self::strided(
            T::element_type(),
            bytemuck::cast_slice(data),
            shape,
            strides,
            T::IS_COMPLEX,
        )
    }

    /// Rank-0 view of a single value.
    pub fn scalar<T: H5Scalar>(x: &'a T) -> Self {
        Self::contiguous(
            T::element_type(),
            bytemuck::bytes_of(x),
            &[],
            T::IS_COMPLEX,
        )
    }
}

impl<'a> ArrayMut<'a> {
    pub fn from_slice_mut<T: H5Scalar>(data: &'a mut [T], shape: &[u64]) -> Self {
        Self::contiguous(
            T::element_type(),
            bytemuck::cast_slice_mut(data),
            shape,
            T::IS_COMPLEX,
        )
    }

    pub fn from_strided_mut<T: H5Scalar>(
        data: &'a mut [T],
        shape: &[u64],
        strides: &[u64],
    ) -> Result<Self> {
        Self::strided(
            T::element_type(),
            bytemuck::cast_slice_mut(data),
            shape,
            strides,
            T::IS_COMPLEX,
        )
    }

    pub fn scalar_mut<T: H5Scalar>(x: &'a mut T) -> Self {
        Self::contiguous(
            T::element_type(),
            bytemuck::bytes_of_mut(x),
            &[],
            T::IS_COMPLEX,
        )
    }
}

fn selection_error(op: &'static str, key: &str, group: &str, reason: String) -> Error {
    Error::IncompatibleSelection {
        op,
        key: key.to_string(),
        group: group.to_string(),
        reason,
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Recover a parent shape and per-dimension slab strides from element
/// strides, such that the view's elements sit where the strides say.
///
/// Returns empty vectors for rank 0 and `(zeros, ones)` for an empty view.
/// Otherwise `parent[0] = view_size`, and walking `u` from `rank - 2` down
/// to 0 the gcd `L` of `strides[0..=u]` divides those strides and becomes
/// `parent[u + 1]`. For every `d`, `np_strides[d] == h5_strides[d] *
/// product(parent[d + 1..])`.
pub fn get_parent_shape_and_h5_strides(np_strides: &[u64], view_size: u64) -> (Vec<u64>, Vec<u64>) {
    let rank = np_strides.len();
    if rank == 0 {
        return (Vec::new(), Vec::new());
    }
    if view_size == 0 {
        return (vec![0; rank], vec![1; rank]);
    }
    let mut h5_strides = np_strides.to_vec();
    let mut parent = vec![0u64; rank];
    parent[0] = view_size;
    for u in (0..rank - 1).rev() {
        let l = h5_strides[..=u].iter().fold(0, |acc, &s| gcd(acc, s)).max(1);
        for s in &mut h5_strides[..=u] {
            *s /= l;
        }
        parent[u + 1] = l;
    }
    (parent, h5_strides)
}

/// Chunk shape for a compressed dataset of `count` elements of
/// `element_size` bytes: dimensions are taken whole from the innermost
/// outwards, clamped so the chunk stays within [`MAX_CHUNK_BYTES`].
pub fn chunk_dims(count: &[u64], element_size: u64) -> Vec<u64> {
    chunk_dims_within(count, element_size, MAX_CHUNK_BYTES)
}

/// [`chunk_dims`] with an explicit byte ceiling. A single element is
/// never split, whatever the ceiling.
pub fn chunk_dims_within(count: &[u64], element_size: u64, max_bytes: u64) -> Vec<u64> {
    let mut chunk = vec![1u64; count.len()];
    let mut size = element_size.max(1);
    for i in (0..count.len()).rev() {
        let max_dim = (max_bytes / size).max(1);
        chunk[i] = count[i].clamp(1, max_dim);
        size = size.saturating_mul(chunk[i]);
    }
    chunk
}

/// Shape, datatype and complex marker of dataset `name` in `g`.
pub fn get_dataset_info(g: &Group, name: &str) -> Result<DatasetInfo> {
    let ds = g.open_dataset(name)?;
    Ok(DatasetInfo {
        lengths: ds.shape()?,
        datatype: ds.datatype()?,
        has_complex_attribute: ds.has_attribute(COMPLEX_ATTRIBUTE),
    })
}

fn complex_marker() -> Attribute {
    Attribute {
        datatype: Datatype::Bool,
        shape: Vec::new(),
        data: vec![1],
    }
}

/// Create dataset `name` (replacing any existing link) shaped like the
/// view's slab and fill it from the view. With `compress`, the dataset is
/// chunked per [`chunk_dims`] and deflated.
pub fn write(g: &Group, name: &str, v: &ArrayRef<'_>, compress: bool) -> Result<()> {
    write_chunked(g, name, v, compress.then_some(MAX_CHUNK_BYTES))
}

/// Compressed [`write`] whose chunks hold at most `max_chunk_bytes`.
pub fn write_compressed(g: &Group, name: &str, v: &ArrayRef<'_>, max_chunk_bytes: u64) -> Result<()> {
    write_chunked(g, name, v, Some(max_chunk_bytes))
}

fn write_chunked(g: &Group, name: &str, v: &ArrayRef<'_>, max_chunk_bytes: Option<u64>) -> Result<()> {
    let shape = v.slab.shape();
    let packed = v.gather("write", name, &g.name())?;
    let mut props = DatasetCreateProps::new();
    if let Some(limit) = max_chunk_bytes.filter(|_| !shape.is_empty()) {
        props = props.chunk(&chunk_dims_within(&shape, v.element_size() as u64, limit));
        #[cfg(feature = "deflate")]
        {
            props = props.deflate(DEFLATE_LEVEL);
        }
    }
    let ds = g.create_dataset(name, v.datatype.clone(), &shape, &props)?;
    if !packed.is_empty() {
        ds.write_raw(&Selection::All, &packed)?;
    }
    if v.is_complex {
        ds.create_attribute(COMPLEX_ATTRIBUTE, complex_marker())?;
    }
    log::debug!(
        "wrote {name} {shape:?} {} in {} (chunks {:?})",
        v.datatype,
        g.name(),
        props.chunk_dims
    );
    Ok(())
}

/// Write the view into the `slab` region of the existing dataset `name`.
/// An empty slab is a no-op.
pub fn write_slice(g: &Group, name: &str, v: &ArrayRef<'_>, slab: &Hyperslab) -> Result<()> {
    if slab.is_empty() {
        return Ok(());
    }
    let ds = g.open_dataset(name)?;
    let stored = ds.datatype()?;
    if v.slab.size() != slab.size() {
        return Err(selection_error(
            "write_slice",
            name,
            &g.name(),
            format!("memory selects {} elements, file slab {}", v.slab.size(), slab.size()),
        ));
    }
    if !v.datatype.type_equal(&stored) {
        return Err(Error::TypeClassMismatch {
            op: "write_slice",
            key: name.to_string(),
            group: g.name(),
            expected: stored.name(),
            found: v.datatype.name(),
        });
    }
    slab.check_within(&ds.shape()?)
        .map_err(|e| selection_error("write_slice", name, &g.name(), e.to_string()))?;
    if slab.size() == 0 {
        return Ok(());
    }
    let packed = convert(&v.gather("write_slice", name, &g.name())?, &v.datatype, &stored)?;
    ds.write_raw(&Selection::Hyperslab(slab.clone()), &packed)
}

/// Read dataset `name` into the view, or only the `slab` region of it.
///
/// Element types must belong to the same class; a differing type of the
/// same class is converted with a warning. Without a slab the stored
/// shape must equal the view's.
pub fn read(g: &Group, name: &str, v: &mut ArrayMut<'_>, slab: Option<&Hyperslab>) -> Result<()> {
    let info = get_dataset_info(g, name)?;
    let ds = g.open_dataset(name)?;

    if v.datatype.class() != info.datatype.class() {
        return Err(Error::TypeClassMismatch {
            op: "read",
            key: name.to_string(),
            group: g.name(),
            expected: v.datatype.name(),
            found: info.datatype.name(),
        });
    }
    if !v.datatype.type_equal(&info.datatype) {
        log::warn!(
            "type mismatch reading {name} in {}: {} != {}",
            g.name(),
            v.datatype.name(),
            info.datatype.name()
        );
    }

    let file_slab = match slab {
        Some(s) => {
            s.check_within(&info.lengths)
                .map_err(|e| selection_error("read", name, &g.name(), e.to_string()))?;
            if s.size() != v.slab.size() {
                return Err(selection_error(
                    "read",
                    name,
                    &g.name(),
                    format!("file slab selects {} elements, memory {}", s.size(), v.slab.size()),
                ));
            }
            s.clone()
        }
        None => {
            if info.rank() != v.slab.rank() {
                return Err(Error::RankMismatch {
                    op: "read",
                    key: name.to_string(),
                    group: g.name(),
                    expected: v.slab.rank(),
                    found: info.rank(),
                });
            }
            if info.lengths != v.slab.shape() {
                return Err(Error::ShapeMismatch {
                    op: "read",
                    key: name.to_string(),
                    group: g.name(),
                    expected: v.slab.shape(),
                    found: info.lengths,
                });
            }
            Hyperslab::contiguous(&info.lengths)
        }
    };
    if file_slab.size() == 0 {
        return Ok(());
    }
    let raw = ds.read_raw(&Selection::Hyperslab(file_slab))?;
    let packed = convert(&raw, &info.datatype, &v.datatype)?;
    v.scatter(packed, "read", name, &g.name())
}

/// Attach the view's content to `obj` as a new attribute.
pub fn write_attribute(obj: &dyn H5Object, name: &str, v: &ArrayRef<'_>) -> Result<()> {
    if obj.has_attribute(name) {
        return Err(Error::AlreadyExists {
            op: "write_attribute",
            key: name.to_string(),
            object: obj.object_name(),
        });
    }
    let data = v.gather("write_attribute", name, &obj.object_name())?;
    obj.create_attribute(
        name,
        Attribute {
            datatype: v.datatype.clone(),
            shape: v.slab.shape(),
            data,
        },
    )
}

/// Read attribute `name` of `obj` into the view. Only scalar attributes
/// (plus the complex dimension) are supported.
pub fn read_attribute(obj: &dyn H5Object, name: &str, v: &mut ArrayMut<'_>) -> Result<()> {
    let attr = obj.attribute(name).ok_or_else(|| Error::NotFound {
        op: "read_attribute",
        key: name.to_string(),
        group: obj.object_name(),
    })?;
    let expected = v.slab.shape();
    if attr.rank() != expected.len() {
        return Err(Error::RankMismatch {
            op: "read_attribute",
            key: name.to_string(),
            group: obj.object_name(),
            expected: expected.len(),
            found: attr.rank(),
        });
    }
    if attr.shape != expected {
        return Err(Error::ShapeMismatch {
            op: "read_attribute",
            key: name.to_string(),
            group: obj.object_name(),
            expected,
            found: attr.shape,
        });
    }
    if attr.datatype.class() != v.datatype.class() || attr.datatype.is_variable_string() {
        return Err(Error::TypeClassMismatch {
            op: "read_attribute",
            key: name.to_string(),
            group: obj.object_name(),
            expected: v.datatype.name(),
            found: attr.datatype.name(),
        });
    }
    if attr.datatype != v.datatype {
        log::warn!(
            "type mismatch reading attribute {name} of {}: {} != {}",
            obj.object_name(),
            v.datatype.name(),
            attr.datatype.name()
        );
    }
    let packed = convert(&attr.data, &attr.datatype, &v.datatype)?;
    v.scatter(packed, "read_attribute", name, &obj.object_name())
}
