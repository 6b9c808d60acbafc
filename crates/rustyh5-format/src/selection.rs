//! Hyperslab selections for partial dataset I/O.
//!
//! A [`Hyperslab`] selects, per dimension, `count` blocks of `block`
//! consecutive elements, the blocks starting `stride` apart from `offset`.
//! The same description is used for the file side of a transfer and for
//! the memory side, where the dataspace is the parent array a view lives in.
//!
//! ```
//! use rustyh5_format::selection::Hyperslab;
//!
//! let slab = Hyperslab::slice(&[2..4, 1..4]);
//! assert_eq!(slab.size(), 6);
//! let mut idx = Vec::new();
//! slab.for_each_index(&[5, 5], |i| idx.push(i));
//! assert_eq!(idx, vec![11, 12, 13, 16, 17, 18]);
//! ```

use std::convert::Infallible;
use std::ops::Range;

use crate::error::FormatError;

/// Per-dimension offset, stride, count and block of a regular selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Hyperslab {
    pub offset: Vec<u64>,
    pub stride: Vec<u64>,
    pub count: Vec<u64>,
    pub block: Vec<u64>,
}

impl Hyperslab {
    /// A slab of `rank` dimensions (plus a trailing dimension of 2 when
    /// `is_complex`) with zero offset, unit stride and block, and zero count.
    /// The trailing complex dimension is fully selected.
    pub fn new(rank: usize, is_complex: bool) -> Self {
        let r = rank + usize::from(is_complex);
        let mut slab = Self {
            offset: vec![0; r],
            stride: vec![1; r],
            count: vec![0; r],
            block: vec![1; r],
        };
        if is_complex {
            slab.count[rank] = 2;
        }
        slab
    }

    /// Select the whole of a dataspace of the given shape.
    pub fn contiguous(shape: &[u64]) -> Self {
        let r = shape.len();
        Self {
            offset: vec![0; r],
            stride: vec![1; r],
            count: shape.to_vec(),
            block: vec![1; r],
        }
    }

    /// Unit-stride selection of one range per dimension.
    pub fn slice(ranges: &[Range<u64>]) -> Self {
        let r = ranges.len();
        Self {
            offset: ranges.iter().map(|r| r.start).collect(),
            stride: vec![1; r],
            count: ranges.iter().map(|r| r.end.saturating_sub(r.start)).collect(),
            block: vec![1; r],
        }
    }

    pub fn rank(&self) -> usize {
        self.count.len()
    }

    /// True for a slab that was never given any dimension.
    pub fn is_empty(&self) -> bool {
        self.count.is_empty()
    }

    /// Shape of the selected region, `count * block` per dimension.
    pub fn shape(&self) -> Vec<u64> {
        self.count
            .iter()
            .zip(&self.block)
            .map(|(&c, &b)| c * b)
            .collect()
    }

    /// Number of selected elements.
    pub fn size(&self) -> u64 {
        self.shape().iter().product()
    }

    /// Append a fully selected dimension of length `n`.
    pub fn push_dim(&mut self, n: u64) {
        self.offset.push(0);
        self.stride.push(1);
        self.count.push(n);
        self.block.push(1);
    }

    /// Check that the four vectors agree in length and that blocks do not
    /// overlap.
    pub fn validate(&self) -> Result<(), FormatError> {
        let r = self.count.len();
        if self.offset.len() != r || self.stride.len() != r || self.block.len() != r {
            return Err(FormatError::InvalidSelection(format!(
                "offset/stride/count/block ranks differ: {}/{}/{}/{}",
                self.offset.len(),
                self.stride.len(),
                r,
                self.block.len()
            )));
        }
        for d in 0..r {
            if self.stride[d] == 0 {
                return Err(FormatError::InvalidSelection(format!("zero stride in dim {d}")));
            }
            if self.count[d] > 1 && self.stride[d] < self.block[d] {
                return Err(FormatError::InvalidSelection(format!(
                    "stride {} smaller than block {} in dim {d}",
                    self.stride[d], self.block[d]
                )));
            }
        }
        Ok(())
    }

    /// One past the last index touched in dimension `d`.
    pub fn extent(&self, d: usize) -> u64 {
        if self.count[d] == 0 || self.block[d] == 0 {
            return self.offset[d];
        }
        self.offset[d] + (self.count[d] - 1) * self.stride[d] + self.block[d]
    }

    /// True if every selected element lies inside `dims`.
    pub fn fits_within(&self, dims: &[u64]) -> bool {
        if dims.len() != self.rank() {
            return false;
        }
        if self.size() == 0 {
            return true;
        }
        (0..self.rank()).all(|d| self.extent(d) <= dims[d])
    }

    /// Like [`fits_within`](Self::fits_within) but returns a descriptive error.
    pub fn check_within(&self, dims: &[u64]) -> Result<(), FormatError> {
        self.validate()?;
        if self.fits_within(dims) {
            Ok(())
        } else {
            Err(FormatError::SelectionOutOfBounds(format!(
                "slab offset {:?} stride {:?} count {:?} block {:?} in dataspace {:?}",
                self.offset, self.stride, self.count, self.block, dims
            )))
        }
    }

    /// Visit the coordinates of every selected element in row-major order.
    pub fn for_each_coord<E>(
        &self,
        mut f: impl FnMut(&[u64]) -> Result<(), E>,
    ) -> Result<(), E> {
        let shape = self.shape();
        if shape.iter().any(|&n| n == 0) {
            return Ok(());
        }
        let r = shape.len();
        let mut idx = vec![0u64; r];
        let mut coord: Vec<u64> = self.offset.clone();
        loop {
            f(&coord)?;
            // odometer increment, innermost dimension fastest
            let mut d = r;
            loop {
                if d == 0 {
                    return Ok(());
                }
                d -= 1;
                idx[d] += 1;
                if idx[d] < shape[d] {
                    let (blk, within) = (idx[d] / self.block[d], idx[d] % self.block[d]);
                    coord[d] = self.offset[d] + blk * self.stride[d] + within;
                    break;
                }
                idx[d] = 0;
                coord[d] = self.offset[d];
            }
        }
    }

    /// Visit the row-major linear index, within a dataspace of shape
    /// `dims`, of every selected element.
    pub fn for_each_index(&self, dims: &[u64], mut f: impl FnMut(u64)) {
        let pitch = row_major_pitch(dims);
        let visited = self.for_each_coord::<Infallible>(|c| {
            f(linear_index(c, &pitch));
            Ok(())
        });
        if let Err(never) = visited {
            match never {}
        }
    }
}

/// Row-major element pitch of each dimension.
pub fn row_major_pitch(dims: &[u64]) -> Vec<u64> {
    let mut pitch = vec![1u64; dims.len()];
    for d in (0..dims.len().saturating_sub(1)).rev() {
        pitch[d] = pitch[d + 1] * dims[d + 1];
    }
    pitch
}

pub fn linear_index(coord: &[u64], pitch: &[u64]) -> u64 {
    coord.iter().zip(pitch).map(|(&c, &p)| c * p).sum()
}

/// Which elements of a dataset a transfer touches.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    /// The whole dataspace.
    #[default]
    All,
    Hyperslab(Hyperslab),
}

impl Selection {
    /// The equivalent explicit hyperslab for a dataspace of shape `dims`.
    pub fn resolve(&self, dims: &[u64]) -> Hyperslab {
        match self {
            Selection::All => Hyperslab::contiguous(dims),
            Selection::Hyperslab(h) => h.clone(),
        }
    }

    pub fn num_elements(&self, dims: &[u64]) -> u64 {
        match self {
            Selection::All => dims.iter().product(),
            Selection::Hyperslab(h) => h.size(),
        }
    }
}

impl From<Hyperslab> for Selection {
    fn from(h: Hyperslab) -> Self {
        Selection::Hyperslab(h)
    }
}
