//! Raw element storage of a dataset.
//!
//! Contiguous storage keeps one row-major buffer. Chunked storage keeps a
//! map from chunk coordinates to filtered chunk bytes; chunks never written
//! read back as zeros. Transfers move packed element bytes in the row-major
//! order of the selection.

use std::collections::{BTreeMap, HashMap};

use crate::error::FormatError;
use crate::filters::{compress_chunk, decompress_chunk, FilterPipeline};
use crate::property_list::DatasetCreateProps;
use crate::selection::{linear_index, row_major_pitch, Hyperslab};

/// Chunk grid plus the filtered bytes of every allocated chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedStorage {
    pub chunk_dims: Vec<u64>,
    pub pipeline: FilterPipeline,
    pub(crate) chunks: BTreeMap<Vec<u64>, Vec<u8>>,
}

impl ChunkedStorage {
    pub fn num_chunks(&self) -> usize {
        self.chunks.len()
    }

    fn chunk_elements(&self) -> usize {
        self.chunk_dims.iter().product::<u64>() as usize
    }
}

/// How a dataset keeps its elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    Contiguous(Vec<u8>),
    Chunked(ChunkedStorage),
    /// Payload of a scalar variable-length string.
    VarString(Vec<u8>),
}

impl Layout {
    /// Storage for a new dataset of `shape` and `elem_size`-byte elements.
    pub fn allocate(
        shape: &[u64],
        elem_size: usize,
        props: &DatasetCreateProps,
    ) -> Result<Self, FormatError> {
        props.validate(shape)?;
        match &props.chunk_dims {
            Some(chunk) => Ok(Layout::Chunked(ChunkedStorage {
                chunk_dims: chunk.clone(),
                pipeline: props.pipeline(),
                chunks: BTreeMap::new(),
            })),
            None => {
                let n = shape.iter().product::<u64>() as usize;
                Ok(Layout::Contiguous(vec![0u8; n * elem_size]))
            }
        }
    }

    /// Bytes held by this layout, after filtering.
    pub fn stored_bytes(&self) -> usize {
        match self {
            Layout::Contiguous(b) | Layout::VarString(b) => b.len(),
            Layout::Chunked(c) => c.chunks.values().map(Vec::len).sum(),
        }
    }

    /// Gather the selected elements into a packed buffer.
    pub fn read(
        &self,
        shape: &[u64],
        elem_size: usize,
        slab: &Hyperslab,
    ) -> Result<Vec<u8>, FormatError> {
        slab.check_within(shape)?;
        let mut out = Vec::with_capacity(slab.size() as usize * elem_size);
        match self {
            Layout::Contiguous(buf) => {
                check_extent(shape, elem_size, buf.len())?;
                slab.for_each_index(shape, |i| {
                    let o = i as usize * elem_size;
                    out.extend_from_slice(&buf[o..o + elem_size]);
                });
            }
            Layout::Chunked(cs) => {
                let pitch = row_major_pitch(&cs.chunk_dims);
                let chunk_bytes = cs.chunk_elements() * elem_size;
                let mut cache: HashMap<Vec<u64>, Vec<u8>> = HashMap::new();
                let mut key = vec![0u64; shape.len()];
                let mut within = vec![0u64; shape.len()];
                slab.for_each_coord(|c| {
                    split_coord(c, &cs.chunk_dims, &mut key, &mut within);
                    if !cache.contains_key(&key) {
                        let chunk = match cs.chunks.get(&key) {
                            Some(raw) => decompress_chunk(raw, &cs.pipeline, elem_size)?,
                            None => vec![0u8; chunk_bytes],
                        };
                        if chunk.len() != chunk_bytes {
                            return Err(FormatError::BufferSizeMismatch {
                                expected: chunk_bytes,
                                actual: chunk.len(),
                            });
                        }
                        cache.insert(key.clone(), chunk);
                    }
                    let o = linear_index(&within, &pitch) as usize * elem_size;
                    if let Some(chunk) = cache.get(&key) {
                        out.extend_from_slice(&chunk[o..o + elem_size]);
                    }
                    Ok(())
                })?;
            }
            Layout::VarString(_) => {
                return Err(FormatError::UnsupportedConversion {
                    from: "string".into(),
                    to: "fixed-size elements".into(),
                })
            }
        }
        Ok(out)
    }

    /// Scatter a packed buffer into the selected elements.
    pub fn write(
        &mut self,
        shape: &[u64],
        elem_size: usize,
        slab: &Hyperslab,
        data: &[u8],
    ) -> Result<(), FormatError> {
        slab.check_within(shape)?;
        let expected = slab.size() as usize * elem_size;
        if data.len() != expected {
            return Err(FormatError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        let mut src = data.chunks_exact(elem_size.max(1));
        match self {
            Layout::Contiguous(buf) => {
                check_extent(shape, elem_size, buf.len())?;
                slab.for_each_index(shape, |i| {
                    if let Some(e) = src.next() {
                        let o = i as usize * elem_size;
                        buf[o..o + elem_size].copy_from_slice(e);
                    }
                });
            }
            Layout::Chunked(cs) => {
                let pitch = row_major_pitch(&cs.chunk_dims);
                let chunk_bytes = cs.chunk_elements() * elem_size;
                let mut dirty: HashMap<Vec<u64>, Vec<u8>> = HashMap::new();
                let mut key = vec![0u64; shape.len()];
                let mut within = vec![0u64; shape.len()];
                slab.for_each_coord(|c| {
                    split_coord(c, &cs.chunk_dims, &mut key, &mut within);
                    if !dirty.contains_key(&key) {
                        let chunk = match cs.chunks.get(&key) {
                            Some(raw) => decompress_chunk(raw, &cs.pipeline, elem_size)?,
                            None => vec![0u8; chunk_bytes],
                        };
                        if chunk.len() != chunk_bytes {
                            return Err(FormatError::BufferSizeMismatch {
                                expected: chunk_bytes,
                                actual: chunk.len(),
                            });
                        }
                        dirty.insert(key.clone(), chunk);
                    }
                    let o = linear_index(&within, &pitch) as usize * elem_size;
                    if let (Some(chunk), Some(e)) = (dirty.get_mut(&key), src.next()) {
                        chunk[o..o + elem_size].copy_from_slice(e);
                    }
                    Ok::<(), FormatError>(())
                })?;
                for (key, chunk) in dirty {
                    let packed = compress_chunk(&chunk, &cs.pipeline, elem_size)?;
                    cs.chunks.insert(key, packed);
                }
            }
            Layout::VarString(_) => {
                return Err(FormatError::UnsupportedConversion {
                    from: "fixed-size elements".into(),
                    to: "string".into(),
                })
            }
        }
        Ok(())
    }
}

/// A contiguous buffer must cover the whole dataspace.
fn check_extent(shape: &[u64], elem_size: usize, actual: usize) -> Result<(), FormatError> {
    let expected = shape.iter().product::<u64>() as usize * elem_size;
    if actual < expected {
        return Err(FormatError::BufferSizeMismatch { expected, actual });
    }
    Ok(())
}

fn split_coord(c: &[u64], chunk: &[u64], key: &mut [u64], within: &mut [u64]) {
    for d in 0..c.len() {
        key[d] = c[d] / chunk[d];
        within[d] = c[d] % chunk[d];
    }
}
