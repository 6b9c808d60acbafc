//! Dataset creation properties.

use crate::error::FormatError;
use crate::filters::{FilterPipeline, FILTER_DEFLATE, FILTER_SHUFFLE};

/// Controls storage layout and compression for a new dataset.
///
/// Without chunk dimensions the dataset is stored contiguously and
/// filters are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetCreateProps {
    /// Chunk dimensions (enables chunked storage).
    pub chunk_dims: Option<Vec<u64>>,
    /// Deflate compression level (0-9).
    pub deflate_level: Option<u32>,
    /// Shuffle filter before compression.
    pub shuffle: bool,
}

impl DatasetCreateProps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set chunk dimensions.
    pub fn chunk(mut self, dims: &[u64]) -> Self {
        self.chunk_dims = Some(dims.to_vec());
        self
    }

    /// Enable deflate at the given level (clamped to 9).
    pub fn deflate(mut self, level: u32) -> Self {
        self.deflate_level = Some(level.min(9));
        self
    }

    pub fn shuffle(mut self) -> Self {
        self.shuffle = true;
        self
    }

    pub fn is_chunked(&self) -> bool {
        self.chunk_dims.is_some()
    }

    /// The filter pipeline these properties describe.
    pub fn pipeline(&self) -> FilterPipeline {
        let mut p = FilterPipeline::default();
        if self.shuffle {
            p.push(FILTER_SHUFFLE, vec![]);
        }
        if let Some(level) = self.deflate_level {
            p.push(FILTER_DEFLATE, vec![level]);
        }
        p
    }

    /// Chunk dimensions must match the dataset rank and be non-zero.
    pub fn validate(&self, shape: &[u64]) -> Result<(), FormatError> {
        if let Some(chunk) = &self.chunk_dims {
            if chunk.len() != shape.len() || chunk.iter().any(|&c| c == 0) {
                return Err(FormatError::InvalidChunkDims {
                    chunk: chunk.clone(),
                    shape: shape.to_vec(),
                });
            }
        }
        Ok(())
    }
}
