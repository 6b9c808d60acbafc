//! Chunk filter pipeline: shuffle and deflate.
//!
//! A pipeline is applied front to back when a chunk is stored and back to
//! front when it is loaded.

use crate::error::FormatError;

/// Filter id for zlib deflate. Client data: `[level]`.
pub const FILTER_DEFLATE: u16 = 1;
/// Filter id for byte shuffling.
pub const FILTER_SHUFFLE: u16 = 2;

/// Deflate level used when a deflate filter carries no client data.
const DEFAULT_DEFLATE_LEVEL: u32 = 6;

/// One stage of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub filter_id: u16,
    pub client_data: Vec<u32>,
}

impl Filter {
    fn encode(&self, data: Vec<u8>, element_size: usize) -> Result<Vec<u8>, FormatError> {
        match self.filter_id {
            FILTER_SHUFFLE => byte_transpose(data, element_size, true),
            FILTER_DEFLATE => {
                let level = self.client_data.first().copied().unwrap_or(DEFAULT_DEFLATE_LEVEL);
                zlib::compress(&data, level)
            }
            other => Err(FormatError::UnsupportedFilter(other)),
        }
    }

    fn decode(&self, data: Vec<u8>, element_size: usize) -> Result<Vec<u8>, FormatError> {
        match self.filter_id {
            FILTER_SHUFFLE => byte_transpose(data, element_size, false),
            FILTER_DEFLATE => zlib::decompress(&data),
            other => Err(FormatError::UnsupportedFilter(other)),
        }
    }
}

/// Ordered list of filters applied to every chunk of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterPipeline {
    pub filters: Vec<Filter>,
}

impl FilterPipeline {
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn push(&mut self, filter_id: u16, client_data: Vec<u32>) {
        self.filters.push(Filter {
            filter_id,
            client_data,
        });
    }
}

/// Run a stored chunk back through the pipeline.
pub fn decompress_chunk(
    stored: &[u8],
    pipeline: &FilterPipeline,
    element_size: usize,
) -> Result<Vec<u8>, FormatError> {
    pipeline
        .filters
        .iter()
        .rev()
        .try_fold(stored.to_vec(), |data, f| f.decode(data, element_size))
}

/// Run a raw chunk through the pipeline for storage.
pub fn compress_chunk(
    raw: &[u8],
    pipeline: &FilterPipeline,
    element_size: usize,
) -> Result<Vec<u8>, FormatError> {
    pipeline
        .filters
        .iter()
        .try_fold(raw.to_vec(), |data, f| f.encode(data, element_size))
}

/// Shuffle (`forward`) or unshuffle a buffer of `element_size`-byte
/// elements.
///
/// Shuffling views the buffer as an `n x element_size` byte matrix and
/// stores its transpose, so byte `j` of every element ends up in plane `j`.
fn byte_transpose(data: Vec<u8>, element_size: usize, forward: bool) -> Result<Vec<u8>, FormatError> {
    if element_size <= 1 {
        return Ok(data);
    }
    if data.len() % element_size != 0 {
        return Err(FormatError::FilterError(format!(
            "shuffle: {} bytes is not a whole number of {element_size}-byte elements",
            data.len()
        )));
    }
    let n = data.len() / element_size;
    let (rows, cols) = if forward { (n, element_size) } else { (element_size, n) };
    let mut out = vec![0u8; data.len()];
    for (k, &b) in data.iter().enumerate() {
        let (r, c) = (k / cols, k % cols);
        out[c * rows + r] = b;
    }
    Ok(out)
}

#[cfg(feature = "deflate")]
mod zlib {
    use std::io::{Read, Write};

    use flate2::write::ZlibDecoder;
    use flate2::{read::ZlibEncoder, Compression};

    use crate::error::FormatError;

    pub(super) fn compress(data: &[u8], level: u32) -> Result<Vec<u8>, FormatError> {
        let mut out = Vec::new();
        ZlibEncoder::new(data, Compression::new(level.min(9)))
            .read_to_end(&mut out)
            .map_err(|e| FormatError::CompressionError(e.to_string()))?;
        Ok(out)
    }

    pub(super) fn decompress(data: &[u8]) -> Result<Vec<u8>, FormatError> {
        let mut d = ZlibDecoder::new(Vec::new());
        d.write_all(data)
            .and_then(|()| d.finish())
            .map_err(|e| FormatError::DecompressionError(e.to_string()))
    }
}

#[cfg(not(feature = "deflate"))]
mod zlib {
    use super::FILTER_DEFLATE;
    use crate::error::FormatError;

    pub(super) fn compress(_data: &[u8], _level: u32) -> Result<Vec<u8>, FormatError> {
        Err(FormatError::UnsupportedFilter(FILTER_DEFLATE))
    }

    pub(super) fn decompress(_data: &[u8]) -> Result<Vec<u8>, FormatError> {
        Err(FormatError::UnsupportedFilter(FILTER_DEFLATE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shuffle_groups_byte_planes() {
        let data = vec![1u8, 2, 3, 4, 5, 6];
        let planes = byte_transpose(data.clone(), 2, true).unwrap();
        assert_eq!(planes, vec![1, 3, 5, 2, 4, 6]);
        assert_eq!(byte_transpose(planes, 2, false).unwrap(), data);

        let wide = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
        let planes = byte_transpose(wide.clone(), 4, true).unwrap();
        assert_eq!(planes, vec![1, 5, 2, 6, 3, 7, 4, 8]);
        assert_eq!(byte_transpose(planes, 4, false).unwrap(), wide);
    }

    #[test]
    fn shuffle_rejects_ragged_input() {
        assert!(matches!(
            byte_transpose(vec![1, 2, 3], 2, true),
            Err(FormatError::FilterError(_))
        ));
    }

    #[cfg(feature = "deflate")]
    #[test]
    fn deflate_shrinks_zeros() {
        let mut pipeline = FilterPipeline::default();
        pipeline.push(FILTER_SHUFFLE, vec![]);
        pipeline.push(FILTER_DEFLATE, vec![1]);
        let data = vec![0u8; 4096];
        let packed = compress_chunk(&data, &pipeline, 8).unwrap();
        assert!(packed.len() < 100);
        assert_eq!(decompress_chunk(&packed, &pipeline, 8).unwrap(), data);
    }

    #[cfg(feature = "deflate")]
    #[test]
    fn corrupt_stream_fails() {
        let mut pipeline = FilterPipeline::default();
        pipeline.push(FILTER_DEFLATE, vec![]);
        assert!(matches!(
            decompress_chunk(&[0xde, 0xad, 0xbe, 0xef], &pipeline, 1),
            Err(FormatError::DecompressionError(_))
        ));
    }

    #[test]
    fn unknown_filter() {
        let mut pipeline = FilterPipeline::default();
        pipeline.push(32000, vec![]);
        assert_eq!(
            compress_chunk(&[0], &pipeline, 1),
            Err(FormatError::UnsupportedFilter(32000))
        );
    }
}
