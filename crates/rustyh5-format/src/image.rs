//! Serialized form of a [`Container`].
//!
//! ```text
//! signature   8 bytes  \x89RH5\r\n\x1a\n
//! version     u8       1
//! reserved    3 bytes
//! root group  record
//! checksum    u32      lookup3 of everything before it
//! ```
//!
//! All integers are little-endian. A group record is its attribute table
//! followed by its links, both in name order.

use std::collections::BTreeMap;

use crate::checksum::jenkins_lookup3;
use crate::codec::{fit, Reader, Writer};
use crate::container::Container;
use crate::datatype::Datatype;
use crate::error::FormatError;
use crate::filters::{Filter, FilterPipeline};
use crate::property_list::DatasetCreateProps;
use crate::node::{Attribute, Attributes, DatasetNode, GroupNode, Link};
use crate::storage::{ChunkedStorage, Layout};

/// Container image signature.
pub const SIGNATURE: [u8; 8] = [0x89, b'R', b'H', b'5', b'\r', b'\n', 0x1a, b'\n'];
/// Current image version.
pub const VERSION: u8 = 1;

const LINK_GROUP: u8 = 0;
const LINK_DATASET: u8 = 1;
const LINK_SOFT: u8 = 2;

const LAYOUT_CONTIGUOUS: u8 = 0;
const LAYOUT_CHUNKED: u8 = 1;
const LAYOUT_VAR_STRING: u8 = 2;

impl Container {
    /// Serialize the whole tree.
    ///
    /// Fails with [`FormatError::LimitExceeded`] when a name, rank or
    /// count does not fit its prefix field.
    pub fn to_image(&self) -> Result<Vec<u8>, FormatError> {
        let mut w = Writer::new();
        w.raw(&SIGNATURE);
        w.u8(VERSION);
        w.raw(&[0; 3]);
        encode_group(&self.root, &mut w)?;
        let mut bytes = w.into_inner();
        let sum = jenkins_lookup3(&bytes);
        bytes.extend_from_slice(&sum.to_le_bytes());
        Ok(bytes)
    }

    /// Rebuild a container from an image produced by [`Container::to_image`].
    pub fn from_image(image: &[u8]) -> Result<Self, FormatError> {
        if image.len() < SIGNATURE.len() || image[..SIGNATURE.len()] != SIGNATURE {
            return Err(FormatError::SignatureNotFound);
        }
        if image.len() < 16 {
            return Err(FormatError::UnexpectedEof {
                expected: 16,
                available: image.len(),
            });
        }
        let (body, sum) = image.split_at(image.len() - 4);
        let stored = u32::from_le_bytes([sum[0], sum[1], sum[2], sum[3]]);
        let computed = jenkins_lookup3(body);
        if stored != computed {
            return Err(FormatError::ChecksumMismatch { stored, computed });
        }

        let mut r = Reader::new(body);
        r.take(SIGNATURE.len())?;
        let version = r.u8()?;
        if version != VERSION {
            return Err(FormatError::UnsupportedVersion(version));
        }
        r.take(3)?;
        let root = decode_group(&mut r)?;
        log::trace!("decoded container image of {} bytes", image.len());
        Ok(Container { root })
    }
}

fn encode_attributes(attrs: &Attributes, w: &mut Writer) -> Result<(), FormatError> {
    w.u32(fit("attribute count", attrs.len())?);
    for (name, attr) in attrs {
        w.name(name)?;
        attr.datatype.encode(w)?;
        w.dims(&attr.shape)?;
        w.bytes(&attr.data);
    }
    Ok(())
}

fn decode_attributes(r: &mut Reader<'_>) -> Result<Attributes, FormatError> {
    let n = r.u32()?;
    let mut attrs = BTreeMap::new();
    for _ in 0..n {
        let name = r.name()?;
        let datatype = Datatype::decode(r)?;
        let shape = r.dims()?;
        let data = r.bytes()?.to_vec();
        if !datatype.is_variable_string() {
            expect_len(&shape, datatype.size(), data.len())?;
        }
        attrs.insert(
            name,
            Attribute {
                datatype,
                shape,
                data,
            },
        );
    }
    Ok(attrs)
}

fn encode_group(g: &GroupNode, w: &mut Writer) -> Result<(), FormatError> {
    encode_attributes(&g.attributes, w)?;
    w.u32(fit("link count", g.links.len())?);
    for (name, link) in &g.links {
        w.name(name)?;
        match link {
            Link::Group(child) => {
                w.u8(LINK_GROUP);
                encode_group(child, w)?;
            }
            Link::Dataset(d) => {
                w.u8(LINK_DATASET);
                encode_dataset(d, w)?;
            }
            Link::Soft(target) => {
                w.u8(LINK_SOFT);
                w.name(target)?;
            }
        }
    }
    Ok(())
}

fn decode_group(r: &mut Reader<'_>) -> Result<GroupNode, FormatError> {
    let attributes = decode_attributes(r)?;
    let n = r.u32()?;
    let mut links = BTreeMap::new();
    for _ in 0..n {
        let name = r.name()?;
        let link = match r.u8()? {
            LINK_GROUP => Link::Group(decode_group(r)?),
            LINK_DATASET => Link::Dataset(decode_dataset(r)?),
            LINK_SOFT => Link::Soft(r.name()?),
            other => return Err(FormatError::InvalidLink(other)),
        };
        links.insert(name, link);
    }
    Ok(GroupNode { links, attributes })
}

fn encode_dataset(d: &DatasetNode, w: &mut Writer) -> Result<(), FormatError> {
    d.datatype.encode(w)?;
    w.dims(&d.shape)?;
    match &d.layout {
        Layout::Contiguous(bytes) => {
            w.u8(LAYOUT_CONTIGUOUS);
            w.bytes(bytes);
        }
        Layout::Chunked(cs) => {
            w.u8(LAYOUT_CHUNKED);
            w.dims(&cs.chunk_dims)?;
            w.u8(fit("filter count", cs.pipeline.filters.len())?);
            for f in &cs.pipeline.filters {
                w.u16(f.filter_id);
                w.u8(fit("filter client data length", f.client_data.len())?);
                for &v in &f.client_data {
                    w.u32(v);
                }
            }
            w.u64(cs.chunks.len() as u64);
            for (key, bytes) in &cs.chunks {
                w.dims(key)?;
                w.bytes(bytes);
            }
        }
        Layout::VarString(bytes) => {
            w.u8(LAYOUT_VAR_STRING);
            w.bytes(bytes);
        }
    }
    encode_attributes(&d.attributes, w)
}

fn decode_dataset(r: &mut Reader<'_>) -> Result<DatasetNode, FormatError> {
    let datatype = Datatype::decode(r)?;
    let shape = r.dims()?;
    let layout = match r.u8()? {
        LAYOUT_CONTIGUOUS => Layout::Contiguous(r.bytes()?.to_vec()),
        LAYOUT_CHUNKED => {
            let chunk_dims = r.dims()?;
            let nfilters = r.u8()?;
            let mut pipeline = FilterPipeline::default();
            for _ in 0..nfilters {
                let filter_id = r.u16()?;
                let n = r.u8()?;
                let client_data = (0..n).map(|_| r.u32()).collect::<Result<Vec<_>, _>>()?;
                pipeline.filters.push(Filter {
                    filter_id,
                    client_data,
                });
            }
            let nchunks = r.u64()?;
            let mut chunks = BTreeMap::new();
            for _ in 0..nchunks {
                let key = r.dims()?;
                chunks.insert(key, r.bytes()?.to_vec());
            }
            Layout::Chunked(ChunkedStorage {
                chunk_dims,
                pipeline,
                chunks,
            })
        }
        LAYOUT_VAR_STRING => Layout::VarString(r.bytes()?.to_vec()),
        other => return Err(FormatError::InvalidLayout(other)),
    };
    check_layout(&datatype, &shape, &layout)?;
    let attributes = decode_attributes(r)?;
    Ok(DatasetNode {
        datatype,
        shape,
        layout,
        attributes,
    })
}

fn expect_len(shape: &[u64], elem_size: usize, actual: usize) -> Result<(), FormatError> {
    let expected = shape
        .iter()
        .try_fold(elem_size as u64, |n, &d| n.checked_mul(d))
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(usize::MAX);
    if expected != actual {
        return Err(FormatError::BufferSizeMismatch { expected, actual });
    }
    Ok(())
}

/// Reject storage that disagrees with the dataspace it claims to hold.
fn check_layout(datatype: &Datatype, shape: &[u64], layout: &Layout) -> Result<(), FormatError> {
    match layout {
        Layout::Contiguous(bytes) => {
            if datatype.is_variable_string() {
                return Err(FormatError::UnsupportedConversion {
                    from: "string".into(),
                    to: "fixed-size elements".into(),
                });
            }
            expect_len(shape, datatype.size(), bytes.len())
        }
        Layout::VarString(_) => {
            if !datatype.is_variable_string() || !shape.is_empty() {
                return Err(FormatError::UnsupportedConversion {
                    from: datatype.name(),
                    to: "scalar string".into(),
                });
            }
            Ok(())
        }
        Layout::Chunked(cs) => {
            if datatype.is_variable_string() {
                return Err(FormatError::UnsupportedConversion {
                    from: "string".into(),
                    to: "fixed-size elements".into(),
                });
            }
            DatasetCreateProps::new()
                .chunk(&cs.chunk_dims)
                .validate(shape)?;
            let grid: Vec<u64> = shape
                .iter()
                .zip(&cs.chunk_dims)
                .map(|(&n, &c)| n.div_ceil(c))
                .collect();
            match cs
                .chunks
                .keys()
                .find(|k| k.len() != grid.len() || k.iter().zip(&grid).any(|(i, n)| i >= n))
            {
                Some(key) => Err(FormatError::SelectionOutOfBounds(format!(
                    "chunk {key:?} outside chunk grid {grid:?}"
                ))),
                None => Ok(()),
            }
        }
    }
}
