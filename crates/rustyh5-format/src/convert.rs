//! Element conversion between datatypes of the same class, and host
//! byte-order fix-ups.
//!
//! Integer targets saturate; float to integer truncates toward zero.

use byteorder::{ByteOrder, LittleEndian};

use crate::datatype::{Datatype, StringSize};
use crate::error::FormatError;

/// Convert a packed little-endian buffer of `from` elements into `to` elements.
pub fn convert(data: &[u8], from: &Datatype, to: &Datatype) -> Result<Vec<u8>, FormatError> {
    if from == to {
        return Ok(data.to_vec());
    }
    let src_size = from.size();
    let dst_size = to.size();
    if src_size == 0 || dst_size == 0 {
        return Err(unsupported(from, to));
    }
    if data.len() % src_size != 0 {
        return Err(FormatError::BufferSizeMismatch {
            expected: data.len() / src_size * src_size,
            actual: data.len(),
        });
    }
    let n = data.len() / src_size;
    let mut out = vec![0u8; n * dst_size];
    for (src, dst) in data.chunks_exact(src_size).zip(out.chunks_exact_mut(dst_size)) {
        convert_element(src, from, dst, to)?;
    }
    Ok(out)
}

fn convert_element(
    src: &[u8],
    from: &Datatype,
    dst: &mut [u8],
    to: &Datatype,
) -> Result<(), FormatError> {
    match (from, to) {
        (Datatype::Integer { signed, .. }, Datatype::Integer { size, signed: dsigned }) => {
            let v = read_int(src, *signed);
            write_int(dst, saturate(v, *size, *dsigned), *dsigned);
        }
        (Datatype::Integer { signed, .. }, Datatype::Float { .. }) => {
            write_float(dst, read_int(src, *signed) as f64);
        }
        (Datatype::Float { .. }, Datatype::Integer { size, signed }) => {
            let v = read_float(src);
            let v = if v.is_nan() { 0 } else { v.trunc() as i128 };
            write_int(dst, saturate(v, *size, *signed), *signed);
        }
        (Datatype::Float { .. }, Datatype::Float { .. }) => write_float(dst, read_float(src)),
        (Datatype::Bool, Datatype::Bool) => dst[0] = src[0],
        (Datatype::String(StringSize::Fixed(_)), Datatype::String(StringSize::Fixed(_))) => {
            let n = src.len().min(dst.len());
            dst[..n].copy_from_slice(&src[..n]);
        }
        (
            Datatype::Compound { members: src_members, .. },
            Datatype::Compound { members: dst_members, .. },
        ) => {
            for dm in dst_members {
                let sm = src_members
                    .iter()
                    .find(|m| m.name == dm.name)
                    .ok_or_else(|| unsupported(from, to))?;
                let so = sm.byte_offset as usize;
                let d_o = dm.byte_offset as usize;
                convert_element(
                    &src[so..so + sm.datatype.size()],
                    &sm.datatype,
                    &mut dst[d_o..d_o + dm.datatype.size()],
                    &dm.datatype,
                )?;
            }
        }
        _ => return Err(unsupported(from, to)),
    }
    Ok(())
}

fn unsupported(from: &Datatype, to: &Datatype) -> FormatError {
    FormatError::UnsupportedConversion {
        from: from.name(),
        to: to.name(),
    }
}

fn read_int(src: &[u8], signed: bool) -> i128 {
    if signed {
        LittleEndian::read_int(src, src.len()) as i128
    } else {
        LittleEndian::read_uint(src, src.len()) as i128
    }
}

fn saturate(v: i128, size: u8, signed: bool) -> i128 {
    let bits = u32::from(size) * 8;
    let (lo, hi) = if signed {
        (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1)
    } else {
        (0, (1i128 << bits) - 1)
    };
    v.clamp(lo, hi)
}

fn write_int(dst: &mut [u8], v: i128, signed: bool) {
    let n = dst.len();
    if signed {
        LittleEndian::write_int(dst, v as i64, n);
    } else {
        LittleEndian::write_uint(dst, v as u64, n);
    }
}

fn read_float(src: &[u8]) -> f64 {
    match src.len() {
        4 => f64::from(LittleEndian::read_f32(src)),
        _ => LittleEndian::read_f64(src),
    }
}

fn write_float(dst: &mut [u8], v: f64) {
    match dst.len() {
        4 => LittleEndian::write_f32(dst, v as f32),
        _ => LittleEndian::write_f64(dst, v),
    }
}

/// Reorder a packed buffer between host order and the little-endian
/// container order. A no-op on little-endian hosts.
#[cfg(target_endian = "little")]
pub fn swap_to_little_endian(_data: &mut [u8], _dt: &Datatype) {}

#[cfg(target_endian = "big")]
pub fn swap_to_little_endian(data: &mut [u8], dt: &Datatype) {
    let size = dt.size();
    if size == 0 {
        return;
    }
    for elem in data.chunks_exact_mut(size) {
        swap_element(elem, dt);
    }
}

#[cfg(target_endian = "big")]
fn swap_element(elem: &mut [u8], dt: &Datatype) {
    match dt {
        Datatype::Integer { .. } | Datatype::Float { .. } => elem.reverse(),
        Datatype::Compound { members, .. } => {
            for m in members {
                let o = m.byte_offset as usize;
                swap_element(&mut elem[o..o + m.datatype.size()], &m.datatype);
            }
        }
        Datatype::Bool | Datatype::String(_) => {}
    }
}
