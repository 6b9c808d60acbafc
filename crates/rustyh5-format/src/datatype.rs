//! Element datatypes stored in a container.
//!
//! Only the classes the typed layer produces are modelled: integers,
//! IEEE floats, booleans (an enum over a one-byte base), fixed or
//! variable-length strings, and compounds. All numeric data is stored
//! little-endian.

use std::fmt;
use std::sync::OnceLock;

use crate::codec::{fit, Reader, Writer};
use crate::error::FormatError;

/// Storage size of a string datatype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringSize {
    /// Null-padded buffer of a fixed number of bytes.
    Fixed(u32),
    /// A single UTF-8 string of arbitrary length.
    Variable,
}

/// Coarse datatype class. Two datatypes of different classes never convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeClass {
    Integer,
    Float,
    String,
    Enum,
    Compound,
}

/// A named member of a compound datatype.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompoundMember {
    pub name: String,
    pub byte_offset: u32,
    pub datatype: Datatype,
}

/// Element datatype of a dataset or attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Datatype {
    Integer { size: u8, signed: bool },
    Float { size: u8 },
    /// Two-valued enum over an 8-bit base.
    Bool,
    String(StringSize),
    Compound { size: u32, members: Vec<CompoundMember> },
}

impl Datatype {
    pub fn integer(size: u8, signed: bool) -> Self {
        Datatype::Integer { size, signed }
    }

    pub fn float(size: u8) -> Self {
        Datatype::Float { size }
    }

    pub fn fixed_string(size: u32) -> Self {
        Datatype::String(StringSize::Fixed(size))
    }

    pub fn variable_string() -> Self {
        Datatype::String(StringSize::Variable)
    }

    /// The `{ r: f64, i: f64 }` compound used by legacy complex data.
    pub fn complex_compound() -> Self {
        Datatype::Compound {
            size: 16,
            members: vec![
                CompoundMember {
                    name: "r".into(),
                    byte_offset: 0,
                    datatype: Datatype::float(8),
                },
                CompoundMember {
                    name: "i".into(),
                    byte_offset: 8,
                    datatype: Datatype::float(8),
                },
            ],
        }
    }

    pub fn class(&self) -> TypeClass {
        match self {
            Datatype::Integer { .. } => TypeClass::Integer,
            Datatype::Float { .. } => TypeClass::Float,
            Datatype::Bool => TypeClass::Enum,
            Datatype::String(_) => TypeClass::String,
            Datatype::Compound { .. } => TypeClass::Compound,
        }
    }

    /// Size in bytes of one element. Variable-length strings report 0.
    pub fn size(&self) -> usize {
        match self {
            Datatype::Integer { size, .. } | Datatype::Float { size } => *size as usize,
            Datatype::Bool => 1,
            Datatype::String(StringSize::Fixed(n)) => *n as usize,
            Datatype::String(StringSize::Variable) => 0,
            Datatype::Compound { size, .. } => *size as usize,
        }
    }

    pub fn is_variable_string(&self) -> bool {
        matches!(self, Datatype::String(StringSize::Variable))
    }

    /// Equality as used when matching stored data against a requested type.
    ///
    /// Strings match on class alone; a fixed buffer of any width and a
    /// variable-length string are interchangeable.
    pub fn type_equal(&self, other: &Datatype) -> bool {
        match (self, other) {
            (Datatype::String(_), Datatype::String(_)) => true,
            _ => self == other,
        }
    }

    /// Human-readable name, used in diagnostics.
    pub fn name(&self) -> String {
        type_names()
            .iter()
            .find(|(dt, _)| dt == self)
            .map(|(_, n)| (*n).to_string())
            .unwrap_or_else(|| self.to_string())
    }

    pub(crate) fn encode(&self, w: &mut Writer) -> Result<(), FormatError> {
        match self {
            Datatype::Integer { size, signed } => {
                w.u8(0);
                w.u8(*size);
                w.u8(u8::from(*signed));
            }
            Datatype::Float { size } => {
                w.u8(1);
                w.u8(*size);
            }
            Datatype::String(StringSize::Fixed(n)) => {
                w.u8(2);
                w.u8(0);
                w.u32(*n);
            }
            Datatype::String(StringSize::Variable) => {
                w.u8(2);
                w.u8(1);
            }
            Datatype::Bool => w.u8(3),
            Datatype::Compound { size, members } => {
                w.u8(4);
                w.u32(*size);
                w.u16(fit("compound member count", members.len())?);
                for m in members {
                    w.name(&m.name)?;
                    w.u32(m.byte_offset);
                    m.datatype.encode(w)?;
                }
            }
        }
        Ok(())
    }

    pub(crate) fn decode(r: &mut Reader<'_>) -> Result<Self, FormatError> {
        let class = r.u8()?;
        match class {
            0 => {
                let size = r.u8()?;
                let signed = r.u8()? != 0;
                Ok(Datatype::Integer { size, signed })
            }
            1 => Ok(Datatype::Float { size: r.u8()? }),
            2 => match r.u8()? {
                0 => Ok(Datatype::fixed_string(r.u32()?)),
                1 => Ok(Datatype::variable_string()),
                other => Err(FormatError::InvalidDatatype(other)),
            },
            3 => Ok(Datatype::Bool),
            4 => {
                let size = r.u32()?;
                let n = r.u16()?;
                let mut members = Vec::with_capacity(n as usize);
                for _ in 0..n {
                    let name = r.name()?;
                    let byte_offset = r.u32()?;
                    let datatype = Datatype::decode(r)?;
                    members.push(CompoundMember {
                        name,
                        byte_offset,
                        datatype,
                    });
                }
                Ok(Datatype::Compound { size, members })
            }
            other => Err(FormatError::InvalidDatatype(other)),
        }
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datatype::Integer { size, signed } => {
                write!(f, "{}{}", if *signed { "i" } else { "u" }, size * 8)
            }
            Datatype::Float { size } => write!(f, "f{}", size * 8),
            Datatype::Bool => f.write_str("bool"),
            Datatype::String(StringSize::Fixed(n)) => write!(f, "string[{n}]"),
            Datatype::String(StringSize::Variable) => f.write_str("string"),
            Datatype::Compound { size, members } => {
                f.write_str("compound{")?;
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}@{}: {}", m.name, m.byte_offset, m.datatype)?;
                }
                write!(f, "}}[{size}]")
            }
        }
    }
}

/// Lazily built table of well-known datatype names.
fn type_names() -> &'static [(Datatype, &'static str)] {
    static NAMES: OnceLock<Vec<(Datatype, &'static str)>> = OnceLock::new();
    NAMES.get_or_init(|| {
        vec![
            (Datatype::integer(1, true), "int8"),
            (Datatype::integer(2, true), "int16"),
            (Datatype::integer(4, true), "int32"),
            (Datatype::integer(8, true), "int64"),
            (Datatype::integer(1, false), "uint8"),
            (Datatype::integer(2, false), "uint16"),
            (Datatype::integer(4, false), "uint32"),
            (Datatype::integer(8, false), "uint64"),
            (Datatype::float(4), "float"),
            (Datatype::float(8), "double"),
            (Datatype::Bool, "bool"),
            (Datatype::variable_string(), "string"),
            (Datatype::complex_compound(), "dcomplex"),
        ]
    })
}
