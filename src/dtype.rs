//! Scalar datatype definitions.
//!
//! [`DataType`] is the closed set of component types an array can hold: signed
//! and unsigned integers of 8/16/32/64 bits plus IEEE-754 32- and 64-bit
//! floats. Every variant has a fixed byte width.
//!
//! [`Scalar`] binds the ten Rust primitives to their [`DataType`] so that
//! typed views ([`crate::array::Array`]) and the conversion engine
//! ([`crate::convert::convert`]) can be written once, generically, instead of
//! per type pair.

use std::fmt;
use std::str::FromStr;

use num_traits::AsPrimitive;

/// The component type of an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DataType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

/// All datatypes, in wire-code order.
pub const ALL_DATA_TYPES: [DataType; 10] = [
    DataType::I8,
    DataType::U8,
    DataType::I16,
    DataType::U16,
    DataType::I32,
    DataType::U32,
    DataType::I64,
    DataType::U64,
    DataType::F32,
    DataType::F64,
];

impl DataType {
    /// Byte width of one component of this type.
    pub const fn size(self) -> usize {
        match self {
            DataType::I8 | DataType::U8 => 1,
            DataType::I16 | DataType::U16 => 2,
            DataType::I32 | DataType::U32 | DataType::F32 => 4,
            DataType::I64 | DataType::U64 | DataType::F64 => 8,
        }
    }

    /// The single-byte code used by the native container format.
    pub const fn to_code(self) -> u8 {
        match self {
            DataType::I8 => 0,
            DataType::U8 => 1,
            DataType::I16 => 2,
            DataType::U16 => 3,
            DataType::I32 => 4,
            DataType::U32 => 5,
            DataType::I64 => 6,
            DataType::U64 => 7,
            DataType::F32 => 8,
            DataType::F64 => 9,
        }
    }

    /// Inverse of [`DataType::to_code`].
    pub const fn from_code(code: u8) -> Option<DataType> {
        match code {
            0 => Some(DataType::I8),
            1 => Some(DataType::U8),
            2 => Some(DataType::I16),
            3 => Some(DataType::U16),
            4 => Some(DataType::I32),
            5 => Some(DataType::U32),
            6 => Some(DataType::I64),
            7 => Some(DataType::U64),
            8 => Some(DataType::F32),
            9 => Some(DataType::F64),
            _ => None,
        }
    }

    /// Canonical name, round-trippable through [`FromStr`].
    pub const fn name(self) -> &'static str {
        match self {
            DataType::I8 => "int8",
            DataType::U8 => "uint8",
            DataType::I16 => "int16",
            DataType::U16 => "uint16",
            DataType::I32 => "int32",
            DataType::U32 => "uint32",
            DataType::I64 => "int64",
            DataType::U64 => "uint64",
            DataType::F32 => "float32",
            DataType::F64 => "float64",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown datatype name.
#[derive(Debug, thiserror::Error)]
#[error("unknown datatype name: {0:?}")]
pub struct ParseDataTypeError(pub String);

impl FromStr for DataType {
    type Err = ParseDataTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int8" => Ok(DataType::I8),
            "uint8" => Ok(DataType::U8),
            "int16" => Ok(DataType::I16),
            "uint16" => Ok(DataType::U16),
            "int32" => Ok(DataType::I32),
            "uint32" => Ok(DataType::U32),
            "int64" => Ok(DataType::I64),
            "uint64" => Ok(DataType::U64),
            "float32" => Ok(DataType::F32),
            "float64" => Ok(DataType::F64),
            other => Err(ParseDataTypeError(other.to_owned())),
        }
    }
}

/// A Rust primitive usable as an array component.
///
/// Implemented for exactly the ten types listed by [`DataType`]; the
/// `AsPrimitive` bounds give the conversion engine a plain `as` cast to every
/// other component type.
pub trait Scalar:
    Copy
    + PartialEq
    + Send
    + Sync
    + 'static
    + AsPrimitive<i8>
    + AsPrimitive<u8>
    + AsPrimitive<i16>
    + AsPrimitive<u16>
    + AsPrimitive<i32>
    + AsPrimitive<u32>
    + AsPrimitive<i64>
    + AsPrimitive<u64>
    + AsPrimitive<f32>
    + AsPrimitive<f64>
{
    /// The [`DataType`] this primitive stores as.
    const TYPE: DataType;
}

macro_rules! impl_scalar {
    ($($ty:ty => $dtype:ident),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const TYPE: DataType = DataType::$dtype;
            }
        )*
    };
}

impl_scalar! {
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
}
