//! Conversion of raw provider strings into typed values.
//!
//! The destination is described by a [`Shape`]. Built-in shapes cover text,
//! bytes, regular expressions, booleans, every integer width, both float
//! widths, durations and comma-separated lists. User types plug in through
//! [`Shape::text`] (any [`FromStr`] type) or [`Shape::binary`] (any
//! [`FromBytes`] type); those shapes always take the user decoder, even for a
//! type that also has a built-in rule.
//!
//! ```
//! use confbind::{convert, convert_to, Shape};
//! use std::time::Duration;
//!
//! let ports: Vec<i32> = convert_to("80, 443").unwrap();
//! assert_eq!(ports, vec![80, 443]);
//!
//! let timeout = convert("1h30m", &Shape::Duration).unwrap();
//! assert_eq!(timeout.downcast_ref::<Duration>(), Some(&Duration::from_secs(5400)));
//! ```

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;
use std::time::Duration;

use regex::Regex;

use super::error::{BoxError, ConvertError};

/// Decoding from raw bytes, the binary counterpart of [`FromStr`].
pub trait FromBytes: Sized {
    type Err: Into<BoxError>;

    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Err>;
}

type DecodeFn = fn(&str) -> Result<Box<dyn Any + Send + Sync>, BoxError>;

/// A type-erased user decoder registered through [`Shape::text`] or [`Shape::binary`].
#[derive(Clone, Copy)]
pub struct Decoder {
    type_name: &'static str,
    decode: DecodeFn,
}

impl Decoder {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn decode(&self, raw: &str) -> Result<Box<dyn Any + Send + Sync>, ConvertError> {
        (self.decode)(raw).map_err(|source| ConvertError::Decode {
            type_name: self.type_name,
            source,
        })
    }
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Decoder").field(&self.type_name).finish()
    }
}

fn decode_text<T>(raw: &str) -> Result<Box<dyn Any + Send + Sync>, BoxError>
where
    T: FromStr + Send + Sync + 'static,
    T::Err: Into<BoxError>,
{
    match raw.parse::<T>() {
        Ok(value) => Ok(Box::new(value)),
        Err(e) => Err(e.into()),
    }
}

fn decode_binary<T>(raw: &str) -> Result<Box<dyn Any + Send + Sync>, BoxError>
where
    T: FromBytes + Send + Sync + 'static,
{
    match T::from_bytes(raw.as_bytes()) {
        Ok(value) => Ok(Box::new(value)),
        Err(e) => Err(e.into()),
    }
}

/// The destination a raw value is converted into.
#[derive(Debug, Clone, Copy)]
#[non_exhaustive]
pub enum Shape {
    /// A compiled [`Regex`].
    Pattern,
    DecodeText(Decoder),
    DecodeBinary(Decoder),
    Text,
    Bytes,
    /// Comma-separated strings. Pieces are trimmed and empty ones dropped.
    TextList,
    I32List,
    I64List,
    Bool,
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,
    Duration,
    /// A type with no conversion rule. Converting into it always fails.
    Unsupported(&'static str),
}

macro_rules! shape_table {
    ($id:expr; $($ty:ty => $shape:ident),* $(,)?) => {
        $(
            if $id == TypeId::of::<$ty>() {
                return Shape::$shape;
            }
        )*
    };
}

impl Shape {
    /// Picks the built-in shape for a Rust type.
    pub fn of<T: Any>() -> Shape {
        let id = TypeId::of::<T>();
        shape_table! { id;
            Regex => Pattern,
            String => Text,
            Vec<u8> => Bytes,
            Vec<String> => TextList,
            Vec<i32> => I32List,
            Vec<i64> => I64List,
            bool => Bool,
            i8 => I8,
            i16 => I16,
            i32 => I32,
            i64 => I64,
            i128 => I128,
            isize => Isize,
            u8 => U8,
            u16 => U16,
            u32 => U32,
            u64 => U64,
            u128 => U128,
            usize => Usize,
            f32 => F32,
            f64 => F64,
            Duration => Duration,
        }
        Shape::Unsupported(type_name::<T>())
    }

    /// Decodes through the type's [`FromStr`] implementation.
    pub fn text<T>() -> Shape
    where
        T: FromStr + Send + Sync + 'static,
        T::Err: Into<BoxError>,
    {
        Shape::DecodeText(Decoder {
            type_name: type_name::<T>(),
            decode: decode_text::<T>,
        })
    }

    /// Decodes the UTF-8 bytes of the raw value through [`FromBytes`].
    pub fn binary<T>() -> Shape
    where
        T: FromBytes + Send + Sync + 'static,
    {
        Shape::DecodeBinary(Decoder {
            type_name: type_name::<T>(),
            decode: decode_binary::<T>,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Shape::Pattern => "pattern",
            Shape::DecodeText(decoder) | Shape::DecodeBinary(decoder) => decoder.type_name,
            Shape::Text => "string",
            Shape::Bytes => "bytes",
            Shape::TextList => "string list",
            Shape::I32List => "i32 list",
            Shape::I64List => "i64 list",
            Shape::Bool => "bool",
            Shape::I8 => "i8",
            Shape::I16 => "i16",
            Shape::I32 => "i32",
            Shape::I64 => "i64",
            Shape::I128 => "i128",
            Shape::Isize => "isize",
            Shape::U8 => "u8",
            Shape::U16 => "u16",
            Shape::U32 => "u32",
            Shape::U64 => "u64",
            Shape::U128 => "u128",
            Shape::Usize => "usize",
            Shape::F32 => "f32",
            Shape::F64 => "f64",
            Shape::Duration => "duration",
            Shape::Unsupported(type_name) => *type_name,
        }
    }
}

/// A converted value. The variant always matches the [`Shape`] it came from.
#[derive(Debug)]
#[non_exhaustive]
pub enum Value {
    Pattern(Regex),
    Custom(Box<dyn Any + Send + Sync>),
    Text(String),
    Bytes(Vec<u8>),
    TextList(Vec<String>),
    I32List(Vec<i32>),
    I64List(Vec<i64>),
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    I128(i128),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    U128(u128),
    Usize(usize),
    F32(f32),
    F64(f64),
    Duration(Duration),
}

impl Value {
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        let any: &dyn Any = match self {
            Value::Pattern(v) => v,
            Value::Custom(v) => return (**v).downcast_ref(),
            Value::Text(v) => v,
            Value::Bytes(v) => v,
            Value::TextList(v) => v,
            Value::I32List(v) => v,
            Value::I64List(v) => v,
            Value::Bool(v) => v,
            Value::I8(v) => v,
            Value::I16(v) => v,
            Value::I32(v) => v,
            Value::I64(v) => v,
            Value::I128(v) => v,
            Value::Isize(v) => v,
            Value::U8(v) => v,
            Value::U16(v) => v,
            Value::U32(v) => v,
            Value::U64(v) => v,
            Value::U128(v) => v,
            Value::Usize(v) => v,
            Value::F32(v) => v,
            Value::F64(v) => v,
            Value::Duration(v) => v,
        };
        any.downcast_ref()
    }

    /// Extracts the value as `T`, or `None` if it holds a different type.
    pub fn downcast<T: Any>(self) -> Option<T> {
        let boxed: Box<dyn Any + Send + Sync> = match self {
            Value::Pattern(v) => Box::new(v),
            Value::Custom(v) => v,
            Value::Text(v) => Box::new(v),
            Value::Bytes(v) => Box::new(v),
            Value::TextList(v) => Box::new(v),
            Value::I32List(v) => Box::new(v),
            Value::I64List(v) => Box::new(v),
            Value::Bool(v) => Box::new(v),
            Value::I8(v) => Box::new(v),
            Value::I16(v) => Box::new(v),
            Value::I32(v) => Box::new(v),
            Value::I64(v) => Box::new(v),
            Value::I128(v) => Box::new(v),
            Value::Isize(v) => Box::new(v),
            Value::U8(v) => Box::new(v),
            Value::U16(v) => Box::new(v),
            Value::U32(v) => Box::new(v),
            Value::U64(v) => Box::new(v),
            Value::U128(v) => Box::new(v),
            Value::Usize(v) => Box::new(v),
            Value::F32(v) => Box::new(v),
            Value::F64(v) => Box::new(v),
            Value::Duration(v) => Box::new(v),
        };
        boxed.downcast::<T>().ok().map(|v| *v)
    }
}

/// Converts a raw string into the given shape.
pub fn convert(raw: &str, shape: &Shape) -> Result<Value, ConvertError> {
    let value = match shape {
        Shape::Pattern => Value::Pattern(Regex::new(raw)?),
        Shape::DecodeText(decoder) | Shape::DecodeBinary(decoder) => {
            Value::Custom(decoder.decode(raw)?)
        }
        Shape::Text => Value::Text(raw.to_string()),
        Shape::Bytes => Value::Bytes(raw.as_bytes().to_vec()),
        Shape::TextList => Value::TextList(split_list(raw).map(str::to_string).collect()),
        Shape::I32List => Value::I32List(parse_int_list(raw, &Shape::I32)?),
        Shape::I64List => Value::I64List(parse_int_list(raw, &Shape::I64)?),
        Shape::Bool => Value::Bool(parse_bool(raw)?),
        Shape::I8 => Value::I8(parse_int(raw, shape)?),
        Shape::I16 => Value::I16(parse_int(raw, shape)?),
        Shape::I32 => Value::I32(parse_int(raw, shape)?),
        Shape::I64 => Value::I64(parse_int(raw, shape)?),
        Shape::I128 => Value::I128(parse_int(raw, shape)?),
        Shape::Isize => Value::Isize(parse_int(raw, shape)?),
        Shape::U8 => Value::U8(parse_int(raw, shape)?),
        Shape::U16 => Value::U16(parse_int(raw, shape)?),
        Shape::U32 => Value::U32(parse_int(raw, shape)?),
        Shape::U64 => Value::U64(parse_int(raw, shape)?),
        Shape::U128 => Value::U128(parse_int(raw, shape)?),
        Shape::Usize => Value::Usize(parse_int(raw, shape)?),
        Shape::F32 => Value::F32(parse_float(raw, shape)?),
        Shape::F64 => Value::F64(parse_float(raw, shape)?),
        Shape::Duration => Value::Duration(parse_duration(raw)?),
        Shape::Unsupported(type_name) => {
            return Err(ConvertError::NotConvertible {
                type_name: *type_name,
            });
        }
    };
    Ok(value)
}

/// Converts a raw string into `T` using its built-in shape.
pub fn convert_to<T: Any>(raw: &str) -> Result<T, ConvertError> {
    convert(raw, &Shape::of::<T>())?
        .downcast()
        .ok_or(ConvertError::NotConvertible {
            type_name: type_name::<T>(),
        })
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|piece| !piece.is_empty())
}

fn parse_int_list<T>(raw: &str, element: &Shape) -> Result<Vec<T>, ConvertError>
where
    T: FromStr<Err = ParseIntError>,
{
    split_list(raw).map(|piece| parse_int(piece, element)).collect()
}

fn parse_int<T>(raw: &str, shape: &Shape) -> Result<T, ConvertError>
where
    T: FromStr<Err = ParseIntError>,
{
    raw.parse().map_err(|source| ConvertError::InvalidInt {
        raw: raw.to_string(),
        shape: shape.name(),
        source,
    })
}

fn parse_float<T>(raw: &str, shape: &Shape) -> Result<T, ConvertError>
where
    T: FromStr<Err = std::num::ParseFloatError> + Copy + Into<f64>,
{
    let value: T = raw.parse().map_err(|source| ConvertError::InvalidFloat {
        raw: raw.to_string(),
        shape: shape.name(),
        source,
    })?;

    // std saturates overflowing literals to infinity
    if Into::<f64>::into(value).is_infinite() && !spells_infinity(raw) {
        return Err(ConvertError::FloatOutOfRange {
            raw: raw.to_string(),
            shape: shape.name(),
        });
    }
    Ok(value)
}

fn spells_infinity(raw: &str) -> bool {
    let unsigned = raw
        .strip_prefix('+')
        .or_else(|| raw.strip_prefix('-'))
        .unwrap_or(raw);
    unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity")
}

fn parse_bool(raw: &str) -> Result<bool, ConvertError> {
    const TRUE: [&str; 3] = ["1", "t", "true"];
    const FALSE: [&str; 3] = ["0", "f", "false"];

    if TRUE.iter().any(|lit| raw.eq_ignore_ascii_case(lit)) {
        Ok(true)
    } else if FALSE.iter().any(|lit| raw.eq_ignore_ascii_case(lit)) {
        Ok(false)
    } else {
        Err(ConvertError::InvalidBool {
            raw: raw.to_string(),
        })
    }
}

fn parse_duration(raw: &str) -> Result<Duration, ConvertError> {
    humantime::parse_duration(raw).map_err(|source| ConvertError::InvalidDuration {
        raw: raw.to_string(),
        source,
    })
}
