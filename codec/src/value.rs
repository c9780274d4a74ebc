//! Values moving between structs and the codec.

use std::any::{type_name, Any};
use std::fmt;

use crate::error::{CodecError, CodecResult};
use crate::field::{FieldDescriptor, ValueKind};

/// An owned value produced by the reader and handed to
/// [`BinaryStruct::set_field`](crate::BinaryStruct::set_field).
pub enum FieldValue {
    Bool(bool),
    Int(u64),
    Byte(u8),
    Str(String),
    Bytes(Vec<u8>),
    /// Output of a custom serializer, e.g. a `Vec` of nested structs.
    Custom(Box<dyn Any + Send>),
}

impl FieldValue {
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Byte(_) => ValueKind::Byte,
            Self::Str(_) => ValueKind::Str,
            Self::Bytes(_) => ValueKind::Bytes,
            Self::Custom(_) => ValueKind::Custom,
        }
    }

    pub fn into_bool(self) -> CodecResult<bool> {
        match self {
            Self::Bool(value) => Ok(value),
            other => Err(mismatch(ValueKind::Bool, other.kind())),
        }
    }

    /// Converts an integer or byte value into any integer type it fits.
    pub fn into_int<T: TryFrom<u64>>(self) -> CodecResult<T> {
        let value = match self {
            Self::Int(value) => value,
            Self::Byte(value) => u64::from(value),
            other => return Err(mismatch(ValueKind::Int, other.kind())),
        };
        T::try_from(value).map_err(|_| CodecError::IntegerOverflow {
            value,
            target: type_name::<T>(),
        })
    }

    pub fn into_byte(self) -> CodecResult<u8> {
        match self {
            Self::Byte(value) => Ok(value),
            Self::Int(_) => self.into_int(),
            other => Err(mismatch(ValueKind::Byte, other.kind())),
        }
    }

    pub fn into_string(self) -> CodecResult<String> {
        match self {
            Self::Str(value) => Ok(value),
            other => Err(mismatch(ValueKind::Str, other.kind())),
        }
    }

    /// Raw bytes; text values yield their UTF-8 encoding.
    pub fn into_bytes(self) -> CodecResult<Vec<u8>> {
        match self {
            Self::Bytes(value) => Ok(value),
            Self::Str(value) => Ok(value.into_bytes()),
            other => Err(mismatch(ValueKind::Bytes, other.kind())),
        }
    }

    /// Downcasts a custom value to its concrete type.
    pub fn into_custom<T: Any>(self) -> CodecResult<T> {
        match self {
            Self::Custom(value) => value
                .downcast::<T>()
                .map(|boxed| *boxed)
                .map_err(|_| mismatch(ValueKind::Custom, ValueKind::Custom)),
            other => Err(mismatch(ValueKind::Custom, other.kind())),
        }
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => f.debug_tuple("Bool").field(value).finish(),
            Self::Int(value) => f.debug_tuple("Int").field(value).finish(),
            Self::Byte(value) => f.debug_tuple("Byte").field(value).finish(),
            Self::Str(value) => f.debug_tuple("Str").field(value).finish(),
            Self::Bytes(value) => f.debug_tuple("Bytes").field(value).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A borrowed view of a struct field, handed to the writer.
#[derive(Clone, Copy)]
pub enum FieldRef<'a> {
    Bool(bool),
    Int(u64),
    Byte(u8),
    Str(&'a str),
    Bytes(&'a [u8]),
    Custom(&'a dyn Any),
}

impl<'a> FieldRef<'a> {
    /// Widens any unsigned integer into an `Int` reference.
    pub fn int(value: impl Into<u64>) -> Self {
        Self::Int(value.into())
    }

    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Byte(_) => ValueKind::Byte,
            Self::Str(_) => ValueKind::Str,
            Self::Bytes(_) => ValueKind::Bytes,
            Self::Custom(_) => ValueKind::Custom,
        }
    }

    pub fn as_int(&self) -> CodecResult<u64> {
        match *self {
            Self::Int(value) => Ok(value),
            Self::Byte(value) => Ok(u64::from(value)),
            other => Err(mismatch(ValueKind::Int, other.kind())),
        }
    }

    /// Raw bytes of a text or byte value.
    pub fn as_bytes(&self) -> CodecResult<&'a [u8]> {
        match *self {
            Self::Bytes(value) => Ok(value),
            Self::Str(value) => Ok(value.as_bytes()),
            other => Err(mismatch(ValueKind::Bytes, other.kind())),
        }
    }

    /// Downcasts a custom reference to its concrete type.
    pub fn as_custom<T: Any>(&self) -> CodecResult<&'a T> {
        match *self {
            Self::Custom(value) => value
                .downcast_ref::<T>()
                .ok_or_else(|| mismatch(ValueKind::Custom, ValueKind::Custom)),
            other => Err(mismatch(ValueKind::Custom, other.kind())),
        }
    }
}

impl fmt::Debug for FieldRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => f.debug_tuple("Bool").field(value).finish(),
            Self::Int(value) => f.debug_tuple("Int").field(value).finish(),
            Self::Byte(value) => f.debug_tuple("Byte").field(value).finish(),
            Self::Str(value) => f.debug_tuple("Str").field(value).finish(),
            Self::Bytes(value) => f.debug_tuple("Bytes").field(value).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

fn mismatch(expected: ValueKind, found: ValueKind) -> CodecError {
    CodecError::TypeMismatch { expected, found }
}

/// Turns the right-aligned bytes of a fixed-width field into a value.
pub(crate) fn decode_fixed(
    field: &FieldDescriptor,
    bits: usize,
    raw: Vec<u8>,
) -> CodecResult<FieldValue> {
    match field.kind {
        ValueKind::Bool => {
            check_width(field, bits, 8)?;
            Ok(FieldValue::Bool(raw.iter().any(|byte| *byte != 0)))
        }
        ValueKind::Int => {
            check_width(field, bits, 64)?;
            Ok(FieldValue::Int(
                raw.iter()
                    .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte)),
            ))
        }
        ValueKind::Byte => {
            check_width(field, bits, 8)?;
            Ok(FieldValue::Byte(raw.first().copied().unwrap_or(0)))
        }
        ValueKind::Str => String::from_utf8(raw)
            .map(FieldValue::Str)
            .map_err(|err| CodecError::StreamCorrupted {
                field: field.name,
                reason: format!("invalid utf-8 text: {err}"),
            }),
        ValueKind::Bytes => Ok(FieldValue::Bytes(raw)),
        ValueKind::Custom => Err(mismatch(ValueKind::Bytes, ValueKind::Custom)),
    }
}

/// Produces the right-aligned big-endian bytes of a fixed-width field.
pub(crate) fn encode_fixed(
    field: &FieldDescriptor,
    bits: usize,
    value: FieldRef<'_>,
) -> CodecResult<Vec<u8>> {
    let len = bits.div_ceil(8);
    match field.kind {
        ValueKind::Bool => match value {
            FieldRef::Bool(flag) => encode_int(field, bits, u64::from(flag)),
            other => Err(mismatch(ValueKind::Bool, other.kind())),
        },
        ValueKind::Int | ValueKind::Byte => {
            let max = if field.kind == ValueKind::Int { 64 } else { 8 };
            check_width(field, bits, max)?;
            encode_int(field, bits, value.as_int()?)
        }
        ValueKind::Str | ValueKind::Bytes => {
            let bytes = value.as_bytes()?;
            if bytes.len() != len {
                return Err(CodecError::LengthMismatch {
                    field: field.name,
                    expected: len,
                    actual: bytes.len(),
                });
            }
            Ok(bytes.to_vec())
        }
        ValueKind::Custom => Err(mismatch(ValueKind::Bytes, ValueKind::Custom)),
    }
}

fn encode_int(field: &FieldDescriptor, bits: usize, value: u64) -> CodecResult<Vec<u8>> {
    check_width(field, bits, 64)?;
    if bits < 64 && value >= (1u64 << bits) {
        return Err(CodecError::ValueOutOfRange {
            field: field.name,
            value,
            bits,
        });
    }
    let bytes = value.to_be_bytes();
    Ok(bytes[8 - bits.div_ceil(8)..].to_vec())
}

fn check_width(field: &FieldDescriptor, bits: usize, max: usize) -> CodecResult<()> {
    if bits > max {
        return Err(CodecError::FieldTooWide {
            field: field.name,
            kind: field.kind,
            bits,
            max,
        });
    }
    Ok(())
}
