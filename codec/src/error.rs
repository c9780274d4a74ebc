//! Error types for struct encoding/decoding.

use std::fmt;

use thiserror::Error;

use crate::field::ValueKind;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// A struct's field list cannot describe a valid layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructDefinitionError {
    #[error("{ty}: fields `{first}` and `{second}` share index {index}")]
    DuplicateIndex {
        ty: &'static str,
        index: u32,
        first: &'static str,
        second: &'static str,
    },

    #[error("{ty}: field name `{field}` is declared twice")]
    DuplicateName {
        ty: &'static str,
        field: &'static str,
    },

    #[error("{ty}: field `{field}` has invalid width of {bits} bits for {kind}")]
    InvalidWidth {
        ty: &'static str,
        field: &'static str,
        kind: ValueKind,
        bits: u32,
    },

    #[error("{ty}: field `{field}` has a zero length multiplier")]
    InvalidMultiplier {
        ty: &'static str,
        field: &'static str,
    },

    #[error("{ty}: custom field `{field}` declares no serializer")]
    MissingSerializer {
        ty: &'static str,
        field: &'static str,
    },

    #[error("{ty}: field `{field}` takes its length from unknown field `{length_field}`")]
    UnknownLengthField {
        ty: &'static str,
        field: &'static str,
        length_field: &'static str,
    },

    #[error("{ty}: length field `{length_field}` must precede `{field}`")]
    LengthFieldOutOfOrder {
        ty: &'static str,
        field: &'static str,
        length_field: &'static str,
    },

    #[error("{ty}: {kind} field `{field}` cannot take its length from another field")]
    UnsizedKind {
        ty: &'static str,
        field: &'static str,
        kind: ValueKind,
    },

    #[error("{ty}: length field `{length_field}` of `{field}` is not an integer")]
    LengthFieldNotInteger {
        ty: &'static str,
        field: &'static str,
        length_field: &'static str,
    },
}

/// Errors that can occur while reading or writing structs.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The struct's field list is invalid.
    #[error("invalid struct definition: {0}")]
    Definition(#[from] StructDefinitionError),

    /// The source ended inside a field.
    #[error("stream ended inside field `{field}`: needed {needed} bits, {available} available")]
    IncompleteData {
        field: &'static str,
        needed: usize,
        available: usize,
    },

    /// The bytes read cannot be turned into the declared field.
    #[error("corrupted data in field `{field}`: {reason}")]
    StreamCorrupted { field: &'static str, reason: String },

    /// A value of one kind was used where another was expected.
    #[error("expected {expected} value, found {found}")]
    TypeMismatch {
        expected: ValueKind,
        found: ValueKind,
    },

    /// An integer does not fit the declared width.
    #[error("value {value} of field `{field}` does not fit in {bits} bits")]
    ValueOutOfRange {
        field: &'static str,
        value: u64,
        bits: usize,
    },

    /// A decoded integer does not fit the struct's integer type.
    #[error("value {value} does not fit in {target}")]
    IntegerOverflow { value: u64, target: &'static str },

    /// A field is wider than its kind can hold.
    #[error("field `{field}` of kind {kind} is {bits} bits wide, maximum is {max}")]
    FieldTooWide {
        field: &'static str,
        kind: ValueKind,
        bits: usize,
        max: usize,
    },

    /// Text or bytes do not match the declared length.
    #[error("field `{field}` expects {expected} bytes, got {actual}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The struct does not expose a field named in its description.
    #[error("{ty} has no accessible field `{field}`")]
    UnknownField { ty: &'static str, field: String },

    /// Configured limits were exceeded.
    #[error("{kind} limit exceeded: {actual} > {limit}")]
    LimitsExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
    },

    /// Bitstream error.
    #[error("bitstream error: {0}")]
    Bitstream(#[from] bitstream::BitError),

    /// The underlying source or sink failed outside a field.
    #[error("stream i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    /// Builds an [`UnknownField`](Self::UnknownField) error for struct `T`.
    pub fn unknown_field<T: ?Sized>(field: &str) -> Self {
        Self::UnknownField {
            ty: std::any::type_name::<T>(),
            field: field.to_owned(),
        }
    }

    /// True when the stream ended before or inside a struct.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        match self {
            Self::IncompleteData { .. } => true,
            Self::Bitstream(err) => err.is_eof(),
            Self::Io(err) => err.kind() == std::io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }

    /// Attaches the field name to a bitstream failure.
    pub(crate) fn in_field(field: &'static str, err: bitstream::BitError) -> Self {
        match err {
            bitstream::BitError::UnexpectedEof {
                requested,
                available,
            } => Self::IncompleteData {
                field,
                needed: requested,
                available,
            },
            other => Self::Bitstream(other),
        }
    }
}

/// Specific limit that was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    FieldBytes,
    ListItems,
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FieldBytes => "field bytes",
            Self::ListItems => "list items",
        };
        write!(f, "{name}")
    }
}
