//! Field descriptors: how one struct field maps onto the bitstream.

use std::any::{type_name, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::serializer::FieldSerializer;

/// Semantic type of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueKind {
    /// Nonzero on the wire reads as `true`.
    Bool,
    /// Unsigned big-endian integer, at most 64 bits.
    Int,
    /// A single byte, at most 8 bits.
    Byte,
    /// Text (UTF-8).
    Str,
    /// Raw bytes.
    Bytes,
    /// Anything else; requires a custom serializer.
    Custom,
}

impl ValueKind {
    /// Widest fixed bit width the kind can hold, if bounded.
    #[must_use]
    pub const fn max_bits(self) -> Option<u32> {
        match self {
            Self::Bool | Self::Byte => Some(8),
            Self::Int => Some(64),
            Self::Str | Self::Bytes | Self::Custom => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "integer",
            Self::Byte => "byte",
            Self::Str => "string",
            Self::Bytes => "bytes",
            Self::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// Names a [`FieldSerializer`] implementation.
///
/// Equality is by implementation type; the reference also knows how to build
/// a fresh instance of that type.
#[derive(Clone, Copy)]
pub struct SerializerRef {
    type_id: TypeId,
    name: &'static str,
    make: fn() -> Arc<dyn FieldSerializer>,
}

impl SerializerRef {
    /// References serializer type `S`.
    #[must_use]
    pub fn of<S: FieldSerializer + Default>() -> Self {
        Self {
            type_id: TypeId::of::<S>(),
            name: type_name::<S>(),
            make: make_serializer::<S>,
        }
    }

    /// Identity of the serializer type.
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Rust path of the serializer type.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Builds a new, unshared instance.
    #[must_use]
    pub fn instantiate(&self) -> Arc<dyn FieldSerializer> {
        (self.make)()
    }
}

fn make_serializer<S: FieldSerializer + Default>() -> Arc<dyn FieldSerializer> {
    Arc::new(S::default())
}

impl PartialEq for SerializerRef {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for SerializerRef {}

impl fmt::Debug for SerializerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SerializerRef").field(&self.name).finish()
    }
}

/// Where a field's size comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldWidth {
    /// A fixed number of bits.
    Bits(u32),
    /// The current value of an earlier integer field times `multiplier` bits.
    LengthOf {
        field: &'static str,
        multiplier: u32,
    },
    /// The field is read and written wholesale by a serializer.
    Custom(SerializerRef),
}

/// Metadata for one field of a binary struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Fields are read and written in ascending index order.
    pub index: u32,
    pub name: &'static str,
    pub kind: ValueKind,
    pub width: FieldWidth,
}

impl FieldDescriptor {
    /// Default multiplier for length-referenced fields: lengths count bytes.
    pub const BYTE_MULTIPLIER: u32 = 8;

    #[must_use]
    pub const fn new(index: u32, name: &'static str, kind: ValueKind, width: FieldWidth) -> Self {
        Self {
            index,
            name,
            kind,
            width,
        }
    }

    /// A fixed-width field.
    #[must_use]
    pub const fn bits(index: u32, name: &'static str, kind: ValueKind, bits: u32) -> Self {
        Self::new(index, name, kind, FieldWidth::Bits(bits))
    }

    /// A one-bit flag.
    #[must_use]
    pub const fn bool(index: u32, name: &'static str) -> Self {
        Self::bits(index, name, ValueKind::Bool, 1)
    }

    /// An unsigned integer of `bits` bits.
    #[must_use]
    pub const fn int(index: u32, name: &'static str, bits: u32) -> Self {
        Self::bits(index, name, ValueKind::Int, bits)
    }

    /// A byte-valued field of up to 8 bits.
    #[must_use]
    pub const fn byte(index: u32, name: &'static str, bits: u32) -> Self {
        Self::bits(index, name, ValueKind::Byte, bits)
    }

    /// Text of exactly `len` bytes.
    #[must_use]
    pub const fn string(index: u32, name: &'static str, len: u32) -> Self {
        Self::bits(index, name, ValueKind::Str, len * 8)
    }

    /// Raw bytes, exactly `len` of them.
    #[must_use]
    pub const fn bytes(index: u32, name: &'static str, len: u32) -> Self {
        Self::bits(index, name, ValueKind::Bytes, len * 8)
    }

    /// A field whose length in bytes is held by the earlier field `length_field`.
    #[must_use]
    pub const fn variable(
        index: u32,
        name: &'static str,
        kind: ValueKind,
        length_field: &'static str,
    ) -> Self {
        Self::new(
            index,
            name,
            kind,
            FieldWidth::LengthOf {
                field: length_field,
                multiplier: Self::BYTE_MULTIPLIER,
            },
        )
    }

    /// Overrides the bits-per-unit of a length-referenced field.
    ///
    /// Has no effect on other widths.
    #[must_use]
    pub const fn multiplier(mut self, multiplier: u32) -> Self {
        if let FieldWidth::LengthOf { field, .. } = self.width {
            self.width = FieldWidth::LengthOf { field, multiplier };
        }
        self
    }

    /// A field handled by serializer `S`.
    #[must_use]
    pub fn custom<S: FieldSerializer + Default>(
        index: u32,
        name: &'static str,
        kind: ValueKind,
    ) -> Self {
        Self::new(index, name, kind, FieldWidth::Custom(SerializerRef::of::<S>()))
    }

    /// The serializer, for custom fields.
    #[must_use]
    pub const fn serializer(&self) -> Option<&SerializerRef> {
        match &self.width {
            FieldWidth::Custom(serializer) => Some(serializer),
            _ => None,
        }
    }

    /// The static width, for fixed-width fields.
    #[must_use]
    pub const fn fixed_bits(&self) -> Option<u32> {
        match self.width {
            FieldWidth::Bits(bits) => Some(bits),
            _ => None,
        }
    }
}
