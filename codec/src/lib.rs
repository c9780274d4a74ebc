//! Declarative bit-level struct encoding/decoding.
//!
//! A struct describes its fields once (index, bit width or length reference,
//! value kind, optional custom serializer). [`StructReader`] and
//! [`StructWriter`] walk that description in ascending index order and move
//! each field across the bitstream, packing sub-byte fields without gaps.
//!
//! # Features
//!
//! - Fixed-width fields of any bit count, crossing byte boundaries freely
//! - Variable-length fields sized by an earlier integer field
//! - Custom serializers for length-prefixed payloads and nested struct lists
//! - Process-wide caches for resolved shapes and serializer instances
//!
//! # Design Principles
//!
//! - **Explicit descriptions** - Field layout comes from [`BinaryStruct::describe`], never from introspection.
//! - **Big-endian integers** - Most significant byte first, always.
//! - **Fail loudly** - Truncated input and values that do not fit are errors.
//! - **No framing** - Protocol envelopes are ordinary fields of consumer structs.
//!
//! # Example
//!
//! ```
//! use codec::{BinaryStruct, CodecError, CodecResult, FieldDescriptor, FieldRef, FieldValue};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Pair {
//!     first: u16,
//!     second: u16,
//! }
//!
//! impl BinaryStruct for Pair {
//!     fn describe() -> Vec<FieldDescriptor> {
//!         vec![
//!             FieldDescriptor::int(1, "first", 12),
//!             FieldDescriptor::int(2, "second", 12),
//!         ]
//!     }
//!
//!     fn field(&self, name: &str) -> Option<FieldRef<'_>> {
//!         match name {
//!             "first" => Some(FieldRef::int(self.first)),
//!             "second" => Some(FieldRef::int(self.second)),
//!             _ => None,
//!         }
//!     }
//!
//!     fn set_field(&mut self, name: &str, value: FieldValue) -> CodecResult<()> {
//!         match name {
//!             "first" => self.first = value.into_int()?,
//!             "second" => self.second = value.into_int()?,
//!             _ => return Err(CodecError::unknown_field::<Self>(name)),
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let bytes = codec::to_bytes(&Pair { first: 1, second: 2048 }).unwrap();
//! assert_eq!(bytes, [0x00, 0x18, 0x00]);
//!
//! let mut decoded = Pair::default();
//! codec::read_from_slice(&mut decoded, &bytes).unwrap();
//! assert_eq!(decoded, Pair { first: 1, second: 2048 });
//! ```

mod config;
mod error;
mod field;
mod limits;
mod reader;
mod serializer;
mod shape;
mod value;
mod writer;

pub use bitstream::shift_left_by;
pub use config::{CodecConfig, SerializerCache};
pub use error::{CodecError, CodecResult, LimitKind, StructDefinitionError};
pub use field::{FieldDescriptor, FieldWidth, SerializerRef, ValueKind};
pub use limits::CodecLimits;
pub use reader::{read_from_slice, StructReader};
pub use serializer::{
    FieldSerializer, LengthPrefixedSerializer, SerializerRegistry, StructList,
    StructListSerializer,
};
pub use shape::{resolve, BinaryStruct, StructShape};
pub use value::{FieldRef, FieldValue};
pub use writer::{to_bytes, StructWriter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_exports() {
        let _ = CodecConfig::default();
        let _ = CodecLimits::for_testing();
        let _ = SerializerRef::of::<LengthPrefixedSerializer>();
        let _ = FieldDescriptor::bool(1, "flag");
        assert_eq!(shift_left_by(7, 32), 0);
    }
}
