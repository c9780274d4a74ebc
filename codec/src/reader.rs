//! Struct reader: populates structs field by field from a byte source.

use std::any::Any;
use std::io::Read;

use bitstream::{BitCursor, BitReader};
use tracing::{debug, trace};

use crate::config::CodecConfig;
use crate::error::{CodecError, CodecResult};
use crate::field::{FieldDescriptor, FieldWidth, SerializerRef};
use crate::serializer::SerializerRegistry;
use crate::shape::{field_bits, resolve, BinaryStruct};
use crate::value::{decode_fixed, FieldValue};

/// Reads binary structs from a blocking byte source.
///
/// The bit cursor persists between calls: if one struct ends mid-byte, the
/// next struct read from the same reader starts at the following bit.
#[derive(Debug)]
pub struct StructReader<R: Read> {
    bits: BitReader<R>,
    config: CodecConfig,
}

impl<R: Read> StructReader<R> {
    /// Creates a reader over `source` with the default configuration.
    #[must_use]
    pub fn new(source: R) -> Self {
        Self::with_config(source, CodecConfig::default())
    }

    /// Creates a reader over `source` with the given limits and serializer policy.
    #[must_use]
    pub fn with_config(source: R, config: CodecConfig) -> Self {
        Self {
            bits: BitReader::new(source),
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Total bytes pulled from the source.
    #[must_use]
    pub const fn bytes_read(&self) -> u64 {
        self.bits.bytes_read()
    }

    /// The partially consumed byte carried into the next read, if any.
    #[must_use]
    pub const fn cursor(&self) -> BitCursor {
        self.bits.cursor()
    }

    /// Populates `target` in ascending field order.
    ///
    /// Returns the number of bytes pulled from the source during this call.
    /// A byte partially consumed by an earlier call is not counted again.
    ///
    /// # Errors
    ///
    /// Any failure aborts the read and leaves `target` partially populated;
    /// the stream should be treated as unusable.
    pub fn read<T: BinaryStruct>(&mut self, target: &mut T) -> CodecResult<usize> {
        let shape = resolve::<T>()?;
        let start = self.bits.bytes_read();
        for field in shape.fields() {
            let value = match &field.width {
                FieldWidth::Custom(serializer) => self.read_custom(field, serializer, target)?,
                FieldWidth::Bits(_) | FieldWidth::LengthOf { .. } => {
                    self.read_fixed(field, target)?
                }
            };
            target.set_field(field.name, value)?;
        }
        let consumed = self.bits.bytes_read() - start;
        Ok(usize::try_from(consumed).unwrap_or(usize::MAX))
    }

    /// Reads a new `T` starting from its default value.
    pub fn read_new<T: BinaryStruct + Default>(&mut self) -> CodecResult<T> {
        let mut target = T::default();
        self.read(&mut target)?;
        Ok(target)
    }

    /// Unwraps the reader, dropping any partially consumed byte.
    pub fn into_inner(self) -> R {
        self.bits.into_inner()
    }

    fn read_fixed<T: BinaryStruct>(
        &mut self,
        field: &FieldDescriptor,
        target: &T,
    ) -> CodecResult<FieldValue> {
        let bits = field_bits(field, target, &self.config.limits)?;
        let raw = self
            .bits
            .read_field(bits)
            .map_err(|err| CodecError::in_field(field.name, err))?;
        trace!(field = field.name, bits, "read field");
        decode_fixed(field, bits, raw)
    }

    fn read_custom<T: BinaryStruct>(
        &mut self,
        field: &FieldDescriptor,
        serializer: &SerializerRef,
        target: &T,
    ) -> CodecResult<FieldValue> {
        let dropped = self.bits.align_to_byte();
        if dropped > 0 {
            debug!(
                field = field.name,
                dropped, "discarding partial byte before custom field"
            );
        }
        let instance =
            SerializerRegistry::global().resolve(serializer, self.config.serializer_cache);
        let parent: &dyn Any = target;
        let value = instance.read(&mut self.bits, field, parent, &self.config)?;
        trace!(field = field.name, serializer = serializer.name(), "read custom field");
        Ok(value)
    }
}

/// Populates `target` from the start of `bytes`.
///
/// Returns the number of bytes consumed; trailing bytes are ignored.
pub fn read_from_slice<T: BinaryStruct>(target: &mut T, bytes: &[u8]) -> CodecResult<usize> {
    StructReader::new(bytes).read(target)
}
