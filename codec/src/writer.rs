//! Struct writer: serializes structs field by field into a byte sink.

use std::io::Write;

use bitstream::{BitWriter, PendingBits};
use tracing::{debug, trace};

use crate::config::CodecConfig;
use crate::error::{CodecError, CodecResult};
use crate::field::{FieldDescriptor, FieldWidth, SerializerRef};
use crate::serializer::SerializerRegistry;
use crate::shape::{field_bits, resolve, BinaryStruct};
use crate::value::{encode_fixed, FieldRef};

/// Writes binary structs to a blocking byte sink.
///
/// Bits that do not fill a whole byte stay pending across calls, so
/// consecutive structs pack without gaps. Call [`flush`](Self::flush) or
/// [`close`](Self::close) to emit the final partial byte.
#[derive(Debug)]
pub struct StructWriter<W: Write> {
    bits: BitWriter<W>,
    config: CodecConfig,
}

impl<W: Write> StructWriter<W> {
    /// Creates a writer over `sink` with the default configuration.
    #[must_use]
    pub fn new(sink: W) -> Self {
        Self::with_config(sink, CodecConfig::default())
    }

    /// Creates a writer over `sink` with the given limits and serializer policy.
    #[must_use]
    pub fn with_config(sink: W, config: CodecConfig) -> Self {
        Self {
            bits: BitWriter::new(sink),
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Total bytes emitted to the sink.
    #[must_use]
    pub const fn bytes_written(&self) -> u64 {
        self.bits.bytes_written()
    }

    /// Bits waiting for the rest of their byte.
    #[must_use]
    pub const fn pending(&self) -> PendingBits {
        self.bits.pending()
    }

    /// Serializes `source` in ascending field order.
    ///
    /// # Errors
    ///
    /// Fails on values that do not fit their declared width or length, on
    /// unknown fields and on sink errors. Bytes already emitted for earlier
    /// fields are not retracted.
    pub fn write<T: BinaryStruct>(&mut self, source: &T) -> CodecResult<()> {
        let shape = resolve::<T>()?;
        for field in shape.fields() {
            let value = source
                .field(field.name)
                .ok_or_else(|| CodecError::unknown_field::<T>(field.name))?;
            match &field.width {
                FieldWidth::Custom(serializer) => self.write_custom(field, serializer, value)?,
                FieldWidth::Bits(_) | FieldWidth::LengthOf { .. } => {
                    let bits = field_bits(field, source, &self.config.limits)?;
                    self.write_fixed(field, bits, value)?;
                }
            }
        }
        Ok(())
    }

    /// Emits any pending partial byte, zero-padded, and flushes the sink.
    ///
    /// Idempotent.
    pub fn flush(&mut self) -> CodecResult<()> {
        self.bits.flush()?;
        Ok(())
    }

    /// Flushes and returns the sink.
    pub fn close(self) -> CodecResult<W> {
        Ok(self.bits.into_inner()?)
    }

    fn write_fixed(
        &mut self,
        field: &FieldDescriptor,
        bits: usize,
        value: FieldRef<'_>,
    ) -> CodecResult<()> {
        let raw = encode_fixed(field, bits, value)?;
        self.bits
            .write_field(&raw, bits)
            .map_err(|err| CodecError::in_field(field.name, err))?;
        trace!(field = field.name, bits, "wrote field");
        Ok(())
    }

    fn write_custom(
        &mut self,
        field: &FieldDescriptor,
        serializer: &SerializerRef,
        value: FieldRef<'_>,
    ) -> CodecResult<()> {
        let padding = self.bits.align_to_byte()?;
        if padding > 0 {
            debug!(
                field = field.name,
                padding, "padding partial byte before custom field"
            );
        }
        let instance =
            SerializerRegistry::global().resolve(serializer, self.config.serializer_cache);
        instance.write(&mut self.bits, value, field, &self.config)?;
        trace!(field = field.name, serializer = serializer.name(), "wrote custom field");
        Ok(())
    }
}

/// Serializes `source` into a new byte vector, padding the last byte.
pub fn to_bytes<T: BinaryStruct>(source: &T) -> CodecResult<Vec<u8>> {
    let mut writer = StructWriter::new(Vec::new());
    writer.write(source)?;
    writer.close()
}
