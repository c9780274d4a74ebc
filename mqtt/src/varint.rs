//! MQTT variable byte integer ("remaining length").

use std::any::Any;
use std::io::{self, Read, Write};

use codec::{
    CodecConfig, CodecError, CodecResult, FieldDescriptor, FieldRef, FieldSerializer, FieldValue,
};

/// Seven value bits per byte, least significant group first; the high bit
/// marks a continuation. At most four bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct VariableIntSerializer;

impl VariableIntSerializer {
    pub const MAX_VALUE: u32 = 268_435_455;
    pub const MAX_BYTES: usize = 4;

    /// Number of bytes `value` occupies on the wire.
    #[must_use]
    pub const fn encoded_len(value: u32) -> usize {
        match value {
            0..=127 => 1,
            128..=16_383 => 2,
            16_384..=2_097_151 => 3,
            _ => 4,
        }
    }
}

impl FieldSerializer for VariableIntSerializer {
    fn read(
        &self,
        source: &mut dyn Read,
        field: &FieldDescriptor,
        _parent: &dyn Any,
        _config: &CodecConfig,
    ) -> CodecResult<FieldValue> {
        let mut value = 0u32;
        for position in 0..Self::MAX_BYTES {
            let mut byte = [0u8; 1];
            source.read_exact(&mut byte).map_err(|err| match err.kind() {
                io::ErrorKind::UnexpectedEof => CodecError::StreamCorrupted {
                    field: field.name,
                    reason: "stream ended inside variable length integer".to_owned(),
                },
                _ => CodecError::Io(err),
            })?;
            value |= u32::from(byte[0] & 0x7F) << (7 * position);
            if byte[0] & 0x80 == 0 {
                return Ok(FieldValue::Int(u64::from(value)));
            }
        }
        Err(CodecError::StreamCorrupted {
            field: field.name,
            reason: format!("variable length integer exceeds {} bytes", Self::MAX_BYTES),
        })
    }

    fn write(
        &self,
        sink: &mut dyn Write,
        value: FieldRef<'_>,
        field: &FieldDescriptor,
        _config: &CodecConfig,
    ) -> CodecResult<()> {
        let raw = value.as_int()?;
        let mut remaining = u32::try_from(raw)
            .ok()
            .filter(|value| *value <= Self::MAX_VALUE)
            .ok_or(CodecError::ValueOutOfRange {
                field: field.name,
                value: raw,
                bits: 28,
            })?;

        let mut encoded = [0u8; Self::MAX_BYTES];
        let mut len = 0;
        loop {
            let mut byte = (remaining % 128) as u8;
            remaining /= 128;
            if remaining > 0 {
                byte |= 0x80;
            }
            encoded[len] = byte;
            len += 1;
            if remaining == 0 {
                break;
            }
        }
        sink.write_all(&encoded[..len])?;
        Ok(())
    }
}
