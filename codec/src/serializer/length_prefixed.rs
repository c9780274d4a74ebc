//! Two-byte big-endian length prefix followed by the payload.

use std::any::Any;
use std::io::{self, Read, Write};

use super::FieldSerializer;
use crate::config::CodecConfig;
use crate::error::{CodecError, CodecResult, LimitKind};
use crate::field::{FieldDescriptor, ValueKind};
use crate::value::{FieldRef, FieldValue};

/// Serializes `Str` fields as UTF-8 text and `Bytes` fields as raw bytes,
/// each preceded by a `u16` big-endian byte count.
#[derive(Debug, Clone, Copy, Default)]
pub struct LengthPrefixedSerializer;

impl LengthPrefixedSerializer {
    pub const MAX_LEN: usize = u16::MAX as usize;
}

impl FieldSerializer for LengthPrefixedSerializer {
    fn read(
        &self,
        source: &mut dyn Read,
        field: &FieldDescriptor,
        _parent: &dyn Any,
        config: &CodecConfig,
    ) -> CodecResult<FieldValue> {
        let mut prefix = [0u8; 2];
        read_payload(source, &mut prefix, field, "length prefix")?;
        let len = usize::from(u16::from_be_bytes(prefix));
        if len > config.limits.max_field_bytes {
            return Err(CodecError::LimitsExceeded {
                kind: LimitKind::FieldBytes,
                limit: config.limits.max_field_bytes,
                actual: len,
            });
        }

        let mut payload = vec![0u8; len];
        read_payload(source, &mut payload, field, "payload")?;

        match field.kind {
            ValueKind::Str => String::from_utf8(payload).map(FieldValue::Str).map_err(|err| {
                CodecError::StreamCorrupted {
                    field: field.name,
                    reason: format!("invalid utf-8 text: {err}"),
                }
            }),
            ValueKind::Bytes => Ok(FieldValue::Bytes(payload)),
            other => Err(CodecError::TypeMismatch {
                expected: ValueKind::Bytes,
                found: other,
            }),
        }
    }

    fn write(
        &self,
        sink: &mut dyn Write,
        value: FieldRef<'_>,
        field: &FieldDescriptor,
        _config: &CodecConfig,
    ) -> CodecResult<()> {
        let payload = value.as_bytes()?;
        let len = u16::try_from(payload.len()).map_err(|_| CodecError::ValueOutOfRange {
            field: field.name,
            value: payload.len() as u64,
            bits: 16,
        })?;
        sink.write_all(&len.to_be_bytes())?;
        sink.write_all(payload)?;
        Ok(())
    }
}

fn read_payload(
    source: &mut dyn Read,
    buf: &mut [u8],
    field: &FieldDescriptor,
    part: &str,
) -> CodecResult<()> {
    source.read_exact(buf).map_err(|err| match err.kind() {
        io::ErrorKind::UnexpectedEof => CodecError::StreamCorrupted {
            field: field.name,
            reason: format!("stream ended inside {part} of {} bytes", buf.len()),
        },
        _ => CodecError::Io(err),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_field() -> FieldDescriptor {
        FieldDescriptor::custom::<LengthPrefixedSerializer>(1, "topic", ValueKind::Str)
    }

    fn read(bytes: &[u8], field: &FieldDescriptor) -> CodecResult<FieldValue> {
        let mut source = bytes;
        LengthPrefixedSerializer.read(&mut source, field, &(), &CodecConfig::default())
    }

    #[test]
    fn reads_text() {
        let value = read(&[0x00, 0x03, b'a', b'/', b'b', 0xFF], &text_field()).unwrap();
        assert_eq!(value.into_string().unwrap(), "a/b");
    }

    #[test]
    fn reads_bytes() {
        let field = FieldDescriptor::custom::<LengthPrefixedSerializer>(1, "data", ValueKind::Bytes);
        let value = read(&[0x00, 0x02, 0xDE, 0xAD], &field).unwrap();
        assert_eq!(value.into_bytes().unwrap(), vec![0xDE, 0xAD]);
    }

    #[test]
    fn short_payload_is_corruption() {
        let err = read(&[0x00, 0x05, b'a'], &text_field()).unwrap_err();
        assert!(matches!(err, CodecError::StreamCorrupted { field: "topic", .. }));
    }

    #[test]
    fn missing_prefix_is_corruption() {
        let err = read(&[0x00], &text_field()).unwrap_err();
        assert!(matches!(err, CodecError::StreamCorrupted { .. }));
    }

    #[test]
    fn length_above_limit_is_rejected() {
        let mut source: &[u8] = &[0x01, 0x00];
        let config = CodecConfig::default().with_limits(crate::CodecLimits::for_testing());
        let err = LengthPrefixedSerializer
            .read(&mut source, &text_field(), &(), &config)
            .unwrap_err();
        assert!(matches!(
            err,
            CodecError::LimitsExceeded {
                kind: LimitKind::FieldBytes,
                actual: 256,
                ..
            }
        ));
    }

    #[test]
    fn writes_prefix_and_payload() {
        let mut sink = Vec::new();
        LengthPrefixedSerializer
            .write(
                &mut sink,
                FieldRef::Str("hi"),
                &text_field(),
                &CodecConfig::default(),
            )
            .unwrap();
        assert_eq!(sink, vec![0x00, 0x02, b'h', b'i']);
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let payload = vec![0u8; LengthPrefixedSerializer::MAX_LEN + 1];
        let mut sink = Vec::new();
        let err = LengthPrefixedSerializer
            .write(
                &mut sink,
                FieldRef::Bytes(&payload),
                &text_field(),
                &CodecConfig::default(),
            )
            .unwrap_err();
        assert!(matches!(err, CodecError::ValueOutOfRange { bits: 16, .. }));
        assert!(sink.is_empty());
    }
}
