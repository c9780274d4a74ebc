//! PUBLISH and its optional packet identifier and unframed payload.

use std::any::Any;
use std::io::{self, Read, Write};

use codec::{
    BinaryStruct, CodecConfig, CodecError, CodecResult, FieldDescriptor, FieldRef,
    FieldSerializer, FieldValue, LengthPrefixedSerializer, LimitKind, ValueKind,
};

use super::{header_field, parent, ControlPacket};
use crate::error::{MqttError, MqttResult};
use crate::header::{FixedHeader, PacketType};

const DUP_FLAG: u8 = 0b1000;
const QOS_MASK: u8 = 0b0110;
const RETAIN_FLAG: u8 = 0b0001;

/// Application message sent in either direction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PublishPacket {
    pub header: FixedHeader,
    pub dup: bool,
    pub qos: u8,
    pub retain: bool,
    pub topic: String,
    /// Present exactly when `qos > 0`.
    pub packet_id: Option<u16>,
    pub payload: Vec<u8>,
}

impl PublishPacket {
    /// A QoS 0 message.
    #[must_use]
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            ..Self::default()
        }
    }

    /// Upgrades the message to `qos` with the given packet identifier.
    #[must_use]
    pub const fn with_qos(mut self, qos: u8, packet_id: u16) -> Self {
        self.qos = qos;
        self.packet_id = Some(packet_id);
        self
    }

    fn payload_len(&self) -> Option<usize> {
        let id_len = if self.qos > 0 { 2 } else { 0 };
        (self.header.remaining_length as usize)
            .checked_sub(2 + self.topic.len())
            .and_then(|rest| rest.checked_sub(id_len))
    }
}

impl BinaryStruct for PublishPacket {
    fn describe() -> Vec<FieldDescriptor> {
        let mut fields = FixedHeader::fields();
        fields.extend([
            FieldDescriptor::custom::<LengthPrefixedSerializer>(2001, "topic", ValueKind::Str),
            FieldDescriptor::custom::<PacketIdSerializer>(2002, "packet_id", ValueKind::Custom),
            FieldDescriptor::custom::<PublishPayloadSerializer>(3000, "payload", ValueKind::Bytes),
        ]);
        fields
    }

    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        if FixedHeader::is_header_field(name) {
            return header_field(self, name);
        }
        match name {
            "topic" => Some(FieldRef::Str(&self.topic)),
            "packet_id" => Some(FieldRef::Custom(&self.packet_id)),
            "payload" => Some(FieldRef::Bytes(&self.payload)),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> CodecResult<()> {
        if FixedHeader::is_header_field(name) {
            self.header.set::<Self>(name, value)?;
            if name == FixedHeader::FLAGS {
                let flags = self.header.flags;
                self.dup = flags & DUP_FLAG != 0;
                self.qos = (flags & QOS_MASK) >> 1;
                self.retain = flags & RETAIN_FLAG != 0;
            }
            return Ok(());
        }
        match name {
            "topic" => self.topic = value.into_string()?,
            "packet_id" => self.packet_id = value.into_custom()?,
            "payload" => self.payload = value.into_bytes()?,
            _ => return Err(CodecError::unknown_field::<Self>(name)),
        }
        Ok(())
    }
}

impl ControlPacket for PublishPacket {
    const TYPE: PacketType = PacketType::Publish;

    fn header(&self) -> &FixedHeader {
        &self.header
    }

    fn remaining_length(&self) -> usize {
        let id_len = if self.packet_id.is_some() { 2 } else { 0 };
        2 + self.topic.len() + id_len + self.payload.len()
    }

    fn flags(&self) -> u8 {
        (u8::from(self.dup) << 3) | ((self.qos << 1) & QOS_MASK) | u8::from(self.retain)
    }

    fn validate(&self) -> MqttResult<()> {
        let invalid = |reason| {
            Err(MqttError::InvalidPacket {
                packet: PacketType::Publish,
                reason,
            })
        };
        if self.qos > 2 {
            return invalid("QoS 3 is reserved");
        }
        if (self.qos > 0) != self.packet_id.is_some() {
            return invalid("packet id must be present exactly when QoS is above 0");
        }
        if self.dup && self.qos == 0 {
            return invalid("DUP flag set on a QoS 0 message");
        }
        Ok(())
    }
}

fn read_exact_or_corrupt(
    source: &mut dyn Read,
    buf: &mut [u8],
    field: &FieldDescriptor,
) -> CodecResult<()> {
    source.read_exact(buf).map_err(|err| match err.kind() {
        io::ErrorKind::UnexpectedEof => CodecError::StreamCorrupted {
            field: field.name,
            reason: format!("stream ended inside {} bytes", buf.len()),
        },
        _ => CodecError::Io(err),
    })
}

/// Two-byte packet identifier, present only for QoS 1 and 2 messages.
///
/// The value is an `Option<u16>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PacketIdSerializer;

impl FieldSerializer for PacketIdSerializer {
    fn read(
        &self,
        source: &mut dyn Read,
        field: &FieldDescriptor,
        parent_struct: &dyn Any,
        _config: &CodecConfig,
    ) -> CodecResult<FieldValue> {
        let packet = parent::<PublishPacket>(parent_struct)?;
        if packet.qos == 0 {
            return Ok(FieldValue::Custom(Box::new(None::<u16>)));
        }
        let mut id = [0u8; 2];
        read_exact_or_corrupt(source, &mut id, field)?;
        Ok(FieldValue::Custom(Box::new(Some(u16::from_be_bytes(id)))))
    }

    fn write(
        &self,
        sink: &mut dyn Write,
        value: FieldRef<'_>,
        _field: &FieldDescriptor,
        _config: &CodecConfig,
    ) -> CodecResult<()> {
        if let Some(id) = value.as_custom::<Option<u16>>()? {
            sink.write_all(&id.to_be_bytes())?;
        }
        Ok(())
    }
}

/// Application payload: whatever the remaining length leaves after the
/// variable header.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublishPayloadSerializer;

impl FieldSerializer for PublishPayloadSerializer {
    fn read(
        &self,
        source: &mut dyn Read,
        field: &FieldDescriptor,
        parent_struct: &dyn Any,
        config: &CodecConfig,
    ) -> CodecResult<FieldValue> {
        let packet = parent::<PublishPacket>(parent_struct)?;
        let len = packet
            .payload_len()
            .ok_or_else(|| CodecError::StreamCorrupted {
                field: field.name,
                reason: format!(
                    "remaining length {} is shorter than the variable header",
                    packet.header.remaining_length
                ),
            })?;
        if len > config.limits.max_field_bytes {
            return Err(CodecError::LimitsExceeded {
                kind: LimitKind::FieldBytes,
                limit: config.limits.max_field_bytes,
                actual: len,
            });
        }
        let mut payload = vec![0u8; len];
        read_exact_or_corrupt(source, &mut payload, field)?;
        Ok(FieldValue::Bytes(payload))
    }

    fn write(
        &self,
        sink: &mut dyn Write,
        value: FieldRef<'_>,
        _field: &FieldDescriptor,
        _config: &CodecConfig,
    ) -> CodecResult<()> {
        sink.write_all(value.as_bytes()?)?;
        Ok(())
    }
}
