//! Fixed header shared by every control packet.

use std::fmt;

use codec::{
    BinaryStruct, CodecError, CodecResult, FieldDescriptor, FieldRef, FieldValue, ValueKind,
};

use crate::error::MqttError;
use crate::varint::VariableIntSerializer;

/// Control packet type, the high nibble of the first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
#[repr(u8)]
pub enum PacketType {
    Connect = 1,
    ConnAck = 2,
    Publish = 3,
    PubAck = 4,
    PubRec = 5,
    PubRel = 6,
    PubComp = 7,
    Subscribe = 8,
    SubAck = 9,
    Unsubscribe = 10,
    UnsubAck = 11,
    PingReq = 12,
    PingResp = 13,
    Disconnect = 14,
}

impl PacketType {
    pub const ALL: [Self; 14] = [
        Self::Connect,
        Self::ConnAck,
        Self::Publish,
        Self::PubAck,
        Self::PubRec,
        Self::PubRel,
        Self::PubComp,
        Self::Subscribe,
        Self::SubAck,
        Self::Unsubscribe,
        Self::UnsubAck,
        Self::PingReq,
        Self::PingResp,
        Self::Disconnect,
    ];

    /// Parses a packet type from the high nibble of the first byte.
    pub fn parse(value: u8) -> Result<Self, MqttError> {
        Self::ALL
            .into_iter()
            .find(|ty| *ty as u8 == value)
            .ok_or(MqttError::UnknownPacketType { value })
    }

    /// The wire value.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }

    /// Flags the fixed header must carry; `None` when they carry data.
    #[must_use]
    pub const fn required_flags(self) -> Option<u8> {
        match self {
            Self::Publish => None,
            Self::PubRel | Self::Subscribe | Self::Unsubscribe => Some(0b0010),
            _ => Some(0),
        }
    }

    /// The control packet name used in the MQTT documentation.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::ConnAck => "CONNACK",
            Self::Publish => "PUBLISH",
            Self::PubAck => "PUBACK",
            Self::PubRec => "PUBREC",
            Self::PubRel => "PUBREL",
            Self::PubComp => "PUBCOMP",
            Self::Subscribe => "SUBSCRIBE",
            Self::SubAck => "SUBACK",
            Self::Unsubscribe => "UNSUBSCRIBE",
            Self::UnsubAck => "UNSUBACK",
            Self::PingReq => "PINGREQ",
            Self::PingResp => "PINGRESP",
            Self::Disconnect => "DISCONNECT",
        }
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The fixed header: type nibble, flags nibble and remaining length.
///
/// Packets embed it and list [`FixedHeader::fields`] ahead of their own
/// fields. When a packet is written its header values are derived from the
/// packet contents; the stored values only reflect what was read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FixedHeader {
    pub packet_type: u8,
    pub flags: u8,
    pub remaining_length: u32,
}

impl FixedHeader {
    pub const TYPE: &'static str = "type";
    pub const FLAGS: &'static str = "flags";
    pub const REMAINING_LENGTH: &'static str = "remaining_length";

    /// Field descriptors of the fixed header.
    #[must_use]
    pub fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::int(1, Self::TYPE, 4),
            FieldDescriptor::int(2, Self::FLAGS, 4),
            FieldDescriptor::custom::<VariableIntSerializer>(
                3,
                Self::REMAINING_LENGTH,
                ValueKind::Int,
            ),
        ]
    }

    #[must_use]
    pub fn is_header_field(name: &str) -> bool {
        matches!(name, Self::TYPE | Self::FLAGS | Self::REMAINING_LENGTH)
    }

    /// Total frame size in bytes: header plus remaining length.
    #[must_use]
    pub const fn frame_len(&self) -> usize {
        1 + VariableIntSerializer::encoded_len(self.remaining_length)
            + self.remaining_length as usize
    }

    /// Header values for a packet about to be written.
    pub(crate) fn derived(packet_type: PacketType, flags: u8, remaining_length: usize) -> Self {
        Self {
            packet_type: packet_type.raw(),
            flags,
            remaining_length: u32::try_from(remaining_length).unwrap_or(u32::MAX),
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<FieldRef<'static>> {
        match name {
            Self::TYPE => Some(FieldRef::int(self.packet_type)),
            Self::FLAGS => Some(FieldRef::int(self.flags)),
            Self::REMAINING_LENGTH => Some(FieldRef::int(self.remaining_length)),
            _ => None,
        }
    }

    pub(crate) fn set<T: ?Sized>(&mut self, name: &str, value: FieldValue) -> CodecResult<()> {
        match name {
            Self::TYPE => self.packet_type = value.into_int()?,
            Self::FLAGS => self.flags = value.into_int()?,
            Self::REMAINING_LENGTH => self.remaining_length = value.into_int()?,
            _ => return Err(CodecError::unknown_field::<T>(name)),
        }
        Ok(())
    }
}

impl BinaryStruct for FixedHeader {
    fn describe() -> Vec<FieldDescriptor> {
        Self::fields()
    }

    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        self.get(name)
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> CodecResult<()> {
        self.set::<Self>(name, value)
    }
}
