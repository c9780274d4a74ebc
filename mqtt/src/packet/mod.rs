//! Control packets and the decode/encode dispatch.

mod connect;
mod publish;
mod simple;
mod subscribe;

use std::any::Any;
use std::io::{BufRead, Read, Write};

use codec::{
    BinaryStruct, CodecConfig, CodecError, CodecResult, FieldRef, StructReader, StructWriter,
    ValueKind,
};
use tracing::debug;

use crate::error::{MqttError, MqttResult};
use crate::header::{FixedHeader, PacketType};

pub use connect::{ConnAckPacket, ConnectPacket, ConnectReturnCode};
pub use publish::{PacketIdSerializer, PublishPacket, PublishPayloadSerializer};
pub use simple::{
    DisconnectPacket, PingReqPacket, PingRespPacket, PubAckPacket, PubCompPacket, PubRecPacket,
    PubRelPacket, UnsubAckPacket,
};
pub use subscribe::{
    SubAckCode, SubAckCodes, SubAckPacket, SubscribePacket, Subscription, Subscriptions,
    TopicFilter, TopicFilters, UnsubscribePacket,
};

/// A control packet declared as a binary struct.
///
/// The fixed header comes first in every description. On write its type,
/// flags and remaining length are derived from the packet itself.
pub trait ControlPacket: BinaryStruct + Default {
    const TYPE: PacketType;

    fn header(&self) -> &FixedHeader;

    /// Size of the variable header and payload in bytes.
    fn remaining_length(&self) -> usize;

    /// Flags nibble written into the fixed header.
    fn flags(&self) -> u8 {
        Self::TYPE.required_flags().unwrap_or(0)
    }

    /// Checks cross-field rules the wire layout cannot express.
    fn validate(&self) -> MqttResult<()> {
        Ok(())
    }
}

/// Fixed header field of a packet about to be written.
pub(crate) fn header_field<P: ControlPacket>(packet: &P, name: &str) -> Option<FieldRef<'static>> {
    FixedHeader::derived(P::TYPE, packet.flags(), packet.remaining_length()).get(name)
}

/// The struct a custom serializer is filling in.
pub(crate) fn parent<P: Any>(parent: &dyn Any) -> CodecResult<&P> {
    parent
        .downcast_ref::<P>()
        .ok_or(CodecError::TypeMismatch {
            expected: ValueKind::Custom,
            found: ValueKind::Custom,
        })
}

/// Any MQTT control packet.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "packet", rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Packet {
    Connect(ConnectPacket),
    ConnAck(ConnAckPacket),
    Publish(PublishPacket),
    PubAck(PubAckPacket),
    PubRec(PubRecPacket),
    PubRel(PubRelPacket),
    PubComp(PubCompPacket),
    Subscribe(SubscribePacket),
    SubAck(SubAckPacket),
    Unsubscribe(UnsubscribePacket),
    UnsubAck(UnsubAckPacket),
    PingReq(PingReqPacket),
    PingResp(PingRespPacket),
    Disconnect(DisconnectPacket),
}

macro_rules! dispatch {
    ($packet:expr, $inner:ident => $body:expr) => {
        match $packet {
            Packet::Connect($inner) => $body,
            Packet::ConnAck($inner) => $body,
            Packet::Publish($inner) => $body,
            Packet::PubAck($inner) => $body,
            Packet::PubRec($inner) => $body,
            Packet::PubRel($inner) => $body,
            Packet::PubComp($inner) => $body,
            Packet::Subscribe($inner) => $body,
            Packet::SubAck($inner) => $body,
            Packet::Unsubscribe($inner) => $body,
            Packet::UnsubAck($inner) => $body,
            Packet::PingReq($inner) => $body,
            Packet::PingResp($inner) => $body,
            Packet::Disconnect($inner) => $body,
        }
    };
}

impl Packet {
    #[must_use]
    pub fn packet_type(&self) -> PacketType {
        fn type_of<P: ControlPacket>(_: &P) -> PacketType {
            P::TYPE
        }
        dispatch!(self, p => type_of(p))
    }

    /// The fixed header as it was read.
    #[must_use]
    pub fn header(&self) -> &FixedHeader {
        dispatch!(self, p => p.header())
    }

    /// Encodes the packet into a new byte vector.
    pub fn to_bytes(&self) -> MqttResult<Vec<u8>> {
        let mut writer = StructWriter::new(Vec::new());
        write_packet(&mut writer, self)?;
        Ok(writer.close()?)
    }
}

/// Reads one packet, peeking at the type nibble to pick its struct.
///
/// # Errors
///
/// Besides codec failures, the packet is rejected when its fixed header
/// flags are invalid for its type or when its body does not span exactly the
/// declared remaining length.
pub fn read_packet<R: BufRead>(source: &mut R, config: &CodecConfig) -> MqttResult<Packet> {
    let first = *source.fill_buf()?.first().ok_or(MqttError::EndOfStream)?;
    let packet_type = PacketType::parse(first >> 4)?;
    let mut reader = StructReader::with_config(source, config.clone());
    let packet = match packet_type {
        PacketType::Connect => Packet::Connect(read_checked(&mut reader)?),
        PacketType::ConnAck => Packet::ConnAck(read_checked(&mut reader)?),
        PacketType::Publish => Packet::Publish(read_checked(&mut reader)?),
        PacketType::PubAck => Packet::PubAck(read_checked(&mut reader)?),
        PacketType::PubRec => Packet::PubRec(read_checked(&mut reader)?),
        PacketType::PubRel => Packet::PubRel(read_checked(&mut reader)?),
        PacketType::PubComp => Packet::PubComp(read_checked(&mut reader)?),
        PacketType::Subscribe => Packet::Subscribe(read_checked(&mut reader)?),
        PacketType::SubAck => Packet::SubAck(read_checked(&mut reader)?),
        PacketType::Unsubscribe => Packet::Unsubscribe(read_checked(&mut reader)?),
        PacketType::UnsubAck => Packet::UnsubAck(read_checked(&mut reader)?),
        PacketType::PingReq => Packet::PingReq(read_checked(&mut reader)?),
        PacketType::PingResp => Packet::PingResp(read_checked(&mut reader)?),
        PacketType::Disconnect => Packet::Disconnect(read_checked(&mut reader)?),
    };
    debug!(
        packet = %packet_type,
        remaining_length = packet.header().remaining_length,
        "decoded packet"
    );
    Ok(packet)
}

/// Decodes one packet from the start of `bytes` with default limits.
pub fn decode_packet(mut bytes: &[u8]) -> MqttResult<Packet> {
    read_packet(&mut bytes, &CodecConfig::default())
}

/// Writes one packet after checking its cross-field rules.
pub fn write_packet<W: Write>(writer: &mut StructWriter<W>, packet: &Packet) -> MqttResult<()> {
    dispatch!(packet, p => write_checked(writer, p))
}

/// Encodes one packet into a new byte vector.
pub fn encode_packet(packet: &Packet) -> MqttResult<Vec<u8>> {
    packet.to_bytes()
}

fn read_checked<P: ControlPacket, R: Read>(reader: &mut StructReader<R>) -> MqttResult<P> {
    let mut packet = P::default();
    let consumed = reader.read(&mut packet)?;

    let header = packet.header();
    if let Some(required) = P::TYPE.required_flags() {
        if header.flags != required {
            return Err(MqttError::InvalidFlags {
                packet: P::TYPE,
                flags: header.flags,
            });
        }
    }
    let declared = header.frame_len();
    if consumed != declared {
        return Err(MqttError::LengthMismatch {
            packet: P::TYPE,
            declared,
            actual: consumed,
        });
    }
    packet.validate()?;
    Ok(packet)
}

fn write_checked<P: ControlPacket, W: Write>(
    writer: &mut StructWriter<W>,
    packet: &P,
) -> MqttResult<()> {
    packet.validate()?;
    writer.write(packet)?;
    Ok(())
}
