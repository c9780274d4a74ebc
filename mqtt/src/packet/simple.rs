//! Packets whose body is a lone packet identifier, or nothing at all.

use codec::{BinaryStruct, CodecError, CodecResult, FieldDescriptor, FieldRef, FieldValue};

use super::{header_field, ControlPacket};
use crate::header::{FixedHeader, PacketType};

macro_rules! id_packet {
    ($(#[$meta:meta])* $name:ident => $ty:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize))]
        pub struct $name {
            pub header: FixedHeader,
            pub packet_id: u16,
        }

        impl $name {
            #[must_use]
            pub fn new(packet_id: u16) -> Self {
                Self {
                    packet_id,
                    ..Self::default()
                }
            }
        }

        impl BinaryStruct for $name {
            fn describe() -> Vec<FieldDescriptor> {
                let mut fields = FixedHeader::fields();
                fields.push(FieldDescriptor::int(2000, "packet_id", 16));
                fields
            }

            fn field(&self, name: &str) -> Option<FieldRef<'_>> {
                if FixedHeader::is_header_field(name) {
                    return header_field(self, name);
                }
                match name {
                    "packet_id" => Some(FieldRef::int(self.packet_id)),
                    _ => None,
                }
            }

            fn set_field(&mut self, name: &str, value: FieldValue) -> CodecResult<()> {
                if FixedHeader::is_header_field(name) {
                    return self.header.set::<Self>(name, value);
                }
                match name {
                    "packet_id" => self.packet_id = value.into_int()?,
                    _ => return Err(CodecError::unknown_field::<Self>(name)),
                }
                Ok(())
            }
        }

        impl ControlPacket for $name {
            const TYPE: PacketType = PacketType::$ty;

            fn header(&self) -> &FixedHeader {
                &self.header
            }

            fn remaining_length(&self) -> usize {
                2
            }
        }
    };
}

macro_rules! empty_packet {
    ($(#[$meta:meta])* $name:ident => $ty:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize))]
        pub struct $name {
            pub header: FixedHeader,
        }

        impl BinaryStruct for $name {
            fn describe() -> Vec<FieldDescriptor> {
                FixedHeader::fields()
            }

            fn field(&self, name: &str) -> Option<FieldRef<'_>> {
                header_field(self, name)
            }

            fn set_field(&mut self, name: &str, value: FieldValue) -> CodecResult<()> {
                self.header.set::<Self>(name, value)
            }
        }

        impl ControlPacket for $name {
            const TYPE: PacketType = PacketType::$ty;

            fn header(&self) -> &FixedHeader {
                &self.header
            }

            fn remaining_length(&self) -> usize {
                0
            }
        }
    };
}

id_packet!(
    /// Acknowledges a QoS 1 PUBLISH.
    PubAckPacket => PubAck
);
id_packet!(
    /// First acknowledgement of a QoS 2 PUBLISH.
    PubRecPacket => PubRec
);
id_packet!(
    /// Releases a QoS 2 PUBLISH after PUBREC.
    PubRelPacket => PubRel
);
id_packet!(
    /// Completes a QoS 2 exchange.
    PubCompPacket => PubComp
);
id_packet!(
    /// Acknowledges an UNSUBSCRIBE.
    UnsubAckPacket => UnsubAck
);

empty_packet!(
    /// Keep-alive probe from the client.
    PingReqPacket => PingReq
);
empty_packet!(PingRespPacket => PingResp);
empty_packet!(
    /// Clean disconnect notice from the client.
    DisconnectPacket => Disconnect
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MqttError;
    use crate::packet::{decode_packet, Packet};

    #[test]
    fn pubrel_carries_required_flags() {
        let bytes = Packet::PubRel(PubRelPacket::new(0xBEEF)).to_bytes().unwrap();
        assert_eq!(bytes, [0x62, 0x02, 0xBE, 0xEF]);

        let Packet::PubRel(decoded) = decode_packet(&bytes).unwrap() else {
            panic!("expected PUBREL");
        };
        assert_eq!(decoded.packet_id, 0xBEEF);
        assert_eq!(decoded.header.flags, 0b0010);
    }

    #[test]
    fn pubrel_without_flags_rejected() {
        let err = decode_packet(&[0x60, 0x02, 0x00, 0x01]).unwrap_err();
        assert!(matches!(
            err,
            MqttError::InvalidFlags {
                packet: PacketType::PubRel,
                flags: 0
            }
        ));
    }

    #[test]
    fn acknowledgements_round_trip() {
        for packet in [
            Packet::PubAck(PubAckPacket::new(1)),
            Packet::PubRec(PubRecPacket::new(2)),
            Packet::PubComp(PubCompPacket::new(3)),
            Packet::UnsubAck(UnsubAckPacket::new(4)),
        ] {
            let bytes = packet.to_bytes().unwrap();
            assert_eq!(bytes.len(), 4);
            assert_eq!(bytes[0] >> 4, packet.packet_type().raw());
            assert_eq!(decode_packet(&bytes).unwrap().packet_type(), packet.packet_type());
        }
    }

    #[test]
    fn empty_packets_are_two_bytes() {
        assert_eq!(
            Packet::PingResp(PingRespPacket::default()).to_bytes().unwrap(),
            [0xD0, 0x00]
        );
        assert_eq!(
            Packet::Disconnect(DisconnectPacket::default()).to_bytes().unwrap(),
            [0xE0, 0x00]
        );
    }

    #[test]
    fn truncated_packet_id_is_incomplete() {
        let err = decode_packet(&[0x40, 0x02, 0x00]).unwrap_err();
        assert!(err.is_eof());
    }
}
