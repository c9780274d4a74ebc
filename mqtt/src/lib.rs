//! MQTT 3.1.1 control packets built on the bitstruct codec.
//!
//! Every packet is an ordinary [`codec::BinaryStruct`]: the fixed header is
//! three fields at the front of its description (type nibble, flags nibble,
//! variable-length remaining length) and the body follows. Packet-specific
//! rules that a field layout cannot express live in
//! [`ControlPacket::validate`].
//!
//! ```
//! use mqtt::{decode_packet, Packet, PublishPacket};
//!
//! let packet = Packet::Publish(PublishPacket::new("a/b", b"hi".to_vec()));
//! let bytes = packet.to_bytes().unwrap();
//! assert_eq!(bytes, [0x30, 7, 0x00, 0x03, b'a', b'/', b'b', b'h', b'i']);
//! assert_eq!(decode_packet(&bytes).unwrap().packet_type(), packet.packet_type());
//! ```

mod error;
mod header;
mod packet;
mod varint;

pub use error::{MqttError, MqttResult};
pub use header::{FixedHeader, PacketType};
pub use packet::{
    decode_packet, encode_packet, read_packet, write_packet, ConnAckPacket, ConnectPacket,
    ConnectReturnCode, ControlPacket, DisconnectPacket, Packet, PacketIdSerializer,
    PingReqPacket, PingRespPacket, PubAckPacket, PubCompPacket, PubRecPacket, PubRelPacket,
    PublishPacket, PublishPayloadSerializer, SubAckCode, SubAckCodes, SubAckPacket,
    SubscribePacket, Subscription, Subscriptions, TopicFilter, TopicFilters, UnsubAckPacket,
    UnsubscribePacket,
};
pub use varint::VariableIntSerializer;
