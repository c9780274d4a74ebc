use std::sync::Arc;

use anyhow::{anyhow, Result};
use codec::{resolve, CodecResult, FieldDescriptor, FieldWidth, StructShape, ValueKind};
use mqtt::{
    ConnAckPacket, ConnectPacket, DisconnectPacket, PacketType, PingReqPacket, PingRespPacket,
    PubAckPacket, PubCompPacket, PubRecPacket, PubRelPacket, PublishPacket, SubAckPacket,
    SubscribePacket, UnsubAckPacket, UnsubscribePacket,
};
use serde::Serialize;

/// Accepts the MQTT name (`PINGREQ`) or the snake form (`ping_req`), any case.
pub fn parse_packet_type(name: &str) -> Result<PacketType> {
    let wanted: String = name
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .collect::<String>()
        .to_ascii_uppercase();
    PacketType::ALL
        .into_iter()
        .find(|ty| ty.name() == wanted)
        .ok_or_else(|| anyhow!("unknown packet type {name:?}"))
}

pub fn packet_shape(packet_type: PacketType) -> CodecResult<Arc<StructShape>> {
    match packet_type {
        PacketType::Connect => resolve::<ConnectPacket>(),
        PacketType::ConnAck => resolve::<ConnAckPacket>(),
        PacketType::Publish => resolve::<PublishPacket>(),
        PacketType::PubAck => resolve::<PubAckPacket>(),
        PacketType::PubRec => resolve::<PubRecPacket>(),
        PacketType::PubRel => resolve::<PubRelPacket>(),
        PacketType::PubComp => resolve::<PubCompPacket>(),
        PacketType::Subscribe => resolve::<SubscribePacket>(),
        PacketType::SubAck => resolve::<SubAckPacket>(),
        PacketType::Unsubscribe => resolve::<UnsubscribePacket>(),
        PacketType::UnsubAck => resolve::<UnsubAckPacket>(),
        PacketType::PingReq => resolve::<PingReqPacket>(),
        PacketType::PingResp => resolve::<PingRespPacket>(),
        PacketType::Disconnect => resolve::<DisconnectPacket>(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ShapeReport {
    pub packet_type: PacketType,
    pub type_name: &'static str,
    pub fields: Vec<FieldReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldReport {
    pub index: u32,
    pub name: &'static str,
    pub kind: ValueKind,
    pub width: WidthReport,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WidthReport {
    Bits { bits: u32 },
    LengthOf { field: &'static str, multiplier: u32 },
    Custom { serializer: &'static str },
}

impl From<&FieldDescriptor> for FieldReport {
    fn from(field: &FieldDescriptor) -> Self {
        let width = match field.width {
            FieldWidth::Bits(bits) => WidthReport::Bits { bits },
            FieldWidth::LengthOf { field, multiplier } => WidthReport::LengthOf { field, multiplier },
            FieldWidth::Custom(serializer) => WidthReport::Custom {
                serializer: serializer.name(),
            },
        };
        Self {
            index: field.index,
            name: field.name,
            kind: field.kind,
            width,
        }
    }
}

impl ShapeReport {
    pub fn new(packet_type: PacketType, shape: &StructShape) -> Self {
        Self {
            packet_type,
            type_name: shape.type_name(),
            fields: shape.iter().map(FieldReport::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_packet_names() {
        assert_eq!(parse_packet_type("PINGREQ").unwrap(), PacketType::PingReq);
        assert_eq!(parse_packet_type("ping_req").unwrap(), PacketType::PingReq);
        assert_eq!(parse_packet_type("suback").unwrap(), PacketType::SubAck);
        assert!(parse_packet_type("auth").is_err());
    }

    #[test]
    fn every_packet_type_resolves() {
        for ty in PacketType::ALL {
            let shape = packet_shape(ty).unwrap();
            let names: Vec<_> = shape.iter().take(3).map(|f| f.name).collect();
            assert_eq!(names, ["type", "flags", "remaining_length"], "{ty}");
        }
    }

    #[test]
    fn report_describes_widths() {
        let shape = packet_shape(PacketType::Subscribe).unwrap();
        let report = ShapeReport::new(PacketType::Subscribe, &shape);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["fields"][0]["width"]["bits"], 4);
        assert_eq!(json["fields"][2]["width"]["type"], "custom");
        assert_eq!(json["fields"][3]["name"], "packet_id");
    }
}
