//! SUBSCRIBE, SUBACK and UNSUBSCRIBE, whose payloads are lists of small
//! nested structs running to the end of the packet.

use std::any::Any;

use codec::{
    BinaryStruct, CodecError, CodecResult, FieldDescriptor, FieldRef, FieldValue,
    LengthPrefixedSerializer, StructList, StructListSerializer, ValueKind,
};

use super::{header_field, ControlPacket};
use crate::error::{MqttError, MqttResult};
use crate::header::{FixedHeader, PacketType};

/// Bytes taken by the packet identifier ahead of every list payload.
const PACKET_ID_LEN: usize = 2;

/// Whether the list payload of `P` continues past `bytes`.
fn more_items<P: ControlPacket>(bytes: usize, parent: &dyn Any) -> bool {
    parent.downcast_ref::<P>().is_some_and(|packet| {
        let payload = (packet.header().remaining_length as usize).saturating_sub(PACKET_ID_LEN);
        bytes < payload
    })
}

fn invalid<T>(packet: PacketType, reason: &'static str) -> MqttResult<T> {
    Err(MqttError::InvalidPacket { packet, reason })
}

/// One topic filter with its requested QoS.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Subscription {
    pub topic_filter: String,
    pub qos: u8,
    #[cfg_attr(feature = "serde", serde(skip))]
    reserved: u8,
}

impl Subscription {
    #[must_use]
    pub fn new(topic_filter: impl Into<String>, qos: u8) -> Self {
        Self {
            topic_filter: topic_filter.into(),
            qos,
            reserved: 0,
        }
    }
}

impl BinaryStruct for Subscription {
    fn describe() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::custom::<LengthPrefixedSerializer>(1, "topic_filter", ValueKind::Str),
            FieldDescriptor::int(2, "reserved", 6),
            FieldDescriptor::int(3, "qos", 2),
        ]
    }

    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        match name {
            "topic_filter" => Some(FieldRef::Str(&self.topic_filter)),
            "reserved" => Some(FieldRef::Int(0)),
            "qos" => Some(FieldRef::int(self.qos)),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> CodecResult<()> {
        match name {
            "topic_filter" => self.topic_filter = value.into_string()?,
            "reserved" => self.reserved = value.into_int()?,
            "qos" => self.qos = value.into_int()?,
            _ => return Err(CodecError::unknown_field::<Self>(name)),
        }
        Ok(())
    }
}

/// SUBSCRIBE payload framing.
#[derive(Debug)]
pub struct Subscriptions;

impl StructList for Subscriptions {
    type Item = Subscription;

    fn read_next(_items: usize, bytes: usize, _field: &FieldDescriptor, parent: &dyn Any) -> bool {
        more_items::<SubscribePacket>(bytes, parent)
    }
}

/// Client request to subscribe to one or more topic filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SubscribePacket {
    pub header: FixedHeader,
    pub packet_id: u16,
    pub subscriptions: Vec<Subscription>,
}

impl SubscribePacket {
    #[must_use]
    pub fn new(packet_id: u16, subscriptions: Vec<Subscription>) -> Self {
        Self {
            packet_id,
            subscriptions,
            ..Self::default()
        }
    }
}

impl BinaryStruct for SubscribePacket {
    fn describe() -> Vec<FieldDescriptor> {
        let mut fields = FixedHeader::fields();
        fields.extend([
            FieldDescriptor::int(2000, "packet_id", 16),
            FieldDescriptor::custom::<StructListSerializer<Subscriptions>>(
                3000,
                "subscriptions",
                ValueKind::Custom,
            ),
        ]);
        fields
    }

    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        if FixedHeader::is_header_field(name) {
            return header_field(self, name);
        }
        match name {
            "packet_id" => Some(FieldRef::int(self.packet_id)),
            "subscriptions" => Some(FieldRef::Custom(&self.subscriptions)),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> CodecResult<()> {
        if FixedHeader::is_header_field(name) {
            return self.header.set::<Self>(name, value);
        }
        match name {
            "packet_id" => self.packet_id = value.into_int()?,
            "subscriptions" => self.subscriptions = value.into_custom()?,
            _ => return Err(CodecError::unknown_field::<Self>(name)),
        }
        Ok(())
    }
}

impl ControlPacket for SubscribePacket {
    const TYPE: PacketType = PacketType::Subscribe;

    fn header(&self) -> &FixedHeader {
        &self.header
    }

    fn remaining_length(&self) -> usize {
        PACKET_ID_LEN
            + self
                .subscriptions
                .iter()
                .map(|sub| 2 + sub.topic_filter.len() + 1)
                .sum::<usize>()
    }

    fn validate(&self) -> MqttResult<()> {
        if self.subscriptions.is_empty() {
            return invalid(Self::TYPE, "at least one subscription is required");
        }
        for sub in &self.subscriptions {
            if sub.reserved != 0 {
                return invalid(Self::TYPE, "reserved subscription bits are set");
            }
            if sub.qos > 2 {
                return invalid(Self::TYPE, "requested QoS 3 is reserved");
            }
        }
        Ok(())
    }
}

/// Result of one subscription request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SubAckCode {
    pub return_code: u8,
}

impl SubAckCode {
    pub const SUCCESS_QOS_0: u8 = 0x00;
    pub const SUCCESS_QOS_1: u8 = 0x01;
    pub const SUCCESS_QOS_2: u8 = 0x02;
    pub const FAILURE: u8 = 0x80;

    #[must_use]
    pub const fn new(return_code: u8) -> Self {
        Self { return_code }
    }

    /// The granted QoS, or `None` for a failure.
    #[must_use]
    pub const fn granted_qos(self) -> Option<u8> {
        match self.return_code {
            qos @ 0..=2 => Some(qos),
            _ => None,
        }
    }

    const fn is_valid(self) -> bool {
        matches!(self.return_code, 0..=2 | Self::FAILURE)
    }
}

impl BinaryStruct for SubAckCode {
    fn describe() -> Vec<FieldDescriptor> {
        vec![FieldDescriptor::int(1, "return_code", 8)]
    }

    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        match name {
            "return_code" => Some(FieldRef::int(self.return_code)),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> CodecResult<()> {
        match name {
            "return_code" => self.return_code = value.into_int()?,
            _ => return Err(CodecError::unknown_field::<Self>(name)),
        }
        Ok(())
    }
}

/// SUBACK payload framing.
#[derive(Debug)]
pub struct SubAckCodes;

impl StructList for SubAckCodes {
    type Item = SubAckCode;

    fn read_next(_items: usize, bytes: usize, _field: &FieldDescriptor, parent: &dyn Any) -> bool {
        more_items::<SubAckPacket>(bytes, parent)
    }
}

/// Server response to SUBSCRIBE, one code per requested filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SubAckPacket {
    pub header: FixedHeader,
    pub packet_id: u16,
    pub return_codes: Vec<SubAckCode>,
}

impl SubAckPacket {
    #[must_use]
    pub fn new(packet_id: u16, return_codes: impl IntoIterator<Item = u8>) -> Self {
        Self {
            packet_id,
            return_codes: return_codes.into_iter().map(SubAckCode::new).collect(),
            ..Self::default()
        }
    }
}

impl BinaryStruct for SubAckPacket {
    fn describe() -> Vec<FieldDescriptor> {
        let mut fields = FixedHeader::fields();
        fields.extend([
            FieldDescriptor::int(2000, "packet_id", 16),
            FieldDescriptor::custom::<StructListSerializer<SubAckCodes>>(
                3000,
                "return_codes",
                ValueKind::Custom,
            ),
        ]);
        fields
    }

    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        if FixedHeader::is_header_field(name) {
            return header_field(self, name);
        }
        match name {
            "packet_id" => Some(FieldRef::int(self.packet_id)),
            "return_codes" => Some(FieldRef::Custom(&self.return_codes)),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> CodecResult<()> {
        if FixedHeader::is_header_field(name) {
            return self.header.set::<Self>(name, value);
        }
        match name {
            "packet_id" => self.packet_id = value.into_int()?,
            "return_codes" => self.return_codes = value.into_custom()?,
            _ => return Err(CodecError::unknown_field::<Self>(name)),
        }
        Ok(())
    }
}

impl ControlPacket for SubAckPacket {
    const TYPE: PacketType = PacketType::SubAck;

    fn header(&self) -> &FixedHeader {
        &self.header
    }

    fn remaining_length(&self) -> usize {
        PACKET_ID_LEN + self.return_codes.len()
    }

    fn validate(&self) -> MqttResult<()> {
        if self.return_codes.iter().any(|code| !code.is_valid()) {
            return invalid(Self::TYPE, "unknown subscribe return code");
        }
        Ok(())
    }
}

/// A topic filter to drop from the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TopicFilter {
    pub topic_filter: String,
}

impl TopicFilter {
    #[must_use]
    pub fn new(topic_filter: impl Into<String>) -> Self {
        Self {
            topic_filter: topic_filter.into(),
        }
    }
}

impl BinaryStruct for TopicFilter {
    fn describe() -> Vec<FieldDescriptor> {
        vec![FieldDescriptor::custom::<LengthPrefixedSerializer>(
            1,
            "topic_filter",
            ValueKind::Str,
        )]
    }

    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        match name {
            "topic_filter" => Some(FieldRef::Str(&self.topic_filter)),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> CodecResult<()> {
        match name {
            "topic_filter" => self.topic_filter = value.into_string()?,
            _ => return Err(CodecError::unknown_field::<Self>(name)),
        }
        Ok(())
    }
}

/// UNSUBSCRIBE payload framing.
#[derive(Debug)]
pub struct TopicFilters;

impl StructList for TopicFilters {
    type Item = TopicFilter;

    fn read_next(_items: usize, bytes: usize, _field: &FieldDescriptor, parent: &dyn Any) -> bool {
        more_items::<UnsubscribePacket>(bytes, parent)
    }
}

/// Client request to drop one or more subscriptions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct UnsubscribePacket {
    pub header: FixedHeader,
    pub packet_id: u16,
    pub topic_filters: Vec<TopicFilter>,
}

impl UnsubscribePacket {
    #[must_use]
    pub fn new<S: Into<String>>(packet_id: u16, filters: impl IntoIterator<Item = S>) -> Self {
        Self {
            packet_id,
            topic_filters: filters.into_iter().map(TopicFilter::new).collect(),
            ..Self::default()
        }
    }
}

impl BinaryStruct for UnsubscribePacket {
    fn describe() -> Vec<FieldDescriptor> {
        let mut fields = FixedHeader::fields();
        fields.extend([
            FieldDescriptor::int(2000, "packet_id", 16),
            FieldDescriptor::custom::<StructListSerializer<TopicFilters>>(
                3000,
                "topic_filters",
                ValueKind::Custom,
            ),
        ]);
        fields
    }

    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        if FixedHeader::is_header_field(name) {
            return header_field(self, name);
        }
        match name {
            "packet_id" => Some(FieldRef::int(self.packet_id)),
            "topic_filters" => Some(FieldRef::Custom(&self.topic_filters)),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> CodecResult<()> {
        if FixedHeader::is_header_field(name) {
            return self.header.set::<Self>(name, value);
        }
        match name {
            "packet_id" => self.packet_id = value.into_int()?,
            "topic_filters" => self.topic_filters = value.into_custom()?,
            _ => return Err(CodecError::unknown_field::<Self>(name)),
        }
        Ok(())
    }
}

impl ControlPacket for UnsubscribePacket {
    const TYPE: PacketType = PacketType::Unsubscribe;

    fn header(&self) -> &FixedHeader {
        &self.header
    }

    fn remaining_length(&self) -> usize {
        PACKET_ID_LEN
            + self
                .topic_filters
                .iter()
                .map(|filter| 2 + filter.topic_filter.len())
                .sum::<usize>()
    }

    fn validate(&self) -> MqttResult<()> {
        if self.topic_filters.is_empty() {
            return invalid(Self::TYPE, "at least one topic filter is required");
        }
        Ok(())
    }
}
