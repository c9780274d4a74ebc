//! CONNECT and CONNACK.

use std::any::Any;
use std::io::{Read, Write};

use codec::{
    BinaryStruct, CodecConfig, CodecError, CodecResult, FieldDescriptor, FieldRef,
    FieldSerializer, FieldValue, LengthPrefixedSerializer, ValueKind,
};

use super::{header_field, parent, ControlPacket};
use crate::error::{MqttError, MqttResult};
use crate::header::{FixedHeader, PacketType};

/// Client request to open a session.
///
/// Optional payload fields are present on the wire exactly when they are
/// `Some`; the matching connect flags are derived from them on write.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ConnectPacket {
    pub header: FixedHeader,
    pub protocol_name: String,
    pub protocol_level: u8,
    pub clean_session: bool,
    pub keep_alive: u16,
    pub client_id: String,
    pub will_qos: u8,
    pub will_retain: bool,
    pub will_topic: Option<String>,
    pub will_message: Option<Vec<u8>>,
    pub username: Option<String>,
    pub password: Option<Vec<u8>>,
    #[cfg_attr(feature = "serde", serde(skip))]
    reserved: bool,
}

impl Default for ConnectPacket {
    fn default() -> Self {
        Self {
            header: FixedHeader::default(),
            protocol_name: Self::PROTOCOL_NAME.to_owned(),
            protocol_level: Self::PROTOCOL_LEVEL,
            clean_session: false,
            keep_alive: 0,
            client_id: String::new(),
            will_qos: 0,
            will_retain: false,
            will_topic: None,
            will_message: None,
            username: None,
            password: None,
            reserved: false,
        }
    }
}

impl ConnectPacket {
    pub const PROTOCOL_NAME: &'static str = "MQTT";
    /// Protocol level of MQTT 3.1.1.
    pub const PROTOCOL_LEVEL: u8 = 4;

    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_will(
        mut self,
        topic: impl Into<String>,
        message: impl Into<Vec<u8>>,
        qos: u8,
        retain: bool,
    ) -> Self {
        self.will_topic = Some(topic.into());
        self.will_message = Some(message.into());
        self.will_qos = qos;
        self.will_retain = retain;
        self
    }

    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: Option<Vec<u8>>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = password;
        self
    }

    #[must_use]
    pub const fn has_will(&self) -> bool {
        self.will_topic.is_some()
    }
}

fn prefixed_len(len: usize) -> usize {
    2 + len
}

impl BinaryStruct for ConnectPacket {
    fn describe() -> Vec<FieldDescriptor> {
        let mut fields = FixedHeader::fields();
        fields.extend([
            FieldDescriptor::custom::<LengthPrefixedSerializer>(
                2001,
                "protocol_name",
                ValueKind::Str,
            ),
            FieldDescriptor::int(2003, "protocol_level", 8),
            FieldDescriptor::bool(2010, "username_flag"),
            FieldDescriptor::bool(2011, "password_flag"),
            FieldDescriptor::bool(2012, "will_retain"),
            FieldDescriptor::int(2013, "will_qos", 2),
            FieldDescriptor::bool(2014, "will_flag"),
            FieldDescriptor::bool(2015, "clean_session"),
            FieldDescriptor::bool(2016, "reserved"),
            FieldDescriptor::int(2020, "keep_alive", 16),
            FieldDescriptor::custom::<LengthPrefixedSerializer>(3000, "client_id", ValueKind::Str),
            FieldDescriptor::custom::<ConnectPayloadSerializer>(3001, "will_topic", ValueKind::Str),
            FieldDescriptor::custom::<ConnectPayloadSerializer>(
                3002,
                "will_message",
                ValueKind::Bytes,
            ),
            FieldDescriptor::custom::<ConnectPayloadSerializer>(3003, "username", ValueKind::Str),
            FieldDescriptor::custom::<ConnectPayloadSerializer>(
                3004,
                "password",
                ValueKind::Bytes,
            ),
        ]);
        fields
    }

    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        if FixedHeader::is_header_field(name) {
            return header_field(self, name);
        }
        let value = match name {
            "protocol_name" => FieldRef::Str(&self.protocol_name),
            "protocol_level" => FieldRef::int(self.protocol_level),
            "username_flag" => FieldRef::Bool(self.username.is_some()),
            "password_flag" => FieldRef::Bool(self.password.is_some()),
            "will_retain" => FieldRef::Bool(self.will_retain),
            "will_qos" => FieldRef::int(self.will_qos),
            "will_flag" => FieldRef::Bool(self.has_will()),
            "clean_session" => FieldRef::Bool(self.clean_session),
            "reserved" => FieldRef::Bool(false),
            "keep_alive" => FieldRef::int(self.keep_alive),
            "client_id" => FieldRef::Str(&self.client_id),
            "will_topic" => FieldRef::Custom(&self.will_topic),
            "will_message" => FieldRef::Custom(&self.will_message),
            "username" => FieldRef::Custom(&self.username),
            "password" => FieldRef::Custom(&self.password),
            _ => return None,
        };
        Some(value)
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> CodecResult<()> {
        if FixedHeader::is_header_field(name) {
            return self.header.set::<Self>(name, value);
        }
        match name {
            "protocol_name" => self.protocol_name = value.into_string()?,
            "protocol_level" => self.protocol_level = value.into_int()?,
            "username_flag" => self.username = value.into_bool()?.then(String::new),
            "password_flag" => self.password = value.into_bool()?.then(Vec::new),
            "will_retain" => self.will_retain = value.into_bool()?,
            "will_qos" => self.will_qos = value.into_int()?,
            "will_flag" => {
                let present = value.into_bool()?;
                self.will_topic = present.then(String::new);
                self.will_message = present.then(Vec::new);
            }
            "clean_session" => self.clean_session = value.into_bool()?,
            "reserved" => self.reserved = value.into_bool()?,
            "keep_alive" => self.keep_alive = value.into_int()?,
            "client_id" => self.client_id = value.into_string()?,
            "will_topic" => self.will_topic = value.into_custom()?,
            "will_message" => self.will_message = value.into_custom()?,
            "username" => self.username = value.into_custom()?,
            "password" => self.password = value.into_custom()?,
            _ => return Err(CodecError::unknown_field::<Self>(name)),
        }
        Ok(())
    }
}

impl ControlPacket for ConnectPacket {
    const TYPE: PacketType = PacketType::Connect;

    fn header(&self) -> &FixedHeader {
        &self.header
    }

    fn remaining_length(&self) -> usize {
        // protocol name, level, connect flags, keep alive
        let variable_header = prefixed_len(self.protocol_name.len()) + 1 + 1 + 2;
        let payload = prefixed_len(self.client_id.len())
            + self.will_topic.as_ref().map_or(0, |t| prefixed_len(t.len()))
            + self.will_message.as_ref().map_or(0, |m| prefixed_len(m.len()))
            + self.username.as_ref().map_or(0, |u| prefixed_len(u.len()))
            + self.password.as_ref().map_or(0, |p| prefixed_len(p.len()));
        variable_header + payload
    }

    fn validate(&self) -> MqttResult<()> {
        let invalid = |reason| {
            Err(MqttError::InvalidPacket {
                packet: PacketType::Connect,
                reason,
            })
        };
        if self.protocol_name != Self::PROTOCOL_NAME {
            return invalid("unsupported protocol name");
        }
        if self.reserved {
            return invalid("reserved connect flag is set");
        }
        if self.will_topic.is_some() != self.will_message.is_some() {
            return invalid("will topic and will message must be given together");
        }
        if self.will_qos > 2 {
            return invalid("will QoS above 2");
        }
        if !self.has_will() && (self.will_qos != 0 || self.will_retain) {
            return invalid("will QoS or retain set without a will");
        }
        if self.password.is_some() && self.username.is_none() {
            return invalid("password given without a username");
        }
        Ok(())
    }
}

/// Optional CONNECT payload fields, each gated by a connect flag.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ConnectPayloadSerializer;

impl FieldSerializer for ConnectPayloadSerializer {
    fn read(
        &self,
        source: &mut dyn Read,
        field: &FieldDescriptor,
        parent_struct: &dyn Any,
        config: &CodecConfig,
    ) -> CodecResult<FieldValue> {
        let packet = parent::<ConnectPacket>(parent_struct)?;
        let present = match field.name {
            "will_topic" | "will_message" => packet.has_will(),
            "username" => packet.username.is_some(),
            "password" => packet.password.is_some(),
            _ => true,
        };
        let value = if present {
            Some(LengthPrefixedSerializer.read(source, field, parent_struct, config)?)
        } else {
            None
        };
        match field.kind {
            ValueKind::Str => Ok(FieldValue::Custom(Box::new(
                value.map(FieldValue::into_string).transpose()?,
            ))),
            _ => Ok(FieldValue::Custom(Box::new(
                value.map(FieldValue::into_bytes).transpose()?,
            ))),
        }
    }

    fn write(
        &self,
        sink: &mut dyn Write,
        value: FieldRef<'_>,
        field: &FieldDescriptor,
        config: &CodecConfig,
    ) -> CodecResult<()> {
        let present = match field.kind {
            ValueKind::Str => value
                .as_custom::<Option<String>>()?
                .as_deref()
                .map(FieldRef::Str),
            _ => value
                .as_custom::<Option<Vec<u8>>>()?
                .as_deref()
                .map(FieldRef::Bytes),
        };
        match present {
            Some(inner) => LengthPrefixedSerializer.write(sink, inner, field, config),
            None => Ok(()),
        }
    }
}

/// CONNACK return codes.
pub struct ConnectReturnCode;

impl ConnectReturnCode {
    pub const ACCEPTED: u8 = 0;
    pub const UNACCEPTABLE_PROTOCOL_VERSION: u8 = 1;
    pub const IDENTIFIER_REJECTED: u8 = 2;
    pub const SERVER_UNAVAILABLE: u8 = 3;
    pub const BAD_USERNAME_OR_PASSWORD: u8 = 4;
    pub const NOT_AUTHORIZED: u8 = 5;
}

/// Server acknowledgement of a CONNECT.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ConnAckPacket {
    pub header: FixedHeader,
    pub session_present: bool,
    pub return_code: u8,
    #[cfg_attr(feature = "serde", serde(skip))]
    reserved: u8,
}

impl ConnAckPacket {
    #[must_use]
    pub fn new(session_present: bool, return_code: u8) -> Self {
        Self {
            session_present,
            return_code,
            ..Self::default()
        }
    }
}

impl BinaryStruct for ConnAckPacket {
    fn describe() -> Vec<FieldDescriptor> {
        let mut fields = FixedHeader::fields();
        fields.extend([
            FieldDescriptor::int(2000, "reserved", 7),
            FieldDescriptor::bool(2001, "session_present"),
            FieldDescriptor::int(2002, "return_code", 8),
        ]);
        fields
    }

    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        if FixedHeader::is_header_field(name) {
            return header_field(self, name);
        }
        match name {
            "reserved" => Some(FieldRef::Int(0)),
            "session_present" => Some(FieldRef::Bool(self.session_present)),
            "return_code" => Some(FieldRef::int(self.return_code)),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> CodecResult<()> {
        if FixedHeader::is_header_field(name) {
            return self.header.set::<Self>(name, value);
        }
        match name {
            "reserved" => self.reserved = value.into_int()?,
            "session_present" => self.session_present = value.into_bool()?,
            "return_code" => self.return_code = value.into_int()?,
            _ => return Err(CodecError::unknown_field::<Self>(name)),
        }
        Ok(())
    }
}

impl ControlPacket for ConnAckPacket {
    const TYPE: PacketType = PacketType::ConnAck;

    fn header(&self) -> &FixedHeader {
        &self.header
    }

    fn remaining_length(&self) -> usize {
        2
    }

    fn validate(&self) -> MqttResult<()> {
        if self.reserved != 0 {
            return Err(MqttError::InvalidPacket {
                packet: PacketType::ConnAck,
                reason: "reserved acknowledge flags are set",
            });
        }
        Ok(())
    }
}
