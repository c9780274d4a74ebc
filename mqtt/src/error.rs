//! Error types for MQTT packet decoding and encoding.

use codec::CodecError;
use thiserror::Error;

use crate::header::PacketType;

/// Result type for MQTT operations.
pub type MqttResult<T> = Result<T, MqttError>;

/// Errors that can occur while decoding or encoding MQTT control packets.
#[derive(Debug, Error)]
pub enum MqttError {
    /// The struct codec failed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The source ended before a packet started.
    #[error("stream ended before a packet header")]
    EndOfStream,

    /// The fixed header names a reserved or unknown packet type.
    #[error("unknown packet type {value}")]
    UnknownPacketType { value: u8 },

    /// The fixed header flags are not the ones required for the packet type.
    #[error("invalid flags {flags:#06b} for {packet} packet")]
    InvalidFlags { packet: PacketType, flags: u8 },

    /// The packet body did not match the remaining length in its header.
    #[error("{packet} packet declares {declared} bytes but {actual} were decoded")]
    LengthMismatch {
        packet: PacketType,
        declared: usize,
        actual: usize,
    },

    /// The packet's fields contradict each other.
    #[error("invalid {packet} packet: {reason}")]
    InvalidPacket {
        packet: PacketType,
        reason: &'static str,
    },

    /// The underlying source failed before a packet started.
    #[error("stream i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

impl MqttError {
    /// True when the source ran out, either between or inside packets.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        match self {
            Self::EndOfStream => true,
            Self::Codec(err) => err.is_eof(),
            Self::Io(err) => err.kind() == std::io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}
