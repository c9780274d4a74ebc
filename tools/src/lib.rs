//! Inspection and debugging tools for bitstruct-encoded MQTT frames.
//!
//! - Decode a frame and print its packet as JSON or text
//! - Dump the resolved field layout of any packet type
//! - Emit the bytes of simple packets for hand testing
//!
//! # Design Principles
//!
//! - **First-class tooling** - These tools are part of the product, not afterthoughts.
//! - **Human-readable output** - Make it easy to see what the codec is doing.

mod config;
mod decode;
mod hex;
mod shape;

pub use config::{load_config, LimitOverrides};
pub use decode::{decode_frame, format_decode_pretty, DecodeReport};
pub use hex::{encode_hex, parse_hex};
pub use shape::{packet_shape, parse_packet_type, FieldReport, ShapeReport, WidthReport};
