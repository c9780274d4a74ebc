use std::fmt::Write;

use anyhow::{Context, Result};
use codec::CodecConfig;
use mqtt::{read_packet, Packet, PacketType};
use serde::Serialize;

/// One decoded frame with its framing numbers.
#[derive(Debug, Clone, Serialize)]
pub struct DecodeReport {
    pub packet_type: PacketType,
    pub frame_len: usize,
    pub remaining_length: u32,
    /// Input bytes after the first frame.
    pub trailing_bytes: usize,
    pub packet: Packet,
}

/// Decodes the first MQTT frame in `bytes`.
pub fn decode_frame(bytes: &[u8], config: &CodecConfig) -> Result<DecodeReport> {
    let mut source = bytes;
    let packet = read_packet(&mut source, config).context("decode mqtt frame")?;
    let header = packet.header();
    Ok(DecodeReport {
        packet_type: packet.packet_type(),
        frame_len: header.frame_len(),
        remaining_length: header.remaining_length,
        trailing_bytes: source.len(),
        packet,
    })
}

pub fn format_decode_pretty(report: &DecodeReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} frame: {} bytes (remaining length {})",
        report.packet_type, report.frame_len, report.remaining_length
    );
    if report.trailing_bytes > 0 {
        let _ = writeln!(out, "trailing: {} bytes not decoded", report.trailing_bytes);
    }
    let _ = write!(out, "{:#?}", report.packet);
    out
}
