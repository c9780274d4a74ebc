use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use bitstruct_tools::{
    decode_frame, encode_hex, format_decode_pretty, load_config, packet_shape, parse_hex,
    parse_packet_type, LimitOverrides, ShapeReport,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use mqtt::{ConnAckPacket, DisconnectPacket, Packet, PingReqPacket, PingRespPacket};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "bitstruct-tools",
    version,
    about = "bitstruct inspection and encoding tools"
)]
struct Cli {
    /// Log codec activity (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode one MQTT control packet.
    DecodeMqtt {
        /// Frame bytes as hex.
        #[arg(required_unless_present = "file")]
        hex: Option<String>,
        /// Read the frame bytes from a file instead.
        #[arg(long, conflicts_with = "hex")]
        file: Option<PathBuf>,
        /// Output format.
        #[arg(long, value_enum, default_value_t = DecodeFormat::Json)]
        format: DecodeFormat,
        #[command(flatten)]
        limits: LimitArgs,
    },
    /// Print the field layout of an MQTT packet type as JSON.
    Shape {
        /// Packet type name, e.g. PUBLISH or ping_req.
        packet_type: String,
    },
    /// Encode a simple MQTT packet and print it as hex.
    EncodeMqtt {
        #[command(subcommand)]
        packet: SimplePacket,
    },
}

#[derive(Args)]
struct LimitArgs {
    /// JSON codec config; missing keys take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Largest single field, in bytes.
    #[arg(long)]
    max_field_bytes: Option<usize>,
    /// Most items a list field may hold.
    #[arg(long)]
    max_list_items: Option<usize>,
}

#[derive(Subcommand)]
enum SimplePacket {
    /// PINGREQ.
    Ping,
    /// PINGRESP.
    Pong,
    /// DISCONNECT.
    Disconnect,
    /// CONNACK with the given return code.
    Connack {
        #[arg(long)]
        session_present: bool,
        #[arg(long, default_value_t = 0)]
        return_code: u8,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DecodeFormat {
    Json,
    Pretty,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Command::DecodeMqtt {
            hex,
            file,
            format,
            limits,
        } => {
            let bytes = match (hex, file) {
                (_, Some(path)) => {
                    fs::read(&path).with_context(|| format!("read frame {}", path.display()))?
                }
                (Some(hex), None) => parse_hex(&hex).context("parse hex frame")?,
                (None, None) => bail!("either a hex frame or --file is required"),
            };
            let overrides = LimitOverrides {
                max_field_bytes: limits.max_field_bytes,
                max_list_items: limits.max_list_items,
            };
            let config = load_config(limits.config.as_deref(), overrides)?;
            debug!(len = bytes.len(), ?config, "decoding frame");
            let report = decode_frame(&bytes, &config)?;
            match format {
                DecodeFormat::Json => {
                    let json = serde_json::to_string_pretty(&report).context("serialize json")?;
                    println!("{json}");
                }
                DecodeFormat::Pretty => {
                    println!("{}", format_decode_pretty(&report));
                }
            }
        }
        Command::Shape { packet_type } => {
            let packet_type = parse_packet_type(&packet_type)?;
            let shape = packet_shape(packet_type)
                .with_context(|| format!("resolve {packet_type} shape"))?;
            let report = ShapeReport::new(packet_type, &shape);
            let json = serde_json::to_string_pretty(&report).context("serialize json")?;
            println!("{json}");
        }
        Command::EncodeMqtt { packet } => {
            let packet = match packet {
                SimplePacket::Ping => Packet::PingReq(PingReqPacket::default()),
                SimplePacket::Pong => Packet::PingResp(PingRespPacket::default()),
                SimplePacket::Disconnect => Packet::Disconnect(DisconnectPacket::default()),
                SimplePacket::Connack {
                    session_present,
                    return_code,
                } => Packet::ConnAck(ConnAckPacket::new(session_present, return_code)),
            };
            let bytes = packet
                .to_bytes()
                .with_context(|| format!("encode {}", packet.packet_type()))?;
            println!("{}", encode_hex(&bytes));
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
