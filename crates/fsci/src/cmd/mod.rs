use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use fsci_dispatch::{decode_event, Direction, Features, OpcodeTable};
use fsci_frame::{
    group_name, DecodeLimits, FsciStatus, Packet, WireReader, FSCI, FSCI_ERROR_OPCODE, GAP,
};
use fsci_records::Command as GapCommand;
use serde::Serialize;

use crate::exit::{dispatch_error, wire_error, CliError, CliResult, DATA_INVALID, USAGE};
use crate::output::{DecodedPacket, OutputFormat};

pub mod decode;
pub mod monitor;
pub mod tables;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode one framed packet given as hex.
    Decode(DecodeArgs),
    /// List the slots of an opcode table.
    Tables(TablesArgs),
    /// Read packets from a device or capture file and print them.
    Monitor(MonitorArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::Tables(args) => tables::run(args, format),
        Command::Monitor(args) => monitor::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    Command,
    Event,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Command => Direction::Command,
            DirectionArg::Event => Direction::Event,
        }
    }
}

#[derive(Args, Debug, Default, Clone, Copy)]
pub struct FeatureArgs {
    /// Build tables without extended advertising.
    #[arg(long)]
    pub no_ext_adv: bool,
    /// Build tables without channel sounding.
    #[arg(long)]
    pub no_cs: bool,
}

impl FeatureArgs {
    pub fn features(self) -> Features {
        Features {
            extended_advertising: !self.no_ext_adv,
            channel_sounding: !self.no_cs,
        }
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Packet bytes in hex; spaces, ':' and '-' separators are ignored.
    pub hex: String,
    /// Table to look the opcode up in.
    #[arg(long, short = 'd', value_enum, default_value = "event")]
    pub direction: DirectionArg,
    #[command(flatten)]
    pub features: FeatureArgs,
}

#[derive(Args, Debug)]
pub struct TablesArgs {
    /// Table to list.
    #[arg(long, short = 'd', value_enum, default_value = "command")]
    pub direction: DirectionArg,
    /// Only show bound slots.
    #[arg(long)]
    pub bound_only: bool,
    #[command(flatten)]
    pub features: FeatureArgs,
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Serial device or capture file to read.
    pub path: PathBuf,
    /// Which way the captured packets travel.
    #[arg(long, short = 'd', value_enum, default_value = "event")]
    pub direction: DirectionArg,
    /// Exit after printing N records.
    #[arg(long)]
    pub count: Option<usize>,
    #[command(flatten)]
    pub features: FeatureArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse hex text into bytes.
pub fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let input = input.trim();
    let input = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    let digits: Vec<u8> = input
        .bytes()
        .filter(|b| !matches!(b, b' ' | b':' | b'-' | b'\t'))
        .collect();
    if digits.is_empty() {
        return Err(CliError::new(USAGE, "hex input must not be empty"));
    }
    if digits.len() % 2 != 0 {
        return Err(CliError::new(USAGE, "hex input has an odd number of digits"));
    }
    digits
        .chunks_exact(2)
        .map(|pair| {
            let text = std::str::from_utf8(pair).unwrap_or("");
            u8::from_str_radix(text, 16)
                .map_err(|_| CliError::new(USAGE, format!("invalid hex byte: {text:?}")))
        })
        .collect()
}

/// Decode a packet's payload with the table for `direction`.
pub fn decode_record(
    packet: &Packet,
    direction: Direction,
    features: Features,
) -> CliResult<DecodedPacket> {
    let (name, record) = match (packet.group, packet.opcode) {
        (GAP, opcode) => decode_gap(opcode, &packet.payload, direction, features)?,
        (FSCI, FSCI_ERROR_OPCODE) => {
            let raw = packet.payload.first().copied();
            let status = raw.and_then(FsciStatus::from_u8);
            let record = serde_json::json!({
                "status": raw,
                "status_name": status.map(|s| format!("{s:?}")),
            });
            ("FrameworkError".to_string(), record)
        }
        (group, _) => {
            return Err(dispatch_error(
                "decode failed",
                fsci_dispatch::DispatchError::UnknownGroup(group),
            ))
        }
    };

    Ok(DecodedPacket {
        group: packet.group,
        group_name: group_name(packet.group),
        opcode: packet.opcode,
        name,
        payload_size: packet.payload.len(),
        record,
    })
}

fn decode_gap(
    opcode: u8,
    payload: &[u8],
    direction: Direction,
    features: Features,
) -> CliResult<(String, serde_json::Value)> {
    match direction {
        Direction::Command => {
            let op = OpcodeTable::commands(features)
                .lookup(opcode)
                .map_err(|err| dispatch_error("decode failed", err))?;
            let mut r = WireReader::new(payload);
            let command = GapCommand::decode(op, &mut r)
                .and_then(|command| r.finish().map(|()| command))
                .map_err(|err| wire_error("decode failed", err))?;
            Ok((format!("{op:?}"), to_value(&command)?))
        }
        Direction::Event => {
            let op = OpcodeTable::events(features)
                .lookup(opcode)
                .map_err(|err| dispatch_error("decode failed", err))?;
            let event = decode_event(op, payload, DecodeLimits::default())
                .map_err(|err| dispatch_error("decode failed", err))?;
            Ok((format!("{op:?}"), to_value(&event)?))
        }
    }
}

pub fn to_value<T: Serialize>(value: &T) -> CliResult<serde_json::Value> {
    serde_json::to_value(value)
        .map_err(|err| CliError::new(DATA_INVALID, format!("serialization failed: {err}")))
}
