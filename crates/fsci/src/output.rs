use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One packet, decoded as far as its group allows.
#[derive(Debug, Serialize)]
pub struct DecodedPacket {
    pub group: u8,
    pub group_name: &'static str,
    pub opcode: u8,
    pub name: String,
    pub payload_size: usize,
    pub record: serde_json::Value,
}

/// One slot of an opcode table.
#[derive(Debug, Serialize)]
pub struct SlotRow {
    pub opcode: u8,
    pub kind: String,
    pub name: Option<String>,
    pub feature: Option<String>,
}

pub fn print_packet(packet: &DecodedPacket, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", to_json(packet)),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["GROUP", "OPCODE", "NAME", "SIZE", "RECORD"])
                .add_row(vec![
                    packet.group_name.to_string(),
                    format!("{:#04x}", packet.opcode),
                    packet.name.clone(),
                    packet.payload_size.to_string(),
                    packet.record.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "group={} ({}) opcode={:#04x} name={} size={} record={}",
                packet.group,
                packet.group_name,
                packet.opcode,
                packet.name,
                packet.payload_size,
                packet.record
            );
        }
    }
}

pub fn print_slots(rows: &[SlotRow], format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", to_json(rows)),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["OPCODE", "SLOT", "NAME", "FEATURE"]);
            for row in rows {
                table.add_row(vec![
                    format!("{:#04x}", row.opcode),
                    row.kind.clone(),
                    row.name.clone().unwrap_or_default(),
                    row.feature.clone().unwrap_or_default(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for row in rows {
                println!(
                    "{:#04x} {:<12} {} {}",
                    row.opcode,
                    row.kind,
                    row.name.as_deref().unwrap_or("-"),
                    row.feature.as_deref().unwrap_or("")
                );
            }
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}
