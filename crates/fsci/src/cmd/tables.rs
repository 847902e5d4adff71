use fsci_dispatch::{Direction, OpcodeTable, Slot};

use crate::cmd::TablesArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_slots, OutputFormat, SlotRow};

pub fn run(args: TablesArgs, format: OutputFormat) -> CliResult<i32> {
    let features = args.features.features();
    let rows = match Direction::from(args.direction) {
        Direction::Command => rows(&OpcodeTable::commands(features), |op| op.feature()),
        Direction::Event => rows(&OpcodeTable::events(features), |op| op.feature()),
    };
    let rows: Vec<SlotRow> = if args.bound_only {
        rows.into_iter().filter(|row| row.name.is_some()).collect()
    } else {
        rows
    };
    print_slots(&rows, format);
    Ok(SUCCESS)
}

fn rows<T: Copy + std::fmt::Debug>(
    table: &OpcodeTable<T>,
    feature_of: impl Fn(T) -> fsci_records::Feature,
) -> Vec<SlotRow> {
    table
        .iter()
        .map(|(opcode, slot)| {
            let (name, feature) = match slot {
                Slot::Bound(op) => (Some(format!("{op:?}")), Some(feature_of(*op))),
                Slot::Reserved(feature) => (None, Some(*feature)),
                Slot::Unsupported => (None, None),
            };
            SlotRow {
                opcode,
                kind: slot.kind().to_string(),
                name,
                feature: feature.map(|f| format!("{f:?}")),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use fsci_dispatch::Features;

    use super::*;

    #[test]
    fn rows_cover_every_slot() {
        let table = OpcodeTable::commands(Features::core());
        let rows = rows(&table, |op| op.feature());
        assert_eq!(rows.len(), table.len());
        assert_eq!(rows[0x25].kind, "unsupported");
        assert_eq!(rows[0x30].kind, "reserved");
        assert_eq!(rows[0x30].feature.as_deref(), Some("ChannelSounding"));
        assert!(rows[0x0A].name.is_some());
    }
}
