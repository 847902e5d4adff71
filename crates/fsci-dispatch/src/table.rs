//! Dense opcode tables.
//!
//! A table has one slot for every opcode below its length. A slot either
//! binds an opcode or is a sentinel, so lookups never fall through to
//! anything undefined.

use std::fmt;

use fsci_records::{CommandOpcode, EventOpcode, Feature, COMMAND_TABLE_LEN, EVENT_TABLE_LEN};
use serde::Serialize;

use crate::config::Features;
use crate::error::{DispatchError, Result};

/// Which way a message travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Host to device.
    Command,
    /// Device to host.
    Event,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Command => "command",
            Self::Event => "event",
        })
    }
}

/// One table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot<T> {
    /// The opcode is handled.
    Bound(T),
    /// The opcode belongs to a feature this table was built without.
    Reserved(Feature),
    /// No opcode is assigned to this slot.
    Unsupported,
}

/// Slot classification, also reported for failed lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    Bound,
    Reserved,
    Unsupported,
    /// The opcode is at or past the table length.
    OutOfRange,
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bound => "bound",
            Self::Reserved => "reserved",
            Self::Unsupported => "unsupported",
            Self::OutOfRange => "out of range",
        })
    }
}

impl<T> Slot<T> {
    pub fn kind(&self) -> SlotKind {
        match self {
            Self::Bound(_) => SlotKind::Bound,
            Self::Reserved(_) => SlotKind::Reserved,
            Self::Unsupported => SlotKind::Unsupported,
        }
    }
}

/// A dense table indexed by opcode.
#[derive(Debug, Clone)]
pub struct OpcodeTable<T> {
    direction: Direction,
    slots: Vec<Slot<T>>,
}

impl<T: Copy + Into<u8>> OpcodeTable<T> {
    /// Build a table of `len` slots from every known opcode, keeping the
    /// ones whose feature is enabled.
    fn assemble(
        direction: Direction,
        len: usize,
        opcodes: &[T],
        feature_of: fn(T) -> Feature,
        features: Features,
    ) -> Self {
        let mut slots = vec![Slot::Unsupported; len];
        for &opcode in opcodes {
            let index = usize::from(opcode.into());
            let feature = feature_of(opcode);
            slots[index] = if features.enables(feature) {
                Slot::Bound(opcode)
            } else {
                Slot::Reserved(feature)
            };
        }
        Self { direction, slots }
    }
}

impl OpcodeTable<CommandOpcode> {
    /// The GAP command table for the given features.
    pub fn commands(features: Features) -> Self {
        Self::assemble(
            Direction::Command,
            COMMAND_TABLE_LEN,
            CommandOpcode::ALL,
            CommandOpcode::feature,
            features,
        )
    }
}

impl OpcodeTable<EventOpcode> {
    /// The GAP event table for the given features.
    pub fn events(features: Features) -> Self {
        Self::assemble(
            Direction::Event,
            EVENT_TABLE_LEN,
            EventOpcode::ALL,
            EventOpcode::feature,
            features,
        )
    }
}

impl<T: Copy> OpcodeTable<T> {
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Number of slots; every opcode below this has a slot.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The slot for `opcode`, or `None` past the end of the table.
    pub fn slot(&self, opcode: u8) -> Option<&Slot<T>> {
        self.slots.get(usize::from(opcode))
    }

    /// Resolve `opcode` to its binding.
    pub fn lookup(&self, opcode: u8) -> Result<T> {
        match self.slot(opcode) {
            Some(Slot::Bound(bound)) => Ok(*bound),
            Some(other) => Err(self.unknown(opcode, other.kind())),
            None => Err(self.unknown(opcode, SlotKind::OutOfRange)),
        }
    }

    fn unknown(&self, opcode: u8, slot: SlotKind) -> DispatchError {
        DispatchError::UnknownOpcode {
            direction: self.direction,
            opcode,
            slot,
        }
    }

    /// Every slot paired with its opcode, in opcode order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &Slot<T>)> + '_ {
        // Tables never exceed 256 slots.
        self.slots
            .iter()
            .enumerate()
            .map(|(index, slot)| (index as u8, slot))
    }

    /// Number of bound slots.
    pub fn bound_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Bound(_)))
            .count()
    }
}
