use std::time::Duration;

use fsci_frame::{FrameError, FsciStatus, WireError};
use fsci_records::{BleStatus, CommandOpcode, EventOpcode};

use crate::table::{Direction, SlotKind};

/// Errors that can occur while dispatching FSCI messages.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// A payload could not be decoded or encoded.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// Packet-level error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The opcode has no handler in this table.
    #[error("unknown {direction} opcode {opcode:#04x} ({slot})")]
    UnknownOpcode {
        direction: Direction,
        opcode: u8,
        slot: SlotKind,
    },

    /// The packet's opcode group is not handled here.
    #[error("unknown opcode group {0:#04x}")]
    UnknownGroup(u8),

    /// Another relayed command is still waiting for its completion.
    #[error("relay busy on channel {channel}: waiting for {pending:?}")]
    RelayBusy { channel: u8, pending: EventOpcode },

    /// The command does not deliver its result in a completion event.
    #[error("{0:?} has no completion event")]
    NotRelayed(CommandOpcode),

    /// The host reported a non-success status for the command.
    #[error("command failed: {0}")]
    CommandFailed(BleStatus),

    /// The device refused the command before executing it.
    #[error("command rejected by device: {0:?}")]
    Rejected(FsciStatus),

    /// The relay was cleared before a completion arrived.
    #[error("relay cancelled")]
    Cancelled,

    /// No completion arrived in time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// A single piece of a fragmented message does not fit the limit.
    #[error("fragment of {needed} bytes exceeds limit of {max_payload}")]
    FragmentTooLarge { needed: usize, max_payload: usize },
}

impl DispatchError {
    /// The framework status reported back to the sender of a command that
    /// failed with this error, if any.
    pub fn fsci_status(&self) -> Option<FsciStatus> {
        match self {
            Self::Wire(WireError::OutOfMemory { .. }) => Some(FsciStatus::OutOfMemory),
            Self::Wire(_) => Some(FsciStatus::DecodeFailed),
            Self::UnknownOpcode { .. } => Some(FsciStatus::UnknownOpcode),
            Self::UnknownGroup(_) => Some(FsciStatus::UnknownOpcodeGroup),
            Self::RelayBusy { .. } => Some(FsciStatus::RelayBusy),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
