//! Opcode groups and framework status codes.
//!
//! The opcode group selects which family of tables interprets a packet.
//! Commands and events of the same family share a group; the direction of
//! travel decides which table is consulted.

/// GAP commands (host to device) and GAP events (device to host).
pub const GAP: u8 = 0x48;

/// FSCI framework messages (error reports).
pub const FSCI: u8 = 0xA4;

/// Opcode of the framework error report inside the [`FSCI`] group.
pub const FSCI_ERROR_OPCODE: u8 = 0xFE;

/// Returns a human-readable name for an opcode group.
pub fn group_name(group: u8) -> &'static str {
    match group {
        GAP => "GAP",
        FSCI => "FSCI",
        _ => "UNKNOWN",
    }
}

/// Framework-level status carried by an FSCI error report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FsciStatus {
    Success = 0x00,
    UnknownOpcode = 0xF2,
    UnknownOpcodeGroup = 0xF3,
    DecodeFailed = 0xF5,
    OutOfMemory = 0xF7,
    RelayBusy = 0xF8,
}

impl FsciStatus {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Success),
            0xF2 => Some(Self::UnknownOpcode),
            0xF3 => Some(Self::UnknownOpcodeGroup),
            0xF5 => Some(Self::DecodeFailed),
            0xF7 => Some(Self::OutOfMemory),
            0xF8 => Some(Self::RelayBusy),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}
