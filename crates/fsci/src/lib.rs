//! FSCI BLE GAP codec and dispatcher.
//!
//! Lets a controller on the other end of a serial or socket link drive a
//! BLE host stack: commands and events travel as compact binary records
//! inside checksummed packets.
//!
//! # Crate Structure
//!
//! - [`frame`] — Packet framing and bounds-checked wire cursors
//! - [`records`] — Command and event records with their wire layouts
//! - [`dispatch`] — Opcode tables, dispatchers and the out-parameter relay

/// Re-export frame types.
pub mod frame {
    pub use fsci_frame::*;
}

/// Re-export record types.
pub mod records {
    pub use fsci_records::*;
}

/// Re-export dispatch types.
pub mod dispatch {
    pub use fsci_dispatch::*;
}
