//! FSCI BLE GAP records.
//!
//! Every command and event payload has a native Rust type implementing
//! [`Marshal`]: an encoder, a decoder and a size calculator that always
//! agree on the byte layout. [`Command`] and [`Event`] tie the payload
//! types to their opcodes.
//!
//! Layout rules shared by all records:
//! - integers are little-endian, booleans and enums take one byte;
//! - an optional sub-block is preceded by a boolean presence byte;
//! - variable-length buffers are allocated at their exact decoded size
//!   before being filled, against the reader's allocation budget.

#[macro_use]
mod macros;

pub mod command;
pub mod cs;
pub mod event;
pub mod marshal;
pub mod opcode;
pub mod steps;
pub mod types;

pub use command::Command;
pub use event::Event;
pub use marshal::{decode_exact, encode_exact, Marshal};
pub use opcode::{CommandOpcode, EventOpcode, Feature, COMMAND_TABLE_LEN, EVENT_TABLE_LEN};
pub use steps::{measure_steps, StepList, StepRef, MAX_STEPS_PER_EVENT};
pub use types::{AddressType, BleStatus, DeviceAddress, DeviceId, IdentityAddress};
