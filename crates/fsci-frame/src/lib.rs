//! FSCI packet framing and bounds-checked wire cursors.
//!
//! Every FSCI message travels in a packet framed as:
//! - A 1-byte sync marker (`0x02`)
//! - A 1-byte opcode group and a 1-byte opcode
//! - A 2-byte little-endian payload length
//! - The payload, followed by a 1-byte XOR checksum
//!
//! Payload fields are read and written through [`WireReader`] and
//! [`WireWriter`], which carry a remaining-length bound and turn under-run
//! into a typed error instead of reading past the buffer.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod cursor;
pub mod error;
pub mod group;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::FsciCodec;
pub use codec::{
    checksum, decode_packet, encode_packet, FrameConfig, Packet, DEFAULT_MAX_PAYLOAD, HEADER_SIZE,
    SYNC, TRAILER_SIZE,
};
pub use cursor::{DecodeLimits, WireReader, WireWriter, DEFAULT_MAX_RECORD_ALLOCATION};
pub use error::{FrameError, Result, WireError, WireResult};
pub use group::{group_name, FsciStatus, FSCI, FSCI_ERROR_OPCODE, GAP};
pub use reader::PacketReader;
pub use writer::PacketWriter;
