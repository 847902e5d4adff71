//! Outbound encoding: size, allocate, encode, frame.

use fsci_frame::{FsciStatus, Packet, WireResult, WireWriter, FSCI, FSCI_ERROR_OPCODE, GAP};
use fsci_records::{Command, Event};

use crate::error::Result;

/// A record that can be sent as a GAP packet.
pub trait Outbound {
    fn opcode(&self) -> u8;
    fn wire_size(&self) -> usize;
    fn encode(&self, w: &mut WireWriter) -> WireResult<()>;
}

impl Outbound for Command {
    fn opcode(&self) -> u8 {
        Command::opcode(self).into()
    }

    fn wire_size(&self) -> usize {
        Command::wire_size(self)
    }

    fn encode(&self, w: &mut WireWriter) -> WireResult<()> {
        Command::encode(self, w)
    }
}

impl Outbound for Event {
    fn opcode(&self) -> u8 {
        Event::opcode(self).into()
    }

    fn wire_size(&self) -> usize {
        Event::wire_size(self)
    }

    fn encode(&self, w: &mut WireWriter) -> WireResult<()> {
        Event::encode(self, w)
    }
}

/// Encode `record` into a packet whose payload is exactly its computed size.
pub fn emit<R: Outbound>(record: &R) -> Result<Packet> {
    let size = record.wire_size();
    let mut w = WireWriter::with_capacity(size);
    record.encode(&mut w)?;
    if w.written() != size {
        return Err(fsci_frame::WireError::SizeMismatch {
            expected: size,
            written: w.written(),
        }
        .into());
    }
    tracing::trace!(opcode = record.opcode(), size, "record encoded");
    Ok(Packet::new(GAP, record.opcode(), w.into_bytes()))
}

/// A framework error report carrying `status`.
pub fn framework_error(status: FsciStatus) -> Packet {
    Packet::new(FSCI, FSCI_ERROR_OPCODE, vec![status.as_u8()])
}
