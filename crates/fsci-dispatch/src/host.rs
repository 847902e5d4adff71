use std::io::Write;

use fsci_frame::{Packet, PacketWriter};
use fsci_records::{BleStatus, Command};

use crate::error::Result;

/// The BLE host stack as seen by the command dispatcher.
///
/// `execute` runs one decoded command and returns its immediate status.
/// Commands with a completion event report their result later through
/// [`CommandDispatcher::notify`](crate::CommandDispatcher::notify).
pub trait GapHost {
    fn execute(&mut self, command: Command) -> BleStatus;
}

impl<H: GapHost + ?Sized> GapHost for &mut H {
    fn execute(&mut self, command: Command) -> BleStatus {
        (**self).execute(command)
    }
}

/// Where outbound packets go.
pub trait PacketSink {
    fn send_packet(&mut self, packet: Packet) -> Result<()>;
}

impl<W: Write> PacketSink for PacketWriter<W> {
    fn send_packet(&mut self, packet: Packet) -> Result<()> {
        Ok(self.write_packet(&packet)?)
    }
}

/// Collects packets in memory.
impl PacketSink for Vec<Packet> {
    fn send_packet(&mut self, packet: Packet) -> Result<()> {
        self.push(packet);
        Ok(())
    }
}

impl<S: PacketSink + ?Sized> PacketSink for &mut S {
    fn send_packet(&mut self, packet: Packet) -> Result<()> {
        (**self).send_packet(packet)
    }
}
