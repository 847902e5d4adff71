//! Controller-side command issuing.

use std::sync::Arc;

use fsci_frame::{WireReader, WireResult};
use fsci_records::command::{CccdQuery, GetBondedDeviceName, LoadCustomPeerInformation};
use fsci_records::event::{
    BondedResult, BoolResult, CountResult, DeviceNameResult, EncryptionInformationResult,
    PeerInformationResult,
};
use fsci_records::types::{DeviceRef, Empty};
use fsci_records::{Command, DeviceId, Marshal};

use crate::emit::emit;
use crate::error::{DispatchError, Result};
use crate::host::PacketSink;
use crate::relay::{CompletionDecoder, OutSlot, Relay};

/// Sends commands and binds relayed results to [`OutSlot`]s.
///
/// The client shares its [`Relay`] with the [`EventDispatcher`] reading the
/// same channel, which is what completes the slots.
///
/// [`EventDispatcher`]: crate::EventDispatcher
pub struct FsciClient<S> {
    sink: S,
    relay: Arc<Relay>,
}

impl<S: PacketSink> FsciClient<S> {
    pub fn new(sink: S, relay: Arc<Relay>) -> Self {
        Self { sink, relay }
    }

    /// Send a command without waiting on anything.
    pub fn send(&mut self, command: &Command) -> Result<()> {
        let packet = emit(command)?;
        tracing::trace!(
            opcode = ?command.opcode(),
            size = packet.payload.len(),
            "sending command"
        );
        self.sink.send_packet(packet)
    }

    /// Register a slot for `command`'s completion, then send it.
    ///
    /// Fails with [`DispatchError::RelayBusy`] if another relayed command is
    /// still outstanding on this channel, and with
    /// [`DispatchError::NotRelayed`] if `command` has no completion event.
    pub fn request<T: Send + 'static>(
        &mut self,
        command: &Command,
        decode: CompletionDecoder<T>,
    ) -> Result<OutSlot<T>> {
        let opcode = command.opcode();
        let completion = opcode
            .completion()
            .ok_or(DispatchError::NotRelayed(opcode))?;
        let slot = self.relay.register(completion, decode)?;
        if let Err(err) = self.send(command) {
            self.relay.cancel();
            return Err(err);
        }
        Ok(slot)
    }

    pub fn check_notification_status(
        &mut self,
        device_id: DeviceId,
        handle: u16,
    ) -> Result<OutSlot<bool>> {
        let command = Command::CheckNotificationStatus(CccdQuery { device_id, handle });
        self.request(&command, bool_value)
    }

    pub fn check_indication_status(
        &mut self,
        device_id: DeviceId,
        handle: u16,
    ) -> Result<OutSlot<bool>> {
        let command = Command::CheckIndicationStatus(CccdQuery { device_id, handle });
        self.request(&command, bool_value)
    }

    pub fn get_bonded_devices_count(&mut self) -> Result<OutSlot<u8>> {
        self.request(&Command::GetBondedDevicesCount(Empty {}), count_value)
    }

    pub fn get_bonded_device_name(
        &mut self,
        nvm_index: u8,
        max_name_size: u8,
    ) -> Result<OutSlot<Vec<u8>>> {
        let command = Command::GetBondedDeviceName(GetBondedDeviceName {
            nvm_index,
            max_name_size,
        });
        self.request(&command, device_name)
    }

    pub fn load_custom_peer_information(
        &mut self,
        device_id: DeviceId,
        offset: u16,
        size: u16,
    ) -> Result<OutSlot<Vec<u8>>> {
        let command = Command::LoadCustomPeerInformation(LoadCustomPeerInformation {
            device_id,
            offset,
            size,
        });
        self.request(&command, peer_information)
    }

    /// Resolves to `(is_bonded, nvm_index)`.
    pub fn check_if_bonded(&mut self, device_id: DeviceId) -> Result<OutSlot<(bool, u8)>> {
        let command = Command::CheckIfBonded(DeviceRef { device_id });
        self.request(&command, bonded)
    }

    pub fn load_encryption_information(
        &mut self,
        device_id: DeviceId,
    ) -> Result<OutSlot<Vec<u8>>> {
        let command = Command::LoadEncryptionInformation(DeviceRef { device_id });
        self.request(&command, encryption_information)
    }

    pub fn relay(&self) -> &Arc<Relay> {
        &self.relay
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

fn bool_value(r: &mut WireReader<'_>) -> WireResult<bool> {
    BoolResult::decode(r).map(|result| result.value)
}

fn count_value(r: &mut WireReader<'_>) -> WireResult<u8> {
    CountResult::decode(r).map(|result| result.count)
}

fn device_name(r: &mut WireReader<'_>) -> WireResult<Vec<u8>> {
    DeviceNameResult::decode(r).map(|result| result.name)
}

fn peer_information(r: &mut WireReader<'_>) -> WireResult<Vec<u8>> {
    PeerInformationResult::decode(r).map(|result| result.info)
}

fn bonded(r: &mut WireReader<'_>) -> WireResult<(bool, u8)> {
    BondedResult::decode(r).map(|result| (result.is_bonded, result.nvm_index))
}

fn encryption_information(r: &mut WireReader<'_>) -> WireResult<Vec<u8>> {
    EncryptionInformationResult::decode(r).map(|result| result.ltk)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use fsci_frame::{Packet, GAP};
    use fsci_records::event::CommandStatus;
    use fsci_records::{BleStatus, CommandOpcode, EventOpcode};

    use super::*;

    struct ClosedSink;

    impl PacketSink for ClosedSink {
        fn send_packet(&mut self, _packet: Packet) -> Result<()> {
            Err(DispatchError::Cancelled)
        }
    }

    fn client() -> FsciClient<Vec<Packet>> {
        FsciClient::new(Vec::new(), Arc::new(Relay::new(0)))
    }

    #[test]
    fn request_registers_then_sends() {
        let mut client = client();
        let slot = client.check_if_bonded(3).unwrap();

        assert_eq!(client.relay().pending(), Some(EventOpcode::CheckIfBondedResult));
        let sent = &client.sink()[0];
        assert_eq!(sent.group, GAP);
        assert_eq!(sent.opcode, CommandOpcode::CheckIfBonded as u8);
        assert_eq!(sent.payload.as_ref(), &[3]);

        client
            .relay()
            .complete(EventOpcode::CheckIfBondedResult, &[1, 7]);
        assert_eq!(slot.wait(Duration::from_millis(10)).unwrap(), (true, 7));
    }

    #[test]
    fn second_request_fails_fast() {
        let mut client = client();
        let _first = client.get_bonded_devices_count().unwrap();
        let err = client.check_notification_status(0, 0x10).unwrap_err();

        assert!(matches!(
            err,
            DispatchError::RelayBusy {
                pending: EventOpcode::GetBondedDevicesCountResult,
                ..
            }
        ));
        // The refused command never left.
        assert_eq!(client.sink().len(), 1);
    }

    #[test]
    fn plain_command_is_not_relayed() {
        let mut client = client();
        let command = Command::Disconnect(DeviceRef { device_id: 1 });
        let err = client.request(&command, bool_value).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::NotRelayed(CommandOpcode::Disconnect)
        ));
        assert!(client.sink().is_empty());
    }

    #[test]
    fn failed_send_releases_slot() {
        let mut client = FsciClient::new(ClosedSink, Arc::new(Relay::new(0)));
        assert!(client.load_encryption_information(2).is_err());
        assert_eq!(client.relay().pending(), None);
    }

    #[test]
    fn error_status_fails_request() {
        let mut client = client();
        let slot = client.get_bonded_device_name(0, 32).unwrap();
        let status = CommandStatus {
            status: BleStatus::INVALID_PARAMETER,
        };
        client.relay().on_status(status.status);

        assert!(matches!(
            slot.wait(Duration::from_millis(10)),
            Err(DispatchError::CommandFailed(BleStatus::INVALID_PARAMETER))
        ));
    }
}
