//! Device side: commands in, statuses and events out.

use fsci_frame::{group_name, Packet, WireReader, GAP};
use fsci_records::event::CommandStatus;
use fsci_records::{BleStatus, Command, CommandOpcode, Event, Marshal};

use crate::config::DispatchConfig;
use crate::emit::{emit, framework_error};
use crate::error::{DispatchError, Result};
use crate::fragment::fragment_subevent;
use crate::host::{GapHost, PacketSink};
use crate::table::OpcodeTable;

/// Decodes commands, runs them on a [`GapHost`] and reports back.
///
/// Every executed command is answered with a `CommandStatus` event. A
/// command that cannot be looked up or decoded is answered with a
/// framework error report instead, and the host is not called.
pub struct CommandDispatcher<H, S> {
    table: OpcodeTable<CommandOpcode>,
    host: H,
    sink: S,
    config: DispatchConfig,
}

impl<H: GapHost, S: PacketSink> CommandDispatcher<H, S> {
    pub fn new(host: H, sink: S) -> Self {
        Self::with_config(host, sink, DispatchConfig::default())
    }

    pub fn with_config(host: H, sink: S, config: DispatchConfig) -> Self {
        Self {
            table: OpcodeTable::commands(config.features),
            host,
            sink,
            config,
        }
    }

    /// Handle one inbound packet.
    pub fn handle_packet(&mut self, packet: &Packet) -> Result<BleStatus> {
        if packet.group != GAP {
            tracing::warn!(
                group = packet.group,
                name = group_name(packet.group),
                "command for unhandled opcode group"
            );
            return Err(self.reject(DispatchError::UnknownGroup(packet.group)));
        }
        self.dispatch(packet.opcode, &packet.payload, self.config.interface_id)
    }

    /// Look `opcode` up, decode `payload`, run the command and send its
    /// status. Errors have already been reported to the sender when this
    /// returns `Err`.
    pub fn dispatch(&mut self, opcode: u8, payload: &[u8], channel: u8) -> Result<BleStatus> {
        let op = match self.table.lookup(opcode) {
            Ok(op) => op,
            Err(err) => {
                tracing::warn!(opcode, channel, error = %err, "command not dispatched");
                return Err(self.reject(err));
            }
        };

        let mut r = WireReader::with_limits(payload, self.config.limits);
        let command = match Command::decode(op, &mut r).and_then(|cmd| r.finish().map(|()| cmd)) {
            Ok(command) => command,
            Err(err) => {
                tracing::warn!(opcode, channel, ?op, error = %err, "command payload rejected");
                return Err(self.reject(err.into()));
            }
        };

        tracing::debug!(channel, ?op, size = payload.len(), "command dispatched");
        let status = self.host.execute(command);
        if !status.is_success() {
            tracing::debug!(channel, ?op, %status, "command failed");
        }
        self.notify(Event::CommandStatus(CommandStatus { status }))?;
        Ok(status)
    }

    /// Send an event produced by the host, e.g. a relayed result.
    ///
    /// Subevent results larger than the configured fragment limit, or with
    /// more steps than one event can count, are sent as a result followed
    /// by continue events.
    pub fn notify(&mut self, event: Event) -> Result<()> {
        let pieces = match event {
            Event::CsSubeventResult(result) => {
                fragment_subevent(result, self.config.max_fragment_payload)?
            }
            other => vec![other],
        };
        for piece in &pieces {
            self.sink.send_packet(emit(piece)?)?;
        }
        Ok(())
    }

    /// Answer a rejected command with a framework error report.
    fn reject(&mut self, err: DispatchError) -> DispatchError {
        if let Some(status) = err.fsci_status() {
            if let Err(send_err) = self.sink.send_packet(framework_error(status)) {
                tracing::warn!(error = %send_err, "failed to report framework error");
            }
        }
        err
    }

    pub fn table(&self) -> &OpcodeTable<CommandOpcode> {
        &self.table
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_parts(self) -> (H, S) {
        (self.host, self.sink)
    }
}

