//! Host side: events in, relay and application callbacks out.

use std::sync::Arc;

use fsci_frame::{
    group_name, DecodeLimits, FsciStatus, Packet, WireReader, FSCI, FSCI_ERROR_OPCODE, GAP,
};
use fsci_records::{Event, EventOpcode};

use crate::assembler::SubeventAssembler;
use crate::config::DispatchConfig;
use crate::error::{DispatchError, Result};
use crate::relay::{Delivery, Relay};
use crate::table::OpcodeTable;

/// Receives decoded events.
pub trait EventSink {
    fn on_event(&mut self, event: Event);
}

/// Collects events in memory.
impl EventSink for Vec<Event> {
    fn on_event(&mut self, event: Event) {
        self.push(event);
    }
}

impl<E: EventSink + ?Sized> EventSink for &mut E {
    fn on_event(&mut self, event: Event) {
        (**self).on_event(event)
    }
}

/// Routes inbound events.
///
/// Completion events go to the channel's [`Relay`] and nowhere else.
/// Command statuses are shown to the relay and then to the sink.
/// Subevent results are held until their continue events complete them.
pub struct EventDispatcher<E> {
    table: OpcodeTable<EventOpcode>,
    relay: Arc<Relay>,
    assembler: SubeventAssembler,
    sink: E,
    config: DispatchConfig,
}

impl<E: EventSink> EventDispatcher<E> {
    pub fn new(relay: Arc<Relay>, sink: E) -> Self {
        Self::with_config(relay, sink, DispatchConfig::default())
    }

    pub fn with_config(relay: Arc<Relay>, sink: E, config: DispatchConfig) -> Self {
        Self {
            table: OpcodeTable::events(config.features),
            relay,
            assembler: SubeventAssembler::with_budget(config.limits.max_record_allocation),
            sink,
            config,
        }
    }

    /// Handle one inbound packet.
    pub fn handle_packet(&mut self, packet: &Packet) -> Result<()> {
        match (packet.group, packet.opcode) {
            (GAP, opcode) => self.dispatch(opcode, &packet.payload, self.config.interface_id),
            (FSCI, FSCI_ERROR_OPCODE) => {
                self.on_framework_error(&packet.payload);
                Ok(())
            }
            (group, opcode) => {
                tracing::warn!(
                    group,
                    opcode,
                    name = group_name(group),
                    "event for unhandled opcode group dropped"
                );
                Err(DispatchError::UnknownGroup(group))
            }
        }
    }

    /// Look `opcode` up and route its payload.
    pub fn dispatch(&mut self, opcode: u8, payload: &[u8], channel: u8) -> Result<()> {
        let op = self.table.lookup(opcode).inspect_err(|err| {
            tracing::warn!(opcode, channel, error = %err, "event dropped");
        })?;

        if op.is_completion() {
            return match self.relay.complete(op, payload) {
                Delivery::Delivered | Delivery::Dropped => Ok(()),
                Delivery::Failed(err) => Err(err.into()),
            };
        }

        let event = decode_event(op, payload, self.config.limits).inspect_err(|err| {
            tracing::warn!(channel, ?op, error = %err, "event payload rejected");
        })?;
        tracing::trace!(channel, ?op, size = payload.len(), "event decoded");

        match event {
            Event::CommandStatus(status) => {
                self.relay.on_status(status.status);
                self.sink.on_event(Event::CommandStatus(status));
            }
            Event::CsSubeventResult(result) => {
                if let Some(done) = self.assembler.push_result(result) {
                    self.sink.on_event(Event::CsSubeventResult(done));
                }
            }
            Event::CsSubeventResultContinue(cont) => {
                let joined = self.assembler.push_continue(cont).inspect_err(|err| {
                    tracing::warn!(channel, error = %err, "subevent reassembly abandoned");
                })?;
                if let Some(done) = joined {
                    self.sink.on_event(Event::CsSubeventResult(done));
                }
            }
            Event::Disconnected(disconnected) => {
                self.assembler.discard_device(disconnected.device_id);
                self.sink.on_event(Event::Disconnected(disconnected));
            }
            other => self.sink.on_event(other),
        }
        Ok(())
    }

    fn on_framework_error(&mut self, payload: &[u8]) {
        let raw = payload.first().copied();
        let status = raw.and_then(FsciStatus::from_u8);
        tracing::warn!(?raw, ?status, "device reported framework error");
        // The rejected command will not produce a status of its own.
        let status = status.unwrap_or(FsciStatus::DecodeFailed);
        self.relay.on_rejected(status);
    }

    pub fn relay(&self) -> &Arc<Relay> {
        &self.relay
    }

    pub fn table(&self) -> &OpcodeTable<EventOpcode> {
        &self.table
    }

    pub fn assembler(&self) -> &SubeventAssembler {
        &self.assembler
    }

    pub fn sink(&self) -> &E {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut E {
        &mut self.sink
    }

    pub fn into_sink(self) -> E {
        self.sink
    }
}

/// Decode a whole event payload without routing it.
pub fn decode_event(op: EventOpcode, payload: &[u8], limits: DecodeLimits) -> Result<Event> {
    let mut r = WireReader::with_limits(payload, limits);
    let event = Event::decode(op, &mut r)?;
    r.finish()?;
    Ok(event)
}
