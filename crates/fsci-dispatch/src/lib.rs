//! Opcode dispatch for FSCI BLE GAP.
//!
//! Two directions, two ends:
//! - [`CommandDispatcher`] runs next to the BLE host stack. It decodes
//!   incoming commands, calls the [`GapHost`] and answers with a command
//!   status, forwarding later results with [`CommandDispatcher::notify`].
//! - [`FsciClient`] and [`EventDispatcher`] run on the controlling side.
//!   Commands whose result arrives in a later event are bound to an
//!   [`OutSlot`] through the channel's [`Relay`] before they are sent.
//!
//! Both ends look opcodes up in dense [`OpcodeTable`]s assembled once from
//! the enabled [`Features`].

pub mod assembler;
pub mod client;
pub mod command_dispatcher;
pub mod config;
pub mod emit;
pub mod error;
pub mod event_dispatcher;
pub mod fragment;
pub mod host;
pub mod relay;
pub mod table;

pub use assembler::SubeventAssembler;
pub use client::FsciClient;
pub use command_dispatcher::CommandDispatcher;
pub use config::{DispatchConfig, Features, DEFAULT_MAX_FRAGMENT_PAYLOAD};
pub use emit::{emit, framework_error, Outbound};
pub use error::{DispatchError, Result};
pub use event_dispatcher::{decode_event, EventDispatcher, EventSink};
pub use fragment::fragment_subevent;
pub use host::{GapHost, PacketSink};
pub use relay::{CompletionDecoder, Delivery, OutSlot, Relay};
pub use table::{Direction, OpcodeTable, Slot, SlotKind};
