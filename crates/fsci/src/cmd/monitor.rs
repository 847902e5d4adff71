use std::fs::File;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use fsci_dispatch::{Direction, SubeventAssembler};
use fsci_frame::{FrameError, Packet, PacketReader, WireReader, GAP};
use fsci_records::{Event, EventOpcode};

use crate::cmd::{decode_record, to_value, MonitorArgs};
use crate::exit::{frame_error, io_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_packet, DecodedPacket, OutputFormat};

pub fn run(args: MonitorArgs, format: OutputFormat) -> CliResult<i32> {
    let file = File::open(&args.path)
        .map_err(|err| io_error(&format!("failed opening {}", args.path.display()), err))?;
    let mut reader = PacketReader::new(file);

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut monitor = Monitor {
        direction: args.direction.into(),
        features: args.features.features(),
        assembler: SubeventAssembler::new(),
    };
    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let packet = match reader.read_packet() {
            Ok(packet) => packet,
            Err(FrameError::ConnectionClosed) => break,
            Err(err @ FrameError::ChecksumMismatch { .. }) => {
                tracing::warn!(error = %err, "corrupt packet skipped");
                continue;
            }
            Err(err) => return Err(frame_error("read failed", err)),
        };

        let Some(decoded) = monitor.observe(&packet) else {
            continue;
        };
        print_packet(&decoded, format);
        printed = printed.saturating_add(1);

        if args.count.is_some_and(|count| printed >= count) {
            break;
        }
    }

    if monitor.assembler.open_count() > 0 {
        tracing::warn!(
            open = monitor.assembler.open_count(),
            "capture ended inside a subevent"
        );
    }
    Ok(SUCCESS)
}

struct Monitor {
    direction: Direction,
    features: fsci_dispatch::Features,
    assembler: SubeventAssembler,
}

impl Monitor {
    /// Decode one packet. Subevent pieces are held back until the whole
    /// subevent is in.
    fn observe(&mut self, packet: &Packet) -> Option<DecodedPacket> {
        let mut decoded = match decode_record(packet, self.direction, self.features) {
            Ok(decoded) => decoded,
            Err(err) => {
                tracing::warn!(
                    group = packet.group,
                    opcode = packet.opcode,
                    error = %err,
                    "packet not decoded"
                );
                return None;
            }
        };
        if packet.group != GAP || self.direction != Direction::Event {
            return Some(decoded);
        }

        let opcode = EventOpcode::try_from(packet.opcode).ok()?;
        if !matches!(
            opcode,
            EventOpcode::CsSubeventResult | EventOpcode::CsSubeventResultContinue
        ) {
            return Some(decoded);
        }

        let mut r = WireReader::new(&packet.payload);
        let complete = match Event::decode(opcode, &mut r).ok()? {
            Event::CsSubeventResult(result) => self.assembler.push_result(result),
            Event::CsSubeventResultContinue(cont) => {
                self.assembler.push_continue(cont).unwrap_or_else(|err| {
                    tracing::warn!(error = %err, "subevent reassembly abandoned");
                    None
                })
            }
            _ => None,
        }?;
        decoded.name = format!("{:?}", EventOpcode::CsSubeventResult);
        decoded.record = to_value(&Event::CsSubeventResult(complete)).ok()?;
        Some(decoded)
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
