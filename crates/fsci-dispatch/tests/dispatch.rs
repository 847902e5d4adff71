use std::sync::Arc;
use std::time::Duration;

use fsci_frame::{DecodeLimits, FsciStatus, Packet, WireError, FSCI, FSCI_ERROR_OPCODE, GAP};
use fsci_records::cs::{CsSubeventResult, CsSubeventResultContinue, DoneStatus};
use fsci_records::event::{BondedResult, CommandStatus};
use fsci_records::types::DeviceRef;
use fsci_records::{
    BleStatus, Command, CommandOpcode, Event, EventOpcode, StepList, COMMAND_TABLE_LEN,
    EVENT_TABLE_LEN, MAX_STEPS_PER_EVENT,
};
use fsci_dispatch::{
    emit, framework_error, CommandDispatcher, DispatchConfig, DispatchError, EventDispatcher,
    Features, FsciClient, GapHost, OpcodeTable, Relay, Slot, SlotKind,
};

#[derive(Default)]
struct RecordingHost {
    executed: Vec<Command>,
    status: BleStatus,
}

impl GapHost for RecordingHost {
    fn execute(&mut self, command: Command) -> BleStatus {
        self.executed.push(command);
        self.status
    }
}

fn command_status(status: BleStatus) -> Packet {
    emit(&Event::CommandStatus(CommandStatus { status })).unwrap()
}

#[test]
fn every_bound_slot_holds_its_own_opcode() {
    for features in [Features::all(), Features::core()] {
        let commands = OpcodeTable::commands(features);
        assert_eq!(commands.len(), COMMAND_TABLE_LEN);
        for (index, slot) in commands.iter() {
            if let Slot::Bound(op) = slot {
                assert_eq!(u8::from(*op), index);
                assert!(features.enables(op.feature()));
            }
        }

        let events = OpcodeTable::events(features);
        assert_eq!(events.len(), EVENT_TABLE_LEN);
        for (index, slot) in events.iter() {
            if let Slot::Bound(op) = slot {
                assert_eq!(u8::from(*op), index);
            }
        }
    }
}

#[test]
fn every_known_opcode_has_a_slot() {
    let table = OpcodeTable::commands(Features::all());
    for op in CommandOpcode::ALL {
        assert_eq!(table.lookup(u8::from(*op)).unwrap(), *op);
    }
    let table = OpcodeTable::events(Features::all());
    for op in EventOpcode::ALL {
        assert_eq!(table.lookup(u8::from(*op)).unwrap(), *op);
    }
}

#[test]
fn lookup_fails_for_every_unbound_opcode() {
    let table = OpcodeTable::commands(Features::core());
    for opcode in 0..=u8::MAX {
        let bound = matches!(table.slot(opcode), Some(Slot::Bound(_)));
        match table.lookup(opcode) {
            Ok(_) => assert!(bound),
            Err(DispatchError::UnknownOpcode { slot, .. }) => {
                assert!(!bound);
                if usize::from(opcode) >= COMMAND_TABLE_LEN {
                    assert_eq!(slot, SlotKind::OutOfRange);
                }
            }
            Err(other) => panic!("unexpected error {other}"),
        }
    }
}

#[test]
fn disabled_feature_commands_are_rejected_without_calling_host() {
    let config = DispatchConfig {
        features: Features::core(),
        ..DispatchConfig::default()
    };
    let mut dispatcher =
        CommandDispatcher::with_config(RecordingHost::default(), Vec::new(), config);

    let err = dispatcher
        .dispatch(CommandOpcode::CsSetDefaultSettings as u8, &[0; 4], 0)
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::UnknownOpcode {
            slot: SlotKind::Reserved,
            ..
        }
    ));
    assert!(dispatcher.host().executed.is_empty());
    assert_eq!(
        dispatcher.sink().as_slice(),
        &[framework_error(FsciStatus::UnknownOpcode)]
    );
}

#[test]
fn opcode_past_table_end_reports_unknown_opcode() {
    let mut dispatcher = CommandDispatcher::new(RecordingHost::default(), Vec::new());

    let err = dispatcher
        .dispatch(COMMAND_TABLE_LEN as u8, &[], 0)
        .unwrap_err();

    assert!(matches!(
        err,
        DispatchError::UnknownOpcode {
            slot: SlotKind::OutOfRange,
            ..
        }
    ));
    assert!(dispatcher.host().executed.is_empty());
    let sent = &dispatcher.sink()[0];
    assert_eq!((sent.group, sent.opcode), (FSCI, FSCI_ERROR_OPCODE));
    assert_eq!(sent.payload.as_ref(), &[FsciStatus::UnknownOpcode.as_u8()]);
}

#[test]
fn truncated_command_reports_decode_failure() {
    let mut dispatcher = CommandDispatcher::new(RecordingHost::default(), Vec::new());
    let packet = Packet::new(GAP, CommandOpcode::CheckNotificationStatus as u8, vec![1]);

    let err = dispatcher.handle_packet(&packet).unwrap_err();

    assert!(matches!(err, DispatchError::Wire(_)));
    assert!(dispatcher.host().executed.is_empty());
    assert_eq!(
        dispatcher.sink().as_slice(),
        &[framework_error(FsciStatus::DecodeFailed)]
    );
}

#[test]
fn unknown_group_is_rejected() {
    let mut dispatcher = CommandDispatcher::new(RecordingHost::default(), Vec::new());
    let err = dispatcher
        .handle_packet(&Packet::new(0x41, 0x00, Vec::new()))
        .unwrap_err();
    assert!(matches!(err, DispatchError::UnknownGroup(0x41)));
    assert_eq!(
        dispatcher.sink().as_slice(),
        &[framework_error(FsciStatus::UnknownOpcodeGroup)]
    );
}

#[test]
fn executed_command_is_answered_with_status() {
    let host = RecordingHost {
        status: BleStatus::INVALID_STATE,
        ..RecordingHost::default()
    };
    let mut dispatcher = CommandDispatcher::new(host, Vec::new());
    let command = Command::Disconnect(DeviceRef { device_id: 4 });

    let status = dispatcher.handle_packet(&emit(&command).unwrap()).unwrap();

    assert_eq!(status, BleStatus::INVALID_STATE);
    assert_eq!(dispatcher.host().executed, vec![command]);
    assert_eq!(
        dispatcher.sink().as_slice(),
        &[command_status(BleStatus::INVALID_STATE)]
    );
}

#[test]
fn relayed_request_completes_across_both_ends() {
    let relay = Arc::new(Relay::new(0));
    let mut client = FsciClient::new(Vec::new(), Arc::clone(&relay));
    let mut events = EventDispatcher::new(Arc::clone(&relay), Vec::<Event>::new());
    let mut device = CommandDispatcher::new(RecordingHost::default(), Vec::new());

    let slot = client.check_if_bonded(5).unwrap();
    for packet in client.sink_mut().drain(..) {
        device.handle_packet(&packet).unwrap();
    }
    device
        .notify(Event::CheckIfBondedResult(BondedResult {
            is_bonded: true,
            nvm_index: 2,
        }))
        .unwrap();

    for packet in device.sink_mut().drain(..) {
        events.handle_packet(&packet).unwrap();
    }

    assert_eq!(slot.wait(Duration::from_millis(50)).unwrap(), (true, 2));
    assert_eq!(relay.pending(), None);
    // The status reaches the application; the completion only the slot.
    assert_eq!(
        events.sink().as_slice(),
        &[Event::CommandStatus(CommandStatus {
            status: BleStatus::SUCCESS
        })]
    );
}

#[test]
fn completion_after_error_status_is_dropped() {
    let relay = Arc::new(Relay::new(0));
    let mut client = FsciClient::new(Vec::new(), Arc::clone(&relay));
    let mut events = EventDispatcher::new(Arc::clone(&relay), Vec::<Event>::new());

    let slot = client.check_if_bonded(1).unwrap();
    events
        .handle_packet(&command_status(BleStatus::INVALID_PARAMETER))
        .unwrap();

    assert!(slot.is_ready());
    assert!(matches!(
        slot.wait(Duration::ZERO),
        Err(DispatchError::CommandFailed(BleStatus::INVALID_PARAMETER))
    ));
    assert_eq!(relay.pending(), None);

    let stale = emit(&Event::CheckIfBondedResult(BondedResult {
        is_bonded: true,
        nvm_index: 0,
    }))
    .unwrap();
    events.handle_packet(&stale).unwrap();

    assert_eq!(events.sink().len(), 1);
    // The channel is free again.
    assert!(client.get_bonded_devices_count().is_ok());
}

#[test]
fn failure_of_a_later_command_leaves_acknowledged_request_alone() {
    let relay = Arc::new(Relay::new(0));
    let mut client = FsciClient::new(Vec::new(), Arc::clone(&relay));
    let mut events = EventDispatcher::new(Arc::clone(&relay), Vec::<Event>::new());

    let slot = client.check_if_bonded(1).unwrap();
    events
        .handle_packet(&command_status(BleStatus::SUCCESS))
        .unwrap();

    client
        .send(&Command::Disconnect(DeviceRef { device_id: 1 }))
        .unwrap();
    events
        .handle_packet(&command_status(BleStatus::INVALID_STATE))
        .unwrap();
    events
        .handle_packet(&framework_error(FsciStatus::DecodeFailed))
        .unwrap();
    assert!(!slot.is_ready());
    assert_eq!(relay.pending(), Some(EventOpcode::CheckIfBondedResult));

    let completion = emit(&Event::CheckIfBondedResult(BondedResult {
        is_bonded: true,
        nvm_index: 3,
    }))
    .unwrap();
    events.handle_packet(&completion).unwrap();

    assert_eq!(slot.wait(Duration::from_millis(50)).unwrap(), (true, 3));
    assert_eq!(events.sink().len(), 2);
}

#[test]
fn framework_error_fails_pending_request() {
    let relay = Arc::new(Relay::new(0));
    let mut client = FsciClient::new(Vec::new(), Arc::clone(&relay));
    let mut events = EventDispatcher::new(Arc::clone(&relay), Vec::<Event>::new());

    let slot = client.get_bonded_devices_count().unwrap();
    events
        .handle_packet(&framework_error(FsciStatus::DecodeFailed))
        .unwrap();

    assert!(matches!(
        slot.wait(Duration::ZERO),
        Err(DispatchError::Rejected(FsciStatus::DecodeFailed))
    ));
    assert!(events.sink().is_empty());
}

#[test]
fn undecodable_event_is_an_error_and_reaches_nobody() {
    let relay = Arc::new(Relay::new(0));
    let mut events = EventDispatcher::new(relay, Vec::<Event>::new());
    let packet = Packet::new(GAP, EventOpcode::Disconnected as u8, vec![1, 0]);

    assert!(matches!(
        events.handle_packet(&packet),
        Err(DispatchError::Wire(_))
    ));
    assert!(events.sink().is_empty());
}

#[test]
fn oversized_subevent_is_fragmented_and_reassembled() {
    let mut steps = StepList::new();
    for i in 0..40u8 {
        steps.push(2, i, &[i; 9]).unwrap();
    }
    let result = CsSubeventResult {
        device_id: 1,
        config_id: 0,
        start_acl_conn_event: 100,
        procedure_counter: 3,
        frequency_compensation: -40,
        reference_power_level: -12,
        procedure_done_status: DoneStatus::Complete,
        subevent_done_status: DoneStatus::Complete,
        abort_reason: 0,
        num_antenna_paths: 1,
        steps,
    };

    let mut device = CommandDispatcher::new(RecordingHost::default(), Vec::new());
    device
        .notify(Event::CsSubeventResult(result.clone()))
        .unwrap();
    let packets = device.sink().clone();
    assert!(packets.len() > 1);
    assert!(packets
        .iter()
        .all(|p| p.payload.len() <= device.config().max_fragment_payload));

    let mut events = EventDispatcher::new(Arc::new(Relay::new(0)), Vec::<Event>::new());
    for packet in &packets {
        events.handle_packet(packet).unwrap();
    }
    assert_eq!(events.sink().as_slice(), &[Event::CsSubeventResult(result)]);
    assert_eq!(events.assembler().open_count(), 0);
}

fn partial_subevent(steps: StepList) -> CsSubeventResult {
    CsSubeventResult {
        device_id: 4,
        config_id: 1,
        start_acl_conn_event: 0,
        procedure_counter: 0,
        frequency_compensation: 0,
        reference_power_level: 0,
        procedure_done_status: DoneStatus::Partial,
        subevent_done_status: DoneStatus::Partial,
        abort_reason: 0,
        num_antenna_paths: 1,
        steps,
    }
}

fn continue_packet(status: DoneStatus, steps: StepList) -> Packet {
    emit(&Event::CsSubeventResultContinue(CsSubeventResultContinue {
        device_id: 4,
        config_id: 1,
        procedure_done_status: status,
        subevent_done_status: status,
        abort_reason: 0,
        num_antenna_paths: 1,
        steps,
    }))
    .unwrap()
}

#[test]
fn subevent_outgrowing_allocation_limit_is_discarded() {
    let config = DispatchConfig {
        limits: DecodeLimits {
            max_record_allocation: 4096,
        },
        ..DispatchConfig::default()
    };
    let relay = Arc::new(Relay::new(0));
    let mut events = EventDispatcher::with_config(relay, Vec::<Event>::new(), config);
    let head = emit(&Event::CsSubeventResult(partial_subevent(StepList::new()))).unwrap();
    events.handle_packet(&head).unwrap();

    let mut wide = StepList::new();
    for _ in 0..10 {
        wide.push(0, 1, &[0xA5; 200]).unwrap();
    }
    let piece = continue_packet(DoneStatus::Partial, wide);
    events.handle_packet(&piece).unwrap();
    events.handle_packet(&piece).unwrap();
    assert!(matches!(
        events.handle_packet(&piece),
        Err(DispatchError::Wire(WireError::OutOfMemory {
            field: "steps",
            requested: 6090
        }))
    ));
    assert_eq!(events.assembler().open_count(), 0);

    // The rest of the abandoned subevent has nothing to join.
    events
        .handle_packet(&continue_packet(DoneStatus::Complete, StepList::new()))
        .unwrap();
    assert!(events.sink().is_empty());
}

#[test]
fn subevent_with_many_short_steps_is_split_by_count() {
    let mut steps = StepList::new();
    for i in 0..300u16 {
        steps.push(0, i as u8, &[]).unwrap();
    }
    let mut result = partial_subevent(steps);
    result.procedure_done_status = DoneStatus::Complete;
    result.subevent_done_status = DoneStatus::Complete;

    let config = DispatchConfig {
        max_fragment_payload: 2000,
        ..DispatchConfig::default()
    };
    let mut device = CommandDispatcher::with_config(RecordingHost::default(), Vec::new(), config);
    device
        .notify(Event::CsSubeventResult(result.clone()))
        .unwrap();
    let packets = device.sink().clone();
    assert_eq!(packets.len(), 2);
    assert_eq!(
        usize::from(packets[0].payload[CsSubeventResult::HEADER_SIZE]),
        MAX_STEPS_PER_EVENT
    );

    let mut events = EventDispatcher::new(Arc::new(Relay::new(0)), Vec::<Event>::new());
    for packet in &packets {
        events.handle_packet(packet).unwrap();
    }
    assert_eq!(events.sink().as_slice(), &[Event::CsSubeventResult(result)]);
}
