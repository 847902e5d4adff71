//! Splits subevent results that do not fit one outbound payload.

use fsci_records::cs::{CsSubeventResult, CsSubeventResultContinue, DoneStatus};
use fsci_records::{Event, Marshal, MAX_STEPS_PER_EVENT};

use crate::error::{DispatchError, Result};

/// Split `result` into a [`CsSubeventResult`] followed by as many
/// [`CsSubeventResultContinue`] events as needed so that no payload exceeds
/// `max_payload` and no piece holds more than [`MAX_STEPS_PER_EVENT`] steps.
/// Every piece but the last reports `Partial`.
pub fn fragment_subevent(mut result: CsSubeventResult, max_payload: usize) -> Result<Vec<Event>> {
    if result.wire_size() <= max_payload && result.steps.len() <= MAX_STEPS_PER_EVENT {
        return Ok(vec![Event::CsSubeventResult(result)]);
    }

    // Payload bytes left for steps after the header and step count.
    let head_room = max_payload.saturating_sub(CsSubeventResult::HEADER_SIZE + 1);
    let cont_room = max_payload.saturating_sub(CsSubeventResultContinue::HEADER_SIZE + 1);

    let procedure_done = result.procedure_done_status;
    let subevent_done = result.subevent_done_status;

    let mut rest = result.steps.split_off_after(head_room);
    result.procedure_done_status = DoneStatus::Partial;
    result.subevent_done_status = DoneStatus::Partial;
    check_fits(result.wire_size(), max_payload)?;

    let mut pieces = vec![Event::CsSubeventResult(result.clone())];
    while !rest.is_empty() {
        let tail = rest.split_off_after(cont_room);
        let last = tail.is_empty();
        let cont = CsSubeventResultContinue {
            device_id: result.device_id,
            config_id: result.config_id,
            procedure_done_status: if last { procedure_done } else { DoneStatus::Partial },
            subevent_done_status: if last { subevent_done } else { DoneStatus::Partial },
            abort_reason: result.abort_reason,
            num_antenna_paths: result.num_antenna_paths,
            steps: rest,
        };
        check_fits(cont.wire_size(), max_payload)?;
        pieces.push(Event::CsSubeventResultContinue(cont));
        rest = tail;
    }

    tracing::debug!(
        device_id = result.device_id,
        config_id = result.config_id,
        pieces = pieces.len(),
        "subevent result fragmented"
    );
    Ok(pieces)
}

fn check_fits(needed: usize, max_payload: usize) -> Result<()> {
    if needed > max_payload {
        return Err(DispatchError::FragmentTooLarge {
            needed,
            max_payload,
        });
    }
    Ok(())
}
