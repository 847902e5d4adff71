//! Joins channel-sounding subevent results split over several events.

use std::collections::HashMap;

use fsci_frame::{WireResult, DEFAULT_MAX_RECORD_ALLOCATION};
use fsci_records::cs::{CsSubeventResult, CsSubeventResultContinue};
use fsci_records::DeviceId;

/// Open subevents keyed by `(device_id, config_id)`.
#[derive(Debug)]
pub struct SubeventAssembler {
    open: HashMap<(DeviceId, u8), CsSubeventResult>,
    /// Most step bytes one subevent may collect.
    max_step_bytes: usize,
}

impl Default for SubeventAssembler {
    fn default() -> Self {
        Self::with_budget(DEFAULT_MAX_RECORD_ALLOCATION)
    }
}

impl SubeventAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// An assembler that gives up on any subevent whose steps outgrow
    /// `max_step_bytes`.
    pub fn with_budget(max_step_bytes: usize) -> Self {
        Self {
            open: HashMap::new(),
            max_step_bytes,
        }
    }

    /// Number of subevents waiting for continue events.
    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Start a subevent. Returns it straight back when it is already
    /// complete.
    pub fn push_result(&mut self, result: CsSubeventResult) -> Option<CsSubeventResult> {
        let key = (result.device_id, result.config_id);
        if let Some(stale) = self.open.remove(&key) {
            tracing::warn!(
                device_id = key.0,
                config_id = key.1,
                steps = stale.steps.len(),
                "unfinished subevent replaced by a new one"
            );
        }
        if result.subevent_done_status.is_final() {
            return Some(result);
        }
        self.open.insert(key, result);
        None
    }

    /// Add the steps of a continue event. Returns the whole subevent once
    /// its done status is final.
    ///
    /// A subevent that would outgrow the step budget is discarded and
    /// reported as [`WireError::OutOfMemory`](fsci_frame::WireError::OutOfMemory).
    pub fn push_continue(
        &mut self,
        mut cont: CsSubeventResultContinue,
    ) -> WireResult<Option<CsSubeventResult>> {
        let key = (cont.device_id, cont.config_id);
        let Some(open) = self.open.get_mut(&key) else {
            tracing::warn!(
                device_id = key.0,
                config_id = key.1,
                "continue event without an open subevent dropped"
            );
            return Ok(None);
        };

        if let Err(err) = open.steps.try_append(&mut cont.steps, self.max_step_bytes) {
            self.open.remove(&key);
            tracing::warn!(
                device_id = key.0,
                config_id = key.1,
                budget = self.max_step_bytes,
                error = %err,
                "oversized subevent discarded"
            );
            return Err(err);
        }
        open.procedure_done_status = cont.procedure_done_status;
        open.subevent_done_status = cont.subevent_done_status;
        open.abort_reason = cont.abort_reason;
        open.num_antenna_paths = cont.num_antenna_paths;

        if cont.subevent_done_status.is_final() {
            Ok(self.open.remove(&key))
        } else {
            Ok(None)
        }
    }

    /// Drop every open subevent of a device, e.g. on disconnection.
    pub fn discard_device(&mut self, device_id: DeviceId) {
        self.open.retain(|(device, _), _| *device != device_id);
    }
}
