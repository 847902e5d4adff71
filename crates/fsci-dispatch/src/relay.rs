//! Out-parameter relay.
//!
//! A relayed command returns its result in a later completion event. Before
//! the command is sent, the caller's [`OutSlot`] is bound in the channel's
//! [`Relay`]. The completion payload is decoded straight into that slot,
//! the binding is cleared and the slot becomes ready exactly once. A failed
//! command status clears the binding too, so a later completion has
//! nothing to write into. Only the first status after registration
//! belongs to the relayed command; later statuses answer other commands
//! sent on the channel and leave the binding alone.
//!
//! A relay holds at most one binding. Registering while one is pending
//! fails with [`DispatchError::RelayBusy`].

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use fsci_frame::{DecodeLimits, FsciStatus, WireReader, WireResult};
use fsci_records::{BleStatus, EventOpcode};

use crate::error::{DispatchError, Result};

/// Decodes a completion payload into the relayed value.
pub type CompletionDecoder<T> = fn(&mut WireReader<'_>) -> WireResult<T>;

enum SlotState<T> {
    Pending,
    Ready(Result<T>),
    Taken,
}

struct Shared<T> {
    state: Mutex<SlotState<T>>,
    ready: Condvar,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, SlotState<T>> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store the outcome and wake waiters. Only the first call has effect.
    fn resolve(&self, outcome: Result<T>) {
        let mut state = self.lock();
        if matches!(*state, SlotState::Pending) {
            *state = SlotState::Ready(outcome);
            self.ready.notify_all();
        }
    }
}

/// Caller-owned destination of a relayed result.
pub struct OutSlot<T> {
    shared: Arc<Shared<T>>,
}

impl<T> OutSlot<T> {
    fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SlotState::Pending),
                ready: Condvar::new(),
            }),
        }
    }

    /// Whether the result (or failure) has arrived and not been taken.
    pub fn is_ready(&self) -> bool {
        matches!(*self.shared.lock(), SlotState::Ready(_))
    }

    /// Take the result if it has arrived.
    pub fn try_take(&self) -> Option<Result<T>> {
        let mut state = self.shared.lock();
        match std::mem::replace(&mut *state, SlotState::Taken) {
            SlotState::Ready(outcome) => Some(outcome),
            other => {
                *state = other;
                None
            }
        }
    }

    /// Block until the result arrives or `timeout` elapses.
    pub fn wait(self, timeout: Duration) -> Result<T> {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.lock();
        loop {
            match std::mem::replace(&mut *state, SlotState::Taken) {
                SlotState::Ready(outcome) => return outcome,
                SlotState::Taken => return Err(DispatchError::Cancelled),
                SlotState::Pending => *state = SlotState::Pending,
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(DispatchError::Timeout(timeout));
            }
            state = self
                .shared
                .ready
                .wait_timeout(state, deadline - now)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|poisoned| poisoned.into_inner().0);
        }
    }
}

impl<T> std::fmt::Debug for OutSlot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutSlot")
            .field("ready", &self.is_ready())
            .finish()
    }
}

/// A pending binding with its value type erased.
trait Binding: Send {
    fn completion(&self) -> EventOpcode;
    fn fulfil(self: Box<Self>, r: &mut WireReader<'_>) -> WireResult<()>;
    fn fail(self: Box<Self>, error: DispatchError);
}

struct TypedBinding<T> {
    completion: EventOpcode,
    decode: CompletionDecoder<T>,
    shared: Arc<Shared<T>>,
}

impl<T: Send + 'static> Binding for TypedBinding<T> {
    fn completion(&self) -> EventOpcode {
        self.completion
    }

    fn fulfil(self: Box<Self>, r: &mut WireReader<'_>) -> WireResult<()> {
        let decoded = (self.decode)(r).and_then(|value| r.finish().map(|()| value));
        match decoded {
            Ok(value) => {
                self.shared.resolve(Ok(value));
                Ok(())
            }
            Err(err) => {
                self.shared.resolve(Err(err.clone().into()));
                Err(err)
            }
        }
    }

    fn fail(self: Box<Self>, error: DispatchError) {
        self.shared.resolve(Err(error));
    }
}

/// What happened to a completion handed to the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Decoded into the pending slot.
    Delivered,
    /// Nothing was pending for this completion; it was dropped.
    Dropped,
    /// The payload did not decode; the slot received the error.
    Failed(fsci_frame::WireError),
}

struct Pending {
    binding: Box<dyn Binding>,
    /// The relayed command's own status has arrived.
    acknowledged: bool,
}

/// Single-slot relay for one channel.
pub struct Relay {
    channel: u8,
    limits: DecodeLimits,
    pending: Mutex<Option<Pending>>,
}

impl Relay {
    pub fn new(channel: u8) -> Self {
        Self::with_limits(channel, DecodeLimits::default())
    }

    pub fn with_limits(channel: u8, limits: DecodeLimits) -> Self {
        Self {
            channel,
            limits,
            pending: Mutex::new(None),
        }
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    fn lock(&self) -> MutexGuard<'_, Option<Pending>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The completion the relay is waiting for, if any.
    pub fn pending(&self) -> Option<EventOpcode> {
        self.lock().as_ref().map(|pending| pending.binding.completion())
    }

    /// Bind a new slot to `completion`.
    pub fn register<T: Send + 'static>(
        &self,
        completion: EventOpcode,
        decode: CompletionDecoder<T>,
    ) -> Result<OutSlot<T>> {
        let mut pending = self.lock();
        if let Some(existing) = pending.as_ref() {
            return Err(DispatchError::RelayBusy {
                channel: self.channel,
                pending: existing.binding.completion(),
            });
        }
        let slot = OutSlot::new();
        *pending = Some(Pending {
            binding: Box::new(TypedBinding {
                completion,
                decode,
                shared: Arc::clone(&slot.shared),
            }),
            acknowledged: false,
        });
        tracing::debug!(channel = self.channel, ?completion, "relay registered");
        Ok(slot)
    }

    /// Feed a command status. The first status after registration is the
    /// relayed command's: a failure clears the binding and signals the
    /// slot, success leaves it waiting for the completion. Later statuses
    /// are ignored.
    pub fn on_status(&self, status: BleStatus) {
        if status.is_success() {
            if let Some(pending) = self.lock().as_mut() {
                pending.acknowledged = true;
            }
            return;
        }
        self.fail_unacknowledged(DispatchError::CommandFailed(status));
    }

    /// Feed a framework error report. Like a failed status, it only
    /// concerns a binding whose command has not been acknowledged yet.
    pub fn on_rejected(&self, status: FsciStatus) {
        self.fail_unacknowledged(DispatchError::Rejected(status));
    }

    fn fail_unacknowledged(&self, error: DispatchError) {
        let binding = {
            let mut pending = self.lock();
            match pending.as_ref() {
                Some(current) if current.acknowledged => {
                    tracing::debug!(
                        channel = self.channel,
                        completion = ?current.binding.completion(),
                        %error,
                        "failure of another command ignored"
                    );
                    None
                }
                _ => pending.take(),
            }
        };
        if let Some(pending) = binding {
            self.clear(pending, error);
        }
    }

    /// Clear the binding whatever its state, handing `error` to its slot.
    pub fn fail_pending(&self, error: DispatchError) {
        let binding = self.lock().take();
        if let Some(pending) = binding {
            self.clear(pending, error);
        }
    }

    fn clear(&self, pending: Pending, error: DispatchError) {
        tracing::debug!(
            channel = self.channel,
            completion = ?pending.binding.completion(),
            %error,
            "relay cleared"
        );
        pending.binding.fail(error);
    }

    /// Clear the binding without a command status, e.g. when sending failed.
    pub fn cancel(&self) {
        self.fail_pending(DispatchError::Cancelled);
    }

    /// Feed a completion event payload.
    pub fn complete(&self, opcode: EventOpcode, payload: &[u8]) -> Delivery {
        let binding = {
            let mut pending = self.lock();
            let expected = pending
                .as_ref()
                .is_some_and(|current| current.binding.completion() == opcode);
            if expected {
                pending.take().map(|current| current.binding)
            } else {
                None
            }
        };
        let Some(binding) = binding else {
            tracing::debug!(
                channel = self.channel,
                ?opcode,
                "completion with nothing pending dropped"
            );
            return Delivery::Dropped;
        };

        let mut r = WireReader::with_limits(payload, self.limits);
        match binding.fulfil(&mut r) {
            Ok(()) => Delivery::Delivered,
            Err(err) => {
                tracing::warn!(
                    channel = self.channel,
                    ?opcode,
                    error = %err,
                    "completion failed to decode"
                );
                Delivery::Failed(err)
            }
        }
    }
}

impl std::fmt::Debug for Relay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("channel", &self.channel)
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn decode_u8(r: &mut WireReader<'_>) -> WireResult<u8> {
        r.u8("count")
    }

    #[test]
    fn completion_fills_slot_once() {
        let relay = Relay::new(0);
        let slot = relay
            .register(EventOpcode::GetBondedDevicesCountResult, decode_u8)
            .unwrap();
        assert!(!slot.is_ready());

        assert_eq!(
            relay.complete(EventOpcode::GetBondedDevicesCountResult, &[3]),
            Delivery::Delivered
        );
        assert!(slot.is_ready());
        assert_eq!(relay.pending(), None);
        assert_eq!(slot.try_take().unwrap().unwrap(), 3);
        assert!(slot.try_take().is_none());

        // A repeat completion has nothing left to write into.
        assert_eq!(
            relay.complete(EventOpcode::GetBondedDevicesCountResult, &[9]),
            Delivery::Dropped
        );
    }

    #[test]
    fn second_registration_fails_fast() {
        let relay = Relay::new(2);
        let _first = relay
            .register(EventOpcode::GetBondedDevicesCountResult, decode_u8)
            .unwrap();
        let err = relay
            .register(EventOpcode::CheckIfBondedResult, decode_u8)
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::RelayBusy {
                channel: 2,
                pending: EventOpcode::GetBondedDevicesCountResult
            }
        ));
    }

    #[test]
    fn failed_status_clears_binding() {
        let relay = Relay::new(0);
        let slot = relay
            .register(EventOpcode::GetBondedDevicesCountResult, decode_u8)
            .unwrap();
        relay.on_status(BleStatus::INVALID_STATE);
        assert!(relay.pending().is_none());
        assert!(matches!(
            slot.try_take(),
            Some(Err(DispatchError::CommandFailed(BleStatus::INVALID_STATE)))
        ));
        assert_eq!(
            relay.complete(EventOpcode::GetBondedDevicesCountResult, &[1]),
            Delivery::Dropped
        );
    }

    #[test]
    fn success_status_keeps_waiting() {
        let relay = Relay::new(0);
        let slot = relay
            .register(EventOpcode::GetBondedDevicesCountResult, decode_u8)
            .unwrap();
        relay.on_status(BleStatus::SUCCESS);
        assert!(!slot.is_ready());
        assert!(relay.pending().is_some());
    }

    #[test]
    fn failures_after_acknowledgement_are_ignored() {
        let relay = Relay::new(0);
        let slot = relay
            .register(EventOpcode::GetBondedDevicesCountResult, decode_u8)
            .unwrap();
        relay.on_status(BleStatus::SUCCESS);

        // Statuses and reports for commands sent after the relayed one.
        relay.on_status(BleStatus::INVALID_STATE);
        relay.on_rejected(FsciStatus::DecodeFailed);
        assert!(!slot.is_ready());

        assert_eq!(
            relay.complete(EventOpcode::GetBondedDevicesCountResult, &[4]),
            Delivery::Delivered
        );
        assert_eq!(slot.try_take().unwrap().unwrap(), 4);
    }

    #[test]
    fn rejection_before_acknowledgement_fails_slot() {
        let relay = Relay::new(0);
        let slot = relay
            .register(EventOpcode::GetBondedDevicesCountResult, decode_u8)
            .unwrap();
        relay.on_rejected(FsciStatus::UnknownOpcode);
        assert!(relay.pending().is_none());
        assert!(matches!(
            slot.try_take(),
            Some(Err(DispatchError::Rejected(FsciStatus::UnknownOpcode)))
        ));
    }

    #[test]
    fn cancel_clears_acknowledged_binding() {
        let relay = Relay::new(0);
        let slot = relay
            .register(EventOpcode::GetBondedDevicesCountResult, decode_u8)
            .unwrap();
        relay.on_status(BleStatus::SUCCESS);
        relay.cancel();
        assert!(relay.pending().is_none());
        assert!(matches!(slot.try_take(), Some(Err(DispatchError::Cancelled))));
    }

    #[test]
    fn mismatched_completion_is_dropped() {
        let relay = Relay::new(0);
        let slot = relay
            .register(EventOpcode::GetBondedDevicesCountResult, decode_u8)
            .unwrap();
        assert_eq!(
            relay.complete(EventOpcode::CheckIfBondedResult, &[1, 0]),
            Delivery::Dropped
        );
        assert!(!slot.is_ready());
    }

    #[test]
    fn undecodable_completion_reaches_slot() {
        let relay = Relay::new(0);
        let slot = relay
            .register(EventOpcode::GetBondedDevicesCountResult, decode_u8)
            .unwrap();
        assert!(matches!(
            relay.complete(EventOpcode::GetBondedDevicesCountResult, &[]),
            Delivery::Failed(_)
        ));
        assert!(matches!(
            slot.try_take(),
            Some(Err(DispatchError::Wire(_)))
        ));
    }

    #[test]
    fn wait_wakes_on_completion() {
        let relay = Arc::new(Relay::new(0));
        let slot = relay
            .register(EventOpcode::GetBondedDevicesCountResult, decode_u8)
            .unwrap();

        let feeder = {
            let relay = Arc::clone(&relay);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                relay.complete(EventOpcode::GetBondedDevicesCountResult, &[7])
            })
        };

        assert_eq!(slot.wait(Duration::from_secs(5)).unwrap(), 7);
        assert_eq!(feeder.join().unwrap(), Delivery::Delivered);
    }

    #[test]
    fn wait_times_out() {
        let relay = Relay::new(0);
        let slot = relay
            .register(EventOpcode::GetBondedDevicesCountResult, decode_u8)
            .unwrap();
        assert!(matches!(
            slot.wait(Duration::from_millis(10)),
            Err(DispatchError::Timeout(_))
        ));
        // The binding stays until a status or completion clears it.
        assert!(relay.pending().is_some());
    }
}
