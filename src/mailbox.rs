//! Single-slot event mailbox between interrupt context and blocked readers.
//!
//! Exactly one event is kept in flight; a later publish overwrites an
//! unconsumed one. Back-to-back firings before a read therefore drop all
//! but the last event. Callers that need every event need a queue, which
//! this device does not provide.
//!
//! Lock discipline: the slot mutex is only ever held for a handful of stores.
//! Waiters release it inside `Condvar::wait`, so `publish` never blocks
//! behind a sleeping consumer and is safe to call from the producer context.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::error::{ButtonError, ButtonResult};

#[derive(Debug, Default)]
struct Slot {
    /// Meaningful only while `pending` is true.
    code: u8,
    pending: bool,
    /// Sticky: once set, every blocking wait returns `Interrupted`.
    interrupted: bool,
}

/// Single-slot mailbox: non-suspending publish, suspending-or-immediate
/// consume.
#[derive(Debug, Default)]
pub struct EventMailbox {
    slot: Mutex<Slot>,
    ready: Condvar,
}

impl EventMailbox {
    /// Create an empty mailbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `code` and mark it pending, overwriting any unconsumed event,
    /// then wake every blocked waiter (broadcast, not single-wake).
    ///
    /// Callable from interrupt context: no allocation, no suspension.
    pub fn publish(&self, code: u8) {
        let mut slot = self.slot.lock();
        slot.code = code;
        slot.pending = true;
        drop(slot);
        self.ready.notify_all();
    }

    /// Consume the pending event if there is one.
    pub fn try_consume(&self) -> Option<u8> {
        let mut slot = self.slot.lock();
        if slot.pending {
            slot.pending = false;
            Some(slot.code)
        } else {
            None
        }
    }

    /// Block until an event is pending, then consume it.
    ///
    /// Returns `Interrupted` as soon as the interruption broadcast has been
    /// delivered, whether before or during the wait.
    pub fn wait_and_consume(&self) -> ButtonResult<u8> {
        let mut slot = self.slot.lock();
        loop {
            if slot.interrupted {
                return Err(ButtonError::Interrupted);
            }
            if slot.pending {
                slot.pending = false;
                return Ok(slot.code);
            }
            self.ready.wait(&mut slot);
        }
    }

    /// Cancel every current and future blocking wait.
    ///
    /// Used by teardown and by external termination signals. The pending
    /// event, if any, stays consumable through [`try_consume`][Self::try_consume].
    pub fn interrupt_waiters(&self) {
        let mut slot = self.slot.lock();
        slot.interrupted = true;
        drop(slot);
        self.ready.notify_all();
    }
}

/// Clonable cancellation handle for signal handlers.
///
/// Wraps the mailbox so a `ctrlc`-style handler can wake blocked readers
/// without being handed the publish side.
#[derive(Clone)]
pub struct WakeHandle {
    mailbox: Arc<EventMailbox>,
}

impl WakeHandle {
    pub(crate) fn new(mailbox: Arc<EventMailbox>) -> Self {
        Self { mailbox }
    }

    /// Deliver the interruption broadcast.
    pub fn interrupt(&self) {
        self.mailbox.interrupt_waiters();
    }
}
