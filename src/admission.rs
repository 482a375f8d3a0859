//! Counting admission control for concurrent device opens.
//!
//! A fixed capacity bounds the number of sessions holding the device open at
//! once. Acquisition is blocking or immediate; release is tied to the permit's
//! drop so it happens exactly once on every exit path, abnormal ones included.
//! No fairness guarantee: any blocked acquirer may be woken in any order.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tracing::trace;

use crate::error::{ButtonError, ButtonResult};

/// Counting limiter gating concurrent opens. State is only ever touched from
/// normal context, so a suspension-capable primitive is fine here.
///
/// Acquisition goes through the associated functions ([`AdmissionControl::acquire`],
/// [`AdmissionControl::try_acquire`]) because the returned permit keeps the
/// controller alive for its own release.
#[derive(Debug)]
pub struct AdmissionControl {
    available: Mutex<u32>,
    freed: Condvar,
    capacity: u32,
}

impl AdmissionControl {
    /// Create a limiter with `capacity` slots.
    pub fn new(capacity: u32) -> Self {
        Self {
            available: Mutex::new(capacity),
            freed: Condvar::new(),
            capacity,
        }
    }

    /// Configured capacity.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Slots currently free.
    pub fn available(&self) -> u32 {
        *self.available.lock()
    }

    /// Take a slot, suspending until one is free. Never fails.
    pub fn acquire(this: &Arc<Self>) -> AdmissionPermit {
        let mut available = this.available.lock();
        while *available == 0 {
            this.freed.wait(&mut available);
        }
        *available -= 1;
        trace!(available = *available, "admission slot acquired (blocking)");
        AdmissionPermit {
            control: Arc::clone(this),
        }
    }

    /// Take a slot immediately, or fail with `Busy` if none is free.
    pub fn try_acquire(this: &Arc<Self>) -> ButtonResult<AdmissionPermit> {
        let mut available = this.available.lock();
        if *available == 0 {
            return Err(ButtonError::Busy {
                capacity: this.capacity,
            });
        }
        *available -= 1;
        trace!(available = *available, "admission slot acquired");
        Ok(AdmissionPermit {
            control: Arc::clone(this),
        })
    }

    fn release(&self) {
        let mut available = self.available.lock();
        *available += 1;
        trace!(available = *available, "admission slot released");
        drop(available);
        self.freed.notify_one();
    }
}

/// One admitted slot. Dropping the permit returns the slot.
#[derive(Debug)]
pub struct AdmissionPermit {
    control: Arc<AdmissionControl>,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.control.release();
    }
}
