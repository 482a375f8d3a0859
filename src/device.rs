//! Open/read/close entry points of the published device node.
//!
//! Opens are gated by the admission controller; each successful open yields a
//! [`Session`] that captures the open-time flags, the way a file description
//! captures `O_NONBLOCK`. Reads drain the shared mailbox. Closing is dropping
//! the session, which returns the admission slot on every exit path.

use std::sync::Arc;

use bitflags::bitflags;
use tracing::debug;

use crate::admission::{AdmissionControl, AdmissionPermit};
use crate::error::{ButtonError, ButtonResult};
use crate::mailbox::EventMailbox;

bitflags! {
    /// Flags declared by a client at open time.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenFlags: u32 {
        /// Fail immediately instead of suspending, on both open and read.
        const NONBLOCK = 1;
    }
}

/// The readable button device behind the published node.
#[derive(Debug)]
pub struct ButtonDevice {
    admission: Arc<AdmissionControl>,
    mailbox: Arc<EventMailbox>,
}

impl ButtonDevice {
    pub(crate) fn new(capacity: u32, mailbox: Arc<EventMailbox>) -> Self {
        Self {
            admission: Arc::new(AdmissionControl::new(capacity)),
            mailbox,
        }
    }

    /// Open a session.
    ///
    /// With [`OpenFlags::NONBLOCK`] a saturated device fails with `Busy`;
    /// otherwise the caller suspends until a slot frees.
    pub fn open(&self, flags: OpenFlags) -> ButtonResult<Session> {
        let permit = if flags.contains(OpenFlags::NONBLOCK) {
            AdmissionControl::try_acquire(&self.admission)?
        } else {
            AdmissionControl::acquire(&self.admission)
        };
        debug!(?flags, "session opened");
        Ok(Session {
            mailbox: Arc::clone(&self.mailbox),
            flags,
            _permit: permit,
        })
    }

    /// Configured open capacity.
    pub fn capacity(&self) -> u32 {
        self.admission.capacity()
    }
}

/// One open session. Dropping it closes the session and frees its slot.
#[derive(Debug)]
pub struct Session {
    mailbox: Arc<EventMailbox>,
    flags: OpenFlags,
    _permit: AdmissionPermit,
}

impl Session {
    /// Read the next event code.
    ///
    /// `requested` mirrors the byte count a client declares; it is ignored,
    /// and exactly one code byte is transferred per successful call
    /// (reproduced limitation of the single-slot design).
    ///
    /// Non-blocking sessions map an empty mailbox to `WouldBlock`; blocking
    /// sessions suspend until an interrupt publishes an event, or fail with
    /// `Interrupted` if the wait is cancelled.
    pub fn read(&self, requested: usize) -> ButtonResult<u8> {
        let _ = requested;
        if self.flags.contains(OpenFlags::NONBLOCK) {
            self.mailbox.try_consume().ok_or(ButtonError::WouldBlock)
        } else {
            self.mailbox.wait_and_consume()
        }
    }

    /// Flags captured at open time.
    pub fn flags(&self) -> OpenFlags {
        self.flags
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!(flags = ?self.flags, "session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(capacity: u32) -> (ButtonDevice, Arc<EventMailbox>) {
        let mailbox = Arc::new(EventMailbox::new());
        (ButtonDevice::new(capacity, Arc::clone(&mailbox)), mailbox)
    }

    #[test]
    fn nonblocking_read_on_empty_mailbox_would_block() {
        let (device, _mailbox) = device(2);
        let session = device.open(OpenFlags::NONBLOCK).unwrap();
        assert!(matches!(session.read(16), Err(ButtonError::WouldBlock)));
    }

    #[test]
    fn declared_count_is_ignored() {
        let (device, mailbox) = device(2);
        let session = device.open(OpenFlags::NONBLOCK).unwrap();
        mailbox.publish(0x80);
        // One code byte regardless of how much the caller asked for.
        assert_eq!(session.read(4096).unwrap(), 0x80);
        assert!(matches!(session.read(4096), Err(ButtonError::WouldBlock)));
    }

    #[test]
    fn saturated_nonblocking_open_is_busy() {
        let (device, _mailbox) = device(2);
        let _first = device.open(OpenFlags::empty()).unwrap();
        let _second = device.open(OpenFlags::NONBLOCK).unwrap();
        assert!(matches!(
            device.open(OpenFlags::NONBLOCK),
            Err(ButtonError::Busy { capacity: 2 })
        ));
    }

    #[test]
    fn closing_a_session_frees_its_slot() {
        let (device, _mailbox) = device(1);
        let session = device.open(OpenFlags::NONBLOCK).unwrap();
        assert!(device.open(OpenFlags::NONBLOCK).is_err());
        drop(session);
        assert!(device.open(OpenFlags::NONBLOCK).is_ok());
    }

    #[test]
    fn blocking_session_consumes_pending_event_immediately() {
        let (device, mailbox) = device(2);
        let session = device.open(OpenFlags::empty()).unwrap();
        mailbox.publish(0x81);
        assert_eq!(session.read(1).unwrap(), 0x81);
    }
}
