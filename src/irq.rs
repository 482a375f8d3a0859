//! Interrupt-side event production.
//!
//! Each button line gets one handler armed on both edges, so the same handler
//! fires on press and on release. The handler reads the line's current level,
//! maps it to an event code, and publishes to the mailbox. Fire-and-forget:
//! nothing propagates back to the bank, and an overwritten event is simply
//! lost.

use std::sync::Arc;

use tracing::trace;

use crate::hal::{EdgeHandler, InputLine, PinLevel};
use crate::mailbox::EventMailbox;

/// Event code for a line at logic low (pressed, with active-low wiring).
pub const EVENT_PRESSED: u8 = 0x80;

/// Event code for a line at logic high (released).
pub const EVENT_RELEASED: u8 = 0x81;

/// Map a pin level to its event code.
pub fn event_code(level: PinLevel) -> u8 {
    match level {
        PinLevel::Low => EVENT_PRESSED,
        PinLevel::High => EVENT_RELEASED,
    }
}

/// Build the edge handler for one button line.
///
/// The closure captures a clone of the line handle and the shared mailbox;
/// the line name only feeds the trace event. Must stay bounded and
/// non-suspending: `publish` is the only synchronization it touches.
pub fn edge_handler(
    name: &'static str,
    line: Arc<dyn InputLine>,
    mailbox: Arc<EventMailbox>,
) -> EdgeHandler {
    Arc::new(move || {
        let level = line.level();
        let code = event_code(level);
        trace!(line = name, ?level, code, "edge fired");
        mailbox.publish(code);
    })
}
