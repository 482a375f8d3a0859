//! Static description of the physical button lines.
//!
//! The table order is load-bearing: bring-up acquires lines in table order
//! and teardown releases them in reverse.

use crate::hal::{IrqId, LineId};

/// One physical button: its name, hardware line, and interrupt source.
///
/// Immutable after construction; one instance per physical button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonLine {
    /// Owner name passed to the line claim and used in logs.
    pub name: &'static str,
    /// Hardware line identifier within the GPIO bank.
    pub gpio: LineId,
    /// Interrupt source identifier within the IRQ bank.
    pub irq: IrqId,
}

/// Default button table: two keys on adjacent lines of the same bank.
pub const BUTTON_LINES: [ButtonLine; 2] = [
    ButtonLine {
        name: "KEY_UP",
        gpio: 0,
        irq: 0,
    },
    ButtonLine {
        name: "KEY_DOWN",
        gpio: 1,
        irq: 1,
    },
];
