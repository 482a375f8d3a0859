//! # GPIO Button Input Device Core
//!
//! Exposes a small set of physical button lines as a single readable event
//! stream. Edge-triggered interrupts capture presses and releases; clients
//! consume them through a blocking or non-blocking read contract.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  edge   ┌──────────────┐  publish  ┌──────────────┐
//! │  IrqBank     ├────────►│ edge handler ├──────────►│ EventMailbox │
//! │ (collaborator)│        │ (irq context)│           │ (single slot)│
//! └──────────────┘         └──────────────┘           └──────┬───────┘
//!                                                            │ consume
//! ┌──────────────┐  open   ┌──────────────┐    read          ▼
//! │  NodeBus     ├────────►│ ButtonDevice ├────────►  Session (≤ capacity)
//! │ (collaborator)│        │ + admission  │
//! └──────────────┘         └──────────────┘
//!         ▲ bring-up / teardown / rollback
//! ┌───────┴──────┐
//! │  ButtonCore  │  claims lines (GpioBank), attaches interrupts,
//! │  (lifecycle) │  publishes the node, unwinds in reverse on failure
//! └──────────────┘
//! ```
//!
//! ## Delivery contract
//!
//! Exactly one event is kept in flight: a later interrupt overwrites an
//! unconsumed event, and no record is kept of which line fired. Clients that
//! need every event or per-line attribution need a different device.
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use gpio_button::{
//!     ButtonCore, DeviceConfig, OpenFlags, PinLevel, SimBoard, BUTTON_LINES,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let board = SimBoard::new();
//! let core = ButtonCore::bring_up(
//!     DeviceConfig::default(),
//!     BUTTON_LINES.to_vec(),
//!     Arc::new(board.clone()),
//!     Arc::new(board.clone()),
//!     Arc::new(board.clone()),
//! )?;
//!
//! let session = core.device().open(OpenFlags::empty())?;
//! board.transition(0, 0, PinLevel::Low); // press KEY_UP
//! assert_eq!(session.read(1)?, 0x80);
//!
//! drop(session);
//! core.tear_down();
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod admission;
pub mod config;
pub mod device;
pub mod error;
pub mod hal;
pub mod irq;
pub mod lifecycle;
pub mod mailbox;
pub mod registry;
pub mod sim;

pub use admission::{AdmissionControl, AdmissionPermit};
pub use config::{DEFAULT_DEVICE_NAME, DEFAULT_OPEN_CAPACITY, DeviceConfig};
pub use device::{ButtonDevice, OpenFlags, Session};
pub use error::{ButtonError, ButtonResult};
pub use hal::{
    DeviceId, EdgeHandler, EdgeTrigger, GpioBank, HalError, InputLine, IrqBank, IrqId, LineId,
    NodeBus, NodeHandle, PinLevel,
};
pub use irq::{EVENT_PRESSED, EVENT_RELEASED, event_code};
pub use lifecycle::ButtonCore;
pub use mailbox::{EventMailbox, WakeHandle};
pub use registry::{BUTTON_LINES, ButtonLine};
pub use sim::SimBoard;

/// Initialize tracing with environment-driven filtering.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
