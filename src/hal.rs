//! Hardware collaborator seams.
//!
//! The core does not touch hardware directly. It talks to three narrow
//! trait-object interfaces, each implemented by a board backend:
//!
//! - [`GpioBank`] — claims physical lines and hands back level-readable
//!   handles
//! - [`IrqBank`] — attaches and detaches edge-triggered handlers
//! - [`NodeBus`] — registers the device identity and publishes the node
//!   clients open
//!
//! The [`sim`](crate::sim) module provides the in-crate backend used by tests
//! and the demo binary.

use std::sync::Arc;

use thiserror::Error;

/// Identifier of a physical hardware line within a bank.
pub type LineId = u32;

/// Identifier of an interrupt source within a bank.
pub type IrqId = u32;

/// Logic level of an input line. The pin-read contract is `{0, 1}`; encoding
/// it as an enum leaves no third value to handle defensively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinLevel {
    /// Logic 0.
    Low,
    /// Logic 1.
    High,
}

/// Edge condition that arms an interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeTrigger {
    /// Fire on a low-to-high transition.
    Rising,
    /// Fire on a high-to-low transition.
    Falling,
    /// Fire on both transitions.
    Both,
}

/// Callback invoked in the bank's interrupt context when an armed edge fires.
///
/// Fire-and-forget: there is no error channel back to the bank. The handler
/// must complete in bounded time and must not take any lock that a blocking
/// caller can hold across a sleep.
pub type EdgeHandler = Arc<dyn Fn() + Send + Sync>;

/// Errors reported by hardware collaborators.
#[derive(Error, Debug, Clone)]
pub enum HalError {
    /// Hardware line already claimed or otherwise unavailable.
    #[error("line {line} unavailable: {reason}")]
    LineUnavailable {
        /// Requested line.
        line: LineId,
        /// Backend-provided reason.
        reason: String,
    },

    /// Interrupt source already attached or otherwise unavailable.
    #[error("irq {irq} unavailable: {reason}")]
    IrqUnavailable {
        /// Requested interrupt source.
        irq: IrqId,
        /// Backend-provided reason.
        reason: String,
    },

    /// Device identity or node registration failed.
    #[error("node '{name}' unavailable: {reason}")]
    NodeUnavailable {
        /// Device name being registered.
        name: String,
        /// Backend-provided reason.
        reason: String,
    },
}

/// A claimed input line whose current logic level can be read.
///
/// Reading is infallible per the pin-read contract; a backend that can fail
/// mid-read must resolve the failure internally (the produced event is simply
/// dropped by the caller's fire-and-forget contract, never propagated).
pub trait InputLine: Send + Sync {
    /// Current logic level of the line.
    fn level(&self) -> PinLevel;
}

/// Claims physical lines on behalf of a named owner.
pub trait GpioBank: Send + Sync {
    /// Claim `line` exclusively for `owner`.
    ///
    /// The claim is released when every clone of the returned handle has been
    /// dropped. Callers that hand a clone to an edge handler must detach that
    /// handler before the release is expected to take effect.
    fn claim(&self, line: LineId, owner: &str) -> Result<Arc<dyn InputLine>, HalError>;
}

/// Registers edge-triggered interrupt handlers.
pub trait IrqBank: Send + Sync {
    /// Arm `irq` with `trigger` and invoke `handler` on each firing edge.
    fn attach(&self, irq: IrqId, trigger: EdgeTrigger, handler: EdgeHandler)
    -> Result<(), HalError>;

    /// Disarm `irq` and drop the stored handler before returning.
    ///
    /// Dropping the handler also drops any line handle clones it captured,
    /// which is what makes detach-before-line-release ordering effective.
    fn detach(&self, irq: IrqId) -> Result<(), HalError>;
}

/// Opaque token for a registered device identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceId(
    /// Raw token minted by the bus.
    pub u64,
);

/// Opaque token for a published device node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHandle(
    /// Raw token minted by the bus.
    pub u64,
);

/// Publishes the device as an addressable node.
pub trait NodeBus: Send + Sync {
    /// Allocate an addressable identity for `name`.
    fn register_device(&self, name: &str) -> Result<DeviceId, HalError>;

    /// Release a previously registered identity.
    fn unregister_device(&self, id: DeviceId) -> Result<(), HalError>;

    /// Publish the node for `id`; opens become possible once this returns.
    fn publish_node(&self, id: DeviceId) -> Result<NodeHandle, HalError>;

    /// Remove a published node.
    fn remove_node(&self, handle: NodeHandle) -> Result<(), HalError>;
}
