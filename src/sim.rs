//! Simulated board backend.
//!
//! `SimBoard` implements every hardware collaborator trait in memory: lines
//! with settable levels, edge firing that invokes the attached handler on the
//! calling thread, and a node bus that tracks registrations. Failure
//! injection and inspection hooks make bring-up rollback observable. Used by
//! the test suites and the demo binary.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use crate::hal::{
    DeviceId, EdgeHandler, EdgeTrigger, GpioBank, HalError, InputLine, IrqBank, IrqId, LineId,
    NodeBus, NodeHandle, PinLevel,
};

#[derive(Default)]
struct SimInner {
    /// Current logic level per line; unset lines idle high (pull-up wiring).
    levels: Mutex<HashMap<LineId, PinLevel>>,
    claimed: Mutex<HashSet<LineId>>,
    handlers: Mutex<HashMap<IrqId, EdgeHandler>>,
    registered: Mutex<HashMap<u64, String>>,
    published: Mutex<HashMap<u64, u64>>,
    next_token: AtomicU64,

    fail_claim: Mutex<HashSet<LineId>>,
    fail_attach: Mutex<HashSet<IrqId>>,
    fail_register: AtomicBool,
    fail_publish: AtomicBool,
}

/// In-memory board: one GPIO bank, one IRQ bank, one node bus.
#[derive(Clone, Default)]
pub struct SimBoard {
    inner: Arc<SimInner>,
}

impl SimBoard {
    /// Create a board with all lines idle high and nothing claimed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the current logic level of `line`.
    pub fn set_level(&self, line: LineId, level: PinLevel) {
        self.inner.levels.lock().insert(line, level);
    }

    /// Fire the edge handler attached to `irq` on the calling thread.
    ///
    /// Returns false if nothing is attached. Tests that need producer
    /// concurrency call this from their own spawned thread.
    pub fn fire_edge(&self, irq: IrqId) -> bool {
        let handler = self.inner.handlers.lock().get(&irq).cloned();
        match handler {
            Some(handler) => {
                handler();
                true
            }
            None => {
                debug!(irq, "edge fired with no handler attached");
                false
            }
        }
    }

    /// Drive `line` to `level` and fire `irq`, as one physical transition.
    pub fn transition(&self, line: LineId, irq: IrqId, level: PinLevel) -> bool {
        self.set_level(line, level);
        self.fire_edge(irq)
    }

    /// Make future claims of `line` fail.
    pub fn inject_claim_failure(&self, line: LineId) {
        self.inner.fail_claim.lock().insert(line);
    }

    /// Make future attaches of `irq` fail.
    pub fn inject_attach_failure(&self, irq: IrqId) {
        self.inner.fail_attach.lock().insert(irq);
    }

    /// Make future device registrations fail.
    pub fn inject_register_failure(&self) {
        self.inner.fail_register.store(true, Ordering::SeqCst);
    }

    /// Make future node publications fail.
    pub fn inject_publish_failure(&self) {
        self.inner.fail_publish.store(true, Ordering::SeqCst);
    }

    /// Lines currently claimed, in ascending order.
    pub fn claimed_lines(&self) -> Vec<LineId> {
        let mut lines: Vec<_> = self.inner.claimed.lock().iter().copied().collect();
        lines.sort_unstable();
        lines
    }

    /// Interrupt sources with a handler attached, in ascending order.
    pub fn attached_irqs(&self) -> Vec<IrqId> {
        let mut irqs: Vec<_> = self.inner.handlers.lock().keys().copied().collect();
        irqs.sort_unstable();
        irqs
    }

    /// Names of registered device identities.
    pub fn registered_devices(&self) -> Vec<String> {
        self.inner.registered.lock().values().cloned().collect()
    }

    /// Number of published nodes.
    pub fn published_nodes(&self) -> usize {
        self.inner.published.lock().len()
    }
}

struct SimLine {
    id: LineId,
    inner: Arc<SimInner>,
}

impl InputLine for SimLine {
    fn level(&self) -> PinLevel {
        self.inner
            .levels
            .lock()
            .get(&self.id)
            .copied()
            .unwrap_or(PinLevel::High)
    }
}

impl Drop for SimLine {
    fn drop(&mut self) {
        self.inner.claimed.lock().remove(&self.id);
        debug!(line = self.id, "line released");
    }
}

impl GpioBank for SimBoard {
    fn claim(&self, line: LineId, owner: &str) -> Result<Arc<dyn InputLine>, HalError> {
        if self.inner.fail_claim.lock().contains(&line) {
            return Err(HalError::LineUnavailable {
                line,
                reason: "injected claim failure".to_string(),
            });
        }
        let mut claimed = self.inner.claimed.lock();
        if !claimed.insert(line) {
            return Err(HalError::LineUnavailable {
                line,
                reason: format!("already claimed (requested by {owner})"),
            });
        }
        debug!(line, owner, "line claimed");
        Ok(Arc::new(SimLine {
            id: line,
            inner: Arc::clone(&self.inner),
        }))
    }
}

impl IrqBank for SimBoard {
    fn attach(
        &self,
        irq: IrqId,
        trigger: EdgeTrigger,
        handler: EdgeHandler,
    ) -> Result<(), HalError> {
        if self.inner.fail_attach.lock().contains(&irq) {
            return Err(HalError::IrqUnavailable {
                irq,
                reason: "injected attach failure".to_string(),
            });
        }
        let mut handlers = self.inner.handlers.lock();
        if handlers.contains_key(&irq) {
            return Err(HalError::IrqUnavailable {
                irq,
                reason: "handler already attached".to_string(),
            });
        }
        handlers.insert(irq, handler);
        debug!(irq, ?trigger, "irq attached");
        Ok(())
    }

    fn detach(&self, irq: IrqId) -> Result<(), HalError> {
        match self.inner.handlers.lock().remove(&irq) {
            Some(_) => {
                debug!(irq, "irq detached");
                Ok(())
            }
            None => Err(HalError::IrqUnavailable {
                irq,
                reason: "nothing attached".to_string(),
            }),
        }
    }
}

impl NodeBus for SimBoard {
    fn register_device(&self, name: &str) -> Result<DeviceId, HalError> {
        if self.inner.fail_register.load(Ordering::SeqCst) {
            return Err(HalError::NodeUnavailable {
                name: name.to_string(),
                reason: "injected registration failure".to_string(),
            });
        }
        let token = self.inner.next_token.fetch_add(1, Ordering::SeqCst);
        self.inner
            .registered
            .lock()
            .insert(token, name.to_string());
        debug!(name, token, "device identity registered");
        Ok(DeviceId(token))
    }

    fn unregister_device(&self, id: DeviceId) -> Result<(), HalError> {
        match self.inner.registered.lock().remove(&id.0) {
            Some(name) => {
                debug!(name = %name, "device identity unregistered");
                Ok(())
            }
            None => Err(HalError::NodeUnavailable {
                name: format!("id {}", id.0),
                reason: "not registered".to_string(),
            }),
        }
    }

    fn publish_node(&self, id: DeviceId) -> Result<NodeHandle, HalError> {
        if self.inner.fail_publish.load(Ordering::SeqCst) {
            return Err(HalError::NodeUnavailable {
                name: format!("id {}", id.0),
                reason: "injected publish failure".to_string(),
            });
        }
        if !self.inner.registered.lock().contains_key(&id.0) {
            return Err(HalError::NodeUnavailable {
                name: format!("id {}", id.0),
                reason: "identity not registered".to_string(),
            });
        }
        let token = self.inner.next_token.fetch_add(1, Ordering::SeqCst);
        self.inner.published.lock().insert(token, id.0);
        debug!(node = token, device = id.0, "node published");
        Ok(NodeHandle(token))
    }

    fn remove_node(&self, handle: NodeHandle) -> Result<(), HalError> {
        match self.inner.published.lock().remove(&handle.0) {
            Some(device) => {
                debug!(node = handle.0, device, "node removed");
                Ok(())
            }
            None => Err(HalError::NodeUnavailable {
                name: format!("node {}", handle.0),
                reason: "not published".to_string(),
            }),
        }
    }
}
