//! Device lifecycle: ordered bring-up, rollback on partial failure, teardown.
//!
//! Bring-up runs `Unregistered → DeviceCreated → LinesAcquiring → Ready`;
//! every successful sub-step pushes an [`Acquired`] marker, and any failure
//! walks the markers in strict reverse order so an unsuccessful bring-up
//! holds zero resources. `bring_up` returning `Ok` IS the Ready state: the
//! caller owns a [`ButtonCore`] and teardown consumes it, so bring-up,
//! open sessions, and teardown are sequenced by ownership, not by a lock.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::DeviceConfig;
use crate::device::ButtonDevice;
use crate::error::{ButtonError, ButtonResult};
use crate::hal::{DeviceId, EdgeTrigger, GpioBank, InputLine, IrqBank, NodeBus, NodeHandle};
use crate::irq::edge_handler;
use crate::mailbox::{EventMailbox, WakeHandle};
use crate::registry::ButtonLine;

/// Rollback marker recorded after each successful bring-up sub-step.
///
/// The vector of markers grows monotonically during bring-up and is the
/// authoritative record for unwind and teardown ordering. Line and irq
/// markers index into the line table.
#[derive(Debug)]
enum Acquired {
    /// Device identity registered on the bus.
    Identity(DeviceId),
    /// Node published; opens possible from here on.
    Node(NodeHandle),
    /// Hardware line at this table index claimed.
    Line(usize),
    /// Interrupt at this table index attached.
    Irq(usize),
}

/// Acquired hardware resources plus their rollback record.
struct Resources {
    acquired: Vec<Acquired>,
    /// Claimed handles indexed by line table position; `None` once released.
    claimed: Vec<Option<Arc<dyn InputLine>>>,
}

impl Resources {
    fn empty(line_count: usize) -> Self {
        Self {
            acquired: Vec::new(),
            claimed: vec![None; line_count],
        }
    }

    /// Release everything in reverse acquisition order.
    ///
    /// Interrupts detach before their lines drop by construction (the irq
    /// marker was pushed after the line marker). Release errors are logged
    /// and the walk keeps going: leaving nothing leaked outranks reporting
    /// every sub-failure.
    fn unwind(&mut self, lines: &[ButtonLine], irq: &dyn IrqBank, bus: &dyn NodeBus) {
        while let Some(step) = self.acquired.pop() {
            match step {
                Acquired::Irq(i) => {
                    if let Err(e) = irq.detach(lines[i].irq) {
                        warn!(line = lines[i].name, "irq detach failed: {e}");
                    }
                }
                Acquired::Line(i) => {
                    self.claimed[i] = None;
                }
                Acquired::Node(handle) => {
                    if let Err(e) = bus.remove_node(handle) {
                        warn!("node removal failed: {e}");
                    }
                }
                Acquired::Identity(id) => {
                    if let Err(e) = bus.unregister_device(id) {
                        warn!("device identity release failed: {e}");
                    }
                }
            }
        }
    }
}

/// A brought-up button device holding its hardware resources.
///
/// Existence of a value of this type means every line is claimed, every
/// interrupt is attached, and the node is published. [`tear_down`][Self::tear_down]
/// consumes it.
pub struct ButtonCore {
    config: DeviceConfig,
    lines: Vec<ButtonLine>,
    irq: Arc<dyn IrqBank>,
    bus: Arc<dyn NodeBus>,
    device: ButtonDevice,
    mailbox: Arc<EventMailbox>,
    resources: Resources,
}

impl ButtonCore {
    /// Bring the device up: register its identity, allocate device state,
    /// publish the node, then claim each line and attach its both-edges
    /// interrupt in table order.
    ///
    /// Any failure unwinds every completed step in reverse and surfaces the
    /// first error; no retries are attempted.
    pub fn bring_up(
        config: DeviceConfig,
        lines: Vec<ButtonLine>,
        gpio: Arc<dyn GpioBank>,
        irq: Arc<dyn IrqBank>,
        bus: Arc<dyn NodeBus>,
    ) -> ButtonResult<Self> {
        config.validate()?;
        info!(
            device = %config.device_name,
            capacity = config.open_capacity,
            lines = lines.len(),
            "bringing up button device"
        );

        let mut resources = Resources::empty(lines.len());

        let id = match bus.register_device(&config.device_name) {
            Ok(id) => {
                resources.acquired.push(Acquired::Identity(id));
                id
            }
            Err(source) => {
                return Err(ButtonError::BringUp {
                    stage: "register-device",
                    source,
                });
            }
        };

        // Device state: admission at configured capacity, empty mailbox.
        let mailbox = Arc::new(EventMailbox::new());
        let device = ButtonDevice::new(config.open_capacity, Arc::clone(&mailbox));

        match bus.publish_node(id) {
            Ok(handle) => resources.acquired.push(Acquired::Node(handle)),
            Err(source) => {
                resources.unwind(&lines, irq.as_ref(), bus.as_ref());
                return Err(ButtonError::BringUp {
                    stage: "publish-node",
                    source,
                });
            }
        }

        for (i, line) in lines.iter().enumerate() {
            let handle = match gpio.claim(line.gpio, line.name) {
                Ok(handle) => handle,
                Err(source) => {
                    resources.unwind(&lines, irq.as_ref(), bus.as_ref());
                    return Err(ButtonError::BringUp {
                        stage: "claim-line",
                        source,
                    });
                }
            };
            let handler = edge_handler(line.name, Arc::clone(&handle), Arc::clone(&mailbox));
            resources.claimed[i] = Some(handle);
            resources.acquired.push(Acquired::Line(i));

            match irq.attach(line.irq, EdgeTrigger::Both, handler) {
                Ok(()) => resources.acquired.push(Acquired::Irq(i)),
                Err(source) => {
                    resources.unwind(&lines, irq.as_ref(), bus.as_ref());
                    return Err(ButtonError::BringUp {
                        stage: "attach-irq",
                        source,
                    });
                }
            }
            info!(line = line.name, gpio = line.gpio, irq = line.irq, "line armed");
        }

        info!(device = %config.device_name, "button device ready");
        Ok(Self {
            config,
            lines,
            irq,
            bus,
            device,
            mailbox,
            resources,
        })
    }

    /// The readable device clients open sessions against.
    pub fn device(&self) -> &ButtonDevice {
        &self.device
    }

    /// Cancellation handle for signal handlers: interrupts blocked readers.
    pub fn wake_handle(&self) -> WakeHandle {
        WakeHandle::new(Arc::clone(&self.mailbox))
    }

    /// Active configuration.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// The line table this device was brought up with.
    pub fn lines(&self) -> &[ButtonLine] {
        &self.lines
    }

    /// Tear the device down: wake blocked readers with `Interrupted`, then
    /// release every resource in reverse acquisition order.
    ///
    /// Expected to always succeed; release errors are logged, never retried,
    /// and the teardown proceeds to free the remaining resources.
    pub fn tear_down(mut self) {
        info!(device = %self.config.device_name, "tearing down button device");
        self.mailbox.interrupt_waiters();
        self.resources
            .unwind(&self.lines, self.irq.as_ref(), self.bus.as_ref());
        info!(device = %self.config.device_name, "button device torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::BUTTON_LINES;
    use crate::sim::SimBoard;

    fn bring_up_on(board: &SimBoard) -> ButtonResult<ButtonCore> {
        ButtonCore::bring_up(
            DeviceConfig::default(),
            BUTTON_LINES.to_vec(),
            Arc::new(board.clone()),
            Arc::new(board.clone()),
            Arc::new(board.clone()),
        )
    }

    #[test]
    fn bring_up_acquires_everything_in_order() {
        let board = SimBoard::new();
        let core = bring_up_on(&board).unwrap();

        assert_eq!(board.claimed_lines(), vec![0, 1]);
        assert_eq!(board.attached_irqs(), vec![0, 1]);
        assert_eq!(board.published_nodes(), 1);
        assert_eq!(board.registered_devices(), vec!["button".to_string()]);
        assert_eq!(core.device().capacity(), 2);
    }

    #[test]
    fn tear_down_releases_everything() {
        let board = SimBoard::new();
        let core = bring_up_on(&board).unwrap();
        core.tear_down();

        assert!(board.claimed_lines().is_empty());
        assert!(board.attached_irqs().is_empty());
        assert_eq!(board.published_nodes(), 0);
        assert!(board.registered_devices().is_empty());
    }

    #[test]
    fn second_line_irq_failure_rolls_back_to_zero() {
        let board = SimBoard::new();
        board.inject_attach_failure(BUTTON_LINES[1].irq);

        let result = bring_up_on(&board);
        assert!(matches!(
            result,
            Err(ButtonError::BringUp {
                stage: "attach-irq",
                ..
            })
        ));

        // Zero hardware lines held and the node un-published.
        assert!(board.claimed_lines().is_empty());
        assert!(board.attached_irqs().is_empty());
        assert_eq!(board.published_nodes(), 0);
        assert!(board.registered_devices().is_empty());
    }

    #[test]
    fn line_claim_failure_rolls_back_to_zero() {
        let board = SimBoard::new();
        board.inject_claim_failure(BUTTON_LINES[0].gpio);

        let result = bring_up_on(&board);
        assert!(matches!(
            result,
            Err(ButtonError::BringUp {
                stage: "claim-line",
                ..
            })
        ));
        assert!(board.claimed_lines().is_empty());
        assert_eq!(board.published_nodes(), 0);
        assert!(board.registered_devices().is_empty());
    }

    #[test]
    fn publish_failure_releases_the_identity() {
        let board = SimBoard::new();
        board.inject_publish_failure();

        let result = bring_up_on(&board);
        assert!(matches!(
            result,
            Err(ButtonError::BringUp {
                stage: "publish-node",
                ..
            })
        ));
        assert!(board.registered_devices().is_empty());
    }

    #[test]
    fn register_failure_holds_nothing() {
        let board = SimBoard::new();
        board.inject_register_failure();

        let result = bring_up_on(&board);
        assert!(matches!(
            result,
            Err(ButtonError::BringUp {
                stage: "register-device",
                ..
            })
        ));
        assert!(board.registered_devices().is_empty());
        assert!(board.claimed_lines().is_empty());
    }

    #[test]
    fn invalid_config_fails_before_touching_hardware() {
        let board = SimBoard::new();
        let config = DeviceConfig {
            open_capacity: 0,
            ..DeviceConfig::default()
        };
        let result = ButtonCore::bring_up(
            config,
            BUTTON_LINES.to_vec(),
            Arc::new(board.clone()),
            Arc::new(board.clone()),
            Arc::new(board.clone()),
        );
        assert!(matches!(result, Err(ButtonError::InvalidConfig { .. })));
        assert!(board.registered_devices().is_empty());
    }
}
