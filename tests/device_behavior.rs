//! End-to-end behavior of the button device on the simulated board.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use gpio_button::{
    BUTTON_LINES, ButtonCore, ButtonError, ButtonResult, DeviceConfig, OpenFlags, PinLevel,
    SimBoard,
};

fn bring_up(board: &SimBoard, capacity: u32) -> ButtonResult<ButtonCore> {
    let config = DeviceConfig {
        open_capacity: capacity,
        ..DeviceConfig::default()
    };
    ButtonCore::bring_up(
        config,
        BUTTON_LINES.to_vec(),
        Arc::new(board.clone()),
        Arc::new(board.clone()),
        Arc::new(board.clone()),
    )
}

#[test]
fn press_and_release_deliver_their_codes() -> ButtonResult<()> {
    let board = SimBoard::new();
    let core = bring_up(&board, 2)?;
    let session = core.device().open(OpenFlags::empty())?;

    // Line 0 pressed (level 0) -> 0x80.
    board.transition(BUTTON_LINES[0].gpio, BUTTON_LINES[0].irq, PinLevel::Low);
    assert_eq!(session.read(1)?, 0x80);

    // Line 1 released (level 1) -> 0x81.
    board.transition(BUTTON_LINES[1].gpio, BUTTON_LINES[1].irq, PinLevel::High);
    assert_eq!(session.read(1)?, 0x81);

    drop(session);
    core.tear_down();
    Ok(())
}

#[test]
fn two_firings_before_a_read_keep_only_the_later() -> ButtonResult<()> {
    let board = SimBoard::new();
    let core = bring_up(&board, 2)?;
    let session = core.device().open(OpenFlags::NONBLOCK)?;

    board.transition(BUTTON_LINES[0].gpio, BUTTON_LINES[0].irq, PinLevel::Low);
    board.transition(BUTTON_LINES[1].gpio, BUTTON_LINES[1].irq, PinLevel::High);

    // The later write overwrote the earlier one; exactly one event survives.
    assert_eq!(session.read(1)?, 0x81);
    assert!(matches!(session.read(1), Err(ButtonError::WouldBlock)));

    drop(session);
    core.tear_down();
    Ok(())
}

#[test]
fn nonblocking_read_without_a_firing_would_block() -> ButtonResult<()> {
    let board = SimBoard::new();
    let core = bring_up(&board, 2)?;
    let session = core.device().open(OpenFlags::NONBLOCK)?;

    assert!(matches!(session.read(64), Err(ButtonError::WouldBlock)));

    drop(session);
    core.tear_down();
    Ok(())
}

#[test]
fn blocking_read_waits_for_a_firing() -> ButtonResult<()> {
    let board = SimBoard::new();
    let core = bring_up(&board, 2)?;
    let session = core.device().open(OpenFlags::empty())?;
    let (tx, rx) = mpsc::channel();

    let reader = thread::spawn(move || {
        let code = session.read(1);
        tx.send(code).unwrap();
    });

    // No firing since the mailbox was last drained: the read must not return.
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

    board.transition(BUTTON_LINES[0].gpio, BUTTON_LINES[0].irq, PinLevel::Low);
    let code = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(code.unwrap(), 0x80);

    reader.join().unwrap();
    core.tear_down();
    Ok(())
}

#[test]
fn capacity_bounds_concurrent_sessions() -> ButtonResult<()> {
    let board = SimBoard::new();
    let core = bring_up(&board, 2)?;
    let device = core.device();

    let first = device.open(OpenFlags::empty())?;
    let second = device.open(OpenFlags::empty())?;

    // Third concurrent non-blocking open with two sessions held: Busy.
    assert!(matches!(
        device.open(OpenFlags::NONBLOCK),
        Err(ButtonError::Busy { capacity: 2 })
    ));

    // After one session closes, the same attempt succeeds.
    drop(first);
    let third = device.open(OpenFlags::NONBLOCK)?;

    drop(second);
    drop(third);
    core.tear_down();
    Ok(())
}

#[test]
fn blocking_open_waits_for_a_free_slot() -> ButtonResult<()> {
    let board = SimBoard::new();
    let core = Arc::new(bring_up(&board, 1)?);
    let held = core.device().open(OpenFlags::empty())?;
    let (tx, rx) = mpsc::channel();

    let opener = {
        let core = Arc::clone(&core);
        thread::spawn(move || {
            let session = core.device().open(OpenFlags::empty());
            tx.send(session.is_ok()).unwrap();
        })
    };

    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

    drop(held);
    assert!(rx.recv_timeout(Duration::from_secs(2)).unwrap());
    opener.join().unwrap();
    Ok(())
}

#[test]
fn capacity_one_makes_the_opener_exclusive() -> ButtonResult<()> {
    let board = SimBoard::new();
    let core = bring_up(&board, 1)?;

    let only = core.device().open(OpenFlags::NONBLOCK)?;
    assert!(matches!(
        core.device().open(OpenFlags::NONBLOCK),
        Err(ButtonError::Busy { capacity: 1 })
    ));

    drop(only);
    core.tear_down();
    Ok(())
}

#[test]
fn wake_handle_interrupts_a_blocked_reader() -> ButtonResult<()> {
    let board = SimBoard::new();
    let core = bring_up(&board, 2)?;
    let session = core.device().open(OpenFlags::empty())?;
    let wake = core.wake_handle();
    let (tx, rx) = mpsc::channel();

    let reader = thread::spawn(move || {
        tx.send(session.read(1)).unwrap();
    });

    thread::sleep(Duration::from_millis(50));
    wake.interrupt();

    let result = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert!(matches!(result, Err(ButtonError::Interrupted)));

    reader.join().unwrap();
    core.tear_down();
    Ok(())
}

#[test]
fn tear_down_interrupts_blocked_readers() -> ButtonResult<()> {
    let board = SimBoard::new();
    let core = bring_up(&board, 2)?;
    let session = core.device().open(OpenFlags::empty())?;
    let (tx, rx) = mpsc::channel();

    let reader = thread::spawn(move || {
        tx.send(session.read(1)).unwrap();
    });

    thread::sleep(Duration::from_millis(50));
    core.tear_down();

    let result = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert!(matches!(result, Err(ButtonError::Interrupted)));
    reader.join().unwrap();

    assert!(board.claimed_lines().is_empty());
    assert!(board.attached_irqs().is_empty());
    assert_eq!(board.published_nodes(), 0);
    Ok(())
}

#[test]
fn interrupt_context_producer_feeds_a_normal_context_consumer() -> ButtonResult<()> {
    let board = SimBoard::new();
    let core = bring_up(&board, 2)?;
    let session = core.device().open(OpenFlags::empty())?;

    // Fire edges from another thread while the reader blocks, alternating
    // press/release so every delivered code is one of the two valid ones.
    let producer = {
        let board = board.clone();
        thread::spawn(move || {
            for i in 0..10u32 {
                let line = &BUTTON_LINES[(i as usize) % 2];
                let level = if i % 2 == 0 {
                    PinLevel::Low
                } else {
                    PinLevel::High
                };
                board.transition(line.gpio, line.irq, level);
                thread::sleep(Duration::from_millis(10));
            }
        })
    };

    let mut seen = 0;
    while seen < 3 {
        let code = session.read(1)?;
        assert!(code == 0x80 || code == 0x81);
        seen += 1;
    }

    producer.join().unwrap();
    drop(session);
    core.tear_down();
    Ok(())
}
