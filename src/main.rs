//! # GPIO Button Demo Binary
//!
//! Brings the button device up on the simulated board, generates
//! press/release edges in the background, and drains the event stream with a
//! blocking reader until Ctrl-C.
//!
//! ```bash
//! # Defaults: device "button", capacity 2
//! gpio_button
//!
//! # Load a TOML config, verbose logging
//! gpio_button --config button.toml -v
//!
//! # Non-blocking polling reader
//! gpio_button --nonblock
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use clap::Parser;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

use gpio_button::{
    BUTTON_LINES, ButtonCore, ButtonError, DeviceConfig, OpenFlags, PinLevel, SimBoard,
};

/// GPIO button device demo on the simulated board.
#[derive(Parser, Debug)]
#[command(name = "gpio_button")]
#[command(version)]
#[command(about = "GPIO button input device core with interrupt-driven event delivery")]
struct Args {
    /// Path to a device configuration file (TOML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the configured open capacity.
    #[arg(long, value_name = "N")]
    capacity: Option<u32>,

    /// Open the read session non-blocking and poll instead of sleeping.
    #[arg(long)]
    nonblock: bool,

    /// Milliseconds between simulated edges.
    #[arg(long, default_value_t = 500)]
    edge_interval_ms: u64,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    if let Err(e) = run() {
        error!("startup failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    setup_tracing(&args);

    info!("gpio_button v{} starting", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => DeviceConfig::load(path)?,
        None => DeviceConfig::default(),
    };
    if let Some(capacity) = args.capacity {
        config.open_capacity = capacity;
    }

    let board = SimBoard::new();
    let core = ButtonCore::bring_up(
        config,
        BUTTON_LINES.to_vec(),
        Arc::new(board.clone()),
        Arc::new(board.clone()),
        Arc::new(board.clone()),
    )?;

    // Ctrl-C cancels the blocked reader; the run loop exits on Interrupted.
    let running = Arc::new(AtomicBool::new(true));
    let wake = core.wake_handle();
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || {
            info!("shutdown signal received");
            running.store(false, Ordering::SeqCst);
            wake.interrupt();
        })?;
    }

    // Background edge generator: alternate press/release across both lines.
    let generator = {
        let board = board.clone();
        let running = Arc::clone(&running);
        let interval = Duration::from_millis(args.edge_interval_ms.max(1));
        thread::spawn(move || {
            let mut tick = 0usize;
            while running.load(Ordering::SeqCst) {
                thread::sleep(interval);
                let line = &BUTTON_LINES[tick / 2 % BUTTON_LINES.len()];
                let level = if tick % 2 == 0 {
                    PinLevel::Low
                } else {
                    PinLevel::High
                };
                board.transition(line.gpio, line.irq, level);
                tick += 1;
            }
        })
    };

    let flags = if args.nonblock {
        OpenFlags::NONBLOCK
    } else {
        OpenFlags::empty()
    };
    let session = core.device().open(flags)?;
    info!(?flags, "session open, reading events (Ctrl-C to stop)");

    while running.load(Ordering::SeqCst) {
        match session.read(1) {
            Ok(code) => info!(code, "event"),
            Err(ButtonError::WouldBlock) => {
                thread::sleep(Duration::from_millis(50));
            }
            Err(ButtonError::Interrupted) => break,
            Err(e) => {
                error!("read failed: {e}");
                break;
            }
        }
    }

    drop(session);
    generator.join().ok();
    core.tear_down();
    info!("gpio_button shutdown complete");
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
