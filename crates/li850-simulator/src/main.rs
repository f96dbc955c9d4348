//! Desktop simulator for the Li-850 gas analyzer front-end.
//!
//! Runs the li850-core control loop unchanged against host stand-ins for the
//! hardware. Session logs are written under `--data-dir`, which plays the
//! role of the storage card.
//!
//! # Commands (one per line on stdin)
//!
//! | Input | Action                          |
//! |-------|---------------------------------|
//! | l     | Left button                     |
//! | r     | Right button                    |
//! | b     | Both buttons in one iteration   |
//! | x     | Corrupt the state (fault path)  |
//! | q     | Quit                            |
//!
//! With the `window` feature and `--window`, the OLED is shown in an SDL2
//! window and the arrow keys act as the buttons.

mod display;
mod drivers;

use std::fs;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use li850_core::{Button, DeviceConfig, DeviceStateMachine, Devices, InputLatch, Renderer, TickLatch};
use log::{info, warn};

use display::TerminalRenderer;
use drivers::{DirStorage, StdDelay, SyntheticAnalog, SystemClock, ThreadTimer};

static INPUT: InputLatch = InputLatch::new();
static TICKS: TickLatch = TickLatch::new();
static QUIT: AtomicBool = AtomicBool::new(false);
static CORRUPT_STATE: AtomicBool = AtomicBool::new(false);

/// State code outside the known range, used to exercise the fault path.
const CORRUPT_STATE_CODE: u8 = 0xEE;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory standing in for the storage card
    #[arg(long, default_value = "li850-data")]
    data_dir: PathBuf,

    /// Seconds between logged samples (overrides the configuration file)
    #[arg(long)]
    period: Option<u32>,

    /// Postcard-encoded configuration blob
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective configuration to this file and exit
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Make every Nth analog conversion fail
    #[arg(long)]
    fault_every: Option<u32>,

    /// Print the display to the terminal whenever it changes
    #[arg(long)]
    ascii: bool,

    /// Show the display in an SDL2 window (requires the `window` feature)
    #[arg(long)]
    window: bool,
}

fn load_config(args: &Args) -> Result<DeviceConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let bytes =
                fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            DeviceConfig::from_bytes(&bytes)
                .map_err(|e| anyhow!("invalid configuration in {}: {e}", path.display()))?
        }
        None => DeviceConfig::default(),
    };

    if let Some(period) = args.period {
        config.sampling_period_secs = period;
    }
    config
        .validate()
        .map_err(|e| anyhow!("invalid configuration: {e}"))?;
    Ok(config)
}

/// Reads button commands from stdin, standing in for the edge interrupts.
fn spawn_command_reader(quit_on_eof: bool) -> Result<()> {
    thread::Builder::new()
        .name("buttons".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                match line.trim() {
                    "l" | "left" => INPUT.on_rising_edge(Button::Left),
                    "r" | "right" => INPUT.on_rising_edge(Button::Right),
                    "b" | "both" => {
                        INPUT.on_rising_edge(Button::Left);
                        INPUT.on_rising_edge(Button::Right);
                    }
                    "x" | "fault" => CORRUPT_STATE.store(true, Ordering::Relaxed),
                    "q" | "quit" => {
                        QUIT.store(true, Ordering::Relaxed);
                        return;
                    }
                    "" => {}
                    other => warn!("Unknown command {other:?} (l, r, b, x, q)"),
                }
            }
            if quit_on_eof {
                QUIT.store(true, Ordering::Relaxed);
            }
        })
        .context("spawning stdin reader")?;
    Ok(())
}

fn run<R: Renderer>(config: DeviceConfig, args: &Args, renderer: R) -> Result<()> {
    let storage = DirStorage::new(&args.data_dir, &config.mount_point);
    info!(
        "Logging sessions under {} (mounted at {})",
        storage.root().display(),
        config.mount_point
    );

    let devices = Devices {
        analog: SyntheticAnalog::new(&config, args.fault_every),
        clock: SystemClock,
        storage,
        renderer,
        timer: ThreadTimer::new(&TICKS),
        delay: StdDelay,
    };
    let mut machine = DeviceStateMachine::new(config, &INPUT, &TICKS, devices)
        .map_err(|e| anyhow!("invalid configuration: {e}"))?;

    while !QUIT.load(Ordering::Relaxed) {
        if CORRUPT_STATE.swap(false, Ordering::Relaxed) {
            machine.force_state_code(CORRUPT_STATE_CODE);
        }
        machine.step();
    }

    if let Some(session) = machine.session().filter(|s| s.is_active()) {
        info!(
            "Quitting mid-session: {} lines written to {}",
            session.lines_written(),
            session.filename()
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = load_config(&args)?;

    if let Some(path) = &args.save_config {
        let bytes = config
            .to_bytes()
            .map_err(|e| anyhow!("encoding configuration: {e}"))?;
        fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
        info!("Configuration written to {}", path.display());
        return Ok(());
    }

    fs::create_dir_all(&args.data_dir)
        .with_context(|| format!("creating {}", args.data_dir.display()))?;

    info!("Starting Li-850 simulator, sampling every {} s", config.sampling_period_secs);

    if args.window {
        #[cfg(feature = "window")]
        {
            spawn_command_reader(false)?;
            let renderer = display::WindowRenderer::new(&INPUT, &QUIT);
            run(config, &args, renderer)?;
        }
        #[cfg(not(feature = "window"))]
        return Err(anyhow!("built without the `window` feature"));
    } else {
        info!("Commands: l = left, r = right, b = both, x = corrupt state, q = quit");
        spawn_command_reader(true)?;
        run(config, &args, TerminalRenderer::new(args.ascii))?;
    }

    info!("Simulator exiting");
    Ok(())
}
