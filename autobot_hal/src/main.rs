//! # AutoBot HAL Binary
//!
//! Opens the link to the robot's microcontroller, drives the robot into its
//! safe state and logs a telemetry snapshot periodically until Ctrl-C, then
//! parks the robot.
//!
//! # Usage
//!
//! ```bash
//! # Run against the simulated board
//! autobot_hal --simulate
//!
//! # Run on a specific serial device
//! autobot_hal --device /dev/ttyACM0 --baud 115200
//!
//! # Explicit config file, verbose JSON logs
//! autobot_hal --config config/autobot.toml -v --json
//! ```

use autobot_common::config::ConfigLoader;
use autobot_common::consts::DEFAULT_CONFIG_PATH;
use autobot_common::hal::config::HalConfig;
use autobot_common::hal::driver::HalError;
use autobot_hal::{HalCore, Robot, TransportRegistry};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

/// Longest sleep between running-flag checks
const POLL_SLICE: Duration = Duration::from_millis(50);

/// AutoBot HAL - serial hardware abstraction layer
#[derive(Parser, Debug)]
#[command(name = "autobot_hal")]
#[command(version)]
#[command(about = "Serial hardware abstraction layer for the AutoBot robot")]
#[command(long_about = None)]
struct Args {
    /// Path to configuration file (autobot.toml).
    /// Defaults to /etc/autobot/autobot.toml when present.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Serial device path (overrides config and HW_SERIAL)
    #[arg(long, value_name = "PATH")]
    device: Option<String>,

    /// Baud rate (overrides config and HW_BAUDRATE)
    #[arg(long, value_name = "N")]
    baud: Option<u32>,

    /// Use the simulated board instead of a serial port
    #[arg(short = 's', long)]
    simulate: bool,

    /// Transport to open
    #[arg(short, long, default_value = "serial")]
    transport: String,

    /// Interval between telemetry snapshots in the log
    #[arg(long, value_name = "MS", default_value_t = 1000)]
    telemetry_interval_ms: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("AutoBot HAL failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loaded = load_config(args.config.as_deref());
    let config_level = loaded
        .as_ref()
        .map(|c| Level::from(c.shared.log_level))
        .unwrap_or(Level::INFO);
    setup_tracing(&args, config_level);

    info!("AutoBot HAL v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut config = loaded?;
    config.apply_env_overrides()?;
    if let Some(device) = &args.device {
        config.serial.device = device.clone();
    }
    if let Some(baud) = args.baud {
        config.serial.baud_rate = baud;
    }
    config.validate()?;

    let transport_name = if args.simulate {
        info!("Simulation mode enabled");
        "simulation"
    } else {
        args.transport.as_str()
    };
    info!(
        "Using '{}' transport on {} @ {} baud",
        transport_name, config.serial.device, config.serial.baud_rate
    );

    let registry = TransportRegistry::with_builtin();
    let core = HalCore::open(&registry, transport_name, &config.serial, true)?;

    // Setup signal handler.
    let running = core.running_flag();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })?;

    let robot = Robot::start(core, config.robot, config.drive)?;
    report_telemetry(&robot, Duration::from_millis(args.telemetry_interval_ms.max(1)))?;
    robot.shutdown()?;

    info!("AutoBot HAL shutdown complete");
    Ok(())
}

/// Load the config file, falling back to defaults when no file is given and
/// the default path does not exist.
fn load_config(path: Option<&Path>) -> Result<HalConfig, HalError> {
    if let Some(path) = path {
        return Ok(HalConfig::load(path)?);
    }
    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        Ok(HalConfig::load(default_path)?)
    } else {
        Ok(HalConfig::default())
    }
}

/// Log a JSON telemetry snapshot every `interval` while the session runs.
fn report_telemetry(robot: &Robot, interval: Duration) -> Result<(), serde_json::Error> {
    let mut next = Instant::now();
    while robot.core().is_running() {
        let now = Instant::now();
        if now >= next {
            let snapshot = serde_json::to_string(&robot.get_all_telemetry())?;
            info!("Telemetry: {}", snapshot);
            next = now + interval;
        }
        std::thread::sleep(POLL_SLICE.min(next.saturating_duration_since(now)));
    }
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, config_level: Level) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        config_level
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
