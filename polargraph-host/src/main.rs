//! Polargraph controller
//!
//! Reads the machine setup, then streams target points from a file to the
//! motor controller, one tick at a time. Logs go to stderr; set `RUST_LOG`
//! to change verbosity.

mod controller;
mod delay;
mod serial;
mod setup;

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use polargraph_core::{KinematicsEngine, PointReader, StepMode};
use polargraph_drivers::link::{DEFAULT_BYTE_DELAY_US, DEFAULT_MAX_HANDSHAKES};
use polargraph_drivers::{CommandLink, HandshakePolicy, LinkConfig, SimulatedSlave};
use polargraph_hal::{ByteChannel, UartChannel, UartConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use controller::{Controller, RunSummary, DEFAULT_TICK_MS};
use delay::StdDelay;
use serial::SerialUart;

#[derive(Parser, Debug)]
#[command(name = "polargraph", version, about = "Drive a two-cable polargraph plotter")]
struct Cli {
    /// Machine setup: `label:value` lines, or a `.toml` file
    #[arg(short, long, default_value = "fileio/config.txt")]
    config: PathBuf,

    /// Target points, one `x,y` per line
    #[arg(short, long, default_value = "fileio/points.txt")]
    points: PathBuf,

    /// Serial device connected to the motor controller
    #[arg(long, default_value = "/dev/ttyUSB0")]
    port: String,

    /// Serial baud rate
    #[arg(long, default_value_t = 115_200)]
    baud: u32,

    /// Pause after each byte exchange, in microseconds
    #[arg(long, default_value_t = DEFAULT_BYTE_DELAY_US)]
    byte_delay_us: u32,

    /// Pause between points, in milliseconds
    #[arg(long, default_value_t = DEFAULT_TICK_MS)]
    tick_ms: u32,

    /// Handshake attempts before giving up (0 retries forever)
    #[arg(long, default_value_t = DEFAULT_MAX_HANDSHAKES)]
    max_handshakes: u32,

    /// Send step deltas instead of absolute step counts
    #[arg(long)]
    relative: bool,

    /// Talk to a simulated controller instead of the serial port
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let setup = setup::load_setup(&cli.config)?;
    let mode = if cli.relative {
        StepMode::Relative
    } else {
        StepMode::Absolute
    };
    let mut engine = KinematicsEngine::from_setup(&setup)
        .with_context(|| format!("invalid machine setup in {}", cli.config.display()))?
        .with_step_mode(mode);

    info!(
        width = setup.width,
        spool_radius = setup.spool_radius,
        steps_per_revolution = setup.steps_per_revolution,
        x = setup.initial_x,
        y = setup.initial_y,
        ?mode,
        "machine configured"
    );

    let mut points = open_points(&cli.points)?;
    let link_config = LinkConfig {
        byte_delay_us: cli.byte_delay_us,
        handshake: HandshakePolicy::from_attempts(cli.max_handshakes),
    };

    let summary = if cli.dry_run {
        info!("dry run: using simulated motor controller");
        run(SimulatedSlave::new(), link_config, &cli, &mut engine, &mut points)?
    } else {
        let uart = SerialUart::open(&cli.port, &UartConfig::with_baudrate(cli.baud))
            .with_context(|| format!("failed to open serial port {}", cli.port))?;
        info!(
            port = uart.name().as_deref().unwrap_or(&cli.port),
            baud = cli.baud,
            "serial port open"
        );
        run(UartChannel::new(uart), link_config, &cli, &mut engine, &mut points)?
    };

    info!(
        ticks = summary.ticks,
        last_result = ?summary.last_result,
        x = summary.final_position.x,
        y = summary.final_position.y,
        handshakes = summary.link.total_handshake_attempts,
        "run complete"
    );
    Ok(())
}

fn open_points(path: &Path) -> Result<PointReader<BufReader<File>>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    Ok(PointReader::new(BufReader::new(file)))
}

fn run<C>(
    channel: C,
    link_config: LinkConfig,
    cli: &Cli,
    engine: &mut KinematicsEngine,
    points: &mut PointReader<BufReader<File>>,
) -> Result<RunSummary>
where
    C: ByteChannel,
    C::Error: fmt::Debug + Send + Sync + 'static,
{
    let link = CommandLink::new(channel, StdDelay, link_config);
    let mut controller = Controller::new(link, cli.tick_ms);
    let summary = controller
        .run(engine, points)
        .with_context(|| format!("run aborted while reading {}", cli.points.display()))?;
    Ok(summary)
}
