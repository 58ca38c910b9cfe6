//! MIDI Viewer - live MIDI input monitor

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use midi_viewer::config::AppConfig;
use midi_viewer::device::{self, DeviceError, InputDevice, PortInfo};
use midi_viewer::monitor::Monitor;
use midi_viewer::paths::AppPaths;
use midi_viewer::viewer::render::Renderer;
use midi_viewer::viewer::theme::{Theme, ThemeName};
use midi_viewer::viewer::{self, Session};

/// Capacity of the capture hand-off between the MIDI driver and the viewer
const CAPTURE_QUEUE: usize = 1000;

/// MIDI Viewer - watch incoming MIDI messages and held notes
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Write logs to a daily file in the logs directory instead of stderr
    #[arg(long)]
    log_file: bool,

    /// List available MIDI input ports
    #[arg(long)]
    list_ports: bool,

    /// Input port index or name pattern
    #[arg(short, long)]
    device: Option<String>,

    /// Number of events kept in the log
    #[arg(long)]
    capacity: Option<usize>,

    /// Color theme
    #[arg(long, value_enum)]
    theme: Option<ThemeName>,

    /// Print events as JSON lines
    #[arg(long)]
    json: bool,

    /// Show note numbers (60) instead of names (C4)
    #[arg(long)]
    numeric_notes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let paths = AppPaths::detect();

    let _log_guard = init_logging(&args.log_level, args.log_file.then_some(&paths))?;

    // Handle list ports
    if args.list_ports {
        let ports = device::discover_input_ports()?;
        device::print_ports(&ports);
        if ports.is_empty() {
            return Err(DeviceError::NoInputDevices.into());
        }
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => AppConfig::load(path).await?,
        None => AppConfig::load_or_default(&paths.config).await?,
    };
    apply_overrides(&mut config, &args)?;

    let ports = device::discover_input_ports()?;
    let port = choose_port(&ports, config.device.as_deref())?;

    let (capture_tx, capture_rx) = mpsc::channel(CAPTURE_QUEUE);
    let input = InputDevice::connect(&port, capture_tx)?;

    let monitor = Monitor::new(config.log_capacity, config.filter.to_filter());
    let renderer = Renderer::new(Theme::from(config.theme));
    let session = Session::new(monitor, renderer, input.name()).with_json(args.json);

    info!(
        "Monitoring '{}' (log capacity {})",
        input.name(),
        config.log_capacity
    );
    viewer::run(session, input, capture_rx).await
}

/// Command-line flags take precedence over the config file
fn apply_overrides(config: &mut AppConfig, args: &Args) -> Result<()> {
    if let Some(capacity) = args.capacity {
        config.log_capacity = capacity;
    }
    if let Some(device) = &args.device {
        config.device = Some(device.clone());
    }
    if let Some(theme) = args.theme {
        config.theme = theme;
    }
    if args.numeric_notes {
        config.filter.show_note_names = false;
    }
    config.validate().context("Invalid command-line options")
}

/// Select the input port from a pattern, or ask when several are available
fn choose_port(ports: &[PortInfo], pattern: Option<&str>) -> Result<PortInfo> {
    if let Some(pattern) = pattern {
        return Ok(device::select_port(ports, pattern)?.clone());
    }

    match ports {
        [] => Err(DeviceError::NoInputDevices.into()),
        [only] => Ok(only.clone()),
        _ => {
            device::print_ports(ports);
            println!("Select input port (index or name): ");
            let mut choice = String::new();
            std::io::stdin().read_line(&mut choice)?;
            Ok(device::select_port(ports, &choice)?.clone())
        }
    }
}

fn init_logging(level: &str, file_paths: Option<&AppPaths>) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    // stdout belongs to the event stream
    match file_paths {
        Some(paths) => {
            let logs_dir = paths.ensure_logs_dir()?;
            let appender = tracing_appender::rolling::daily(logs_dir, "midi-viewer.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::registry()
                .with(filter)
                .with(layer.with_ansi(false).with_writer(writer))
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(layer.with_writer(std::io::stderr))
                .init();
            Ok(None)
        }
    }
}
