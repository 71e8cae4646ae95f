use clap::Parser;
use extended_window_status::config::{Config, load_dotenv};
use extended_window_status::host::Host;
use extended_window_status::input::run_window_simulation;
use extended_window_status::integration::Integration;
use extended_window_status::window::{StatusLabels, StatusUpdate};
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

/// Derive Open / Closed / Tilted window states from contact and rotation sensors.
#[derive(Debug, Parser)]
#[command(name = "extended-window-status", version)]
struct Args {
    /// Path to the JSON config file (defaults to the platform config dir)
    #[arg(short, long, env = "EWS_CONFIG")]
    config: Option<PathBuf>,

    /// Cycle all windows through closed, tilted and open
    #[arg(long)]
    simulate: bool,

    /// Seconds between simulation steps
    #[arg(long)]
    interval: Option<u64>,
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    // Load .env file before anything else, while the process is single-threaded
    load_dotenv();
    init_logger();
    let args = Args::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };
    runtime.block_on(run(args));
}

async fn run(args: Args) {
    info!("Starting Extended window status");

    let mut config = match Config::resolve(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    if args.simulate {
        config.simulation.enabled = true;
    }
    if let Some(secs) = args.interval {
        config.simulation.interval_secs = secs;
    }

    info!("Configuration loaded:");
    info!("  Devices: {}", config.devices.len());
    info!("  Windows: {}", config.windows.len());
    info!(
        "  Simulation: {} (every {}s)",
        config.simulation.enabled, config.simulation.interval_secs
    );

    let host = Host::new();
    for device in config.devices.clone() {
        host.devices.register(device);
    }

    let integration = Integration::new(host.clone());
    let labels = StatusLabels::new();
    integration.add_listener(Arc::new(move |update: &StatusUpdate| {
        if update.changed() {
            info!(
                "{}: {} -> {}",
                update.entity_id,
                labels.label(update.previous).unwrap_or("unknown"),
                labels.label(update.status).unwrap_or("unknown")
            );
        }
    }));

    for window in config.windows.clone() {
        let base_entity = window.base_entity.clone();
        if let Err(e) = integration.setup_entry(window) {
            error!("Failed to set up window for {}: {}", base_entity, e);
        }
    }

    let windows = integration.sensors();
    if windows.is_empty() {
        warn!("No windows configured");
    }

    let simulation = if config.simulation.enabled && !windows.is_empty() {
        let period = Duration::from_secs(config.simulation.interval_secs.max(1));
        Some(run_window_simulation(host.states.clone(), windows, period))
    } else {
        None
    };

    info!("Extended window status is running");
    info!("  - Press Ctrl+C to exit");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal");
        }
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
        }
    }

    if let Some(simulation) = simulation {
        simulation.abort();
    }
    integration.shutdown();

    info!("Extended window status stopped");
}
