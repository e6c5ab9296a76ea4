//! Looper Pedal - foot-pedal MIDI controller for a four-track looper
//!
//! Reads the pedal's buttons, drives its lamps and talks to the looper host
//! over MIDI.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::oneshot;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use looper_pedal::clock::SystemClock;
use looper_pedal::config::{AppConfig, Backend};
use looper_pedal::io::{self, ButtonInput, IdleButtons, Indicators, LogIndicators, MidirPort};
use looper_pedal::Pedal;

/// Looper Pedal - drive a four-track looper from a foot pedal
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (built-in defaults when omitted)
    #[arg(short, long)]
    config: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// List available MIDI ports
    #[arg(long)]
    list_ports: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level)?;

    info!("Starting Looper Pedal v{}...", env!("CARGO_PKG_VERSION"));

    if args.list_ports {
        return io::midir_port::list_ports_formatted();
    }

    let config = match &args.config {
        Some(path) => {
            info!("Configuration file: {}", path);
            AppConfig::load(path).await?
        }
        None => {
            info!("No configuration file given, using built-in defaults");
            AppConfig::default()
        }
    };

    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    // The poll loop blocks between iterations, so it gets its own thread.
    // Hardware handles are opened there and never cross threads.
    let mut pedal_task = tokio::task::spawn_blocking(move || run_pedal(config, shutdown_rx));

    tokio::select! {
        result = &mut pedal_task => {
            return result.context("Pedal thread panicked")?;
        }
        _ = shutdown_signal() => {}
    }

    if shutdown_tx.send(()).is_err() {
        warn!("Pedal loop already stopped");
    }
    pedal_task.await.context("Pedal thread panicked")??;

    info!("Looper Pedal shutdown complete");
    Ok(())
}

fn run_pedal(config: AppConfig, mut shutdown: oneshot::Receiver<()>) -> Result<()> {
    let midi = MidirPort::connect(&config.midi.input_port, &config.midi.output_port)?;
    info!("Looper connected");

    let (buttons, lamps) = open_panel(&config)?;

    let mut pedal = Pedal::new(&config, buttons, lamps, midi, SystemClock::new());
    pedal.boot();
    pedal.run(&mut shutdown);

    Ok(())
}

type Panel = (Box<dyn ButtonInput>, Box<dyn Indicators>);

fn open_panel(config: &AppConfig) -> Result<Panel> {
    match config.io.backend {
        Backend::Gpio => open_gpio(config),
        Backend::None => {
            info!("No button/lamp hardware, lamp changes are logged");
            Ok((Box::new(IdleButtons), Box::new(LogIndicators::new())))
        }
    }
}

#[cfg(feature = "gpio")]
fn open_gpio(config: &AppConfig) -> Result<Panel> {
    let (buttons, lamps) = io::gpio::open(&config.io)?;
    info!("GPIO panel opened");
    Ok((Box::new(buttons), Box::new(lamps)))
}

#[cfg(not(feature = "gpio"))]
fn open_gpio(_config: &AppConfig) -> Result<Panel> {
    Err(looper_pedal::PedalError::GpioUnavailable.into())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for CTRL+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
