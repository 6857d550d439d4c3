//! StanzaCam: main entry point.
//!
//! Hexagonal architecture with a fixed-period control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  ControlPanel     RpicamCamera    EscPosPrinter   SystemClock  │
//! │  (Input+LED)      (Camera)        (Printer)       (Clock)      │
//! │  AnthropicGenerator   LogEventSink   JsonConfigFile            │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Debounce · Focus lock · Indicator · Capture cycle     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use stanzacam::adapters::camera::RpicamCamera;
use stanzacam::adapters::config_file::JsonConfigFile;
use stanzacam::adapters::generator::{API_KEY_ENV, AnthropicGenerator};
use stanzacam::adapters::gpio::open_control_panel;
use stanzacam::adapters::hardware::HardwareAdapter;
use stanzacam::adapters::log_sink::LogEventSink;
use stanzacam::adapters::printer::{EscPosPrinter, open_serial};
use stanzacam::adapters::time::SystemClock;
use stanzacam::app::ports::{ClockPort, ConfigPort, GeneratorPort};
use stanzacam::app::service::AppService;
use stanzacam::config::SystemConfig;
use stanzacam::diagnostics;
use stanzacam::error::Error;
use stanzacam::shutdown::ShutdownFlag;

#[derive(Debug, Parser)]
#[command(name = "stanzacam", version, about = "Photo-booth controller")]
struct Cli {
    /// JSON config file; defaults are used if it does not exist.
    #[arg(long, default_value = "/etc/stanzacam/config.json")]
    config: PathBuf,

    /// Print the built-in configuration as JSON and exit.
    #[arg(long)]
    print_default_config: bool,

    /// Write the built-in configuration to `--config` and exit.
    #[arg(long, conflicts_with = "print_default_config")]
    write_default_config: bool,
}

/// Poems need the remote section enabled and an API key.
fn build_generator(config: &SystemConfig) -> Option<AnthropicGenerator> {
    if !config.remote.enabled {
        info!("Remote poems disabled in config");
        return None;
    }
    let env_key = std::env::var(API_KEY_ENV).ok();
    let Some(key) = AnthropicGenerator::resolve_api_key(&config.remote, env_key) else {
        warn!("No API key ({} or remote.api_key), printing photos only", API_KEY_ENV);
        return None;
    };
    match AnthropicGenerator::new(&config.remote, key) {
        Ok(g) => Some(g),
        Err(e) => {
            warn!("Remote generator unavailable ({}), printing photos only", e);
            None
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if cli.print_default_config {
        println!("{}", serde_json::to_string_pretty(&SystemConfig::default())?);
        return Ok(());
    }
    if cli.write_default_config {
        JsonConfigFile::new(&cli.config)
            .save(&SystemConfig::default())
            .with_context(|| format!("writing {}", cli.config.display()))?;
        println!("Wrote default configuration to {}", cli.config.display());
        return Ok(());
    }

    info!("StanzaCam v{}", env!("CARGO_PKG_VERSION"));
    diagnostics::install_panic_handler();

    let shutdown = ShutdownFlag::new();
    shutdown
        .install_interrupt_handler()
        .context("installing SIGINT handler")?;

    // ── Config ────────────────────────────────────────────────
    let config = JsonConfigFile::new(&cli.config)
        .load()
        .with_context(|| format!("loading {}", cli.config.display()))?;

    // ── Hardware ──────────────────────────────────────────────
    let panel = open_control_panel().context("requesting GPIO lines")?;
    let link = open_serial(&config.printer_device, config.printer_baud)
        .context("opening printer serial port")?;
    let printer = EscPosPrinter::new(link).context("initialising printer")?;
    let camera = RpicamCamera::start(config.camera_warmup()).context("starting camera")?;
    let mut hw = HardwareAdapter::new(panel, camera, printer);
    let mut generator = build_generator(&config);

    let mut clock = SystemClock::new();
    let mut sink = LogEventSink::new();
    let period = config.control_period();
    let mut app = AppService::new(config);
    app.start(&mut hw, &mut sink);

    // ── Control loop ──────────────────────────────────────────
    let outcome = loop {
        if shutdown.is_requested() {
            break Ok(());
        }
        let started = clock.uptime();
        let generator = generator.as_mut().map(|g| g as &mut dyn GeneratorPort);
        match app.tick(&mut hw, generator, &mut clock, &shutdown, &mut sink) {
            Ok(Some(job)) => info!(
                "Cycle done: {:?} ({})",
                job.outcome,
                job.image_path.display()
            ),
            Ok(None) => {}
            Err(Error::Interrupted) => break Ok(()),
            Err(e) => break Err(e),
        }
        clock.sleep_until(started + period);
    };

    // ── Teardown ──────────────────────────────────────────────
    app.shutdown(&mut hw, &mut sink);
    drop(hw);
    outcome.context("control loop aborted")?;
    info!("Stopped cleanly");
    Ok(())
}
