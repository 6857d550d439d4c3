//! StanzaCam field diagnostics.
//!
//! Runs every component check in order, without the capture cycle:
//!
//! 1. LED sweep (all colours at 1 s, then at 0.5 s)
//! 2. Printer status check and test page
//! 3. Camera focus wait and test capture (fatal on camera failure)
//! 4. Live switch readout until Ctrl-C

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{info, warn};

use stanzacam::adapters::camera::RpicamCamera;
use stanzacam::adapters::config_file::JsonConfigFile;
use stanzacam::adapters::gpio::open_control_panel;
use stanzacam::adapters::printer::{EscPosPrinter, open_serial};
use stanzacam::adapters::time::SystemClock;
use stanzacam::app::ports::ConfigPort;
use stanzacam::diagnostics::{self, SWEEP_DWELLS};
use stanzacam::error::Error;
use stanzacam::input::InputSnapshot;
use stanzacam::shutdown::ShutdownFlag;

#[derive(Debug, Parser)]
#[command(name = "syscheck", version, about = "StanzaCam hardware check")]
struct Cli {
    #[arg(long, default_value = "/etc/stanzacam/config.json")]
    config: PathBuf,

    /// Where the camera test still is written.
    #[arg(long, default_value = "/tmp/stanzacam/syscheck.jpg")]
    capture: PathBuf,

    /// Give up on focus after this many seconds (waits forever if unset).
    #[arg(long)]
    focus_timeout: Option<u64>,

    /// Skip the printer test page.
    #[arg(long)]
    no_print: bool,
}

const FOCUS_POLL: Duration = Duration::from_millis(100);
const READOUT_INTERVAL: Duration = Duration::from_millis(100);

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    diagnostics::install_panic_handler();

    let shutdown = ShutdownFlag::new();
    shutdown
        .install_interrupt_handler()
        .context("installing SIGINT handler")?;
    let config = JsonConfigFile::new(&cli.config)
        .load()
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let mut clock = SystemClock::new();

    info!("SYSCHECK: beginning system check");
    let mut panel = open_control_panel().context("requesting GPIO lines")?;

    // ── 1. LED ────────────────────────────────────────────────
    info!("SYSCHECK: testing pushbutton LED");
    for dwell in SWEEP_DWELLS {
        diagnostics::led_sweep(&mut panel, &mut clock, dwell);
    }

    // ── 2. Printer ────────────────────────────────────────────
    info!("SYSCHECK: testing thermal printer");
    match open_serial(&config.printer_device, config.printer_baud)
        .and_then(EscPosPrinter::new)
    {
        Ok(mut printer) if !cli.no_print => {
            if let Err(e) = diagnostics::printer_echo_test(
                &mut printer,
                &mut clock,
                config.printer_status_wait(),
                config.render_mode,
                config.print_width_px,
            ) {
                warn!("SYSCHECK: printer test failed: {}", e);
            }
        }
        Ok(_) => info!("SYSCHECK: printer opened, test page skipped"),
        Err(e) => warn!("SYSCHECK: printer unavailable: {}", e),
    }

    // ── 3. Camera ─────────────────────────────────────────────
    info!("SYSCHECK: testing camera");
    let mut camera = RpicamCamera::start(config.camera_warmup()).context("camera not detected")?;
    let limit = cli.focus_timeout.map(Duration::from_secs);
    let still = cli.capture.as_path();
    match diagnostics::camera_check(&mut camera, &mut clock, FOCUS_POLL, limit, &shutdown, still) {
        Ok(()) => {}
        Err(Error::Interrupted) => return Ok(()),
        Err(e) => bail!("camera test failed: {e}"),
    }
    drop(camera);

    // ── 4. Switches ───────────────────────────────────────────
    info!("SYSCHECK: reading rotary switches and pushbutton (Ctrl-C to stop)");
    let mut stdout = std::io::stdout();
    let show = |s: &InputSnapshot| {
        // Rewrite the same three lines in place.
        let _ = write!(
            stdout,
            "Rotary Switch 1:  {}\nRotary Switch 2:  {}\nPushbutton State: {}\n\x1b[3A",
            s.rotary_a,
            s.rotary_b,
            u8::from(s.button)
        );
        let _ = stdout.flush();
    };
    let reads =
        diagnostics::switch_readout(&mut panel, &mut clock, READOUT_INTERVAL, &shutdown, show)
            .context("switch readout")?;
    println!("\n\n");
    info!("SYSCHECK: stopped after {} reads", reads);
    Ok(())
}
