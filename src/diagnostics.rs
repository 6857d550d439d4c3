//! Field diagnostics.
//!
//! Each check drives one component on its own, outside the capture cycle,
//! so a technician can tell which part of a booth is broken.  The
//! `syscheck` binary runs them in order: LED sweep, printer echo, camera
//! focus, then a live switch readout until interrupted.

use std::path::Path;
use std::time::Duration;

use image::{GrayImage, Luma};
use log::{info, warn};

use crate::app::ports::{CameraPort, ClockPort, IndicatorPort, InputPort, PrinterPort};
use crate::config::RenderMode;
use crate::drivers::status_led::Colour;
use crate::error::{CameraError, Error, PrinterError, Result};
use crate::input::InputSnapshot;
use crate::receipt::printer_online;
use crate::shutdown::ShutdownFlag;

/// Dwell per colour for the two LED passes.
pub const SWEEP_DWELLS: [Duration; 2] = [Duration::from_millis(1000), Duration::from_millis(500)];

/// Three full rows on a 32-column printer.
pub const TEST_TEXT: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUV\
                             abcdefghijklmnopqrstuvwxyz!?#*+=\
                             ================================";

const PATTERN_HEIGHT: u32 = 96;

// ── LED ───────────────────────────────────────────────────────

/// Show every colour for `dwell`, ending on off.
pub fn led_sweep<P: IndicatorPort + ?Sized>(
    led: &mut P,
    clock: &mut dyn ClockPort,
    dwell: Duration,
) {
    for colour in Colour::ALL {
        led.set_colour(colour);
        clock.sleep(dwell);
    }
}

// ── Printer ───────────────────────────────────────────────────

/// Horizontal grey ramp inside a one-dot black border.
pub fn test_pattern(width: u32) -> GrayImage {
    let w = width.max(2);
    GrayImage::from_fn(w, PATTERN_HEIGHT, |x, y| {
        if x == 0 || y == 0 || x == w - 1 || y == PATTERN_HEIGHT - 1 {
            Luma([0])
        } else {
            Luma([(x * 255 / (w - 1)) as u8])
        }
    })
}

/// Ask the printer for its status and, if it answers, print the test text and pattern.
///
/// Returns `Ok(false)` when the printer stays silent.
pub fn printer_echo_test<P: PrinterPort + ?Sized>(
    printer: &mut P,
    clock: &mut dyn ClockPort,
    status_wait: Duration,
    mode: RenderMode,
    width: u32,
) -> core::result::Result<bool, PrinterError> {
    if !printer_online(printer, clock, status_wait)? {
        warn!("SYSCHECK: no response from printer");
        return Ok(false);
    }
    info!("SYSCHECK: printer responding, printing test page");
    printer.print_text(TEST_TEXT)?;
    printer.print_image(&test_pattern(width), mode)?;
    printer.feed(2)?;
    Ok(true)
}

// ── Camera ────────────────────────────────────────────────────

/// Block until the camera reports focus.
///
/// Camera errors end the wait at once.  `limit` of `None` waits forever,
/// or until `shutdown` is requested.
pub fn wait_for_focus<C: CameraPort + ?Sized>(
    camera: &mut C,
    clock: &mut dyn ClockPort,
    poll: Duration,
    limit: Option<Duration>,
    shutdown: &ShutdownFlag,
) -> Result<Duration> {
    let started = clock.uptime();
    loop {
        if camera.autofocus_state()?.is_focused() {
            return Ok(clock.uptime() - started);
        }
        if shutdown.is_requested() {
            return Err(Error::Interrupted);
        }
        let waited = clock.uptime() - started;
        if limit.is_some_and(|l| waited >= l) {
            return Err(CameraError::Unavailable(format!("no focus after {:?}", waited)).into());
        }
        clock.sleep(poll);
    }
}

/// Wait for focus, then take a still to `path`.
pub fn camera_check<C: CameraPort + ?Sized>(
    camera: &mut C,
    clock: &mut dyn ClockPort,
    poll: Duration,
    limit: Option<Duration>,
    shutdown: &ShutdownFlag,
    path: &Path,
) -> Result<()> {
    let waited = wait_for_focus(camera, clock, poll, limit, shutdown)?;
    info!("SYSCHECK: focus achieved after {:?}, capturing", waited);
    camera.capture_still(path)?;
    info!("SYSCHECK: image captured to {}", path.display());
    Ok(())
}

// ── Switches ──────────────────────────────────────────────────

/// Read the switches every `interval` and hand each raw snapshot to
/// `report` until shutdown.  Returns the number of reads.
pub fn switch_readout<I: InputPort + ?Sized>(
    input: &mut I,
    clock: &mut dyn ClockPort,
    interval: Duration,
    shutdown: &ShutdownFlag,
    mut report: impl FnMut(&InputSnapshot),
) -> Result<u64> {
    let mut reads = 0;
    while !shutdown.is_requested() {
        let snapshot = input.poll()?;
        reads += 1;
        report(&snapshot);
        clock.sleep(interval);
    }
    Ok(reads)
}

// ───────────────────────────────────────────────────────────────
// Panic hook
// ───────────────────────────────────────────────────────────────

/// Log the panic reason before the default hook prints the backtrace.
pub fn install_panic_handler() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let reason = if let Some(msg) = info.payload().downcast_ref::<&str>() {
            *msg
        } else if let Some(msg) = info.payload().downcast_ref::<String>() {
            msg.as_str()
        } else {
            "unknown panic"
        };
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();
        log::error!("PANIC: {} at {}", reason, location);
        default_hook(info);
    }));
}
