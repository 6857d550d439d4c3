//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (GPIO panel, camera, printer, generator, clock, event
//! sinks, config storage) implement these traits.  The
//! [`AppService`](super::service::AppService) and the capture cycle consume
//! them as trait objects, so the domain core never touches hardware
//! directly and every test can substitute scripted fakes.
//!
//! All port errors are typed; callers must handle every variant explicitly.

use std::path::Path;
use std::time::Duration;

use image::GrayImage;

use crate::config::{RenderMode, SystemConfig};
use crate::drivers::status_led::Colour;
use crate::error::{CameraError, InputFault, PrinterError, RemoteError};
use crate::input::InputSnapshot;

// ───────────────────────────────────────────────────────────────
// Input port (driven adapter: switches → domain)
// ───────────────────────────────────────────────────────────────

/// Reads both rotary switches and the pushbutton in one pass.
pub trait InputPort {
    /// Non-blocking, unfiltered.  A read fault is fatal to the caller.
    fn poll(&mut self) -> Result<InputSnapshot, InputFault>;
}

// ───────────────────────────────────────────────────────────────
// Camera port
// ───────────────────────────────────────────────────────────────

/// Per-frame autofocus status as reported by the camera stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AfState {
    Idle = 0,
    Scanning = 1,
    Focused = 2,
    Failed = 3,
}

impl AfState {
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Idle),
            1 => Some(Self::Scanning),
            2 => Some(Self::Focused),
            3 => Some(Self::Failed),
            _ => None,
        }
    }

    /// Only `Focused` counts toward the focus lock.
    pub const fn is_focused(self) -> bool {
        matches!(self, Self::Focused)
    }
}

pub trait CameraPort {
    /// Autofocus status of the most recent frame.
    fn autofocus_state(&mut self) -> Result<AfState, CameraError>;

    /// Write a still to `path`, replacing any previous file.
    fn capture_still(&mut self, path: &Path) -> Result<(), CameraError>;
}

// ───────────────────────────────────────────────────────────────
// Printer port
// ───────────────────────────────────────────────────────────────

/// Thermal receipt printer.  Bitmap framing is the adapter's concern; the
/// domain hands over an already-resized greyscale image.
pub trait PrinterPort {
    /// Discard anything pending in both serial directions.
    fn reset_buffers(&mut self) -> Result<(), PrinterError>;

    fn send_raw(&mut self, bytes: &[u8]) -> Result<(), PrinterError>;

    /// Bytes the printer has sent back since the last call (may be empty).
    fn read_available(&mut self) -> Result<Vec<u8>, PrinterError>;

    /// Print one pre-wrapped block of text followed by a line feed.
    fn print_text(&mut self, text: &str) -> Result<(), PrinterError>;

    fn print_image(&mut self, image: &GrayImage, mode: RenderMode) -> Result<(), PrinterError>;

    /// Advance the paper by `lines` blank lines.
    fn feed(&mut self, lines: u8) -> Result<(), PrinterError>;
}

// ───────────────────────────────────────────────────────────────
// Indicator port (driven adapter: domain → LED)
// ───────────────────────────────────────────────────────────────

pub trait IndicatorPort {
    /// Best effort.  Adapters log write failures instead of returning them:
    /// a stuck LED must not abort a print.
    fn set_colour(&mut self, colour: Colour);
}

// ───────────────────────────────────────────────────────────────
// Generator port (driven adapter: domain → remote image-to-text service)
// ───────────────────────────────────────────────────────────────

/// One image-to-poem request.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    /// Encoded image file contents.
    pub image: &'a [u8],
    /// MIME type of `image`, e.g. `image/jpeg`.
    pub media_type: &'a str,
    pub prompt: &'a str,
    pub model: &'a str,
    pub max_tokens: u32,
}

pub trait GeneratorPort {
    /// Blocking; may take as long as the adapter's request timeout.
    fn generate(&mut self, request: &GenerationRequest<'_>) -> Result<String, RemoteError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source.  Every timed wait in the domain goes through
/// this so tests can run on a simulated clock.
pub trait ClockPort {
    /// Time since an arbitrary fixed origin.
    fn uptime(&self) -> Duration;

    fn sleep(&mut self, duration: Duration);

    /// Sleep until `uptime() >= deadline`.  Returns at once if already past.
    fn sleep_until(&mut self, deadline: Duration) {
        let now = self.uptime();
        if deadline > now {
            self.sleep(deadline - now);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate values before persisting.  Invalid
/// ranges are rejected with [`ConfigError::ValidationFailed`], not
/// silently clamped.
pub trait ConfigPort {
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Aggregate
// ───────────────────────────────────────────────────────────────

/// Everything the capture cycle drives locally.  Implemented for any type
/// that provides all four ports.
pub trait BoothHardware: InputPort + CameraPort + PrinterPort + IndicatorPort {}

impl<T: InputPort + CameraPort + PrinterPort + IndicatorPort> BoothHardware for T {}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// Stored config failed to deserialize.
    Corrupted(String),
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError(String),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted(msg) => write!(f, "config corrupted: {}", msg),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
