//! System configuration parameters
//!
//! All tunable parameters for the StanzaCam controller.
//! Values can be overridden by a JSON file (see `adapters::config_file`);
//! any field missing from the file keeps its default.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Number of rotary positions mapped to prompts.
pub const PROMPT_SLOTS: usize = 8;
/// Number of rotary positions mapped to models.
pub const MODEL_SLOTS: usize = 4;

/// How the photo is transferred to the printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// `ESC *` 24-dot column stripes.  Avoids the vertical stretch some
    /// printers show in raster mode, at the cost of faint stripe seams.
    Column,
    /// `GS v 0` raster block.
    Raster,
}

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Timing ---
    /// Control loop interval (milliseconds), 20 ms = 50 Hz
    pub control_loop_interval_ms: u32,
    /// Re-poll interval while a rotary reads "no position" (milliseconds)
    pub settle_poll_interval_ms: u32,
    /// Consecutive focused ticks required before capture is allowed
    pub focus_lock_ticks: u8,
    /// Window for the confirmation press after a capture (milliseconds)
    pub confirm_timeout_ms: u32,
    /// Button sampling interval during the confirmation window (milliseconds)
    pub confirm_poll_interval_ms: u32,
    /// Time the printer gets to answer a status request (milliseconds)
    pub printer_status_wait_ms: u32,
    /// Autofocus settling time after the camera stream starts (milliseconds)
    pub camera_warmup_ms: u32,

    // --- Capture ---
    /// Where each still is written (overwritten every cycle)
    pub capture_path: PathBuf,
    /// Clockwise rotation applied after capture: 0, 90, 180 or 270
    pub rotate_degrees: u16,
    /// Optional centred crop `[width, height]` applied after rotation
    pub crop: Option<[u32; 2]>,
    /// If set, every capture is also copied here with a timestamped name
    pub archive_dir: Option<PathBuf>,

    // --- Printer ---
    /// Serial device of the thermal printer
    pub printer_device: String,
    /// Serial baud rate
    pub printer_baud: u32,
    /// Printable width in dots
    pub print_width_px: u32,
    /// Characters per printed line
    pub text_columns: usize,
    /// Image transfer mode
    pub render_mode: RenderMode,
    /// Optional line printed above the photo
    pub receipt_header: Option<String>,

    // --- Remote generation ---
    pub remote: RemoteConfig,
}

/// Remote poem generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Master switch; when false every cycle prints the photo only
    pub enabled: bool,
    /// Messages endpoint
    pub endpoint: String,
    /// Value of the `anthropic-version` header
    pub api_version: String,
    /// API key; `ANTHROPIC_API_KEY` in the environment takes precedence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Output token cap per request
    pub max_tokens: u32,
    /// Whole-request timeout (seconds)
    pub timeout_secs: u32,
    /// Attempts per cycle for transient failures (rate limit, connection)
    pub max_attempts: u8,
    /// Pause between attempts (milliseconds)
    pub retry_backoff_ms: u32,
    /// Captures with a longer edge are scaled down and re-encoded as JPEG
    /// before upload
    pub max_image_edge_px: u32,
    /// Prompt per rotary A position (1-based)
    pub prompts: Vec<String>,
    /// Model identifier per rotary B position (1-based)
    pub models: Vec<String>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Timing
            control_loop_interval_ms: 20, // 50 Hz
            settle_poll_interval_ms: 20,
            focus_lock_ticks: 10, // ~200 ms of sustained focus
            confirm_timeout_ms: 3000,
            confirm_poll_interval_ms: 10,
            printer_status_wait_ms: 200,
            camera_warmup_ms: 3000,

            // Capture
            capture_path: PathBuf::from("/tmp/stanzacam/capture.jpg"),
            rotate_degrees: 0,
            crop: None,
            archive_dir: None,

            // Printer
            printer_device: "/dev/serial0".into(),
            printer_baud: 9600,
            print_width_px: 384, // 48 mm effective on 58 mm paper
            text_columns: 32,
            render_mode: RenderMode::Column,
            receipt_header: None,

            remote: RemoteConfig::default(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://api.anthropic.com/v1/messages".into(),
            api_version: "2023-06-01".into(),
            api_key: None,
            max_tokens: 300,
            timeout_secs: 30,
            max_attempts: 2,
            retry_backoff_ms: 1000,
            max_image_edge_px: 1568,
            prompts: default_prompts(),
            models: vec![
                "claude-sonnet-4-5-20250929".into(),
                "claude-haiku-4-5".into(),
                "claude-opus-4-1".into(),
                "claude-sonnet-4-20250514".into(),
            ],
        }
    }
}

const PROMPT_FOOTER: &str = "Keep lines short (under 32 characters each) so they fit \
on a small thermal receipt printer. Only output the poem, nothing else.";

fn default_prompts() -> Vec<String> {
    [
        "Look at this photo and write a short, whimsical poem about what you see, \
         4-8 lines long. Capture the mood or essence of the image.",
        "Look at this photo and write a single haiku (5-7-5) about it.",
        "Look at this photo and write a limerick about what you see.",
        "Look at this photo and write a short rhyming poem in couplets, \
         6-8 lines long, in the style of a classic sonnet.",
        "Look at this photo and write a short sea shanty verse about it, \
         as a pirate would sing it.",
        "Look at this photo and write a short hard-boiled noir monologue \
         about it, 4-8 lines, as free verse.",
        "Look at this photo and write a short, over-the-top heroic ode \
         to what you see, 4-8 lines long.",
        "Look at this photo and write a short, gentle, good-natured roast \
         of what you see as a rhyming poem, 4-8 lines long.",
    ]
    .iter()
    .map(|p| format!("{p} {PROMPT_FOOTER}"))
    .collect()
}

impl SystemConfig {
    pub fn control_period(&self) -> Duration {
        Duration::from_millis(u64::from(self.control_loop_interval_ms))
    }

    pub fn settle_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.settle_poll_interval_ms))
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.confirm_timeout_ms))
    }

    pub fn confirm_poll_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.confirm_poll_interval_ms))
    }

    pub fn printer_status_wait(&self) -> Duration {
        Duration::from_millis(u64::from(self.printer_status_wait_ms))
    }

    pub fn camera_warmup(&self) -> Duration {
        Duration::from_millis(u64::from(self.camera_warmup_ms))
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(u64::from(self.remote.retry_backoff_ms))
    }

    /// Prompt for a rotary A position.  `None` for 0 or out-of-range.
    pub fn prompt(&self, position: u8) -> Option<&str> {
        slot(&self.remote.prompts, position, PROMPT_SLOTS)
    }

    /// Model identifier for a rotary B position.  `None` for 0 or
    /// out-of-range (positions 5-8 disable generation).
    pub fn model(&self, position: u8) -> Option<&str> {
        slot(&self.remote.models, position, MODEL_SLOTS)
    }

    /// Reject values that would wedge the control loop or the printer.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.control_loop_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "control_loop_interval_ms must be > 0",
            ));
        }
        if self.settle_poll_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "settle_poll_interval_ms must be > 0",
            ));
        }
        if self.focus_lock_ticks == 0 {
            return Err(ConfigError::ValidationFailed("focus_lock_ticks must be > 0"));
        }
        if self.confirm_timeout_ms == 0 || self.confirm_poll_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "confirmation timeout and poll interval must be > 0",
            ));
        }
        if self.print_width_px == 0 || self.print_width_px % 8 != 0 {
            return Err(ConfigError::ValidationFailed(
                "print_width_px must be a non-zero multiple of 8",
            ));
        }
        if self.text_columns == 0 {
            return Err(ConfigError::ValidationFailed("text_columns must be > 0"));
        }
        if !matches!(self.rotate_degrees, 0 | 90 | 180 | 270) {
            return Err(ConfigError::ValidationFailed(
                "rotate_degrees must be 0, 90, 180 or 270",
            ));
        }
        if let Some([w, h]) = self.crop {
            if w == 0 || h == 0 {
                return Err(ConfigError::ValidationFailed("crop dimensions must be > 0"));
            }
        }
        if self.remote.prompts.len() > PROMPT_SLOTS {
            return Err(ConfigError::ValidationFailed("at most 8 prompts"));
        }
        if self.remote.models.len() > MODEL_SLOTS {
            return Err(ConfigError::ValidationFailed("at most 4 models"));
        }
        if self.remote.max_attempts == 0 {
            return Err(ConfigError::ValidationFailed("remote.max_attempts must be >= 1"));
        }
        if self.remote.max_image_edge_px == 0 {
            return Err(ConfigError::ValidationFailed("remote.max_image_edge_px must be > 0"));
        }
        Ok(())
    }
}

fn slot(table: &[String], position: u8, slots: usize) -> Option<&str> {
    let idx = usize::from(position).checked_sub(1)?;
    if idx >= slots {
        return None;
    }
    table
        .get(idx)
        .map(String::as_str)
        .filter(|s| !s.trim().is_empty())
}
