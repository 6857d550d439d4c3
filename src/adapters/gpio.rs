//! Linux GPIO character-device lines as `embedded-hal` pins.
//!
//! Each pin owns a one-line `gpiod` request.  Inputs are requested with the
//! pull-down bias the switches are wired for; outputs start HIGH, which is
//! "off" for the active-LOW LED.

use std::fmt;
use std::io;

use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin, OutputPin};
use gpiod::{Bias, Chip, Input, Lines, Options, Output};

use crate::adapters::hardware::ControlPanel;
use crate::drivers::button::PushButton;
use crate::drivers::rotary::RotarySwitch;
use crate::drivers::status_led::StatusLed;
use crate::pins::{
    BUTTON_GPIO, GPIO_CHIP, GPIO_CONSUMER, LED_BLUE_GPIO, LED_GREEN_GPIO, LED_RED_GPIO,
    ROTARY_A_GPIOS, ROTARY_B_GPIOS,
};

/// I/O failure on a GPIO line request.
#[derive(Debug)]
pub struct GpioError {
    pub line: u32,
    pub source: io::Error,
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO{}: {}", self.line, self.source)
    }
}

impl std::error::Error for GpioError {}

impl digital::Error for GpioError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

// ── Input ─────────────────────────────────────────────────────

pub struct GpioInput {
    line: u32,
    request: Lines<Input>,
}

impl GpioInput {
    pub fn new(chip: &Chip, line: u32) -> Result<Self, GpioError> {
        let opts = Options::input([line])
            .bias(Bias::PullDown)
            .consumer(GPIO_CONSUMER);
        let request = chip
            .request_lines(opts)
            .map_err(|source| GpioError { line, source })?;
        Ok(Self { line, request })
    }

    fn level(&self) -> Result<bool, GpioError> {
        let [value] = self
            .request
            .get_values([false; 1])
            .map_err(|source| GpioError {
                line: self.line,
                source,
            })?;
        Ok(value)
    }
}

impl ErrorType for GpioInput {
    type Error = GpioError;
}

impl InputPin for GpioInput {
    fn is_high(&mut self) -> Result<bool, GpioError> {
        self.level()
    }

    fn is_low(&mut self) -> Result<bool, GpioError> {
        self.level().map(|v| !v)
    }
}

// ── Output ────────────────────────────────────────────────────

pub struct GpioOutput {
    line: u32,
    request: Lines<Output>,
}

impl GpioOutput {
    /// Requested HIGH.
    pub fn new(chip: &Chip, line: u32) -> Result<Self, GpioError> {
        let opts = Options::output([line])
            .values([true])
            .consumer(GPIO_CONSUMER);
        let request = chip
            .request_lines(opts)
            .map_err(|source| GpioError { line, source })?;
        Ok(Self { line, request })
    }

    fn drive(&mut self, high: bool) -> Result<(), GpioError> {
        self.request
            .set_values([high])
            .map_err(|source| GpioError {
                line: self.line,
                source,
            })
    }
}

impl ErrorType for GpioOutput {
    type Error = GpioError;
}

impl OutputPin for GpioOutput {
    fn set_low(&mut self) -> Result<(), GpioError> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), GpioError> {
        self.drive(true)
    }
}

// ── Board bring-up ────────────────────────────────────────────

/// Every line the control panel uses, requested from the board chip.
pub struct PanelLines {
    pub rotary_a: [GpioInput; 8],
    pub rotary_b: [GpioInput; 8],
    pub button: GpioInput,
    /// `[red, green, blue]`
    pub led: [GpioOutput; 3],
}

impl PanelLines {
    pub fn request() -> Result<Self, GpioError> {
        let chip = Chip::new(GPIO_CHIP).map_err(|source| GpioError { line: 0, source })?;
        log::info!("GPIO: using {} ({} lines)", GPIO_CHIP, chip.num_lines());
        Ok(Self {
            rotary_a: inputs(&chip, ROTARY_A_GPIOS)?,
            rotary_b: inputs(&chip, ROTARY_B_GPIOS)?,
            button: GpioInput::new(&chip, BUTTON_GPIO)?,
            led: [
                GpioOutput::new(&chip, LED_RED_GPIO)?,
                GpioOutput::new(&chip, LED_GREEN_GPIO)?,
                GpioOutput::new(&chip, LED_BLUE_GPIO)?,
            ],
        })
    }

    /// Wrap the lines in their drivers.  The LED is switched off.
    pub fn into_panel(self) -> Result<ControlPanel<GpioInput, GpioOutput>, GpioError> {
        Ok(ControlPanel::new(
            RotarySwitch::new("rotary A", self.rotary_a),
            RotarySwitch::new("rotary B", self.rotary_b),
            PushButton::new(self.button),
            StatusLed::new(self.led)?,
        ))
    }
}

/// Request every panel line and build the control panel.
pub fn open_control_panel() -> Result<ControlPanel<GpioInput, GpioOutput>, GpioError> {
    PanelLines::request()?.into_panel()
}

fn inputs(chip: &Chip, lines: [u32; 8]) -> Result<[GpioInput; 8], GpioError> {
    let mut out = Vec::with_capacity(8);
    for line in lines {
        out.push(GpioInput::new(chip, line)?);
    }
    out.try_into().map_err(|_| GpioError {
        line: 0,
        source: io::Error::other("rotary line count"),
    })
}
