//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! [`ControlPanel`] owns the switch and LED drivers and exposes them
//! through [`InputPort`] and [`IndicatorPort`].  [`HardwareAdapter`] adds
//! the camera and printer so one value satisfies
//! [`BoothHardware`](crate::app::ports::BoothHardware).  Both are generic
//! over the pin, camera and printer types, so host tests drive them with
//! in-memory fakes.

use std::path::Path;

use embedded_hal::digital::{InputPin, OutputPin};
use image::GrayImage;
use log::warn;

use crate::app::ports::{AfState, CameraPort, IndicatorPort, InputPort, PrinterPort};
use crate::config::RenderMode;
use crate::drivers::button::PushButton;
use crate::drivers::rotary::RotarySwitch;
use crate::drivers::status_led::{Colour, StatusLed};
use crate::error::{CameraError, InputFault, PrinterError};
use crate::input::InputSnapshot;

/// Two rotary switches, the pushbutton and its LED.
pub struct ControlPanel<I: InputPin, O: OutputPin> {
    rotary_a: RotarySwitch<I>,
    rotary_b: RotarySwitch<I>,
    button: PushButton<I>,
    led: StatusLed<O>,
}

impl<I: InputPin, O: OutputPin> ControlPanel<I, O> {
    pub fn new(
        rotary_a: RotarySwitch<I>,
        rotary_b: RotarySwitch<I>,
        button: PushButton<I>,
        led: StatusLed<O>,
    ) -> Self {
        Self {
            rotary_a,
            rotary_b,
            button,
            led,
        }
    }
}

// ── InputPort implementation ──────────────────────────────────

impl<I: InputPin, O: OutputPin> InputPort for ControlPanel<I, O> {
    fn poll(&mut self) -> Result<InputSnapshot, InputFault> {
        Ok(InputSnapshot {
            rotary_a: self.rotary_a.position()?,
            rotary_b: self.rotary_b.position()?,
            button: self.button.is_pressed()?,
        })
    }
}

// ── IndicatorPort implementation ──────────────────────────────

impl<I: InputPin, O: OutputPin> IndicatorPort for ControlPanel<I, O> {
    fn set_colour(&mut self, colour: Colour) {
        if let Err(e) = self.led.set_colour(colour) {
            warn!("LED: failed to show {}: {:?}", colour.name(), e);
        }
    }
}

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<I: InputPin, O: OutputPin, C, P> {
    pub panel: ControlPanel<I, O>,
    pub camera: C,
    pub printer: P,
}

impl<I: InputPin, O: OutputPin, C: CameraPort, P: PrinterPort> HardwareAdapter<I, O, C, P> {
    pub fn new(panel: ControlPanel<I, O>, camera: C, printer: P) -> Self {
        Self {
            panel,
            camera,
            printer,
        }
    }
}

impl<I: InputPin, O: OutputPin, C, P> InputPort for HardwareAdapter<I, O, C, P> {
    fn poll(&mut self) -> Result<InputSnapshot, InputFault> {
        self.panel.poll()
    }
}

impl<I: InputPin, O: OutputPin, C, P> IndicatorPort for HardwareAdapter<I, O, C, P> {
    fn set_colour(&mut self, colour: Colour) {
        self.panel.set_colour(colour);
    }
}

impl<I: InputPin, O: OutputPin, C: CameraPort, P> CameraPort for HardwareAdapter<I, O, C, P> {
    fn autofocus_state(&mut self) -> Result<AfState, CameraError> {
        self.camera.autofocus_state()
    }

    fn capture_still(&mut self, path: &Path) -> Result<(), CameraError> {
        self.camera.capture_still(path)
    }
}

impl<I: InputPin, O: OutputPin, C, P: PrinterPort> PrinterPort for HardwareAdapter<I, O, C, P> {
    fn reset_buffers(&mut self) -> Result<(), PrinterError> {
        self.printer.reset_buffers()
    }

    fn send_raw(&mut self, bytes: &[u8]) -> Result<(), PrinterError> {
        self.printer.send_raw(bytes)
    }

    fn read_available(&mut self) -> Result<Vec<u8>, PrinterError> {
        self.printer.read_available()
    }

    fn print_text(&mut self, text: &str) -> Result<(), PrinterError> {
        self.printer.print_text(text)
    }

    fn print_image(&mut self, image: &GrayImage, mode: RenderMode) -> Result<(), PrinterError> {
        self.printer.print_image(image, mode)
    }

    fn feed(&mut self, lines: u8) -> Result<(), PrinterError> {
        self.printer.feed(lines)
    }
}
