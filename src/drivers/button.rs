//! Illuminated pushbutton contact.
//!
//! Normally-open switch to 3V3 with the line pulled down: HIGH = pressed.
//! No gesture detection here; press edges are derived by the debouncer and
//! by the confirmation wait, which both need the raw level.

use embedded_hal::digital::InputPin;

use crate::error::InputFault;

pub struct PushButton<P: InputPin> {
    pin: P,
}

impl<P: InputPin> PushButton<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    pub fn is_pressed(&mut self) -> Result<bool, InputFault> {
        self.pin
            .is_high()
            .map_err(|e| InputFault::new("pushbutton", format!("{e:?}")))
    }
}
