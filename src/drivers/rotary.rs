//! 8-position rotary switch read as eight mutually-exclusive lines.
//!
//! Each detent closes one contact to 3V3; the lines are pulled down, so a
//! HIGH line marks the current position.  Between detents no line is HIGH
//! and the switch reads 0.

use embedded_hal::digital::InputPin;

use crate::error::InputFault;

/// Number of detents.
pub const POSITIONS: usize = 8;

pub struct RotarySwitch<P: InputPin> {
    name: &'static str,
    lines: [P; POSITIONS],
}

impl<P: InputPin> RotarySwitch<P> {
    /// `lines[0]` is position 1.
    pub fn new(name: &'static str, lines: [P; POSITIONS]) -> Self {
        Self { name, lines }
    }

    /// 1-based index of the first HIGH line, 0 if none.
    pub fn position(&mut self) -> Result<u8, InputFault> {
        for (idx, line) in self.lines.iter_mut().enumerate() {
            let high = line.is_high().map_err(|e| {
                InputFault::new(format!("{} line {}", self.name, idx + 1), format!("{e:?}"))
            })?;
            if high {
                return Ok(idx as u8 + 1);
            }
        }
        Ok(0)
    }
}
