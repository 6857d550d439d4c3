//! Status indicator: semantic states mapped onto the tri-colour LED.
//!
//! | State           | Colour  |
//! |-----------------|---------|
//! | Idle            | magenta |
//! | Focused         | green   |
//! | Unfocused       | red     |
//! | Capturing       | yellow  |
//! | AwaitingConfirm | white   |
//! | Generating      | cyan    |
//! | Success         | blue    |
//! | Failure         | red     |
//! | Off             | off     |
//!
//! Flashes block the caller for their whole duration.  Timing is driven by
//! deadlines against the [`ClockPort`], so a flash never drifts and runs
//! instantly on a simulated clock.

use std::time::Duration;

use log::debug;

use crate::app::ports::{ClockPort, IndicatorPort};
use crate::drivers::status_led::Colour;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorState {
    Idle,
    Focused,
    Unfocused,
    Capturing,
    AwaitingConfirm,
    Generating,
    Success,
    Failure,
    Off,
}

impl IndicatorState {
    pub const fn colour(self) -> Colour {
        match self {
            Self::Idle => Colour::Magenta,
            Self::Focused => Colour::Green,
            Self::Unfocused | Self::Failure => Colour::Red,
            Self::Capturing => Colour::Yellow,
            Self::AwaitingConfirm => Colour::White,
            Self::Generating => Colour::Cyan,
            Self::Success => Colour::Blue,
            Self::Off => Colour::Off,
        }
    }
}

/// A colour blinked against off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashPattern {
    pub colour: Colour,
    pub repetitions: u8,
    /// Length of each on and each off half.
    pub interval: Duration,
}

impl FlashPattern {
    /// Button pressed without focus lock.
    pub const REJECTED: Self = Self::new(Colour::Red, 3, 200);
    /// Still written to disk.
    pub const CAPTURED: Self = Self::new(Colour::Blue, 5, 200);
    /// Receipt printed.
    pub const SUCCESS: Self = Self::new(Colour::Blue, 2, 250);
    /// Cycle ended in a failure.
    pub const FAILURE: Self = Self::new(Colour::Red, 3, 200);

    pub const fn new(colour: Colour, repetitions: u8, interval_ms: u64) -> Self {
        Self {
            colour,
            repetitions,
            interval: Duration::from_millis(interval_ms),
        }
    }

    pub fn duration(&self) -> Duration {
        self.interval * 2 * u32::from(self.repetitions)
    }
}

/// Tracks the last state written so changes can be logged.
#[derive(Debug)]
pub struct Indicator {
    state: IndicatorState,
}

impl Default for Indicator {
    fn default() -> Self {
        Self::new()
    }
}

impl Indicator {
    pub fn new() -> Self {
        Self {
            state: IndicatorState::Off,
        }
    }

    /// Write the state's colour.  Called every tick; the port is written
    /// each time so a glitched line recovers on the next tick.
    pub fn set_state<P: IndicatorPort + ?Sized>(&mut self, port: &mut P, state: IndicatorState) {
        if state != self.state {
            debug!("INDICATOR: {:?} -> {:?} ({})", self.state, state, state.colour().name());
            self.state = state;
        }
        port.set_colour(state.colour());
    }

    /// Blink `pattern`, leaving the LED off.
    pub fn flash<P: IndicatorPort + ?Sized>(
        &mut self,
        port: &mut P,
        clock: &mut dyn ClockPort,
        pattern: FlashPattern,
    ) {
        let start = clock.uptime();
        let mut deadline = start;
        for _ in 0..pattern.repetitions {
            port.set_colour(pattern.colour);
            deadline += pattern.interval;
            clock.sleep_until(deadline);
            port.set_colour(Colour::Off);
            deadline += pattern.interval;
            clock.sleep_until(deadline);
        }
        self.state = IndicatorState::Off;
    }

    pub fn state(&self) -> IndicatorState {
        self.state
    }
}
