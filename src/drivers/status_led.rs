//! Tri-colour status LED inside the pushbutton.
//!
//! Common-anode part: a channel lights when its line is driven LOW.
//! The eight reachable colours are a fixed table of lit channels.

use embedded_hal::digital::OutputPin;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Colour {
    Red = 0,
    Green = 1,
    Blue = 2,
    Magenta = 3,
    Cyan = 4,
    Yellow = 5,
    White = 6,
    Off = 7,
}

/// Lit channels `[red, green, blue]`, indexed by `Colour as usize`.
const LIT: [[bool; 3]; 8] = [
    [true, false, false], // Red
    [false, true, false], // Green
    [false, false, true], // Blue
    [true, false, true],  // Magenta
    [false, true, true],  // Cyan
    [true, true, false],  // Yellow
    [true, true, true],   // White
    [false, false, false], // Off
];

impl Colour {
    pub const ALL: [Colour; 8] = [
        Colour::Red,
        Colour::Green,
        Colour::Blue,
        Colour::Magenta,
        Colour::Cyan,
        Colour::Yellow,
        Colour::White,
        Colour::Off,
    ];

    /// Which channels are lit.
    pub const fn lit(self) -> [bool; 3] {
        LIT[self as usize]
    }

    /// Line levels `[red, green, blue]` to drive, `true` = HIGH.
    pub const fn levels(self) -> [bool; 3] {
        let [r, g, b] = self.lit();
        [!r, !g, !b]
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Magenta => "magenta",
            Self::Cyan => "cyan",
            Self::Yellow => "yellow",
            Self::White => "white",
            Self::Off => "off",
        }
    }
}

/// Three output lines in `[red, green, blue]` order.
pub struct StatusLed<P: OutputPin> {
    pins: [P; 3],
    current: Colour,
}

impl<P: OutputPin> StatusLed<P> {
    /// Drives all lines HIGH (off) before returning.
    pub fn new(pins: [P; 3]) -> Result<Self, P::Error> {
        let mut led = Self {
            pins,
            current: Colour::Off,
        };
        led.set_colour(Colour::Off)?;
        Ok(led)
    }

    pub fn set_colour(&mut self, colour: Colour) -> Result<(), P::Error> {
        for (pin, high) in self.pins.iter_mut().zip(colour.levels()) {
            if high {
                pin.set_high()?;
            } else {
                pin.set_low()?;
            }
        }
        self.current = colour;
        Ok(())
    }

    pub fn current_colour(&self) -> Colour {
        self.current
    }
}
