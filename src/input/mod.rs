//! Digital input snapshot and the debounce stage that validates it.
//!
//! ```text
//!   InputPort::poll() ──▶ InputSnapshot ──▶ SelectionDebouncer ──▶ StableSelection
//!        (raw, may hold 0)                      (settle loop)         (never 0)
//! ```

pub mod debounce;

pub use debounce::SelectionDebouncer;

/// One atomic read of both rotary switches and the pushbutton.
///
/// A rotary value of `0` means "no line active": the switch is between
/// detents or disconnected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputSnapshot {
    /// Prompt selector, 0..=8.
    pub rotary_a: u8,
    /// Model selector, 0..=8.
    pub rotary_b: u8,
    /// `true` while the pushbutton is held.
    pub button: bool,
}

impl InputSnapshot {
    pub const fn new(rotary_a: u8, rotary_b: u8, button: bool) -> Self {
        Self {
            rotary_a,
            rotary_b,
            button,
        }
    }

    /// Both rotaries rest on a defined position.
    pub const fn rotaries_defined(&self) -> bool {
        self.rotary_a != 0 && self.rotary_b != 0
    }
}

/// A snapshot that survived the settle loop.  Cannot hold a `0` rotary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StableSelection(InputSnapshot);

impl StableSelection {
    /// `None` if either rotary is undefined.
    pub const fn new(snapshot: InputSnapshot) -> Option<Self> {
        if snapshot.rotaries_defined() {
            Some(Self(snapshot))
        } else {
            None
        }
    }

    /// Rotary A position, 1..=8.
    pub const fn prompt_position(&self) -> u8 {
        self.0.rotary_a
    }

    /// Rotary B position, 1..=8.
    pub const fn model_position(&self) -> u8 {
        self.0.rotary_b
    }

    pub const fn button_pressed(&self) -> bool {
        self.0.button
    }

    pub const fn snapshot(&self) -> InputSnapshot {
        self.0
    }
}
