//! Focus-lock tracker.
//!
//! Turns the per-frame autofocus status into a binary "ready to shoot"
//! signal.  The counter climbs by one per focused tick up to the threshold
//! and drops to zero on any unfocused tick, so a single blurred frame
//! releases the lock.

/// Counter state after the latest update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FocusState {
    pub consecutive_focused_ticks: u8,
    /// Implies `consecutive_focused_ticks >= threshold`.
    pub locked: bool,
}

#[derive(Debug)]
pub struct FocusTracker {
    threshold: u8,
    state: FocusState,
}

impl FocusTracker {
    /// `threshold` of 0 is treated as 1.
    pub fn new(threshold: u8) -> Self {
        Self {
            threshold: threshold.max(1),
            state: FocusState::default(),
        }
    }

    pub fn update(&mut self, focused: bool) -> FocusState {
        let ticks = if focused {
            self.state
                .consecutive_focused_ticks
                .saturating_add(1)
                .min(self.threshold)
        } else {
            0
        };
        self.state = FocusState {
            consecutive_focused_ticks: ticks,
            locked: ticks >= self.threshold,
        };
        self.state
    }

    /// Drop the lock.  Called when a capture starts so the next shot needs
    /// a fresh lock.
    pub fn reset(&mut self) {
        self.state = FocusState::default();
    }

    pub fn state(&self) -> FocusState {
        self.state
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }
}
