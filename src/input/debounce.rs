//! Edge detector with a settle loop for the rotary switches.
//!
//! A rotary switch briefly reads 0 while its wiper travels between detents.
//! Whenever a tick's snapshot differs from the last reported one, the
//! debouncer keeps re-polling at the settle interval until both rotaries
//! read a defined position, then reports the settled snapshot once.
//!
//! The settle loop has no timeout: a disconnected switch blocks here
//! forever.  Only a shutdown request breaks it.

use std::time::Duration;

use log::{debug, warn};

use super::{InputSnapshot, StableSelection};
use crate::app::ports::{ClockPort, InputPort};
use crate::error::{Error, Result};
use crate::shutdown::ShutdownFlag;

pub struct SelectionDebouncer {
    /// Last reported snapshot.  Starts at `{0, 0, false}` so the first
    /// settled read always counts as a change.
    previous: InputSnapshot,
    settle_interval: Duration,
}

impl SelectionDebouncer {
    pub fn new(settle_interval: Duration) -> Self {
        Self {
            previous: InputSnapshot::default(),
            settle_interval,
        }
    }

    /// Feed this tick's raw snapshot.
    ///
    /// Returns `Some` exactly when a settled snapshot differs from the last
    /// one reported.  A raw change that settles back to the previous value
    /// (a rotary bounced through 0 and returned) is swallowed.
    pub fn update<I: InputPort + ?Sized>(
        &mut self,
        raw: InputSnapshot,
        input: &mut I,
        clock: &mut dyn ClockPort,
        shutdown: &ShutdownFlag,
    ) -> Result<Option<StableSelection>> {
        if raw == self.previous {
            return Ok(None);
        }

        let mut settled = raw;
        let mut polls: u32 = 0;
        while !settled.rotaries_defined() {
            if shutdown.is_requested() {
                return Err(Error::Interrupted);
            }
            clock.sleep(self.settle_interval);
            settled = input.poll()?;
            polls = polls.saturating_add(1);
            if polls == 250 {
                warn!(
                    "DEBOUNCE: rotary still undefined after {} polls (A={}, B={}), check wiring",
                    polls, settled.rotary_a, settled.rotary_b
                );
            }
        }

        if settled == self.previous {
            debug!("DEBOUNCE: transient settled back to {:?}", settled);
            return Ok(None);
        }

        self.previous = settled;
        Ok(StableSelection::new(settled))
    }

    /// Last accepted selection, `None` before the first settle.
    pub fn stable(&self) -> Option<StableSelection> {
        StableSelection::new(self.previous)
    }

    /// Last reported snapshot (may be the initial all-zero value).
    pub fn previous(&self) -> InputSnapshot {
        self.previous
    }
}
