//! Shared mutable context threaded through every capture-cycle handler.
//!
//! `CycleContext` borrows every collaborator the cycle drives for the
//! duration of one cycle and owns the [`CaptureJob`] being built.  Think of
//! it as the "blackboard": handlers read the job, act through the ports,
//! and write results back into the job.

use std::path::PathBuf;
use std::time::Duration;

use crate::app::ports::{BoothHardware, ClockPort, EventSink, GeneratorPort};
use crate::config::SystemConfig;
use crate::error::{InputFault, RemoteError};
use crate::indicator::{Indicator, IndicatorState};
use crate::input::StableSelection;
use crate::shutdown::ShutdownFlag;

// ---------------------------------------------------------------------------
// Capture job (one per cycle)
// ---------------------------------------------------------------------------

/// Why a cycle ended without a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    CameraUnavailable,
    PrinterUnreachable,
    ImageUnreadable,
    PrintFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Photo and poem printed.
    Printed,
    /// Photo printed alone, by configuration or after a generation failure.
    PrintedNoPoem,
    /// No confirmation within the window.
    Cancelled,
    Failed(FailureReason),
}

impl CaptureOutcome {
    pub const fn is_printed(self) -> bool {
        matches!(self, Self::Printed | Self::PrintedNoPoem)
    }
}

/// Everything known about one capture, from trigger to outcome.
#[derive(Debug, Clone)]
pub struct CaptureJob {
    /// Where the still was written.
    pub image_path: PathBuf,
    /// Rotary A position at trigger time, 1..=8.
    pub prompt_index: u8,
    /// Rotary B position at trigger time, 1..=8 (only 1..=4 select a model).
    pub model_index: u8,
    pub confirmed: bool,
    pub poem: Option<String>,
    pub generation_error: Option<RemoteError>,
    /// `None` until the cycle ends.
    pub outcome: Option<CaptureOutcome>,
}

impl CaptureJob {
    pub fn new(selection: StableSelection, image_path: PathBuf) -> Self {
        Self {
            image_path,
            prompt_index: selection.prompt_position(),
            model_index: selection.model_position(),
            confirmed: false,
            poem: None,
            generation_error: None,
            outcome: None,
        }
    }
}

// ---------------------------------------------------------------------------
// CycleContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct CycleContext<'a> {
    // -- Collaborators --
    pub hw: &'a mut dyn BoothHardware,
    /// `None` when remote generation is disabled or has no credentials.
    pub generator: Option<&'a mut dyn GeneratorPort>,
    pub clock: &'a mut dyn ClockPort,
    pub sink: &'a mut dyn EventSink,
    pub indicator: &'a mut Indicator,
    pub shutdown: &'a ShutdownFlag,

    // -- Configuration --
    pub config: &'a SystemConfig,

    // -- Job --
    /// `None` for a rejected press: no capture, so no job.
    pub job: Option<CaptureJob>,
    /// Input read failure seen inside a handler.  The engine aborts the
    /// cycle and propagates it.
    pub fault: Option<InputFault>,

    // -- Timing --
    /// Clock reading when the current phase was entered.
    pub phase_entered_at: Duration,

    // -- Per-phase scratch --
    /// Button level seen on the previous confirmation sample.
    pub button_was_down: bool,
    /// Remote attempts made so far this cycle.
    pub attempts: u8,
}

impl<'a> CycleContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        hw: &'a mut dyn BoothHardware,
        generator: Option<&'a mut dyn GeneratorPort>,
        clock: &'a mut dyn ClockPort,
        sink: &'a mut dyn EventSink,
        indicator: &'a mut Indicator,
        shutdown: &'a ShutdownFlag,
        config: &'a SystemConfig,
        job: Option<CaptureJob>,
    ) -> Self {
        let now = clock.uptime();
        Self {
            hw,
            generator,
            clock,
            sink,
            indicator,
            shutdown,
            config,
            job,
            fault: None,
            phase_entered_at: now,
            button_was_down: true,
            attempts: 0,
        }
    }

    /// Time since the current phase was entered.
    pub fn time_in_phase(&self) -> Duration {
        self.clock.uptime().saturating_sub(self.phase_entered_at)
    }

    pub fn show(&mut self, state: IndicatorState) {
        self.indicator.set_state(&mut *self.hw, state);
    }

    /// Record the outcome.  The first one recorded wins.
    pub fn finish(&mut self, outcome: CaptureOutcome) {
        if let Some(job) = self.job.as_mut() {
            if job.outcome.is_none() {
                job.outcome = Some(outcome);
            }
        }
    }

    /// Prompt and model for this job, `None` if either rotary position has
    /// no table entry.
    pub fn generation_selection(&self) -> Option<(&'a str, &'a str)> {
        let config: &'a SystemConfig = self.config;
        let job = self.job.as_ref()?;
        Some((config.prompt(job.prompt_index)?, config.model(job.model_index)?))
    }
}
