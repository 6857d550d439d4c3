//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the debouncer, the focus tracker, the indicator
//! state and the capture-cycle FSM.  All I/O flows through port traits
//! injected at call sites, making the entire service testable with mock
//! adapters.
//!
//! ```text
//!   InputPort  ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!   CameraPort ──▶ │          AppService          │
//!                  │ Debounce · Focus · Cycle FSM │ ──▶ PrinterPort
//! GeneratorPort ◀──│                              │ ──▶ IndicatorPort
//!                  └──────────────────────────────┘
//! ```

use log::{info, warn};

use crate::config::SystemConfig;
use crate::error::Result;
use crate::focus::{FocusState, FocusTracker};
use crate::fsm::context::{CaptureJob, CaptureOutcome, CycleContext};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, Phase};
use crate::indicator::{FlashPattern, Indicator, IndicatorState};
use crate::input::{SelectionDebouncer, StableSelection};
use crate::shutdown::ShutdownFlag;

use super::events::AppEvent;
use super::ports::{BoothHardware, ClockPort, EventSink, GeneratorPort, IndicatorPort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    config: SystemConfig,
    fsm: Fsm,
    debouncer: SelectionDebouncer,
    focus: FocusTracker,
    indicator: Indicator,
    /// Set while the camera keeps failing so the fault is logged once.
    camera_fault_active: bool,
    tick_count: u64,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Does **not** touch any port; call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Self {
        Self {
            fsm: Fsm::new(build_state_table()),
            debouncer: SelectionDebouncer::new(config.settle_interval()),
            focus: FocusTracker::new(config.focus_lock_ticks),
            indicator: Indicator::new(),
            camera_fault_active: false,
            tick_count: 0,
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Show the idle colour and announce readiness.
    pub fn start(&mut self, hw: &mut impl IndicatorPort, sink: &mut impl EventSink) {
        self.indicator.set_state(hw, IndicatorState::Idle);
        sink.emit(&AppEvent::Started);
        info!(
            "AppService started: focus lock after {} ticks, {} ms loop",
            self.focus.threshold(),
            self.config.control_loop_interval_ms
        );
    }

    /// Turn the indicator off.  Called once on the way out.
    pub fn shutdown(&mut self, hw: &mut impl IndicatorPort, sink: &mut impl EventSink) {
        self.indicator.set_state(hw, IndicatorState::Off);
        sink.emit(&AppEvent::Stopped);
        info!("AppService stopped after {} ticks", self.tick_count);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control tick: read inputs → focus → indicator → debounce →
    /// capture cycle if the settled change carries a press.
    ///
    /// Returns the finished job when a capture cycle ran.  A rejected
    /// press creates no job.  Only input faults and interrupts during the
    /// settle loop are returned as errors.
    pub fn tick(
        &mut self,
        hw: &mut impl BoothHardware,
        generator: Option<&mut dyn GeneratorPort>,
        clock: &mut impl ClockPort,
        shutdown: &ShutdownFlag,
        sink: &mut impl EventSink,
    ) -> Result<Option<CaptureJob>> {
        self.tick_count += 1;

        // 1. Inputs
        let raw = hw.poll()?;

        // 2. Focus
        let focused = match hw.autofocus_state() {
            Ok(state) => {
                if self.camera_fault_active {
                    info!("Camera autofocus status available again");
                    self.camera_fault_active = false;
                }
                state.is_focused()
            }
            Err(e) => {
                if !self.camera_fault_active {
                    warn!("Camera autofocus status unavailable, treating as unfocused: {}", e);
                    self.camera_fault_active = true;
                }
                false
            }
        };
        let was_locked = self.focus.state().locked;
        let focus = self.focus.update(focused);
        if focus.locked && !was_locked {
            info!("Focus achieved");
            sink.emit(&AppEvent::FocusLocked);
        } else if !focus.locked && was_locked {
            info!("Lost focus");
            sink.emit(&AppEvent::FocusLost);
        }

        // 3. Indicator
        let shown = if focus.locked {
            IndicatorState::Focused
        } else {
            IndicatorState::Unfocused
        };
        self.indicator.set_state(hw, shown);

        // 4. Settled transition
        let Some(selection) = self.debouncer.update(raw, hw, clock, shutdown)? else {
            return Ok(None);
        };
        info!(
            "Selection: prompt {} model {} button {}",
            selection.prompt_position(),
            selection.model_position(),
            if selection.button_pressed() { "pressed" } else { "released" }
        );
        sink.emit(&AppEvent::SelectionChanged(selection));

        if !selection.button_pressed() {
            return Ok(None);
        }

        // 5. Orchestrate
        let (entry, job) = if focus.locked {
            self.focus.reset();
            let job = CaptureJob::new(selection, self.config.capture_path.clone());
            (Phase::Capturing, Some(job))
        } else {
            (Phase::Rejected, None)
        };

        let generator: Option<&mut dyn GeneratorPort> = match generator {
            Some(g) if self.config.remote.enabled => Some(g),
            _ => None,
        };
        let mut ctx = CycleContext::new(
            &mut *hw,
            generator,
            &mut *clock,
            &mut *sink,
            &mut self.indicator,
            shutdown,
            &self.config,
            job,
        );
        let result = self.fsm.run_cycle(entry, &mut ctx);
        let job = ctx.job.take();
        drop(ctx);
        result?;

        let Some(job) = job else {
            return Ok(None);
        };
        let outcome = job.outcome.unwrap_or(CaptureOutcome::Cancelled);
        match outcome {
            CaptureOutcome::Printed | CaptureOutcome::PrintedNoPoem => {
                self.indicator.set_state(hw, IndicatorState::Success);
                self.indicator.flash(hw, clock, FlashPattern::SUCCESS);
            }
            CaptureOutcome::Failed(reason) => {
                warn!("Capture cycle failed: {:?}", reason);
                self.indicator.set_state(hw, IndicatorState::Failure);
                self.indicator.flash(hw, clock, FlashPattern::FAILURE);
            }
            CaptureOutcome::Cancelled => {}
        }
        sink.emit(&AppEvent::CycleFinished(outcome));
        Ok(Some(job))
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn focus_state(&self) -> FocusState {
        self.focus.state()
    }

    pub fn current_phase(&self) -> Phase {
        self.fsm.current_phase()
    }

    pub fn stable_selection(&self) -> Option<StableSelection> {
        self.debouncer.stable()
    }

    pub fn indicator_state(&self) -> IndicatorState {
        self.indicator.state()
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }
}
