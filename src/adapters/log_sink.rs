//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing one structured line per application
//! event through the `log` facade (stderr via `env_logger` in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::fsm::context::CaptureOutcome;

/// Adapter that logs every [`AppEvent`] to the console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => {
                info!("START | ready");
            }
            AppEvent::SelectionChanged(sel) => {
                info!(
                    "INPUT | prompt={} model={} button={}",
                    sel.prompt_position(),
                    sel.model_position(),
                    if sel.button_pressed() { "down" } else { "up" },
                );
            }
            AppEvent::FocusLocked => {
                info!("FOCUS | locked");
            }
            AppEvent::FocusLost => {
                info!("FOCUS | lost");
            }
            AppEvent::PhaseChanged { from, to } => {
                info!("CYCLE | {:?} -> {:?}", from, to);
            }
            AppEvent::CaptureRejected => {
                info!("CYCLE | rejected, not focused");
            }
            AppEvent::GenerationFailed { error, attempts } => {
                warn!("POEM  | failed after {} attempt(s): {}", attempts, error);
            }
            AppEvent::CycleFinished(outcome) => match outcome {
                CaptureOutcome::Failed(reason) => warn!("CYCLE | failed: {:?}", reason),
                other => info!("CYCLE | finished: {:?}", other),
            },
            AppEvent::Stopped => {
                info!("STOP  | outputs released");
            }
        }
    }
}
