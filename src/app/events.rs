//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) and the capture cycle
//! emit these through the [`EventSink`](super::ports::EventSink) port.
//! Adapters on the other side decide what to do with them: the production
//! sink logs one line per event, tests record them.

use crate::error::RemoteError;
use crate::fsm::Phase;
use crate::fsm::context::CaptureOutcome;
use crate::input::StableSelection;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started and the indicator shows idle.
    Started,

    /// The debouncer accepted a new settled selection.
    SelectionChanged(StableSelection),

    /// Focus held for the full lock threshold.
    FocusLocked,

    /// A locked focus was lost.
    FocusLost,

    /// The capture cycle moved between phases.
    PhaseChanged { from: Phase, to: Phase },

    /// Button pressed without focus lock; no capture was taken.
    CaptureRejected,

    /// The remote poem request failed after all attempts.
    GenerationFailed { error: RemoteError, attempts: u8 },

    /// A capture cycle ended.
    CycleFinished(CaptureOutcome),

    /// The service released its outputs.
    Stopped,
}
