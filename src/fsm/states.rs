//! Concrete phase handler functions and table builder.
//!
//! Each phase is defined by plain `fn` pointers, no closures.
//!
//! ```text
//!  IDLE ──[press, focus locked]──▶ CAPTURING ──[still saved]──▶ AWAITING_CONFIRMATION
//!    ▲                                 │                          │        │
//!    │                           [camera error]              [timeout]  [fresh press]
//!    │◀────────────────────────────────┘                          │        │
//!    │◀───────────────────────────────────────────────────────────┘   printer check
//!    │◀──────────────────────────────────────[no answer]──────────────────┤
//!    │                                                                    │
//!    │                                   [generation configured]  [not configured]
//!    │                                              ▼                     │
//!    │                                         GENERATING ──[poem | error]┤
//!    │                                                                    ▼
//!    └────────────────────────────[receipt done]────────────────────── PRINTING
//!
//!  IDLE ──[press, no focus lock]──▶ REJECTED ──[flash done]──▶ IDLE
//! ```
//!
//! While printing the indicator shows the busy (capturing) colour.

use chrono::Local;
use log::{info, warn};

use super::context::{CaptureOutcome, CycleContext, FailureReason};
use super::{Phase, StateDescriptor};
use crate::app::events::AppEvent;
use crate::app::ports::GenerationRequest;
use crate::error::RemoteError;
use crate::imaging;
use crate::indicator::{FlashPattern, IndicatorState};
use crate::receipt::{self, Receipt};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static phase table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; Phase::COUNT] {
    [
        // Index 0: Idle
        StateDescriptor {
            id: Phase::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_update: idle_update,
        },
        // Index 1: Capturing
        StateDescriptor {
            id: Phase::Capturing,
            name: "Capturing",
            on_enter: Some(capturing_enter),
            on_update: capturing_update,
        },
        // Index 2: AwaitingConfirmation
        StateDescriptor {
            id: Phase::AwaitingConfirmation,
            name: "AwaitingConfirmation",
            on_enter: Some(awaiting_enter),
            on_update: awaiting_update,
        },
        // Index 3: Generating
        StateDescriptor {
            id: Phase::Generating,
            name: "Generating",
            on_enter: Some(generating_enter),
            on_update: generating_update,
        },
        // Index 4: Printing
        StateDescriptor {
            id: Phase::Printing,
            name: "Printing",
            on_enter: Some(printing_enter),
            on_update: printing_update,
        },
        // Index 5: Rejected
        StateDescriptor {
            id: Phase::Rejected,
            name: "Rejected",
            on_enter: Some(rejected_enter),
            on_update: rejected_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE: resting between cycles
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut CycleContext<'_>) {
    if let Some(outcome) = ctx.job.as_ref().and_then(|j| j.outcome) {
        info!("IDLE: cycle finished with {:?}", outcome);
    }
}

fn idle_update(_ctx: &mut CycleContext<'_>) -> Option<Phase> {
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  CAPTURING: still to disk, optional orient and archive
// ═══════════════════════════════════════════════════════════════════════════

fn capturing_enter(ctx: &mut CycleContext<'_>) {
    ctx.show(IndicatorState::Capturing);
    info!("CAPTURING: taking still");
}

fn capturing_update(ctx: &mut CycleContext<'_>) -> Option<Phase> {
    let Some(path) = ctx.job.as_ref().map(|j| j.image_path.clone()) else {
        return Some(Phase::Idle);
    };

    if let Err(e) = ctx.hw.capture_still(&path) {
        warn!("CAPTURING: {}", e);
        ctx.finish(CaptureOutcome::Failed(FailureReason::CameraUnavailable));
        return Some(Phase::Idle);
    }

    if ctx.config.rotate_degrees != 0 || ctx.config.crop.is_some() {
        let oriented = imaging::load(&path).map(|img| {
            imaging::orient(img, ctx.config.rotate_degrees, ctx.config.crop)
        });
        if let Err(e) = oriented.and_then(|img| imaging::save(&img, &path)) {
            warn!("CAPTURING: could not orient still: {}", e);
            ctx.finish(CaptureOutcome::Failed(FailureReason::ImageUnreadable));
            return Some(Phase::Idle);
        }
    }

    if let Some(dir) = ctx.config.archive_dir.as_deref() {
        match imaging::archive_copy(&path, dir, Local::now()) {
            Ok(dest) => info!("CAPTURING: archived as {}", dest.display()),
            Err(e) => warn!("CAPTURING: archive copy failed: {}", e),
        }
    }

    info!("CAPTURING: saved {}", path.display());
    ctx.indicator
        .flash(&mut *ctx.hw, &mut *ctx.clock, FlashPattern::CAPTURED);
    Some(Phase::AwaitingConfirmation)
}

// ═══════════════════════════════════════════════════════════════════════════
//  AWAITING_CONFIRMATION: bounded wait for a fresh press
// ═══════════════════════════════════════════════════════════════════════════

fn awaiting_enter(ctx: &mut CycleContext<'_>) {
    ctx.show(IndicatorState::AwaitingConfirm);
    // A button still held from the trigger press must be released first.
    ctx.button_was_down = true;
    info!(
        "AWAITING: press within {:.1}s to print",
        ctx.config.confirm_timeout().as_secs_f32()
    );
}

fn awaiting_update(ctx: &mut CycleContext<'_>) -> Option<Phase> {
    if ctx.shutdown.is_requested() {
        info!("AWAITING: shutdown requested, discarding capture");
        ctx.finish(CaptureOutcome::Cancelled);
        return Some(Phase::Idle);
    }

    let pressed = match ctx.hw.poll() {
        Ok(snapshot) => snapshot.button,
        Err(fault) => {
            ctx.fault = Some(fault);
            ctx.finish(CaptureOutcome::Cancelled);
            return Some(Phase::Idle);
        }
    };
    let fresh_press = pressed && !ctx.button_was_down;
    ctx.button_was_down = pressed;

    if fresh_press {
        if let Some(job) = ctx.job.as_mut() {
            job.confirmed = true;
        }
        info!("AWAITING: confirmed, probing printer");
        return after_confirmation(ctx);
    }

    if ctx.time_in_phase() >= ctx.config.confirm_timeout() {
        info!("AWAITING: no confirmation, capture discarded");
        ctx.finish(CaptureOutcome::Cancelled);
        return Some(Phase::Idle);
    }

    ctx.clock.sleep(ctx.config.confirm_poll_interval());
    None
}

fn after_confirmation(ctx: &mut CycleContext<'_>) -> Option<Phase> {
    match receipt::printer_online(&mut *ctx.hw, &mut *ctx.clock, ctx.config.printer_status_wait()) {
        Ok(true) => {}
        Ok(false) => {
            warn!("AWAITING: printer not connected, print abandoned");
            ctx.finish(CaptureOutcome::Failed(FailureReason::PrinterUnreachable));
            return Some(Phase::Idle);
        }
        Err(e) => {
            warn!("AWAITING: printer status check failed: {}", e);
            ctx.finish(CaptureOutcome::Failed(FailureReason::PrinterUnreachable));
            return Some(Phase::Idle);
        }
    }

    if ctx.generator.is_some() && ctx.generation_selection().is_some() {
        Some(Phase::Generating)
    } else {
        Some(Phase::Printing)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  GENERATING: remote poem, one attempt per tick
// ═══════════════════════════════════════════════════════════════════════════

fn generating_enter(ctx: &mut CycleContext<'_>) {
    ctx.show(IndicatorState::Generating);
    ctx.attempts = 0;
    if let Some(job) = ctx.job.as_ref() {
        info!(
            "GENERATING: prompt {} with model {}",
            job.prompt_index, job.model_index
        );
    }
}

fn generating_update(ctx: &mut CycleContext<'_>) -> Option<Phase> {
    let Some((prompt, model)) = ctx.generation_selection() else {
        return Some(Phase::Printing);
    };
    let Some(path) = ctx.job.as_ref().map(|j| j.image_path.clone()) else {
        return Some(Phase::Idle);
    };
    let (image, media_type) =
        match imaging::upload_payload(&path, ctx.config.remote.max_image_edge_px) {
            Ok(payload) => payload,
            Err(e) => {
                // Printing reports the unreadable image.
                warn!("GENERATING: cannot prepare upload: {}", e);
                return Some(Phase::Printing);
            }
        };

    let request = GenerationRequest {
        image: &image,
        media_type,
        prompt,
        model,
        max_tokens: ctx.config.remote.max_tokens,
    };
    let Some(generator) = ctx.generator.as_deref_mut() else {
        return Some(Phase::Printing);
    };
    ctx.attempts = ctx.attempts.saturating_add(1);
    let result = generator
        .generate(&request)
        .and_then(|text| {
            if text.trim().is_empty() {
                Err(RemoteError::UnexpectedResponse("empty text".into()))
            } else {
                Ok(text)
            }
        });

    match result {
        Ok(poem) => {
            info!("GENERATING: poem received ({} chars)", poem.chars().count());
            if let Some(job) = ctx.job.as_mut() {
                job.poem = Some(poem);
            }
            Some(Phase::Printing)
        }
        Err(e) if e.is_transient() && ctx.attempts < ctx.config.remote.max_attempts => {
            warn!(
                "GENERATING: attempt {} failed ({}), retrying",
                ctx.attempts, e
            );
            ctx.clock.sleep(ctx.config.retry_backoff());
            None
        }
        Err(e) => {
            warn!("GENERATING: giving up after {} attempt(s): {}", ctx.attempts, e);
            ctx.sink.emit(&AppEvent::GenerationFailed {
                error: e.clone(),
                attempts: ctx.attempts,
            });
            if let Some(job) = ctx.job.as_mut() {
                job.generation_error = Some(e);
            }
            Some(Phase::Printing)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  PRINTING: photo plus poem or marker
// ═══════════════════════════════════════════════════════════════════════════

fn printing_enter(ctx: &mut CycleContext<'_>) {
    ctx.show(IndicatorState::Capturing);
    info!("PRINTING: sending receipt");
}

fn printing_update(ctx: &mut CycleContext<'_>) -> Option<Phase> {
    let Some(job) = ctx.job.as_ref() else {
        return Some(Phase::Idle);
    };

    let photo = match imaging::load(&job.image_path) {
        Ok(img) => img,
        Err(e) => {
            warn!("PRINTING: {}", e);
            ctx.finish(CaptureOutcome::Failed(FailureReason::ImageUnreadable));
            return Some(Phase::Idle);
        }
    };
    let raster = imaging::prepare_for_print(&photo, ctx.config.print_width_px);
    let has_poem = job.poem.is_some();
    let receipt = Receipt::new(
        ctx.config.receipt_header.as_deref(),
        &raster,
        job.poem.as_deref(),
        job.generation_error.as_ref().map(RemoteError::marker),
        ctx.config.text_columns,
    );
    let printed = receipt.print(&mut *ctx.hw, ctx.config.render_mode, ctx.config.text_columns);

    match printed {
        Ok(()) if has_poem => ctx.finish(CaptureOutcome::Printed),
        Ok(()) => ctx.finish(CaptureOutcome::PrintedNoPoem),
        Err(e) => {
            warn!("PRINTING: {}", e);
            ctx.finish(CaptureOutcome::Failed(FailureReason::PrintFailed));
        }
    }
    Some(Phase::Idle)
}

// ═══════════════════════════════════════════════════════════════════════════
//  REJECTED: press without focus lock
// ═══════════════════════════════════════════════════════════════════════════

fn rejected_enter(ctx: &mut CycleContext<'_>) {
    info!("REJECTED: not in focus, no capture");
    ctx.sink.emit(&AppEvent::CaptureRejected);
}

fn rejected_update(ctx: &mut CycleContext<'_>) -> Option<Phase> {
    ctx.indicator
        .flash(&mut *ctx.hw, &mut *ctx.clock, FlashPattern::REJECTED);
    Some(Phase::Idle)
}
