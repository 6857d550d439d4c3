//! Function-pointer finite state machine engine for the capture cycle.
//!
//! Classic embedded FSM pattern:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  StateTable                                          │
//! │  ┌──────────────────────┬──────────┬────────────────┐ │
//! │  │ Phase                │ on_enter │ on_update      │ │
//! │  ├──────────────────────┼──────────┼────────────────┤ │
//! │  │ Idle                 │ fn(ctx)  │ fn -> Option<> │ │
//! │  │ Capturing            │ fn(ctx)  │ fn -> Option<> │ │
//! │  │ AwaitingConfirmation │ fn(ctx)  │ fn -> Option<> │ │
//! │  │ Generating           │ fn(ctx)  │ fn -> Option<> │ │
//! │  │ Printing             │ fn(ctx)  │ fn -> Option<> │ │
//! │  │ Rejected             │ fn(ctx)  │ fn -> Option<> │ │
//! │  └──────────────────────┴──────────┴────────────────┘ │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** phase.
//! If it returns `Some(next)`, the engine moves the current pointer and
//! runs `on_enter` for the next phase.  Handlers time themselves against
//! the clock (`CycleContext::time_in_phase`), not against tick counts.
//!
//! Unlike a free-running control FSM, a capture cycle runs to completion:
//! [`Fsm::run_cycle`] enters the entry phase and ticks until the machine is
//! back in `Idle`.  The control loop is blocked for the whole cycle.

pub mod context;
pub mod states;

use context::CycleContext;
use log::info;

use crate::app::events::AppEvent;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Phase identity
// ---------------------------------------------------------------------------

/// Enumeration of all capture-cycle phases.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Phase {
    Idle = 0,
    Capturing = 1,
    AwaitingConfirmation = 2,
    Generating = 3,
    Printing = 4,
    Rejected = 5,
}

impl Phase {
    /// Total number of phases, used to size the table array.
    pub const COUNT: usize = 6;

    /// Convert an index back to `Phase`.  Panics on out-of-range in
    /// debug builds; returns `Idle` in release.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::Capturing,
            2 => Self::AwaitingConfirmation,
            3 => Self::Generating,
            4 => Self::Printing,
            5 => Self::Rejected,
            _ => {
                debug_assert!(false, "invalid phase index: {idx}");
                Self::Idle
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` actions.
/// These run exactly once on each transition.
pub type StateActionFn = fn(&mut CycleContext<'_>);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut CycleContext<'_>) -> Option<Phase>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single phase.
pub struct StateDescriptor {
    pub id: Phase,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The capture-cycle state machine.
///
/// Owns the phase table.  The [`CycleContext`] is built per cycle by the
/// caller and threaded through every handler call.
pub struct Fsm {
    /// Fixed-size table indexed by `Phase as usize`.
    table: [StateDescriptor; Phase::COUNT],
    /// Index of the currently active phase.
    current: usize,
}

impl Fsm {
    /// Construct a new FSM with the given table, resting in `Idle`.
    pub fn new(table: [StateDescriptor; Phase::COUNT]) -> Self {
        Self {
            table,
            current: Phase::Idle as usize,
        }
    }

    /// Enter `entry` and tick until the machine returns to `Idle`.
    ///
    /// An input fault raised inside a handler aborts the cycle: the
    /// machine is forced back to `Idle` and the fault is returned.
    pub fn run_cycle(&mut self, entry: Phase, ctx: &mut CycleContext<'_>) -> Result<()> {
        self.force_transition(entry, ctx);
        while self.current_phase() != Phase::Idle {
            self.tick(ctx);
            if let Some(fault) = ctx.fault.take() {
                self.force_transition(Phase::Idle, ctx);
                return Err(Error::InputTransport(fault));
            }
        }
        Ok(())
    }

    /// Advance the FSM by one tick.
    ///
    /// 1. Call `on_update` for the current phase.
    /// 2. If it returns `Some(next)`, execute the transition:
    ///    update pointer → `on_enter(next)`.
    pub fn tick(&mut self, ctx: &mut CycleContext<'_>) {
        let next = (self.table[self.current].on_update)(ctx);

        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    /// Force an immediate transition regardless of what `on_update` would
    /// return.  No-op if already in `next`.
    pub fn force_transition(&mut self, next: Phase, ctx: &mut CycleContext<'_>) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    /// The current phase's identity.
    pub fn current_phase(&self) -> Phase {
        Phase::from_index(self.current)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: Phase, ctx: &mut CycleContext<'_>) {
        let from = self.current_phase();
        let next_idx = next_id as usize;

        info!(
            "CYCLE transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );
        ctx.sink.emit(&AppEvent::PhaseChanged { from, to: next_id });

        self.current = next_idx;
        ctx.phase_entered_at = ctx.clock.uptime();

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
