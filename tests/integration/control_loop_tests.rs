//! Control loop behaviour outside the capture cycle: settling, focus lock,
//! indicator, fatal input faults and interrupts.

use super::mock_hw::{Booth, ms};

use stanzacam::app::events::AppEvent;
use stanzacam::drivers::status_led::Colour;
use stanzacam::error::Error;
use stanzacam::fsm::context::CaptureOutcome;
use stanzacam::indicator::IndicatorState;
use stanzacam::input::InputSnapshot;

fn selections(booth: &Booth) -> Vec<InputSnapshot> {
    booth
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::SelectionChanged(sel) => Some(sel.snapshot()),
            _ => None,
        })
        .collect()
}

#[test]
fn start_shows_idle_and_shutdown_turns_led_off() {
    let mut booth = Booth::new();
    assert_eq!(booth.hw.colours, vec![Colour::Magenta]);
    assert_eq!(booth.sink.events, vec![AppEvent::Started]);

    booth.app.shutdown(&mut booth.hw, &mut booth.sink);
    assert_eq!(booth.hw.colours.last(), Some(&Colour::Off));
    assert_eq!(booth.sink.events.last(), Some(&AppEvent::Stopped));
}

#[test]
fn one_selection_change_per_real_change() {
    let mut booth = Booth::new();
    booth
        .hw
        .at(ms(0), 1, 1, false)
        // A turned one detent: wiper reads 0 for 40 ms.
        .at(ms(100), 0, 1, false)
        .at(ms(140), 2, 1, false)
        // Bumped and sprang back to the same detent.
        .at(ms(300), 0, 1, false)
        .at(ms(330), 2, 1, false);
    booth.run_until(ms(500)).unwrap();

    assert_eq!(
        selections(&booth),
        vec![
            InputSnapshot::new(1, 1, false),
            InputSnapshot::new(2, 1, false)
        ]
    );
    assert_eq!(
        booth.app.stable_selection().map(|s| s.snapshot()),
        Some(InputSnapshot::new(2, 1, false))
    );
}

#[test]
fn unsettled_reads_never_reported() {
    let mut booth = Booth::new();
    booth.hw.at(ms(0), 3, 0, false).at(ms(200), 3, 4, false);
    booth.run_until(ms(300)).unwrap();

    let seen = selections(&booth);
    assert_eq!(seen, vec![InputSnapshot::new(3, 4, false)]);
    assert!(seen.iter().all(InputSnapshot::rotaries_defined));
}

#[test]
fn focus_locks_after_exactly_ten_ticks() {
    let mut booth = Booth::new();
    booth.hw.at(ms(0), 1, 1, false);

    for _ in 0..9 {
        booth.tick(None).unwrap();
    }
    assert!(!booth.app.focus_state().locked);
    assert_eq!(booth.app.indicator_state(), IndicatorState::Unfocused);
    assert_eq!(booth.hw.colours.last(), Some(&Colour::Red));

    booth.tick(None).unwrap();
    assert!(booth.app.focus_state().locked);
    assert_eq!(booth.app.indicator_state(), IndicatorState::Focused);
    assert_eq!(booth.hw.colours.last(), Some(&Colour::Green));
    assert_eq!(booth.sink.count(|e| *e == AppEvent::FocusLocked), 1);

    booth.hw.focused = false;
    booth.tick(None).unwrap();
    assert!(!booth.app.focus_state().locked);
    assert_eq!(booth.app.focus_state().consecutive_focused_ticks, 0);
    assert_eq!(booth.hw.colours.last(), Some(&Colour::Red));
    assert_eq!(booth.sink.count(|e| *e == AppEvent::FocusLost), 1);
}

#[test]
fn camera_status_errors_count_as_unfocused() {
    let mut booth = Booth::new();
    booth.hw.at(ms(0), 1, 1, false);
    booth.hw.af_broken = true;
    for _ in 0..20 {
        booth.tick(None).unwrap();
    }
    assert!(!booth.app.focus_state().locked);

    booth.hw.af_broken = false;
    for _ in 0..10 {
        booth.tick(None).unwrap();
    }
    assert!(booth.app.focus_state().locked);
}

#[test]
fn input_fault_is_fatal() {
    let mut booth = Booth::new();
    booth.hw.at(ms(0), 1, 1, false);
    booth.hw.input_fault_at = Some(ms(100));
    let err = booth.run_until(ms(1000)).unwrap_err();
    assert!(matches!(err, Error::InputTransport(_)));
    assert!(booth.now() <= ms(120));
}

#[test]
fn input_fault_while_awaiting_confirmation_aborts_cycle() {
    let mut booth = Booth::new();
    booth.hw.at(ms(0), 1, 1, false).press(ms(300), ms(100), 1, 1);
    booth.hw.input_fault_at = Some(ms(2500));
    let err = booth.run_until(ms(6000)).unwrap_err();
    assert!(matches!(err, Error::InputTransport(_)));
    assert_eq!(booth.hw.captures.len(), 1);
    assert!(booth.hw.printer.is_empty());
}

#[test]
fn shutdown_breaks_the_settle_loop() {
    let mut booth = Booth::new();
    // The wiper never reaches a detent.
    booth.hw.at(ms(0), 1, 1, false).at(ms(100), 0, 1, false);
    booth.run_until(ms(100)).unwrap();

    booth.shutdown.request();
    let err = booth.tick(None).unwrap_err();
    assert!(matches!(err, Error::Interrupted));
}

#[test]
fn shutdown_while_awaiting_confirmation_discards_capture() {
    let mut booth = Booth::new();
    booth.hw.at(ms(0), 1, 1, false).press(ms(300), ms(100), 1, 1);
    booth.run_until(ms(300)).unwrap();

    booth.shutdown.request();
    let job = booth.tick(None).unwrap().expect("capture job");
    assert_eq!(job.outcome, Some(CaptureOutcome::Cancelled));
    assert_eq!(booth.hw.captures.len(), 1);
    assert!(booth.hw.printer.is_empty());
}
