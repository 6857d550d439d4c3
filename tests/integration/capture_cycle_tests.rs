//! Capture cycle end to end: trigger press → capture → confirmation →
//! printer check → receipt, against the mock booth.

use std::time::Duration;

use super::mock_hw::{Booth, PrinterCall, ms};

use stanzacam::app::events::AppEvent;
use stanzacam::config::RenderMode;
use stanzacam::drivers::status_led::Colour;
use stanzacam::fsm::context::{CaptureOutcome, FailureReason};
use stanzacam::indicator::FlashPattern;
use stanzacam::receipt::{STATUS_REQUEST, TAIL_FEED_LINES};

/// Trigger at 300 ms.  The CAPTURED flash ends at 2300 ms, where the
/// confirmation window opens.
const TRIGGER: u64 = 300;
const WINDOW_OPENS: u64 = 2300;

fn ready_booth(booth: &mut Booth) {
    booth.hw.at(ms(0), 1, 1, false);
    booth.hw.press(ms(TRIGGER), ms(100), 1, 1);
}

/// Tick until a capture cycle finishes and return the LED writes made
/// during that final tick.
fn finish_cycle(booth: &mut Booth) -> Vec<(Duration, Colour)> {
    for _ in 0..1000 {
        let before = booth.hw.colour_log.len();
        if booth.tick(None).unwrap().is_some() {
            return booth.hw.colour_log[before..].to_vec();
        }
    }
    panic!("cycle never finished");
}

/// Colours of the last `n` writes, and each write's offset from the first.
fn tail(writes: &[(Duration, Colour)], n: usize) -> (Vec<Colour>, Vec<Duration>) {
    let tail = &writes[writes.len() - n..];
    let start = tail[0].0;
    (
        tail.iter().map(|(_, c)| *c).collect(),
        tail.iter().map(|(t, _)| *t - start).collect(),
    )
}

#[test]
fn captured_flash_ends_where_window_opens() {
    assert_eq!(
        ms(TRIGGER) + FlashPattern::CAPTURED.duration(),
        ms(WINDOW_OPENS)
    );
}

#[test]
fn confirmed_capture_prints_photo() {
    let mut booth = Booth::new();
    ready_booth(&mut booth);
    booth.hw.press(ms(WINDOW_OPENS + 500), ms(100), 1, 1);
    booth.run_until(ms(6000)).unwrap();

    assert_eq!(booth.jobs.len(), 1);
    let job = &booth.jobs[0];
    assert!(job.confirmed);
    assert_eq!(job.outcome, Some(CaptureOutcome::PrintedNoPoem));
    assert_eq!(booth.hw.captures.len(), 1);

    assert_eq!(
        booth.hw.printer,
        vec![
            PrinterCall::Reset,
            PrinterCall::Raw(STATUS_REQUEST.to_vec()),
            PrinterCall::Image {
                width: 384,
                height: 288,
                mode: RenderMode::Column
            },
            PrinterCall::Feed(TAIL_FEED_LINES),
        ]
    );

    for colour in [Colour::Yellow, Colour::White] {
        assert!(booth.hw.colours.contains(&colour), "{:?} never shown", colour);
    }
    assert_eq!(
        booth
            .sink
            .count(|e| *e == AppEvent::CycleFinished(CaptureOutcome::PrintedNoPoem)),
        1
    );
}

#[test]
fn no_confirmation_cancels_after_three_seconds() {
    let mut booth = Booth::new();
    ready_booth(&mut booth);

    let mut guard = 0;
    while booth.jobs.is_empty() {
        booth.tick(None).unwrap();
        guard += 1;
        assert!(guard < 1000, "cycle never ran");
    }

    let job = &booth.jobs[0];
    assert!(!job.confirmed);
    assert_eq!(job.outcome, Some(CaptureOutcome::Cancelled));
    assert!(booth.hw.printer.is_empty(), "printer touched: {:?}", booth.hw.printer);

    let cancelled_at = booth.now();
    assert!(cancelled_at >= ms(WINDOW_OPENS + 3000));
    assert!(cancelled_at <= ms(WINDOW_OPENS + 3010));
}

#[test]
fn printed_receipt_ends_with_two_slow_blue_blinks() {
    use Colour::{Blue, Off};
    let mut booth = Booth::new();
    ready_booth(&mut booth);
    booth.hw.press(ms(WINDOW_OPENS + 500), ms(100), 1, 1);
    let writes = finish_cycle(&mut booth);

    assert_eq!(booth.jobs[0].outcome, Some(CaptureOutcome::PrintedNoPoem));
    let (colours, offsets) = tail(&writes, 5);
    // Success colour, then blue/off twice at 0.25 s.
    assert_eq!(colours, [Blue, Blue, Off, Blue, Off]);
    assert_eq!(offsets, [ms(0), ms(0), ms(250), ms(500), ms(750)]);
}

#[test]
fn cancelled_capture_ends_without_a_flash() {
    let mut booth = Booth::new();
    ready_booth(&mut booth);
    let writes = finish_cycle(&mut booth);

    assert_eq!(booth.jobs[0].outcome, Some(CaptureOutcome::Cancelled));
    // The confirmation colour is the last thing shown.
    assert_eq!(writes.last().map(|w| w.1), Some(Colour::White));
}

#[test]
fn failed_cycles_end_with_three_red_blinks() {
    use Colour::{Off, Red};
    let cases: [(fn(&mut Booth), FailureReason); 3] = [
        (|b| b.hw.print_broken = true, FailureReason::PrintFailed),
        (|b| b.hw.printer_online = false, FailureReason::PrinterUnreachable),
        (|b| b.hw.capture_broken = true, FailureReason::CameraUnavailable),
    ];

    for (break_it, reason) in cases {
        let mut booth = Booth::new();
        break_it(&mut booth);
        ready_booth(&mut booth);
        booth.hw.press(ms(WINDOW_OPENS + 500), ms(100), 1, 1);
        let writes = finish_cycle(&mut booth);

        assert_eq!(booth.jobs[0].outcome, Some(CaptureOutcome::Failed(reason)));
        let (colours, offsets) = tail(&writes, 7);
        assert_eq!(colours, [Red, Red, Off, Red, Off, Red, Off], "{:?}", reason);
        assert_eq!(
            offsets,
            [ms(0), ms(0), ms(200), ms(400), ms(600), ms(800), ms(1000)],
            "{:?}",
            reason
        );
    }
}

#[test]
fn held_trigger_press_does_not_confirm() {
    let mut booth = Booth::new();
    booth.hw.at(ms(0), 1, 1, false);
    // Held straight through the capture flash and the whole window.
    booth.hw.at(ms(TRIGGER), 1, 1, true);
    booth.run_until(ms(6000)).unwrap();

    assert_eq!(booth.jobs.len(), 1);
    assert_eq!(booth.jobs[0].outcome, Some(CaptureOutcome::Cancelled));
    assert!(booth.hw.printer.is_empty());
}

#[test]
fn press_without_focus_is_rejected() {
    let mut booth = Booth::new();
    booth.hw.focused = false;
    ready_booth(&mut booth);
    booth.run_until(ms(TRIGGER)).unwrap();

    let before = booth.hw.colours.len();
    let job = booth.tick(None).unwrap();
    assert!(job.is_none());

    use Colour::{Off, Red};
    // Unfocused indicator, then three red blinks.
    assert_eq!(
        booth.hw.colours[before..],
        [Red, Red, Off, Red, Off, Red, Off]
    );
    assert_eq!(booth.sink.count(|e| *e == AppEvent::CaptureRejected), 1);
    assert!(booth.hw.captures.is_empty());
    assert!(booth.hw.printer.is_empty());
    assert!(booth.jobs.is_empty());
}

#[test]
fn camera_failure_ends_cycle_without_printing() {
    let mut booth = Booth::new();
    booth.hw.capture_broken = true;
    ready_booth(&mut booth);
    booth.run_until(ms(3000)).unwrap();

    assert_eq!(booth.jobs.len(), 1);
    assert_eq!(
        booth.jobs[0].outcome,
        Some(CaptureOutcome::Failed(FailureReason::CameraUnavailable))
    );
    assert!(booth.hw.printer.is_empty());
}

#[test]
fn unreachable_printer_abandons_job() {
    let mut booth = Booth::new();
    booth.hw.printer_online = false;
    ready_booth(&mut booth);
    booth.hw.press(ms(WINDOW_OPENS + 500), ms(100), 1, 1);
    booth.run_until(ms(6000)).unwrap();

    assert_eq!(
        booth.jobs[0].outcome,
        Some(CaptureOutcome::Failed(FailureReason::PrinterUnreachable))
    );
    assert!(booth.jobs[0].confirmed);
    assert_eq!(
        booth.hw.printer,
        vec![PrinterCall::Reset, PrinterCall::Raw(STATUS_REQUEST.to_vec())]
    );
}

#[test]
fn print_error_fails_cycle() {
    let mut booth = Booth::new();
    booth.hw.print_broken = true;
    ready_booth(&mut booth);
    booth.hw.press(ms(WINDOW_OPENS + 500), ms(100), 1, 1);
    booth.run_until(ms(6000)).unwrap();

    assert_eq!(
        booth.jobs[0].outcome,
        Some(CaptureOutcome::Failed(FailureReason::PrintFailed))
    );
    assert_eq!(booth.hw.printed_images(), 0);
}

#[test]
fn header_rotation_and_archive() {
    let archive = tempfile::tempdir().unwrap();
    let archive_dir = archive.path().join("captures");
    let dir_for_config = archive_dir.clone();
    let mut booth = Booth::with_config(move |c| {
        c.rotate_degrees = 90;
        c.archive_dir = Some(dir_for_config);
        c.receipt_header = Some("StanzaCam".into());
        c.render_mode = RenderMode::Raster;
    });
    ready_booth(&mut booth);
    booth.hw.press(ms(WINDOW_OPENS + 500), ms(100), 1, 1);
    booth.run_until(ms(6000)).unwrap();

    assert_eq!(booth.jobs[0].outcome, Some(CaptureOutcome::PrintedNoPoem));
    // 64x48 rotated to 48x64, then scaled to the paper width.
    assert_eq!(
        booth.hw.printer[2..4],
        [
            PrinterCall::Text("StanzaCam".into()),
            PrinterCall::Image {
                width: 384,
                height: 512,
                mode: RenderMode::Raster
            },
        ]
    );

    let archived: Vec<_> = std::fs::read_dir(&archive_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(archived.len(), 1);
    assert!(archived[0].starts_with("capture_"));
    assert!(archived[0].ends_with(".png"));
}

#[test]
fn focus_must_relock_after_a_capture() {
    let mut booth = Booth::new();
    ready_booth(&mut booth);
    booth.run_until(ms(5400)).unwrap();
    assert_eq!(booth.jobs.len(), 1);

    // Straight after the cycle the lock is gone; a quick second press is
    // rejected even though the camera is still focused.
    let t = booth.now();
    booth.hw.press(t + ms(40), ms(20), 1, 1);
    booth.run_until(t + ms(100)).unwrap();
    assert_eq!(booth.jobs.len(), 1);
    assert_eq!(booth.sink.count(|e| *e == AppEvent::CaptureRejected), 1);
}
