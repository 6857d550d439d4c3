//! Remote poem generation inside the capture cycle: selection lookup,
//! retries, and the image-only fallback with a receipt marker.

use super::mock_hw::{Booth, PrinterCall, ScriptedGenerator, ms};

use stanzacam::app::events::AppEvent;
use stanzacam::drivers::status_led::Colour;
use stanzacam::error::RemoteError;
use stanzacam::fsm::context::CaptureOutcome;
use stanzacam::receipt::TAIL_FEED_LINES;

/// Trigger at 300 ms, confirm at 2800 ms on rotaries `(a, b)`.
fn confirmed_booth(a: u8, b: u8) -> Booth {
    let mut booth = Booth::new();
    booth
        .hw
        .at(ms(0), a, b, false)
        .press(ms(300), ms(100), a, b)
        .press(ms(2800), ms(100), a, b);
    booth
}

#[test]
fn poem_printed_under_photo() {
    let mut booth = confirmed_booth(2, 1);
    let mut poem = ScriptedGenerator::always(Ok("Old pond\nfrog jumps in".into()));
    booth.run_with(&mut poem, ms(8000)).unwrap();

    assert_eq!(booth.jobs.len(), 1);
    let job = &booth.jobs[0];
    assert_eq!(job.outcome, Some(CaptureOutcome::Printed));
    assert_eq!(job.poem.as_deref(), Some("Old pond\nfrog jumps in"));

    assert_eq!(poem.requests.len(), 1);
    let req = &poem.requests[0];
    let config = booth.app.config();
    assert_eq!(Some(req.prompt.as_str()), config.prompt(2));
    assert_eq!(Some(req.model.as_str()), config.model(1));
    assert_eq!(req.media_type, "image/png");
    assert!(req.image_len > 0);

    let printer = &booth.hw.printer;
    assert!(matches!(printer[2], PrinterCall::Image { .. }));
    assert_eq!(
        printer[3..],
        [
            PrinterCall::Feed(1),
            PrinterCall::Text("Old pond\nfrog jumps in".into()),
            PrinterCall::Feed(TAIL_FEED_LINES),
        ]
    );
    assert!(booth.hw.colours.contains(&Colour::Cyan));
}

#[test]
fn long_poems_are_wrapped_to_the_paper() {
    let mut booth = confirmed_booth(1, 1);
    let line = format!("{} {}", "a".repeat(28), "b".repeat(11));
    let mut poem = ScriptedGenerator::always(Ok(line));
    booth.run_with(&mut poem, ms(8000)).unwrap();

    let text = booth.hw.printed_text();
    assert_eq!(text, vec![format!("{}\n{}", "a".repeat(28), "b".repeat(11))]);
}

#[test]
fn every_remote_failure_still_prints_with_marker() {
    for (error, attempts) in [
        (RemoteError::Auth, 1),
        (RemoteError::RateLimited, 2),
        (RemoteError::Connection("timed out".into()), 2),
        (RemoteError::UnexpectedResponse("HTTP 500".into()), 1),
    ] {
        let mut booth = confirmed_booth(1, 1);
        let mut failing = ScriptedGenerator::always(Err(error.clone()));
        booth.run_with(&mut failing, ms(10_000)).unwrap();

        let job = &booth.jobs[0];
        assert_eq!(job.outcome, Some(CaptureOutcome::PrintedNoPoem), "{:?}", error);
        assert_eq!(job.generation_error.as_ref(), Some(&error));
        assert_eq!(booth.hw.printed_images(), 1, "{:?}", error);
        assert_eq!(booth.hw.printed_text(), vec![error.marker().to_string()]);
        assert_eq!(failing.requests.len(), attempts, "{:?}", error);
        assert_eq!(
            booth.sink.count(|e| *e
                == AppEvent::GenerationFailed {
                    error: error.clone(),
                    attempts: attempts as u8
                }),
            1
        );
    }
}

#[test]
fn transient_failure_is_retried() {
    let mut booth = confirmed_booth(1, 2);
    let mut flaky = ScriptedGenerator::new([
        Err(RemoteError::RateLimited),
        Ok("second time lucky".into()),
    ]);
    booth.run_with(&mut flaky, ms(10_000)).unwrap();

    assert_eq!(flaky.requests.len(), 2);
    assert_eq!(booth.jobs[0].outcome, Some(CaptureOutcome::Printed));
    assert_eq!(booth.sink.count(|e| matches!(e, AppEvent::GenerationFailed { .. })), 0);
}

#[test]
fn empty_poem_counts_as_bad_response() {
    let mut booth = confirmed_booth(1, 1);
    let mut blank = ScriptedGenerator::always(Ok("   \n".into()));
    booth.run_with(&mut blank, ms(8000)).unwrap();

    assert_eq!(blank.requests.len(), 1);
    assert_eq!(booth.jobs[0].outcome, Some(CaptureOutcome::PrintedNoPoem));
    assert!(matches!(
        booth.jobs[0].generation_error,
        Some(RemoteError::UnexpectedResponse(_))
    ));
}

#[test]
fn model_positions_without_a_model_skip_generation() {
    let mut booth = confirmed_booth(3, 6);
    let mut unused = ScriptedGenerator::always(Ok("never".into()));
    booth.run_with(&mut unused, ms(8000)).unwrap();

    assert!(unused.requests.is_empty());
    assert_eq!(booth.jobs[0].outcome, Some(CaptureOutcome::PrintedNoPoem));
    assert!(booth.hw.printed_text().is_empty());
    assert!(!booth.hw.colours.contains(&Colour::Cyan));
}

#[test]
fn disabled_remote_ignores_generator() {
    let mut booth = Booth::with_config(|c| c.remote.enabled = false);
    booth
        .hw
        .at(ms(0), 1, 1, false)
        .press(ms(300), ms(100), 1, 1)
        .press(ms(2800), ms(100), 1, 1);
    let mut unused = ScriptedGenerator::always(Ok("never".into()));
    booth.run_with(&mut unused, ms(8000)).unwrap();

    assert!(unused.requests.is_empty());
    assert_eq!(booth.jobs[0].outcome, Some(CaptureOutcome::PrintedNoPoem));
}

#[test]
fn no_confirmation_means_no_remote_call() {
    let mut booth = Booth::new();
    booth.hw.at(ms(0), 1, 1, false).press(ms(300), ms(100), 1, 1);
    let mut unused = ScriptedGenerator::always(Ok("never".into()));
    booth.run_with(&mut unused, ms(8000)).unwrap();

    assert!(unused.requests.is_empty());
    assert_eq!(booth.jobs[0].outcome, Some(CaptureOutcome::Cancelled));
}
