//! Mock hardware adapters for integration tests.
//!
//! Inputs follow a timeline keyed on the simulated clock, so a scenario
//! reads like "press at 300 ms, release at 400 ms" no matter how many
//! times the code under test polls.  Every printer and LED call is
//! recorded for assertions.

use std::cell::Cell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use image::{GrayImage, Luma};
use stanzacam::app::events::AppEvent;
use stanzacam::app::ports::{
    AfState, CameraPort, ClockPort, EventSink, GenerationRequest, GeneratorPort, IndicatorPort,
    InputPort, PrinterPort,
};
use stanzacam::app::service::AppService;
use stanzacam::config::{RenderMode, SystemConfig};
use stanzacam::drivers::status_led::Colour;
use stanzacam::error::{CameraError, InputFault, PrinterError, RemoteError, Result};
use stanzacam::fsm::context::CaptureJob;
use stanzacam::input::InputSnapshot;
use stanzacam::receipt::STATUS_REQUEST;
use stanzacam::shutdown::ShutdownFlag;
use tempfile::TempDir;

pub const fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

// ── Clock ─────────────────────────────────────────────────────

/// Simulated monotonic clock; sleeping just advances it.
#[derive(Clone, Default)]
pub struct SimClock {
    now: Rc<Cell<Duration>>,
}

impl SimClock {
    pub fn handle(&self) -> Rc<Cell<Duration>> {
        Rc::clone(&self.now)
    }
}

impl ClockPort for SimClock {
    fn uptime(&self) -> Duration {
        self.now.get()
    }

    fn sleep(&mut self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }
}

// ── Call records ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum PrinterCall {
    Reset,
    Raw(Vec<u8>),
    Text(String),
    Image { width: u32, height: u32, mode: RenderMode },
    Feed(u8),
}

// ── MockBooth ─────────────────────────────────────────────────

pub struct MockBooth {
    now: Rc<Cell<Duration>>,
    /// `(from, snapshot)` pairs in time order.
    timeline: Vec<(Duration, InputSnapshot)>,
    pub input_fault_at: Option<Duration>,
    pub polls: usize,

    pub focused: bool,
    pub af_broken: bool,
    pub capture_broken: bool,
    pub captures: Vec<PathBuf>,

    pub printer_online: bool,
    pub print_broken: bool,
    status_requested: bool,
    pub printer: Vec<PrinterCall>,

    pub colours: Vec<Colour>,
    /// Every LED write with the simulated time it happened.
    pub colour_log: Vec<(Duration, Colour)>,
}

#[allow(dead_code)]
impl MockBooth {
    pub fn new(clock: &SimClock) -> Self {
        Self {
            now: clock.handle(),
            timeline: Vec::new(),
            input_fault_at: None,
            polls: 0,
            focused: true,
            af_broken: false,
            capture_broken: false,
            captures: Vec::new(),
            printer_online: true,
            print_broken: false,
            status_requested: false,
            printer: Vec::new(),
            colours: Vec::new(),
            colour_log: Vec::new(),
        }
    }

    /// From `at` onwards the switches read `(a, b, button)`.
    pub fn at(&mut self, at: Duration, a: u8, b: u8, button: bool) -> &mut Self {
        self.timeline.push((at, InputSnapshot::new(a, b, button)));
        self.timeline.sort_by_key(|(t, _)| *t);
        self
    }

    /// Press at `at`, release after `hold`, on rotaries `(a, b)`.
    pub fn press(&mut self, at: Duration, hold: Duration, a: u8, b: u8) -> &mut Self {
        self.at(at, a, b, true).at(at + hold, a, b, false)
    }

    pub fn printed_images(&self) -> usize {
        self.printer
            .iter()
            .filter(|c| matches!(c, PrinterCall::Image { .. }))
            .count()
    }

    pub fn printed_text(&self) -> Vec<String> {
        self.printer
            .iter()
            .filter_map(|c| match c {
                PrinterCall::Text(t) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }
}

impl InputPort for MockBooth {
    fn poll(&mut self) -> core::result::Result<InputSnapshot, InputFault> {
        self.polls += 1;
        let now = self.now.get();
        if self.input_fault_at.is_some_and(|t| now >= t) {
            return Err(InputFault::new("rotary A", "EIO"));
        }
        Ok(self
            .timeline
            .iter()
            .rev()
            .find(|(t, _)| *t <= now)
            .map(|(_, s)| *s)
            .unwrap_or_default())
    }
}

impl CameraPort for MockBooth {
    fn autofocus_state(&mut self) -> core::result::Result<AfState, CameraError> {
        if self.af_broken {
            return Err(CameraError::Unavailable("stream exited".into()));
        }
        Ok(if self.focused {
            AfState::Focused
        } else {
            AfState::Scanning
        })
    }

    fn capture_still(&mut self, path: &Path) -> core::result::Result<(), CameraError> {
        if self.capture_broken {
            return Err(CameraError::CaptureFailed("sensor timeout".into()));
        }
        let img = GrayImage::from_fn(64, 48, |x, y| Luma([((x * 4 + y) % 256) as u8]));
        img.save(path)
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;
        self.captures.push(path.to_path_buf());
        Ok(())
    }
}

impl PrinterPort for MockBooth {
    fn reset_buffers(&mut self) -> core::result::Result<(), PrinterError> {
        self.status_requested = false;
        self.printer.push(PrinterCall::Reset);
        Ok(())
    }

    fn send_raw(&mut self, bytes: &[u8]) -> core::result::Result<(), PrinterError> {
        if bytes == STATUS_REQUEST {
            self.status_requested = true;
        }
        self.printer.push(PrinterCall::Raw(bytes.to_vec()));
        Ok(())
    }

    fn read_available(&mut self) -> core::result::Result<Vec<u8>, PrinterError> {
        if self.printer_online && std::mem::take(&mut self.status_requested) {
            Ok(vec![0x12])
        } else {
            Ok(Vec::new())
        }
    }

    fn print_text(&mut self, text: &str) -> core::result::Result<(), PrinterError> {
        self.printer.push(PrinterCall::Text(text.to_string()));
        Ok(())
    }

    fn print_image(
        &mut self,
        image: &GrayImage,
        mode: RenderMode,
    ) -> core::result::Result<(), PrinterError> {
        if self.print_broken {
            return Err(PrinterError::Io("write timed out".into()));
        }
        self.printer.push(PrinterCall::Image {
            width: image.width(),
            height: image.height(),
            mode,
        });
        Ok(())
    }

    fn feed(&mut self, lines: u8) -> core::result::Result<(), PrinterError> {
        self.printer.push(PrinterCall::Feed(lines));
        Ok(())
    }
}

impl IndicatorPort for MockBooth {
    fn set_colour(&mut self, colour: Colour) {
        self.colours.push(colour);
        self.colour_log.push((self.now.get(), colour));
    }
}

// ── Generator ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub prompt: String,
    pub model: String,
    pub media_type: String,
    pub image_len: usize,
}

/// Replies in order; repeats the last reply once the script runs out.
pub struct ScriptedGenerator {
    replies: VecDeque<core::result::Result<String, RemoteError>>,
    last: core::result::Result<String, RemoteError>,
    pub requests: Vec<SeenRequest>,
}

impl ScriptedGenerator {
    pub fn new(
        replies: impl IntoIterator<Item = core::result::Result<String, RemoteError>>,
    ) -> Self {
        Self {
            replies: replies.into_iter().collect(),
            last: Err(RemoteError::UnexpectedResponse("script exhausted".into())),
            requests: Vec::new(),
        }
    }

    pub fn always(reply: core::result::Result<String, RemoteError>) -> Self {
        let mut g = Self::new([]);
        g.last = reply;
        g
    }
}

impl GeneratorPort for ScriptedGenerator {
    fn generate(
        &mut self,
        request: &GenerationRequest<'_>,
    ) -> core::result::Result<String, RemoteError> {
        self.requests.push(SeenRequest {
            prompt: request.prompt.to_string(),
            model: request.model.to_string(),
            media_type: request.media_type.to_string(),
            image_len: request.image.len(),
        });
        match self.replies.pop_front() {
            Some(reply) => {
                self.last = reply.clone();
                reply
            }
            None => self.last.clone(),
        }
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Harness ───────────────────────────────────────────────────

/// Service plus mocks, driven like the production control loop.
pub struct Booth {
    pub app: AppService,
    pub hw: MockBooth,
    pub clock: SimClock,
    pub sink: RecordingSink,
    pub shutdown: ShutdownFlag,
    pub jobs: Vec<CaptureJob>,
    _dir: TempDir,
}

#[allow(dead_code)]
impl Booth {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Default config with the capture written into a fresh temp dir.
    pub fn with_config(tweak: impl FnOnce(&mut SystemConfig)) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = SystemConfig::default();
        config.capture_path = dir.path().join("capture.png");
        config.remote.retry_backoff_ms = 1000;
        tweak(&mut config);

        let clock = SimClock::default();
        let mut hw = MockBooth::new(&clock);
        let mut sink = RecordingSink::default();
        let mut app = AppService::new(config);
        app.start(&mut hw, &mut sink);
        Self {
            app,
            hw,
            clock,
            sink,
            shutdown: ShutdownFlag::new(),
            jobs: Vec::new(),
            _dir: dir,
        }
    }

    pub fn now(&self) -> Duration {
        self.clock.uptime()
    }

    /// One control-loop iteration, padded to the loop period.
    pub fn tick(
        &mut self,
        generator: Option<&mut dyn GeneratorPort>,
    ) -> Result<Option<CaptureJob>> {
        let started = self.clock.uptime();
        let period = self.app.config().control_period();
        let result = self
            .app
            .tick(&mut self.hw, generator, &mut self.clock, &self.shutdown, &mut self.sink);
        self.clock.sleep_until(started + period);
        if let Ok(Some(job)) = &result {
            self.jobs.push(job.clone());
        }
        result
    }

    /// Tick without a generator until the clock passes `until`.
    pub fn run_until(&mut self, until: Duration) -> Result<()> {
        while self.now() < until {
            self.tick(None)?;
        }
        Ok(())
    }

    /// Tick with `generator` until the clock passes `until`.
    pub fn run_with(&mut self, generator: &mut dyn GeneratorPort, until: Duration) -> Result<()> {
        while self.now() < until {
            let g: &mut dyn GeneratorPort = &mut *generator;
            self.tick(Some(g))?;
        }
        Ok(())
    }
}
