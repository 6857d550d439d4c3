//! Camera adapter over the `rpicam-apps` command-line tools.
//!
//! A long-running `rpicam-vid` preview stream keeps continuous autofocus
//! running and prints per-frame metadata; a reader thread keeps the latest
//! `AfState` in an atomic.  Stills are taken with `rpicam-still`, which
//! needs the sensor to itself, so the stream is stopped around each
//! capture and restarted afterwards.  A stream that dies on its own is
//! reaped and restarted at most once per warm-up period.

use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::app::ports::{AfState, CameraPort};
use crate::error::CameraError;

const STILL_BIN: &str = "rpicam-still";

/// Sentinel held in the shared slot until the first frame arrives.
const NO_FRAME: u8 = u8::MAX;

/// Extract the autofocus state from one line of `--metadata-format txt`
/// output, e.g. `AfState=2`.
pub fn parse_af_line(line: &str) -> Option<AfState> {
    let value = line.trim().strip_prefix("AfState=")?;
    AfState::from_raw(value.trim().parse().ok()?)
}

/// Command line of the metadata stream process.
#[derive(Debug, Clone)]
struct StreamCommand {
    program: String,
    args: Vec<String>,
}

impl StreamCommand {
    fn rpicam_vid() -> Self {
        let args = [
            "-t 0 -n",
            "--autofocus-mode continuous --autofocus-speed fast",
            "--metadata - --metadata-format txt",
            "-o /dev/null",
        ]
        .iter()
        .flat_map(|group| group.split(' '))
        .map(str::to_string)
        .collect();
        Self {
            program: "rpicam-vid".into(),
            args,
        }
    }
}

pub struct RpicamCamera {
    command: StreamCommand,
    stream: Option<Child>,
    af_state: Arc<AtomicU8>,
    warmup: Duration,
    /// Earliest time a dead stream may be respawned.
    next_restart: Instant,
}

impl RpicamCamera {
    /// Start the autofocus stream and wait `warmup` for the sensor to settle.
    pub fn start(warmup: Duration) -> Result<Self, CameraError> {
        let mut camera = Self::with_command(StreamCommand::rpicam_vid(), warmup);
        camera.start_stream()?;
        thread::sleep(warmup);
        info!("CAMERA: autofocus stream running");
        Ok(camera)
    }

    fn with_command(command: StreamCommand, warmup: Duration) -> Self {
        Self {
            command,
            stream: None,
            af_state: Arc::new(AtomicU8::new(NO_FRAME)),
            warmup,
            next_restart: Instant::now(),
        }
    }

    fn start_stream(&mut self) -> Result<(), CameraError> {
        let program = &self.command.program;
        let mut child = Command::new(program)
            .args(&self.command.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| CameraError::Unavailable(format!("{program}: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CameraError::Unavailable("metadata pipe missing".into()))?;

        self.af_state.store(NO_FRAME, Ordering::Relaxed);
        let slot = Arc::clone(&self.af_state);
        thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                let Ok(line) = line else { break };
                if let Some(state) = parse_af_line(&line) {
                    slot.store(state as u8, Ordering::Relaxed);
                }
            }
            debug!("CAMERA: metadata stream closed");
        });

        self.stream = Some(child);
        Ok(())
    }

    fn stop_stream(&mut self) {
        if let Some(mut child) = self.stream.take() {
            if let Err(e) = child.kill() {
                warn!("CAMERA: failed to stop stream: {}", e);
            }
            let _ = child.wait();
        }
    }

    /// Reap a stream that exited and respawn it once the back-off allows.
    fn ensure_stream(&mut self) -> bool {
        match self.stream.as_mut().map(Child::try_wait) {
            Some(Ok(None)) => return true,
            Some(Ok(Some(status))) => {
                warn!("CAMERA: stream exited ({}), restarting", status);
                self.stream = None;
                self.next_restart = Instant::now();
            }
            Some(Err(e)) => {
                warn!("CAMERA: stream status unknown ({}), restarting", e);
                self.stop_stream();
                self.next_restart = Instant::now();
            }
            None => {}
        }

        if Instant::now() < self.next_restart {
            return false;
        }
        self.next_restart = Instant::now() + self.warmup;
        match self.start_stream() {
            Ok(()) => {
                info!("CAMERA: autofocus stream restarted");
                true
            }
            Err(e) => {
                warn!("CAMERA: stream restart failed: {}", e);
                false
            }
        }
    }

    fn run_still(path: &Path) -> Result<(), CameraError> {
        let status = Command::new(STILL_BIN)
            .args(["-n", "-t", "1", "--autofocus-on-capture", "-o"])
            .arg(path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| CameraError::CaptureFailed(format!("{STILL_BIN}: {e}")))?;
        if !status.success() {
            return Err(CameraError::CaptureFailed(format!(
                "{STILL_BIN} exited with {status}"
            )));
        }
        if !path.is_file() {
            return Err(CameraError::CaptureFailed(format!(
                "{} not written",
                path.display()
            )));
        }
        Ok(())
    }
}

impl CameraPort for RpicamCamera {
    fn autofocus_state(&mut self) -> Result<AfState, CameraError> {
        if !self.ensure_stream() {
            return Err(CameraError::Unavailable("autofocus stream not running".into()));
        }
        AfState::from_raw(self.af_state.load(Ordering::Relaxed))
            .ok_or_else(|| CameraError::Unavailable("no frame metadata yet".into()))
    }

    fn capture_still(&mut self, path: &Path) -> Result<(), CameraError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| CameraError::CaptureFailed(format!("{}: {e}", dir.display())))?;
        }
        self.stop_stream();
        let captured = Self::run_still(path);
        match self.start_stream() {
            Ok(()) => thread::sleep(self.warmup.min(Duration::from_millis(500))),
            Err(e) => warn!("CAMERA: stream restart failed: {}", e),
        }
        captured
    }
}

impl Drop for RpicamCamera {
    fn drop(&mut self) {
        self.stop_stream();
    }
}
