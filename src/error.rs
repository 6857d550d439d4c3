//! Unified error types for the StanzaCam controller.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! top-level control loop's error handling uniform.  Each collaborator
//! (inputs, camera, printer, remote generator) has its own small error
//! enum so call sites can decide which faults are fatal and which degrade.
//!
//! | Kind                     | Policy                                        |
//! |--------------------------|-----------------------------------------------|
//! | `InputTransport`         | fatal, propagated out of the control loop     |
//! | `Camera`                 | fatal in diagnostics, cycle failure otherwise |
//! | `Printer`                | recoverable, current print job abandoned      |
//! | `Remote`                 | recoverable, image-only print with a marker   |
//! | `Interrupted`            | graceful shutdown path                        |

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level controller error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug)]
pub enum Error {
    /// A digital input line could not be read.
    InputTransport(InputFault),
    /// The camera could not be reached or refused a capture.
    Camera(CameraError),
    /// The thermal printer did not answer or a write failed.
    Printer(PrinterError),
    /// The remote generation service failed.
    Remote(RemoteError),
    /// A captured still could not be decoded or transformed.
    Image(String),
    /// Configuration is invalid or could not be loaded.
    Config(String),
    /// Peripheral initialisation failed.
    Init(String),
    /// A user-requested stop arrived while the controller was blocked.
    Interrupted,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputTransport(e) => write!(f, "input: {e}"),
            Self::Camera(e) => write!(f, "camera: {e}"),
            Self::Printer(e) => write!(f, "printer: {e}"),
            Self::Remote(e) => write!(f, "remote: {e}"),
            Self::Image(msg) => write!(f, "image: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Interrupted => write!(f, "interrupted"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Input faults
// ---------------------------------------------------------------------------

/// A digital input line could not be sampled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFault {
    /// Logical line that failed, e.g. `"rotary A line 3"` or `"pushbutton"`.
    pub line: String,
    /// Driver-level description of the failure.
    pub detail: String,
}

impl InputFault {
    pub fn new(line: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for InputFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} read failed: {}", self.line, self.detail)
    }
}

impl std::error::Error for InputFault {}

impl From<InputFault> for Error {
    fn from(e: InputFault) -> Self {
        Self::InputTransport(e)
    }
}

// ---------------------------------------------------------------------------
// Camera errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// Camera not detected, helper process missing, or stream gone.
    Unavailable(String),
    /// The still capture command ran but did not produce an image.
    CaptureFailed(String),
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "camera unavailable: {msg}"),
            Self::CaptureFailed(msg) => write!(f, "capture failed: {msg}"),
        }
    }
}

impl std::error::Error for CameraError {}

impl From<CameraError> for Error {
    fn from(e: CameraError) -> Self {
        Self::Camera(e)
    }
}

// ---------------------------------------------------------------------------
// Printer errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrinterError {
    /// The serial link reported an I/O failure.
    Io(String),
}

impl fmt::Display for PrinterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "serial I/O error: {msg}"),
        }
    }
}

impl From<std::io::Error> for PrinterError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl std::error::Error for PrinterError {}

impl From<PrinterError> for Error {
    fn from(e: PrinterError) -> Self {
        Self::Printer(e)
    }
}

// ---------------------------------------------------------------------------
// Remote generation errors
// ---------------------------------------------------------------------------

/// Failure kinds of the remote image-to-text service.
///
/// All of them are recoverable: the photo is printed without a poem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The API key was rejected.
    Auth,
    /// The service asked us to slow down.
    RateLimited,
    /// The request never reached the service or timed out.
    Connection(String),
    /// The service answered with something we cannot use.
    UnexpectedResponse(String),
}

impl RemoteError {
    /// Short label printed on the receipt under the photo.
    pub const fn marker(&self) -> &'static str {
        match self {
            Self::Auth => "poem failed: bad API key",
            Self::RateLimited => "poem failed: rate limited",
            Self::Connection(_) => "poem failed: no connection",
            Self::UnexpectedResponse(_) => "poem failed: bad response",
        }
    }

    /// Whether another attempt could plausibly succeed.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Connection(_))
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auth => write!(f, "authentication rejected"),
            Self::RateLimited => write!(f, "rate limited"),
            Self::Connection(msg) => write!(f, "connection error: {msg}"),
            Self::UnexpectedResponse(msg) => write!(f, "unexpected response: {msg}"),
        }
    }
}

impl std::error::Error for RemoteError {}

impl From<RemoteError> for Error {
    fn from(e: RemoteError) -> Self {
        Self::Remote(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Controller-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
