//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements                 | Connects to                  |
//! |---------------|----------------------------|------------------------------|
//! | `hardware`    | InputPort, IndicatorPort   | rotary/button/LED drivers    |
//! |               | CameraPort, PrinterPort    | (delegated)                  |
//! | `gpio`        | embedded-hal pins          | Linux GPIO character device  |
//! | `camera`      | CameraPort                 | `rpicam-vid` / `rpicam-still`|
//! | `printer`     | PrinterPort                | ESC/POS over serial          |
//! | `generator`   | GeneratorPort              | Anthropic Messages API       |
//! | `time`        | ClockPort                  | `std::time::Instant`         |
//! | `log_sink`    | EventSink                  | `log` facade                 |
//! | `config_file` | ConfigPort                 | JSON file                    |

pub mod camera;
pub mod config_file;
pub mod generator;
#[cfg(all(feature = "rpi", target_os = "linux"))]
pub mod gpio;
pub mod hardware;
pub mod log_sink;
pub mod printer;
pub mod time;
