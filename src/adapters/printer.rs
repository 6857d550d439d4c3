//! ESC/POS thermal printer over a serial link.
//!
//! Two bitmap framings are supported:
//!
//! | Mode     | Command                | Packing                           |
//! |----------|------------------------|-----------------------------------|
//! | `Column` | `ESC * 33 nL nH`       | 24-dot stripes, 3 bytes/column    |
//! | `Raster` | `GS v 0 0 xL xH yL yH` | row-major, 1 bit/pixel, MSB left  |
//!
//! Images are Floyd-Steinberg dithered to black/white first.  The encoders
//! are pure functions over a [`GrayImage`]; the wire is abstracted behind
//! [`SerialLink`] so host tests capture the exact bytes.

use std::io;

use image::GrayImage;
use image::imageops::{self, BiLevel};

use crate::app::ports::PrinterPort;
use crate::config::RenderMode;
use crate::error::PrinterError;

const ESC: u8 = 0x1B;
const GS: u8 = 0x1D;

pub const INIT: [u8; 2] = [ESC, b'@'];

/// 24-dot line spacing for column images so stripes butt together.
const TIGHT_SPACING: [u8; 3] = [ESC, b'3', 24];
const DEFAULT_SPACING: [u8; 2] = [ESC, b'2'];

/// Dots per column-mode stripe.
const STRIPE: u32 = 24;
/// Rows per raster band; keeps each command inside small printer buffers.
const RASTER_BAND: u32 = 255;

/// Byte pipe to the printer.
pub trait SerialLink {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Everything already received, without blocking.
    fn read_available(&mut self) -> io::Result<Vec<u8>>;

    /// Drop pending bytes in both directions.
    fn clear_buffers(&mut self) -> io::Result<()>;
}

// ── Encoders ──────────────────────────────────────────────────

/// Printable ASCII and newlines pass through, everything else becomes `?`.
pub fn sanitize_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\n' => b'\n',
            '\t' => b' ',
            c if c.is_ascii() && !c.is_ascii_control() => c as u8,
            _ => b'?',
        })
        .collect()
}

pub fn feed_command(lines: u8) -> [u8; 3] {
    [ESC, b'd', lines]
}

fn is_dot(image: &GrayImage, x: u32, y: u32) -> bool {
    y < image.height() && image.get_pixel(x, y).0[0] < 128
}

pub fn dither(image: &GrayImage) -> GrayImage {
    let mut out = image.clone();
    imageops::dither(&mut out, &BiLevel);
    out
}

/// Column ("bit image") framing of a black/white image.
pub fn encode_column_image(image: &GrayImage) -> Vec<u8> {
    let (w, h) = image.dimensions();
    let [nl, nh] = (w as u16).to_le_bytes();
    let mut out = Vec::with_capacity((h.div_ceil(STRIPE) * (w * 3 + 6)) as usize + 5);
    out.extend_from_slice(&TIGHT_SPACING);
    for y0 in (0..h).step_by(STRIPE as usize) {
        out.extend_from_slice(&[ESC, b'*', 33, nl, nh]);
        for x in 0..w {
            for k in 0..3 {
                let mut byte = 0u8;
                for bit in 0..8 {
                    if is_dot(image, x, y0 + k * 8 + bit) {
                        byte |= 0x80 >> bit;
                    }
                }
                out.push(byte);
            }
        }
        out.push(b'\n');
    }
    out.extend_from_slice(&DEFAULT_SPACING);
    out
}

/// Raster framing of a black/white image, split into bands.
pub fn encode_raster_image(image: &GrayImage) -> Vec<u8> {
    let (w, h) = image.dimensions();
    let row_bytes = w.div_ceil(8);
    let [xl, xh] = (row_bytes as u16).to_le_bytes();
    let headers = 8 * h.div_ceil(RASTER_BAND) as usize;
    let mut out = Vec::with_capacity((row_bytes * h) as usize + headers);
    for y0 in (0..h).step_by(RASTER_BAND as usize) {
        let rows = RASTER_BAND.min(h - y0);
        let [yl, yh] = (rows as u16).to_le_bytes();
        out.extend_from_slice(&[GS, b'v', b'0', 0, xl, xh, yl, yh]);
        for y in y0..y0 + rows {
            for bx in 0..row_bytes {
                let mut byte = 0u8;
                for bit in 0..8 {
                    let x = bx * 8 + bit;
                    if x < w && is_dot(image, x, y) {
                        byte |= 0x80 >> bit;
                    }
                }
                out.push(byte);
            }
        }
    }
    out
}

// ── Printer ───────────────────────────────────────────────────

pub struct EscPosPrinter<L: SerialLink> {
    link: L,
}

impl<L: SerialLink> EscPosPrinter<L> {
    /// Take the link and reset the printer to its power-on state.
    pub fn new(mut link: L) -> Result<Self, PrinterError> {
        link.write_all(&INIT)?;
        Ok(Self { link })
    }
}

impl<L: SerialLink> PrinterPort for EscPosPrinter<L> {
    fn reset_buffers(&mut self) -> Result<(), PrinterError> {
        Ok(self.link.clear_buffers()?)
    }

    fn send_raw(&mut self, bytes: &[u8]) -> Result<(), PrinterError> {
        Ok(self.link.write_all(bytes)?)
    }

    fn read_available(&mut self) -> Result<Vec<u8>, PrinterError> {
        Ok(self.link.read_available()?)
    }

    fn print_text(&mut self, text: &str) -> Result<(), PrinterError> {
        let mut bytes = sanitize_text(text);
        bytes.push(b'\n');
        Ok(self.link.write_all(&bytes)?)
    }

    fn print_image(&mut self, image: &GrayImage, mode: RenderMode) -> Result<(), PrinterError> {
        let bw = dither(image);
        let bytes = match mode {
            RenderMode::Column => encode_column_image(&bw),
            RenderMode::Raster => encode_raster_image(&bw),
        };
        log::debug!(
            "PRINTER: {}x{} image, {:?} mode, {} bytes",
            bw.width(),
            bw.height(),
            mode,
            bytes.len()
        );
        Ok(self.link.write_all(&bytes)?)
    }

    fn feed(&mut self, lines: u8) -> Result<(), PrinterError> {
        Ok(self.link.write_all(&feed_command(lines))?)
    }
}

// ── serialport backend ────────────────────────────────────────

#[cfg(feature = "rpi")]
mod serial {
    use std::io::{self, Read, Write};
    use std::time::Duration;

    use serialport::{ClearBuffer, SerialPort};

    use super::SerialLink;
    use crate::error::PrinterError;

    impl SerialLink for Box<dyn SerialPort> {
        fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
            Write::write_all(self, bytes)?;
            self.flush()
        }

        fn read_available(&mut self) -> io::Result<Vec<u8>> {
            let pending = self.bytes_to_read().map_err(io::Error::from)? as usize;
            let mut buf = vec![0u8; pending];
            if pending > 0 {
                self.read_exact(&mut buf)?;
            }
            Ok(buf)
        }

        fn clear_buffers(&mut self) -> io::Result<()> {
            self.clear(ClearBuffer::All).map_err(io::Error::from)
        }
    }

    /// Open the printer's serial device with a one-second read timeout.
    pub fn open(device: &str, baud: u32) -> Result<Box<dyn SerialPort>, PrinterError> {
        serialport::new(device, baud)
            .timeout(Duration::from_secs(1))
            .open()
            .map_err(|e| PrinterError::Io(format!("{device}: {e}")))
    }
}

#[cfg(feature = "rpi")]
pub use serial::open as open_serial;
