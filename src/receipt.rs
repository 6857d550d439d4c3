//! Receipt layout: greedy word-wrap and the print sequence.
//!
//! ```text
//!   [header]          optional, wrapped
//!   ██████████        photo, already resized to the print width
//!   poem line 1       wrapped poem, or a one-line failure marker
//!   ...
//!   <feed>
//! ```

use std::time::Duration;

use image::GrayImage;
use log::debug;

use crate::app::ports::{ClockPort, PrinterPort};
use crate::config::RenderMode;
use crate::error::PrinterError;

/// Blank lines fed after the last line so it clears the tear bar.
pub const TAIL_FEED_LINES: u8 = 3;

/// `DLE EOT 1`: real-time printer status request.
pub const STATUS_REQUEST: [u8; 3] = [0x10, 0x04, 0x01];

/// Health check before anything consumes paper: clear both buffers, ask
/// for status, wait `wait`, and treat any reply byte as "connected".
pub fn printer_online<P: PrinterPort + ?Sized>(
    printer: &mut P,
    clock: &mut dyn ClockPort,
    wait: Duration,
) -> Result<bool, PrinterError> {
    printer.reset_buffers()?;
    printer.send_raw(&STATUS_REQUEST)?;
    clock.sleep(wait);
    let reply = printer.read_available()?;
    debug!("PRINTER: status reply {:02x?}", reply);
    Ok(!reply.is_empty())
}

/// Wrap `text` to at most `width` characters per line.
///
/// Each input line is wrapped on its own, so stanza breaks survive.  A line
/// breaks at the last whitespace at or before `width`; with no whitespace
/// in range it is hard-broken at `width`.  Whitespace at a break is dropped.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    for paragraph in text.lines() {
        let mut rest: Vec<char> = paragraph.trim_end().chars().collect();
        if rest.is_empty() {
            out.push(String::new());
            continue;
        }
        while rest.len() > width {
            let split = rest[..=width]
                .iter()
                .rposition(|c| c.is_whitespace())
                .filter(|&i| i > 0);
            let (line, tail) = match split {
                Some(i) => (&rest[..i], &rest[i..]),
                None => (&rest[..width], &rest[width..]),
            };
            out.push(line.iter().collect::<String>().trim_end().to_owned());
            let skip = tail.iter().take_while(|c| c.is_whitespace()).count();
            rest = tail[skip..].to_vec();
        }
        if !rest.is_empty() {
            out.push(rest.into_iter().collect());
        }
    }
    out
}

/// Everything printed for one capture.
#[derive(Debug)]
pub struct Receipt<'a> {
    pub header: Option<&'a str>,
    pub image: &'a GrayImage,
    /// Pre-wrapped lines under the photo.
    pub lines: Vec<String>,
}

impl<'a> Receipt<'a> {
    /// Photo with the poem, or with `marker` when generation failed.
    pub fn new(
        header: Option<&'a str>,
        image: &'a GrayImage,
        poem: Option<&str>,
        marker: Option<&str>,
        columns: usize,
    ) -> Self {
        let lines = match (poem, marker) {
            (Some(poem), _) => wrap_text(poem.trim(), columns),
            (None, Some(marker)) => wrap_text(marker, columns),
            (None, None) => Vec::new(),
        };
        Self {
            header,
            image,
            lines,
        }
    }

    pub fn print<P: PrinterPort + ?Sized>(
        &self,
        printer: &mut P,
        mode: RenderMode,
        columns: usize,
    ) -> Result<(), PrinterError> {
        if let Some(header) = self.header {
            printer.print_text(&wrap_text(header, columns).join("\n"))?;
        }
        printer.print_image(self.image, mode)?;
        if !self.lines.is_empty() {
            printer.feed(1)?;
            printer.print_text(&self.lines.join("\n"))?;
        }
        printer.feed(TAIL_FEED_LINES)
    }
}
