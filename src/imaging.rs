//! Still-image handling between the camera and the printer.
//!
//! Captures arrive as encoded files.  They can be rotated and centre-cropped
//! for a sideways-mounted sensor, archived under a timestamped name, and
//! finally reduced to a greyscale raster exactly as wide as the print head.
//! Before upload an oversized capture is scaled down to a bounded long edge.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat, ImageReader};

use crate::error::{Error, Result};

pub fn load(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|e| Error::Image(format!("{}: {e}", path.display())))
}

pub fn save(image: &DynamicImage, path: &Path) -> Result<()> {
    image
        .save(path)
        .map_err(|e| Error::Image(format!("{}: {e}", path.display())))
}

/// Rotate clockwise by `degrees` (0, 90, 180 or 270), then centre-crop to
/// `crop` if given.  A crop larger than the image is clamped to it.
pub fn orient(image: DynamicImage, degrees: u16, crop: Option<[u32; 2]>) -> DynamicImage {
    let rotated = match degrees {
        90 => image.rotate90(),
        180 => image.rotate180(),
        270 => image.rotate270(),
        _ => image,
    };
    match crop {
        Some([w, h]) => {
            let w = w.min(rotated.width());
            let h = h.min(rotated.height());
            let x = (rotated.width() - w) / 2;
            let y = (rotated.height() - h) / 2;
            rotated.crop_imm(x, y, w, h)
        }
        None => rotated,
    }
}

/// Greyscale, `width` pixels wide, aspect ratio kept.
pub fn prepare_for_print(image: &DynamicImage, width: u32) -> GrayImage {
    let (w, h) = (image.width().max(1), image.height());
    let height = ((u64::from(h) * u64::from(width)) / u64::from(w)).max(1) as u32;
    image::imageops::resize(&image.to_luma8(), width, height, FilterType::Lanczos3)
}

/// `capture_YYYY-MM-DD_HH-MM-SS.<ext>` for the given instant.
pub fn archive_name(at: DateTime<Local>, extension: &str) -> String {
    format!("capture_{}.{extension}", at.format("%Y-%m-%d_%H-%M-%S"))
}

/// Copy `source` into `dir` under a timestamped name.
pub fn archive_copy(source: &Path, dir: &Path, at: DateTime<Local>) -> Result<PathBuf> {
    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("jpg");
    fs::create_dir_all(dir).map_err(|e| Error::Image(format!("{}: {e}", dir.display())))?;
    let dest = dir.join(archive_name(at, ext));
    fs::copy(source, &dest).map_err(|e| Error::Image(format!("{}: {e}", dest.display())))?;
    Ok(dest)
}

/// MIME type for the remote request, from the file extension.
pub fn media_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        _ => "image/jpeg",
    }
}

/// Encoded bytes and MIME type to upload for the capture at `path`.
///
/// A file whose long edge fits in `max_edge` is sent as-is.  Anything
/// larger is resized to fit, aspect kept, and re-encoded as JPEG.
pub fn upload_payload(path: &Path, max_edge: u32) -> Result<(Vec<u8>, &'static str)> {
    let err = |e: &dyn std::fmt::Display| Error::Image(format!("{}: {e}", path.display()));
    let (w, h) = ImageReader::open(path)
        .and_then(ImageReader::with_guessed_format)
        .map_err(|e| err(&e))?
        .into_dimensions()
        .map_err(|e| err(&e))?;
    if w.max(h) <= max_edge {
        let bytes = fs::read(path).map_err(|e| err(&e))?;
        return Ok((bytes, media_type(path)));
    }

    let scaled = load(path)?.resize(max_edge, max_edge, FilterType::Triangle);
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(scaled.to_rgb8())
        .write_to(&mut out, ImageFormat::Jpeg)
        .map_err(|e| err(&e))?;
    Ok((out.into_inner(), "image/jpeg"))
}
