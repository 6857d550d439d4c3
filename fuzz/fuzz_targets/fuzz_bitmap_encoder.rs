//! Fuzz target: ESC/POS bitmap encoders
//!
//! Builds an image of arbitrary size and content from the input and runs
//! both framings.  Neither may panic, and each must emit exactly the bytes
//! its header announces.
//!
//! cargo fuzz run fuzz_bitmap_encoder

#![no_main]

use image::GrayImage;
use libfuzzer_sys::fuzz_target;
use stanzacam::adapters::printer::{encode_column_image, encode_raster_image};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let w = u32::from(data[0] % 64) + 1;
    let h = u32::from(data[1]) + 1;
    let pixels = &data[2..];
    let img = GrayImage::from_fn(w, h, |x, y| {
        let i = (y * w + x) as usize;
        image::Luma([pixels.get(i).copied().unwrap_or(255)])
    });

    let column = encode_column_image(&img);
    let stripes = h.div_ceil(24) as usize;
    assert_eq!(column.len(), 3 + stripes * (6 + 3 * w as usize) + 2);

    let raster = encode_raster_image(&img);
    let row = w.div_ceil(8) as usize;
    assert_eq!(raster.len(), h.div_ceil(255) as usize * 8 + row * h as usize);
});
