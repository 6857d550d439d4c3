//! Fuzz target: `wrap_text`
//!
//! Arbitrary UTF-8 (including control characters and wide glyphs) at an
//! arbitrary width.  Every line must fit the width and no non-whitespace
//! character may be lost.
//!
//! cargo fuzz run fuzz_word_wrap

#![no_main]

use libfuzzer_sys::fuzz_target;
use stanzacam::receipt::wrap_text;

fuzz_target!(|data: &[u8]| {
    let Some((&width, rest)) = data.split_first() else {
        return;
    };
    let Ok(text) = std::str::from_utf8(rest) else {
        return;
    };
    let width = usize::from(width);

    let lines = wrap_text(text, width);
    for line in &lines {
        assert!(line.chars().count() <= width.max(1), "line too wide");
    }

    let glyphs = |s: &str| s.chars().filter(|c| !c.is_whitespace()).count();
    assert_eq!(glyphs(&lines.concat()), glyphs(text), "glyphs lost");
});
