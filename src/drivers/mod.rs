//! Peripheral drivers over `embedded-hal` digital pins.

pub mod button;
pub mod rotary;
pub mod status_led;
