//! GPIO pin assignments for the StanzaCam main board (BCM numbering).
//!
//! Single source of truth: every adapter references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Illuminated pushbutton: RGB LED (common anode, active LOW)
// ---------------------------------------------------------------------------

pub const LED_RED_GPIO: u32 = 19;
pub const LED_GREEN_GPIO: u32 = 13;
pub const LED_BLUE_GPIO: u32 = 12;

// ---------------------------------------------------------------------------
// Pushbutton: normally-open contact to 3V3, internal pull-down
// ---------------------------------------------------------------------------

/// HIGH = pressed.
pub const BUTTON_GPIO: u32 = 26;

// ---------------------------------------------------------------------------
// Rotary switches: 8 positions each, one line per position, pull-down
// ---------------------------------------------------------------------------

/// Rotary A (prompt selector), positions 1-8 in order.
pub const ROTARY_A_GPIOS: [u32; 8] = [4, 17, 27, 22, 10, 9, 11, 5];

/// Rotary B (model selector), positions 1-8 in order.
pub const ROTARY_B_GPIOS: [u32; 8] = [23, 24, 25, 8, 7, 16, 20, 21];

/// GPIO character device the lines above live on.
pub const GPIO_CHIP: &str = "gpiochip0";

/// Consumer label shown by `gpioinfo` for lines we hold.
pub const GPIO_CONSUMER: &str = "stanzacam";
