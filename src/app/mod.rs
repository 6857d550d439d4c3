//! Application core: domain logic behind port traits.
//!
//! This module holds the control loop rules for the booth: input settling,
//! focus lock, indicator state and the capture cycle.  All interaction with
//! hardware and the network happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
