//! StanzaCam photo-booth controller library.
//!
//! Exposes the pure-logic modules for integration testing and the
//! diagnostic binary.  Raspberry Pi specific adapters (GPIO lines, serial
//! port) are guarded by the `rpi` feature inside [`adapters`].

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod focus;
pub mod fsm;
pub mod imaging;
pub mod indicator;
pub mod input;
pub mod pins;
pub mod receipt;
pub mod shutdown;

pub mod adapters;
pub mod drivers;
