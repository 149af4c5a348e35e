//! RP2040-specific HAL for the heat pump bridge
//!
//! Implements the `hpbridge-hal` traits on the RP2040:
//!
//! - Keypad column pins with switchable output driver (SIO)
//! - Row scan lines and column latch writes for the interception core
//! - PIO-based capture of the display bus

#![no_std]

pub mod burst;
pub mod capture;
pub mod column;
pub mod scan;

pub use burst::{unpack_burst, CaptureError};
pub use capture::PioDisplayCapture;
pub use column::SioColumn;
pub use scan::{row_scan_loop, Rp2040ScanLines};
