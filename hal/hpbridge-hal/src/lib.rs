//! hpbridge Hardware Abstraction Layer
//!
//! This crate defines the hardware seams of the bridge so the decode and
//! keypad logic in `hpbridge-core` can run against the RP2040 board or
//! against host-side mocks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (hpbridge-firmware)        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  hpbridge-core (decoder, keypad, seq.)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  hpbridge-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!            ┌─────────────────┐
//!            │ hpbridge-hal-   │
//!            │    rp2040       │
//!            └─────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::TriStatePin`] - Keypad column outputs
//! - [`keypad::KeypadColumns`] - Column drive lines used to fake a key press
//! - [`keypad::ScanLines`] - Row scan inputs and column outputs, as seen from
//!   the row-pulse interception context
//! - [`capture::DisplayCapture`] - Raw frames from the display bus

#![no_std]
#![deny(unsafe_code)]

pub mod capture;
pub mod gpio;
pub mod keypad;

// Re-export key traits at crate root for convenience
pub use capture::DisplayCapture;
pub use gpio::{OutputPin, TriStatePin};
pub use keypad::{ColumnBank, KeypadColumns, RowLine, ScanLines, COLUMN_COUNT};
