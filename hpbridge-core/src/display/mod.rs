//! Display bus decoding
//!
//! Turns captured frames into screens and readings.

pub mod decoder;
pub mod mode;
pub mod render;

pub use decoder::{decode_bcd, decode_display_data, decode_display_mode, decode_temp, BcdError, Glyph};
pub use mode::DisplayMode;
pub use render::{render, ScreenContent};
