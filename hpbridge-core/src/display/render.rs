//! Frame rendering
//!
//! The inverse of the decoder: builds the frame the appliance would send for
//! a given screen. Used by simulators and tests.

use hpbridge_protocol::DisplayFrame;

use super::decoder::{glyph_pattern, Glyph, SCREEN_PATTERNS};
use super::mode::DisplayMode;
use crate::store::StatusIcons;

/// What a simulated appliance shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenContent {
    pub mode: DisplayMode,
    /// Number in the two-digit field, out-of-range values render blank
    pub value: i8,
    /// Icons, only drawn on the normal screens
    pub icons: StatusIcons,
}

impl ScreenContent {
    pub fn new(mode: DisplayMode) -> Self {
        Self {
            mode,
            value: 0,
            icons: StatusIcons::default(),
        }
    }
}

fn digits(value: i8) -> (Glyph, Glyph) {
    match value {
        0..=9 => (Glyph::Digit(value as u8), Glyph::Blank),
        -9..=-1 => (Glyph::Digit(value.unsigned_abs()), Glyph::Minus),
        10..=99 => (Glyph::Digit(value as u8 % 10), Glyph::Digit(value as u8 / 10)),
        _ => (Glyph::Blank, Glyph::Blank),
    }
}

fn place_value(frame: &mut DisplayFrame, value: i8) {
    let (ones, tens) = digits(value);
    let ones = glyph_pattern(ones).unwrap_or(0);
    let tens = glyph_pattern(tens).unwrap_or(0);

    let b = frame.bytes_mut();
    b[3] = (b[3] & 0xF0) | (ones >> 4);
    b[4] = ((ones & 0x0E) << 4) | (tens >> 4);
    b[5] = (b[5] & 0x1F) | ((tens & 0x0E) << 4);
}

/// Build the frame for `content`
pub fn render(content: &ScreenContent) -> DisplayFrame {
    let mut frame = DisplayFrame::blank();
    if matches!(content.mode, DisplayMode::Off | DisplayMode::Unknown) {
        return frame;
    }

    // Colon segment, lit on every screen
    frame.bytes_mut()[0] = 0x01;
    place_value(&mut frame, content.value);

    let b = frame.bytes_mut();
    match content.mode {
        DisplayMode::SetClock => b[13] |= 0x80,
        DisplayMode::SetTemp => b[6] |= 0x10,
        DisplayMode::SetVacation | DisplayMode::Vacation => b[7] |= 0x10,
        DisplayMode::Locked | DisplayMode::Unlocked => {
            if content.mode == DisplayMode::Locked {
                b[15] |= 0x01;
            }
            let icons = content.icons;
            for (set, byte, bit) in [
                (icons.hot, 15, 4),
                (icons.electric_heater, 14, 3),
                (icons.pump, 14, 6),
                (icons.vacation, 14, 4),
            ] {
                if set {
                    b[byte] |= 1 << bit;
                }
            }
        }
        other => {
            if let Some(entry) = SCREEN_PATTERNS.iter().find(|e| e.mode == other) {
                b[10..14].copy_from_slice(&entry.pattern.to_le_bytes());
            }
        }
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_off_is_blank() {
        assert_eq!(render(&ScreenContent::new(DisplayMode::Off)), DisplayFrame::blank());
    }

    #[test]
    fn test_digit_split() {
        assert_eq!(digits(42), (Glyph::Digit(2), Glyph::Digit(4)));
        assert_eq!(digits(-5), (Glyph::Digit(5), Glyph::Minus));
        assert_eq!(digits(100), (Glyph::Blank, Glyph::Blank));
    }
}
