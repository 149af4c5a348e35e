//! Display frame decoder
//!
//! Turns a realigned [`DisplayFrame`] into a [`DisplayMode`] and, for screens
//! that carry a value, writes that value into the [`ReadingStore`].
//!
//! Frame bit positions used here (byte index, bit 0 = LSB):
//!
//! | What                 | Where                                   |
//! |----------------------|-----------------------------------------|
//! | display off          | bytes 0..8 all zero                     |
//! | set clock            | byte 13 bit 7                           |
//! | locked               | byte 15 bit 0                           |
//! | set temp             | byte 6 bit 4                            |
//! | set vacation         | byte 7 bit 4                            |
//! | screen word          | bytes 10..14 little endian, masked      |
//! | ones digit           | byte 3 low nibble + byte 4 bits 7..5    |
//! | tens digit           | byte 4 low nibble + byte 5 bits 7..5    |
//! | hot / pump / vacation / e-heater | 15.4 / 14.6 / 14.4 / 14.3   |

use hpbridge_protocol::{DisplayFrame, HexDump, Sensor};

use super::mode::DisplayMode;
use crate::store::{ReadingStore, StatusIcons, INVALID_TEMP};

/// One 7-segment glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Glyph {
    Digit(u8),
    Minus,
    Blank,
}

/// Segment pattern that matches no known glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BcdError(pub u8);

/// Segment patterns (bit 0 is the decimal point and ignored)
const GLYPHS: [(u8, Glyph); 12] = [
    (0x00, Glyph::Blank),
    (0x04, Glyph::Minus),
    (0xFA, Glyph::Digit(0)),
    (0x60, Glyph::Digit(1)),
    (0xBC, Glyph::Digit(2)),
    (0xF4, Glyph::Digit(3)),
    (0x66, Glyph::Digit(4)),
    (0xD6, Glyph::Digit(5)),
    (0xDE, Glyph::Digit(6)),
    (0x70, Glyph::Digit(7)),
    (0xFE, Glyph::Digit(8)),
    (0xF6, Glyph::Digit(9)),
];

/// Decode the high 7 bits of a segment byte
pub fn decode_bcd(byte: u8) -> Result<Glyph, BcdError> {
    let pattern = byte & 0xFE;
    GLYPHS
        .iter()
        .find(|(p, _)| *p == pattern)
        .map(|(_, glyph)| *glyph)
        .ok_or(BcdError(byte))
}

/// Segment pattern that draws `glyph`; `None` for digits above 9
pub fn glyph_pattern(glyph: Glyph) -> Option<u8> {
    GLYPHS.iter().find(|(_, g)| *g == glyph).map(|(p, _)| *p)
}

fn ones_segments(frame: &DisplayFrame) -> u8 {
    (frame.byte(3) << 4) | ((frame.byte(4) & 0xE0) >> 4)
}

fn tens_segments(frame: &DisplayFrame) -> u8 {
    (frame.byte(4) << 4) | ((frame.byte(5) & 0xE0) >> 4)
}

/// Decode the two-digit temperature field
///
/// Returns [`INVALID_TEMP`] when the digits do not form a number.
pub fn decode_temp(frame: &DisplayFrame) -> i8 {
    let ones = match decode_bcd(ones_segments(frame)) {
        Ok(Glyph::Digit(d)) => d as i8,
        Ok(other) => {
            error!("ones digit is not a digit: {:?}", other);
            return INVALID_TEMP;
        }
        Err(BcdError(byte)) => {
            error!("unknown segment pattern {} in ones digit", byte);
            return INVALID_TEMP;
        }
    };

    match decode_bcd(tens_segments(frame)) {
        Ok(Glyph::Blank) => ones,
        Ok(Glyph::Minus) => -ones,
        Ok(Glyph::Digit(tens)) => ones + 10 * tens as i8,
        Err(BcdError(byte)) => {
            error!("unknown segment pattern {} in tens digit", byte);
            INVALID_TEMP
        }
    }
}

/// One entry of the screen-word lookup table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenPattern {
    pub pattern: u32,
    pub mode: DisplayMode,
}

/// Bits of the screen word that carry glyph segments
pub const SCREEN_WORD_MASK: u32 = 0x70FE_FEFE;

/// Screens recognised by their text segments
pub const SCREEN_PATTERNS: [ScreenPattern; 11] = [
    ScreenPattern { pattern: 0x008E_D6EA, mode: DisplayMode::InfoTankUpper },
    ScreenPattern { pattern: 0x008E_D68A, mode: DisplayMode::InfoTankLower },
    ScreenPattern { pattern: 0x0000_8EF4, mode: DisplayMode::InfoEvaporator },
    ScreenPattern { pattern: 0x0000_8E66, mode: DisplayMode::InfoAmbient },
    ScreenPattern { pattern: 0x0000_8E3E, mode: DisplayMode::InfoDischarge },
    ScreenPattern { pattern: 0x0000_8E4E, mode: DisplayMode::InfoSuction },
    ScreenPattern { pattern: 0x0000_9A9E, mode: DisplayMode::InfoCe },
    ScreenPattern { pattern: 0x0060_0000, mode: DisplayMode::ErrorEr1 },
    ScreenPattern { pattern: 0x00BC_0000, mode: DisplayMode::ErrorEr2 },
    ScreenPattern { pattern: 0x00F4_0000, mode: DisplayMode::ErrorEr3 },
    ScreenPattern { pattern: 0x00EC_701E, mode: DisplayMode::ErrorD7f },
];

/// Masked screen word from bytes 10..14
pub fn screen_word(frame: &DisplayFrame) -> u32 {
    let b = frame.bytes();
    u32::from_le_bytes([b[10], b[11], b[12], b[13]]) & SCREEN_WORD_MASK
}

/// Work out which screen the frame shows
///
/// Indicator bits are checked before the screen word because several of
/// them can be lit at once while the appliance switches screens.
pub fn decode_display_mode(frame: &DisplayFrame) -> DisplayMode {
    if frame.bytes()[..8].iter().all(|&b| b == 0) {
        return DisplayMode::Off;
    }
    if frame.bit(13, 7) {
        return DisplayMode::SetClock;
    }
    if frame.bit(15, 0) {
        return DisplayMode::Locked;
    }
    if frame.bit(6, 4) {
        return DisplayMode::SetTemp;
    }
    if frame.bit(7, 4) {
        return DisplayMode::SetVacation;
    }

    let word = screen_word(frame);
    SCREEN_PATTERNS
        .iter()
        .find(|entry| entry.pattern == word)
        .map(|entry| entry.mode)
        .unwrap_or(DisplayMode::Unlocked)
}

/// Decode a frame and store whatever value its screen carries
pub fn decode_display_data(frame: &DisplayFrame, store: &mut ReadingStore) -> DisplayMode {
    let mode = decode_display_mode(frame);
    store.set_mode(mode);

    match mode {
        DisplayMode::Unlocked | DisplayMode::Locked => {
            store.set_icons(StatusIcons {
                hot: frame.bit(15, 4),
                electric_heater: frame.bit(14, 3),
                pump: frame.bit(14, 6),
                vacation: frame.bit(14, 4),
            });
            store.set_temperature(Sensor::Current, decode_temp(frame));
        }
        DisplayMode::SetTemp => store.set_provisional_temp(decode_temp(frame)),
        other => {
            if let Some(sensor) = other.probe() {
                store.set_temperature(sensor, decode_temp(frame));
            }
        }
    }

    if mode == DisplayMode::Unlocked && store.temperature(Sensor::Current) == INVALID_TEMP {
        warn!("unreadable normal screen: {}", HexDump(frame.bytes()));
    }
    mode
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::render::{render, ScreenContent};
    use proptest::prelude::*;

    fn place_digits(frame: &mut DisplayFrame, ones: u8, tens: u8) {
        let b = frame.bytes_mut();
        b[3] = (b[3] & 0xF0) | (ones >> 4);
        b[4] = ((ones & 0x0E) << 4) | (tens >> 4);
        b[5] = (b[5] & 0x1F) | ((tens & 0x0E) << 4);
    }

    fn normal_screen() -> DisplayFrame {
        let mut frame = DisplayFrame::blank();
        frame.bytes_mut()[0] = 0x01;
        frame
    }

    #[test]
    fn test_bcd_table_is_exhaustive() {
        let mut recognised = 0;
        for byte in 0..=255u8 {
            let expected = GLYPHS.iter().find(|(p, _)| *p == byte & 0xFE).map(|(_, g)| *g);
            match (decode_bcd(byte), expected) {
                (Ok(glyph), Some(want)) => {
                    assert_eq!(glyph, want);
                    recognised += 1;
                }
                (Err(BcdError(b)), None) => assert_eq!(b, byte),
                (got, want) => panic!("byte {:#04x}: got {:?}, want {:?}", byte, got, want),
            }
        }
        // 12 patterns, each with the ignored bit 0 set or clear
        assert_eq!(recognised, 24);
    }

    #[test]
    fn test_bcd_known_digits() {
        assert_eq!(decode_bcd(0xFA), Ok(Glyph::Digit(0)));
        assert_eq!(decode_bcd(0xFB), Ok(Glyph::Digit(0)));
        assert_eq!(decode_bcd(0x66), Ok(Glyph::Digit(4)));
        assert_eq!(decode_bcd(0x04), Ok(Glyph::Minus));
        assert_eq!(decode_bcd(0x00), Ok(Glyph::Blank));
        assert_eq!(decode_bcd(0x02), Err(BcdError(0x02)));
    }

    #[test]
    fn test_temp_42_on_normal_screen() {
        let mut frame = normal_screen();
        place_digits(&mut frame, 0xBC, 0x66);

        let mut store = ReadingStore::new();
        assert_eq!(decode_display_data(&frame, &mut store), DisplayMode::Unlocked);
        assert_eq!(store.temperature(Sensor::Current), 42);
    }

    #[test]
    fn test_temp_negative_and_single_digit() {
        let mut frame = normal_screen();
        place_digits(&mut frame, 0xF4, 0x04);
        assert_eq!(decode_temp(&frame), -3);

        place_digits(&mut frame, 0x70, 0x00);
        assert_eq!(decode_temp(&frame), 7);
    }

    #[test]
    fn test_temp_invalid_combinations() {
        let mut frame = normal_screen();
        // ones blank
        place_digits(&mut frame, 0x00, 0x60);
        assert_eq!(decode_temp(&frame), INVALID_TEMP);
        // ones minus
        place_digits(&mut frame, 0x04, 0x60);
        assert_eq!(decode_temp(&frame), INVALID_TEMP);
        // tens unknown pattern
        place_digits(&mut frame, 0x60, 0x02);
        assert_eq!(decode_temp(&frame), INVALID_TEMP);
    }

    #[test]
    fn test_off_wins_over_other_bits() {
        let mut frame = DisplayFrame::blank();
        let b = frame.bytes_mut();
        b[13] = 0x80;
        b[15] = 0x01;
        b[10] = 0xEA;
        b[11] = 0xD6;
        b[12] = 0x8E;
        assert_eq!(decode_display_mode(&frame), DisplayMode::Off);
    }

    #[test]
    fn test_indicator_priority() {
        let mut frame = normal_screen();
        frame.bytes_mut()[6] |= 0x10;
        frame.bytes_mut()[7] |= 0x10;
        assert_eq!(decode_display_mode(&frame), DisplayMode::SetTemp);

        frame.bytes_mut()[15] |= 0x01;
        assert_eq!(decode_display_mode(&frame), DisplayMode::Locked);

        frame.bytes_mut()[13] |= 0x80;
        assert_eq!(decode_display_mode(&frame), DisplayMode::SetClock);
    }

    #[test]
    fn test_every_screen_pattern_maps_to_its_mode() {
        for entry in SCREEN_PATTERNS {
            let mut frame = normal_screen();
            frame.bytes_mut()[10..14].copy_from_slice(&entry.pattern.to_le_bytes());
            assert_eq!(decode_display_mode(&frame), entry.mode);

            // Unmasked bits don't change the result
            frame.bytes_mut()[10] |= 0x01;
            frame.bytes_mut()[13] |= 0x0F;
            assert_eq!(decode_display_mode(&frame), entry.mode);
        }
    }

    #[test]
    fn test_unmatched_word_is_unlocked() {
        let mut frame = normal_screen();
        frame.bytes_mut()[11] = 0x12;
        assert_eq!(decode_display_mode(&frame), DisplayMode::Unlocked);
    }

    #[test]
    fn test_every_rendered_mode_decodes_back() {
        for mode in DisplayMode::ALL {
            // Vacation shares its indicator with SetVacation and is never decoded
            if matches!(mode, DisplayMode::Unknown | DisplayMode::Vacation) {
                continue;
            }
            let frame = render(&ScreenContent::new(mode));
            assert_eq!(decode_display_mode(&frame), mode, "{:?}", mode);
        }
    }

    #[test]
    fn test_probe_screen_writes_its_probe_only() {
        let mut content = ScreenContent::new(DisplayMode::InfoAmbient);
        content.value = -7;
        let frame = render(&content);

        let mut store = ReadingStore::new();
        decode_display_data(&frame, &mut store);
        assert_eq!(store.temperature(Sensor::Ambient), -7);
        assert_eq!(store.temperature(Sensor::Current), INVALID_TEMP);
        assert_eq!(store.temperature(Sensor::Suction), INVALID_TEMP);
    }

    #[test]
    fn test_set_temp_writes_provisional_not_target() {
        let mut content = ScreenContent::new(DisplayMode::SetTemp);
        content.value = 51;
        let frame = render(&content);

        let mut store = ReadingStore::new();
        decode_display_data(&frame, &mut store);
        assert_eq!(store.provisional_temp(), 51);
        assert_eq!(store.target_temp(), INVALID_TEMP);
    }

    #[test]
    fn test_normal_screen_icons() {
        let mut content = ScreenContent::new(DisplayMode::Locked);
        content.value = 48;
        content.icons = StatusIcons {
            hot: true,
            electric_heater: true,
            pump: false,
            vacation: true,
        };
        let frame = render(&content);

        let mut store = ReadingStore::new();
        assert_eq!(decode_display_data(&frame, &mut store), DisplayMode::Locked);
        assert_eq!(store.icons(), content.icons);
        assert_eq!(store.temperature(Sensor::Current), 48);
    }

    proptest! {
        #[test]
        fn prop_two_digit_temperatures_decode(value in -9i8..=99) {
            let mut content = ScreenContent::new(DisplayMode::Unlocked);
            content.value = value;
            let frame = render(&content);
            prop_assert_eq!(decode_temp(&frame), value);
        }

        #[test]
        fn prop_unknown_ones_pattern_is_invalid(byte in any::<u8>(), tens in 0u8..10) {
            prop_assume!(!matches!(decode_bcd(byte), Ok(Glyph::Digit(_))));
            let mut frame = normal_screen();
            place_digits(&mut frame, byte & 0xFE, glyph_pattern(Glyph::Digit(tens)).unwrap());
            prop_assert_eq!(decode_temp(&frame), INVALID_TEMP);
        }
    }
}
