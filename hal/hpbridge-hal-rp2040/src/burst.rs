//! Unpacking of PIO capture bursts
//!
//! The capture program shifts bits in MSB first and autopushes every full
//! 32-bit word. When chip select goes high it pushes whatever is left in
//! the shift register, right-aligned, followed by the total bit count:
//!
//! ```text
//! [full word]* [partial] [count]
//! ```
//!
//! Words older than the last burst may still sit in front of it if the
//! FIFO was not drained in time; they are skipped.

/// RX FIFO depth with the TX FIFO joined in
pub const FIFO_DEPTH: usize = 8;

/// Why a burst could not be unpacked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CaptureError {
    /// Fewer words than the bit count calls for
    Truncated { bits: u32 },
    /// More bits than the destination buffer holds
    TooLong { bits: u32 },
    /// No frame within the watchdog period
    Timeout,
}

/// Unpack one burst into `raw`, returning the number of bits
///
/// Trailing bits are left-aligned in the last byte.
pub fn unpack_burst(words: &[u32], raw: &mut [u8]) -> Result<usize, CaptureError> {
    let &[.., partial, count] = words else {
        return Err(CaptureError::Truncated { bits: 0 });
    };
    let bits = count as usize;
    let full = bits / 32;
    let rem = bits % 32;

    if words.len() < full + 2 {
        return Err(CaptureError::Truncated { bits: count });
    }
    if bits.div_ceil(8) > raw.len() {
        return Err(CaptureError::TooLong { bits: count });
    }

    let start = words.len() - 2 - full;
    for (chunk, word) in raw.chunks_exact_mut(4).zip(&words[start..start + full]) {
        chunk.copy_from_slice(&word.to_be_bytes());
    }
    if rem > 0 {
        let tail = (partial << (32 - rem)).to_be_bytes();
        let n = rem.div_ceil(8);
        raw[full * 4..full * 4 + n].copy_from_slice(&tail[..n]);
    }
    Ok(bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_burst() {
        // 137 bits: four full words, 9 bits left over
        let words = [0xA012_3456, 0x789A_BCDE, 0xF011_2233, 0x4455_6677, 0b1_1000_0001, 137];
        let mut raw = [0u8; 18];
        assert_eq!(unpack_burst(&words, &mut raw), Ok(137));
        assert_eq!(&raw[..4], &[0xA0, 0x12, 0x34, 0x56]);
        assert_eq!(&raw[12..16], &[0x44, 0x55, 0x66, 0x77]);
        assert_eq!(raw[16], 0b1100_0000);
        assert_eq!(raw[17], 0b1000_0000);
    }

    #[test]
    fn test_stale_words_are_skipped() {
        let words = [0xDEAD_BEEF, 0x1234_5678, 0, 32];
        let mut raw = [0u8; 8];
        assert_eq!(unpack_burst(&words, &mut raw), Ok(32));
        assert_eq!(&raw[..4], &[0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn test_short_burst() {
        let mut raw = [0u8; 4];
        assert_eq!(unpack_burst(&[0b101, 3], &mut raw), Ok(3));
        assert_eq!(raw[0], 0b1010_0000);
        assert_eq!(unpack_burst(&[0, 0], &mut raw), Ok(0));
    }

    #[test]
    fn test_bad_bursts() {
        let mut raw = [0u8; 18];
        assert_eq!(
            unpack_burst(&[7], &mut raw),
            Err(CaptureError::Truncated { bits: 0 })
        );
        // Count says one full word, none present
        assert_eq!(
            unpack_burst(&[0, 40], &mut raw),
            Err(CaptureError::Truncated { bits: 40 })
        );
        let mut small = [0u8; 2];
        assert_eq!(
            unpack_burst(&[0, 17], &mut small),
            Err(CaptureError::TooLong { bits: 17 })
        );
    }
}
