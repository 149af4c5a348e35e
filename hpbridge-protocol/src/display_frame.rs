//! Display bus frame capture and realignment.
//!
//! The heat pump controller refreshes its display driver with a 137-bit
//! burst. The capture starts one bit early, so after the header byte every
//! payload byte straddles two captured bytes:
//!
//! ```text
//! raw:    [HDR] [.aaaaaaa] [abbbbbbb] [bccccccc] ...
//! frame:        [aaaaaaaa] [bbbbbbbb] ...
//! frame[i] = (raw[i + 1] << 1) | (raw[i + 2] >> 7)
//! ```
//!
//! Only frames with the right length and header are turned into a
//! [`DisplayFrame`]; anything else is dropped by the caller.

use core::fmt;

/// First captured byte of every valid display burst
pub const FRAME_HEADER: u8 = 0b1010_0000;

/// Number of bits in one display burst
pub const RAW_FRAME_BITS: usize = 137;

/// Bytes needed to hold one captured burst
pub const RAW_FRAME_LEN: usize = (RAW_FRAME_BITS + 7) / 8;

/// Payload bytes after realignment
pub const FRAME_LEN: usize = 16;

/// Errors that can occur while validating a captured burst
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Capture did not contain exactly [`RAW_FRAME_BITS`] bits
    WrongLength(u16),
    /// First byte did not match [`FRAME_HEADER`]
    BadHeader(u8),
}

/// One realigned, validated display frame
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DisplayFrame {
    bytes: [u8; FRAME_LEN],
}

impl DisplayFrame {
    /// Wrap already aligned payload bytes
    #[cfg(test)]
    pub const fn from_bytes(bytes: [u8; FRAME_LEN]) -> Self {
        Self { bytes }
    }

    /// An all-zero frame (display blanked)
    pub const fn blank() -> Self {
        Self {
            bytes: [0; FRAME_LEN],
        }
    }

    /// Validate a captured burst and realign its payload
    ///
    /// `bit_len` is the number of bits the capture actually clocked in.
    pub fn from_capture(raw: &[u8], bit_len: usize) -> Result<Self, FrameError> {
        if bit_len != RAW_FRAME_BITS || raw.len() < RAW_FRAME_LEN {
            return Err(FrameError::WrongLength(bit_len.min(u16::MAX as usize) as u16));
        }
        if raw[0] != FRAME_HEADER {
            return Err(FrameError::BadHeader(raw[0]));
        }

        let mut bytes = [0u8; FRAME_LEN];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = (raw[i + 1] << 1) | (raw[i + 2] >> 7);
        }
        Ok(Self { bytes })
    }

    /// Produce the burst the display bus would carry for this frame
    ///
    /// Inverse of [`DisplayFrame::from_capture`]; used by simulators.
    pub fn to_capture(&self) -> [u8; RAW_FRAME_LEN] {
        let mut raw = [0u8; RAW_FRAME_LEN];
        raw[0] = FRAME_HEADER;
        for (i, &byte) in self.bytes.iter().enumerate() {
            raw[i + 1] |= byte >> 1;
            raw[i + 2] |= (byte & 0x01) << 7;
        }
        raw
    }

    /// Payload bytes
    pub fn bytes(&self) -> &[u8; FRAME_LEN] {
        &self.bytes
    }

    /// Single payload byte (out of range reads as 0)
    pub fn byte(&self, index: usize) -> u8 {
        self.bytes.get(index).copied().unwrap_or(0)
    }

    /// Test a single bit, `bit` 0 being the least significant
    pub fn bit(&self, index: usize, bit: u8) -> bool {
        self.byte(index) & (1 << bit) != 0
    }

    /// Mutable payload access, for building fixtures
    pub fn bytes_mut(&mut self) -> &mut [u8; FRAME_LEN] {
        &mut self.bytes
    }
}

impl fmt::Debug for DisplayFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DisplayFrame({})", HexDump(&self.bytes))
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DisplayFrame {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "DisplayFrame({:02x})", self.bytes)
    }
}

/// Hex dump of raw bytes for diagnostics
pub struct HexDump<'a>(pub &'a [u8]);

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for HexDump<'_> {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{:02x}", self.0)
    }
}
