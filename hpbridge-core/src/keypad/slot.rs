//! Armed-key snapshot shared with the row-pulse context
//!
//! The main loop is the only writer. It replaces the whole snapshot in one
//! store; the row-pulse context only loads it. Packing the snapshot into a
//! single atomic word means a reader can never see half of an update.

use portable_atomic::{AtomicU32, Ordering};

const ARMED: u32 = 1 << 16;

/// Column GPIO and matrix row the row-pulse context should answer on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ArmedKey {
    pub gpio: u8,
    pub row: u8,
}

/// Single-writer slot holding the current [`ArmedKey`]
pub struct KeySlot {
    word: AtomicU32,
}

impl Default for KeySlot {
    fn default() -> Self {
        Self::new()
    }
}

impl KeySlot {
    pub const fn new() -> Self {
        Self {
            word: AtomicU32::new(0),
        }
    }

    pub fn arm(&self, key: ArmedKey) {
        let word = ARMED | ((key.gpio as u32) << 8) | key.row as u32;
        self.word.store(word, Ordering::Release);
    }

    pub fn disarm(&self) {
        self.word.store(0, Ordering::Release);
    }

    pub fn snapshot(&self) -> Option<ArmedKey> {
        let word = self.word.load(Ordering::Acquire);
        if word & ARMED == 0 {
            return None;
        }
        Some(ArmedKey {
            gpio: (word >> 8) as u8,
            row: word as u8,
        })
    }
}
