//! Keypad emulation
//!
//! Two contexts share this module. The main loop arms and releases key
//! presses through [`Keypad`]; the row-pulse context answers the appliance's
//! scan pulses through [`intercept_row_pulse`]. The only state they share is
//! the [`KeySlot`], written by the main loop alone.

pub mod emulator;
pub mod intercept;
pub mod keys;
pub mod slot;

pub use emulator::{HeldKey, Keypad, KeypadError};
pub use intercept::{column_idle_high, intercept_row_pulse, PulseOutcome, DEFAULT_SPIN_LIMIT};
pub use keys::{KeyCode, KeyPosition};
pub use slot::{ArmedKey, KeySlot};

/// Key press interface used by the sequence orchestrator
///
/// Implemented by [`Keypad`]; tests substitute a recorder.
pub trait KeyPress {
    /// Check if a key is currently held
    fn is_key_down(&self) -> bool;

    /// Frames decoded since the last key release
    fn settle_reads(&self) -> u8;

    /// Arm a key press starting at loop time `now`
    fn press(&mut self, key: KeyCode, duration_ms: u32, now: u32) -> Result<(), KeypadError>;
}
