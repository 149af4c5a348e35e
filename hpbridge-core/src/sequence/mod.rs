//! Menu sequences
//!
//! The appliance has no command interface, so every logical operation is a
//! walk through its front-panel menus: press a key, wait for the display to
//! settle, check the screen, press the next key. Each sequence kind is its
//! own small state machine, run after a shared preamble that wakes and
//! unlocks the panel and infers the power state.

pub mod orchestrator;
pub mod steps;

pub use orchestrator::{RunId, Sequencer};
pub use steps::{PowerStep, PreambleStep, Progress, RefreshStep, TargetStep, DIAGNOSTIC_SCREENS};

use crate::display::DisplayMode;
use crate::keypad::KeypadError;

/// Logical operations driven through the menus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequenceKind {
    /// Read the target and every probe
    RefreshStatus,
    /// Switch the appliance on or off
    SetPower(bool),
    /// Change the target temperature (°C)
    SetTargetTemp(i8),
}

/// Why a sequence did not reach its goal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequenceError {
    /// Another sequence is active
    Busy,
    /// The display showed something else than the step expects
    ModeMismatch {
        expected: DisplayMode,
        actual: DisplayMode,
    },
    /// The keypad refused a press
    Key(KeypadError),
    /// The screen's number could not be decoded
    Unreadable,
    /// The appliance ended in a different state than requested
    NotApplied,
    /// Target temperature outside the accepted range
    OutOfRange,
    /// The caller stopped waiting
    Timeout,
    /// Superseded or cancelled before finishing
    Cancelled,
}

impl From<KeypadError> for SequenceError {
    fn from(err: KeypadError) -> Self {
        SequenceError::Key(err)
    }
}

pub type SequenceResult = Result<(), SequenceError>;

/// What one orchestrator tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickReport {
    /// A key is held, nothing stepped
    Busy,
    /// Waiting for the display to settle after a key release
    Waiting,
    /// No sequence active
    Idle,
    /// Stepped, sequence continues
    Running,
    /// Stepped, sequence ended
    Finished(SequenceResult),
}
