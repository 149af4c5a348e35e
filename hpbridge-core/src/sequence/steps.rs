//! Step machines for each sequence kind
//!
//! A step either presses one key and names the step to run after the display
//! has settled, or finishes the sequence. Any unexpected screen aborts the
//! whole sequence.

use super::SequenceError;
use crate::config::BridgeConfig;
use crate::display::DisplayMode;
use crate::keypad::{KeyCode, KeyPress};
use crate::store::{ReadingStore, INVALID_TEMP};

/// Diagnostics screens in the order Down-Arrow walks through them
pub const DIAGNOSTIC_SCREENS: [DisplayMode; 6] = [
    DisplayMode::InfoTankUpper,
    DisplayMode::InfoTankLower,
    DisplayMode::InfoEvaporator,
    DisplayMode::InfoAmbient,
    DisplayMode::InfoDischarge,
    DisplayMode::InfoSuction,
];

/// Everything a step may touch
pub(crate) struct StepContext<'a, K> {
    pub store: &'a mut ReadingStore,
    pub keys: &'a mut K,
    pub config: &'a BridgeConfig,
    pub now: u32,
}

impl<K: KeyPress> StepContext<'_, K> {
    fn mode(&self) -> DisplayMode {
        self.store.mode()
    }

    fn expect(&self, expected: DisplayMode) -> Result<(), SequenceError> {
        let actual = self.mode();
        if actual != expected {
            error!("expected {:?} screen, display shows {:?}", expected, actual);
            return Err(SequenceError::ModeMismatch { expected, actual });
        }
        Ok(())
    }

    fn press(&mut self, key: KeyCode, hold_ms: u32) -> Result<(), SequenceError> {
        self.keys.press(key, hold_ms, self.now)?;
        Ok(())
    }

    fn tap(&mut self, key: KeyCode) -> Result<(), SequenceError> {
        self.press(key, self.config.short_press_ms)
    }

    fn expect_and_press(&mut self, expected: DisplayMode, key: KeyCode, hold_ms: u32) -> Result<(), SequenceError> {
        self.expect(expected)?;
        self.press(key, hold_ms)
    }

    /// Value shown on the set-temp screen
    fn shown_target(&self) -> Result<i8, SequenceError> {
        match self.store.provisional_temp() {
            INVALID_TEMP => {
                error!("set temp screen unreadable");
                Err(SequenceError::Unreadable)
            }
            value => Ok(value),
        }
    }
}

/// Where a sequence currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Progress<S> {
    Preamble(PreambleStep),
    Body(S),
}

impl<S: Copy> Progress<S> {
    /// Run one step; `Ok(None)` when the sequence is finished
    pub(crate) fn advance<K: KeyPress>(
        self,
        first: S,
        cx: &mut StepContext<'_, K>,
        body: impl FnOnce(S, &mut StepContext<'_, K>) -> Result<Option<S>, SequenceError>,
    ) -> Result<Option<Self>, SequenceError> {
        match self {
            Progress::Preamble(step) => Ok(Some(match step.run(cx)? {
                Some(next) => Progress::Preamble(next),
                None => Progress::Body(first),
            })),
            Progress::Body(step) => Ok(body(step, cx)?.map(Progress::Body)),
        }
    }
}

/// Shared opening of every sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PreambleStep {
    /// Wake a blanked display with Cancel
    Wake,
    /// Long Enter to unlock the keypad
    Unlock,
    /// Vacation key: opens the vacation editor only when powered on
    OpenVacation,
    /// Read the power state off the resulting screen
    InferPower,
}

impl PreambleStep {
    /// `Ok(None)` once the panel is unlocked and the power state known
    pub(crate) fn run<K: KeyPress>(self, cx: &mut StepContext<'_, K>) -> Result<Option<Self>, SequenceError> {
        let mut step = self;
        loop {
            match step {
                PreambleStep::Wake => {
                    if cx.mode() == DisplayMode::Off {
                        cx.tap(KeyCode::Cancel)?;
                        return Ok(Some(PreambleStep::Unlock));
                    }
                    step = PreambleStep::Unlock;
                }
                PreambleStep::Unlock => {
                    if cx.mode() == DisplayMode::Locked {
                        cx.press(KeyCode::Enter, cx.config.unlock_hold_ms)?;
                        return Ok(Some(PreambleStep::OpenVacation));
                    }
                    step = PreambleStep::OpenVacation;
                }
                PreambleStep::OpenVacation => {
                    cx.expect_and_press(DisplayMode::Unlocked, KeyCode::Vacation, cx.config.short_press_ms)?;
                    return Ok(Some(PreambleStep::InferPower));
                }
                PreambleStep::InferPower => {
                    let powered = cx.mode() == DisplayMode::SetVacation;
                    cx.store.set_power_on(powered);
                    if powered {
                        cx.tap(KeyCode::Cancel)?;
                    } else {
                        cx.expect(DisplayMode::Unlocked)?;
                    }
                    return Ok(None);
                }
            }
        }
    }
}

/// Status refresh
///
/// The set-temp editor opens one step away from the committed target, so
/// the target is recovered by opening it and backing out. Up shows
/// `target + 1`; at the top of the range that is ambiguous and Down is used
/// instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RefreshStep {
    OpenAbove,
    ReadAbove,
    OpenBelow,
    ReadBelow,
    OpenDiagnostics,
    /// Index into [`DIAGNOSTIC_SCREENS`]
    Probe(u8),
    Finish,
}

impl RefreshStep {
    pub(crate) fn run<K: KeyPress>(self, cx: &mut StepContext<'_, K>) -> Result<Option<Self>, SequenceError> {
        let short = cx.config.short_press_ms;
        let combo = cx.config.combo_hold_ms;
        match self {
            RefreshStep::OpenAbove => {
                cx.expect_and_press(DisplayMode::Unlocked, KeyCode::UpArrow, short)?;
                Ok(Some(RefreshStep::ReadAbove))
            }
            RefreshStep::ReadAbove => {
                cx.expect_and_press(DisplayMode::SetTemp, KeyCode::Cancel, short)?;
                let shown = cx.shown_target()?;
                if shown >= cx.config.target_max {
                    info!("set temp shows {}, probing from below", shown);
                    return Ok(Some(RefreshStep::OpenBelow));
                }
                cx.store.set_target_temp(shown.saturating_sub(1));
                Ok(Some(RefreshStep::OpenDiagnostics))
            }
            RefreshStep::OpenBelow => {
                cx.expect_and_press(DisplayMode::Unlocked, KeyCode::DownArrow, short)?;
                Ok(Some(RefreshStep::ReadBelow))
            }
            RefreshStep::ReadBelow => {
                cx.expect_and_press(DisplayMode::SetTemp, KeyCode::Cancel, short)?;
                let shown = cx.shown_target()?;
                cx.store.set_target_temp(shown.saturating_add(1));
                Ok(Some(RefreshStep::OpenDiagnostics))
            }
            RefreshStep::OpenDiagnostics => {
                cx.expect_and_press(DisplayMode::Unlocked, KeyCode::ElectricHeaterDisinfect, combo)?;
                Ok(Some(RefreshStep::Probe(0)))
            }
            RefreshStep::Probe(index) => {
                let Some(&screen) = DIAGNOSTIC_SCREENS.get(index as usize) else {
                    return Ok(Some(RefreshStep::Finish));
                };
                if index as usize + 1 == DIAGNOSTIC_SCREENS.len() {
                    cx.expect_and_press(screen, KeyCode::ElectricHeaterDisinfect, combo)?;
                    Ok(Some(RefreshStep::Finish))
                } else {
                    cx.expect_and_press(screen, KeyCode::DownArrow, short)?;
                    Ok(Some(RefreshStep::Probe(index + 1)))
                }
            }
            RefreshStep::Finish => {
                cx.store.stamp_refresh(cx.now);
                info!("status refresh completed");
                Ok(None)
            }
        }
    }
}

/// Power change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerStep {
    Toggle,
    Reopen,
    Verify,
    /// Vacation editor being closed; carries whether the change took
    Close { applied: bool },
}

impl PowerStep {
    pub(crate) fn run<K: KeyPress>(
        self,
        target: bool,
        cx: &mut StepContext<'_, K>,
    ) -> Result<Option<Self>, SequenceError> {
        match self {
            PowerStep::Toggle => {
                cx.expect(DisplayMode::Unlocked)?;
                if cx.store.power_on() == target {
                    info!("no change, power already {}", target);
                    return Ok(None);
                }
                cx.tap(KeyCode::OnOff)?;
                Ok(Some(PowerStep::Reopen))
            }
            PowerStep::Reopen => {
                cx.expect_and_press(DisplayMode::Unlocked, KeyCode::Vacation, cx.config.short_press_ms)?;
                Ok(Some(PowerStep::Verify))
            }
            PowerStep::Verify => {
                let powered = cx.mode() == DisplayMode::SetVacation;
                cx.store.set_power_on(powered);
                let applied = powered == target;
                if applied {
                    info!("power set {}", target);
                } else {
                    error!("failed to set power {}", target);
                }
                if powered {
                    cx.tap(KeyCode::Cancel)?;
                    return Ok(Some(PowerStep::Close { applied }));
                }
                PowerStep::Close { applied }.run(target, cx)
            }
            PowerStep::Close { applied } => {
                if applied {
                    Ok(None)
                } else {
                    Err(SequenceError::NotApplied)
                }
            }
        }
    }
}

/// Target temperature change, one degree per key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TargetStep {
    OpenEditor,
    Adjust,
    Commit,
}

impl TargetStep {
    pub(crate) fn run<K: KeyPress>(self, target: i8, cx: &mut StepContext<'_, K>) -> Result<Option<Self>, SequenceError> {
        match self {
            TargetStep::OpenEditor => {
                cx.expect_and_press(DisplayMode::Unlocked, KeyCode::UpArrow, cx.config.short_press_ms)?;
                Ok(Some(TargetStep::Adjust))
            }
            TargetStep::Adjust => {
                cx.expect(DisplayMode::SetTemp)?;
                let shown = cx.shown_target()?;
                info!("set temp {} -> {}", shown, target);
                if shown == target {
                    cx.tap(KeyCode::Enter)?;
                    return Ok(Some(TargetStep::Commit));
                }
                let key = if shown < target {
                    KeyCode::UpArrow
                } else {
                    KeyCode::DownArrow
                };
                cx.tap(key)?;
                Ok(Some(TargetStep::Adjust))
            }
            TargetStep::Commit => {
                cx.expect(DisplayMode::Unlocked)?;
                cx.store.set_target_temp(target);
                info!("target temp set {}", target);
                Ok(None)
            }
        }
    }
}
