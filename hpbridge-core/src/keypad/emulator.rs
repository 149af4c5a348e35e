//! Held-key session
//!
//! The main loop arms one key at a time and releases it once its hold time
//! has passed. The row-pulse context does the actual pulsing; it learns about
//! the armed key through the [`KeySlot`] only.

use hpbridge_hal::KeypadColumns;

use super::intercept::column_idle_high;
use super::keys::{KeyCode, KeyPosition};
use super::slot::{ArmedKey, KeySlot};
use super::KeyPress;
use crate::clock::{has_elapsed, millis_since};

/// Reasons a key press is refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeypadError {
    /// Position outside the 3x4 matrix
    InvalidKey(KeyPosition),
    /// Another key is still held
    Busy,
    /// Column has no pin behind it
    NoSuchColumn(u8),
}

/// The key currently being held
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HeldKey {
    pub position: KeyPosition,
    pub gpio: u8,
    pub started_at: u32,
    pub duration_ms: u32,
}

/// Keypad emulator driven from the main loop
pub struct Keypad<'a, C> {
    columns: C,
    slot: &'a KeySlot,
    held: Option<HeldKey>,
    settle_reads: u8,
}

impl<'a, C: KeypadColumns> Keypad<'a, C> {
    pub fn new(mut columns: C, slot: &'a KeySlot) -> Self {
        slot.disarm();
        columns.release_all();
        Self {
            columns,
            slot,
            held: None,
            settle_reads: 0,
        }
    }

    /// Arm a press of `position` for `duration_ms`, starting at loop time `now`
    ///
    /// Only arms the session; the release happens in [`Keypad::on_tick`].
    pub fn press(&mut self, position: KeyPosition, duration_ms: u32, now: u32) -> Result<(), KeypadError> {
        if !position.is_valid() {
            warn!(
                "invalid key request: column {} row {}",
                position.column, position.row
            );
            return Err(KeypadError::InvalidKey(position));
        }
        if let Some(held) = self.held {
            warn!("key {:?} still held, press refused", held.position);
            return Err(KeypadError::Busy);
        }
        let gpio = self
            .columns
            .gpio_number(position.column)
            .ok_or(KeypadError::NoSuchColumn(position.column))?;

        self.columns.release_all();
        self.slot.arm(ArmedKey {
            gpio,
            row: position.row,
        });
        // Driver enable last: the row-pulse context may act as soon as it is on
        self.columns
            .drive(position.column, column_idle_high(position.row));

        self.held = Some(HeldKey {
            position,
            gpio,
            started_at: now,
            duration_ms,
        });
        self.settle_reads = 0;
        info!("key down {:?} for {} ms at {}", position, duration_ms, now);
        Ok(())
    }

    /// Release the held key once its time is up
    ///
    /// Returns the released key, if any.
    pub fn on_tick(&mut self, now: u32) -> Option<HeldKey> {
        let held = self.held?;
        self.settle_reads = 0;
        if !has_elapsed(now, held.started_at, held.duration_ms) {
            return None;
        }

        self.slot.disarm();
        self.columns.release_all();
        self.held = None;
        info!(
            "key up {:?} after {} ms",
            held.position,
            millis_since(now, held.started_at)
        );
        Some(held)
    }

    /// Drop the held key before its time, e.g. when a waiting caller gives up
    pub fn release(&mut self) -> Option<HeldKey> {
        let held = self.held.take()?;
        self.slot.disarm();
        self.columns.release_all();
        self.settle_reads = 0;
        warn!("key {:?} released early", held.position);
        Some(held)
    }

    /// Count a successfully decoded display frame
    pub fn note_frame_decoded(&mut self) {
        if self.held.is_some() {
            self.settle_reads = 0;
        } else {
            self.settle_reads = self.settle_reads.saturating_add(1);
        }
    }

    pub fn held(&self) -> Option<HeldKey> {
        self.held
    }

    pub fn is_key_down(&self) -> bool {
        self.held.is_some()
    }

    /// Frames decoded since the last key release
    pub fn settle_reads(&self) -> u8 {
        self.settle_reads
    }

    pub fn columns(&self) -> &C {
        &self.columns
    }
}

impl<C: KeypadColumns> KeyPress for Keypad<'_, C> {
    fn is_key_down(&self) -> bool {
        Keypad::is_key_down(self)
    }

    fn settle_reads(&self) -> u8 {
        Keypad::settle_reads(self)
    }

    fn press(&mut self, key: KeyCode, duration_ms: u32, now: u32) -> Result<(), KeypadError> {
        Keypad::press(self, key.position(), duration_ms, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MockColumns {
        driving: Option<(u8, bool)>,
        releases: usize,
    }

    impl KeypadColumns for MockColumns {
        fn release_all(&mut self) {
            self.driving = None;
            self.releases += 1;
        }

        fn gpio_number(&self, column: u8) -> Option<u8> {
            (column < 3).then_some(15 + column)
        }

        fn drive(&mut self, column: u8, idle_high: bool) {
            self.driving = Some((column, idle_high));
        }

        fn is_driving(&self) -> bool {
            self.driving.is_some()
        }
    }

    #[test]
    fn test_press_arms_slot_and_column() {
        let slot = KeySlot::new();
        let mut keypad = Keypad::new(MockColumns::default(), &slot);

        keypad.press(KeyCode::Cancel.position(), 100, 10).unwrap();
        assert_eq!(slot.snapshot(), Some(ArmedKey { gpio: 17, row: 1 }));
        assert_eq!(keypad.columns().driving, Some((2, true)));
        assert!(keypad.is_key_down());
    }

    #[test]
    fn test_rows_two_and_three_idle_low() {
        let slot = KeySlot::new();
        let mut keypad = Keypad::new(MockColumns::default(), &slot);
        keypad.press(KeyCode::DownArrow.position(), 100, 0).unwrap();
        assert_eq!(keypad.columns().driving, Some((1, false)));
    }

    #[test]
    fn test_held_key_released_at_duration() {
        let slot = KeySlot::new();
        let mut keypad = Keypad::new(MockColumns::default(), &slot);

        keypad.press(KeyCode::Enter.position(), 300, 1_000).unwrap();
        assert_eq!(keypad.on_tick(1_299), None);
        assert!(keypad.is_key_down());
        assert!(slot.snapshot().is_some());

        let released = keypad.on_tick(1_300).unwrap();
        assert_eq!(released.position, KeyCode::Enter.position());
        assert!(!keypad.is_key_down());
        assert_eq!(slot.snapshot(), None);
        assert!(!keypad.columns().is_driving());
    }

    #[test]
    fn test_release_across_counter_wrap() {
        let slot = KeySlot::new();
        let mut keypad = Keypad::new(MockColumns::default(), &slot);

        keypad.press(KeyCode::Enter.position(), 300, u32::MAX - 99).unwrap();
        assert_eq!(keypad.on_tick(150), None);
        assert!(keypad.on_tick(200).is_some());
    }

    #[test]
    fn test_invalid_column_is_rejected() {
        let slot = KeySlot::new();
        let mut keypad = Keypad::new(MockColumns::default(), &slot);

        let position = KeyPosition { column: 3, row: 0 };
        assert_eq!(
            keypad.press(position, 100, 0),
            Err(KeypadError::InvalidKey(position))
        );
        assert!(!keypad.is_key_down());
        assert_eq!(slot.snapshot(), None);
        assert!(!keypad.columns().is_driving());
    }

    #[test]
    fn test_second_press_is_rejected() {
        let slot = KeySlot::new();
        let mut keypad = Keypad::new(MockColumns::default(), &slot);

        keypad.press(KeyCode::UpArrow.position(), 100, 0).unwrap();
        assert_eq!(
            keypad.press(KeyCode::DownArrow.position(), 100, 10),
            Err(KeypadError::Busy)
        );
        assert_eq!(keypad.held().map(|h| h.position), Some(KeyCode::UpArrow.position()));
    }

    #[test]
    fn test_early_release_disarms() {
        let slot = KeySlot::new();
        let mut keypad = Keypad::new(MockColumns::default(), &slot);
        assert_eq!(keypad.release(), None);

        keypad.press(KeyCode::OnOff.position(), 5_000, 0).unwrap();
        assert!(keypad.release().is_some());
        assert_eq!(slot.snapshot(), None);
        assert!(!keypad.columns().is_driving());
        assert_eq!(keypad.on_tick(5_000), None);
    }

    #[test]
    fn test_settle_reads_count_only_while_released() {
        let slot = KeySlot::new();
        let mut keypad = Keypad::new(MockColumns::default(), &slot);
        keypad.note_frame_decoded();
        keypad.note_frame_decoded();
        assert_eq!(keypad.settle_reads(), 2);

        keypad.press(KeyCode::Vacation.position(), 100, 0).unwrap();
        assert_eq!(keypad.settle_reads(), 0);
        keypad.note_frame_decoded();
        assert_eq!(keypad.settle_reads(), 0);

        keypad.on_tick(100);
        keypad.note_frame_decoded();
        assert_eq!(keypad.settle_reads(), 1);
    }
}
