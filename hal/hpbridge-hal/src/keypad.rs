//! Keypad matrix line abstractions
//!
//! The appliance scans its membrane keypad by pulsing three row lines and
//! sensing three column lines. The bridge sits on the column side: to fake
//! a key it drives one column line in step with the row pulses.

use crate::gpio::TriStatePin;

/// Number of keypad column lines the bridge can drive
pub const COLUMN_COUNT: usize = 3;

/// Physical row scan lines driven by the appliance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RowLine {
    /// Row 1 scan line (also the interrupt trigger)
    First,
    /// Row 2 scan line
    Second,
    /// Row 3 scan line
    Third,
}

/// Column drive lines, as used from the cooperative main loop
///
/// Arming a key press is: release everything, preset the wanted column,
/// then enable its driver. Enabling the driver must be the last step, the
/// row-pulse context may act on the column as soon as it is driven.
pub trait KeypadColumns {
    /// Put every column line back into high impedance
    fn release_all(&mut self);

    /// GPIO number behind a column, or `None` if the column does not exist
    fn gpio_number(&self, column: u8) -> Option<u8>;

    /// Preset the column latch to `idle_high` and enable its driver
    fn drive(&mut self, column: u8, idle_high: bool);

    /// Check if any column driver is enabled
    fn is_driving(&self) -> bool;
}

/// Row inputs and column outputs as seen from the row-pulse context
///
/// Implementations must be plain register accesses: no locking, no
/// allocation, no logging. The caller busy-waits on these.
pub trait ScanLines {
    /// Sample a row scan line
    fn row_is_high(&self, row: RowLine) -> bool;

    /// Drive the column output latch of `gpio`
    fn drive_column(&mut self, gpio: u8, high: bool);
}

/// Three tri-state pins used as keypad columns
pub struct ColumnBank<P> {
    pins: [P; COLUMN_COUNT],
}

impl<P: TriStatePin> ColumnBank<P> {
    /// Create a bank; all columns start released
    pub fn new(pins: [P; COLUMN_COUNT]) -> Self {
        let mut bank = Self { pins };
        bank.release_all();
        bank
    }

    /// Access a column pin
    pub fn pin(&self, column: u8) -> Option<&P> {
        self.pins.get(column as usize)
    }
}

impl<P: TriStatePin> KeypadColumns for ColumnBank<P> {
    fn release_all(&mut self) {
        for pin in self.pins.iter_mut() {
            pin.disable_output();
        }
    }

    fn gpio_number(&self, column: u8) -> Option<u8> {
        self.pins.get(column as usize).map(|p| p.gpio_number())
    }

    fn drive(&mut self, column: u8, idle_high: bool) {
        if let Some(pin) = self.pins.get_mut(column as usize) {
            pin.set_state(idle_high);
            pin.enable_output();
        }
    }

    fn is_driving(&self) -> bool {
        self.pins.iter().any(|p| p.is_output_enabled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::OutputPin;

    struct MockPin {
        gpio: u8,
        high: bool,
        enabled: bool,
    }

    impl MockPin {
        fn new(gpio: u8) -> Self {
            Self {
                gpio,
                high: false,
                enabled: true,
            }
        }
    }

    impl OutputPin for MockPin {
        fn set_high(&mut self) {
            self.high = true;
        }

        fn set_low(&mut self) {
            self.high = false;
        }

        fn is_set_high(&self) -> bool {
            self.high
        }
    }

    impl TriStatePin for MockPin {
        fn enable_output(&mut self) {
            self.enabled = true;
        }

        fn disable_output(&mut self) {
            self.enabled = false;
        }

        fn is_output_enabled(&self) -> bool {
            self.enabled
        }

        fn gpio_number(&self) -> u8 {
            self.gpio
        }
    }

    fn bank() -> ColumnBank<MockPin> {
        ColumnBank::new([MockPin::new(15), MockPin::new(16), MockPin::new(17)])
    }

    #[test]
    fn test_new_bank_is_released() {
        let bank = bank();
        assert!(!bank.is_driving());
    }

    #[test]
    fn test_drive_presets_level_then_enables() {
        let mut bank = bank();
        bank.drive(1, true);

        let pin = bank.pin(1).unwrap();
        assert!(pin.is_output_enabled());
        assert!(pin.is_set_high());
        assert!(!bank.pin(0).unwrap().is_output_enabled());
        assert!(bank.is_driving());

        bank.release_all();
        assert!(!bank.is_driving());
    }

    #[test]
    fn test_gpio_number_lookup() {
        let bank = bank();
        assert_eq!(bank.gpio_number(0), Some(15));
        assert_eq!(bank.gpio_number(2), Some(17));
        assert_eq!(bank.gpio_number(3), None);
    }

    #[test]
    fn test_drive_out_of_range_is_ignored() {
        let mut bank = bank();
        bank.drive(5, true);
        assert!(!bank.is_driving());
    }
}
