//! Last known appliance state
//!
//! Sensor temperatures are only written by the display decoder. Sequences
//! write `power_on` (inferred from the menu) and the committed target.

use hpbridge_protocol::{registers::STATUS_AGE_UNKNOWN, Sensor, StatusFlags};

use crate::clock::millis_since;
use crate::display::DisplayMode;

/// Sentinel for a temperature that could not be read
pub const INVALID_TEMP: i8 = i8::MIN;

/// Status icons shown next to the temperature on the normal screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusIcons {
    pub hot: bool,
    pub electric_heater: bool,
    pub pump: bool,
    pub vacation: bool,
}

/// Decoded appliance state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingStore {
    mode: DisplayMode,
    temperatures: [i8; Sensor::ALL.len()],
    target_temp: i8,
    provisional_temp: i8,
    icons: StatusIcons,
    power_on: bool,
    /// Loop time of the last completed refresh, 0 = never
    last_refresh_ms: u32,
}

impl Default for ReadingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadingStore {
    pub const fn new() -> Self {
        Self {
            mode: DisplayMode::Unknown,
            temperatures: [INVALID_TEMP; Sensor::ALL.len()],
            target_temp: INVALID_TEMP,
            provisional_temp: INVALID_TEMP,
            icons: StatusIcons {
                hot: false,
                electric_heater: false,
                pump: false,
                vacation: false,
            },
            power_on: false,
            last_refresh_ms: 0,
        }
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: DisplayMode) {
        if self.mode != mode {
            info!("mode: {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
    }

    pub fn temperature(&self, sensor: Sensor) -> i8 {
        self.temperatures[sensor.index()]
    }

    pub fn set_temperature(&mut self, sensor: Sensor, celsius: i8) {
        let slot = &mut self.temperatures[sensor.index()];
        if *slot != celsius {
            info!("{}: {} -> {}", sensor.label(), *slot, celsius);
            *slot = celsius;
        }
    }

    /// Committed target temperature
    pub fn target_temp(&self) -> i8 {
        self.target_temp
    }

    pub fn set_target_temp(&mut self, celsius: i8) {
        if self.target_temp != celsius {
            info!("target: {} -> {}", self.target_temp, celsius);
            self.target_temp = celsius;
        }
    }

    /// Value shown while the target is being edited
    pub fn provisional_temp(&self) -> i8 {
        self.provisional_temp
    }

    pub fn set_provisional_temp(&mut self, celsius: i8) {
        if self.provisional_temp != celsius {
            info!("set temp screen: {} -> {}", self.provisional_temp, celsius);
            self.provisional_temp = celsius;
        }
    }

    pub fn icons(&self) -> StatusIcons {
        self.icons
    }

    pub fn set_icons(&mut self, icons: StatusIcons) {
        if self.icons != icons {
            info!("icons: {:?} -> {:?}", self.icons, icons);
            self.icons = icons;
        }
    }

    pub fn power_on(&self) -> bool {
        self.power_on
    }

    pub fn set_power_on(&mut self, on: bool) {
        if self.power_on != on {
            info!("power: {} -> {}", self.power_on, on);
            self.power_on = on;
        }
    }

    /// Record a completed refresh at loop time `now`
    pub fn stamp_refresh(&mut self, now: u32) {
        // 0 is reserved for "never"
        self.last_refresh_ms = now.max(1);
    }

    pub fn last_refresh_ms(&self) -> Option<u32> {
        (self.last_refresh_ms != 0).then_some(self.last_refresh_ms)
    }

    /// Whole seconds since the last refresh, [`STATUS_AGE_UNKNOWN`] if there
    /// was none or the age does not fit
    pub fn status_age_secs(&self, now: u32) -> u16 {
        match self.last_refresh_ms() {
            None => STATUS_AGE_UNKNOWN,
            Some(at) => {
                let secs = millis_since(now, at) / 1000;
                u16::try_from(secs).unwrap_or(STATUS_AGE_UNKNOWN)
            }
        }
    }

    pub fn status_flags(&self) -> StatusFlags {
        StatusFlags::new(
            self.power_on,
            self.icons.hot,
            self.icons.electric_heater,
            self.icons.pump,
            self.icons.vacation,
        )
    }
}
