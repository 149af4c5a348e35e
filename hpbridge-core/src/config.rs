//! Bridge tunables
//!
//! Defaults match the appliance the bridge was built against. The firmware
//! overrides them from its board file at build time.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors found while validating a [`BridgeConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// At least one decoded frame is needed after a key release
    ZeroSettleReads,
    /// Target temperature range is empty
    EmptyTargetRange,
    /// A key hold or timeout is zero
    ZeroDuration,
}

/// Timing and range configuration for the decode-and-emulate loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BridgeConfig {
    /// Decoded frames required after a key release before trusting the display
    pub settle_reads: u8,
    /// Hold time of an ordinary key press (ms)
    pub short_press_ms: u32,
    /// Hold time of Enter that unlocks the keypad (ms)
    pub unlock_hold_ms: u32,
    /// Hold time of the combo that opens/closes the diagnostics menu (ms)
    pub combo_hold_ms: u32,
    /// Bound on a full status refresh (ms)
    pub refresh_timeout_ms: u32,
    /// Bound on a power change (ms)
    pub power_timeout_ms: u32,
    /// Bound on a target temperature change (ms)
    pub target_timeout_ms: u32,
    /// Extra time a raw key press may take beyond its hold time (ms)
    pub press_key_slack_ms: u32,
    /// Lowest accepted target temperature (°C)
    pub target_min: i8,
    /// Highest accepted target temperature (°C)
    pub target_max: i8,
    /// How often a waiting caller checks for completion (ms)
    pub poll_period_ms: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            settle_reads: 3,
            short_press_ms: 100,
            unlock_hold_ms: 3200,
            combo_hold_ms: 1100,
            refresh_timeout_ms: 10_000,
            power_timeout_ms: 7_000,
            target_timeout_ms: 13_000,
            press_key_slack_ms: 500,
            target_min: 38,
            target_max: 60,
            poll_period_ms: 50,
        }
    }
}

impl BridgeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.settle_reads == 0 {
            return Err(ConfigError::ZeroSettleReads);
        }
        if self.target_min >= self.target_max {
            return Err(ConfigError::EmptyTargetRange);
        }
        let durations = [
            self.short_press_ms,
            self.unlock_hold_ms,
            self.combo_hold_ms,
            self.refresh_timeout_ms,
            self.power_timeout_ms,
            self.target_timeout_ms,
            self.poll_period_ms,
        ];
        if durations.contains(&0) {
            return Err(ConfigError::ZeroDuration);
        }
        Ok(())
    }

    /// Check a requested target temperature against the accepted range
    pub fn target_in_range(&self, celsius: i32) -> bool {
        (self.target_min as i32..=self.target_max as i32).contains(&celsius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(BridgeConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_target_range_is_inclusive() {
        let config = BridgeConfig::default();
        assert!(config.target_in_range(38));
        assert!(config.target_in_range(60));
        assert!(!config.target_in_range(37));
        assert!(!config.target_in_range(61));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = BridgeConfig {
            settle_reads: 0,
            ..BridgeConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroSettleReads));

        let config = BridgeConfig {
            target_min: 60,
            target_max: 38,
            ..BridgeConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyTargetRange));

        let config = BridgeConfig {
            combo_hold_ms: 0,
            ..BridgeConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroDuration));
    }
}
