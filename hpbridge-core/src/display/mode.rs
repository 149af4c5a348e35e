//! Screens the appliance can show

use hpbridge_protocol::Sensor;

/// Decoded screen currently shown on the appliance display
///
/// The numeric codes are what input register 100 reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayMode {
    /// Nothing decoded yet
    #[default]
    Unknown,
    /// Display blanked (appliance asleep)
    Off,
    /// Normal screen, keypad locked
    Locked,
    /// Diagnostics: storage tank upper probe
    InfoTankUpper,
    /// Diagnostics: storage tank lower probe
    InfoTankLower,
    /// Diagnostics: evaporator probe
    InfoEvaporator,
    /// Diagnostics: ambient probe
    InfoAmbient,
    /// Diagnostics: discharge probe
    InfoDischarge,
    /// Diagnostics: suction probe
    InfoSuction,
    /// Diagnostics: "CE" screen
    InfoCe,
    /// Error code E1
    ErrorEr1,
    /// Error code E2
    ErrorEr2,
    /// Error code E3
    ErrorEr3,
    /// Error code d7F
    ErrorD7f,
    /// Clock being edited
    SetClock,
    /// Target temperature being edited
    SetTemp,
    /// Normal screen, keypad unlocked
    Unlocked,
    /// Vacation days being edited (only reachable with power on)
    SetVacation,
    /// Vacation mode active
    Vacation,
}

impl DisplayMode {
    /// Wire code reported through the register map
    pub fn code(self) -> u16 {
        match self {
            DisplayMode::Unknown => 0,
            DisplayMode::Off => 1,
            DisplayMode::Locked => 2,
            DisplayMode::InfoTankUpper => 4,
            DisplayMode::InfoTankLower => 5,
            DisplayMode::InfoEvaporator => 6,
            DisplayMode::InfoAmbient => 7,
            DisplayMode::InfoDischarge => 8,
            DisplayMode::InfoSuction => 9,
            DisplayMode::InfoCe => 10,
            DisplayMode::ErrorEr1 => 11,
            DisplayMode::ErrorEr2 => 12,
            DisplayMode::ErrorEr3 => 13,
            DisplayMode::ErrorD7f => 14,
            DisplayMode::SetClock => 15,
            DisplayMode::SetTemp => 16,
            DisplayMode::Unlocked => 17,
            DisplayMode::SetVacation => 18,
            DisplayMode::Vacation => 19,
        }
    }

    /// Inverse of [`DisplayMode::code`]; code 3 is reserved
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|mode| mode.code() == code)
    }

    pub const ALL: [DisplayMode; 19] = [
        DisplayMode::Unknown,
        DisplayMode::Off,
        DisplayMode::Locked,
        DisplayMode::InfoTankUpper,
        DisplayMode::InfoTankLower,
        DisplayMode::InfoEvaporator,
        DisplayMode::InfoAmbient,
        DisplayMode::InfoDischarge,
        DisplayMode::InfoSuction,
        DisplayMode::InfoCe,
        DisplayMode::ErrorEr1,
        DisplayMode::ErrorEr2,
        DisplayMode::ErrorEr3,
        DisplayMode::ErrorD7f,
        DisplayMode::SetClock,
        DisplayMode::SetTemp,
        DisplayMode::Unlocked,
        DisplayMode::SetVacation,
        DisplayMode::Vacation,
    ];

    /// Probe whose value this diagnostics screen shows
    pub fn probe(self) -> Option<Sensor> {
        match self {
            DisplayMode::InfoTankUpper => Some(Sensor::TankUpper),
            DisplayMode::InfoTankLower => Some(Sensor::TankLower),
            DisplayMode::InfoEvaporator => Some(Sensor::Evaporator),
            DisplayMode::InfoAmbient => Some(Sensor::Ambient),
            DisplayMode::InfoDischarge => Some(Sensor::Discharge),
            DisplayMode::InfoSuction => Some(Sensor::Suction),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique_and_skip_reserved() {
        for (i, a) in DisplayMode::ALL.iter().enumerate() {
            assert_ne!(a.code(), 3);
            for b in &DisplayMode::ALL[i + 1..] {
                assert_ne!(a.code(), b.code());
            }
        }
    }

    #[test]
    fn test_from_code() {
        assert_eq!(DisplayMode::from_code(17), Some(DisplayMode::Unlocked));
        assert_eq!(DisplayMode::from_code(4), Some(DisplayMode::InfoTankUpper));
        assert_eq!(DisplayMode::from_code(3), None);
        assert_eq!(DisplayMode::from_code(20), None);
    }
}
