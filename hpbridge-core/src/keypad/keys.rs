//! Appliance keys and their matrix positions

/// A (column, row) location on the keypad matrix
///
/// Not validated on construction: raw codes from the register map may point
/// outside the matrix, and the keypad rejects those when asked to press them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyPosition {
    pub column: u8,
    pub row: u8,
}

impl KeyPosition {
    /// Highest column the bridge can drive
    pub const MAX_COLUMN: u8 = 2;
    /// Highest row the appliance scans
    pub const MAX_ROW: u8 = 3;

    /// Split a packed `column * 16 + row` code
    pub const fn from_code(code: u8) -> Self {
        Self {
            column: code >> 4,
            row: code & 0x0F,
        }
    }

    pub const fn code(self) -> u8 {
        (self.column << 4) | (self.row & 0x0F)
    }

    pub fn is_valid(self) -> bool {
        self.column <= Self::MAX_COLUMN && self.row <= Self::MAX_ROW
    }
}

/// Named keys of the appliance front panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyCode {
    ElectricHeater,
    Vacation,
    Disinfect,
    /// Electric heater and disinfect held together (diagnostics menu)
    ElectricHeaterDisinfect,
    UpArrow,
    Enter,
    DownArrow,
    ClockTimer,
    Cancel,
    OnOff,
}

impl KeyCode {
    pub const ALL: [KeyCode; 10] = [
        KeyCode::ElectricHeater,
        KeyCode::Vacation,
        KeyCode::Disinfect,
        KeyCode::ElectricHeaterDisinfect,
        KeyCode::UpArrow,
        KeyCode::Enter,
        KeyCode::DownArrow,
        KeyCode::ClockTimer,
        KeyCode::Cancel,
        KeyCode::OnOff,
    ];

    /// Packed `column * 16 + row` code
    pub const fn code(self) -> u8 {
        match self {
            KeyCode::ElectricHeater => 0x00,
            KeyCode::Vacation => 0x01,
            KeyCode::Disinfect => 0x02,
            KeyCode::ElectricHeaterDisinfect => 0x03,
            KeyCode::UpArrow => 0x10,
            KeyCode::Enter => 0x11,
            KeyCode::DownArrow => 0x12,
            KeyCode::ClockTimer => 0x20,
            KeyCode::Cancel => 0x21,
            KeyCode::OnOff => 0x22,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|key| key.code() == code)
    }

    pub const fn position(self) -> KeyPosition {
        KeyPosition::from_code(self.code())
    }
}

impl From<KeyCode> for KeyPosition {
    fn from(key: KeyCode) -> Self {
        key.position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_keys_sit_inside_matrix() {
        for key in KeyCode::ALL {
            assert!(key.position().is_valid(), "{:?}", key);
            assert_eq!(KeyCode::from_code(key.code()), Some(key));
        }
    }

    #[test]
    fn test_position_split() {
        let pos = KeyCode::OnOff.position();
        assert_eq!(pos, KeyPosition { column: 2, row: 2 });
        assert_eq!(KeyPosition::from_code(0x31).column, 3);
        assert!(!KeyPosition::from_code(0x31).is_valid());
        assert!(!KeyPosition::from_code(0x04).is_valid());
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(KeyCode::from_code(0x13), None);
    }
}
