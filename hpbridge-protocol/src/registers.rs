//! Register map exposed by the bridge
//!
//! Addresses follow the three classic blocks:
//!
//! | Block   | Address | Meaning                                   |
//! |---------|---------|-------------------------------------------|
//! | input   | 100     | display mode code                         |
//! | input   | 101     | seconds since last refresh                |
//! | input   | 102     | status flag bitmask                       |
//! | input   | 103-109 | temperatures, +128 biased                 |
//! | coil    | 200     | refresh all readings                      |
//! | coil    | 210     | appliance power                           |
//! | holding | 300     | target temperature, +128 biased           |
//! | holding | 310     | press key, `(code << 8) \| (ms / 100)`    |
//!
//! Writes answer with the written value, or [`FAILURE`] if the operation
//! did not succeed.

/// Value returned for any failed read or write
pub const FAILURE: u16 = 0xFFFF;

/// Status age reported before the first refresh, or when it no longer fits
pub const STATUS_AGE_UNKNOWN: u16 = 0xFFFF;

/// Offset added to signed temperatures on the wire
pub const TEMPERATURE_BIAS: i16 = 128;

pub const ADDR_MODE: u16 = 100;
pub const ADDR_STATUS_AGE: u16 = 101;
pub const ADDR_STATUS_FLAGS: u16 = 102;
pub const ADDR_TEMPERATURE_BASE: u16 = 103;
pub const ADDR_REFRESH: u16 = 200;
pub const ADDR_POWER: u16 = 210;
pub const ADDR_TARGET_TEMP: u16 = 300;
pub const ADDR_PRESS_KEY: u16 = 310;

/// Temperature sensors as laid out in the input register block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Sensor {
    /// Value shown on the normal screen
    Current,
    /// Storage tank, upper probe (T5U)
    TankUpper,
    /// Storage tank, lower probe (T5L)
    TankLower,
    /// Evaporator coil (T3)
    Evaporator,
    /// Outdoor ambient (T4)
    Ambient,
    /// Compressor discharge (TP)
    Discharge,
    /// Compressor suction (Th)
    Suction,
}

impl Sensor {
    /// All sensors, in register order
    pub const ALL: [Sensor; 7] = [
        Sensor::Current,
        Sensor::TankUpper,
        Sensor::TankLower,
        Sensor::Evaporator,
        Sensor::Ambient,
        Sensor::Discharge,
        Sensor::Suction,
    ];

    /// Position in [`Sensor::ALL`]
    pub fn index(self) -> usize {
        match self {
            Sensor::Current => 0,
            Sensor::TankUpper => 1,
            Sensor::TankLower => 2,
            Sensor::Evaporator => 3,
            Sensor::Ambient => 4,
            Sensor::Discharge => 5,
            Sensor::Suction => 6,
        }
    }

    /// Short label used on the appliance's diagnostic screens
    pub fn label(self) -> &'static str {
        match self {
            Sensor::Current => "current",
            Sensor::TankUpper => "T5U",
            Sensor::TankLower => "T5L",
            Sensor::Evaporator => "T3",
            Sensor::Ambient => "T4",
            Sensor::Discharge => "TP",
            Sensor::Suction => "Th",
        }
    }
}

/// A decoded register address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    Mode,
    StatusAge,
    StatusFlags,
    Temperature(Sensor),
    Refresh,
    Power,
    TargetTemp,
    PressKey,
}

impl Register {
    /// Look up a register by address
    pub fn from_address(address: u16) -> Option<Self> {
        match address {
            ADDR_MODE => Some(Register::Mode),
            ADDR_STATUS_AGE => Some(Register::StatusAge),
            ADDR_STATUS_FLAGS => Some(Register::StatusFlags),
            ADDR_REFRESH => Some(Register::Refresh),
            ADDR_POWER => Some(Register::Power),
            ADDR_TARGET_TEMP => Some(Register::TargetTemp),
            ADDR_PRESS_KEY => Some(Register::PressKey),
            a if a >= ADDR_TEMPERATURE_BASE
                && a < ADDR_TEMPERATURE_BASE + Sensor::ALL.len() as u16 =>
            {
                Some(Register::Temperature(
                    Sensor::ALL[(a - ADDR_TEMPERATURE_BASE) as usize],
                ))
            }
            _ => None,
        }
    }

    /// Address of this register
    pub fn address(self) -> u16 {
        match self {
            Register::Mode => ADDR_MODE,
            Register::StatusAge => ADDR_STATUS_AGE,
            Register::StatusFlags => ADDR_STATUS_FLAGS,
            Register::Temperature(sensor) => ADDR_TEMPERATURE_BASE + sensor.index() as u16,
            Register::Refresh => ADDR_REFRESH,
            Register::Power => ADDR_POWER,
            Register::TargetTemp => ADDR_TARGET_TEMP,
            Register::PressKey => ADDR_PRESS_KEY,
        }
    }

    /// Coils and holding registers accept writes, input registers don't
    pub fn is_writable(self) -> bool {
        matches!(
            self,
            Register::Refresh | Register::Power | Register::TargetTemp | Register::PressKey
        )
    }
}

/// Encode a signed temperature for the wire
pub fn encode_temperature(celsius: i8) -> u16 {
    (celsius as i16 + TEMPERATURE_BIAS) as u16
}

/// Decode a biased wire temperature, `None` if it does not fit an `i8`
pub fn decode_temperature(value: u16) -> Option<i8> {
    let celsius = value as i32 - TEMPERATURE_BIAS as i32;
    i8::try_from(celsius).ok()
}

/// Status flag bitmask (input register 102)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusFlags(u16);

impl StatusFlags {
    pub const POWER: u16 = 1 << 0;
    pub const HOT: u16 = 1 << 1;
    pub const ELECTRIC_HEATER: u16 = 1 << 2;
    pub const PUMP: u16 = 1 << 3;
    pub const VACATION: u16 = 1 << 4;

    pub fn new(power: bool, hot: bool, electric_heater: bool, pump: bool, vacation: bool) -> Self {
        let mut bits = 0;
        for (set, bit) in [
            (power, Self::POWER),
            (hot, Self::HOT),
            (electric_heater, Self::ELECTRIC_HEATER),
            (pump, Self::PUMP),
            (vacation, Self::VACATION),
        ] {
            if set {
                bits |= bit;
            }
        }
        Self(bits)
    }

    pub fn bits(self) -> u16 {
        self.0
    }

    pub fn contains(self, bit: u16) -> bool {
        self.0 & bit == bit
    }
}

/// Press-key holding register value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyPressWord {
    /// Raw key code, `column * 16 + row`
    pub code: u8,
    /// Hold duration, 100 ms resolution
    pub duration_ms: u32,
}

impl KeyPressWord {
    pub fn from_word(word: u16) -> Self {
        Self {
            code: (word >> 8) as u8,
            duration_ms: (word & 0xFF) as u32 * 100,
        }
    }

    /// Pack into a register value; durations are truncated to 100 ms steps
    /// and saturate at 25.5 s
    pub fn to_word(self) -> u16 {
        let steps = (self.duration_ms / 100).min(0xFF) as u16;
        ((self.code as u16) << 8) | steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_lookup_covers_map() {
        assert_eq!(Register::from_address(100), Some(Register::Mode));
        assert_eq!(Register::from_address(101), Some(Register::StatusAge));
        assert_eq!(Register::from_address(102), Some(Register::StatusFlags));
        assert_eq!(
            Register::from_address(103),
            Some(Register::Temperature(Sensor::Current))
        );
        assert_eq!(
            Register::from_address(109),
            Some(Register::Temperature(Sensor::Suction))
        );
        assert_eq!(Register::from_address(110), None);
        assert_eq!(Register::from_address(200), Some(Register::Refresh));
        assert_eq!(Register::from_address(210), Some(Register::Power));
        assert_eq!(Register::from_address(300), Some(Register::TargetTemp));
        assert_eq!(Register::from_address(310), Some(Register::PressKey));
        assert_eq!(Register::from_address(0), None);
    }

    #[test]
    fn test_address_is_inverse_of_lookup() {
        for address in 0..400 {
            if let Some(register) = Register::from_address(address) {
                assert_eq!(register.address(), address);
            }
        }
    }

    #[test]
    fn test_input_registers_are_read_only() {
        assert!(!Register::Mode.is_writable());
        assert!(!Register::Temperature(Sensor::Ambient).is_writable());
        assert!(Register::Power.is_writable());
        assert!(Register::PressKey.is_writable());
    }

    #[test]
    fn test_temperature_bias() {
        assert_eq!(encode_temperature(0), 128);
        assert_eq!(encode_temperature(-9), 119);
        assert_eq!(encode_temperature(45), 173);
        assert_eq!(encode_temperature(i8::MIN), 0);
        assert_eq!(decode_temperature(173), Some(45));
        assert_eq!(decode_temperature(0), Some(i8::MIN));
        assert_eq!(decode_temperature(256), None);
    }

    #[test]
    fn test_status_flag_bit_order() {
        let flags = StatusFlags::new(true, false, true, false, true);
        assert_eq!(flags.bits(), 0b1_0101);
        assert!(flags.contains(StatusFlags::POWER));
        assert!(!flags.contains(StatusFlags::HOT));
        assert!(flags.contains(StatusFlags::VACATION));
    }

    #[test]
    fn test_key_press_word() {
        let word = KeyPressWord::from_word(0x2203);
        assert_eq!(word.code, 0x22);
        assert_eq!(word.duration_ms, 300);
        assert_eq!(word.to_word(), 0x2203);

        let long = KeyPressWord {
            code: 0x11,
            duration_ms: 60_000,
        };
        assert_eq!(long.to_word(), 0x11FF);
    }
}
