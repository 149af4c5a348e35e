//! Register dispatch
//!
//! Maps register reads onto the reading store and register writes onto
//! [`Operation`]s. Writes are validated completely before anything touches
//! the keypad.

use hpbridge_hal::KeypadColumns;
use hpbridge_protocol::registers::{decode_temperature, encode_temperature, FAILURE};
use hpbridge_protocol::{KeyPressWord, LinkErrorCode, Register};

use crate::appliance::{Appliance, Operation};
use crate::config::BridgeConfig;
use crate::keypad::KeyPosition;
use crate::sequence::{SequenceError, SequenceKind, SequenceResult};
use crate::store::ReadingStore;

/// Why a register access was refused outright
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegisterError {
    UnknownAddress(u16),
    ReadOnly(u16),
    /// Value outside what the register accepts
    OutOfRange { address: u16, value: u16 },
}

impl From<RegisterError> for LinkErrorCode {
    fn from(err: RegisterError) -> Self {
        match err {
            RegisterError::UnknownAddress(_) => LinkErrorCode::UnknownAddress,
            RegisterError::ReadOnly(_) => LinkErrorCode::ReadOnly,
            RegisterError::OutOfRange { .. } => LinkErrorCode::OutOfRange,
        }
    }
}

/// Read one register
///
/// Coils and holding registers read back the state they control: the
/// refresh coil reads 1 while a refresh runs, the press-key register reads
/// the held key or 0.
pub fn read_register<C: KeypadColumns>(appliance: &Appliance<'_, C>, address: u16) -> Result<u16, RegisterError> {
    let register = Register::from_address(address).ok_or(RegisterError::UnknownAddress(address))?;
    let store = appliance.store();
    Ok(match register {
        Register::Refresh => {
            u16::from(appliance.sequencer().active_kind() == Some(SequenceKind::RefreshStatus))
        }
        Register::PressKey => appliance
            .keypad()
            .held()
            .map(|held| {
                KeyPressWord {
                    code: held.position.code(),
                    duration_ms: held.duration_ms,
                }
                .to_word()
            })
            .unwrap_or(0),
        _ => read_store(store, register, appliance.now()),
    })
}

fn read_store(store: &ReadingStore, register: Register, now: u32) -> u16 {
    match register {
        Register::Mode => store.mode().code(),
        Register::StatusAge => store.status_age_secs(now),
        Register::StatusFlags => store.status_flags().bits(),
        Register::Temperature(sensor) => encode_temperature(store.temperature(sensor)),
        Register::Power => u16::from(store.power_on()),
        Register::TargetTemp => encode_temperature(store.target_temp()),
        // Not backed by the store
        Register::Refresh | Register::PressKey => 0,
    }
}

/// A validated register write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Command {
    pub address: u16,
    pub value: u16,
    pub operation: Operation,
}

impl Command {
    /// Validate a write of `value` to `address`
    pub fn parse(address: u16, value: u16, config: &BridgeConfig) -> Result<Self, RegisterError> {
        let register = Register::from_address(address).ok_or(RegisterError::UnknownAddress(address))?;
        if !register.is_writable() {
            return Err(RegisterError::ReadOnly(address));
        }
        let out_of_range = RegisterError::OutOfRange { address, value };
        let operation = match register {
            Register::Refresh => Operation::Sequence(SequenceKind::RefreshStatus),
            Register::Power => match value {
                0 => Operation::Sequence(SequenceKind::SetPower(false)),
                1 => Operation::Sequence(SequenceKind::SetPower(true)),
                _ => return Err(out_of_range),
            },
            Register::TargetTemp => {
                let celsius = decode_temperature(value).ok_or(out_of_range)?;
                if !config.target_in_range(celsius as i32) {
                    return Err(out_of_range);
                }
                Operation::Sequence(SequenceKind::SetTargetTemp(celsius))
            }
            Register::PressKey => {
                let word = KeyPressWord::from_word(value);
                let position = KeyPosition::from_code(word.code);
                if !position.is_valid() {
                    return Err(out_of_range);
                }
                Operation::PressKey {
                    position,
                    duration_ms: word.duration_ms,
                }
            }
            Register::Mode | Register::StatusAge | Register::StatusFlags | Register::Temperature(_) => {
                return Err(RegisterError::ReadOnly(address))
            }
        };
        Ok(Self {
            address,
            value,
            operation,
        })
    }

    /// Value to answer with once the operation has ended
    pub fn reply(&self, result: SequenceResult) -> u16 {
        match result {
            Ok(()) => self.value,
            Err(err) => {
                error!("write {} = {} failed: {:?}", self.address, self.value, err);
                FAILURE
            }
        }
    }
}

/// Map an operation that could not even be started onto a link error
pub fn start_error_code(err: SequenceError) -> LinkErrorCode {
    match err {
        SequenceError::Busy | SequenceError::Key(_) => LinkErrorCode::Busy,
        SequenceError::OutOfRange => LinkErrorCode::OutOfRange,
        _ => LinkErrorCode::Malformed,
    }
}

/// Write one register and wait for the operation to finish
///
/// Answers with the written value on success, [`FAILURE`] otherwise.
pub fn write_register<'a, C: KeypadColumns>(
    appliance: &mut Appliance<'a, C>,
    address: u16,
    value: u16,
    pump: impl FnMut(&mut Appliance<'a, C>),
) -> Result<u16, RegisterError> {
    let command = Command::parse(address, value, appliance.config())?;
    info!("write {} = {}", address, value);
    let result = appliance.run_blocking(command.operation, pump);
    Ok(command.reply(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypad::{KeyCode, KeySlot};
    use hpbridge_protocol::registers::{
        ADDR_MODE, ADDR_POWER, ADDR_PRESS_KEY, ADDR_REFRESH, ADDR_STATUS_FLAGS, ADDR_TARGET_TEMP,
    };

    #[derive(Default)]
    struct NullColumns;

    impl KeypadColumns for NullColumns {
        fn release_all(&mut self) {}

        fn gpio_number(&self, column: u8) -> Option<u8> {
            (column < 3).then_some(column)
        }

        fn drive(&mut self, _column: u8, _idle_high: bool) {}

        fn is_driving(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_target_write_is_range_checked() {
        let config = BridgeConfig::default();
        assert!(Command::parse(ADDR_TARGET_TEMP, encode_temperature(38), &config).is_ok());
        assert!(Command::parse(ADDR_TARGET_TEMP, encode_temperature(60), &config).is_ok());
        assert_eq!(
            Command::parse(ADDR_TARGET_TEMP, encode_temperature(61), &config),
            Err(RegisterError::OutOfRange {
                address: ADDR_TARGET_TEMP,
                value: 189
            })
        );
        assert!(Command::parse(ADDR_TARGET_TEMP, 0xFFFF, &config).is_err());

        let command = Command::parse(ADDR_TARGET_TEMP, 173, &config).unwrap();
        assert_eq!(
            command.operation,
            Operation::Sequence(SequenceKind::SetTargetTemp(45))
        );
    }

    #[test]
    fn test_power_and_refresh_writes() {
        let config = BridgeConfig::default();
        assert_eq!(
            Command::parse(ADDR_POWER, 1, &config).map(|c| c.operation),
            Ok(Operation::Sequence(SequenceKind::SetPower(true)))
        );
        assert!(Command::parse(ADDR_POWER, 2, &config).is_err());
        assert_eq!(
            Command::parse(ADDR_REFRESH, 1234, &config).map(|c| c.operation),
            Ok(Operation::Sequence(SequenceKind::RefreshStatus))
        );
    }

    #[test]
    fn test_press_key_write() {
        let config = BridgeConfig::default();
        let command = Command::parse(ADDR_PRESS_KEY, 0x2203, &config).unwrap();
        assert_eq!(
            command.operation,
            Operation::PressKey {
                position: KeyCode::OnOff.position(),
                duration_ms: 300
            }
        );
        // Column 3 does not exist
        assert!(Command::parse(ADDR_PRESS_KEY, 0x3001, &config).is_err());
    }

    #[test]
    fn test_input_registers_refuse_writes() {
        let config = BridgeConfig::default();
        assert_eq!(
            Command::parse(ADDR_MODE, 0, &config),
            Err(RegisterError::ReadOnly(ADDR_MODE))
        );
        assert_eq!(
            Command::parse(999, 0, &config),
            Err(RegisterError::UnknownAddress(999))
        );
        assert_eq!(
            Command::parse(ADDR_STATUS_FLAGS, 1, &config),
            Err(RegisterError::ReadOnly(ADDR_STATUS_FLAGS))
        );
        assert_eq!(LinkErrorCode::from(RegisterError::ReadOnly(100)), LinkErrorCode::ReadOnly);
    }

    #[test]
    fn test_reply_values() {
        let config = BridgeConfig::default();
        let command = Command::parse(ADDR_POWER, 1, &config).unwrap();
        assert_eq!(command.reply(Ok(())), 1);
        assert_eq!(command.reply(Err(SequenceError::NotApplied)), FAILURE);
    }

    #[test]
    fn test_reads_before_any_refresh() {
        let slot = KeySlot::new();
        let appliance = Appliance::new(BridgeConfig::default(), NullColumns, &slot);
        assert_eq!(read_register(&appliance, ADDR_MODE), Ok(0));
        assert_eq!(read_register(&appliance, 101), Ok(0xFFFF));
        assert_eq!(read_register(&appliance, 102), Ok(0));
        // Unreadable temperatures go out as 0 after biasing
        assert_eq!(read_register(&appliance, 103), Ok(0));
        assert_eq!(read_register(&appliance, ADDR_REFRESH), Ok(0));
        assert_eq!(read_register(&appliance, ADDR_PRESS_KEY), Ok(0));
        assert_eq!(read_register(&appliance, 42), Err(RegisterError::UnknownAddress(42)));
    }

    #[test]
    fn test_press_key_reads_back_held_key() {
        let slot = KeySlot::new();
        let mut appliance = Appliance::new(BridgeConfig::default(), NullColumns, &slot);
        let command = Command::parse(ADDR_PRESS_KEY, 0x1105, &BridgeConfig::default()).unwrap();
        appliance.begin(command.operation).unwrap();
        assert_eq!(read_register(&appliance, ADDR_PRESS_KEY), Ok(0x1105));
    }

    #[test]
    fn test_out_of_range_write_never_presses() {
        let slot = KeySlot::new();
        let mut appliance = Appliance::new(BridgeConfig::default(), NullColumns, &slot);
        let result = write_register(&mut appliance, ADDR_TARGET_TEMP, encode_temperature(70), |_| {
            panic!("no loop pass expected")
        });
        assert!(matches!(result, Err(RegisterError::OutOfRange { .. })));
        assert!(slot.snapshot().is_none());
    }
}
