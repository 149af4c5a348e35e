//! Keypad column pins
//!
//! A column pin rests as an input so the real membrane keys keep working.
//! Arming a key turns its output driver on; from then on the interception
//! core toggles the output latch through SIO directly.

use embassy_rp::gpio::{AnyPin, Flex, Pin};
use embassy_rp::Peri;
use hpbridge_hal::{OutputPin, TriStatePin};

/// One keypad column line
pub struct SioColumn {
    pin: Flex<'static>,
    gpio: u8,
}

impl SioColumn {
    /// Take a pin as a released column
    pub fn new(pin: Peri<'static, AnyPin>) -> Self {
        let gpio = pin.pin();
        let mut pin = Flex::new(pin);
        pin.set_as_input();
        Self { pin, gpio }
    }
}

impl OutputPin for SioColumn {
    fn set_high(&mut self) {
        self.pin.set_high();
    }

    fn set_low(&mut self) {
        self.pin.set_low();
    }

    fn is_set_high(&self) -> bool {
        self.pin.is_set_high()
    }
}

impl TriStatePin for SioColumn {
    fn enable_output(&mut self) {
        self.pin.set_as_output();
    }

    fn disable_output(&mut self) {
        self.pin.set_as_input();
    }

    fn is_output_enabled(&self) -> bool {
        self.pin.is_set_as_output()
    }

    fn gpio_number(&self) -> u8 {
        self.gpio
    }
}
