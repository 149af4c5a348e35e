//! GPIO pin abstractions
//!
//! The keypad column lines spend most of their life released (high
//! impedance) so the real membrane keys keep working, which is why output
//! pins here also expose their output-enable.

/// Digital output pin
pub trait OutputPin {
    /// Set the pin high (logic 1)
    fn set_high(&mut self);

    /// Set the pin low (logic 0)
    fn set_low(&mut self);

    /// Set the pin to a specific state
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Check if the output latch is currently set high
    fn is_set_high(&self) -> bool;
}

/// Output pin whose driver can be switched off (input / high impedance)
pub trait TriStatePin: OutputPin {
    /// Enable the output driver; the pin starts driving its latched level
    fn enable_output(&mut self);

    /// Disable the output driver, leaving the line floating
    fn disable_output(&mut self);

    /// Check if the output driver is enabled
    fn is_output_enabled(&self) -> bool;

    /// GPIO number of this pin
    ///
    /// Used to hand the pin to the row-pulse context without sharing the
    /// pin object itself.
    fn gpio_number(&self) -> u8;
}
