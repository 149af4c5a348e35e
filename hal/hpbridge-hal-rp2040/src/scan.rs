//! Row scan interception on core 1
//!
//! Core 1 does nothing but watch row 1 for the start of a keypad scan and
//! answer it through [`intercept_row_pulse`]. Keeping it off the executor
//! gives the pulse protocols the sub-microsecond latency they need without
//! an interrupt handler.

use embassy_rp::gpio::Input;
use embassy_rp::pac;
use hpbridge_core::keypad::{intercept_row_pulse, KeySlot, DEFAULT_SPIN_LIMIT};
use hpbridge_hal::{RowLine, ScanLines};

/// Row inputs plus raw access to the column latches
pub struct Rp2040ScanLines {
    row1: Input<'static>,
    row2: Input<'static>,
    row3: Input<'static>,
}

impl Rp2040ScanLines {
    pub fn new(row1: Input<'static>, row2: Input<'static>, row3: Input<'static>) -> Self {
        Self { row1, row2, row3 }
    }
}

impl ScanLines for Rp2040ScanLines {
    #[inline(always)]
    fn row_is_high(&self, row: RowLine) -> bool {
        match row {
            RowLine::First => self.row1.is_high(),
            RowLine::Second => self.row2.is_high(),
            RowLine::Third => self.row3.is_high(),
        }
    }

    #[inline(always)]
    fn drive_column(&mut self, gpio: u8, high: bool) {
        // Latch only; the output enable stays with the main loop
        let mask = 1u32 << gpio;
        if high {
            pac::SIO.gpio_out(0).value_set().write_value(mask);
        } else {
            pac::SIO.gpio_out(0).value_clr().write_value(mask);
        }
    }
}

/// Core 1 entry: answer every row 1 falling edge, forever
pub fn row_scan_loop(slot: &'static KeySlot, mut lines: Rp2040ScanLines) -> ! {
    loop {
        while !lines.row_is_high(RowLine::First) {
            core::hint::spin_loop();
        }
        while lines.row_is_high(RowLine::First) {
            core::hint::spin_loop();
        }
        intercept_row_pulse(slot, &mut lines, DEFAULT_SPIN_LIMIT);
    }
}
