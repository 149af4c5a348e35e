//! PIO-based display bus capture
//!
//! The display controller talks to its driver over a clocked serial bus:
//! chip select active low, clock idle high, data valid on the falling
//! clock edge. One state machine samples a whole burst per chip select
//! and raises IRQ 0 when it is done, see [`crate::burst`] for the layout
//! of what lands in the RX FIFO.
//!
//! The three inputs must sit on consecutive GPIOs in the order DATA, CLK,
//! CS so that one `in` base covers them all.

use embassy_rp::gpio::Pull;
use embassy_rp::pio::{
    Common, Config, Direction as PioDirection, FifoJoin, Instance, Irq, Pin, PioPin, ShiftConfig,
    ShiftDirection, StateMachine,
};
use embassy_rp::Peri;
use fixed::types::U24F8;
use hpbridge_hal::DisplayCapture;

use crate::burst::{unpack_burst, CaptureError, FIFO_DEPTH};

/// Display bus capture on one PIO state machine
pub struct PioDisplayCapture<'d, PIO: Instance, const SM: usize> {
    sm: StateMachine<'d, PIO, SM>,
    irq: Irq<'d, PIO, 0>,
    _pins: [Pin<'d, PIO>; 3],
    words: [u32; FIFO_DEPTH],
}

impl<'d, PIO: Instance, const SM: usize> PioDisplayCapture<'d, PIO, SM> {
    /// Load the capture program and start sampling
    pub fn new<DATA: PioPin, CLK: PioPin, CS: PioPin>(
        common: &mut Common<'d, PIO>,
        mut sm: StateMachine<'d, PIO, SM>,
        irq: Irq<'d, PIO, 0>,
        data: Peri<'d, DATA>,
        clk: Peri<'d, CLK>,
        cs: Peri<'d, CS>,
    ) -> Self {
        // Pin indices are relative to the in base: 0 = DATA, 1 = CLK, 2 = CS
        let prg = pio::pio_asm!(
            ".wrap_target",
            "    wait 1 pin 2",  // Idle bus first
            "    wait 0 pin 2",  // Burst starts
            "    mov x, ~null",  // Bit counter, counts down
            "high:",
            "    jmp pin end",   // CS released
            "    mov osr, pins",
            "    out null, 1",
            "    out y, 1",      // y = CLK
            "    jmp y-- high",
            "    in pins, 1",    // Falling edge: sample DATA
            "    jmp x-- low",
            "low:",
            "    wait 1 pin 1",
            "    jmp high",
            "end:",
            "    push noblock",  // Leftover bits
            "    mov isr, ~x",
            "    push noblock",  // Bit count
            "    irq 0",
            ".wrap"
        );
        let installed = common.load_program(&prg.program);

        let mut data = common.make_pio_pin(data);
        let mut clk = common.make_pio_pin(clk);
        let mut cs = common.make_pio_pin(cs);
        for pin in [&mut data, &mut clk, &mut cs] {
            pin.set_pull(Pull::Down);
        }

        let mut cfg = Config::default();
        cfg.use_program(&installed, &[]);
        cfg.set_in_pins(&[&data, &clk, &cs]);
        cfg.set_jmp_pin(&cs);
        cfg.shift_in = ShiftConfig {
            threshold: 32,
            direction: ShiftDirection::Left,
            auto_fill: true,
        };
        cfg.shift_out = ShiftConfig {
            threshold: 32,
            direction: ShiftDirection::Right,
            auto_fill: false,
        };
        cfg.fifo_join = FifoJoin::RxOnly;
        // Full system clock, the loop needs a few cycles per clock phase
        cfg.clock_divider = U24F8::from_bits(1 << 8);

        sm.set_config(&cfg);
        sm.set_pin_dirs(PioDirection::In, &[&data, &clk, &cs]);
        sm.set_enable(true);

        Self {
            sm,
            irq,
            _pins: [data, clk, cs],
            words: [0; FIFO_DEPTH],
        }
    }

    /// Move everything in the RX FIFO into `words`, keeping the newest
    fn drain(&mut self) -> usize {
        let mut len = 0;
        while let Some(word) = self.sm.rx().try_pull() {
            if len == FIFO_DEPTH {
                self.words.copy_within(1.., 0);
                len -= 1;
            }
            self.words[len] = word;
            len += 1;
        }
        len
    }
}

impl<PIO: Instance, const SM: usize> DisplayCapture for PioDisplayCapture<'_, PIO, SM> {
    type Error = CaptureError;

    async fn capture(&mut self, raw: &mut [u8]) -> Result<usize, CaptureError> {
        self.irq.wait().await;
        let len = self.drain();
        unpack_burst(&self.words[..len], raw)
    }

    fn restart(&mut self) {
        self.sm.set_enable(false);
        self.sm.clear_fifos();
        self.sm.restart();
        self.sm.set_enable(true);
    }
}
