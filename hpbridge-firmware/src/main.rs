//! hpbridge - Heat Pump Display/Keypad Bridge Firmware
//!
//! Sits between a heat pump's controller and its front panel: reads the
//! display bus to learn what the appliance shows, and fakes presses on the
//! membrane keypad to change its settings. Readings and commands are
//! served as registers over a serial link.
//!
//! Core 0 runs the Embassy executor (main loop, display capture, register
//! link). Core 1 only answers keypad row scans.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::multicore::{spawn_core1, Stack};
use embassy_rp::pio::Pio;
use embassy_rp::uart::{Config as UartConfig, Uart};
use embassy_sync::mutex::Mutex;
use static_cell::{ConstStaticCell, StaticCell};
use {defmt_rtt as _, panic_probe as _};

use hpbridge_core::{Appliance, BridgeConfig};
use hpbridge_hal::ColumnBank;
use hpbridge_hal_rp2040::{row_scan_loop, PioDisplayCapture, Rp2040ScanLines, SioColumn};

use crate::board::{bridge_config, Board, Irqs, LINK_BAUD};
use crate::channels::{SharedAppliance, KEY_SLOT};

mod board;
mod channels;
mod tasks;

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 64]> = StaticCell::new();

static CORE1_STACK: ConstStaticCell<Stack<4096>> = ConstStaticCell::new(Stack::new());
static APPLIANCE: StaticCell<SharedAppliance> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("hpbridge firmware starting...");

    let p = embassy_rp::init(Default::default());
    let board = Board::take(p);
    info!("Peripherals initialized");

    let mut config = bridge_config();
    if let Err(e) = config.validate() {
        error!("Invalid timing in bridge.toml: {:?}, using defaults", e);
        config = BridgeConfig::default();
    }
    info!("Config: {:?}", config);

    // Keypad columns start released; the appliance driver owns them from here
    let [c0, c1, c2] = board.columns;
    let columns = ColumnBank::new([SioColumn::new(c0), SioColumn::new(c1), SioColumn::new(c2)]);
    let appliance = APPLIANCE.init(Mutex::new(Appliance::new(config, columns, &KEY_SLOT)));

    // Core 1 stands in for the row-1 falling-edge interrupt: it spins on the
    // row lines so pulse timing never waits behind the executor
    let [r0, r1, r2] = board.rows;
    let lines = Rp2040ScanLines::new(
        Input::new(r0, Pull::None),
        Input::new(r1, Pull::None),
        Input::new(r2, Pull::None),
    );
    spawn_core1(board.core1, CORE1_STACK.take(), move || {
        row_scan_loop(&KEY_SLOT, lines)
    });
    info!("Row scan running on core 1");

    // Display bus capture on PIO0 SM0
    let Pio {
        mut common,
        sm0,
        irq0,
        ..
    } = Pio::new(board.pio, Irqs);
    let capture = PioDisplayCapture::new(
        &mut common,
        sm0,
        irq0,
        board.display_data,
        board.display_clk,
        board.display_cs,
    );
    info!("Display capture initialized");

    // Register link
    let tx_buf = TX_BUF.init([0u8; 64]);
    let rx_buf = RX_BUF.init([0u8; 64]);
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = LINK_BAUD;
    let uart = Uart::new_blocking(board.link_uart, board.link_tx, board.link_rx, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    info!("Register link at {} baud", LINK_BAUD);

    spawner.spawn(tasks::main_loop_task(appliance)).unwrap();
    spawner.spawn(tasks::capture_task(capture)).unwrap();
    spawner.spawn(tasks::link_task(uart, appliance)).unwrap();

    info!("All tasks spawned, bridge running");
}
