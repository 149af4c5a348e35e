//! Build script for hpbridge-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates bridge.toml at compile time
//! - Generates the board module (typed pins, interrupts, tunables)

use std::env;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Number of GPIOs on the RP2040
const GPIO_COUNT: u8 = 30;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BoardFile {
    display: DisplaySection,
    keypad: KeypadSection,
    link: LinkSection,
    #[serde(default)]
    timing: TimingSection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DisplaySection {
    data_pin: u8,
    clk_pin: u8,
    cs_pin: u8,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct KeypadSection {
    row_pins: [u8; 3],
    column_pins: [u8; 3],
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LinkSection {
    uart: u8,
    tx_pin: u8,
    rx_pin: u8,
    baud: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TimingSection {
    settle_reads: Option<u8>,
    short_press_ms: Option<u32>,
    unlock_hold_ms: Option<u32>,
    combo_hold_ms: Option<u32>,
    refresh_timeout_ms: Option<u32>,
    power_timeout_ms: Option<u32>,
    target_timeout_ms: Option<u32>,
    press_key_slack_ms: Option<u32>,
    target_min: Option<i8>,
    target_max: Option<i8>,
    poll_period_ms: Option<u32>,
}

impl TimingSection {
    /// Field name and literal of every override present
    fn overrides(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        let mut push = |name: &'static str, value: Option<String>| {
            if let Some(value) = value {
                fields.push((name, value));
            }
        };
        push("settle_reads", self.settle_reads.map(|v| v.to_string()));
        push("short_press_ms", self.short_press_ms.map(|v| v.to_string()));
        push("unlock_hold_ms", self.unlock_hold_ms.map(|v| v.to_string()));
        push("combo_hold_ms", self.combo_hold_ms.map(|v| v.to_string()));
        push("refresh_timeout_ms", self.refresh_timeout_ms.map(|v| v.to_string()));
        push("power_timeout_ms", self.power_timeout_ms.map(|v| v.to_string()));
        push("target_timeout_ms", self.target_timeout_ms.map(|v| v.to_string()));
        push("press_key_slack_ms", self.press_key_slack_ms.map(|v| v.to_string()));
        push("target_min", self.target_min.map(|v| v.to_string()));
        push("target_max", self.target_max.map(|v| v.to_string()));
        push("poll_period_ms", self.poll_period_ms.map(|v| v.to_string()));
        fields
    }
}

fn main() {
    setup_linker();
    let board = validate_config();
    generate_board(&board);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate bridge.toml at compile time
fn validate_config() -> BoardFile {
    println!("cargo:rerun-if-changed=bridge.toml");

    let config_path = Path::new("bridge.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: bridge.toml not found!                                   ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a bridge.toml board file in the           ║\n\
            ║  hpbridge-firmware directory.                                    ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read bridge.toml                               ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let board: BoardFile = match toml::from_str(&content) {
        Ok(board) => board,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid bridge.toml                                      ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&e.to_string())
            );
        }
    };

    let mut errors = Vec::new();
    validate_pins(&board, &mut errors);
    validate_link(&board.link, &mut errors);
    validate_timing(&board.timing, &mut errors);
    report_errors(&errors);

    println!("cargo:warning=bridge.toml validated successfully");
    board
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn report_errors(errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: Invalid values in bridge.toml                            ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

fn validate_pins(board: &BoardFile, errors: &mut Vec<String>) {
    let display = &board.display;
    let mut used: Vec<(u8, &str)> = vec![
        (display.data_pin, "display.data_pin"),
        (display.clk_pin, "display.clk_pin"),
        (display.cs_pin, "display.cs_pin"),
        (board.link.tx_pin, "link.tx_pin"),
        (board.link.rx_pin, "link.rx_pin"),
    ];
    used.extend(board.keypad.row_pins.iter().map(|&p| (p, "keypad.row_pins")));
    used.extend(board.keypad.column_pins.iter().map(|&p| (p, "keypad.column_pins")));

    for &(pin, name) in &used {
        if pin >= GPIO_COUNT {
            errors.push(format!("{}: gpio{} does not exist", name, pin));
        }
    }
    for (i, &(pin, name)) in used.iter().enumerate() {
        if let Some(&(_, other)) = used[..i].iter().find(|(p, _)| *p == pin) {
            errors.push(format!("gpio{} used by both {} and {}", pin, other, name));
        }
    }

    if display.clk_pin != display.data_pin.wrapping_add(1) || display.cs_pin != display.data_pin.wrapping_add(2) {
        errors.push(format!(
            "display pins must be consecutive DATA, CLK, CS (got {}, {}, {})",
            display.data_pin, display.clk_pin, display.cs_pin
        ));
    }
}

/// UART function of a GPIO on the RP2040: (uart, is_tx)
fn uart_function(gpio: u8) -> Option<(u8, bool)> {
    let uart = match gpio / 4 {
        0 | 3 | 4 | 7 => 0,
        1 | 2 | 5 | 6 => 1,
        _ => return None,
    };
    match gpio % 4 {
        0 => Some((uart, true)),
        1 => Some((uart, false)),
        _ => None,
    }
}

fn validate_link(link: &LinkSection, errors: &mut Vec<String>) {
    if link.uart > 1 {
        errors.push(format!("link.uart must be 0 or 1, got {}", link.uart));
        return;
    }
    if uart_function(link.tx_pin) != Some((link.uart, true)) {
        errors.push(format!("gpio{} is not a TX pin of UART{}", link.tx_pin, link.uart));
    }
    if uart_function(link.rx_pin) != Some((link.uart, false)) {
        errors.push(format!("gpio{} is not an RX pin of UART{}", link.rx_pin, link.uart));
    }
    if !(1_200..=921_600).contains(&link.baud) {
        errors.push(format!("link.baud {} outside 1200..=921600", link.baud));
    }
}

fn validate_timing(timing: &TimingSection, errors: &mut Vec<String>) {
    if timing.settle_reads == Some(0) {
        errors.push("timing.settle_reads must be at least 1".to_string());
    }
    for (name, value) in timing.overrides() {
        if name.ends_with("_ms") && name != "press_key_slack_ms" && value == "0" {
            errors.push(format!("timing.{} must not be zero", name));
        }
    }
    let min = timing.target_min.unwrap_or(38);
    let max = timing.target_max.unwrap_or(60);
    if min >= max {
        errors.push(format!("timing.target_min {} must be below target_max {}", min, max));
    }
}

/// Write the board module into OUT_DIR
fn generate_board(board: &BoardFile) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let uart = board.link.uart;
    let mut code = String::new();

    writeln!(code, "// Generated by build.rs from bridge.toml, do not edit").unwrap();
    writeln!(code).unwrap();
    writeln!(code, "use embassy_rp::gpio::AnyPin;").unwrap();
    writeln!(code, "use embassy_rp::peripherals;").unwrap();
    writeln!(code, "use embassy_rp::Peri;").unwrap();
    writeln!(code, "use hpbridge_core::BridgeConfig;").unwrap();
    writeln!(code).unwrap();

    writeln!(code, "/// UART carrying the register link").unwrap();
    writeln!(code, "pub type LinkUart = peripherals::UART{};", uart).unwrap();
    writeln!(code).unwrap();
    writeln!(code, "/// Register link baud rate").unwrap();
    writeln!(code, "pub const LINK_BAUD: u32 = {};", board.link.baud).unwrap();
    writeln!(code).unwrap();

    writeln!(code, "embassy_rp::bind_interrupts!(pub struct Irqs {{").unwrap();
    writeln!(
        code,
        "    PIO0_IRQ_0 => embassy_rp::pio::InterruptHandler<peripherals::PIO0>;"
    )
    .unwrap();
    writeln!(
        code,
        "    UART{u}_IRQ => embassy_rp::uart::BufferedInterruptHandler<peripherals::UART{u}>;",
        u = uart
    )
    .unwrap();
    writeln!(code, "}});").unwrap();
    writeln!(code).unwrap();

    writeln!(code, "/// Tunables from the [timing] section").unwrap();
    writeln!(code, "pub fn bridge_config() -> BridgeConfig {{").unwrap();
    writeln!(code, "    BridgeConfig {{").unwrap();
    for (name, value) in board.timing.overrides() {
        writeln!(code, "        {}: {},", name, value).unwrap();
    }
    writeln!(code, "        ..BridgeConfig::default()").unwrap();
    writeln!(code, "    }}").unwrap();
    writeln!(code, "}}").unwrap();
    writeln!(code).unwrap();

    let display = &board.display;
    let keypad = &board.keypad;
    writeln!(code, "/// Peripherals as wired on this board").unwrap();
    writeln!(code, "pub struct Board {{").unwrap();
    writeln!(code, "    pub display_data: Peri<'static, peripherals::PIN_{}>,", display.data_pin).unwrap();
    writeln!(code, "    pub display_clk: Peri<'static, peripherals::PIN_{}>,", display.clk_pin).unwrap();
    writeln!(code, "    pub display_cs: Peri<'static, peripherals::PIN_{}>,", display.cs_pin).unwrap();
    writeln!(code, "    pub rows: [Peri<'static, AnyPin>; 3],").unwrap();
    writeln!(code, "    pub columns: [Peri<'static, AnyPin>; 3],").unwrap();
    writeln!(code, "    pub link_tx: Peri<'static, peripherals::PIN_{}>,", board.link.tx_pin).unwrap();
    writeln!(code, "    pub link_rx: Peri<'static, peripherals::PIN_{}>,", board.link.rx_pin).unwrap();
    writeln!(code, "    pub link_uart: Peri<'static, LinkUart>,").unwrap();
    writeln!(code, "    pub pio: Peri<'static, peripherals::PIO0>,").unwrap();
    writeln!(code, "    pub core1: Peri<'static, peripherals::CORE1>,").unwrap();
    writeln!(code, "}}").unwrap();
    writeln!(code).unwrap();

    let any_pins = |pins: &[u8; 3]| {
        pins.iter()
            .map(|p| format!("p.PIN_{}.into()", p))
            .collect::<Vec<_>>()
            .join(", ")
    };
    writeln!(code, "impl Board {{").unwrap();
    writeln!(code, "    pub fn take(p: embassy_rp::Peripherals) -> Self {{").unwrap();
    writeln!(code, "        Self {{").unwrap();
    writeln!(code, "            display_data: p.PIN_{},", display.data_pin).unwrap();
    writeln!(code, "            display_clk: p.PIN_{},", display.clk_pin).unwrap();
    writeln!(code, "            display_cs: p.PIN_{},", display.cs_pin).unwrap();
    writeln!(code, "            rows: [{}],", any_pins(&keypad.row_pins)).unwrap();
    writeln!(code, "            columns: [{}],", any_pins(&keypad.column_pins)).unwrap();
    writeln!(code, "            link_tx: p.PIN_{},", board.link.tx_pin).unwrap();
    writeln!(code, "            link_rx: p.PIN_{},", board.link.rx_pin).unwrap();
    writeln!(code, "            link_uart: p.UART{},", uart).unwrap();
    writeln!(code, "            pio: p.PIO0,").unwrap();
    writeln!(code, "            core1: p.CORE1,").unwrap();
    writeln!(code, "        }}").unwrap();
    writeln!(code, "    }}").unwrap();
    writeln!(code, "}}").unwrap();

    fs::write(out_dir.join("board.rs"), code).unwrap();
}
