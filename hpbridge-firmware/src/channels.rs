//! State shared between tasks and cores
//!
//! Defines the statics used for communication between Embassy tasks and
//! the row-scan loop on core 1.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;

use hpbridge_core::{Appliance, KeySlot};
use hpbridge_hal::ColumnBank;
use hpbridge_hal_rp2040::SioColumn;
use hpbridge_protocol::DisplayFrame;

/// The appliance driver as wired on this board
pub type BridgeAppliance = Appliance<'static, ColumnBank<SioColumn>>;

/// Appliance driver shared by the main loop and the register link
pub type SharedAppliance = Mutex<CriticalSectionRawMutex, BridgeAppliance>;

/// Armed key, written by the main loop, read by core 1
pub static KEY_SLOT: KeySlot = KeySlot::new();

/// Latest validated display frame; an unread frame is replaced by a newer one
pub static DISPLAY_FRAME: Signal<CriticalSectionRawMutex, DisplayFrame> = Signal::new();
