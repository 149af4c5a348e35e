//! Board-agnostic core logic for the heat pump bridge
//!
//! This crate contains the decode-and-emulate loop without any hardware
//! specifics:
//!
//! - Display decoder (raw frame to screen mode and readings)
//! - Keypad emulator (held-key session and row-pulse interception)
//! - Menu sequences (refresh, power, target temperature)
//! - Reading store and register dispatch
//! - Configuration type definitions

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod appliance;
pub mod clock;
pub mod config;
pub mod display;
pub mod keypad;
pub mod registers;
pub mod sequence;
pub mod store;

pub use appliance::{Appliance, Operation, Ticket};
pub use config::{BridgeConfig, ConfigError};
pub use display::DisplayMode;
pub use keypad::{KeyCode, KeyPosition, KeySlot, Keypad, KeypadError};
pub use registers::{Command, RegisterError};
pub use sequence::{SequenceError, SequenceKind, SequenceResult, TickReport};
pub use store::ReadingStore;
