//! hpbridge wire formats
//!
//! Three formats meet in this crate:
//!
//! - **Display bus frames**: the raw bit stream the heat pump controller
//!   clocks into its own 7-segment display driver, captured passively
//!   (137 bits per refresh, one header byte then 16 payload bytes shifted
//!   by one bit).
//! - **Register map**: the numbered values and commands the bridge exposes
//!   to the outside (input registers, coils and holding registers).
//! - **Register link**: a small framed serial protocol carrying register
//!   reads and writes:
//!
//! ```text
//! ┌───────┬────────┬──────┬─────────────┬──────────┐
//! │ START │ LENGTH │ TYPE │ PAYLOAD     │ CHECKSUM │
//! │ 1B    │ 1B     │ 1B   │ 0–8B        │ 1B       │
//! └───────┴────────┴──────┴─────────────┴──────────┘
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod display_frame;
pub mod link;
pub mod messages;
pub mod registers;

pub use display_frame::{DisplayFrame, FrameError, HexDump, FRAME_HEADER, FRAME_LEN, RAW_FRAME_BITS, RAW_FRAME_LEN};
pub use link::{LinkError, LinkFrame, LinkParser, LINK_START, MAX_LINK_PAYLOAD};
pub use messages::{LinkErrorCode, LinkRequest, LinkResponse};
pub use registers::{KeyPressWord, Register, Sensor, StatusFlags};
