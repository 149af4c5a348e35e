//! Board wiring and tunables
//!
//! Generated by `build.rs` from `bridge.toml`.

include!(concat!(env!("OUT_DIR"), "/board.rs"));
