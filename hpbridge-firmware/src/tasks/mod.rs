//! Embassy async tasks
//!
//! Each task runs independently and communicates via the statics in
//! `channels`.

pub mod capture;
pub mod link;
pub mod main_loop;

pub use capture::capture_task;
pub use link::link_task;
pub use main_loop::main_loop_task;
