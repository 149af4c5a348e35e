//! Main loop task
//!
//! Feeds each captured display frame to the appliance driver, releases
//! held keys on time and steps the active sequence. Runs a pass at least
//! every [`LOOP_PERIOD_MS`] even when the display is silent so that key
//! releases and timeouts never wait for a frame.

use defmt::*;
use embassy_time::{with_timeout, Duration, Instant};

use hpbridge_core::TickReport;

use crate::channels::{SharedAppliance, DISPLAY_FRAME};

/// Longest gap between two loop passes
pub const LOOP_PERIOD_MS: u64 = 20;

/// Milliseconds since boot; wraps after ~49 days, which every comparison tolerates
pub fn now_ms() -> u32 {
    Instant::now().as_millis() as u32
}

#[embassy_executor::task]
pub async fn main_loop_task(appliance: &'static SharedAppliance) {
    info!("Main loop task started");

    loop {
        let frame = with_timeout(Duration::from_millis(LOOP_PERIOD_MS), DISPLAY_FRAME.wait())
            .await
            .ok();

        let report = appliance.lock().await.loop_pass(now_ms(), frame.as_ref());
        if let TickReport::Finished(result) = report {
            debug!("Sequence finished: {:?}", result);
        }
    }
}
