//! Display capture task
//!
//! Waits for display bursts, validates them and hands the latest frame to
//! the main loop. A bus that stays silent for [`CAPTURE_WATCHDOG_MS`] gets
//! its capture restarted.

use defmt::*;
use embassy_rp::peripherals::PIO0;
use embassy_time::{with_timeout, Duration};

use hpbridge_hal::DisplayCapture;
use hpbridge_hal_rp2040::PioDisplayCapture;
use hpbridge_protocol::{DisplayFrame, HexDump, RAW_FRAME_LEN};

use crate::channels::DISPLAY_FRAME;

/// Silence after which the capture is restarted
pub const CAPTURE_WATCHDOG_MS: u64 = 5_000;

#[embassy_executor::task]
pub async fn capture_task(mut capture: PioDisplayCapture<'static, PIO0, 0>) {
    info!("Display capture task started");

    let mut raw = [0u8; RAW_FRAME_LEN];

    loop {
        raw.fill(0);
        let bits = match with_timeout(
            Duration::from_millis(CAPTURE_WATCHDOG_MS),
            capture.capture(&mut raw),
        )
        .await
        {
            Ok(Ok(bits)) => bits,
            Ok(Err(e)) => {
                warn!("Display capture failed: {:?}", e);
                continue;
            }
            Err(_) => {
                warn!("No display frame for {} ms, restarting capture", CAPTURE_WATCHDOG_MS);
                capture.restart();
                continue;
            }
        };

        match DisplayFrame::from_capture(&raw, bits) {
            Ok(frame) => {
                trace!("Frame: {:?}", frame);
                DISPLAY_FRAME.signal(frame);
            }
            Err(e) => {
                let len = bits.div_ceil(8).min(RAW_FRAME_LEN);
                error!("Display frame dropped: {:?} [{}]", e, HexDump(&raw[..len]));
            }
        }
    }
}
