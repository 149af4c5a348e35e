//! Display bus capture
//!
//! The display controller clocks one frame out per refresh while its chip
//! select is asserted. A capture backend returns each frame as packed raw
//! bits, MSB first, exactly as they appeared on the data line.

/// Source of raw display frames
#[allow(async_fn_in_trait)]
pub trait DisplayCapture {
    /// Error type for capture operations
    type Error;

    /// Wait for the next complete frame and copy its bits into `raw`
    ///
    /// Returns the number of bits captured. Bits past the last full byte
    /// are left-aligned in the final byte.
    async fn capture(&mut self, raw: &mut [u8]) -> Result<usize, Self::Error>;

    /// Drop any partial frame and resynchronise on the next chip select
    fn restart(&mut self);
}
