//! Loop timestamps
//!
//! All timing uses a 32-bit millisecond counter sampled once per loop pass.
//! The counter wraps after ~49.7 days, so durations are always computed as
//! an unsigned wrapping difference.

/// Milliseconds elapsed from `since` to `now`, tolerating counter wrap
pub fn millis_since(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

/// Check if `duration_ms` has passed since `since`
pub fn has_elapsed(now: u32, since: u32, duration_ms: u32) -> bool {
    millis_since(now, since) >= duration_ms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_across_wrap() {
        let since = u32::MAX - 99;
        assert_eq!(millis_since(0, since), 100);
        assert_eq!(millis_since(200, since), 300);
        assert!(has_elapsed(200, since, 300));
        assert!(!has_elapsed(199, since, 300));
    }
}
