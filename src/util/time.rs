//! Time utilities for the frame-driven simulation

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Default frame rate of the driver loop
pub const DEFAULT_FRAME_RATE: u32 = 60;

/// Wall-clock duration of one frame at the given rate
pub fn frame_duration(frame_rate: u32) -> Duration {
    Duration::from_micros(1_000_000 / u64::from(frame_rate.max(1)))
}

/// A simple timer for measuring durations
#[derive(Debug, Clone)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_micros(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_duration_matches_rate() {
        assert_eq!(frame_duration(60), Duration::from_micros(16_666));
        assert_eq!(frame_duration(1), Duration::from_secs(1));
    }

    #[test]
    fn zero_frame_rate_does_not_divide_by_zero() {
        assert_eq!(frame_duration(0), Duration::from_secs(1));
    }
}
