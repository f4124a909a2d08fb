// SPDX-License-Identifier: GPL-3.0-only

//! Scanner-wide constants

/// Detection engine constants
pub mod detection {
    /// Maximum dimension for QR processing (frames are downscaled to this)
    ///
    /// QR codes are typically large enough in the viewfinder to be detected
    /// at this resolution, and downscaling keeps per-frame decode time low.
    pub const MAX_DIMENSION: u32 = 640;
}

/// Timing constants
pub mod timing {
    use std::time::Duration;

    /// Frame counter modulo for periodic logging in the stream demo
    pub const FRAME_LOG_INTERVAL: u64 = 30;

    /// Default frame rate for the stream demo
    pub const DEFAULT_STREAM_FPS: u32 = 30;

    /// Poll interval while waiting for the scheduler to drain on shutdown
    pub const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

    /// Upper bound on waiting for an in-flight detection to finish on exit
    pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);
}

/// Compute the frame interval for a given frame rate
pub fn frame_interval(fps: u32) -> std::time::Duration {
    let fps = fps.max(1);
    std::time::Duration::from_secs_f64(1.0 / fps as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_frame_interval() {
        assert_eq!(frame_interval(30), Duration::from_secs_f64(1.0 / 30.0));
        // Zero fps must not divide by zero
        assert_eq!(frame_interval(0), Duration::from_secs(1));
    }
}
