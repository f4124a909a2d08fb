// SPDX-License-Identifier: GPL-3.0-only

//! Decoded-payload delivery
//!
//! The scheduler reports downstream through a [`ScanSink`]: one call per
//! decoded payload, in dispatch order, plus a non-fatal notification for
//! failed detections. Sinks are invoked from the scheduler's detection task,
//! so implementations should return quickly.

use tracing::warn;

use crate::errors::DetectError;

/// Receiver for scan results
pub trait ScanSink: Send + Sync + 'static {
    /// One payload decoded from a processed frame
    ///
    /// Invoked zero or more times per frame, once per decoded code.
    fn payload_decoded(&self, payload: &str);

    /// A dispatched frame's detection failed
    ///
    /// Non-fatal: the scheduler has already advanced to the next frame.
    /// The default implementation logs and drops the error.
    fn detection_failed(&self, error: &DetectError) {
        warn!(error = %error, "Detection failed");
    }
}
