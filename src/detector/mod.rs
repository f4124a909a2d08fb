// SPDX-License-Identifier: GPL-3.0-only

//! Detection engine boundary
//!
//! The scheduler treats recognition as an opaque asynchronous capability:
//! one image in, one future out, resolving to either the decoded payloads or
//! an error. The scheduler guarantees at most one call is outstanding at a
//! time, so implementations never need internal queueing.

pub mod qr;

use futures::future::BoxFuture;

use crate::errors::DetectError;
use crate::frame::EngineImage;

/// The ordered payloads decoded from one frame
///
/// Zero entries is a normal outcome (no code in view), not an error.
pub type DecodedPayloads = Vec<String>;

/// An asynchronous single-shot recognition engine
///
/// Implementations receive frames one at a time and report each outcome
/// exactly once through the returned future. A failed detection carries no
/// retry semantics; the scheduler logs it and moves on to the next frame.
pub trait DetectionEngine: Send + Sync + 'static {
    /// Start one detection on the given image
    ///
    /// The scheduler never starts a second detection before the returned
    /// future resolves.
    fn detect(&self, image: EngineImage) -> BoxFuture<'static, Result<DecodedPayloads, DetectError>>;
}
