// SPDX-License-Identifier: GPL-3.0-only

//! QR Scanner - live QR code scanning core for camera streams
//!
//! This library decouples a fast camera frame producer from a slow,
//! asynchronous QR recognition engine. Frames may arrive at full camera
//! rate; at most one detection runs at a time and at most one frame waits
//! behind it. Newer frames supersede waiting ones, so detection latency
//! stays bounded no matter how far the camera outruns the decoder.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`frame`]: Frame handle trait and the engine's input image types
//! - [`scheduler`]: The latest-wins frame scheduler (the core)
//! - [`detector`]: Detection engine boundary and the rqrr-based QR engine
//! - [`sink`]: Decoded-payload delivery callbacks
//! - [`source`]: Producer-side frame pump for feeding the scheduler
//! - [`config`]: Scanner configuration handling
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use qr_scanner::{FrameScheduler, OwnedFrame, QrEngine, ScanSink};
//!
//! struct PrintSink;
//!
//! impl ScanSink for PrintSink {
//!     fn payload_decoded(&self, payload: &str) {
//!         println!("decoded: {payload}");
//!     }
//! }
//!
//! # async fn run(frame: OwnedFrame) -> Result<(), Box<dyn std::error::Error>> {
//! let engine = Arc::new(QrEngine::new());
//! let scheduler = FrameScheduler::new(engine, Arc::new(PrintSink))?;
//! scheduler.submit(frame); // returns immediately, never blocks
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod detector;
pub mod errors;
pub mod frame;
pub mod scheduler;
pub mod sink;
pub mod source;

// Re-export commonly used types
pub use config::ScannerConfig;
pub use detector::DetectionEngine;
pub use detector::qr::QrEngine;
pub use frame::{EngineImage, OwnedFrame, PixelFormat, ScanFrame};
pub use scheduler::{FrameScheduler, SchedulerStats};
pub use sink::ScanSink;
