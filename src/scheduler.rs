// SPDX-License-Identifier: GPL-3.0-only

//! Latest-wins frame scheduler
//!
//! The scheduler sits between an unbounded-rate frame producer and a slow
//! asynchronous detection engine. It holds at most two frames: one waiting
//! (`pending`) and one dispatched to the engine. A frame arriving while the
//! engine is busy replaces the pending slot, and the replaced frame is
//! released without ever being processed. When a detection completes the
//! pending frame, if any, is promoted and dispatched immediately.
//!
//! The processed frames therefore form an order-preserving, possibly sparse
//! subsequence of the submitted frames, with exactly one detection in flight
//! at any instant and no backlog growth.
//!
//! Both `submit` and the completion path mutate the slots under one mutex,
//! so replacement and promotion never race: a submitted frame is either
//! dispatched once or released once, never both and never neither.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tracing::{debug, info, trace, warn};

use crate::detector::DetectionEngine;
use crate::errors::SchedulerError;
use crate::frame::ScanFrame;
use crate::sink::ScanSink;

/// Snapshot of scheduler lifetime counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Frames handed to `submit`
    pub submitted: u64,
    /// Frames released unprocessed because a newer frame replaced them
    pub superseded: u64,
    /// Frames handed to the detection engine
    pub dispatched: u64,
    /// Detections that completed successfully (payloads or none)
    pub completed: u64,
    /// Detections that reported an error
    pub failed: u64,
}

/// The two ownership slots, guarded by one mutex
struct Slots {
    /// Last frame received but not yet dispatched
    pending: Option<Box<dyn ScanFrame>>,
    /// True iff one detection call is outstanding
    in_flight: bool,
    /// Set by `shutdown`; late submissions are released and ignored
    shut_down: bool,
}

struct Counters {
    submitted: AtomicU64,
    superseded: AtomicU64,
    dispatched: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

struct Inner {
    engine: Arc<dyn DetectionEngine>,
    sink: Arc<dyn ScanSink>,
    runtime: Handle,
    slots: Mutex<Slots>,
    counters: Counters,
}

impl Inner {
    fn lock_slots(&self) -> MutexGuard<'_, Slots> {
        // A poisoned lock means a detection task panicked mid-update; the
        // slot state itself stays consistent, so keep going.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        // Backstop: a pending frame still held at teardown is released here
        let slots = self.slots.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(frame) = slots.pending.as_mut() {
            frame.release();
        }
        slots.pending = None;
    }
}

/// Accepts frames at any rate and drives the detection engine one frame at
/// a time
///
/// Cheap to clone; clones share the same slots and counters. `submit` is
/// safe to call from any thread and never blocks on detection.
#[derive(Clone)]
pub struct FrameScheduler {
    inner: Arc<Inner>,
}

impl FrameScheduler {
    /// Create a scheduler on the current tokio runtime
    ///
    /// Fails with [`SchedulerError::NoRuntime`] when called outside a
    /// runtime context; producers driving the scheduler from plain threads
    /// should use [`FrameScheduler::with_handle`] instead.
    pub fn new(
        engine: Arc<dyn DetectionEngine>,
        sink: Arc<dyn ScanSink>,
    ) -> Result<Self, SchedulerError> {
        let handle = Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;
        Ok(Self::with_handle(engine, sink, handle))
    }

    /// Create a scheduler that spawns detection tasks on the given runtime
    pub fn with_handle(
        engine: Arc<dyn DetectionEngine>,
        sink: Arc<dyn ScanSink>,
        runtime: Handle,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                engine,
                sink,
                runtime,
                slots: Mutex::new(Slots {
                    pending: None,
                    in_flight: false,
                    shut_down: false,
                }),
                counters: Counters {
                    submitted: AtomicU64::new(0),
                    superseded: AtomicU64::new(0),
                    dispatched: AtomicU64::new(0),
                    completed: AtomicU64::new(0),
                    failed: AtomicU64::new(0),
                },
            }),
        }
    }

    /// Submit one frame for detection
    ///
    /// Returns immediately. If the engine is idle the frame is dispatched
    /// right away; otherwise it waits in the pending slot, where a newer
    /// frame may supersede it. Ownership of the frame transfers to the
    /// scheduler, which releases it on every path. After `shutdown` the
    /// frame is released and ignored.
    pub fn submit<F: ScanFrame>(&self, frame: F) {
        self.submit_boxed(Box::new(frame));
    }

    /// Submit an already-boxed frame handle
    pub fn submit_boxed(&self, frame: Box<dyn ScanFrame>) {
        self.inner.counters.submitted.fetch_add(1, Ordering::Relaxed);

        let superseded;
        let dispatch = {
            let mut slots = self.inner.lock_slots();
            if slots.shut_down {
                drop(slots);
                let mut frame = frame;
                frame.release();
                debug!("Frame submitted after shutdown, released");
                return;
            }
            superseded = slots.pending.replace(frame);
            if slots.in_flight {
                None
            } else {
                slots.in_flight = true;
                slots.pending.take()
            }
        };

        // Release outside the lock; handle teardown may touch foreign resources
        if let Some(mut old) = superseded {
            self.inner.counters.superseded.fetch_add(1, Ordering::Relaxed);
            old.release();
            trace!("Pending frame superseded before dispatch");
        }

        if let Some(frame) = dispatch {
            let inner = Arc::clone(&self.inner);
            self.inner.runtime.spawn(run_detections(inner, frame));
        }
    }

    /// Tear the scheduler down
    ///
    /// Releases the pending frame and rejects further submissions. A
    /// detection already in flight runs to completion (there is no
    /// cancellation); its frame is released on the completion path and no
    /// further frame is promoted.
    pub fn shutdown(&self) {
        let pending = {
            let mut slots = self.inner.lock_slots();
            slots.shut_down = true;
            slots.pending.take()
        };
        if let Some(mut frame) = pending {
            frame.release();
        }
        info!("Frame scheduler shut down");
    }

    /// True when no detection is in flight and no frame is pending
    pub fn is_idle(&self) -> bool {
        let slots = self.inner.lock_slots();
        !slots.in_flight && slots.pending.is_none()
    }

    /// Snapshot of the lifetime counters
    pub fn stats(&self) -> SchedulerStats {
        let c = &self.inner.counters;
        SchedulerStats {
            submitted: c.submitted.load(Ordering::Relaxed),
            superseded: c.superseded.load(Ordering::Relaxed),
            dispatched: c.dispatched.load(Ordering::Relaxed),
            completed: c.completed.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
        }
    }
}

/// Drive detections until the pending slot runs dry
///
/// One such task exists per busy period: it carries the in-flight frame,
/// awaits the engine, reports downstream, and promotes the next pending
/// frame under the slot mutex. Exactly one detection is outstanding for the
/// task's whole lifetime.
async fn run_detections(inner: Arc<Inner>, first: Box<dyn ScanFrame>) {
    let mut frame = first;
    loop {
        inner.counters.dispatched.fetch_add(1, Ordering::Relaxed);

        let image = frame.to_image();
        trace!(image = ?image, "Dispatching frame to detection engine");
        let result = inner.engine.detect(image).await;
        frame.release();

        match result {
            Ok(payloads) => {
                inner.counters.completed.fetch_add(1, Ordering::Relaxed);
                for payload in &payloads {
                    inner.sink.payload_decoded(payload);
                }
            }
            Err(error) => {
                // Failure advances exactly like success; the frame is
                // already released and is not retried
                inner.counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(error = %error, "Detection failed, advancing");
                inner.sink.detection_failed(&error);
            }
        }

        let (next, leftover) = {
            let mut slots = inner.lock_slots();
            if slots.shut_down {
                slots.in_flight = false;
                (None, slots.pending.take())
            } else {
                match slots.pending.take() {
                    Some(next) => (Some(next), None),
                    None => {
                        slots.in_flight = false;
                        (None, None)
                    }
                }
            }
        };

        if let Some(mut frame) = leftover {
            frame.release();
        }

        match next {
            Some(next) => frame = next,
            None => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::DecodedPayloads;
    use crate::errors::DetectError;
    use crate::frame::{EngineImage, OwnedFrame};
    use futures::FutureExt;
    use futures::future::BoxFuture;

    struct InstantEngine;

    impl DetectionEngine for InstantEngine {
        fn detect(
            &self,
            _image: EngineImage,
        ) -> BoxFuture<'static, Result<DecodedPayloads, DetectError>> {
            async { Ok(vec!["payload".to_string()]) }.boxed()
        }
    }

    struct NullSink;

    impl ScanSink for NullSink {
        fn payload_decoded(&self, _payload: &str) {}
    }

    #[test]
    fn test_new_outside_runtime_fails() {
        let result = FrameScheduler::new(Arc::new(InstantEngine), Arc::new(NullSink));
        assert!(matches!(result, Err(SchedulerError::NoRuntime)));
    }

    #[tokio::test]
    async fn test_starts_idle() {
        let scheduler = FrameScheduler::new(Arc::new(InstantEngine), Arc::new(NullSink))
            .expect("runtime is current");
        assert!(scheduler.is_idle());
        assert_eq!(scheduler.stats(), SchedulerStats::default());
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_is_released() {
        let scheduler = FrameScheduler::new(Arc::new(InstantEngine), Arc::new(NullSink))
            .expect("runtime is current");
        scheduler.shutdown();
        scheduler.submit(OwnedFrame::new(EngineImage::empty()));
        assert!(scheduler.is_idle());
        assert_eq!(scheduler.stats().dispatched, 0);
    }
}
