// SPDX-License-Identifier: GPL-3.0-only

//! Producer-side frame pump
//!
//! A [`SourcePump`] runs a producer callback on its own thread at a fixed
//! pace, the shape camera capture loops take: the callback grabs or builds
//! one frame per tick and hands it to the scheduler. The pump owns the
//! thread lifecycle (stop signal, join, stop-on-drop) so callers tear down
//! cleanly without leaking the producer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Action returned by the pump callback to control loop behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceAction {
    /// Keep producing frames
    Continue,
    /// Stop the pump gracefully
    Stop,
}

/// Controller for a paced producer loop running on its own thread
///
/// # Example
///
/// ```ignore
/// let pump = SourcePump::start("demo-source", frame_interval(30), move || {
///     scheduler.submit(next_frame());
///     SourceAction::Continue
/// });
///
/// // Later, stop the producer
/// pump.stop();
/// ```
pub struct SourcePump {
    /// Thread handle for joining
    thread_handle: Option<JoinHandle<()>>,
    /// Signal to stop the loop
    stop_signal: Arc<AtomicBool>,
    /// Name for logging
    name: String,
}

impl SourcePump {
    /// Start a producer loop on a new thread
    ///
    /// The callback runs once per `interval` until it returns
    /// [`SourceAction::Stop`] or [`SourcePump::stop`] is called. When the
    /// callback overruns the interval the next tick fires immediately; the
    /// pump never tries to catch up on missed ticks.
    pub fn start<F>(name: &str, interval: Duration, mut tick_fn: F) -> Self
    where
        F: FnMut() -> SourceAction + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let stop_signal_clone = Arc::clone(&stop_signal);
        let name_clone = name.to_string();

        info!(name = %name, interval_ms = interval.as_millis() as u64, "Starting frame pump");

        let thread_handle = thread::spawn(move || {
            debug!(name = %name_clone, "Frame pump thread started");

            loop {
                if stop_signal_clone.load(Ordering::SeqCst) {
                    debug!(name = %name_clone, "Stop signal received");
                    break;
                }

                let tick_start = Instant::now();
                match tick_fn() {
                    SourceAction::Continue => {}
                    SourceAction::Stop => {
                        debug!(name = %name_clone, "Pump requested stop");
                        break;
                    }
                }

                // Sleep off whatever the tick left of its interval
                let elapsed = tick_start.elapsed();
                if elapsed < interval {
                    thread::sleep(interval - elapsed);
                }
            }

            info!(name = %name_clone, "Frame pump thread exiting");
        });

        Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        }
    }

    /// Check if the pump is still running
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Signal the pump to stop (non-blocking)
    pub fn request_stop(&self) {
        debug!(name = %self.name, "Requesting frame pump stop");
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Stop the pump and wait for its thread to finish
    pub fn stop(&mut self) {
        self.request_stop();
        self.join();
    }

    /// Wait for the thread to finish without sending a stop signal
    ///
    /// Useful when the callback stops itself via [`SourceAction::Stop`].
    pub fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            debug!(name = %self.name, "Waiting for frame pump thread to finish");
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Frame pump thread panicked: {:?}", e);
            } else {
                debug!(name = %self.name, "Frame pump thread finished");
            }
        }
    }
}

impl Drop for SourcePump {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "SourcePump dropped, stopping");
            self.stop();
        }
    }
}
