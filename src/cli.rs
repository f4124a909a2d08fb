// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for the scanner binary
//!
//! This module provides command-line functionality for:
//! - Decoding QR codes from image files
//! - Replaying an image as a camera-rate stream through the scheduler

use qr_scanner::constants::{frame_interval, timing};
use qr_scanner::errors::DetectError;
use qr_scanner::source::{SourceAction, SourcePump};
use qr_scanner::{
    DetectionEngine, EngineImage, FrameScheduler, OwnedFrame, PixelFormat, QrEngine, ScanSink,
    ScannerConfig,
};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

/// Print each decoded payload once, collapsing consecutive repeats
///
/// A stream pointed at one code decodes the same payload every frame;
/// repeating it on every detection would drown the terminal.
struct PrintSink {
    last: Mutex<Option<String>>,
}

impl PrintSink {
    fn new() -> Self {
        Self {
            last: Mutex::new(None),
        }
    }
}

impl ScanSink for PrintSink {
    fn payload_decoded(&self, payload: &str) {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if last.as_deref() != Some(payload) {
            println!("{}", payload);
            *last = Some(payload.to_string());
        }
    }

    fn detection_failed(&self, error: &DetectError) {
        eprintln!("detection error: {}", error);
    }
}

/// Load a configuration file, or defaults when none is given
fn load_config(path: Option<&Path>) -> Result<ScannerConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(ScannerConfig::load(path)?),
        None => Ok(ScannerConfig::default()),
    }
}

/// Load an image file into the engine's input representation
fn load_image(path: &Path) -> Result<EngineImage, Box<dyn std::error::Error>> {
    let rgba = image::open(path)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    let data: Arc<[u8]> = Arc::from(rgba.into_raw());
    Ok(EngineImage::from_packed(width, height, data, PixelFormat::RGBA))
}

/// Decode QR codes from the given image files
pub async fn scan_images(
    images: &[std::path::PathBuf],
    config: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    if images.is_empty() {
        return Err("No image files given".into());
    }

    let config = load_config(config)?;
    let engine = QrEngine::with_max_dimension(config.max_dimension);

    for path in images {
        let image = load_image(path)?;
        let payloads = engine.detect(image).await?;

        if payloads.is_empty() {
            println!("{}: no QR codes found", path.display());
        } else {
            for payload in payloads {
                println!("{}: {}", path.display(), payload);
            }
        }
    }

    Ok(())
}

/// Replay one image as a camera-rate frame stream through the scheduler
pub async fn stream_file(
    input: &Path,
    fps: Option<u32>,
    duration: Option<u64>,
    config: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config)?;
    let fps = fps.unwrap_or(config.stream_fps);

    let base = load_image(input)?;
    println!(
        "Streaming {} ({}x{}) at {} fps, Ctrl-C to stop",
        input.display(),
        base.width,
        base.height,
        fps
    );

    let engine = Arc::new(QrEngine::with_max_dimension(config.max_dimension));
    let sink = Arc::new(PrintSink::new());
    let scheduler = FrameScheduler::new(engine, Arc::clone(&sink) as Arc<dyn ScanSink>)?;

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);
        })?;
    }

    let deadline = duration.map(|secs| Instant::now() + Duration::from_secs(secs));
    let mut pump = {
        let scheduler = scheduler.clone();
        let running = Arc::clone(&running);
        let mut produced: u64 = 0;
        SourcePump::start("stream-source", frame_interval(fps), move || {
            if !running.load(Ordering::SeqCst) {
                return SourceAction::Stop;
            }
            if let Some(deadline) = deadline
                && Instant::now() >= deadline
            {
                return SourceAction::Stop;
            }

            // Pixel data is reference counted; each tick is a fresh handle
            // over the same bytes with a fresh capture timestamp
            let frame = EngineImage {
                captured_at: Instant::now(),
                ..base.clone()
            };
            scheduler.submit(OwnedFrame::new(frame));

            produced += 1;
            if produced % timing::FRAME_LOG_INTERVAL == 0 {
                debug!(produced, "Stream source frames produced");
            }
            SourceAction::Continue
        })
    };

    // The pump thread stops itself on Ctrl-C or deadline
    while pump.is_running() {
        tokio::time::sleep(timing::DRAIN_POLL_INTERVAL).await;
    }
    pump.join();
    scheduler.shutdown();

    // Let an in-flight detection finish before reporting
    let drain_start = Instant::now();
    while !scheduler.is_idle() && drain_start.elapsed() < timing::DRAIN_TIMEOUT {
        tokio::time::sleep(timing::DRAIN_POLL_INTERVAL).await;
    }

    let stats = scheduler.stats();
    println!(
        "frames: {} submitted, {} processed, {} skipped, {} failed",
        stats.submitted,
        stats.completed,
        stats.superseded,
        stats.failed
    );

    Ok(())
}
