// SPDX-License-Identifier: GPL-3.0-only

//! Frame handles shared between camera producers and the scheduler
//!
//! A [`ScanFrame`] wraps one captured camera image plus whatever native
//! resource backs it (a mapped capture buffer, a pool slot, plain memory).
//! The handle has exactly one owner at a time: the producer hands it to the
//! scheduler via `submit`, and the scheduler releases it on every exit path,
//! whether the frame was processed or superseded.

use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// Pixel format for camera frames
///
/// The subset of formats camera pipelines commonly hand to CPU consumers.
/// The QR engine converts all of these to grayscale before decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// RGBA - 32-bit with alpha (4 bytes per pixel)
    RGBA,
    /// RGB24 - 24-bit RGB (3 bytes per pixel, no alpha)
    RGB24,
    /// Gray8 - 8-bit grayscale (single channel)
    /// Used for monochrome cameras and IR sensors
    Gray8,
    /// YUYV - Packed 4:2:2 (Y0 U Y1 V interleaved)
    /// Common raw format from webcam sensors
    YUYV,
    /// NV12 - Semi-planar 4:2:0 (Y plane + interleaved UV plane)
    /// Common output from MJPEG decoders
    NV12,
}

impl PixelFormat {
    /// Check if this format carries a luma plane usable without conversion
    pub fn is_yuv(&self) -> bool {
        matches!(self, Self::YUYV | Self::NV12)
    }

    /// Average bytes per pixel (accounting for chroma subsampling)
    pub fn bytes_per_pixel(&self) -> f32 {
        match self {
            Self::RGBA => 4.0,
            Self::RGB24 => 3.0,
            Self::Gray8 => 1.0,
            Self::YUYV => 2.0,  // 4:2:2 subsampling
            Self::NV12 => 1.5,  // 4:2:0 subsampling
        }
    }

    /// Bytes per pixel of the main (first) plane row
    pub fn main_plane_bytes_per_pixel(&self) -> u32 {
        match self {
            Self::RGBA => 4,
            Self::RGB24 => 3,
            Self::Gray8 => 1,
            Self::YUYV => 2,
            Self::NV12 => 1, // Y plane only
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PixelFormat::RGBA => write!(f, "RGBA"),
            PixelFormat::RGB24 => write!(f, "RGB24"),
            PixelFormat::Gray8 => write!(f, "GRAY8"),
            PixelFormat::YUYV => write!(f, "YUYV"),
            PixelFormat::NV12 => write!(f, "NV12"),
        }
    }
}

/// The detection engine's native input: one camera image in CPU memory
///
/// Pixel data is reference counted so producers can keep a frame pool alive
/// while a copy of the handle travels through the scheduler.
#[derive(Clone)]
pub struct EngineImage {
    pub width: u32,
    pub height: u32,
    /// Pixel data: RGBA/RGB bytes, packed YUYV, or Y plane followed by UV
    pub data: Arc<[u8]>,
    /// Pixel format of the data
    pub format: PixelFormat,
    /// Row stride for the main plane (bytes per row, may include padding)
    pub stride: u32,
    /// Timestamp when the frame was captured (for latency diagnostics)
    pub captured_at: Instant,
}

impl EngineImage {
    /// Create an image from tightly packed pixel data (stride = width * bpp)
    pub fn from_packed(width: u32, height: u32, data: Arc<[u8]>, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            data,
            format,
            stride: width * format.main_plane_bytes_per_pixel(),
            captured_at: Instant::now(),
        }
    }

    /// A zero-sized placeholder image
    ///
    /// Returned as the defensive fallback when a released frame is converted;
    /// the engine rejects it as [`DetectError::EmptyFrame`](crate::errors::DetectError).
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            data: Arc::from([]),
            format: PixelFormat::Gray8,
            stride: 0,
            captured_at: Instant::now(),
        }
    }

    /// Check whether the image has no pixels
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }
}

impl std::fmt::Debug for EngineImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "EngineImage({}x{} {} {} bytes)",
            self.width,
            self.height,
            self.format,
            self.data.len()
        )
    }
}

/// One camera frame plus its backing resource
///
/// Exactly two capabilities, mirroring what the scheduler needs:
/// a one-shot conversion to the engine's input representation, and an
/// explicit release of the underlying resource.
///
/// # Contract
///
/// - `to_image` is called at most once, and only before `release`.
/// - `release` is called exactly once per handle by the scheduler;
///   implementations should tolerate repeat calls.
/// - Once released, a handle is never read or converted again.
pub trait ScanFrame: Send + 'static {
    /// Convert to the detection engine's input image
    fn to_image(&mut self) -> EngineImage;

    /// Free the underlying frame-buffer resource
    fn release(&mut self);
}

/// A frame handle backed by plain owned pixel data
///
/// The common case for file sources, tests, and producers that already
/// copied the capture buffer. Converting a released handle is a programming
/// error; debug builds assert, release builds log and hand the engine an
/// empty image.
pub struct OwnedFrame {
    image: Option<EngineImage>,
}

impl OwnedFrame {
    /// Wrap an image in a releasable frame handle
    pub fn new(image: EngineImage) -> Self {
        Self { image: Some(image) }
    }

    /// Check whether the handle still owns its image
    pub fn is_released(&self) -> bool {
        self.image.is_none()
    }
}

impl ScanFrame for OwnedFrame {
    fn to_image(&mut self) -> EngineImage {
        debug_assert!(
            self.image.is_some(),
            "to_image called on a released frame"
        );
        match self.image.take() {
            Some(image) => image,
            None => {
                warn!("to_image called on a released frame, substituting empty image");
                EngineImage::empty()
            }
        }
    }

    fn release(&mut self) {
        self.image = None;
    }
}

impl From<EngineImage> for OwnedFrame {
    fn from(image: EngineImage) -> Self {
        Self::new(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_image() -> EngineImage {
        EngineImage::from_packed(2, 2, Arc::from([0u8; 4]), PixelFormat::Gray8)
    }

    #[test]
    fn test_packed_stride() {
        let img = EngineImage::from_packed(10, 4, Arc::from([0u8; 400]), PixelFormat::RGBA);
        assert_eq!(img.stride, 40);

        let img = EngineImage::from_packed(10, 4, Arc::from([0u8; 80]), PixelFormat::YUYV);
        assert_eq!(img.stride, 20);
    }

    #[test]
    fn test_empty_image() {
        assert!(EngineImage::empty().is_empty());
        assert!(!test_image().is_empty());
    }

    #[test]
    fn test_owned_frame_release_is_idempotent() {
        let mut frame = OwnedFrame::new(test_image());
        assert!(!frame.is_released());
        frame.release();
        frame.release();
        assert!(frame.is_released());
    }

    #[test]
    fn test_conversion_consumes_image() {
        let mut frame = OwnedFrame::new(test_image());
        let img = frame.to_image();
        assert!(!img.is_empty());
        assert!(frame.is_released());
    }
}
