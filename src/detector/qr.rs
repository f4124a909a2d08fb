// SPDX-License-Identifier: GPL-3.0-only

//! QR code detection engine
//!
//! Decodes QR codes with the rqrr crate. Camera frames are converted to
//! grayscale and downscaled before decoding, so one detection stays cheap
//! even on full-resolution frames.

use futures::FutureExt;
use futures::future::BoxFuture;
use image::GrayImage;
use std::time::Instant;
use tracing::{debug, trace};

use crate::constants::detection;
use crate::detector::{DecodedPayloads, DetectionEngine};
use crate::errors::DetectError;
use crate::frame::{EngineImage, PixelFormat};

/// QR code detection engine
///
/// Runs the CPU-intensive decode on a blocking worker so the async runtime
/// stays responsive. The scheduler ensures calls never overlap.
pub struct QrEngine {
    /// Maximum dimension for processing (frames are downscaled to this)
    max_dimension: u32,
}

impl Default for QrEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl QrEngine {
    /// Create a new QR engine with default settings
    pub fn new() -> Self {
        Self {
            max_dimension: detection::MAX_DIMENSION,
        }
    }

    /// Create a QR engine with a custom max processing dimension
    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }
}

impl DetectionEngine for QrEngine {
    fn detect(
        &self,
        image: EngineImage,
    ) -> BoxFuture<'static, Result<DecodedPayloads, DetectError>> {
        let max_dim = self.max_dimension;

        async move {
            tokio::task::spawn_blocking(move || detect_sync(&image, max_dim))
                .await
                .map_err(|e| DetectError::TaskFailed(e.to_string()))?
        }
        .boxed()
    }
}

/// Synchronous QR detection (runs on a blocking worker)
fn detect_sync(image: &EngineImage, max_dimension: u32) -> Result<DecodedPayloads, DetectError> {
    let start = Instant::now();

    if image.is_empty() {
        return Err(DetectError::EmptyFrame);
    }
    validate_dimensions(image)?;

    let gray = to_grayscale(image);
    let gray = if image.width > max_dimension || image.height > max_dimension {
        let scale =
            (image.width as f32 / max_dimension as f32).max(image.height as f32 / max_dimension as f32);
        let new_width = ((image.width as f32 / scale) as u32).max(1);
        let new_height = ((image.height as f32 / scale) as u32).max(1);
        downscale_gray(&gray, new_width, new_height)
    } else {
        gray
    };

    let conversion_time = start.elapsed();
    trace!(
        proc_width = gray.width(),
        proc_height = gray.height(),
        conversion_ms = conversion_time.as_millis(),
        "Prepared grayscale image for decoding"
    );

    let mut prepared = rqrr::PreparedImage::prepare(gray);
    let grids = prepared.detect_grids();

    let mut payloads = Vec::with_capacity(grids.len());
    for grid in &grids {
        match grid.decode() {
            Ok((_meta, content)) => payloads.push(content),
            Err(e) => {
                // A grid that fails to decode is noise, not a frame failure
                debug!(error = %e, "Failed to decode QR grid");
            }
        }
    }

    let total_time = start.elapsed();
    if !payloads.is_empty() {
        debug!(
            count = payloads.len(),
            total_ms = total_time.as_millis(),
            "QR detection found codes"
        );
    } else {
        trace!(
            grids = grids.len(),
            total_ms = total_time.as_millis(),
            "QR detection complete, no codes decoded"
        );
    }

    Ok(payloads)
}

/// Check that the pixel data covers the declared dimensions
fn validate_dimensions(image: &EngineImage) -> Result<(), DetectError> {
    let width = image.width as usize;
    let height = image.height as usize;
    let stride = image.stride as usize;
    let row_bytes = width * image.format.main_plane_bytes_per_pixel() as usize;

    // The last row may be unpadded, so require stride for all rows but one
    let expected = stride * height.saturating_sub(1) + row_bytes;
    if image.data.len() < expected {
        return Err(DetectError::TruncatedFrame {
            expected,
            actual: image.data.len(),
        });
    }
    Ok(())
}

/// Convert a frame to grayscale, honoring row stride
///
/// YUV formats already carry a luma channel, which is extracted directly.
/// RGB formats use the BT.601 luma weights.
fn to_grayscale(image: &EngineImage) -> GrayImage {
    let width = image.width as usize;
    let height = image.height as usize;
    let stride = image.stride as usize;
    let data: &[u8] = &image.data;

    let mut luma = Vec::with_capacity(width * height);

    for y in 0..height {
        let row = &data[y * stride..];
        match image.format {
            PixelFormat::Gray8 | PixelFormat::NV12 => {
                // NV12's first plane is plain Y
                luma.extend_from_slice(&row[..width]);
            }
            PixelFormat::YUYV => {
                // Y lives at every even byte: Y0 U Y1 V
                for x in 0..width {
                    luma.push(row[x * 2]);
                }
            }
            PixelFormat::RGB24 => {
                for x in 0..width {
                    let p = &row[x * 3..x * 3 + 3];
                    luma.push(luma_601(p[0], p[1], p[2]));
                }
            }
            PixelFormat::RGBA => {
                for x in 0..width {
                    let p = &row[x * 4..x * 4 + 4];
                    luma.push(luma_601(p[0], p[1], p[2]));
                }
            }
        }
    }

    // Dimensions match the vector length by construction
    GrayImage::from_raw(image.width, image.height, luma)
        .unwrap_or_else(|| GrayImage::new(image.width, image.height))
}

/// BT.601 luma from RGB
fn luma_601(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8
}

/// Downscale a grayscale image using bilinear interpolation
fn downscale_gray(src: &GrayImage, dst_width: u32, dst_height: u32) -> GrayImage {
    let src_width = src.width() as usize;
    let src_height = src.height() as usize;
    let data = src.as_raw();

    let mut result = Vec::with_capacity((dst_width * dst_height) as usize);

    let x_ratio = src_width as f32 / dst_width as f32;
    let y_ratio = src_height as f32 / dst_height as f32;

    for y in 0..dst_height {
        for x in 0..dst_width {
            let src_x = x as f32 * x_ratio;
            let src_y = y as f32 * y_ratio;

            let x0 = src_x as usize;
            let y0 = src_y as usize;
            let x1 = (x0 + 1).min(src_width - 1);
            let y1 = (y0 + 1).min(src_height - 1);

            let x_frac = src_x - x0 as f32;
            let y_frac = src_y - y0 as f32;

            let get = |px: usize, py: usize| -> f32 {
                data.get(py * src_width + px).copied().unwrap_or(0) as f32
            };

            let p00 = get(x0, y0);
            let p01 = get(x1, y0);
            let p10 = get(x0, y1);
            let p11 = get(x1, y1);

            let value = p00 * (1.0 - x_frac) * (1.0 - y_frac)
                + p01 * x_frac * (1.0 - y_frac)
                + p10 * (1.0 - x_frac) * y_frac
                + p11 * x_frac * y_frac;

            result.push(value as u8);
        }
    }

    GrayImage::from_raw(dst_width, dst_height, result)
        .unwrap_or_else(|| GrayImage::new(dst_width, dst_height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    fn image_with_stride(
        width: u32,
        height: u32,
        stride: u32,
        data: Vec<u8>,
        format: PixelFormat,
    ) -> EngineImage {
        EngineImage {
            width,
            height,
            data: Arc::from(data.as_slice()),
            format,
            stride,
            captured_at: Instant::now(),
        }
    }

    #[test]
    fn test_grayscale_rgba_drops_stride_padding() {
        // 2x2 RGBA frame with 2 bytes of stride padding per row
        let data: Vec<u8> = vec![
            255, 255, 255, 255, // white
            0, 0, 0, 255, // black
            9, 9, // padding
            0, 0, 0, 255, // black
            255, 255, 255, 255, // white
            9, 9, // padding
        ];
        let image = image_with_stride(2, 2, 10, data, PixelFormat::RGBA);

        let gray = to_grayscale(&image);
        assert_eq!(gray.dimensions(), (2, 2));
        assert_eq!(gray.as_raw(), &vec![255, 0, 0, 255]);
    }

    #[test]
    fn test_grayscale_yuyv_extracts_luma() {
        // 2x1 YUYV: Y0=10 U=128 Y1=200 V=128
        let image = image_with_stride(2, 1, 4, vec![10, 128, 200, 128], PixelFormat::YUYV);
        let gray = to_grayscale(&image);
        assert_eq!(gray.as_raw(), &vec![10, 200]);
    }

    #[test]
    fn test_grayscale_nv12_uses_y_plane() {
        // 2x2 NV12: Y plane followed by one UV row
        let image = image_with_stride(2, 2, 2, vec![1, 2, 3, 4, 128, 128], PixelFormat::NV12);
        let gray = to_grayscale(&image);
        assert_eq!(gray.as_raw(), &vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_downscale_gray_gradient() {
        // 4x2 gradient in one row direction
        let src = GrayImage::from_raw(4, 2, vec![0, 85, 170, 255, 0, 85, 170, 255])
            .expect("test image dimensions");

        let result = downscale_gray(&src, 2, 1);
        assert_eq!(result.dimensions(), (2, 1));
        let raw = result.as_raw();
        assert!(raw[0] < 100); // near the dark end
        assert!(raw[1] > 150); // near the bright end
    }

    #[test]
    fn test_detect_rejects_empty_frame() {
        let result = detect_sync(&EngineImage::empty(), 640);
        assert!(matches!(result, Err(DetectError::EmptyFrame)));
    }

    #[test]
    fn test_detect_rejects_truncated_frame() {
        let image = image_with_stride(4, 4, 4, vec![0u8; 8], PixelFormat::Gray8);
        let result = detect_sync(&image, 640);
        assert!(matches!(result, Err(DetectError::TruncatedFrame { .. })));
    }

    #[test]
    fn test_blank_frame_decodes_nothing() {
        let image = image_with_stride(64, 64, 64, vec![200u8; 64 * 64], PixelFormat::Gray8);
        let payloads = detect_sync(&image, 640).expect("blank frame should not error");
        assert!(payloads.is_empty());
    }

    #[test]
    fn test_oversized_frame_is_downscaled() {
        // 1280x720 blank frame; should decode (to nothing) without error
        let image = image_with_stride(
            1280,
            720,
            1280,
            vec![128u8; 1280 * 720],
            PixelFormat::Gray8,
        );
        let payloads = detect_sync(&image, 640).expect("downscaled frame should not error");
        assert!(payloads.is_empty());
    }
}
