// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Standalone image compression: downscale, then encode at a fixed quality or
// search for the best quality that fits a byte budget.

use paperkit_core::error::Result;
use paperkit_core::types::{ImageCompressionOptions, ImageFormat};
use tracing::{debug, info, instrument};

use super::processor::ImageProcessor;

const SEARCH_MIN_QUALITY: f32 = 0.01;
const SEARCH_MAX_QUALITY: f32 = 1.0;
const SEARCH_STEP: f32 = 0.05;
const SEARCH_MAX_ATTEMPTS: u32 = 10;
/// Used when no searched quality fits the budget.
const FALLBACK_QUALITY: f32 = 0.1;

/// Result of [`compress_image`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    /// Quality the bytes were encoded at.
    pub quality: f32,
    /// `false` when a size target was requested and even the fallback
    /// quality could not reach it.
    pub within_target: bool,
}

/// Decode `data`, shrink it to fit `options.max_width × options.max_height`,
/// and encode it as `options.format`.
#[instrument(skip(data), fields(data_len = data.len()))]
pub fn compress_image(data: &[u8], options: &ImageCompressionOptions) -> Result<CompressedImage> {
    options.validate()?;

    let processor =
        ImageProcessor::from_bytes(data)?.fit_within(options.max_width, options.max_height);
    let (width, height) = (processor.width(), processor.height());

    let (bytes, quality, within_target) = match options.target_size_kb {
        Some(kb) => {
            let max_bytes = u64::from(kb) * 1024;
            search_quality(max_bytes, |quality| processor.encode(options.format, quality))?
        }
        None => (processor.encode(options.format, options.quality)?, options.quality, true),
    };

    info!(
        input_bytes = data.len(),
        output_bytes = bytes.len(),
        width,
        height,
        quality,
        within_target,
        "Image compressed"
    );
    Ok(CompressedImage {
        bytes,
        format: options.format,
        width,
        height,
        quality,
        within_target,
    })
}

/// Binary search over quality for the largest encoding that is at most
/// `max_bytes`.
///
/// Each attempt encodes at the midpoint of `[min, max]`; a fit moves `min` to
/// `mid + 0.05`, a miss moves `max` to `mid - 0.05`. At most ten attempts are
/// made. If none fits, the image is encoded once more at quality 0.1.
fn search_quality<F>(max_bytes: u64, mut encode: F) -> Result<(Vec<u8>, f32, bool)>
where
    F: FnMut(f32) -> Result<Vec<u8>>,
{
    let mut min = SEARCH_MIN_QUALITY;
    let mut max = SEARCH_MAX_QUALITY;
    let mut best: Option<(Vec<u8>, f32)> = None;

    let mut attempts = 0;
    while min <= max && attempts < SEARCH_MAX_ATTEMPTS {
        let mid = (min + max) / 2.0;
        let bytes = encode(mid)?;
        let fits = bytes.len() as u64 <= max_bytes;
        debug!(attempt = attempts + 1, quality = mid, bytes = bytes.len(), fits, "Quality attempt");

        if fits {
            best = Some((bytes, mid));
            min = mid + SEARCH_STEP;
        } else {
            max = mid - SEARCH_STEP;
        }
        attempts += 1;
    }

    if let Some((bytes, quality)) = best {
        return Ok((bytes, quality, true));
    }

    let bytes = encode(FALLBACK_QUALITY)?;
    let fits = bytes.len() as u64 <= max_bytes;
    Ok((bytes, FALLBACK_QUALITY, fits))
}
