// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decode, downscale, and re-encode in-memory images using
// the `image` crate.

use image::DynamicImage;
use image::imageops::FilterType;
use paperkit_core::error::{PaperkitError, Result};
use paperkit_core::types::{DocumentType, ImageFormat, jpeg_quality_percent};
use paperkit_engine::jpeg::flatten_onto_white;
use tracing::{debug, info, instrument};

/// Image processing pipeline operating on a single in-memory image.
///
/// Transformations consume `self` and return a new `ImageProcessor`, so calls
/// chain:
///
/// ```ignore
/// let jpeg = ImageProcessor::from_bytes(&data)?
///     .fit_within(1920, 1920)
///     .encode(ImageFormat::Jpeg, 0.8)?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Decode raw bytes (JPEG, PNG, WebP).
    ///
    /// HEIC and other containers the `image` crate cannot read are reported
    /// as `UnsupportedDocument` rather than a generic decode failure.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if let Some(kind) = DocumentType::sniff(data)
            && !kind.is_decodable_image()
        {
            return Err(PaperkitError::UnsupportedDocument(format!(
                "{} is not a supported image format",
                kind.mime_type()
            )));
        }

        let img = image::load_from_memory(data).map_err(|err| {
            PaperkitError::Image(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Shrink to fit within `max_width` x `max_height`, preserving aspect
    /// ratio. Images already inside the box are returned untouched; nothing
    /// is ever enlarged.
    #[instrument(skip(self), fields(max_width, max_height))]
    pub fn fit_within(self, max_width: u32, max_height: u32) -> Self {
        let (width, height) = (self.image.width(), self.image.height());
        if width <= max_width && height <= max_height {
            return self;
        }

        let ratio = (f64::from(max_width) / f64::from(width))
            .min(f64::from(max_height) / f64::from(height));
        let new_w = ((f64::from(width) * ratio) as u32).max(1);
        let new_h = ((f64::from(height) * ratio) as u32).max(1);
        info!(from_w = width, from_h = height, new_w, new_h, "Downscaling image");

        let resized = self
            .image
            .resize_exact(new_w, new_h, FilterType::Lanczos3);
        Self { image: resized }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode as `format`. `quality` in `[0, 1]` only affects JPEG; PNG and
    /// WebP are written losslessly.
    pub fn encode(&self, format: ImageFormat, quality: f32) -> Result<Vec<u8>> {
        match format {
            ImageFormat::Jpeg => self.to_jpeg_bytes(jpeg_quality_percent(quality)),
            ImageFormat::Png => encode_to_format(&self.image, image::ImageFormat::Png),
            ImageFormat::WebP => encode_to_format(
                &DynamicImage::ImageRgba8(self.image.to_rgba8()),
                image::ImageFormat::WebP,
            ),
        }
    }

    /// Encode the current image as JPEG bytes with the given quality (1-100).
    /// Transparent areas are flattened onto white.
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = if self.image.color().has_alpha() {
            flatten_onto_white(&self.image.to_rgba8())
        } else {
            self.image.to_rgb8()
        };
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb.write_with_encoder(encoder).map_err(|err| {
            PaperkitError::Image(format!("JPEG encoding failed: {}", err))
        })?;
        Ok(buffer)
    }
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(image: &DynamicImage, format: image::ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image.write_to(&mut cursor, format).map_err(|err| {
        PaperkitError::Image(format!("image encoding failed: {}", err))
    })?;
    Ok(buffer)
}
