// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine-agnostic trait definitions for the rasterizing pipeline.
//
// The pipeline never talks to PDFium, the JPEG codec, or the PDF writer
// directly. It goes through these three capabilities so that each can be
// swapped (or mocked in tests) independently.

use image::{DynamicImage, RgbaImage};
use paperkit_core::error::EngineError;

/// Convenience alias for engine results.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

// -- Rendering ----------------------------------------------------------------

/// Pixel dimensions of a page rendered at some scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Pixel size of a page of `width_pt` × `height_pt` points at `scale`.
    ///
    /// Fractional pixels are truncated, as a canvas sized from a float
    /// viewport would be. Never smaller than 1×1.
    pub fn at_scale(width_pt: f32, height_pt: f32, scale: f32) -> Self {
        Self {
            width: ((width_pt * scale) as u32).max(1),
            height: ((height_pt * scale) as u32).max(1),
        }
    }
}

/// An RGBA bitmap holding exactly one rendered page.
///
/// Owned, not shared: handing it to [`ImageEncoder::encode_lossy`] moves it,
/// so its pixel buffer is freed as soon as the page has been re-encoded.
#[derive(Debug)]
pub struct RenderedPage {
    image: RgbaImage,
}

impl RenderedPage {
    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Wrap a tightly packed RGBA buffer (`width * height * 4` bytes).
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> EngineResult<Self> {
        let len = pixels.len();
        RgbaImage::from_raw(width, height, pixels)
            .map(Self::from_image)
            .ok_or_else(|| {
                EngineError::Failed(format!(
                    "bitmap of {len} bytes does not match {width}x{height} RGBA"
                ))
            })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }
}

/// Opens PDF bytes, decrypting them when a password is supplied.
pub trait RenderEngine {
    /// Short engine name for logs (e.g. "pdfium").
    fn name(&self) -> &str;

    /// Whether the engine is initialised and can open documents.
    fn is_ready(&self) -> bool {
        true
    }

    /// Open a document. A wrong or missing password for an encrypted source
    /// must be reported as [`EngineError::Authentication`].
    fn open<'a>(
        &'a self,
        bytes: &'a [u8],
        password: Option<&'a str>,
    ) -> EngineResult<Box<dyn SourceDocument + 'a>>;
}

/// A document opened by a [`RenderEngine`].
pub trait SourceDocument {
    fn page_count(&self) -> usize;

    /// Fetch a page by 0-based index.
    fn page(&self, index: usize) -> EngineResult<Box<dyn SourcePage + '_>>;
}

/// One page of a [`SourceDocument`].
pub trait SourcePage {
    /// Visual page size in PDF points (1/72 inch), rotation applied.
    fn size_points(&self) -> (f32, f32);

    /// Pixel size this page renders to at `scale`.
    fn viewport(&self, scale: f32) -> Viewport {
        let (width, height) = self.size_points();
        Viewport::at_scale(width, height, scale)
    }

    /// Rasterize into a freshly allocated bitmap of the viewport's size.
    fn render(&self, viewport: Viewport) -> EngineResult<RenderedPage>;
}

// -- Encoding -----------------------------------------------------------------

/// Lossy bitmap encoder.
pub trait ImageEncoder {
    /// Consume a page bitmap and return encoded bytes at `quality` in `[0, 1]`.
    fn encode_lossy(&self, page: RenderedPage, quality: f32) -> EngineResult<Vec<u8>>;
}

// -- Authoring ----------------------------------------------------------------

/// Handle to an image embedded in a [`DocumentBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRef {
    pub index: usize,
    pub width_px: u32,
    pub height_px: u32,
}

impl ImageRef {
    /// Size of the image when every pixel is drawn at `factor` points.
    pub fn scaled(&self, factor: f32) -> (f32, f32) {
        (self.width_px as f32 * factor, self.height_px as f32 * factor)
    }
}

/// Handle to a page added to a [`DocumentBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRef(pub usize);

/// Placement rectangle in PDF user space (origin bottom-left, points).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// A rectangle covering a whole `width` × `height` page.
    pub fn full_page(width: f32, height: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }
}

/// Creates new, unencrypted PDF documents.
pub trait PdfAuthor {
    fn name(&self) -> &str;

    fn is_ready(&self) -> bool {
        true
    }

    fn create(&self) -> Box<dyn DocumentBuilder>;
}

/// Accumulates pages for a new document.
pub trait DocumentBuilder {
    /// Embed encoded image bytes (JPEG) and report their pixel size.
    fn embed_image(&mut self, bytes: &[u8]) -> EngineResult<ImageRef>;

    /// Embed decoded pixels losslessly. Alpha becomes a soft mask.
    fn embed_pixels(&mut self, image: &DynamicImage) -> EngineResult<ImageRef>;

    /// Append a blank page of `width` × `height` points.
    fn add_page(&mut self, width: f32, height: f32) -> PageRef;

    /// Draw an embedded image into `rect` on `page`.
    fn draw_image(&mut self, page: PageRef, image: ImageRef, rect: Rect) -> EngineResult<()>;

    fn page_count(&self) -> usize;

    /// Finish the document and return its bytes.
    fn serialize(self: Box<Self>) -> EngineResult<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_truncates_fractional_pixels() {
        let viewport = Viewport::at_scale(612.0, 792.0, 0.8);
        assert_eq!(viewport, Viewport { width: 489, height: 633 });
    }

    #[test]
    fn viewport_never_collapses_to_zero() {
        let viewport = Viewport::at_scale(0.5, 0.5, 0.1);
        assert_eq!(viewport, Viewport { width: 1, height: 1 });
    }

    #[test]
    fn rendered_page_rejects_short_buffers() {
        assert!(RenderedPage::from_rgba(2, 2, vec![0; 15]).is_err());
        let page = RenderedPage::from_rgba(2, 2, vec![0; 16]).unwrap();
        assert_eq!((page.width(), page.height()), (2, 2));
    }

    #[test]
    fn image_ref_scales_to_points() {
        let image = ImageRef {
            index: 0,
            width_px: 1224,
            height_px: 1584,
        };
        assert_eq!(image.scaled(0.5), (612.0, 792.0));
    }
}
