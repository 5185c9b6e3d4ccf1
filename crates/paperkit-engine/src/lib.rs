// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Paperkit — Engine abstractions for the rasterizing pipeline.
//
// Three capabilities are needed to rebuild a PDF from pictures of its pages:
// a render engine (PDF bytes + password -> page bitmaps), a lossy image
// encoder and a PDF author. `Engines` bundles one of each and is handed to
// the pipeline explicitly; there is no process-wide engine state.

pub mod authoring;
pub mod jpeg;
pub mod stub;
pub mod traits;

#[cfg(feature = "pdfium")]
pub mod pdfium;

use paperkit_core::config::EngineConfig;
use paperkit_core::error::{PaperkitError, Result};
use tracing::{info, warn};

pub use authoring::LopdfAuthor;
pub use jpeg::JpegPageEncoder;
pub use stub::UnavailableRenderer;
pub use traits::*;

/// The engine set used by the pipeline.
pub struct Engines {
    renderer: Box<dyn RenderEngine>,
    encoder: Box<dyn ImageEncoder>,
    author: Box<dyn PdfAuthor>,
}

impl Engines {
    pub fn new(
        renderer: Box<dyn RenderEngine>,
        encoder: Box<dyn ImageEncoder>,
        author: Box<dyn PdfAuthor>,
    ) -> Self {
        Self {
            renderer,
            encoder,
            author,
        }
    }

    /// Build the default engine set: PDFium for rendering (when compiled in
    /// and loadable), the `image` JPEG encoder and the `lopdf` author.
    ///
    /// Never fails. If PDFium cannot be bound, an [`UnavailableRenderer`] is
    /// installed so that rasterizing operations report `EngineNotReady`
    /// while the page tools keep working.
    pub fn initialize(config: &EngineConfig) -> Self {
        let renderer = default_renderer(config);
        info!(renderer = renderer.name(), ready = renderer.is_ready(), "Engines initialised");
        Self::new(renderer, Box::new(JpegPageEncoder), Box::new(LopdfAuthor))
    }

    /// The render engine, or `EngineNotReady` if it cannot open documents.
    pub fn renderer(&self) -> Result<&dyn RenderEngine> {
        if !self.renderer.is_ready() {
            return Err(PaperkitError::EngineNotReady(format!(
                "render engine '{}' is not initialised",
                self.renderer.name()
            )));
        }
        Ok(self.renderer.as_ref())
    }

    pub fn encoder(&self) -> &dyn ImageEncoder {
        self.encoder.as_ref()
    }

    /// The PDF author, or `EngineNotReady` if it cannot create documents.
    pub fn author(&self) -> Result<&dyn PdfAuthor> {
        if !self.author.is_ready() {
            return Err(PaperkitError::EngineNotReady(format!(
                "PDF author '{}' is not initialised",
                self.author.name()
            )));
        }
        Ok(self.author.as_ref())
    }

    /// Whether every engine needed for rasterizing is ready.
    pub fn is_ready(&self) -> bool {
        self.renderer.is_ready() && self.author.is_ready()
    }
}

#[cfg(feature = "pdfium")]
fn default_renderer(config: &EngineConfig) -> Box<dyn RenderEngine> {
    match pdfium::PdfiumRenderer::bind(config.pdfium_library_dir.as_deref()) {
        Ok(renderer) => Box::new(renderer),
        Err(err) => {
            warn!(error = %err, "PDFium unavailable, rasterizing operations disabled");
            Box::new(UnavailableRenderer::new(err.to_string()))
        }
    }
}

#[cfg(not(feature = "pdfium"))]
fn default_renderer(_config: &EngineConfig) -> Box<dyn RenderEngine> {
    warn!("Built without the \"pdfium\" feature, rasterizing operations disabled");
    Box::new(UnavailableRenderer::new(
        "PDF rendering support was not compiled in",
    ))
}
