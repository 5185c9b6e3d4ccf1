// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rasterizing pipeline: open (and thereby decrypt) a PDF, render every page,
// re-encode each page as JPEG, and rebuild an unencrypted PDF from the images.
//
// Used for both unlocking (high fidelity) and compressing (deliberately
// lossy). Pages are processed strictly in order and one at a time; each page
// bitmap is moved into the encoder and freed before the next page is rendered.

use paperkit_core::config::AppConfig;
use paperkit_core::error::{PaperkitError, Result};
use paperkit_core::password::Password;
use paperkit_core::types::{CompressionLevel, CompressionPresets, RasterOptions};
use paperkit_engine::{Engines, Rect};
use tracing::{debug, info, instrument};

/// One exported page image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// `page-{n}.jpg`, `n` starting at 1.
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Owns an engine set and the presets used by the wrapper operations.
pub struct RasterPipeline {
    engines: Engines,
    unlock: RasterOptions,
    compression: CompressionPresets,
    page_export: RasterOptions,
}

impl RasterPipeline {
    /// Pipeline with the built-in presets.
    pub fn new(engines: Engines) -> Self {
        Self {
            engines,
            unlock: RasterOptions::UNLOCK,
            compression: CompressionPresets::default(),
            page_export: RasterOptions::PAGE_EXPORT,
        }
    }

    /// Pipeline with presets taken from a loaded configuration.
    pub fn from_config(engines: Engines, config: &AppConfig) -> Self {
        Self {
            engines,
            unlock: config.unlock,
            compression: config.compression,
            page_export: config.page_export,
        }
    }

    // -- Core -----------------------------------------------------------------

    /// Rasterize every page of `source` and rebuild it as an unencrypted PDF.
    ///
    /// Fails with `EngineNotReady` before looking at `source` when the render
    /// engine or PDF author is missing, with `IncorrectPassword` when the
    /// engine rejects the password, and with `ProcessingFailed` for anything
    /// else. No partial output is ever returned.
    #[instrument(
        skip(self, source, password),
        fields(
            source_bytes = source.len(),
            has_password = password.is_some(),
            scale = options.scale,
            quality = options.quality
        )
    )]
    pub fn process_pdf(
        &self,
        source: &[u8],
        password: Option<&Password>,
        options: RasterOptions,
    ) -> Result<Vec<u8>> {
        let renderer = self.engines.renderer()?;
        let author = self.engines.author()?;
        let encoder = self.engines.encoder();
        options.validate()?;

        let document = renderer.open(source, password.map(Password::expose))?;
        let page_count = document.page_count();
        info!(page_count, renderer = renderer.name(), "Rasterizing PDF");

        let mut builder = author.create();
        for index in 0..page_count {
            let page = document.page(index)?;
            let viewport = page.viewport(options.scale);
            let bitmap = page.render(viewport)?;
            let jpeg = encoder.encode_lossy(bitmap, options.quality)?;

            let image = builder.embed_image(&jpeg)?;
            let (width, height) = image.scaled(1.0 / options.scale);
            let target = builder.add_page(width, height);
            builder.draw_image(target, image, Rect::full_page(width, height))?;

            debug!(
                page = index + 1,
                width_px = image.width_px,
                height_px = image.height_px,
                jpeg_bytes = jpeg.len(),
                "Page rebuilt"
            );
        }

        let output = builder.serialize()?;
        info!(page_count, output_bytes = output.len(), "PDF rebuilt");
        Ok(output)
    }

    // -- Presets --------------------------------------------------------------

    /// Remove password protection, keeping pages sharp.
    pub fn unlock_pdf(&self, source: &[u8], password: &Password) -> Result<Vec<u8>> {
        self.process_pdf(source, Some(password), self.unlock)
    }

    /// Shrink an unencrypted PDF by re-rendering it at the `level` preset.
    pub fn compress_pdf(&self, source: &[u8], level: CompressionLevel) -> Result<Vec<u8>> {
        self.process_pdf(source, None, self.compression.preset(level))
    }

    // -- Page export ----------------------------------------------------------

    /// Render every page to a JPEG named `page-{n}.jpg`.
    #[instrument(skip(self, source, password), fields(source_bytes = source.len()))]
    pub fn export_pages(
        &self,
        source: &[u8],
        password: Option<&Password>,
    ) -> Result<Vec<PageImage>> {
        let renderer = self.engines.renderer()?;
        let encoder = self.engines.encoder();
        let options = self.page_export;
        options.validate()?;

        let document = renderer.open(source, password.map(Password::expose))?;
        let page_count = document.page_count();
        if page_count == 0 {
            return Err(PaperkitError::ProcessingFailed(
                "document has no pages to export".into(),
            ));
        }

        let mut images = Vec::with_capacity(page_count);
        for index in 0..page_count {
            let page = document.page(index)?;
            let bitmap = page.render(page.viewport(options.scale))?;
            let bytes = encoder.encode_lossy(bitmap, options.quality)?;
            images.push(PageImage {
                name: format!("page-{}.jpg", index + 1),
                bytes,
            });
        }

        info!(page_count, "Pages exported");
        Ok(images)
    }
}
