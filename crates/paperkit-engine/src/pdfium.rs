// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDFium-backed render engine (feature "pdfium").

use std::path::Path;

use paperkit_core::error::EngineError;
use pdfium_render::prelude::*;
use tracing::{debug, info};

use crate::traits::*;

/// Render engine backed by a dynamically bound PDFium library.
pub struct PdfiumRenderer {
    pdfium: Pdfium,
}

impl PdfiumRenderer {
    /// Bind to PDFium, trying `library_dir` first (if given), then the
    /// working directory, then the system library search path.
    pub fn bind(library_dir: Option<&Path>) -> EngineResult<Self> {
        let mut candidates: Vec<String> = Vec::new();
        if let Some(dir) = library_dir {
            candidates.push(dir.display().to_string());
        }
        candidates.push("./".to_string());

        let mut last_error = None;
        for dir in &candidates {
            match Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir)) {
                Ok(bindings) => {
                    info!(dir = %dir, "PDFium bound");
                    return Ok(Self {
                        pdfium: Pdfium::new(bindings),
                    });
                }
                Err(err) => {
                    debug!(dir = %dir, error = %err, "PDFium not found here");
                    last_error = Some(err);
                }
            }
        }

        match Pdfium::bind_to_system_library() {
            Ok(bindings) => {
                info!("PDFium bound from system library");
                Ok(Self {
                    pdfium: Pdfium::new(bindings),
                })
            }
            Err(err) => {
                let detail = last_error
                    .map(|first| format!("{first}; system library: {err}"))
                    .unwrap_or_else(|| err.to_string());
                Err(EngineError::Unavailable(format!(
                    "could not load the PDFium library ({detail})"
                )))
            }
        }
    }
}

impl RenderEngine for PdfiumRenderer {
    fn name(&self) -> &str {
        "pdfium"
    }

    fn open<'a>(
        &'a self,
        bytes: &'a [u8],
        password: Option<&'a str>,
    ) -> EngineResult<Box<dyn SourceDocument + 'a>> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(bytes, password)
            .map_err(map_pdfium_error)?;
        Ok(Box::new(PdfiumDocument { document }))
    }
}

struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl SourceDocument for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page(&self, index: usize) -> EngineResult<Box<dyn SourcePage + '_>> {
        let index = PdfPageIndex::try_from(index)
            .map_err(|_| EngineError::Failed(format!("page index {index} out of range")))?;
        let page = self
            .document
            .pages()
            .get(index)
            .map_err(map_pdfium_error)?;
        Ok(Box::new(PdfiumPage { page }))
    }
}

struct PdfiumPage<'a> {
    page: PdfPage<'a>,
}

impl SourcePage for PdfiumPage<'_> {
    fn size_points(&self) -> (f32, f32) {
        (self.page.width().value, self.page.height().value)
    }

    fn render(&self, viewport: Viewport) -> EngineResult<RenderedPage> {
        let config = PdfRenderConfig::new()
            .set_target_width(viewport.width as i32)
            .set_target_height(viewport.height as i32);
        let bitmap = self
            .page
            .render_with_config(&config)
            .map_err(map_pdfium_error)?;

        let width = bitmap.width() as u32;
        let height = bitmap.height() as u32;
        RenderedPage::from_rgba(width, height, bitmap.as_rgba_bytes())
    }
}

fn map_pdfium_error(err: PdfiumError) -> EngineError {
    match err {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            EngineError::Authentication
        }
        other => EngineError::Failed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_errors_map_to_authentication() {
        let err = map_pdfium_error(PdfiumError::PdfiumLibraryInternalError(
            PdfiumInternalError::PasswordError,
        ));
        assert_eq!(err, EngineError::Authentication);
    }

    #[test]
    fn other_internal_errors_are_failures() {
        let err = map_pdfium_error(PdfiumError::PdfiumLibraryInternalError(
            PdfiumInternalError::FormatError,
        ));
        assert!(matches!(err, EngineError::Failed(_)));
    }
}
