// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// paperkit-document — Document processing for Paperkit.
//
// Provides the rasterizing unlock/compress pipeline, PDF page tools (merge,
// split, rotate, organize, watermark), images→PDF, PDF→JPG packaging, and
// image compression.

pub mod archive;
pub mod image;
pub mod pdf;
pub mod pipeline;

#[cfg(test)]
mod testing;

// Re-export the primary structs so callers can use `paperkit_document::PdfReader` etc.
pub use archive::zip_pages;
pub use image::compress::{CompressedImage, compress_image};
pub use image::processor::ImageProcessor;
pub use pdf::reader::{PdfReader, merge_pdfs};
pub use pdf::writer::PdfWriter;
pub use pipeline::{PageImage, RasterPipeline};
