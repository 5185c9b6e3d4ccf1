// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — merging, splitting, rotating, organizing, watermarking, and
// creating PDFs from images.

pub mod reader;
pub mod watermark;
pub mod writer;

pub use reader::PdfReader;
pub use writer::PdfWriter;
