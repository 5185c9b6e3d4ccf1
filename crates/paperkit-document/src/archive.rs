// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ZIP packaging for exported page images.

use std::io::{Cursor, Write};

use paperkit_core::error::{PaperkitError, Result};
use tracing::{debug, instrument};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::pipeline::PageImage;

/// Pack exported pages into one ZIP archive, one entry per page, named as
/// the pages are (`page-1.jpg`, `page-2.jpg`, ...).
#[instrument(skip(pages), fields(pages = pages.len()))]
pub fn zip_pages(pages: &[PageImage]) -> Result<Vec<u8>> {
    if pages.is_empty() {
        return Err(PaperkitError::InvalidInput("no pages to package".into()));
    }

    let mut buffer = Vec::new();
    {
        let mut archive = zip::ZipWriter::new(Cursor::new(&mut buffer));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for page in pages {
            archive
                .start_file(page.name.as_str(), options)
                .map_err(|err| PaperkitError::Archive(format!("{}: {err}", page.name)))?;
            archive
                .write_all(&page.bytes)
                .map_err(|err| PaperkitError::Archive(format!("{}: {err}", page.name)))?;
        }
        archive
            .finish()
            .map_err(|err| PaperkitError::Archive(err.to_string()))?;
    }

    debug!(archive_bytes = buffer.len(), "Pages archived");
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn page(n: usize, bytes: &[u8]) -> PageImage {
        PageImage {
            name: format!("page-{n}.jpg"),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn entries_follow_page_order() {
        let pages = vec![page(1, b"first"), page(2, b"second"), page(3, b"third")];
        let bytes = zip_pages(&pages).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 3);
        for (index, expected) in pages.iter().enumerate() {
            let mut entry = archive.by_index(index).unwrap();
            assert_eq!(entry.name(), expected.name);
            let mut content = Vec::new();
            entry.read_to_end(&mut content).unwrap();
            assert_eq!(content, expected.bytes);
        }
    }

    #[test]
    fn nothing_to_package_is_an_error() {
        assert!(matches!(zip_pages(&[]), Err(PaperkitError::InvalidInput(_))));
    }
}
