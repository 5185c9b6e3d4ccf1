// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open existing (unencrypted) PDF documents and merge, split,
// rotate, or reorganize their pages using the `lopdf` crate.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use paperkit_core::error::{PaperkitError, Result};
use paperkit_core::types::{OrganizeEntry, PageRange, Rotation};
use tracing::{debug, info, instrument, warn};

/// Inheritable page attributes copied onto each page. `/Rotate` is
/// handled separately.
const INHERITABLE: [&[u8]; 3] = [b"Resources", b"MediaBox", b"CropBox"];

/// Reads and manipulates existing PDF files.
///
/// Encrypted documents are refused: they have to go through the unlock
/// pipeline first.
pub struct PdfReader {
    document: Document,
    source_path: Option<String>,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            PaperkitError::Pdf(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        Self::checked(document, Some(path_ref.display().to_string()))
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            PaperkitError::Pdf(format!("failed to load PDF from memory: {}", err))
        })?;

        Self::checked(document, None)
    }

    fn checked(document: Document, source_path: Option<String>) -> Result<Self> {
        if document.is_encrypted() {
            warn!("Refusing encrypted document");
            return Err(PaperkitError::Encrypted);
        }
        debug!(pages = document.get_pages().len(), "PDF loaded");
        Ok(Self {
            document,
            source_path,
        })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Return the source path if the reader was created via [`PdfReader::open`].
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    pub(crate) fn document(&self) -> &Document {
        &self.document
    }

    // -- Page tools -----------------------------------------------------------

    /// Append every page of `others`, in order, after this document's pages.
    #[instrument(skip_all, fields(additional_count = others.len()))]
    pub fn merge(&self, others: &[&[u8]]) -> Result<Vec<u8>> {
        info!(
            base_pages = self.page_count(),
            additional_documents = others.len(),
            "Merging PDFs"
        );

        let mut assembler = PageAssembler::new();
        assembler.append_all(&self.document)?;

        for (index, other_bytes) in others.iter().enumerate() {
            let other = Self::from_bytes(other_bytes).map_err(|err| match err {
                PaperkitError::Pdf(detail) => {
                    PaperkitError::Pdf(format!("additional PDF #{}: {}", index + 1, detail))
                }
                other => other,
            })?;
            assembler.append_all(&other.document)?;
        }

        let output = assembler.finish()?;
        debug!(output_bytes = output.len(), "Merge complete");
        Ok(output)
    }

    /// Extract the inclusive, 1-based `range`, clamped to the document.
    #[instrument(skip(self))]
    pub fn split(&self, range: PageRange) -> Result<Vec<u8>> {
        let pages = self.document.get_pages();
        let (start, end) = range.clamp_to(pages.len() as u32)?;
        info!(start, end, total = pages.len(), "Splitting PDF");

        let mut assembler = PageAssembler::new();
        let mut copier = ObjectCopier::new(&self.document);
        for page_number in start..=end {
            let page_id = lookup_page(&pages, page_number)?;
            assembler.append(&mut copier, page_id, Rotation::NONE)?;
        }
        assembler.finish()
    }

    /// Rotate every page by `rotation` on top of its current rotation.
    #[instrument(skip(self), fields(degrees = rotation.degrees()))]
    pub fn rotate_all(&self, rotation: Rotation) -> Result<Vec<u8>> {
        let mut doc = self.document.clone();
        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();

        for page_id in &page_ids {
            let existing = effective_rotation(&doc, *page_id);
            let rotated = rotation.apply_to(existing);
            if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(*page_id) {
                dict.set("Rotate", Object::Integer(rotated));
            }
        }
        info!(pages = page_ids.len(), "Pages rotated");

        let mut output = Vec::new();
        doc.save_to(&mut output).map_err(|err| {
            PaperkitError::Pdf(format!("failed to serialise rotated PDF: {}", err))
        })?;
        Ok(output)
    }

    /// Build a new document from `entries`: each names a 1-based source page
    /// and an extra rotation. Pages may be reordered, dropped, or repeated.
    #[instrument(skip_all, fields(entries = entries.len()))]
    pub fn organize(&self, entries: &[OrganizeEntry]) -> Result<Vec<u8>> {
        if entries.is_empty() {
            return Err(PaperkitError::InvalidInput(
                "an organized document needs at least one page".into(),
            ));
        }

        let pages = self.document.get_pages();
        let mut assembler = PageAssembler::new();
        let mut copier = ObjectCopier::new(&self.document);
        for entry in entries {
            let page_id = lookup_page(&pages, entry.page)?;
            assembler.append(&mut copier, page_id, entry.rotation)?;
        }

        info!(source_pages = pages.len(), output_pages = entries.len(), "PDF organized");
        assembler.finish()
    }
}

/// Concatenate the pages of every input PDF, in order.
pub fn merge_pdfs(inputs: &[&[u8]]) -> Result<Vec<u8>> {
    let (first, rest) = inputs
        .split_first()
        .ok_or_else(|| PaperkitError::InvalidInput("no PDFs to merge".into()))?;
    PdfReader::from_bytes(first)?.merge(rest)
}

fn lookup_page(pages: &BTreeMap<u32, ObjectId>, page_number: u32) -> Result<ObjectId> {
    pages.get(&page_number).copied().ok_or_else(|| {
        PaperkitError::InvalidInput(format!(
            "page {} out of range (document has {} pages)",
            page_number,
            pages.len()
        ))
    })
}

// -- Page tree helpers --------------------------------------------------------

/// Look up `key` on a page, walking up `/Parent` links for inherited values.
pub(crate) fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut dict = doc.get_dictionary(page_id).ok()?;
    // Depth bound guards against malformed, cyclic page trees.
    for _ in 0..64 {
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
        dict = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn effective_rotation(doc: &Document, page_id: ObjectId) -> i64 {
    inherited_attribute(doc, page_id, b"Rotate")
        .and_then(|value| value.as_i64().ok())
        .unwrap_or(0)
}

/// Builds a fresh document by copying pages out of one or more sources.
struct PageAssembler {
    target: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl PageAssembler {
    fn new() -> Self {
        let mut target = Document::with_version("1.7");
        let pages_id = target.new_object_id();
        Self {
            target,
            pages_id,
            kids: Vec::new(),
        }
    }

    fn append_all(&mut self, source: &Document) -> Result<()> {
        let mut copier = ObjectCopier::new(source);
        for page_id in source.get_pages().into_values() {
            self.append(&mut copier, page_id, Rotation::NONE)?;
        }
        Ok(())
    }

    /// Copy one page (and everything it references) as the next page, with
    /// inherited attributes made explicit and `extra` added to its rotation.
    ///
    /// A source page appended more than once gets its own page dictionary
    /// each time; contents and resources stay shared.
    fn append(&mut self, copier: &mut ObjectCopier<'_>, page_id: ObjectId, extra: Rotation) -> Result<()> {
        let source = copier.source;
        let shared_id = copier.copy_reference(&mut self.target, page_id);
        let new_id = if self.kids.contains(&Object::Reference(shared_id)) {
            let duplicate = self
                .target
                .get_object(shared_id)
                .map_err(|err| PaperkitError::Pdf(format!("page object {:?}: {}", page_id, err)))?
                .clone();
            self.target.add_object(duplicate)
        } else {
            shared_id
        };

        let mut inherited = Vec::new();
        for key in INHERITABLE {
            if let Some(value) = inherited_attribute(source, page_id, key) {
                inherited.push((key, copier.copy(&mut self.target, value)));
            }
        }
        let rotation = extra.apply_to(effective_rotation(source, page_id));

        let page = match self.target.get_object_mut(new_id) {
            Ok(Object::Dictionary(dict)) => dict,
            _ => {
                return Err(PaperkitError::Pdf(format!(
                    "page object {:?} is not a dictionary",
                    page_id
                )));
            }
        };
        for (key, value) in inherited {
            if !page.has(key) {
                page.set(key, value);
            }
        }
        page.set("Rotate", Object::Integer(rotation));
        page.set("Parent", Object::Reference(self.pages_id));

        self.kids.push(Object::Reference(new_id));
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<u8>> {
        let count = self.kids.len() as i64;
        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(count)),
            ("Kids", Object::Array(self.kids)),
        ]);
        self.target
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.target.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(self.pages_id)),
        ]));
        self.target.trailer.set("Root", Object::Reference(catalog_id));

        let mut output = Vec::new();
        self.target.save_to(&mut output).map_err(|err| {
            PaperkitError::Pdf(format!("failed to serialise PDF: {}", err))
        })?;
        debug!(pages = count, output_bytes = output.len(), "Document assembled");
        Ok(output)
    }
}

/// Deep-copies objects from one source document into a target, copying each
/// referenced object once so shared fonts and images stay shared.
struct ObjectCopier<'s> {
    source: &'s Document,
    copied: BTreeMap<ObjectId, ObjectId>,
}

impl<'s> ObjectCopier<'s> {
    fn new(source: &'s Document) -> Self {
        Self {
            source,
            copied: BTreeMap::new(),
        }
    }

    /// Copy the object behind `id`, returning its id in `target`.
    fn copy_reference(&mut self, target: &mut Document, id: ObjectId) -> ObjectId {
        if let Some(existing) = self.copied.get(&id) {
            return *existing;
        }
        // Reserve the id first so reference cycles terminate.
        let new_id = target.new_object_id();
        self.copied.insert(id, new_id);

        let source = self.source;
        let cloned = match source.get_object(id) {
            Ok(object) => self.copy(target, object),
            Err(err) => {
                warn!(?id, %err, "Cannot resolve reference, using Null");
                Object::Null
            }
        };
        target.objects.insert(new_id, cloned);
        new_id
    }

    /// Copy a direct object. `/Parent` links are dropped; the page assembler
    /// re-links pages to the new page tree.
    fn copy(&mut self, target: &mut Document, object: &Object) -> Object {
        match object {
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dictionary(target, dict)),
            Object::Array(items) => Object::Array(
                items.iter().map(|item| self.copy(target, item)).collect(),
            ),
            Object::Reference(id) => Object::Reference(self.copy_reference(target, *id)),
            Object::Stream(stream) => {
                let dict = self.copy_dictionary(target, &stream.dict);
                Object::Stream(
                    Stream::new(dict, stream.content.clone())
                        .with_compression(stream.allows_compression),
                )
            }
            other => other.clone(),
        }
    }

    fn copy_dictionary(&mut self, target: &mut Document, dict: &Dictionary) -> Dictionary {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            if key == b"Parent" {
                continue;
            }
            copy.set(key.clone(), self.copy(target, value));
        }
        copy
    }
}
