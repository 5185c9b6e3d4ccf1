// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Test fixtures: small lopdf-built documents and an in-process render engine
// that reads page sizes straight from the page tree.

use std::cell::Cell;
use std::rc::Rc;

use image::{Rgba, RgbaImage};
use lopdf::content::{Content, Operation};
use lopdf::{
    Dictionary, Document, EncryptionState, EncryptionVersion, Object, Permissions, StringFormat,
    Stream,
};
use paperkit_core::error::EngineError;
use paperkit_engine::*;

/// Build a PDF with one text page per entry of `sizes` (points).
///
/// The font lives in the inherited `/Resources` of the page tree root, so
/// page-copying code has to resolve inheritance to keep it.
pub fn sample_pdf(sizes: &[(i64, i64)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));

    let mut kids = Vec::new();
    for (index, (width, height)) in sizes.iter().enumerate() {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(12)]),
                Operation::new("Td", vec![Object::Integer(50), Object::Integer(50)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        format!("Page {}", index + 1).into_bytes(),
                        StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(*width),
                    Object::Integer(*height),
                ]),
            ),
            ("Contents", Object::Reference(content_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let fonts = Dictionary::from_iter(vec![("F1", Object::Reference(font_id))]);
    let resources = Dictionary::from_iter(vec![("Font", Object::Dictionary(fonts))]);
    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(sizes.len() as i64)),
        ("Kids", Object::Array(kids)),
        ("Resources", Object::Dictionary(resources)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// `n` US-letter pages.
pub fn letter_pdf(n: usize) -> Vec<u8> {
    sample_pdf(&vec![(612, 792); n])
}

/// `n` US-letter pages encrypted with RC4-128 and an empty user password,
/// so lopdf can still parse them.
pub fn encrypted_pdf(n: usize) -> Vec<u8> {
    let mut doc = Document::load_mem(&letter_pdf(n)).unwrap();
    let id = Object::String((1..=16).collect(), StringFormat::Literal);
    doc.trailer.set("ID", Object::Array(vec![id.clone(), id]));

    let state = EncryptionState::try_from(EncryptionVersion::V2 {
        document: &doc,
        owner_password: "owner",
        user_password: "",
        key_length: 128,
        permissions: Permissions::all(),
    })
    .unwrap();
    doc.encrypt(&state).unwrap();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Resolve a page attribute, walking up `/Parent` links.
fn inherited<'a>(doc: &'a Document, mut dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    loop {
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
        dict = doc.get_dictionary(parent).ok()?;
    }
}

/// `(width, height)` of every page's MediaBox, in order.
/// The start of a four-component (CMYK) JPEG: SOI, Adobe APP14, SOF0.
pub fn cmyk_jpeg_header() -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xEE, 0x00, 0x0E];
    bytes.extend_from_slice(b"Adobe\x00\x64\x00\x00\x00\x00\x00");
    bytes.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x14, 0x08, 0x00, 0x10, 0x00, 0x10, 0x04]);
    for id in 1..=4u8 {
        bytes.extend_from_slice(&[id, 0x11, 0x00]);
    }
    bytes.extend_from_slice(&[0xFF, 0xD9]);
    bytes
}

pub fn page_sizes(bytes: &[u8]) -> Vec<(f32, f32)> {
    page_sizes_of(&Document::load_mem(bytes).unwrap())
}

/// Effective `/Rotate` of every page, in order.
pub fn page_rotations(bytes: &[u8]) -> Vec<i64> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|id| {
            let page = doc.get_dictionary(*id).unwrap();
            inherited(&doc, page, b"Rotate")
                .and_then(|r| r.as_i64().ok())
                .unwrap_or(0)
        })
        .collect()
}

/// The literal text shown on each page (`Page n` for `sample_pdf` output).
pub fn page_labels(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|id| {
            let content = doc.get_and_decode_page_content(*id).unwrap();
            content
                .operations
                .iter()
                .find(|op| op.operator == "Tj")
                .and_then(|op| op.operands.first())
                .and_then(|o| o.as_str().ok())
                .map(|s| String::from_utf8_lossy(s).into_owned())
                .unwrap_or_default()
        })
        .collect()
}

// -- Render engine over lopdf -------------------------------------------------

/// Outstanding-bitmap bookkeeping shared between [`LopdfRenderer`] and
/// [`CountingEncoder`].
#[derive(Debug, Clone, Default)]
pub struct Residency {
    pub outstanding: Rc<Cell<usize>>,
    pub peak: Rc<Cell<usize>>,
    pub opens: Rc<Cell<usize>>,
}

impl Residency {
    fn acquire(&self) {
        let now = self.outstanding.get() + 1;
        self.outstanding.set(now);
        self.peak.set(self.peak.get().max(now));
    }

    fn release(&self) {
        self.outstanding.set(self.outstanding.get() - 1);
    }
}

/// Render engine that sizes pages from their MediaBox and paints each one a
/// gradient. With `lock_all`, every document needs `password` to open.
pub struct LopdfRenderer {
    pub password: Option<String>,
    pub lock_all: bool,
    pub ready: bool,
    pub residency: Residency,
}

impl LopdfRenderer {
    pub fn new() -> Self {
        Self {
            password: None,
            lock_all: false,
            ready: true,
            residency: Residency::default(),
        }
    }

    /// Every document opened by this engine is treated as encrypted with `password`.
    pub fn locked(password: &str) -> Self {
        Self {
            password: Some(password.to_string()),
            lock_all: true,
            ..Self::new()
        }
    }
}

impl RenderEngine for LopdfRenderer {
    fn name(&self) -> &str {
        "lopdf-test"
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn open<'a>(
        &'a self,
        bytes: &'a [u8],
        password: Option<&'a str>,
    ) -> EngineResult<Box<dyn SourceDocument + 'a>> {
        self.residency.opens.set(self.residency.opens.get() + 1);
        if self.lock_all && password != self.password.as_deref() {
            return Err(EngineError::Authentication);
        }
        let doc = Document::load_mem(bytes).map_err(|err| EngineError::Failed(err.to_string()))?;
        let sizes = page_sizes_of(&doc);
        Ok(Box::new(SizedDocument {
            sizes,
            residency: self.residency.clone(),
        }))
    }
}

fn page_sizes_of(doc: &Document) -> Vec<(f32, f32)> {
    doc.get_pages()
        .values()
        .map(|id| {
            let page = doc.get_dictionary(*id).unwrap();
            let media_box = inherited(doc, page, b"MediaBox").unwrap().as_array().unwrap();
            let value = |i: usize| media_box[i].as_float().unwrap();
            (value(2) - value(0), value(3) - value(1))
        })
        .collect()
}

struct SizedDocument {
    sizes: Vec<(f32, f32)>,
    residency: Residency,
}

impl SourceDocument for SizedDocument {
    fn page_count(&self) -> usize {
        self.sizes.len()
    }

    fn page(&self, index: usize) -> EngineResult<Box<dyn SourcePage + '_>> {
        let size = *self
            .sizes
            .get(index)
            .ok_or_else(|| EngineError::Failed(format!("no page {index}")))?;
        Ok(Box::new(SizedPage {
            size,
            index,
            residency: &self.residency,
        }))
    }
}

struct SizedPage<'a> {
    size: (f32, f32),
    index: usize,
    residency: &'a Residency,
}

impl SourcePage for SizedPage<'_> {
    fn size_points(&self) -> (f32, f32) {
        self.size
    }

    fn render(&self, viewport: Viewport) -> EngineResult<RenderedPage> {
        self.residency.acquire();
        let shade = (self.index * 37 % 200) as u8;
        let image = RgbaImage::from_fn(viewport.width, viewport.height, |x, y| {
            Rgba([shade, (x % 256) as u8, (y % 256) as u8, 255])
        });
        Ok(RenderedPage::from_image(image))
    }
}

/// Wraps the real JPEG encoder and marks each consumed bitmap as released.
pub struct CountingEncoder {
    pub residency: Residency,
}

impl ImageEncoder for CountingEncoder {
    fn encode_lossy(&self, page: RenderedPage, quality: f32) -> EngineResult<Vec<u8>> {
        let encoded = JpegPageEncoder.encode_lossy(page, quality);
        self.residency.release();
        encoded
    }
}

/// Engines around a [`LopdfRenderer`], sharing its residency counters.
pub fn test_engines(renderer: LopdfRenderer) -> Engines {
    let residency = renderer.residency.clone();
    Engines::new(
        Box::new(renderer),
        Box::new(CountingEncoder { residency }),
        Box::new(LopdfAuthor),
    )
}
