// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text watermarks stamped onto every page of an existing PDF.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use paperkit_core::error::{PaperkitError, Result};
use paperkit_core::types::WatermarkOptions;
use tracing::{debug, info, instrument};

use super::reader::{PdfReader, inherited_attribute};

const FONT_NAME: &[u8] = b"PkWatermarkFont";
const STATE_NAME: &[u8] = b"PkWatermarkState";

impl PdfReader {
    /// Draw `options.text` across every page.
    ///
    /// The text starts at `(w/2 - size*len/4, h/2)` and is rotated by
    /// `options.angle_degrees` around that point, in Helvetica with the given
    /// colour and fill opacity. Existing page content is wrapped in `q`/`Q`
    /// so its graphics state cannot leak into the stamp.
    #[instrument(skip_all, fields(text_len = options.text.len(), pages = self.page_count()))]
    pub fn watermark(&self, options: &WatermarkOptions) -> Result<Vec<u8>> {
        options.validate()?;

        let mut doc = self.document().clone();
        let font_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(b"Helvetica".to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ]));
        let state_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"ExtGState".to_vec())),
            ("ca", Object::Real(options.opacity)),
            ("CA", Object::Real(options.opacity)),
        ]));
        let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));

        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        for page_id in &page_ids {
            let (width, height) = page_size(&doc, *page_id);
            let stamp = stamp_operations(options, width, height)
                .encode()
                .map_err(|err| PaperkitError::Pdf(format!("watermark content: {}", err)))?;
            let stamp_id = doc.add_object(Stream::new(Dictionary::new(), stamp));

            let resources = resources_with_stamp(&doc, *page_id, font_id, state_id);
            let contents = wrapped_contents(&doc, *page_id, save_id, stamp_id);

            if let Ok(Object::Dictionary(page)) = doc.get_object_mut(*page_id) {
                page.set("Resources", Object::Dictionary(resources));
                page.set("Contents", Object::Array(contents));
            }
            debug!(?page_id, width, height, "Watermark applied");
        }

        let mut output = Vec::new();
        doc.save_to(&mut output).map_err(|err| {
            PaperkitError::Pdf(format!("failed to serialise watermarked PDF: {}", err))
        })?;
        info!(pages = page_ids.len(), output_bytes = output.len(), "PDF watermarked");
        Ok(output)
    }
}

/// Visible page size from the (possibly inherited) MediaBox; US Letter if absent.
fn page_size(doc: &Document, page_id: ObjectId) -> (f32, f32) {
    let media_box = inherited_attribute(doc, page_id, b"MediaBox")
        .and_then(|obj| resolve(doc, obj).as_array().ok())
        .and_then(|items| {
            let values: Vec<f32> = items
                .iter()
                .filter_map(|item| resolve(doc, item).as_float().ok())
                .collect();
            (values.len() == 4).then(|| (values[2] - values[0], values[3] - values[1]))
        });
    media_box.unwrap_or((612.0, 792.0))
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        other => other,
    }
}

/// Clone a sub-dictionary (direct or referenced) out of `dict`, or start empty.
fn sub_dictionary(doc: &Document, dict: &Dictionary, key: &[u8]) -> Dictionary {
    dict.get(key)
        .ok()
        .and_then(|value| resolve(doc, value).as_dict().ok())
        .cloned()
        .unwrap_or_default()
}

/// The page's effective resources, copied into a page-local dictionary with
/// the watermark font and graphics state added.
fn resources_with_stamp(
    doc: &Document,
    page_id: ObjectId,
    font_id: ObjectId,
    state_id: ObjectId,
) -> Dictionary {
    let mut resources = inherited_attribute(doc, page_id, b"Resources")
        .and_then(|value| resolve(doc, value).as_dict().ok())
        .cloned()
        .unwrap_or_default();

    let mut fonts = sub_dictionary(doc, &resources, b"Font");
    fonts.set(FONT_NAME, Object::Reference(font_id));
    let mut states = sub_dictionary(doc, &resources, b"ExtGState");
    states.set(STATE_NAME, Object::Reference(state_id));

    resources.set("Font", Object::Dictionary(fonts));
    resources.set("ExtGState", Object::Dictionary(states));
    resources
}

/// `[q, original..., Q + stamp]` as a content array.
fn wrapped_contents(
    doc: &Document,
    page_id: ObjectId,
    save_id: ObjectId,
    stamp_id: ObjectId,
) -> Vec<Object> {
    let mut contents = vec![Object::Reference(save_id)];
    if let Ok(page) = doc.get_dictionary(page_id) {
        match page.get(b"Contents") {
            Ok(Object::Array(items)) => contents.extend(items.iter().cloned()),
            Ok(Object::Reference(id)) => match doc.get_object(*id) {
                // An indirect array of streams.
                Ok(Object::Array(items)) => contents.extend(items.iter().cloned()),
                _ => contents.push(Object::Reference(*id)),
            },
            _ => {}
        }
    }
    contents.push(Object::Reference(stamp_id));
    contents
}

fn stamp_operations(options: &WatermarkOptions, width: f32, height: f32) -> Content {
    let text = win_ansi_bytes(&options.text);
    let x = width / 2.0 - options.font_size * text.len() as f32 / 4.0;
    let y = height / 2.0;
    let (sin, cos) = options.angle_degrees.to_radians().sin_cos();
    let [r, g, b] = options.color.to_unit();

    Content {
        operations: vec![
            // Restores the state saved by the leading `q` stream.
            Operation::new("Q", vec![]),
            Operation::new("q", vec![]),
            Operation::new("gs", vec![Object::Name(STATE_NAME.to_vec())]),
            Operation::new("rg", vec![Object::Real(r), Object::Real(g), Object::Real(b)]),
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(FONT_NAME.to_vec()), Object::Real(options.font_size)],
            ),
            Operation::new(
                "Tm",
                vec![
                    Object::Real(cos),
                    Object::Real(sin),
                    Object::Real(-sin),
                    Object::Real(cos),
                    Object::Real(x),
                    Object::Real(y),
                ],
            ),
            Operation::new("Tj", vec![Object::String(text, StringFormat::Literal)]),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ],
    }
}

/// Latin-1 subset of WinAnsi; anything outside it becomes `?`.
fn win_ansi_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match u32::from(c) {
            code @ 0x20..=0x7E | code @ 0xA0..=0xFF => code as u8,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use paperkit_core::types::Rgb;

    fn stamp_of(bytes: &[u8], page_number: u32) -> Vec<Operation> {
        let doc = Document::load_mem(bytes).unwrap();
        let page_id = *doc.get_pages().get(&page_number).unwrap();
        doc.get_and_decode_page_content(page_id).unwrap().operations
    }

    #[test]
    fn every_page_gets_the_text() {
        let source = letter_pdf(3);
        let marked = PdfReader::from_bytes(&source)
            .unwrap()
            .watermark(&WatermarkOptions::default())
            .unwrap();

        assert_eq!(page_sizes(&marked).len(), 3);
        for page in 1..=3 {
            let ops = stamp_of(&marked, page);
            let texts: Vec<Vec<u8>> = ops
                .iter()
                .filter(|op| op.operator == "Tj")
                .filter_map(|op| op.operands.first()?.as_str().ok())
                .map(|text| text.to_vec())
                .collect();
            assert_eq!(
                texts,
                vec![format!("Page {page}").into_bytes(), b"CONFIDENTIAL".to_vec()]
            );
        }
    }

    #[test]
    fn stamp_is_centred_and_rotated() {
        let options = WatermarkOptions {
            text: "DRAFT".into(),
            font_size: 40.0,
            angle_degrees: 90.0,
            color: Rgb { r: 0, g: 0, b: 255 },
            ..WatermarkOptions::default()
        };
        let ops = stamp_operations(&options, 600.0, 800.0).operations;
        let tm = ops.iter().find(|op| op.operator == "Tm").unwrap();
        let values: Vec<f32> = tm.operands.iter().map(|o| o.as_float().unwrap()).collect();

        assert!(values[0].abs() < 1e-6);
        assert!((values[1] - 1.0).abs() < 1e-6);
        // 300 - 40 * 5 / 4
        assert_eq!(values[4], 250.0);
        assert_eq!(values[5], 400.0);

        let rg = ops.iter().find(|op| op.operator == "rg").unwrap();
        let colour: Vec<f32> = rg.operands.iter().map(|o| o.as_float().unwrap()).collect();
        assert_eq!(colour, vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn opacity_is_applied_through_ext_gstate() {
        let marked = PdfReader::from_bytes(&letter_pdf(1))
            .unwrap()
            .watermark(&WatermarkOptions::default())
            .unwrap();
        let doc = Document::load_mem(&marked).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();
        let page = doc.get_dictionary(page_id).unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();

        let states = resources.get(b"ExtGState").unwrap().as_dict().unwrap();
        let state_id = states.get(STATE_NAME).unwrap().as_reference().unwrap();
        let state = doc.get_dictionary(state_id).unwrap();
        assert!((state.get(b"ca").unwrap().as_float().unwrap() - 0.3).abs() < 1e-6);

        // The original font is still reachable next to the watermark font.
        let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
        assert!(fonts.has(b"F1"));
        assert!(fonts.has(FONT_NAME));
    }

    #[test]
    fn empty_text_is_rejected() {
        let options = WatermarkOptions {
            text: String::new(),
            ..WatermarkOptions::default()
        };
        let err = PdfReader::from_bytes(&letter_pdf(1))
            .unwrap()
            .watermark(&options)
            .unwrap_err();
        assert!(matches!(err, PaperkitError::InvalidInput(_)));
    }

    #[test]
    fn non_latin_text_is_replaced() {
        assert_eq!(win_ansi_bytes("Café 東京"), b"Caf\xE9 ??".to_vec());
    }
}
