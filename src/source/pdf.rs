//! PDF page source backed by lopdf.
//!
//! Text placement is recovered by walking each page's content stream and
//! tracking the graphics and text state; bitmaps come from a
//! [`PageRasterizer`].

use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;

use image::RgbaImage;
use lopdf::{Document as LopdfDocument, Object, ObjectId};

use super::{PageRasterizer, PdfSource, TextFragment};
use crate::detect::{check_pdf_bytes, check_pdf_path};
use crate::error::{Error, Result};
use crate::geometry::{Transform, Viewport};

/// Letter size, used when a page has no usable MediaBox.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Average glyph advance as a fraction of the font size. Content streams
/// carry no widths, so advances are estimated.
const AVG_CHAR_WIDTH: f32 = 0.5;

/// TJ adjustments beyond this (thousandths of an em) read as a word space.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// A [`PdfSource`] reading text from PDF content streams via lopdf.
pub struct LopdfSource {
    doc: LopdfDocument,
    pages: BTreeMap<u32, ObjectId>,
    rasterizer: Box<dyn PageRasterizer>,
}

impl LopdfSource {
    /// Open a PDF file. Non-PDF input is rejected before parsing.
    pub fn open<P: AsRef<Path>>(path: P, rasterizer: Box<dyn PageRasterizer>) -> Result<Self> {
        let path = path.as_ref();
        check_pdf_path(path)?;
        let doc = LopdfDocument::load(path)?;
        Ok(Self::from_document(doc, rasterizer))
    }

    /// Load a PDF from bytes.
    pub fn from_bytes(data: &[u8], rasterizer: Box<dyn PageRasterizer>) -> Result<Self> {
        check_pdf_bytes(data)?;
        let doc = LopdfDocument::load_mem(data)?;
        Ok(Self::from_document(doc, rasterizer))
    }

    /// Load a PDF from a reader.
    pub fn from_reader<R: Read>(
        mut reader: R,
        rasterizer: Box<dyn PageRasterizer>,
    ) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data, rasterizer)
    }

    fn from_document(doc: LopdfDocument, rasterizer: Box<dyn PageRasterizer>) -> Self {
        if doc.is_encrypted() {
            log::warn!("Document is encrypted; text extraction may be incomplete");
        }
        let pages = doc.get_pages();
        Self {
            doc,
            pages,
            rasterizer,
        }
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.pages
            .get(&page)
            .copied()
            .ok_or(Error::PageOutOfRange(page, self.pages.len() as u32))
    }

    /// MediaBox of a page, following the inheritance chain through `Parent`.
    fn media_box(&self, page_id: ObjectId) -> [f32; 4] {
        let mut current = self.doc.get_dictionary(page_id).ok();
        while let Some(dict) = current {
            if let Ok(array) = dict.get(b"MediaBox").and_then(|o| self.resolve(o).as_array()) {
                let values: Vec<f32> = array.iter().filter_map(get_number).collect();
                if values.len() >= 4 {
                    return [values[0], values[1], values[2], values[3]];
                }
            }
            current = dict
                .get(b"Parent")
                .and_then(Object::as_reference)
                .and_then(|r| self.doc.get_dictionary(r))
                .ok();
        }
        DEFAULT_MEDIA_BOX
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(r) => self.doc.get_object(*r).unwrap_or(obj),
            _ => obj,
        }
    }

    /// Get page content stream.
    fn page_content(&self, page_id: ObjectId) -> Result<Vec<u8>> {
        let page_dict = self.doc.get_dictionary(page_id)?;
        let contents = match page_dict.get(b"Contents") {
            Ok(contents) => contents,
            // A page without content is legal and simply has no text.
            Err(_) => return Ok(Vec::new()),
        };

        match contents {
            Object::Reference(r) => match self.doc.get_object(*r)? {
                Object::Stream(s) => Ok(stream_bytes(s)),
                Object::Array(arr) => Ok(self.concat_streams(arr)),
                _ => Err(Error::PdfParse("Invalid content stream".to_string())),
            },
            Object::Array(arr) => Ok(self.concat_streams(arr)),
            _ => Err(Error::PdfParse("Invalid content stream".to_string())),
        }
    }

    fn concat_streams(&self, refs: &[Object]) -> Vec<u8> {
        let mut content = Vec::new();
        for obj in refs {
            if let Ok(Object::Stream(s)) = obj.as_reference().and_then(|r| self.doc.get_object(r)) {
                content.extend_from_slice(&stream_bytes(s));
                content.push(b' ');
            }
        }
        content
    }

    /// Walk a content stream and emit one fragment per shown string.
    fn parse_content(
        &self,
        content: &[u8],
        fonts: &BTreeMap<Vec<u8>, &lopdf::Dictionary>,
    ) -> Result<Vec<TextFragment>> {
        let content = lopdf::content::Content::decode(content)?;

        let base_fonts: HashMap<&[u8], String> = fonts
            .iter()
            .map(|(name, dict)| {
                let base = dict
                    .get(b"BaseFont")
                    .and_then(Object::as_name)
                    .map(|n| String::from_utf8_lossy(n).to_string())
                    .unwrap_or_else(|_| String::from_utf8_lossy(name).to_string());
                (name.as_slice(), base)
            })
            .collect();

        let mut fragments = Vec::new();
        let mut gs_stack: Vec<Transform> = Vec::new();
        let mut state = TextState::default();

        for op in content.operations {
            let operands = &op.operands;
            match op.operator.as_str() {
                "q" => gs_stack.push(state.ctm),
                "Q" => state.ctm = gs_stack.pop().unwrap_or(Transform::IDENTITY),
                "cm" => {
                    if let Some(m) = matrix_operands(operands) {
                        state.ctm = m.then(&state.ctm);
                    }
                }
                "BT" => state.begin_text(),
                "ET" => state.in_text = false,
                "Tf" => {
                    if let [Object::Name(name), size, ..] = operands.as_slice() {
                        state.font_key = name.clone();
                        state.font_name = base_fonts
                            .get(name.as_slice())
                            .cloned()
                            .unwrap_or_else(|| String::from_utf8_lossy(name).to_string());
                        state.font_size = get_number(size).unwrap_or(12.0);
                    }
                }
                "TL" => {
                    if let Some(leading) = operands.first().and_then(get_number) {
                        state.leading = leading;
                    }
                }
                "Td" => {
                    if let [tx, ty, ..] = operands.as_slice() {
                        state.move_line(
                            get_number(tx).unwrap_or(0.0),
                            get_number(ty).unwrap_or(0.0),
                        );
                    }
                }
                "TD" => {
                    if let [tx, ty, ..] = operands.as_slice() {
                        let ty = get_number(ty).unwrap_or(0.0);
                        state.leading = -ty;
                        state.move_line(get_number(tx).unwrap_or(0.0), ty);
                    }
                }
                "Tm" => {
                    if let Some(m) = matrix_operands(operands) {
                        state.line_matrix = m;
                        state.text_matrix = m;
                    }
                }
                "T*" => state.next_line(),
                "Tj" | "TJ" | "'" | "\"" => {
                    if op.operator == "'" || op.operator == "\"" {
                        state.next_line();
                    }
                    if !state.in_text {
                        continue;
                    }
                    let shown = match op.operator.as_str() {
                        "TJ" => operands.first(),
                        "\"" => operands.get(2),
                        _ => operands.first(),
                    };
                    let (text, adjust) = match shown {
                        Some(Object::Array(items)) => self.decode_array(items, fonts, &state),
                        Some(Object::String(bytes, _)) => (self.decode(bytes, fonts, &state), 0.0),
                        _ => continue,
                    };
                    if let Some(fragment) = state.show(text, adjust) {
                        fragments.push(fragment);
                    }
                }
                _ => {}
            }
        }

        Ok(fragments)
    }

    fn decode(
        &self,
        bytes: &[u8],
        fonts: &BTreeMap<Vec<u8>, &lopdf::Dictionary>,
        state: &TextState,
    ) -> String {
        let encoding = fonts
            .get(&state.font_key)
            .and_then(|f| f.get_font_encoding(&self.doc).ok());
        match encoding {
            Some(enc) => LopdfDocument::decode_text(&enc, bytes).unwrap_or_default(),
            None => decode_text_simple(bytes),
        }
    }

    /// Decode a TJ array. Returns the text plus the summed positioning
    /// adjustment in thousandths of an em (positive moves right).
    fn decode_array(
        &self,
        items: &[Object],
        fonts: &BTreeMap<Vec<u8>, &lopdf::Dictionary>,
        state: &TextState,
    ) -> (String, f32) {
        let mut combined = String::new();
        let mut adjust = 0.0;
        for item in items {
            match item {
                Object::String(bytes, _) => combined.push_str(&self.decode(bytes, fonts, state)),
                other => {
                    if let Some(n) = get_number(other) {
                        adjust -= n;
                        if -n > TJ_SPACE_THRESHOLD
                            && !combined.is_empty()
                            && !combined.ends_with(' ')
                            && !combined.chars().last().is_some_and(is_spaceless_script_char)
                        {
                            combined.push(' ');
                        }
                    }
                }
            }
        }
        (combined, adjust)
    }
}

impl PdfSource for LopdfSource {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn viewport(&self, page: u32, scale: f32) -> Result<Viewport> {
        let page_id = self.page_id(page)?;
        Ok(Viewport::from_media_box(self.media_box(page_id), scale))
    }

    fn text_fragments(&self, page: u32) -> Result<Vec<TextFragment>> {
        let page_id = self.page_id(page)?;
        let fonts = self.doc.get_page_fonts(page_id)?;
        let content = self.page_content(page_id)?;
        if content.is_empty() {
            return Ok(Vec::new());
        }
        self.parse_content(&content, &fonts)
    }

    fn render(&self, page: u32, viewport: &Viewport) -> Result<RgbaImage> {
        self.page_id(page)?;
        self.rasterizer.rasterize(page, viewport)
    }
}

/// Graphics and text state needed to position shown strings.
struct TextState {
    ctm: Transform,
    text_matrix: Transform,
    line_matrix: Transform,
    font_key: Vec<u8>,
    font_name: String,
    font_size: f32,
    leading: f32,
    in_text: bool,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            ctm: Transform::IDENTITY,
            text_matrix: Transform::IDENTITY,
            line_matrix: Transform::IDENTITY,
            font_key: Vec::new(),
            font_name: String::new(),
            font_size: 12.0,
            leading: 0.0,
            in_text: false,
        }
    }
}

impl TextState {
    fn begin_text(&mut self) {
        self.in_text = true;
        self.text_matrix = Transform::IDENTITY;
        self.line_matrix = Transform::IDENTITY;
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Transform::translation(tx, ty).then(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = if self.leading != 0.0 {
            self.leading
        } else {
            self.font_size
        };
        self.move_line(0.0, -leading);
    }

    /// Emit a fragment for `text` at the current position and advance.
    fn show(&mut self, text: String, adjust: f32) -> Option<TextFragment> {
        let glyphs = text.chars().count() as f32;
        let advance = (glyphs * AVG_CHAR_WIDTH + adjust / 1000.0) * self.font_size;

        let size = Transform([self.font_size, 0.0, 0.0, self.font_size, 0.0, 0.0]);
        let trm = size.then(&self.text_matrix).then(&self.ctm);
        let [a, b, ..] = trm.0;
        let width = glyphs * AVG_CHAR_WIDTH * a.hypot(b);

        self.text_matrix = Transform::translation(advance, 0.0).then(&self.text_matrix);

        if text.trim().is_empty() {
            return None;
        }
        Some(TextFragment {
            text,
            transform: trm,
            width,
            height: None,
            font_name: self.font_name.clone(),
        })
    }
}

/// Decoded stream data; unfiltered streams are returned as stored.
fn stream_bytes(stream: &lopdf::Stream) -> Vec<u8> {
    if stream.dict.get(b"Filter").is_err() {
        return stream.content.clone();
    }
    stream.decompressed_content().unwrap_or_else(|e| {
        log::warn!("Content stream could not be decompressed: {}", e);
        stream.content.clone()
    })
}

fn matrix_operands(operands: &[Object]) -> Option<Transform> {
    if operands.len() < 6 {
        return None;
    }
    let mut m = [0.0f32; 6];
    for (slot, obj) in m.iter_mut().zip(operands) {
        *slot = get_number(obj)?;
    }
    Some(Transform(m))
}

/// Helper to extract number from PDF object.
fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Scripts written without spaces between words (Chinese, Japanese).
/// Hangul is deliberately excluded: Korean uses word spaces.
fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;
    (0x4E00..=0x9FFF).contains(&code)
        || (0x3400..=0x4DBF).contains(&code)
        || (0x20000..=0x2EBEF).contains(&code)
        || (0x3040..=0x30FF).contains(&code)
        || (0x3000..=0x303F).contains(&code)
}

/// Decoding fallback when the font has no usable encoding.
fn decode_text_simple(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        // Latin-1
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::WhiteCanvas;

    /// Build a one-page PDF with the given content stream and a Times font.
    fn pdf_with_content(content: &str) -> Vec<u8> {
        use lopdf::{dictionary, Stream};

        let mut doc = LopdfDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Times-Roman",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.as_bytes().to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 600.into(), 800.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    fn source(content: &str) -> LopdfSource {
        LopdfSource::from_bytes(&pdf_with_content(content), Box::new(WhiteCanvas)).unwrap()
    }

    #[test]
    fn test_rejects_non_pdf() {
        let result = LopdfSource::from_bytes(b"GIF89a......", Box::new(WhiteCanvas));
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_inherited_media_box() {
        let src = source("BT ET");
        assert_eq!(src.page_count(), 1);
        let vp = src.viewport(1, 2.0).unwrap();
        assert_eq!(vp.pixel_size(), (1200, 1600));
        assert!(matches!(src.viewport(2, 1.0), Err(Error::PageOutOfRange(2, 1))));
    }

    #[test]
    fn test_fragments_from_content_stream() {
        let src = source("BT /F1 12 Tf 72 700 Td (Hello) Tj 0 -20 Td (World) Tj ET");
        let frags = src.text_fragments(1).unwrap();

        assert_eq!(frags.len(), 2);
        assert_eq!(frags[0].text, "Hello");
        assert_eq!(frags[0].font_name, "Times-Roman");
        assert_eq!(frags[0].transform.0, [12.0, 0.0, 0.0, 12.0, 72.0, 700.0]);
        assert!((frags[0].width - 30.0).abs() < 1e-3);
        assert_eq!(frags[1].transform.translate_y(), 680.0);
    }

    #[test]
    fn test_tm_and_cm_compose() {
        let src = source("q 2 0 0 2 0 0 cm BT /F1 10 Tf 1 0 0 1 50 100 Tm (Scaled) Tj ET Q");
        let frags = src.text_fragments(1).unwrap();
        assert_eq!(frags[0].transform.0, [20.0, 0.0, 0.0, 20.0, 100.0, 200.0]);
    }

    #[test]
    fn test_consecutive_shows_advance() {
        let src = source("BT /F1 10 Tf 0 0 Td (ab) Tj (cd) Tj ET");
        let frags = src.text_fragments(1).unwrap();
        assert_eq!(frags.len(), 2);
        assert!((frags[1].transform.translate_x() - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_tj_array_inserts_word_space() {
        let src = source("BT /F1 10 Tf 0 0 Td [(Hello) -300 (World)] TJ ET");
        let frags = src.text_fragments(1).unwrap();
        assert_eq!(frags[0].text, "Hello World");
    }

    #[test]
    fn test_render_delegates_to_rasterizer() {
        let src = source("BT ET");
        let vp = src.viewport(1, 0.5).unwrap();
        let bitmap = src.render(1, &vp).unwrap();
        assert_eq!(bitmap.dimensions(), (300, 400));
    }

    #[test]
    fn test_decode_text_simple() {
        assert_eq!(decode_text_simple(b"plain"), "plain");
        assert_eq!(decode_text_simple(&[0xFE, 0xFF, 0x00, 0x41]), "A");
        assert_eq!(decode_text_simple(&[0xE9]), "é");
    }
}
