//! Positioned text runs from a PDF page, read with `lopdf`.
//!
//! The interpreter follows the graphics and text state operators that move
//! text (`q Q cm BT Tm Td TD T* TL Tf Tc Tw`) and emits one [`TextRun`] per
//! text-showing operator (`Tj TJ ' "`). Form XObjects painted with `Do` are
//! entered so text inside them is found too.

use super::PlaceholderMapping;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use lazy_static::lazy_static;
use lopdf::{Dictionary, Document, Object, ObjectId};
use regex::Regex;
use std::collections::HashMap;
use std::rc::Rc;

lazy_static! {
    /// A `{{KEY}}` placeholder.
    pub static ref PLACEHOLDER: Regex = Regex::new(r"\{\{([\w_]+)\}\}").unwrap();
    static ref CMAP_TOKEN: Regex =
        Regex::new(r"<[0-9A-Fa-f\s]*>|\[|\]|beginbfchar|endbfchar|beginbfrange|endbfrange").unwrap();
}

/// Font size used when a run reports no height.
pub const DEFAULT_FONT_SIZE: f32 = 12.0;

/// Form XObjects nested deeper than this are not entered.
const MAX_FORM_DEPTH: usize = 8;

/// A TJ adjustment below this (in 1/1000 em) separates words.
const WORD_GAP: f32 = -200.0;

/// One text-showing operation with its position in user space.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// Decoded text
    pub text: String,
    /// Baseline origin x
    pub x: f32,
    /// Baseline origin y
    pub y: f32,
    /// Advance width
    pub width: f32,
    /// Effective font size
    pub height: f32,
}

/// Result of scanning a template's first page.
#[derive(Debug, Clone)]
pub struct ScannedTemplate {
    /// Page width
    pub width: f32,
    /// Page height
    pub height: f32,
    /// Placeholders relative to the page's lower-left corner
    pub mappings: IndexMap<String, PlaceholderMapping>,
}

/// Parse PDF bytes.
pub fn load_document(bytes: &[u8]) -> Result<Document> {
    let doc = Document::load_mem(bytes)?;
    if doc.get_pages().is_empty() {
        return Err(Error::InvalidTemplate("document has no pages".to_string()));
    }
    Ok(doc)
}

/// Page object ids in page order.
pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

/// Scan the first page for `{{KEY}}` placeholders.
///
/// Mappings are keyed by the literal text between the braces; a repeated
/// key keeps its first position in the map and its last location.
pub fn scan_template(bytes: &[u8]) -> Result<ScannedTemplate> {
    let doc = load_document(bytes)?;
    let page_id = page_ids(&doc)[0];
    let [x0, y0, x1, y1] = page_box(&doc, page_id)?;
    let runs = page_text_runs(&doc, page_id)?;

    let mut mappings = find_placeholders(&runs);
    for mapping in mappings.values_mut() {
        mapping.x -= x0;
        mapping.y -= y0;
    }

    if mappings.is_empty() {
        log::warn!("template has no {{{{KEY}}}} placeholders; it will be drawn as background only");
    } else {
        log::debug!("template placeholders: {:?}", mappings.keys().collect::<Vec<_>>());
    }

    Ok(ScannedTemplate {
        width: x1 - x0,
        height: y1 - y0,
        mappings,
    })
}

/// Placeholder mappings found in `runs`, first match per run.
pub fn find_placeholders(runs: &[TextRun]) -> IndexMap<String, PlaceholderMapping> {
    let mut mappings = IndexMap::new();
    for run in runs {
        if let Some(caps) = PLACEHOLDER.captures(&run.text) {
            let key = caps[1].to_string();
            let font_size = if run.height > 0.0 {
                run.height
            } else {
                DEFAULT_FONT_SIZE
            };
            mappings.insert(key.clone(), PlaceholderMapping::new(key, run.x, run.y, font_size));
        }
    }
    mappings
}

/// The page's MediaBox as `[x0, y0, x1, y1]`, normalized, inherited through
/// the page tree. Pages without one get US Letter.
pub fn page_box(doc: &Document, page_id: ObjectId) -> Result<[f32; 4]> {
    let page = doc.get_object(page_id)?.as_dict()?;
    let Some(media_box) = inherited(doc, page, b"MediaBox") else {
        return Ok([0.0, 0.0, 612.0, 792.0]);
    };
    let values: Vec<f32> = resolve(doc, media_box)
        .as_array()?
        .iter()
        .filter_map(|o| number(resolve(doc, o)))
        .collect();
    if values.len() != 4 {
        return Err(Error::InvalidTemplate("malformed MediaBox".to_string()));
    }
    Ok([
        values[0].min(values[2]),
        values[1].min(values[3]),
        values[0].max(values[2]),
        values[1].max(values[3]),
    ])
}

/// Resources dictionary of a page, inherited through the page tree.
pub fn page_resources<'a>(doc: &'a Document, page_id: ObjectId) -> Option<&'a Dictionary> {
    let page = doc.get_object(page_id).ok()?.as_dict().ok()?;
    resolve(doc, inherited(doc, page, b"Resources")?).as_dict().ok()
}

/// Decoded content of a page (all content streams concatenated).
pub fn page_content(doc: &Document, page_id: ObjectId) -> Result<Vec<u8>> {
    let page = doc.get_object(page_id)?.as_dict()?;
    let Ok(contents) = page.get(b"Contents") else {
        return Ok(Vec::new());
    };

    let mut content = Vec::new();
    match resolve(doc, contents) {
        Object::Stream(stream) => content.extend(stream_data(stream)?),
        Object::Array(parts) => {
            for part in parts {
                if let Object::Stream(stream) = resolve(doc, part) {
                    content.extend(stream_data(stream)?);
                    content.push(b'\n');
                }
            }
        },
        _ => return Err(Error::InvalidTemplate("page has no content stream".to_string())),
    }
    Ok(content)
}

/// Text runs of one page, in content stream order.
pub fn page_text_runs(doc: &Document, page_id: ObjectId) -> Result<Vec<TextRun>> {
    let content = page_content(doc, page_id)?;
    let resources = page_resources(doc, page_id);
    let mut interpreter = Interpreter::new(doc);
    interpreter.run(&content, resources, Matrix::IDENTITY, 0)?;
    Ok(interpreter.runs)
}

pub(crate) fn stream_data(stream: &lopdf::Stream) -> Result<Vec<u8>> {
    if stream.dict.has(b"Filter") {
        Ok(stream.decompressed_content()?)
    } else {
        Ok(stream.content.clone())
    }
}

pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

pub(crate) fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn inherited<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let mut current = dict;
    for _ in 0..32 {
        if let Ok(value) = current.get(key) {
            return Some(value);
        }
        current = resolve(doc, current.get(b"Parent").ok()?).as_dict().ok()?;
    }
    None
}

fn dict_get<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().map(|o| resolve(doc, o))
}

/// Affine matrix `[a b c d e f]`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f32; 6]);

impl Matrix {
    const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn translation(tx: f32, ty: f32) -> Matrix {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    fn from_operands(operands: &[Object]) -> Option<Matrix> {
        if operands.len() < 6 {
            return None;
        }
        let mut m = [0.0; 6];
        for (slot, operand) in m.iter_mut().zip(operands) {
            *slot = number(operand)?;
        }
        Some(Matrix(m))
    }

    /// `self × other`
    fn multiply(&self, other: &Matrix) -> Matrix {
        let [a, b, c, d, e, f] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a * a2 + b * c2,
            a * b2 + b * d2,
            c * a2 + d * c2,
            c * b2 + d * d2,
            e * a2 + f * c2 + e2,
            e * b2 + f * d2 + f2,
        ])
    }

    fn horizontal_scale(&self) -> f32 {
        self.0[0].hypot(self.0[1])
    }

    fn vertical_scale(&self) -> f32 {
        self.0[2].hypot(self.0[3])
    }
}

/// Maps character codes of one font to text and widths.
#[derive(Debug, Default)]
struct FontDecoder {
    two_byte: bool,
    to_unicode: HashMap<u32, String>,
    widths: HashMap<u32, f32>,
    default_width: f32,
}

impl FontDecoder {
    fn from_dict(doc: &Document, font: &Dictionary) -> FontDecoder {
        let two_byte = font
            .get(b"Subtype")
            .and_then(Object::as_name)
            .map(|n| n == b"Type0")
            .unwrap_or(false);

        let to_unicode = match dict_get(doc, font, b"ToUnicode") {
            Some(Object::Stream(stream)) => stream_data(stream)
                .map(|data| parse_to_unicode(&data))
                .unwrap_or_default(),
            _ => HashMap::new(),
        };

        let mut decoder = FontDecoder {
            two_byte,
            to_unicode,
            widths: HashMap::new(),
            default_width: if two_byte { 1000.0 } else { 500.0 },
        };
        if two_byte {
            decoder.read_cid_widths(doc, font);
        } else {
            decoder.read_simple_widths(doc, font);
        }
        decoder
    }

    fn read_simple_widths(&mut self, doc: &Document, font: &Dictionary) {
        let first = dict_get(doc, font, b"FirstChar").and_then(number).unwrap_or(0.0) as u32;
        if let Some(Object::Array(widths)) = dict_get(doc, font, b"Widths") {
            for (i, w) in widths.iter().enumerate() {
                let Some(code) = first.checked_add(i as u32) else {
                    break;
                };
                if let Some(w) = number(resolve(doc, w)) {
                    self.widths.insert(code, w);
                }
            }
        }
    }

    fn read_cid_widths(&mut self, doc: &Document, font: &Dictionary) {
        let Some(Object::Array(descendants)) = dict_get(doc, font, b"DescendantFonts") else {
            return;
        };
        let Some(Ok(cid_font)) = descendants.first().map(|d| resolve(doc, d).as_dict()) else {
            return;
        };
        if let Some(dw) = dict_get(doc, cid_font, b"DW").and_then(number) {
            self.default_width = dw;
        }
        let Some(Object::Array(w)) = dict_get(doc, cid_font, b"W") else {
            return;
        };

        let mut i = 0;
        while i < w.len() {
            let Some(start) = number(resolve(doc, &w[i])) else {
                break;
            };
            let start = start as u32;
            match w.get(i + 1).map(|o| resolve(doc, o)) {
                Some(Object::Array(list)) => {
                    for (offset, width) in list.iter().enumerate() {
                        let Some(code) = start.checked_add(offset as u32) else {
                            break;
                        };
                        if let Some(width) = number(resolve(doc, width)) {
                            self.widths.insert(code, width);
                        }
                    }
                    i += 2;
                },
                Some(end) => {
                    let end = number(end).unwrap_or(0.0) as u32;
                    let width = w.get(i + 2).and_then(|o| number(resolve(doc, o)));
                    if let Some(width) = width {
                        for code in start..=end.min(start.saturating_add(0xFFFF)) {
                            self.widths.insert(code, width);
                        }
                    }
                    i += 3;
                },
                None => break,
            }
        }
    }

    /// Split a string operand into `(code, text)` pairs.
    fn decode(&self, bytes: &[u8]) -> Vec<(u32, String)> {
        let codes: Vec<u32> = if self.two_byte {
            bytes
                .chunks(2)
                .map(|c| c.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b)))
                .collect()
        } else {
            bytes.iter().map(|&b| u32::from(b)).collect()
        };

        codes
            .into_iter()
            .map(|code| {
                let text = match self.to_unicode.get(&code) {
                    Some(mapped) => mapped.clone(),
                    None if !self.two_byte => char::from_u32(code).map(String::from).unwrap_or_default(),
                    None => String::new(),
                };
                (code, text)
            })
            .collect()
    }

    fn width(&self, code: u32) -> f32 {
        self.widths.get(&code).copied().unwrap_or(self.default_width)
    }
}

/// Parse the `bfchar` and `bfrange` sections of a ToUnicode CMap.
fn parse_to_unicode(data: &[u8]) -> HashMap<u32, String> {
    #[derive(PartialEq)]
    enum Section {
        None,
        Char,
        Range,
    }

    let text = String::from_utf8_lossy(data);
    let mut map = HashMap::new();
    let mut section = Section::None;
    let mut pending: Vec<Vec<u8>> = Vec::new();
    let mut array: Option<Vec<Vec<u8>>> = None;

    for token in CMAP_TOKEN.find_iter(&text).map(|m| m.as_str()) {
        match token {
            "beginbfchar" => section = Section::Char,
            "beginbfrange" => section = Section::Range,
            "endbfchar" | "endbfrange" => {
                section = Section::None;
                pending.clear();
            },
            "[" => array = Some(Vec::new()),
            "]" => {
                if let (Some(values), Section::Range, [lo, hi]) = (array.take(), &section, pending.as_slice()) {
                    let (lo, hi) = (code_of(lo), code_of(hi));
                    for (offset, dst) in values.iter().enumerate() {
                        match lo.checked_add(offset as u32) {
                            Some(code) if code <= hi => {
                                map.insert(code, utf16_text(dst));
                            },
                            _ => break,
                        }
                    }
                }
                pending.clear();
            },
            hex => {
                let bytes = hex_bytes(hex);
                if let Some(values) = array.as_mut() {
                    values.push(bytes);
                    continue;
                }
                pending.push(bytes);
                match section {
                    Section::Char if pending.len() == 2 => {
                        map.insert(code_of(&pending[0]), utf16_text(&pending[1]));
                        pending.clear();
                    },
                    Section::Range if pending.len() == 3 => {
                        let (lo, hi) = (code_of(&pending[0]), code_of(&pending[1]));
                        let mut dst = pending[2].clone();
                        for code in lo..=hi.min(lo.saturating_add(0xFFFF)) {
                            map.insert(code, utf16_text(&dst));
                            increment_last(&mut dst);
                        }
                        pending.clear();
                    },
                    Section::None => pending.clear(),
                    _ => {},
                }
            },
        }
    }
    map
}

fn hex_bytes(token: &str) -> Vec<u8> {
    let digits: Vec<u8> = token
        .bytes()
        .filter(u8::is_ascii_hexdigit)
        .map(|b| match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            _ => b - b'A' + 10,
        })
        .collect();
    digits
        .chunks(2)
        .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
        .collect()
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
}

fn utf16_text(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks(2)
        .map(|c| (u16::from(c[0]) << 8) | u16::from(c.get(1).copied().unwrap_or(0)))
        .collect();
    String::from_utf16_lossy(&units)
}

fn increment_last(bytes: &mut [u8]) {
    for byte in bytes.iter_mut().rev() {
        let (next, overflow) = byte.overflowing_add(1);
        *byte = next;
        if !overflow {
            break;
        }
    }
}

#[derive(Debug, Clone, Default)]
struct TextState {
    font: Option<Rc<FontDecoder>>,
    size: f32,
    leading: f32,
    char_spacing: f32,
    word_spacing: f32,
}

struct Interpreter<'a> {
    doc: &'a Document,
    fonts: HashMap<ObjectId, Rc<FontDecoder>>,
    runs: Vec<TextRun>,
}

impl<'a> Interpreter<'a> {
    fn new(doc: &'a Document) -> Self {
        Self {
            doc,
            fonts: HashMap::new(),
            runs: Vec::new(),
        }
    }

    fn run(
        &mut self,
        content: &[u8],
        resources: Option<&'a Dictionary>,
        base: Matrix,
        depth: usize,
    ) -> Result<()> {
        let content = lopdf::content::Content::decode(content)?;

        let mut ctm = base;
        let mut stack: Vec<(Matrix, TextState)> = Vec::new();
        let mut state = TextState::default();
        let mut tm = Matrix::IDENTITY;
        let mut tlm = Matrix::IDENTITY;

        for op in &content.operations {
            let operands = op.operands.as_slice();
            match op.operator.as_str() {
                "q" => stack.push((ctm, state.clone())),
                "Q" => {
                    if let Some((saved_ctm, saved_state)) = stack.pop() {
                        ctm = saved_ctm;
                        state = saved_state;
                    }
                },
                "cm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        ctm = m.multiply(&ctm);
                    }
                },
                "BT" => {
                    tm = Matrix::IDENTITY;
                    tlm = Matrix::IDENTITY;
                },
                "Tf" => {
                    if let [Object::Name(name), size, ..] = operands {
                        state.font = self.font(resources, name);
                        state.size = number(size).unwrap_or(0.0);
                    }
                },
                "TL" => state.leading = operands.first().and_then(number).unwrap_or(0.0),
                "Tc" => state.char_spacing = operands.first().and_then(number).unwrap_or(0.0),
                "Tw" => state.word_spacing = operands.first().and_then(number).unwrap_or(0.0),
                "Tm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        tm = m;
                        tlm = m;
                    }
                },
                "Td" | "TD" => {
                    if let [tx, ty, ..] = operands {
                        let (tx, ty) = (number(tx).unwrap_or(0.0), number(ty).unwrap_or(0.0));
                        if op.operator == "TD" {
                            state.leading = -ty;
                        }
                        tlm = Matrix::translation(tx, ty).multiply(&tlm);
                        tm = tlm;
                    }
                },
                "T*" => {
                    tlm = Matrix::translation(0.0, -state.leading).multiply(&tlm);
                    tm = tlm;
                },
                "Tj" => {
                    if let Some(string @ Object::String(..)) = operands.first() {
                        self.show(std::slice::from_ref(string), &state, &mut tm, &ctm);
                    }
                },
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        self.show(items, &state, &mut tm, &ctm);
                    }
                },
                "'" | "\"" => {
                    if op.operator == "\"" {
                        state.word_spacing = operands.first().and_then(number).unwrap_or(0.0);
                        state.char_spacing = operands.get(1).and_then(number).unwrap_or(0.0);
                    }
                    tlm = Matrix::translation(0.0, -state.leading).multiply(&tlm);
                    tm = tlm;
                    if let Some(string @ Object::String(..)) = operands.last() {
                        self.show(std::slice::from_ref(string), &state, &mut tm, &ctm);
                    }
                },
                "Do" => {
                    if let Some(Object::Name(name)) = operands.first() {
                        self.paint_form(resources, name, ctm, depth)?;
                    }
                },
                _ => {},
            }
        }
        Ok(())
    }

    fn font(&mut self, resources: Option<&'a Dictionary>, name: &[u8]) -> Option<Rc<FontDecoder>> {
        let fonts = dict_get(self.doc, resources?, b"Font")?.as_dict().ok()?;
        let entry = fonts.get(name).ok()?;
        if let Object::Reference(id) = entry {
            if let Some(cached) = self.fonts.get(id) {
                return Some(Rc::clone(cached));
            }
            let decoder = Rc::new(FontDecoder::from_dict(self.doc, resolve(self.doc, entry).as_dict().ok()?));
            self.fonts.insert(*id, Rc::clone(&decoder));
            return Some(decoder);
        }
        Some(Rc::new(FontDecoder::from_dict(self.doc, entry.as_dict().ok()?)))
    }

    fn paint_form(
        &mut self,
        resources: Option<&'a Dictionary>,
        name: &[u8],
        ctm: Matrix,
        depth: usize,
    ) -> Result<()> {
        if depth >= MAX_FORM_DEPTH {
            return Ok(());
        }
        let Some(xobjects) = resources
            .and_then(|r| dict_get(self.doc, r, b"XObject"))
            .and_then(|x| x.as_dict().ok())
        else {
            return Ok(());
        };
        let Some(Object::Stream(form)) = dict_get(self.doc, xobjects, name) else {
            return Ok(());
        };
        let is_form = form
            .dict
            .get(b"Subtype")
            .and_then(Object::as_name)
            .map(|n| n == b"Form")
            .unwrap_or(false);
        if !is_form {
            return Ok(());
        }

        let matrix = dict_get(self.doc, &form.dict, b"Matrix")
            .and_then(|m| m.as_array().ok())
            .and_then(|m| Matrix::from_operands(m))
            .unwrap_or(Matrix::IDENTITY);
        let form_resources = dict_get(self.doc, &form.dict, b"Resources")
            .and_then(|r| r.as_dict().ok())
            .or(resources);
        let data = stream_data(form)?;
        self.run(&data, form_resources, matrix.multiply(&ctm), depth + 1)
    }

    /// Show strings and adjustments, advancing the text matrix.
    fn show(&mut self, items: &[Object], state: &TextState, tm: &mut Matrix, ctm: &Matrix) {
        let start = tm.multiply(ctm);
        let mut text = String::new();
        let mut advance = 0.0;

        for item in items {
            match item {
                Object::String(bytes, _) => {
                    let Some(font) = &state.font else {
                        text.push_str(&String::from_utf8_lossy(bytes));
                        continue;
                    };
                    for (code, decoded) in font.decode(bytes) {
                        let mut tx = font.width(code) / 1000.0 * state.size + state.char_spacing;
                        if decoded == " " {
                            tx += state.word_spacing;
                        }
                        advance += tx;
                        text.push_str(&decoded);
                    }
                },
                other => {
                    if let Some(adjustment) = number(other) {
                        advance -= adjustment / 1000.0 * state.size;
                        if adjustment < WORD_GAP && !text.is_empty() && !text.ends_with(' ') {
                            text.push(' ');
                        }
                    }
                },
            }
        }

        *tm = Matrix::translation(advance, 0.0).multiply(tm);

        if text.trim().is_empty() {
            return;
        }
        self.runs.push(TextRun {
            text,
            x: start.0[4],
            y: start.0[5],
            width: advance * start.horizontal_scale(),
            height: state.size * start.vertical_scale(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One-page PDF with `content` and a Helvetica font named F1.
    fn pdf_with_content(content: &str) -> Vec<u8> {
        use lopdf::{dictionary, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.as_bytes().to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 300.into(), 200.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn test_placeholder_position_and_size() {
        let pdf = pdf_with_content("BT /F1 14 Tf 50 200 Td ({{NAME}}) Tj ET");
        let scanned = scan_template(&pdf).unwrap();
        let name = &scanned.mappings["NAME"];
        assert_eq!((name.x, name.y, name.font_size), (50.0, 200.0, 14.0));
        assert_eq!((scanned.width, scanned.height), (300.0, 200.0));
    }

    #[test]
    fn test_zero_height_falls_back() {
        let runs = vec![TextRun {
            text: "Name: {{NAME}}".to_string(),
            x: 1.0,
            y: 2.0,
            width: 0.0,
            height: 0.0,
        }];
        let mappings = find_placeholders(&runs);
        assert_eq!(mappings["NAME"].font_size, DEFAULT_FONT_SIZE);
    }

    #[test]
    fn test_text_state_operators() {
        let pdf = pdf_with_content(
            "q 2 0 0 2 10 10 cm BT /F1 6 Tf 14 TL 5 100 Td ({{A}}) Tj T* ({{B}}) Tj ET Q \
             BT /F1 9 Tf 1 0 0 1 20 30 Tm [({{C)-50(}})] TJ ET",
        );
        let scanned = scan_template(&pdf).unwrap();
        let a = &scanned.mappings["A"];
        assert_eq!((a.x, a.y, a.font_size), (20.0, 210.0, 12.0));
        let b = &scanned.mappings["B"];
        assert_eq!((b.x, b.y), (20.0, 182.0));
        let c = &scanned.mappings["C"];
        assert_eq!((c.x, c.y, c.font_size), (20.0, 30.0, 9.0));
    }

    #[test]
    fn test_runs_advance_along_the_line() {
        let pdf = pdf_with_content("BT /F1 10 Tf 0 0 Td (ab) Tj (cd) Tj ET");
        let doc = load_document(&pdf).unwrap();
        let runs = page_text_runs(&doc, page_ids(&doc)[0]).unwrap();
        assert_eq!(runs.len(), 2);
        // no Widths array: 500 units per code
        assert_eq!(runs[0].width, 10.0);
        assert_eq!(runs[1].x, 10.0);
    }

    #[test]
    fn test_no_placeholders_is_not_an_error() {
        let pdf = pdf_with_content("BT /F1 12 Tf 10 10 Td (plain) Tj ET");
        let scanned = scan_template(&pdf).unwrap();
        assert!(scanned.mappings.is_empty());
    }

    #[test]
    fn test_garbage_is_invalid_template() {
        assert!(matches!(scan_template(b"%PDF-1.4 nonsense"), Err(Error::InvalidTemplate(_))));
    }

    #[test]
    fn test_to_unicode_cmap() {
        let cmap = b"2 beginbfchar <0003> <0020> <0010> <09A8> endbfchar \
                     1 beginbfrange <0020> <0022> <0041> endbfrange \
                     1 beginbfrange <0030> <0031> [<0995> <09BF>] endbfrange";
        let map = parse_to_unicode(cmap);
        assert_eq!(map[&0x03], " ");
        assert_eq!(map[&0x10], "ন");
        assert_eq!(map[&0x22], "C");
        assert_eq!(map[&0x31], "ি");
    }

    #[test]
    fn test_to_unicode_array_range_at_code_ceiling() {
        let cmap = b"1 beginbfrange <FFFFFFFF> <FFFFFFFF> [<0041> <0042>] endbfrange";
        let map = parse_to_unicode(cmap);
        assert_eq!(map.len(), 1);
        assert_eq!(map[&u32::MAX], "A");
    }

    #[test]
    fn test_widths_stop_at_code_ceiling() {
        use lopdf::dictionary;

        let doc = Document::with_version("1.5");
        let simple = dictionary! {
            "Subtype" => "Type1",
            "FirstChar" => 4_294_967_295i64,
            "Widths" => vec![500.into(), 600.into()],
        };
        let decoder = FontDecoder::from_dict(&doc, &simple);
        assert_eq!(decoder.widths.len(), 1);
        assert_eq!(decoder.width(u32::MAX), 500.0);

        let cid_font = dictionary! {
            "W" => vec![4_294_967_295i64.into(), vec![100.into(), 200.into()].into()],
        };
        let composite = dictionary! {
            "Subtype" => "Type0",
            "DescendantFonts" => vec![cid_font.into()],
        };
        let decoder = FontDecoder::from_dict(&doc, &composite);
        assert_eq!(decoder.widths.len(), 1);
        assert_eq!(decoder.width(u32::MAX), 100.0);
    }
}
