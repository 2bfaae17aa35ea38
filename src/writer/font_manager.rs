//! Fonts for slip text.
//!
//! Two kinds of font draw slip text:
//! - [`FontResource`] wraps caller-supplied TrueType/OpenType bytes. Text is
//!   shaped with `rustybuzz`, so Bengali conjuncts and vowel signs land on
//!   the right glyphs. The font is embedded as a Type 0 composite font
//!   (CIDFontType2, Identity-H) with a `W` array and a ToUnicode CMap.
//! - [`Helvetica`] is the built-in Latin font, used when no resource is
//!   supplied. Its text must be WinAnsi-representable.

use super::content_stream::{ContentStreamBuilder, ContentStreamOp, TextArrayItem};
use super::pdf_writer::PdfWriter;
use crate::compose::wrap::TextMeasure;
use crate::error::{Error, Result};
use crate::object::{Dict, Object, ObjectRef};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Advance widths of Helvetica for ASCII 0x20..=0x7E, in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p..~
];

/// Width used for Latin-1 characters outside the ASCII table.
const HELVETICA_DEFAULT_WIDTH: u16 = 556;

/// The built-in Helvetica font.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Helvetica;

impl Helvetica {
    /// PostScript name.
    pub const BASE_FONT: &'static str = "Helvetica";

    /// Advance of one character in 1/1000 em.
    pub fn char_width(ch: char) -> u16 {
        match ch as u32 {
            code @ 0x20..=0x7E => HELVETICA_WIDTHS[(code - 0x20) as usize],
            _ => HELVETICA_DEFAULT_WIDTH,
        }
    }

    /// WinAnsi bytes for `text`. Characters outside Latin-1 become `?`.
    pub fn encode(text: &str) -> Vec<u8> {
        text.chars()
            .map(|c| match c as u32 {
                code @ (0x20..=0x7E | 0xA0..=0xFF) => code as u8,
                _ => b'?',
            })
            .collect()
    }
}

impl TextMeasure for Helvetica {
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| u32::from(Helvetica::char_width(c))).sum();
        units as f32 * font_size / 1000.0
    }
}

/// One positioned glyph produced by shaping, in 1/1000 em.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedGlyph {
    /// Glyph id in the font
    pub gid: u16,
    /// Byte offset of the source cluster
    pub cluster: usize,
    /// Shaped horizontal advance
    pub advance: f32,
    /// Horizontal placement offset
    pub x_offset: f32,
    /// Vertical placement offset
    pub y_offset: f32,
}

/// Metrics read once when a font is loaded, in 1/1000 em.
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    /// PostScript name (sanitized for use as a PDF name)
    pub name: String,
    /// Font design units per em
    pub units_per_em: u16,
    /// Ascender
    pub ascender: i32,
    /// Descender (negative)
    pub descender: i32,
    /// Cap height
    pub cap_height: i32,
    /// Font bounding box (llx, lly, urx, ury)
    pub bbox: (i32, i32, i32, i32),
}

/// A caller-supplied TrueType/OpenType font.
///
/// Cloning is cheap; the bytes and the advance table are shared.
#[derive(Debug, Clone)]
pub struct FontResource {
    data: Arc<Vec<u8>>,
    metrics: FontMetrics,
    advances: Arc<Vec<u16>>,
}

impl FontResource {
    /// Parse font bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::Font("font data is empty".to_string()));
        }
        let face = ttf_parser::Face::parse(&data, 0)
            .map_err(|e| Error::Font(format!("failed to parse font: {}", e)))?;
        if rustybuzz::Face::from_slice(&data, 0).is_none() {
            return Err(Error::Font("font cannot be shaped".to_string()));
        }

        let upem = face.units_per_em().max(1);
        let scale = |v: i16| i32::from(v) * 1000 / i32::from(upem);
        let name = face
            .names()
            .into_iter()
            .find(|n| n.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
            .and_then(|n| n.to_string())
            .map(|n| sanitize_name(&n))
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "EmbeddedFont".to_string());
        let bbox = face.global_bounding_box();
        let advances: Vec<u16> = (0..face.number_of_glyphs())
            .map(|gid| {
                let advance = face.glyph_hor_advance(ttf_parser::GlyphId(gid)).unwrap_or(0);
                (u32::from(advance) * 1000 / u32::from(upem)) as u16
            })
            .collect();

        let metrics = FontMetrics {
            name,
            units_per_em: upem,
            ascender: scale(face.ascender()),
            descender: scale(face.descender()),
            cap_height: scale(face.capital_height().unwrap_or(face.ascender())),
            bbox: (scale(bbox.x_min), scale(bbox.y_min), scale(bbox.x_max), scale(bbox.y_max)),
        };
        log::debug!("Loaded font {} ({} bytes, {} glyphs)", metrics.name, data.len(), advances.len());

        Ok(Self {
            data: Arc::new(data),
            metrics,
            advances: Arc::new(advances),
        })
    }

    /// Read and parse a font file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Self::from_bytes(std::fs::read(path)?)
    }

    /// Font metrics.
    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    /// Raw font program.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Nominal advance of a glyph in 1/1000 em, as written to the `W` array.
    pub fn glyph_width(&self, gid: u16) -> u16 {
        self.advances.get(usize::from(gid)).copied().unwrap_or(0)
    }

    /// Parse the face for shaping. Keep the shaper for a whole pass.
    pub fn shaper(&self) -> Result<Shaper<'_>> {
        let face = rustybuzz::Face::from_slice(&self.data, 0)
            .ok_or_else(|| Error::Font(format!("font {} cannot be shaped", self.metrics.name)))?;
        Ok(Shaper { face, font: self })
    }
}

/// A [`FontResource`] face parsed once for shaping.
pub struct Shaper<'a> {
    face: rustybuzz::Face<'a>,
    font: &'a FontResource,
}

impl std::fmt::Debug for Shaper<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shaper").field("font", &self.font.metrics.name).finish()
    }
}

impl<'a> Shaper<'a> {
    /// The font being shaped.
    pub fn font(&self) -> &'a FontResource {
        self.font
    }

    /// Shape `text` into positioned glyphs.
    pub fn shape(&self, text: &str) -> Vec<ShapedGlyph> {
        let mut buffer = rustybuzz::UnicodeBuffer::new();
        buffer.push_str(text);
        buffer.guess_segment_properties();
        let output = rustybuzz::shape(&self.face, &[], buffer);

        let to_milli = 1000.0 / f32::from(self.font.metrics.units_per_em);
        output
            .glyph_infos()
            .iter()
            .zip(output.glyph_positions())
            .map(|(info, pos)| ShapedGlyph {
                gid: info.glyph_id as u16,
                cluster: info.cluster as usize,
                advance: pos.x_advance as f32 * to_milli,
                x_offset: pos.x_offset as f32 * to_milli,
                y_offset: pos.y_offset as f32 * to_milli,
            })
            .collect()
    }
}

impl TextMeasure for Shaper<'_> {
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        let units: f32 = self.shape(text).iter().map(|g| g.advance).sum();
        units * font_size / 1000.0
    }
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect()
}

/// A contiguous run of glyphs drawn at one text rise.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRun {
    /// Text rise in points
    pub rise: f32,
    /// TJ array for this run
    pub items: Vec<TextArrayItem>,
}

/// An embedded font being used by one output document.
///
/// Tracks every glyph drawn and the text it stands for, which become the
/// `W` array and ToUnicode CMap.
#[derive(Debug)]
pub struct EmbeddedFont<'a> {
    shaper: Shaper<'a>,
    used: BTreeMap<u16, Option<String>>,
}

impl<'a> EmbeddedFont<'a> {
    /// Start tracking glyph use for `font`.
    pub fn new(font: &'a FontResource) -> Result<Self> {
        Ok(Self {
            shaper: font.shaper()?,
            used: BTreeMap::new(),
        })
    }

    /// Number of distinct glyphs drawn.
    pub fn glyph_count(&self) -> usize {
        self.used.len()
    }

    /// Shape and encode `text` into TJ runs at `font_size`.
    pub fn encode(&mut self, text: &str, font_size: f32) -> Vec<GlyphRun> {
        let glyphs = self.shaper.shape(text);

        let mut starts: Vec<usize> = glyphs.iter().map(|g| g.cluster).collect();
        starts.sort_unstable();
        starts.dedup();
        let cluster_text = |start: usize| -> Option<String> {
            let end = starts
                .iter()
                .copied()
                .find(|&s| s > start)
                .unwrap_or(text.len());
            text.get(start..end).map(str::to_string)
        };

        let mut runs: Vec<GlyphRun> = Vec::new();
        let mut seen_clusters = std::collections::HashSet::new();
        for glyph in &glyphs {
            let unicode = if seen_clusters.insert(glyph.cluster) {
                cluster_text(glyph.cluster)
            } else {
                None
            };
            self.used.entry(glyph.gid).or_insert(unicode);

            let rise = glyph.y_offset * font_size / 1000.0;
            if runs.last().map_or(true, |r| (r.rise - rise).abs() > f32::EPSILON) {
                runs.push(GlyphRun {
                    rise,
                    items: Vec::new(),
                });
            }
            let Some(run) = runs.last_mut() else {
                continue;
            };

            let width = f32::from(self.shaper.font().glyph_width(glyph.gid));
            push_adjustment(&mut run.items, -glyph.x_offset);
            push_glyph(&mut run.items, glyph.gid);
            push_adjustment(&mut run.items, -(glyph.advance - width - glyph.x_offset));
        }
        runs
    }

    /// Write the font objects, storing the Type 0 font under `id`.
    pub fn write(&self, writer: &mut PdfWriter, id: ObjectRef) {
        let font = self.shaper.font();
        let metrics = font.metrics();

        let mut file_dict = Dict::new();
        file_dict.insert("Length1".to_string(), Object::Integer(font.data().len() as i64));
        let font_file = writer.add_stream(file_dict, font.data().to_vec());

        let (llx, lly, urx, ury) = metrics.bbox;
        let descriptor = writer.add_object(Object::dict([
            ("Type", Object::name("FontDescriptor")),
            ("FontName", Object::name(metrics.name.clone())),
            ("Flags", Object::Integer(4)),
            (
                "FontBBox",
                Object::Array(
                    [llx, lly, urx, ury]
                        .iter()
                        .map(|v| Object::Integer(i64::from(*v)))
                        .collect(),
                ),
            ),
            ("ItalicAngle", Object::Integer(0)),
            ("Ascent", Object::Integer(i64::from(metrics.ascender))),
            ("Descent", Object::Integer(i64::from(metrics.descender))),
            ("CapHeight", Object::Integer(i64::from(metrics.cap_height))),
            ("StemV", Object::Integer(80)),
            ("FontFile2", Object::Reference(font_file)),
        ]));

        let cid_font = writer.add_object(Object::dict([
            ("Type", Object::name("Font")),
            ("Subtype", Object::name("CIDFontType2")),
            ("BaseFont", Object::name(metrics.name.clone())),
            (
                "CIDSystemInfo",
                Object::dict([
                    ("Registry", Object::String(b"Adobe".to_vec())),
                    ("Ordering", Object::String(b"Identity".to_vec())),
                    ("Supplement", Object::Integer(0)),
                ]),
            ),
            ("FontDescriptor", Object::Reference(descriptor)),
            ("DW", Object::Integer(1000)),
            ("W", self.widths_array()),
            ("CIDToGIDMap", Object::name("Identity")),
        ]));

        let to_unicode = writer.add_stream(Dict::new(), self.to_unicode_cmap().into_bytes());

        writer.set_object(
            id,
            Object::dict([
                ("Type", Object::name("Font")),
                ("Subtype", Object::name("Type0")),
                ("BaseFont", Object::name(metrics.name.clone())),
                ("Encoding", Object::name("Identity-H")),
                ("DescendantFonts", Object::Array(vec![Object::Reference(cid_font)])),
                ("ToUnicode", Object::Reference(to_unicode)),
            ]),
        );
    }

    /// `W` array grouping consecutive glyph ids.
    pub fn widths_array(&self) -> Object {
        let font = self.shaper.font();
        let mut out = Vec::new();
        let mut group: Option<(u16, Vec<Object>)> = None;
        let mut last_gid: Option<u16> = None;

        for &gid in self.used.keys() {
            let width = Object::Integer(i64::from(font.glyph_width(gid)));
            match (&mut group, last_gid) {
                (Some((_, widths)), Some(prev)) if prev.checked_add(1) == Some(gid) => {
                    widths.push(width)
                },
                _ => {
                    if let Some((start, widths)) = group.take() {
                        out.push(Object::Integer(i64::from(start)));
                        out.push(Object::Array(widths));
                    }
                    group = Some((gid, vec![width]));
                },
            }
            last_gid = Some(gid);
        }
        if let Some((start, widths)) = group {
            out.push(Object::Integer(i64::from(start)));
            out.push(Object::Array(widths));
        }
        Object::Array(out)
    }

    /// ToUnicode CMap mapping each glyph to the text of its cluster.
    pub fn to_unicode_cmap(&self) -> String {
        let mut cmap = String::from(
            "/CIDInit /ProcSet findresource begin\n\
             12 dict begin\n\
             begincmap\n\
             /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
             /CMapName /Adobe-Identity-UCS def\n\
             /CMapType 2 def\n\
             1 begincodespacerange\n\
             <0000> <FFFF>\n\
             endcodespacerange\n",
        );

        let mappings: Vec<(u16, &str)> = self
            .used
            .iter()
            .filter_map(|(gid, text)| text.as_deref().map(|t| (*gid, t)))
            .filter(|(_, t)| !t.is_empty())
            .collect();

        // at most 100 entries per bfchar block
        for chunk in mappings.chunks(100) {
            cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
            for (gid, text) in chunk {
                let utf16: String = text.encode_utf16().map(|u| format!("{:04X}", u)).collect();
                cmap.push_str(&format!("<{:04X}> <{}>\n", gid, utf16));
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
        cmap
    }
}

fn push_adjustment(items: &mut Vec<TextArrayItem>, amount: f32) {
    if amount.abs() < 0.01 {
        return;
    }
    if let Some(TextArrayItem::Adjustment(prev)) = items.last_mut() {
        *prev += amount;
        return;
    }
    items.push(TextArrayItem::Adjustment(amount));
}

fn push_glyph(items: &mut Vec<TextArrayItem>, gid: u16) {
    if let Some(TextArrayItem::HexText(bytes)) = items.last_mut() {
        bytes.extend_from_slice(&gid.to_be_bytes());
        return;
    }
    items.push(TextArrayItem::HexText(gid.to_be_bytes().to_vec()));
}

/// The font slip text is drawn with in one output document.
#[derive(Debug)]
pub enum OutputFont<'a> {
    /// Built-in Helvetica
    Builtin,
    /// Embedded caller font
    Embedded(EmbeddedFont<'a>),
}

impl<'a> OutputFont<'a> {
    /// Pick the embedded font when one is supplied.
    pub fn new(font: Option<&'a FontResource>) -> Result<Self> {
        Ok(match font {
            Some(f) => OutputFont::Embedded(EmbeddedFont::new(f)?),
            None => OutputFont::Builtin,
        })
    }

    /// Whether text can go beyond Latin-1.
    pub fn is_embedded(&self) -> bool {
        matches!(self, OutputFont::Embedded(_))
    }

    /// Draw one line of text with its baseline origin at `(x, y)`.
    ///
    /// Must be called inside a text object with this font selected.
    pub fn show_text(
        &mut self,
        builder: &mut ContentStreamBuilder,
        text: &str,
        x: f32,
        y: f32,
        font_size: f32,
    ) {
        builder.text_position(x, y);
        match self {
            OutputFont::Builtin => {
                builder.op(ContentStreamOp::ShowText(Helvetica::encode(text)));
            },
            OutputFont::Embedded(font) => {
                let runs = font.encode(text, font_size);
                let mut raised = false;
                for run in runs {
                    if run.items.is_empty() {
                        continue;
                    }
                    if run.rise != 0.0 || raised {
                        builder.text_rise(run.rise);
                        raised = run.rise != 0.0;
                    }
                    builder.text_array(run.items);
                }
                if raised {
                    builder.text_rise(0.0);
                }
            },
        }
    }

    /// Write the font dictionary (and embedded program) under `id`,
    /// which the pages and forms drawing with this font already reference.
    pub fn write(&self, writer: &mut PdfWriter, id: ObjectRef) {
        match self {
            OutputFont::Builtin => writer.set_object(
                id,
                Object::dict([
                    ("Type", Object::name("Font")),
                    ("Subtype", Object::name("Type1")),
                    ("BaseFont", Object::name(Helvetica::BASE_FONT)),
                    ("Encoding", Object::name("WinAnsiEncoding")),
                ]),
            ),
            OutputFont::Embedded(font) => font.write(writer, id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helvetica_widths() {
        assert_eq!(Helvetica::char_width(' '), 278);
        assert_eq!(Helvetica::char_width('A'), 667);
        assert_eq!(Helvetica::char_width('~'), 584);
        assert_eq!(Helvetica::char_width('é'), HELVETICA_DEFAULT_WIDTH);
        let w = Helvetica.text_width("AA", 10.0);
        assert!((w - 13.34).abs() < 1e-3);
    }

    #[test]
    fn test_helvetica_encoding() {
        assert_eq!(Helvetica::encode("Café"), vec![b'C', b'a', b'f', 0xE9]);
        assert_eq!(Helvetica::encode("ভ"), vec![b'?']);
    }

    #[test]
    fn test_invalid_font_bytes() {
        assert!(matches!(FontResource::from_bytes(Vec::new()), Err(Error::Font(_))));
        assert!(matches!(
            FontResource::from_bytes(b"not a font".to_vec()),
            Err(Error::Font(_))
        ));
    }

    #[test]
    fn test_adjustments_merge() {
        let mut items = Vec::new();
        push_adjustment(&mut items, -10.0);
        push_adjustment(&mut items, -5.0);
        push_glyph(&mut items, 0x0102);
        push_glyph(&mut items, 0x0003);
        push_adjustment(&mut items, 0.0);
        assert_eq!(
            items,
            vec![
                TextArrayItem::Adjustment(-15.0),
                TextArrayItem::HexText(vec![0x01, 0x02, 0x00, 0x03]),
            ]
        );
    }

    #[test]
    fn test_builtin_output_font() {
        let mut font = OutputFont::new(None).unwrap();
        let mut builder = ContentStreamBuilder::new();
        builder.begin_text().set_font("F1", 9.0);
        font.show_text(&mut builder, "X School", 10.0, 20.0, 9.0);
        builder.end_text();
        let out = String::from_utf8(builder.build()).unwrap();
        assert!(out.contains("1 0 0 1 10 20 Tm\n(X School) Tj"));

        let mut writer = PdfWriter::new();
        let font_ref = writer.reserve_id();
        font.write(&mut writer, font_ref);
        assert_eq!(font_ref.id, 3);
        let pdf = String::from_utf8_lossy(&writer.finish().unwrap()).into_owned();
        assert!(pdf.contains("3 0 obj\n<</BaseFont /Helvetica"));
    }

    fn system_font() -> Option<FontResource> {
        let path = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";
        std::path::Path::new(path).exists().then(|| FontResource::from_file(path).unwrap())
    }

    #[test]
    fn test_advance_table_matches_face() {
        let Some(font) = system_font() else {
            eprintln!("skipping: DejaVuSans not installed");
            return;
        };
        let face = ttf_parser::Face::parse(font.data(), 0).unwrap();
        let upem = u32::from(face.units_per_em());
        let gid = face.glyph_index('A').unwrap();
        let expected = u32::from(face.glyph_hor_advance(gid).unwrap()) * 1000 / upem;
        assert_eq!(u32::from(font.glyph_width(gid.0)), expected);
        assert_eq!(font.glyph_width(u16::MAX), 0);
    }

    #[test]
    fn test_one_shaper_serves_many_lines() {
        let Some(font) = system_font() else {
            eprintln!("skipping: DejaVuSans not installed");
            return;
        };
        let mut embedded = EmbeddedFont::new(&font).unwrap();
        assert!(!embedded.encode("Abdur Rahim", 10.0).is_empty());
        assert!(!embedded.encode("Rahela Begum", 10.0).is_empty());
        let count = embedded.glyph_count();
        // every glyph of "Abdur" is already known
        embedded.encode("Abdur", 10.0);
        assert_eq!(embedded.glyph_count(), count);

        let shaper = font.shaper().unwrap();
        let width = shaper.text_width("AA", 10.0);
        assert!((width - 2.0 * f32::from(font.glyph_width(shaper.shape("A")[0].gid)) / 100.0).abs() < 0.05);
    }
}
