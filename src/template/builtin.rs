//! The built-in slip design.
//!
//! A 260 x 210 pt card: bordered box, tinted header bar with a title,
//! a rule under the header, then one label/value row per field. Each value
//! slot is registered under a well-known key so records substitute into the
//! built-in design exactly as into a custom `{{KEY}}` template.

use super::PlaceholderMapping;
use crate::error::Result;
use crate::writer::{ContentStreamBuilder, FontResource, OutputFont, PdfWriter, PdfWriterConfig, Resources};
use indexmap::IndexMap;

/// Canvas width in points.
pub const BUILTIN_WIDTH: f32 = 260.0;

/// Canvas height in points.
pub const BUILTIN_HEIGHT: f32 = 210.0;

/// Keys every built-in slip exposes.
pub const BUILTIN_KEYS: [&str; 10] = [
    "SERIAL",
    "NAME",
    "NO",
    "FATHER",
    "MOTHER",
    "DOB",
    "PROFESSION",
    "ADDRESS",
    "VOTE_CENTER",
    "VOTER_AREA",
];

const MARGIN: f32 = 5.0;
const TITLE: &str = "VOTER SLIP";

/// Value slots: key, x, y, font size.
const SLOTS: [(&str, f32, f32, f32); 10] = [
    ("VOTE_CENTER", 72.0, 158.0, 9.0),
    ("VOTER_AREA", 72.0, 144.0, 9.0),
    ("SERIAL", 44.0, 117.0, 9.0),
    ("NAME", 87.0, 117.0, 10.0),
    ("NO", 60.0, 103.0, 9.0),
    ("FATHER", 39.0, 89.0, 9.0),
    ("MOTHER", 39.0, 75.0, 9.0),
    ("PROFESSION", 39.0, 61.0, 8.0),
    ("DOB", 190.0, 61.0, 8.0),
    ("ADDRESS", 47.0, 47.0, 8.0),
];

struct Label {
    bengali: &'static str,
    english: &'static str,
    x: f32,
    y: f32,
    size: f32,
    english_size: f32,
}

const LABELS: [Label; 10] = [
    Label { bengali: "ভোট কেন্দ্র:", english: "Center:", x: 12.0, y: 158.0, size: 9.0, english_size: 9.0 },
    Label { bengali: "ভোটার এলাকা:", english: "Area:", x: 12.0, y: 144.0, size: 9.0, english_size: 9.0 },
    Label { bengali: "ক্রমিক:", english: "Serial:", x: 12.0, y: 117.0, size: 8.0, english_size: 7.0 },
    Label { bengali: "নাম:", english: "Name", x: 67.0, y: 117.0, size: 8.0, english_size: 7.0 },
    Label { bengali: "ভোটার নং:", english: "Voter No:", x: 12.0, y: 103.0, size: 8.0, english_size: 7.0 },
    Label { bengali: "পিতা:", english: "Father:", x: 12.0, y: 89.0, size: 8.0, english_size: 7.0 },
    Label { bengali: "মাতা:", english: "Mother:", x: 12.0, y: 75.0, size: 8.0, english_size: 7.0 },
    Label { bengali: "পেশা:", english: "Job:", x: 12.0, y: 61.0, size: 8.0, english_size: 7.0 },
    Label { bengali: "জন্ম তারিখ:", english: "Birth:", x: 140.0, y: 61.0, size: 8.0, english_size: 7.0 },
    Label { bengali: "ঠিকানা:", english: "Addr:", x: 12.0, y: 47.0, size: 8.0, english_size: 7.0 },
];

/// The canonical value slots, top to bottom.
pub fn mappings() -> IndexMap<String, PlaceholderMapping> {
    SLOTS
        .iter()
        .map(|&(key, x, y, size)| (key.to_string(), PlaceholderMapping::new(key, x, y, size)))
        .collect()
}

/// Draw the static part of the design: frame, header, title and labels.
///
/// `font` must be selectable as `font_resource`. Labels are Bengali when it
/// is an embedded font.
pub fn draw(content: &mut ContentStreamBuilder, font: &mut OutputFont, font_resource: &str) {
    let bengali = font.is_embedded();

    content
        .set_line_width(1.0)
        .set_stroke_gray(0.0)
        .rect(MARGIN, MARGIN, BUILTIN_WIDTH - 2.0 * MARGIN, BUILTIN_HEIGHT - 2.0 * MARGIN)
        .stroke()
        .set_fill_color(0.95, 0.95, 0.98)
        .rect(MARGIN, BUILTIN_HEIGHT - 35.0, BUILTIN_WIDTH - 2.0 * MARGIN, 25.0)
        .fill()
        .set_stroke_gray(0.7)
        .line(MARGIN + 5.0, BUILTIN_HEIGHT - 38.0, BUILTIN_WIDTH - MARGIN - 5.0, BUILTIN_HEIGHT - 38.0)
        .set_line_width(0.5)
        .set_stroke_gray(0.8)
        .line(12.0, 127.0, BUILTIN_WIDTH - 12.0, 127.0);

    content.begin_text().set_fill_gray(0.0).set_font(font_resource, 12.0);
    font.show_text(content, TITLE, BUILTIN_WIDTH / 2.0 - 35.0, BUILTIN_HEIGHT - 20.0, 12.0);

    content.set_fill_gray(0.3);
    for label in &LABELS {
        let (text, size) = if bengali {
            (label.bengali, label.size)
        } else {
            (label.english, label.english_size)
        };
        content.set_font(font_resource, size);
        font.show_text(content, text, label.x, label.y, size);
    }
    content.end_text();
}

/// Draw the design into a standalone one-page PDF.
pub fn render(font: Option<&FontResource>) -> Result<Vec<u8>> {
    let mut writer = PdfWriter::with_config(PdfWriterConfig::default().with_title("Default Template"));
    let mut output_font = OutputFont::new(font)?;
    let font_ref = writer.reserve_id();

    let mut content = ContentStreamBuilder::new();
    draw(&mut content, &mut output_font, "F1");

    output_font.write(&mut writer, font_ref);
    let mut resources = Resources::new();
    resources.add_font("F1", font_ref);
    writer.add_page(BUILTIN_WIDTH, BUILTIN_HEIGHT, content.build(), resources);

    let bytes = writer.finish()?;
    log::debug!("rendered built-in template ({} bytes, bengali labels: {})", bytes.len(), font.is_some());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_keys_are_mapped() {
        let mappings = mappings();
        assert_eq!(mappings.len(), BUILTIN_KEYS.len());
        for key in BUILTIN_KEYS {
            assert!(mappings.contains_key(key), "missing {}", key);
        }
        let name = &mappings["NAME"];
        assert_eq!((name.x, name.y, name.font_size), (87.0, 117.0, 10.0));
        let dob = &mappings["DOB"];
        assert_eq!((dob.x, dob.y, dob.font_size), (190.0, 61.0, 8.0));
    }

    #[test]
    fn test_slots_inside_card() {
        for (_, x, y, size) in SLOTS {
            assert!(x > MARGIN && x < BUILTIN_WIDTH - MARGIN);
            assert!(y > MARGIN && y + size < BUILTIN_HEIGHT - 35.0);
        }
    }

    #[test]
    fn test_render_without_font_reads_back() {
        let bytes = render(None).unwrap();
        let doc = crate::template::scanner::load_document(&bytes).unwrap();
        let page = crate::template::scanner::page_ids(&doc)[0];
        let runs = crate::template::scanner::page_text_runs(&doc, page).unwrap();
        assert!(runs.iter().any(|r| r.text == TITLE));
        assert!(runs.iter().any(|r| r.text == "Voter No:"));
        assert_eq!(
            crate::template::scanner::page_box(&doc, page).unwrap(),
            [0.0, 0.0, BUILTIN_WIDTH, BUILTIN_HEIGHT]
        );
    }
}
