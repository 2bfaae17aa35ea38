//! Composition engine: records in, multi-page slip document out.
//!
//! Composition runs in two steps. [`plan`] is pure geometry: it assigns
//! records to grid cells, resolves every placeholder against the record and
//! wraps the resolved text. [`compose`] renders a plan with the writer,
//! drawing the template background once per slip and the text on top.
//!
//! The literal `{{KEY}}` text of a custom template is not erased; resolved
//! values are drawn over the background.

use super::grid::{GridLayout, LayoutCell};
use super::substitution::{ResolutionPolicy, SemanticMap};
use super::wrap::{wrap_text, TextMeasure};
use crate::config::CompositionConfig;
use crate::error::{Error, Result};
use crate::extractors::script::needs_unicode_font;
use crate::geometry::Rect;
use crate::model::{GlobalInfo, VoterRecord};
use crate::template::{import_template, PlaceholderMapping, SharedFont, TemplateDescriptor};
use crate::writer::{ContentStreamBuilder, FontResource, Helvetica, OutputFont, PdfWriter, PdfWriterConfig, Resources};
use serde::Serialize;

/// Mappings closer than this vertically share a baseline.
const BASELINE_TOLERANCE: f32 = 2.0;

const FONT_RESOURCE: &str = "F1";
const TEMPLATE_RESOURCE: &str = "Tpl";

/// One wrapped line in page space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLine {
    /// Line text
    pub text: String,
    /// Baseline origin x
    pub x: f32,
    /// Baseline origin y
    pub y: f32,
    /// Measured width
    pub width: f32,
}

/// A resolved field drawn at one placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextPlacement {
    /// Placeholder key as authored
    pub key: String,
    /// Wrapped lines, top first
    pub lines: Vec<TextLine>,
    /// Scaled font size
    pub font_size: f32,
    /// Scaled width available to the field
    pub max_width: f32,
}

impl TextPlacement {
    /// Box covering every line, from baseline to one em above it.
    pub fn bounds(&self) -> Rect {
        self.lines
            .iter()
            .map(|line| Rect::new(line.x, line.y, line.width, self.font_size))
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default()
    }
}

/// One slip: a record placed into a cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlipPlan {
    /// Index into the input records
    pub record_index: usize,
    /// Cell the slip occupies
    pub cell: LayoutCell,
    /// Template-to-page scale
    pub scale: f32,
    /// Fields that resolved to non-empty text
    pub placements: Vec<TextPlacement>,
}

/// The slips of one output page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagePlan {
    /// Zero-based page number
    pub index: usize,
    /// Slips in slot order
    pub slips: Vec<SlipPlan>,
}

/// Geometry of a whole run, before any bytes are written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositionPlan {
    /// Grid every page uses
    pub grid: GridLayout,
    /// Pages in order
    pub pages: Vec<PagePlan>,
}

impl CompositionPlan {
    /// Total number of slips.
    pub fn slip_count(&self) -> usize {
        self.pages.iter().map(|p| p.slips.len()).sum()
    }
}

/// Lay out `records` and resolve their fields.
///
/// Fails with [`Error::NoRecords`] on empty input and with
/// [`Error::ResourceMissing`] when text outside Latin-1 must be drawn
/// without a font.
pub fn plan(
    records: &[VoterRecord],
    descriptor: &TemplateDescriptor,
    font: Option<&FontResource>,
    config: &CompositionConfig,
    info: &GlobalInfo,
) -> Result<CompositionPlan> {
    if records.is_empty() {
        return Err(Error::NoRecords);
    }
    if font.is_none() && requires_font(records, info) {
        return Err(Error::ResourceMissing(
            "records contain non-Latin text; supply a Unicode font".to_string(),
        ));
    }

    let grid = GridLayout::new(
        config.page_size,
        config.aspect_ratio,
        (descriptor.canvas_width(), descriptor.canvas_height()),
        config.outer_margin,
        config.min_gap,
    );
    let shaper = font.map(FontResource::shaper).transpose()?;
    let measure: &dyn TextMeasure = match &shaper {
        Some(s) => s,
        None => &Helvetica,
    };
    let field_widths: Vec<(&PlaceholderMapping, f32)> = descriptor
        .mappings()
        .values()
        .map(|m| (m, field_width(m, descriptor, config)))
        .collect();

    let mut pages: Vec<PagePlan> = Vec::with_capacity(grid.page_count(records.len()));
    for (index, record) in records.iter().enumerate() {
        let cell = grid.cell(index);
        if pages.last().map_or(true, |p| p.index != cell.page) {
            pages.push(PagePlan {
                index: cell.page,
                slips: Vec::new(),
            });
        }

        let map = SemanticMap::new(record, info);
        let placements = field_widths
            .iter()
            .filter_map(|(mapping, width)| {
                let text = ResolutionPolicy.value(&mapping.key, &map)?;
                place(text, mapping, *width, &cell, grid.scale(), measure, config)
            })
            .collect();

        if let Some(page) = pages.last_mut() {
            page.slips.push(SlipPlan {
                record_index: index,
                cell,
                scale: grid.scale(),
                placements,
            });
        }
    }

    Ok(CompositionPlan { grid, pages })
}

/// Plan and render `records` into a finished document.
pub fn compose(
    records: &[VoterRecord],
    descriptor: &TemplateDescriptor,
    font: Option<&FontResource>,
    config: &CompositionConfig,
    info: &GlobalInfo,
) -> Result<Vec<u8>> {
    let plan = plan(records, descriptor, font, config, info)?;
    render(&plan, descriptor, font, config)
}

/// Write a plan with `descriptor` as the slip background.
pub fn render(
    plan: &CompositionPlan,
    descriptor: &TemplateDescriptor,
    font: Option<&FontResource>,
    config: &CompositionConfig,
) -> Result<Vec<u8>> {
    let mut writer_config = PdfWriterConfig::default().with_compress(config.compress);
    if let Some(title) = &config.title {
        writer_config = writer_config.with_title(title.clone());
    }
    if let Some(author) = &config.author {
        writer_config = writer_config.with_author(author.clone());
    }
    let mut writer = PdfWriter::with_config(writer_config);

    let mut output_font = OutputFont::new(font)?;
    let font_ref = writer.reserve_id();
    let shared = SharedFont {
        font: &mut output_font,
        id: font_ref,
        resource: FONT_RESOURCE,
    };
    let background = import_template(descriptor, &mut writer, shared)?;

    let mut contents = Vec::with_capacity(plan.pages.len());
    for page in &plan.pages {
        let mut content = ContentStreamBuilder::new();
        for slip in &page.slips {
            let cell = &slip.cell;
            if background.is_some() {
                content.draw_xobject(TEMPLATE_RESOURCE, cell.x, cell.y, slip.scale, slip.scale);
            } else {
                content
                    .set_fill_gray(config.fallback_fill)
                    .rounded_rect(cell.x, cell.y, cell.width, cell.height, config.corner_radius)
                    .fill();
            }
        }

        let has_text = page.slips.iter().any(|s| !s.placements.is_empty());
        if has_text {
            content.begin_text().set_fill_gray(0.0);
            for placement in page.slips.iter().flat_map(|s| &s.placements) {
                content.set_font(FONT_RESOURCE, placement.font_size);
                for line in &placement.lines {
                    output_font.show_text(&mut content, &line.text, line.x, line.y, placement.font_size);
                }
            }
            content.end_text();
        }
        contents.push(content.build());
    }

    // embedded fonts only know their glyph set once every page is drawn
    output_font.write(&mut writer, font_ref);
    let (page_width, page_height) = plan.grid.page_size();
    for content in contents {
        let mut resources = Resources::new();
        resources.add_font(FONT_RESOURCE, font_ref);
        if let Some(imported) = &background {
            resources.add_xobject(TEMPLATE_RESOURCE, imported.xobject);
        }
        writer.add_page(page_width, page_height, content, resources);
    }

    let bytes = writer.finish()?;
    log::info!(
        "composed {} slips on {} pages ({} bytes)",
        plan.slip_count(),
        plan.pages.len(),
        bytes.len()
    );
    Ok(bytes)
}

fn requires_font(records: &[VoterRecord], info: &GlobalInfo) -> bool {
    records
        .iter()
        .flat_map(|r| r.text_fields())
        .chain([info.center.as_str(), info.area.as_str()])
        .any(needs_unicode_font)
}

/// Width available to a mapping in template units: up to the next mapping
/// on the same baseline, else up to the padded right edge of the canvas.
fn field_width(mapping: &PlaceholderMapping, descriptor: &TemplateDescriptor, config: &CompositionConfig) -> f32 {
    let next = descriptor
        .mappings()
        .values()
        .filter(|other| (other.y - mapping.y).abs() <= BASELINE_TOLERANCE && other.x > mapping.x)
        .map(|other| other.x - mapping.x)
        .fold(f32::INFINITY, f32::min);

    let width = if next.is_finite() {
        next
    } else {
        descriptor.canvas_width() - config.field_padding - mapping.x
    };
    width.max(mapping.font_size)
}

fn place(
    text: &str,
    mapping: &PlaceholderMapping,
    width: f32,
    cell: &LayoutCell,
    scale: f32,
    measure: &dyn TextMeasure,
    config: &CompositionConfig,
) -> Option<TextPlacement> {
    let font_size = mapping.font_size * scale;
    let max_width = width * scale;
    let x = cell.x + mapping.x * scale;
    let y = cell.y + mapping.y * scale;
    let leading = font_size * config.line_spacing;

    let lines: Vec<TextLine> = wrap_text(text, measure, font_size, max_width, config.max_lines_for(&mapping.key))
        .into_iter()
        .enumerate()
        .map(|(i, text)| TextLine {
            width: measure.text_width(&text, font_size),
            x,
            y: y - i as f32 * leading,
            text,
        })
        .collect();

    if lines.is_empty() {
        return None;
    }
    Some(TextPlacement {
        key: mapping.key.clone(),
        lines,
        font_size,
        max_width,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AspectRatio;
    use crate::template::BUILTIN_KEYS;

    fn latin_record(i: usize) -> VoterRecord {
        let mut r = VoterRecord::new(format!("r{}", i), format!("{:03}", i), "Abdur Rahim", "1987654320001");
        r.father_name = "Nurul Islam".to_string();
        r.mother_name = "Rahela Begum".to_string();
        r.profession = "Farmer".to_string();
        r.date_of_birth = "01-01-1980".to_string();
        r.address = "West Para, Kauarkhop, Ramu".to_string();
        r
    }

    fn records(n: usize) -> Vec<VoterRecord> {
        (1..=n).map(latin_record).collect()
    }

    #[test]
    fn test_builtin_draws_every_populated_key() {
        let descriptor = TemplateDescriptor::builtin(None).unwrap();
        let info = GlobalInfo::new("X School", "");
        let plan = plan(&records(1), &descriptor, None, &CompositionConfig::default(), &info).unwrap();

        let slip = &plan.pages[0].slips[0];
        // VOTER_AREA is empty, every other canonical key draws
        assert_eq!(slip.placements.len(), BUILTIN_KEYS.len() - 1);
        let cell = slip.cell.rect();
        for placement in &slip.placements {
            assert!(!placement.lines.is_empty());
            assert!(cell.contains_rect(&placement.bounds()), "{} leaves its slip", placement.key);
            for line in &placement.lines {
                assert!(line.width <= placement.max_width + 1e-3);
            }
        }
    }

    #[test]
    fn test_thirteen_records_paginate() {
        let descriptor = TemplateDescriptor::builtin(None).unwrap();
        let config = CompositionConfig::default().with_aspect_ratio(AspectRatio::Portrait);
        let plan = plan(&records(13), &descriptor, None, &config, &GlobalInfo::default()).unwrap();

        let counts: Vec<usize> = plan.pages.iter().map(|p| p.slips.len()).collect();
        assert_eq!(counts, vec![6, 6, 1]);
        assert_eq!(plan.pages[2].slips[0].record_index, 12);
        assert_eq!(plan.slip_count(), 13);
    }

    #[test]
    fn test_fuzzy_key_draws_value() {
        let descriptor = TemplateDescriptor::blank(200.0, 200.0)
            .with_mappings([PlaceholderMapping::new("vote_center", 10.0, 100.0, 10.0)]);
        let info = GlobalInfo::new("X School", "Ward 5");
        let plan = plan(&records(1), &descriptor, None, &CompositionConfig::default(), &info).unwrap();

        let placements = &plan.pages[0].slips[0].placements;
        assert_eq!(placements.len(), 1);
        assert_eq!(placements[0].lines[0].text, "X School");
    }

    #[test]
    fn test_unresolved_key_is_omitted() {
        let descriptor = TemplateDescriptor::blank(200.0, 200.0)
            .with_mappings([PlaceholderMapping::new("PHOTO", 10.0, 100.0, 10.0)]);
        let plan = plan(&records(2), &descriptor, None, &CompositionConfig::default(), &GlobalInfo::default())
            .unwrap();
        assert!(plan.pages[0].slips.iter().all(|s| s.placements.is_empty()));
    }

    #[test]
    fn test_address_wraps_to_two_lines() {
        let descriptor = TemplateDescriptor::builtin(None).unwrap();
        let mut record = latin_record(1);
        record.address = "House 12, Road 7, West Para, Kauarkhop Union, Ramu Upazila, Cox's Bazar District, Chattogram Division"
            .to_string();
        let plan = plan(&[record], &descriptor, None, &CompositionConfig::default(), &GlobalInfo::default()).unwrap();

        let address = plan.pages[0].slips[0]
            .placements
            .iter()
            .find(|p| p.key == "ADDRESS")
            .unwrap();
        assert_eq!(address.lines.len(), 2);
        assert!(address.lines[1].y < address.lines[0].y);
    }

    #[test]
    fn test_field_width_stops_at_next_mapping() {
        let descriptor = TemplateDescriptor::builtin(None).unwrap();
        let config = CompositionConfig::default();
        let serial = &descriptor.mappings()["SERIAL"];
        let dob = &descriptor.mappings()["DOB"];
        assert_eq!(field_width(serial, &descriptor, &config), 87.0 - 44.0);
        assert_eq!(field_width(dob, &descriptor, &config), 260.0 - 8.0 - 190.0);
    }

    #[test]
    fn test_geometry_is_repeatable() {
        let descriptor = TemplateDescriptor::builtin(None).unwrap();
        let config = CompositionConfig::default();
        let info = GlobalInfo::new("X School", "Ward 5");
        let a = plan(&records(15), &descriptor, None, &config, &info).unwrap();
        let b = plan(&records(15), &descriptor, None, &config, &info).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_records_rejected() {
        let descriptor = TemplateDescriptor::blank(100.0, 100.0);
        let err = compose(&[], &descriptor, None, &CompositionConfig::default(), &GlobalInfo::default()).unwrap_err();
        assert!(matches!(err, Error::NoRecords));
    }

    #[test]
    fn test_bengali_without_font_rejected() {
        let descriptor = TemplateDescriptor::builtin(None).unwrap();
        let record = VoterRecord::new("r1", "১", "রহিম", "১২৩৪৫৬৭");
        let err = plan(&[record], &descriptor, None, &CompositionConfig::default(), &GlobalInfo::default())
            .unwrap_err();
        assert!(matches!(err, Error::ResourceMissing(_)));

        let err = plan(
            &records(1),
            &descriptor,
            None,
            &CompositionConfig::default(),
            &GlobalInfo::new("কেন্দ্র", ""),
        )
        .unwrap_err();
        assert!(matches!(err, Error::ResourceMissing(_)));
    }

    #[test]
    fn test_render_with_builtin_background() {
        let descriptor = TemplateDescriptor::builtin(None).unwrap();
        let config = CompositionConfig::default().with_compress(false);
        let bytes = compose(&records(3), &descriptor, None, &config, &GlobalInfo::new("X School", "Ward 5")).unwrap();

        let text = String::from_utf8_lossy(&bytes);
        assert!(bytes.starts_with(b"%PDF-"));
        assert_eq!(text.matches("/Tpl Do").count(), 3);
        assert!(text.contains("(Abdur Rahim) Tj"));
        assert!(text.contains("(X School) Tj"));
        // design labels and slip text share one font object
        assert_eq!(text.matches("/BaseFont /Helvetica").count(), 1);
        assert!(text.contains("(Voter No:) Tj"));
    }

    #[test]
    fn test_blank_template_draws_rounded_fill() {
        let descriptor = TemplateDescriptor::blank(260.0, 210.0);
        let config = CompositionConfig::default().with_compress(false);
        let bytes = compose(&records(2), &descriptor, None, &config, &GlobalInfo::default()).unwrap();

        let text = String::from_utf8_lossy(&bytes);
        assert!(!text.contains("/Tpl"));
        assert!(text.contains("0.92 g"));
        assert!(text.contains(" c\n"));
    }
}
