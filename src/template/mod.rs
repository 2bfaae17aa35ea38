//! Slip templates: where each field is drawn and what lies underneath.
//!
//! A [`TemplateDescriptor`] is built once per generation run, either by
//! scanning a caller's PDF for `{{KEY}}` placeholders, by wrapping a raster
//! image, or by synthesizing the built-in slip design.

pub mod builtin;
pub mod import;
pub mod scanner;

use crate::config::AspectRatio;
use crate::error::{Error, Result};
use crate::writer::{is_jpeg, is_png, FontResource, ImageData};
use bytes::Bytes;
use indexmap::IndexMap;
use serde::Serialize;

pub use builtin::{BUILTIN_HEIGHT, BUILTIN_KEYS, BUILTIN_WIDTH};
pub use import::{import_template, ImportedTemplate, SharedFont};
pub use scanner::{scan_template, TextRun};

/// Height of the canvas assigned to raster templates; the width follows
/// the aspect ratio policy.
pub const IMAGE_CANVAS_HEIGHT: f32 = 300.0;

/// Source format of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TemplateKind {
    /// First page of a PDF document
    Pdf,
    /// The built-in design, drawn straight into the output
    Builtin,
    /// PNG or JPEG image
    Image,
    /// No background; slips get a flat fill
    Blank,
}

/// Where one placeholder's value is drawn, in template units.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceholderMapping {
    /// Key as authored inside the braces
    pub key: String,
    /// Always the first page
    pub page_index: usize,
    /// Baseline origin x
    pub x: f32,
    /// Baseline origin y
    pub y: f32,
    /// Font size
    pub font_size: f32,
}

impl PlaceholderMapping {
    /// Create a mapping on the first page.
    pub fn new(key: impl Into<String>, x: f32, y: f32, font_size: f32) -> Self {
        Self {
            key: key.into(),
            page_index: 0,
            x,
            y,
            font_size,
        }
    }
}

/// Resolved template metadata for one generation run.
#[derive(Debug, Clone)]
pub struct TemplateDescriptor {
    source: Bytes,
    kind: TemplateKind,
    mappings: IndexMap<String, PlaceholderMapping>,
    canvas_width: f32,
    canvas_height: f32,
    aspect_ratio: AspectRatio,
}

impl TemplateDescriptor {
    /// Build a descriptor from template bytes, sniffing PDF, PNG or JPEG.
    ///
    /// Unreadable bytes are an [`Error::InvalidTemplate`]. A PDF without
    /// placeholders is valid and is drawn as background only.
    pub fn from_bytes(bytes: impl Into<Bytes>, aspect_ratio: AspectRatio) -> Result<Self> {
        let source: Bytes = bytes.into();

        if is_pdf(&source) {
            let scanned = scanner::scan_template(&source)?;
            if scanned.width <= 0.0 || scanned.height <= 0.0 {
                return Err(Error::InvalidTemplate("page has an empty MediaBox".to_string()));
            }
            return Ok(Self {
                source,
                kind: TemplateKind::Pdf,
                mappings: scanned.mappings,
                canvas_width: scanned.width,
                canvas_height: scanned.height,
                aspect_ratio,
            });
        }

        if is_png(&source) || is_jpeg(&source) {
            ImageData::from_bytes(&source).map_err(|e| Error::InvalidTemplate(e.to_string()))?;
            log::debug!("raster template: no placeholders can be scanned");
            return Ok(Self {
                source,
                kind: TemplateKind::Image,
                mappings: IndexMap::new(),
                canvas_width: IMAGE_CANVAS_HEIGHT * aspect_ratio.ratio(),
                canvas_height: IMAGE_CANVAS_HEIGHT,
                aspect_ratio,
            });
        }

        Err(Error::InvalidTemplate(
            "expected a PDF, PNG or JPEG document".to_string(),
        ))
    }

    /// Read a template file.
    pub fn from_file(path: impl AsRef<std::path::Path>, aspect_ratio: AspectRatio) -> Result<Self> {
        Self::from_bytes(std::fs::read(path)?, aspect_ratio)
    }

    /// The built-in slip design.
    ///
    /// `source()` holds the design as a standalone PDF, with Bengali labels
    /// when a font is supplied. Composition redraws it with the output font
    /// instead of importing that document.
    pub fn builtin(font: Option<&FontResource>) -> Result<Self> {
        let source = builtin::render(font)?;
        Ok(Self {
            source: Bytes::from(source),
            kind: TemplateKind::Builtin,
            mappings: builtin::mappings(),
            canvas_width: BUILTIN_WIDTH,
            canvas_height: BUILTIN_HEIGHT,
            aspect_ratio: AspectRatio::default(),
        })
    }

    /// A canvas with the built-in mappings and no background.
    pub fn blank(canvas_width: f32, canvas_height: f32) -> Self {
        Self {
            source: Bytes::new(),
            kind: TemplateKind::Blank,
            mappings: builtin::mappings(),
            canvas_width,
            canvas_height,
            aspect_ratio: AspectRatio::default(),
        }
    }

    /// Replace the placeholder mappings.
    pub fn with_mappings(mut self, mappings: impl IntoIterator<Item = PlaceholderMapping>) -> Self {
        self.mappings = mappings.into_iter().map(|m| (m.key.clone(), m)).collect();
        self
    }

    /// Template bytes (empty for a blank template).
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    /// Source format.
    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    /// Placeholder mappings in discovery order.
    pub fn mappings(&self) -> &IndexMap<String, PlaceholderMapping> {
        &self.mappings
    }

    /// Canvas width in template units.
    pub fn canvas_width(&self) -> f32 {
        self.canvas_width
    }

    /// Canvas height in template units.
    pub fn canvas_height(&self) -> f32 {
        self.canvas_height
    }

    /// Aspect ratio policy the descriptor was built for.
    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    /// Whether something is drawn underneath the fields.
    pub fn has_background(&self) -> bool {
        self.kind != TemplateKind::Blank
    }
}

/// PDF header within the first kilobyte.
pub fn is_pdf(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(1024)];
    head.windows(5).any(|w| w == b"%PDF-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniffing() {
        assert!(is_pdf(b"%PDF-1.7\n"));
        assert!(is_pdf(b"\xEF\xBB\xBF%PDF-1.4"));
        assert!(!is_pdf(b"hello"));
    }

    #[test]
    fn test_unknown_format() {
        let err = TemplateDescriptor::from_bytes(b"GIF89a....".to_vec(), AspectRatio::Square).unwrap_err();
        assert!(matches!(err, Error::InvalidTemplate(_)));
    }

    #[test]
    fn test_corrupt_png_is_invalid_template() {
        let err = TemplateDescriptor::from_bytes(b"\x89PNG\r\n\x1a\nbroken".to_vec(), AspectRatio::Square)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTemplate(_)));
    }

    #[test]
    fn test_blank_descriptor() {
        let blank = TemplateDescriptor::blank(260.0, 210.0);
        assert!(!blank.has_background());
        assert_eq!(blank.kind(), TemplateKind::Blank);
        assert_eq!(blank.mappings().len(), BUILTIN_KEYS.len());
        assert!(blank.source().is_empty());
    }

    #[test]
    fn test_mapping_json_names() {
        let json = serde_json::to_string(&PlaceholderMapping::new("NAME", 50.0, 200.0, 14.0)).unwrap();
        assert_eq!(json, r#"{"key":"NAME","pageIndex":0,"x":50.0,"y":200.0,"fontSize":14.0}"#);
    }
}
