//! Configuration for extraction and composition.
//!
//! Every tunable constant lives here rather than inline in the algorithms.
//! All configs implement `Default` with the production values and can be
//! loaded from JSON.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Proximity parameters for the spatial clusterer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Vertical difference under which two tokens sort as the same row
    pub row_band: f32,
    /// Horizontal linkage distance (exclusive)
    pub max_dx: f32,
    /// Vertical linkage distance (exclusive)
    pub max_dy: f32,
    /// Smallest cluster kept as a candidate record
    pub min_tokens: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            row_band: 10.0,
            max_dx: 250.0,
            max_dy: 200.0,
            min_tokens: 3,
        }
    }
}

impl ClusterConfig {
    /// Set the linkage envelope.
    pub fn with_envelope(mut self, max_dx: f32, max_dy: f32) -> Self {
        self.max_dx = max_dx;
        self.max_dy = max_dy;
        self
    }

    /// Set the minimum cluster size.
    pub fn with_min_tokens(mut self, min_tokens: usize) -> Self {
        self.min_tokens = min_tokens;
        self
    }
}

/// Parameters for the record field extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Row band used to re-sort a cluster into reading order
    pub row_band: f32,
    /// Look-ahead window for voter number and date of birth labels
    pub short_window: usize,
    /// Digit run required after a voter number label
    pub min_voter_no_digits: usize,
    /// Digit run that marks an unlabeled token as a voter number
    pub fallback_voter_no_digits: usize,
    /// Script run that marks an unlabeled token as a name
    pub min_fallback_name_run: usize,
    /// Prefix of generated record ids
    pub id_prefix: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            row_band: 5.0,
            short_window: 3,
            min_voter_no_digits: 5,
            fallback_voter_no_digits: 7,
            min_fallback_name_run: 3,
            id_prefix: "voter".to_string(),
        }
    }
}

/// Physical output page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageSize {
    /// ISO A4, 595.28 x 841.89 pt
    #[default]
    A4,
    /// US Legal, 612 x 1008 pt
    Legal,
}

impl PageSize {
    /// Width and height in points.
    pub fn dimensions(&self) -> (f32, f32) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Legal => (612.0, 1008.0),
        }
    }
}

impl FromStr for PageSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "a4" => Ok(PageSize::A4),
            "legal" => Ok(PageSize::Legal),
            _ => Err(Error::Config(format!("unknown page size '{}'", s))),
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSize::A4 => write!(f, "A4"),
            PageSize::Legal => write!(f, "Legal"),
        }
    }
}

/// Slip shape policy; also decides how many slots a page holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 1:1
    #[default]
    #[serde(rename = "1:1")]
    Square,
    /// 3:4 (width:height)
    #[serde(rename = "3:4")]
    Portrait,
}

impl AspectRatio {
    /// Width divided by height.
    pub fn ratio(&self) -> f32 {
        match self {
            AspectRatio::Square => 1.0,
            AspectRatio::Portrait => 0.75,
        }
    }

    /// Grid arrangement as (columns, rows).
    pub fn grid(&self) -> (usize, usize) {
        match self {
            AspectRatio::Square => (3, 4),
            AspectRatio::Portrait => (2, 3),
        }
    }

    /// Slots per page.
    pub fn slots_per_page(&self) -> usize {
        let (cols, rows) = self.grid();
        cols * rows
    }
}

impl FromStr for AspectRatio {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "1:1" | "square" => Ok(AspectRatio::Square),
            "3:4" | "portrait" => Ok(AspectRatio::Portrait),
            _ => Err(Error::Config(format!("unknown aspect ratio '{}'", s))),
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AspectRatio::Square => write!(f, "1:1"),
            AspectRatio::Portrait => write!(f, "3:4"),
        }
    }
}

/// Layout and rendering parameters for the composition engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionConfig {
    /// Output page size
    pub page_size: PageSize,
    /// Slip shape and slot policy
    pub aspect_ratio: AspectRatio,
    /// Outer page margin in points
    pub outer_margin: f32,
    /// Smallest gap between slips used when sizing them
    pub min_gap: f32,
    /// Line limit for fields without an entry in `field_max_lines`
    pub default_max_lines: usize,
    /// Per-key line limits (matched case-insensitively)
    pub field_max_lines: BTreeMap<String, usize>,
    /// Leading as a multiple of the font size
    pub line_spacing: f32,
    /// Gray level of the flat fill drawn when no background exists
    pub fallback_fill: f32,
    /// Corner radius of the flat fill, in points
    pub corner_radius: f32,
    /// Right padding kept between a field and the slip edge, in template units
    pub field_padding: f32,
    /// Compress content streams
    pub compress: bool,
    /// Document title
    pub title: Option<String>,
    /// Document author
    pub author: Option<String>,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        let mut field_max_lines = BTreeMap::new();
        field_max_lines.insert("ADDRESS".to_string(), 2);
        Self {
            page_size: PageSize::default(),
            aspect_ratio: AspectRatio::default(),
            outer_margin: 20.0,
            min_gap: 8.0,
            default_max_lines: 1,
            field_max_lines,
            line_spacing: 1.2,
            fallback_fill: 0.92,
            corner_radius: 6.0,
            field_padding: 8.0,
            compress: true,
            title: Some("Voter Slips".to_string()),
            author: None,
        }
    }
}

impl CompositionConfig {
    /// Set the page size.
    pub fn with_page_size(mut self, page_size: PageSize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the aspect ratio policy.
    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    /// Enable or disable stream compression.
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Override the line limit of one field.
    pub fn with_max_lines(mut self, key: impl Into<String>, lines: usize) -> Self {
        self.field_max_lines.insert(key.into().to_ascii_uppercase(), lines);
        self
    }

    /// Line limit of a placeholder key.
    pub fn max_lines_for(&self, key: &str) -> usize {
        self.field_max_lines
            .get(&key.to_ascii_uppercase())
            .copied()
            .unwrap_or(self.default_max_lines)
            .max(1)
    }
}

/// Configuration for the multi-page extraction pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Clustering parameters
    pub cluster: ClusterConfig,
    /// Field extraction parameters
    pub extraction: ExtractionConfig,
    /// Drop standalone one or two digit page number tokens
    pub drop_page_numbers: bool,
    /// Substrings removed from every token before clustering
    pub garbage_tokens: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cluster: ClusterConfig::default(),
            extraction: ExtractionConfig::default(),
            drop_page_numbers: true,
            garbage_tokens: Vec::new(),
        }
    }
}

/// A complete generation run description, as read by the command line tool.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Composition parameters
    pub composition: CompositionConfig,
    /// Vote center drawn on every slip
    pub center: String,
    /// Voter area drawn on every slip
    pub area: String,
}

impl GenerateConfig {
    /// Load from a JSON document.
    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_defaults() {
        let c = ClusterConfig::default();
        assert_eq!(c.row_band, 10.0);
        assert_eq!(c.max_dx, 250.0);
        assert_eq!(c.max_dy, 200.0);
        assert_eq!(c.min_tokens, 3);
    }

    #[test]
    fn test_page_dimensions() {
        assert_eq!(PageSize::A4.dimensions(), (595.28, 841.89));
        assert_eq!(PageSize::Legal.dimensions(), (612.0, 1008.0));
    }

    #[test]
    fn test_aspect_policy_slots() {
        assert_eq!(AspectRatio::Square.slots_per_page(), 12);
        assert_eq!(AspectRatio::Portrait.slots_per_page(), 6);
        assert!(AspectRatio::Square.slots_per_page() > AspectRatio::Portrait.slots_per_page());
    }

    #[test]
    fn test_aspect_parse_and_display() {
        assert_eq!("3:4".parse::<AspectRatio>().unwrap(), AspectRatio::Portrait);
        assert_eq!("1:1".parse::<AspectRatio>().unwrap(), AspectRatio::Square);
        assert_eq!(AspectRatio::Portrait.to_string(), "3:4");
        assert!("16:9".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn test_page_size_parse() {
        assert_eq!("legal".parse::<PageSize>().unwrap(), PageSize::Legal);
        assert_eq!("A4".parse::<PageSize>().unwrap(), PageSize::A4);
    }

    #[test]
    fn test_max_lines_lookup() {
        let c = CompositionConfig::default().with_max_lines("name", 3);
        assert_eq!(c.max_lines_for("ADDRESS"), 2);
        assert_eq!(c.max_lines_for("address"), 2);
        assert_eq!(c.max_lines_for("NAME"), 3);
        assert_eq!(c.max_lines_for("FATHER"), 1);
    }

    #[test]
    fn test_generate_config_from_json() {
        let json = r#"{
            "composition": {"page_size": "Legal", "aspect_ratio": "3:4"},
            "center": "X School"
        }"#;
        let cfg = GenerateConfig::from_json(json).unwrap();
        assert_eq!(cfg.composition.page_size, PageSize::Legal);
        assert_eq!(cfg.composition.aspect_ratio, AspectRatio::Portrait);
        assert_eq!(cfg.composition.outer_margin, 20.0);
        assert_eq!(cfg.center, "X School");
        assert!(cfg.area.is_empty());
    }
}
