// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::should_implement_trait)]
#![allow(clippy::manual_find)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]
#![cfg_attr(test, allow(unused_variables))]

//! # Voter Slip
//!
//! Recovers voter records from the text layer of printed electoral rolls and
//! lays them out as printable slips.
//!
//! ## Extraction
//! - **Clustering**: single-linkage proximity grouping of positioned tokens
//!   into record blocks
//! - **Field extraction**: bilingual (Bengali/English) label matching with
//!   script-aware value predicates and fallbacks
//! - **Pipeline**: page-by-page token sources (JSON or a PDF text layer),
//!   page number filtering, monotonic block numbering
//!
//! ## Composition
//! - **Templates**: `{{KEY}}` placeholders scanned from a PDF, raster
//!   backgrounds, or the built-in slip design
//! - **Substitution**: exact then normalized-substring key resolution with a
//!   deterministic tie-break
//! - **Layout**: aspect-preserving uniform grid with evenly spread gaps
//! - **Output**: PDF with the template imported once as a Form XObject and
//!   shaped, embedded Unicode fonts for Bengali text
//!
//! ## Quick Start
//!
//! ```ignore
//! use voter_slip::compose::compose;
//! use voter_slip::config::CompositionConfig;
//! use voter_slip::model::GlobalInfo;
//! use voter_slip::pipeline::{ExtractionPipeline, JsonTokenSource};
//! use voter_slip::template::TemplateDescriptor;
//! use voter_slip::writer::FontResource;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut source = JsonTokenSource::from_file("roll_tokens.json")?;
//! let report = ExtractionPipeline::new().run(&mut source)?;
//!
//! let font = FontResource::from_file("NotoSansBengali-Regular.ttf")?;
//! let template = TemplateDescriptor::builtin(Some(&font))?;
//! let info = GlobalInfo::new("Kauarkhop Government Primary School", "Ward 5");
//! let pdf = compose(&report.records, &template, Some(&font), &CompositionConfig::default(), &info)?;
//! std::fs::write("slips.pdf", pdf)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Error handling
pub mod error;

// Configuration and data model
pub mod config;
pub mod model;

// Layout analysis
pub mod geometry;
pub mod layout;

// Record extraction
pub mod extractors;
pub mod pipeline;

// Output documents
pub mod object;
pub mod writer;

// Slip composition
pub mod compose;
pub mod template;

// Re-exports
pub use compose::{compose, plan, CompositionPlan};
pub use config::{AspectRatio, CompositionConfig, PageSize, PipelineConfig};
pub use error::{Error, Result};
pub use model::{GlobalInfo, PageTokens, TextToken, VoterRecord};
pub use pipeline::{ExtractionPipeline, PipelineReport, TokenSource};
pub use template::{PlaceholderMapping, TemplateDescriptor, TemplateKind};
pub use writer::FontResource;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
