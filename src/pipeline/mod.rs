//! Multi-page record extraction.
//!
//! ```text
//! TokenSource (page by page)
//!     ↓
//! garbage filter (page numbers, configured substrings)
//!     ↓
//! SpatialClusterer (tokens → record blocks)
//!     ↓
//! VoterExtractor (blocks → VoterRecord, numbered across pages)
//!     ↓
//! PipelineReport
//! ```
//!
//! Pages are processed sequentially and their records appended in page
//! order. A run that recovers no record at all fails with the soft
//! [`Error::NothingExtracted`].

pub mod token_source;

pub use token_source::{JsonTokenSource, PdfTextSource, TokenSource};

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::extractors::VoterExtractor;
use crate::layout::SpatialClusterer;
use crate::model::{TextToken, VoterRecord};
use serde::Serialize;

/// Totals of one pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    /// Accepted records in page order
    pub records: Vec<VoterRecord>,
    /// Pages read
    pub pages: usize,
    /// Candidate blocks found
    pub clusters: usize,
    /// Blocks that did not yield a record
    pub rejected: usize,
    /// Tokens dropped as page furniture
    pub dropped_tokens: usize,
}

/// Token source to records.
pub struct ExtractionPipeline {
    config: PipelineConfig,
    clusterer: SpatialClusterer,
    extractor: VoterExtractor,
}

impl ExtractionPipeline {
    /// Create a pipeline with default configuration.
    pub fn new() -> Self {
        Self::with_config(PipelineConfig::default())
    }

    /// Create a pipeline with custom configuration.
    pub fn with_config(config: PipelineConfig) -> Self {
        Self {
            clusterer: SpatialClusterer::with_config(config.cluster.clone()),
            extractor: VoterExtractor::with_config(config.extraction.clone()),
            config,
        }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Read every page of `source` and extract its records.
    pub fn run<S: TokenSource + ?Sized>(&self, source: &mut S) -> Result<PipelineReport> {
        let mut report = PipelineReport::default();
        let mut next_block = 1;

        for index in 0..source.page_count() {
            let page = source.page(index)?;
            let total = page.tokens.len();
            let tokens = self.clean(page.tokens);
            report.dropped_tokens += total - tokens.len();

            let clusters = self.clusterer.cluster(&tokens);
            let extracted = self.extractor.extract_all(&clusters, next_block);
            log::debug!(
                "{} page {}: {} tokens, {} blocks, {} records",
                source.name(),
                index + 1,
                tokens.len(),
                clusters.len(),
                extracted.records.len()
            );

            next_block += clusters.len();
            report.pages += 1;
            report.clusters += clusters.len();
            report.rejected += extracted.rejected;
            report.records.extend(extracted.records);
        }

        if report.records.is_empty() {
            return Err(Error::NothingExtracted {
                pages: report.pages,
                clusters: report.clusters,
            });
        }
        log::info!(
            "extracted {} records from {} pages ({} blocks rejected)",
            report.records.len(),
            report.pages,
            report.rejected
        );
        Ok(report)
    }

    /// Strip configured garbage and drop page furniture.
    fn clean(&self, tokens: Vec<TextToken>) -> Vec<TextToken> {
        tokens
            .into_iter()
            .filter_map(|mut token| {
                for garbage in self.config.garbage_tokens.iter().filter(|g| !g.is_empty()) {
                    if token.text.contains(garbage.as_str()) {
                        token.text = token.text.replace(garbage.as_str(), "");
                    }
                }
                let text = token.text.trim();
                if text.is_empty() || (self.config.drop_page_numbers && is_page_number(text)) {
                    return None;
                }
                Some(token)
            })
            .collect()
    }
}

impl Default for ExtractionPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// A standalone one or two digit Bengali number.
pub fn is_page_number(text: &str) -> bool {
    let count = text.chars().count();
    (1..=2).contains(&count) && text.chars().all(|c| ('০'..='৯').contains(&c))
}
