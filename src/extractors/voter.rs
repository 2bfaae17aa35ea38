//! Voter record extraction from one cluster.
//!
//! The cluster is re-read in reading order. Label tokens pull their value
//! from the tokens that follow them (or from an inline `label: value`);
//! two unlabeled fallbacks catch names and voter numbers printed without a
//! label. A block becomes a record only when both name and voter number
//! resolve.

use super::labels::{inline_value, is_label_like, FieldLabel, Window};
use super::script::{char_len, has_bengali, has_digit, longest_bengali_run, longest_digit_run};
use crate::config::ExtractionConfig;
use crate::layout::clustering::Cluster;
use crate::layout::reading_order::sorted_tokens;
use crate::model::{VoterRecord, NOT_AVAILABLE};

/// How a field value was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Resolution {
    /// Unlabeled heuristic
    Fallback,
    /// Value following a recognized label
    Labeled,
}

#[derive(Debug, Default)]
struct Slot {
    value: Option<(String, Resolution)>,
}

impl Slot {
    /// Store a value unless a value of equal or stronger resolution exists.
    fn offer(&mut self, value: &str, resolution: Resolution) {
        let replace = match &self.value {
            None => true,
            Some((_, existing)) => *existing < resolution,
        };
        if replace {
            self.value = Some((value.trim().to_string(), resolution));
        }
    }

    fn is_resolved(&self) -> bool {
        self.value.is_some()
    }

    fn take(self) -> Option<String> {
        self.value.map(|(v, _)| v).filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Default)]
struct Fields {
    name: Slot,
    voter_no: Slot,
    father: Slot,
    mother: Slot,
    date_of_birth: Slot,
    profession: Slot,
    address: Slot,
}

impl Fields {
    fn slot_mut(&mut self, label: FieldLabel) -> Option<&mut Slot> {
        match label {
            FieldLabel::Name => Some(&mut self.name),
            FieldLabel::VoterNo => Some(&mut self.voter_no),
            FieldLabel::Father => Some(&mut self.father),
            FieldLabel::Mother => Some(&mut self.mother),
            FieldLabel::DateOfBirth => Some(&mut self.date_of_birth),
            FieldLabel::Profession => Some(&mut self.profession),
            FieldLabel::Address => Some(&mut self.address),
            FieldLabel::Unlabeled => None,
        }
    }
}

/// Why a cluster did not yield a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// No Bengali text or no digit anywhere in the block
    NotARecordBlock,
    /// No name could be resolved
    MissingName,
    /// No voter number could be resolved
    MissingVoterNo,
}

/// Outcome of extracting a batch of clusters.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    /// Accepted records in cluster order
    pub records: Vec<VoterRecord>,
    /// Number of clusters rejected
    pub rejected: usize,
}

/// Converts clusters into voter records.
#[derive(Debug, Clone, Default)]
pub struct VoterExtractor {
    config: ExtractionConfig,
}

impl VoterExtractor {
    /// Create an extractor with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an extractor with custom thresholds.
    pub fn with_config(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Extract one record, or `None` when the block is rejected.
    pub fn extract(&self, cluster: &Cluster, block_index: usize) -> Option<VoterRecord> {
        self.try_extract(cluster, block_index).ok()
    }

    /// Extract one record, reporting why a block was rejected.
    pub fn try_extract(
        &self,
        cluster: &Cluster,
        block_index: usize,
    ) -> std::result::Result<VoterRecord, Rejection> {
        let tokens = sorted_tokens(cluster.tokens(), self.config.row_band);
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.trim()).collect();

        let full_text = texts.join(" ");
        if !has_bengali(&full_text) || !has_digit(&full_text) {
            return Err(Rejection::NotARecordBlock);
        }

        let labels: Vec<FieldLabel> = texts.iter().map(|t| FieldLabel::classify(t)).collect();
        let mut fields = Fields::default();

        for (i, text) in texts.iter().enumerate() {
            if text.is_empty() {
                continue;
            }

            let label = labels[i];
            if label.is_label() {
                if let Some(value) = self.find_value(label, i, &texts, &labels) {
                    if let Some(slot) = fields.slot_mut(label) {
                        slot.offer(value, Resolution::Labeled);
                    }
                }
            }

            if !fields.name.is_resolved()
                && char_len(text) > 3
                && longest_bengali_run(text) >= self.config.min_fallback_name_run
                && !is_label_like(text)
            {
                fields.name.offer(text, Resolution::Fallback);
            }

            if !fields.voter_no.is_resolved()
                && longest_digit_run(text) >= self.config.fallback_voter_no_digits
            {
                let value = inline_value(text).unwrap_or(text);
                fields.voter_no.offer(value, Resolution::Fallback);
            }
        }

        let name = fields.name.take().ok_or(Rejection::MissingName)?;
        let voter_no = fields.voter_no.take().ok_or(Rejection::MissingVoterNo)?;
        let or_na = |slot: Slot| slot.take().unwrap_or_else(|| NOT_AVAILABLE.to_string());

        Ok(VoterRecord {
            id: self.record_id(block_index),
            serial_no: block_index.to_string(),
            voter_name: name,
            voter_no,
            father_name: or_na(fields.father),
            mother_name: or_na(fields.mother),
            profession: or_na(fields.profession),
            date_of_birth: or_na(fields.date_of_birth),
            address: or_na(fields.address),
        })
    }

    /// Extract every cluster, numbering blocks from `start_index`.
    pub fn extract_all(&self, clusters: &[Cluster], start_index: usize) -> ExtractionReport {
        let mut report = ExtractionReport::default();
        for (offset, cluster) in clusters.iter().enumerate() {
            match self.try_extract(cluster, start_index + offset) {
                Ok(record) => report.records.push(record),
                Err(reason) => {
                    log::trace!(
                        "Rejected block {} ({} tokens): {:?}",
                        start_index + offset,
                        cluster.len(),
                        reason
                    );
                    report.rejected += 1;
                },
            }
        }
        report
    }

    /// Value for the label at `index`: inline first, then the first
    /// qualifying non-label token inside the label's window.
    fn find_value<'a>(
        &self,
        label: FieldLabel,
        index: usize,
        texts: &[&'a str],
        labels: &[FieldLabel],
    ) -> Option<&'a str> {
        if let Some(value) = inline_value(texts[index]) {
            if label.accepts(value, &self.config) && !FieldLabel::classify(value).is_label() {
                return Some(value);
            }
        }

        let end = match label.window(&self.config) {
            Window::Remaining => texts.len(),
            Window::Tokens(n) => (index + 1 + n).min(texts.len()),
        };
        ((index + 1)..end)
            .find(|&j| !labels[j].is_label() && label.accepts(texts[j], &self.config))
            .map(|j| texts[j])
    }

    fn record_id(&self, block_index: usize) -> String {
        let unique = uuid::Uuid::new_v4().simple().to_string();
        format!("{}_{}_{}", self.config.id_prefix, block_index, &unique[..8])
    }
}
