//! Voter record extraction from clustered page tokens.
//!
//! Works on the output of [`crate::layout::clustering`]: each cluster is
//! re-read in reading order and its labels are matched against a bilingual
//! (Bengali and English) keyword set.

pub mod labels;
pub mod script;
pub mod voter;

pub use labels::{FieldLabel, Window};
pub use voter::{ExtractionReport, Rejection, VoterExtractor};
