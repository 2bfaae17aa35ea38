//! Spatial analysis of positioned tokens.
//!
//! - Row-banded reading order shared by the clusterer and the field extractor
//! - Single-linkage proximity clustering into record blocks

pub mod clustering;
pub mod reading_order;

pub use clustering::{cluster_tokens, Cluster, SpatialClusterer};
pub use reading_order::{reading_order, sorted_tokens};
