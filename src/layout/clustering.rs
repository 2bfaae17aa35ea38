//! Single-linkage proximity clustering of page tokens into record blocks.
//!
//! Voter cards are rectangular groups of text with no explicit geometry in
//! the source. Tokens are linked into one block when they fall inside a
//! fixed envelope of any token already in the block, so a block grows
//! transitively across the card. The envelope comes from [`ClusterConfig`].

use crate::config::ClusterConfig;
use crate::geometry::Rect;
use crate::layout::reading_order::reading_order;
use crate::model::TextToken;

/// A group of tokens believed to form one record, in scan order.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    tokens: Vec<TextToken>,
}

impl Cluster {
    /// Wrap tokens as a cluster.
    pub fn new(tokens: Vec<TextToken>) -> Self {
        Self { tokens }
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the cluster has no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Member tokens.
    pub fn tokens(&self) -> &[TextToken] {
        &self.tokens
    }

    /// Consume the cluster.
    pub fn into_tokens(self) -> Vec<TextToken> {
        self.tokens
    }

    /// Bounding box of the token origins and reported extents.
    pub fn bbox(&self) -> Option<Rect> {
        self.tokens
            .iter()
            .map(|t| Rect::new(t.x, t.y, t.width.max(0.0), t.height.max(0.0)))
            .reduce(|a, b| a.union(&b))
    }

    /// Space-joined text of every member.
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Groups the tokens of one page into candidate record blocks.
#[derive(Debug, Clone, Default)]
pub struct SpatialClusterer {
    config: ClusterConfig,
}

impl SpatialClusterer {
    /// Create a clusterer with default proximity constants.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clusterer with custom constants.
    pub fn with_config(config: ClusterConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Whether two tokens lie within the linkage envelope.
    pub fn is_nearby(&self, a: &TextToken, b: &TextToken) -> bool {
        (a.x - b.x).abs() < self.config.max_dx && (a.y - b.y).abs() < self.config.max_dy
    }

    /// Cluster one page of tokens.
    ///
    /// Tokens are visited in reading order. Each unassigned token seeds a
    /// cluster; one forward pass over the remaining unassigned tokens adds
    /// every token near any current member. Clusters smaller than
    /// `min_tokens` are dropped. Never fails; empty input yields no clusters.
    pub fn cluster(&self, tokens: &[TextToken]) -> Vec<Cluster> {
        if tokens.is_empty() {
            return Vec::new();
        }

        let order = reading_order(tokens, self.config.row_band);
        let mut visited = vec![false; order.len()];
        let mut clusters = Vec::new();
        let mut discarded = 0usize;

        for i in 0..order.len() {
            if visited[i] {
                continue;
            }
            visited[i] = true;
            let mut members = vec![order[i]];

            for j in (i + 1)..order.len() {
                if visited[j] {
                    continue;
                }
                let candidate = &tokens[order[j]];
                if members.iter().any(|&m| self.is_nearby(&tokens[m], candidate)) {
                    members.push(order[j]);
                    visited[j] = true;
                }
            }

            if members.len() >= self.config.min_tokens {
                clusters.push(Cluster::new(
                    members.into_iter().map(|m| tokens[m].clone()).collect(),
                ));
            } else {
                discarded += 1;
            }
        }

        log::debug!(
            "Clustered {} tokens into {} blocks ({} undersized groups dropped)",
            tokens.len(),
            clusters.len(),
            discarded
        );
        clusters
    }
}

/// Cluster tokens with the default constants.
pub fn cluster_tokens(tokens: &[TextToken]) -> Vec<Cluster> {
    SpatialClusterer::new().cluster(tokens)
}
