//! Search result types.

use serde::{Deserialize, Serialize};

/// One hit returned by a full-text query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Item {
    /// A vertex document.
    Vertex { vid: String, score: f64 },
    /// An edge document.
    Edge {
        src: String,
        dst: String,
        rank: i64,
        score: f64,
    },
}

impl Item {
    pub fn vertex(vid: impl Into<String>, score: f64) -> Self {
        Self::Vertex {
            vid: vid.into(),
            score,
        }
    }

    pub fn edge(src: impl Into<String>, dst: impl Into<String>, rank: i64, score: f64) -> Self {
        Self::Edge {
            src: src.into(),
            dst: dst.into(),
            rank,
            score,
        }
    }

    /// Relevance score assigned by the search cluster.
    pub fn score(&self) -> f64 {
        match self {
            Self::Vertex { score, .. } | Self::Edge { score, .. } => *score,
        }
    }
}

/// Parsed response of a search request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Hits in the order returned by the cluster.
    pub items: Vec<Item>,
}

impl QueryResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}
