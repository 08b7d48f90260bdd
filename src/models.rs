//! Core data models used throughout the knowledge graph.
//!
//! [`ContentItem`]s flow out of the ingestion normalizer; the graph engine
//! turns each one into a [`Node`] and connects nodes with [`Edge`]s.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Edge tag for similarity computed from embeddings.
pub const SEMANTIC: &str = "semantic";

/// The kind of source a content item was ingested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Note,
    Pdf,
    Link,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Note => "note",
            NodeType::Pdf => "pdf",
            NodeType::Link => "link",
        }
    }

    /// Prefix used in content-addressed ids.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            NodeType::Note => "md",
            NodeType::Pdf => "pdf",
            NodeType::Link => "link",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized item produced by ingestion, before it enters the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub title: String,
    pub content: String,
    pub snippet: String,
    pub node_type: NodeType,
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A graph vertex: one ingested item plus its interaction counter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    #[serde(flatten)]
    pub item: ContentItem,
    pub click_count: u64,
}

impl Node {
    pub fn new(item: ContentItem) -> Self {
        Self {
            item,
            click_count: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.item.id
    }

    pub fn title(&self) -> &str {
        &self.item.title
    }

    pub fn node_type(&self) -> NodeType {
        self.item.node_type
    }
}

/// An undirected, weighted similarity relationship between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub weight: f64,
    pub similarity_type: String,
    pub user_boosted: bool,
    pub created_at: DateTime<Utc>,
    /// Endpoint positions in the owning graph's node list, `.0 < .1`.
    #[serde(skip)]
    pub(crate) ends: (usize, usize),
}

impl Edge {
    /// Returns the endpoint opposite `node`, if `node` is an endpoint.
    pub(crate) fn other_end(&self, node: usize) -> Option<usize> {
        match self.ends {
            (a, b) if a == node => Some(b),
            (a, b) if b == node => Some(a),
            _ => None,
        }
    }
}

/// Interaction event reported for a node.
///
/// Only the presence of the event affects weighting; kind and duration are
/// logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    #[serde(default = "default_interaction_type")]
    pub interaction_type: String,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

fn default_interaction_type() -> String {
    "click".to_string()
}

impl Default for Interaction {
    fn default() -> Self {
        Self {
            interaction_type: default_interaction_type(),
            duration: None,
            timestamp: Utc::now(),
        }
    }
}

impl Interaction {
    pub fn new(interaction_type: impl Into<String>) -> Self {
        Self {
            interaction_type: interaction_type.into(),
            ..Self::default()
        }
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }
}
