//! Read-only views over a graph snapshot.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

use crate::engine::GraphEngine;
use crate::graph::KnowledgeGraph;
use crate::models::{Edge, Node, NodeType};

/// Score multiplier for edges joining different node types.
pub const CROSS_TYPE_BONUS: f64 = 1.2;
/// Score multiplier for edges whose endpoints share many keywords.
pub const OVERLAP_PENALTY: f64 = 0.8;
/// Shared keyword count above which [`OVERLAP_PENALTY`] applies.
pub const OVERLAP_LIMIT: usize = 2;

/// The full graph plus totals.
#[derive(Debug, Clone, Serialize)]
pub struct GraphView {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub total_nodes: usize,
    pub total_edges: usize,
    pub last_updated: DateTime<Utc>,
}

/// One neighbor of a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connection {
    pub target_node_id: String,
    pub target_title: String,
    pub weight: f64,
    pub similarity_type: String,
    pub user_boosted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurprisingConnection {
    pub source_id: String,
    pub target_id: String,
    pub source_title: String,
    pub target_title: String,
    pub source_type: NodeType,
    pub target_type: NodeType,
    pub weight: f64,
    pub surprise_score: f64,
    pub overlapping_keywords: Vec<String>,
}

impl KnowledgeGraph {
    pub fn view(&self) -> GraphView {
        GraphView {
            nodes: self.nodes().to_vec(),
            edges: self.edges().to_vec(),
            total_nodes: self.node_count(),
            total_edges: self.edge_count(),
            last_updated: self.last_updated(),
        }
    }

    /// Neighbors of `node_id`, strongest first. Empty for unknown ids.
    pub fn connections(&self, node_id: &str) -> Vec<Connection> {
        let Some(position) = self.position(node_id) else {
            return Vec::new();
        };

        let mut connections: Vec<Connection> = self
            .neighbors(position)
            .map(|(edge, other)| {
                let target = &self.nodes()[other];
                Connection {
                    target_node_id: target.id().to_string(),
                    target_title: target.title().to_string(),
                    weight: edge.weight,
                    similarity_type: edge.similarity_type.clone(),
                    user_boosted: edge.user_boosted,
                }
            })
            .collect();
        connections.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        connections
    }

    /// Edges ranked by surprise: high weight, different node types and few
    /// shared keywords rank first.
    pub fn surprising(&self, limit: usize) -> Vec<SurprisingConnection> {
        let mut ranked: Vec<SurprisingConnection> = self
            .edges()
            .iter()
            .map(|edge| {
                let (source, target) = (&self.nodes()[edge.ends.0], &self.nodes()[edge.ends.1]);
                let overlapping = shared_keywords(source, target);

                let mut score = edge.weight;
                if source.node_type() != target.node_type() {
                    score *= CROSS_TYPE_BONUS;
                }
                if overlapping.len() > OVERLAP_LIMIT {
                    score *= OVERLAP_PENALTY;
                }

                SurprisingConnection {
                    source_id: source.id().to_string(),
                    target_id: target.id().to_string(),
                    source_title: source.title().to_string(),
                    target_title: target.title().to_string(),
                    source_type: source.node_type(),
                    target_type: target.node_type(),
                    weight: edge.weight,
                    surprise_score: score,
                    overlapping_keywords: overlapping,
                }
            })
            .collect();

        ranked.sort_by(|a, b| b.surprise_score.total_cmp(&a.surprise_score));
        ranked.truncate(limit);
        ranked
    }
}

/// Keywords of `source` that `target` also has, in `source` order.
fn shared_keywords(source: &Node, target: &Node) -> Vec<String> {
    let theirs: HashSet<&str> = target.item.keywords.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    source
        .item
        .keywords
        .iter()
        .filter(|k| theirs.contains(k.as_str()) && seen.insert(k.as_str()))
        .cloned()
        .collect()
}

impl GraphEngine {
    pub fn get_graph(&self) -> GraphView {
        self.snapshot().view()
    }

    pub fn node_connections(&self, node_id: &str) -> Vec<Connection> {
        self.snapshot().connections(node_id)
    }

    pub fn surprising_connections(&self, limit: usize) -> Vec<SurprisingConnection> {
        self.snapshot().surprising(limit)
    }
}
