//! Aggregate statistics over a graph snapshot.
//!
//! Backs `akg stats`: counts, density, connectivity, the node-type mix,
//! interaction totals, edge weight spread and the most central nodes.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::engine::GraphEngine;
use crate::graph::KnowledgeGraph;
use crate::models::NodeType;

/// Number of entries in [`GraphStats::most_connected_nodes`].
pub const TOP_CENTRAL_NODES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub density: f64,
    pub is_connected: bool,
    pub node_types: BTreeMap<NodeType, usize>,
    pub total_clicks: u64,
    pub avg_clicks_per_node: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_weights: Option<WeightSummary>,
    pub most_connected_nodes: Vec<CentralNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightSummary {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CentralNode {
    pub node_id: String,
    pub title: String,
    pub centrality: f64,
    pub connections: usize,
}

impl KnowledgeGraph {
    pub fn stats(&self) -> GraphStats {
        let n = self.node_count();
        let e = self.edge_count();

        let density = if n < 2 {
            0.0
        } else {
            (2 * e) as f64 / (n * (n - 1)) as f64
        };

        let mut node_types = BTreeMap::new();
        let mut total_clicks = 0u64;
        for node in self.nodes() {
            *node_types.entry(node.node_type()).or_insert(0) += 1;
            total_clicks += node.click_count;
        }
        let avg_clicks_per_node = if n == 0 {
            0.0
        } else {
            total_clicks as f64 / n as f64
        };

        GraphStats {
            total_nodes: n,
            total_edges: e,
            density,
            is_connected: self.is_connected(),
            node_types,
            total_clicks,
            avg_clicks_per_node,
            edge_weights: self.weight_summary(),
            most_connected_nodes: self.most_central(TOP_CENTRAL_NODES),
        }
    }

    fn weight_summary(&self) -> Option<WeightSummary> {
        let weights = self.edges().iter().map(|edge| edge.weight);
        let count = self.edge_count();
        if count == 0 {
            return None;
        }
        let (min, max, sum) = weights.fold((f64::INFINITY, f64::NEG_INFINITY, 0.0), |(lo, hi, sum), w| {
            (lo.min(w), hi.max(w), sum + w)
        });
        Some(WeightSummary {
            min,
            avg: sum / count as f64,
            max,
        })
    }

    /// Top `limit` nodes by degree centrality, ties in node order.
    fn most_central(&self, limit: usize) -> Vec<CentralNode> {
        let n = self.node_count();
        let mut central: Vec<CentralNode> = self
            .nodes()
            .iter()
            .enumerate()
            .map(|(position, node)| {
                let degree = self.degree(position);
                CentralNode {
                    node_id: node.id().to_string(),
                    title: node.title().to_string(),
                    centrality: if n > 1 {
                        degree as f64 / (n - 1) as f64
                    } else {
                        1.0
                    },
                    connections: degree,
                }
            })
            .collect();
        central.sort_by(|a, b| b.connections.cmp(&a.connections));
        central.truncate(limit);
        central
    }
}

impl GraphEngine {
    pub fn get_stats(&self) -> GraphStats {
        self.snapshot().stats()
    }
}
