//! In-memory node/edge store.
//!
//! [`KnowledgeGraph`] is an undirected simple graph: nodes are addressed by
//! id and by their position in insertion order, edges are unique per
//! unordered pair and never connect a node to itself. Node positions are
//! stable for the lifetime of a graph (nodes are only removed by replacing
//! the whole graph), so edges store endpoint positions alongside the ids.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};

use crate::embedding::SimilarityFn;
use crate::models::{ContentItem, Edge, Node, SEMANTIC};

#[derive(Debug, Clone)]
pub struct KnowledgeGraph {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
    pairs: HashMap<(usize, usize), usize>,
    /// Incident edge positions per node.
    adjacency: Vec<Vec<usize>>,
    embeddings: HashMap<String, Vec<f32>>,
    last_updated: DateTime<Utc>,
}

impl Default for KnowledgeGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            edges: Vec::new(),
            pairs: HashMap::new(),
            adjacency: Vec::new(),
            embeddings: HashMap::new(),
            last_updated: Utc::now(),
        }
    }

    /// Insert a node for `item` with a zero click count.
    ///
    /// An item whose id is already present replaces the earlier node in
    /// place; returns `false` in that case.
    pub fn insert_node(&mut self, item: ContentItem) -> bool {
        if let Some(&position) = self.index.get(&item.id) {
            tracing::debug!(id = %item.id, "duplicate node id, overwriting");
            self.nodes[position] = Node::new(item);
            return false;
        }
        self.index.insert(item.id.clone(), self.nodes.len());
        self.nodes.push(Node::new(item));
        self.adjacency.push(Vec::new());
        true
    }

    /// Cache an embedding for an existing node. Ignored for unknown ids.
    pub fn set_embedding(&mut self, id: String, vector: Vec<f32>) {
        if self.index.contains_key(&id) {
            self.embeddings.insert(id, vector);
        }
    }

    pub fn embedding(&self, id: &str) -> Option<&[f32]> {
        self.embeddings.get(id).map(Vec::as_slice)
    }

    /// Connect nodes at positions `a` and `b`.
    ///
    /// Rejects self-loops, unknown positions and pairs that already have an
    /// edge. The weight is clamped into `[0, 1]`.
    pub fn add_edge(&mut self, a: usize, b: usize, weight: f64, similarity_type: &str) -> bool {
        if a == b || a >= self.nodes.len() || b >= self.nodes.len() {
            return false;
        }
        let ends = (a.min(b), a.max(b));
        if self.pairs.contains_key(&ends) {
            return false;
        }

        let weight = if weight.is_nan() { 0.0 } else { weight.clamp(0.0, 1.0) };
        let position = self.edges.len();
        self.edges.push(Edge {
            source: self.nodes[ends.0].id().to_string(),
            target: self.nodes[ends.1].id().to_string(),
            weight,
            similarity_type: similarity_type.to_string(),
            user_boosted: false,
            created_at: Utc::now(),
            ends,
        });
        self.pairs.insert(ends, position);
        self.adjacency[ends.0].push(position);
        self.adjacency[ends.1].push(position);
        true
    }

    /// Create a semantic edge for every pair `i < j` whose similarity is at
    /// least `threshold`. Nodes without a cached embedding are skipped.
    /// Returns the number of edges created.
    pub fn connect_similar(&mut self, threshold: f64, similarity: SimilarityFn) -> usize {
        let mut scored = Vec::new();
        for i in 0..self.nodes.len() {
            let Some(a) = self.embeddings.get(self.nodes[i].id()) else {
                continue;
            };
            for j in (i + 1)..self.nodes.len() {
                let Some(b) = self.embeddings.get(self.nodes[j].id()) else {
                    continue;
                };
                // Compared in the similarity's own precision so a score equal
                // to the threshold is kept.
                let score = similarity(a, b);
                if score >= threshold as f32 {
                    scored.push((i, j, f64::from(score)));
                }
            }
        }

        scored
            .into_iter()
            .filter(|&(i, j, score)| self.add_edge(i, j, score, SEMANTIC))
            .count()
    }

    /// Multiply the weight of every edge incident to the node at `position`
    /// by `factor`, capped at 1.0, and mark those edges as user boosted.
    /// Also counts the interaction on the node.
    pub(crate) fn boost_incident(&mut self, position: usize, factor: f64) {
        let Some(node) = self.nodes.get_mut(position) else {
            return;
        };
        node.click_count += 1;

        for &edge in &self.adjacency[position] {
            let edge = &mut self.edges[edge];
            let before = edge.weight;
            edge.weight = (edge.weight * factor).min(1.0);
            edge.user_boosted = true;
            debug_assert!(edge.weight >= before && edge.weight <= 1.0);
        }
        self.touch();
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.position(id).map(|p| &self.nodes[p])
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Edges incident to the node at `position`, paired with the neighbor's
    /// position, in the order the edges were created.
    pub fn neighbors(&self, position: usize) -> impl Iterator<Item = (&Edge, usize)> + '_ {
        self.adjacency
            .get(position)
            .into_iter()
            .flatten()
            .filter_map(move |&e| {
                let edge = &self.edges[e];
                edge.other_end(position).map(|other| (edge, other))
            })
    }

    pub fn degree(&self, position: usize) -> usize {
        self.adjacency.get(position).map_or(0, Vec::len)
    }

    pub fn has_edge(&self, a: &str, b: &str) -> bool {
        match (self.position(a), self.position(b)) {
            (Some(a), Some(b)) => self.pairs.contains_key(&(a.min(b), a.max(b))),
            _ => false,
        }
    }

    /// True when every node can reach every other. The empty graph is not
    /// connected; a single node is.
    pub fn is_connected(&self) -> bool {
        if self.nodes.is_empty() {
            return false;
        }

        let mut seen = vec![false; self.nodes.len()];
        let mut queue = VecDeque::from([0]);
        seen[0] = true;
        let mut reached = 1;
        while let Some(current) = queue.pop_front() {
            for (_, next) in self.neighbors(current) {
                if !seen[next] {
                    seen[next] = true;
                    reached += 1;
                    queue.push_back(next);
                }
            }
        }
        reached == self.nodes.len()
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    pub(crate) fn touch(&mut self) {
        self.last_updated = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::cosine_similarity;
    use crate::models::NodeType;

    fn item(id: &str) -> ContentItem {
        ContentItem {
            id: id.to_string(),
            title: id.to_uppercase(),
            content: String::new(),
            snippet: String::new(),
            node_type: NodeType::Note,
            keywords: Vec::new(),
            source_file: None,
            url: None,
            description: None,
            tags: Vec::new(),
            created_at: Utc::now(),
        }
    }

    fn graph_with(ids: &[&str]) -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::new();
        for id in ids {
            graph.insert_node(item(id));
        }
        graph
    }

    #[test]
    fn test_insert_overwrites_duplicate_id() {
        let mut graph = graph_with(&["a", "b"]);
        let mut replacement = item("a");
        replacement.title = "Replaced".to_string();
        assert!(!graph.insert_node(replacement));
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.nodes()[0].title(), "Replaced");
    }

    #[test]
    fn test_add_edge_rejects_loops_duplicates_and_unknown() {
        let mut graph = graph_with(&["a", "b"]);
        assert!(!graph.add_edge(0, 0, 0.9, SEMANTIC));
        assert!(!graph.add_edge(0, 5, 0.9, SEMANTIC));
        assert!(graph.add_edge(1, 0, 0.9, SEMANTIC));
        assert!(!graph.add_edge(0, 1, 0.4, SEMANTIC));
        assert_eq!(graph.edge_count(), 1);

        let edge = &graph.edges()[0];
        assert_eq!((edge.source.as_str(), edge.target.as_str()), ("a", "b"));
        assert!(graph.has_edge("b", "a"));
    }

    #[test]
    fn test_add_edge_clamps_weight() {
        let mut graph = graph_with(&["a", "b", "c"]);
        graph.add_edge(0, 1, 1.7, SEMANTIC);
        graph.add_edge(0, 2, -0.2, SEMANTIC);
        assert_eq!(graph.edges()[0].weight, 1.0);
        assert_eq!(graph.edges()[1].weight, 0.0);
    }

    #[test]
    fn test_connect_similar_threshold_is_inclusive() {
        let mut graph = graph_with(&["a", "b", "c"]);
        graph.set_embedding("a".into(), vec![1.0, 0.0, 0.0, 0.0]);
        graph.set_embedding("b".into(), vec![1.0, 1.0, 1.0, 1.0]);
        graph.set_embedding("c".into(), vec![0.0, 0.0, 1.0, 0.0]);

        // a·b = 0.5 exactly, a·c = 0, b·c = 0.5
        let created = graph.connect_similar(0.5, cosine_similarity);
        assert_eq!(created, 2);
        assert!(graph.has_edge("a", "b"));
        assert!(graph.has_edge("b", "c"));
        assert!(!graph.has_edge("a", "c"));
        assert!(graph.edges().iter().all(|e| e.similarity_type == SEMANTIC && !e.user_boosted));
    }

    #[test]
    fn test_connect_similar_threshold_not_exact_in_f64() {
        let mut graph = graph_with(&["a", "b"]);
        graph.set_embedding("a".into(), vec![1.0]);
        graph.set_embedding("b".into(), vec![1.0]);
        assert_eq!(graph.connect_similar(0.7, |_, _| 0.7f32), 1);
        assert!((graph.edges()[0].weight - 0.7).abs() < 1e-6);

        let mut below = graph_with(&["a", "b"]);
        below.set_embedding("a".into(), vec![1.0]);
        below.set_embedding("b".into(), vec![1.0]);
        assert_eq!(below.connect_similar(0.7, |_, _| 0.699f32), 0);
    }

    #[test]
    fn test_connect_similar_skips_missing_embeddings() {
        let mut graph = graph_with(&["a", "b"]);
        graph.set_embedding("a".into(), vec![1.0, 0.0]);
        graph.set_embedding("ghost".into(), vec![1.0, 0.0]);
        assert_eq!(graph.connect_similar(0.0, cosine_similarity), 0);
        assert!(graph.embedding("ghost").is_none());
    }

    #[test]
    fn test_boost_incident() {
        let mut graph = graph_with(&["a", "b", "c"]);
        graph.add_edge(0, 1, 0.5, SEMANTIC);
        graph.add_edge(1, 2, 0.95, SEMANTIC);

        graph.boost_incident(1, 1.1);
        assert_eq!(graph.nodes()[1].click_count, 1);
        assert!((graph.edges()[0].weight - 0.55).abs() < 1e-12);
        assert_eq!(graph.edges()[1].weight, 1.0);
        assert!(graph.edges().iter().all(|e| e.user_boosted));
        assert_eq!(graph.nodes()[0].click_count, 0);
    }

    #[test]
    fn test_connectivity() {
        assert!(!KnowledgeGraph::new().is_connected());
        assert!(graph_with(&["solo"]).is_connected());

        let mut graph = graph_with(&["a", "b", "c"]);
        graph.add_edge(0, 1, 0.5, SEMANTIC);
        assert!(!graph.is_connected());
        graph.add_edge(2, 1, 0.5, SEMANTIC);
        assert!(graph.is_connected());
        assert_eq!(graph.degree(1), 2);
        let around_b: Vec<usize> = graph.neighbors(1).map(|(_, n)| n).collect();
        assert_eq!(around_b, vec![0, 2]);
    }
}
