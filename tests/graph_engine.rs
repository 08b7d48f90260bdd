//! Graph engine tests through the public API, using a table-driven embedder
//! so edge weights are known exactly.

use adaptive_kg::config::GraphConfig;
use adaptive_kg::embedding::Embedder;
use adaptive_kg::engine::GraphEngine;
use adaptive_kg::error::GraphError;
use adaptive_kg::models::{ContentItem, Interaction, NodeType, SEMANTIC};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

/// Looks up each text's first word in a table. Unknown words embed to a
/// zero vector; the word `poison` fails the whole batch.
struct TableEmbedder {
    vectors: HashMap<&'static str, Vec<f32>>,
    delay: Option<Duration>,
}

impl TableEmbedder {
    fn new(entries: &[(&'static str, [f32; 4])]) -> Self {
        Self {
            vectors: entries.iter().map(|(k, v)| (*k, v.to_vec())).collect(),
            delay: None,
        }
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Embedder for TableEmbedder {
    fn model_name(&self) -> &str {
        "table"
    }

    fn dims(&self) -> usize {
        4
    }

    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        texts
            .iter()
            .map(|text| {
                let word = text.split_whitespace().next().unwrap_or_default();
                if word == "poison" {
                    return Err(anyhow!("cannot embed poison"));
                }
                Ok(self.vectors.get(word).cloned().unwrap_or_else(|| vec![0.0; 4]))
            })
            .collect()
    }
}

// cos(a, b) = 0.5, cos(a, e) = 0.2, cos(b, e) = 0.9
fn table() -> TableEmbedder {
    TableEmbedder::new(&[
        ("a", [1.0, 0.0, 0.0, 0.0]),
        ("b", [1.0, 1.0, 1.0, 1.0]),
        ("e", [1.0, 2.0, 2.0, 4.0]),
        ("z", [0.0, 0.0, 0.0, 1.0]),
    ])
}

fn item(id: &str, title: &str, node_type: NodeType, keywords: &[&str]) -> ContentItem {
    ContentItem {
        id: id.to_string(),
        title: title.to_string(),
        content: format!("{} content", title),
        snippet: String::new(),
        node_type,
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        source_file: None,
        url: None,
        description: None,
        tags: Vec::new(),
        created_at: Utc::now(),
    }
}

fn note(id: &str, title: &str) -> ContentItem {
    item(id, title, NodeType::Note, &[])
}

fn engine_with_threshold(threshold: f64) -> GraphEngine {
    GraphEngine::new(
        Arc::new(table()),
        GraphConfig {
            similarity_threshold: threshold,
            ..GraphConfig::default()
        },
    )
}

#[tokio::test]
async fn test_threshold_is_inclusive() {
    let engine = engine_with_threshold(0.5);
    let summary = engine
        .rebuild(vec![note("n1", "a"), note("n2", "b"), note("n3", "e")])
        .await
        .unwrap();
    assert_eq!(summary.nodes_created, 3);
    assert_eq!(summary.edges_created, 2);

    let graph = engine.snapshot();
    assert!(graph.has_edge("n1", "n2"), "exactly at threshold");
    assert!(graph.has_edge("n2", "n3"));
    assert!(!graph.has_edge("n1", "n3"), "strictly below threshold");

    let edge = &graph.edges()[0];
    assert_eq!(edge.similarity_type, SEMANTIC);
    assert!(!edge.user_boosted);
    assert!((edge.weight - 0.5).abs() < 1e-6);
}

#[tokio::test]
async fn test_threshold_inclusive_for_inexact_float() {
    // 0.7 has no exact binary form; the f32 score must still meet the
    // configured f64 threshold of the same decimal value.
    let engine = GraphEngine::with_similarity(
        Arc::new(table()),
        GraphConfig {
            similarity_threshold: 0.7,
            ..GraphConfig::default()
        },
        |_, _| 0.7f32,
    );
    let summary = engine
        .rebuild(vec![note("n1", "a"), note("n2", "b")])
        .await
        .unwrap();
    assert_eq!(summary.edges_created, 1);
    assert!((engine.get_graph().edges[0].weight - 0.7).abs() < 1e-6);
}

#[tokio::test]
async fn test_simple_graph_invariants() {
    let engine = engine_with_threshold(0.0);
    engine
        .rebuild(vec![
            note("n1", "a"),
            note("n2", "b"),
            note("n3", "e"),
            note("n4", "b"),
            note("n1", "a"),
        ])
        .await
        .unwrap();

    let view = engine.get_graph();
    assert_eq!(view.total_nodes, 4);
    assert_eq!(view.total_edges, view.edges.len());

    let ids: BTreeSet<&str> = view.nodes.iter().map(|n| n.id()).collect();
    let mut pairs = BTreeSet::new();
    for edge in &view.edges {
        assert_ne!(edge.source, edge.target);
        assert!(ids.contains(edge.source.as_str()) && ids.contains(edge.target.as_str()));
        assert!((0.0..=1.0).contains(&edge.weight));
        let pair = if edge.source < edge.target {
            (edge.source.clone(), edge.target.clone())
        } else {
            (edge.target.clone(), edge.source.clone())
        };
        assert!(pairs.insert(pair), "duplicate edge");
    }
    // n1/n3 at 0.2 plus every other pair.
    assert_eq!(view.total_edges, 6);
}

#[tokio::test]
async fn test_duplicate_id_overwrites() {
    let engine = engine_with_threshold(0.3);
    let summary = engine
        .rebuild(vec![note("same", "a"), note("other", "z"), note("same", "b")])
        .await
        .unwrap();
    assert_eq!(summary.nodes_created, 2);

    let graph = engine.snapshot();
    assert_eq!(graph.node("same").unwrap().title(), "b");
    // b–z = 0.5, a–z would have been 0.
    assert!(graph.has_edge("same", "other"));
}

#[tokio::test]
async fn test_feedback_weights_are_bounded_and_monotonic() {
    let engine = engine_with_threshold(0.3);
    engine
        .rebuild(vec![note("n1", "a"), note("n2", "b"), note("n3", "e")])
        .await
        .unwrap();

    let mut previous: HashMap<String, f64> = engine
        .node_connections("n2")
        .into_iter()
        .map(|c| (c.target_node_id, c.weight))
        .collect();
    assert_eq!(previous.len(), 2);

    for round in 1..=30 {
        let connections = engine
            .record_interaction("n2", Interaction::new("click"))
            .unwrap();
        for c in connections {
            assert!(c.user_boosted);
            assert!(c.weight <= 1.0);
            assert!(c.weight >= previous[&c.target_node_id]);
            previous.insert(c.target_node_id, c.weight);
        }
        assert_eq!(engine.snapshot().node("n2").unwrap().click_count, round);
    }
    assert!(previous.values().all(|&w| w == 1.0));

    let first = engine.node_connections("n1");
    assert!((first[0].weight - 1.0).abs() < 1e-12);
}

#[tokio::test]
async fn test_single_boost_multiplies_weight() {
    let engine = engine_with_threshold(0.5);
    engine
        .rebuild(vec![note("n1", "a"), note("n2", "b")])
        .await
        .unwrap();
    let before = engine.node_connections("n1")[0].weight;

    let after = engine
        .record_interaction("n1", Interaction::default())
        .unwrap();
    assert!((after[0].weight - before * 1.1).abs() < 1e-9);
}

#[tokio::test]
async fn test_feedback_on_isolated_and_unknown_nodes() {
    let engine = engine_with_threshold(0.6);
    engine
        .rebuild(vec![note("lonely", "a"), note("n2", "b"), note("n3", "e")])
        .await
        .unwrap();
    let edges_before = engine.get_graph().edges;

    let connections = engine
        .record_interaction("lonely", Interaction::new("view").with_duration(3.0))
        .unwrap();
    assert!(connections.is_empty());
    assert_eq!(engine.snapshot().node("lonely").unwrap().click_count, 1);
    assert_eq!(engine.get_graph().edges, edges_before);

    assert!(engine.record_interaction("ghost", Interaction::default()).is_none());
    assert_eq!(engine.get_stats().total_clicks, 1);
}

#[tokio::test]
async fn test_cross_type_surprise() {
    let engine = engine_with_threshold(0.5);
    engine
        .rebuild(vec![
            item("note", "a", NodeType::Note, &["garden", "soil"]),
            item("paper", "b", NodeType::Pdf, &["quantum"]),
        ])
        .await
        .unwrap();

    let top = engine.surprising_connections(5);
    assert_eq!(top.len(), 1);
    assert!((top[0].surprise_score - 0.6).abs() < 1e-6);
    assert!(top[0].overlapping_keywords.is_empty());
    assert_eq!(top[0].source_type, NodeType::Note);
    assert_eq!(top[0].target_type, NodeType::Pdf);
}

#[tokio::test]
async fn test_stats_after_rebuild() {
    let engine = engine_with_threshold(0.5);
    engine
        .rebuild(vec![
            item("n1", "a", NodeType::Note, &[]),
            item("n2", "b", NodeType::Link, &[]),
            item("n3", "e", NodeType::Pdf, &[]),
        ])
        .await
        .unwrap();

    let stats = engine.get_stats();
    assert_eq!(stats.total_nodes, 3);
    assert_eq!(stats.total_edges, 2);
    assert!((stats.density - 2.0 / 3.0).abs() < 1e-12);
    assert!(stats.is_connected);
    assert_eq!(stats.node_types.len(), 3);
    assert_eq!(stats.most_connected_nodes[0].node_id, "n2");
    assert_eq!(stats.most_connected_nodes[0].centrality, 1.0);

    let weights = stats.edge_weights.unwrap();
    assert!((weights.min - 0.5).abs() < 1e-6);
    assert!((weights.max - 0.9).abs() < 1e-6);

    engine.clear();
    let cleared = engine.get_stats();
    assert_eq!(cleared.total_nodes, 0);
    assert!(!cleared.is_connected);
    assert!(engine.snapshot().embedding("n1").is_none());
}

#[tokio::test]
async fn test_failed_rebuild_preserves_graph() {
    let engine = engine_with_threshold(0.3);
    engine
        .rebuild(vec![note("n1", "a"), note("n2", "b")])
        .await
        .unwrap();
    engine.record_interaction("n1", Interaction::default());
    let before = engine.get_graph();

    let err = engine
        .rebuild(vec![note("n9", "poison")])
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::Embedding(_)));

    let after = engine.get_graph();
    assert_eq!(after.nodes, before.nodes);
    assert_eq!(after.edges, before.edges);
    assert_eq!(after.last_updated, before.last_updated);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_never_see_partial_rebuild() {
    let engine = Arc::new(GraphEngine::new(
        Arc::new(table().slow(Duration::from_millis(50))),
        GraphConfig::default(),
    ));
    engine
        .rebuild(vec![note("old1", "a"), note("old2", "b")])
        .await
        .unwrap();

    let old: BTreeSet<String> = ["old1", "old2"].iter().map(|s| s.to_string()).collect();
    let new: BTreeSet<String> = ["new1", "new2", "new3"].iter().map(|s| s.to_string()).collect();

    let writer = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            engine
                .rebuild(vec![note("new1", "a"), note("new2", "b"), note("new3", "e")])
                .await
        })
    };

    let mut readers = Vec::new();
    for _ in 0..4 {
        let engine = Arc::clone(&engine);
        let (old, new) = (old.clone(), new.clone());
        readers.push(tokio::spawn(async move {
            let mut saw_new = false;
            for _ in 0..200 {
                let view = engine.get_graph();
                let ids: BTreeSet<String> = view.nodes.iter().map(|n| n.id().to_string()).collect();
                assert!(ids == old || ids == new, "partial graph observed: {:?}", ids);
                for edge in &view.edges {
                    assert!(ids.contains(&edge.source) && ids.contains(&edge.target));
                }
                saw_new |= ids == new;
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            saw_new
        }));
    }

    let summary = writer.await.unwrap().unwrap();
    assert_eq!(summary.nodes_created, 3);
    let mut saw_new = false;
    for reader in readers {
        saw_new |= reader.await.unwrap();
    }
    assert!(saw_new);
    assert_eq!(engine.get_graph().total_nodes, 3);
}
