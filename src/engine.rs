//! Graph construction engine.
//!
//! [`GraphEngine`] owns the current [`KnowledgeGraph`] and is the only
//! writer. The graph lives behind `RwLock<Arc<KnowledgeGraph>>`:
//!
//! - Readers take a short read lock, clone the `Arc` and work on that
//!   snapshot, so they observe either the previous or the rebuilt graph.
//! - [`GraphEngine::rebuild`] builds a complete new graph off to the side,
//!   including the batched embedding call, and installs it with a single
//!   pointer swap. If embedding fails nothing is swapped.
//! - Feedback and [`GraphEngine::clear`] mutate under the write lock.
//!
//! Rebuilds are serialized with an async mutex so two batches cannot
//! interleave their swaps.

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::config::GraphConfig;
use crate::embedding::{cosine_similarity, Embedder, EmbeddingAdapter, SimilarityFn};
use crate::error::Result;
use crate::graph::KnowledgeGraph;
use crate::models::ContentItem;

/// Counts reported by a successful rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RebuildSummary {
    pub nodes_created: usize,
    pub edges_created: usize,
}

pub struct GraphEngine {
    adapter: EmbeddingAdapter,
    similarity: SimilarityFn,
    pub(crate) config: GraphConfig,
    pub(crate) graph: RwLock<Arc<KnowledgeGraph>>,
    rebuild_lock: Mutex<()>,
}

impl GraphEngine {
    /// Create an engine using cosine similarity. The embedder should already
    /// have been verified (see [`crate::embedding::create_embedder`]).
    pub fn new(embedder: Arc<dyn Embedder>, config: GraphConfig) -> Self {
        Self::with_similarity(embedder, config, cosine_similarity)
    }

    pub fn with_similarity(
        embedder: Arc<dyn Embedder>,
        config: GraphConfig,
        similarity: SimilarityFn,
    ) -> Self {
        Self {
            adapter: EmbeddingAdapter::new(embedder),
            similarity,
            config,
            graph: RwLock::new(Arc::new(KnowledgeGraph::new())),
            rebuild_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Replace the graph with one built from `items`.
    ///
    /// Every item becomes a node (later duplicates of an id overwrite earlier
    /// ones), all nodes are embedded in one batch, and every pair at or above
    /// the similarity threshold is connected. On error the current graph is
    /// left untouched.
    pub async fn rebuild(&self, items: Vec<ContentItem>) -> Result<RebuildSummary> {
        let _serial = self.rebuild_lock.lock().await;
        let started = Instant::now();

        let mut graph = KnowledgeGraph::new();
        for item in items {
            graph.insert_node(item);
        }

        let vectors = self
            .adapter
            .embed_items(graph.nodes().iter().map(|node| &node.item))
            .await
            .inspect_err(|e| tracing::error!(error = %e, "rebuild aborted, keeping previous graph"))?;
        for (id, vector) in vectors {
            graph.set_embedding(id, vector);
        }

        let edges_created = graph.connect_similar(self.config.similarity_threshold, self.similarity);
        let summary = RebuildSummary {
            nodes_created: graph.node_count(),
            edges_created,
        };
        graph.touch();

        *self.graph.write() = Arc::new(graph);

        tracing::info!(
            nodes = summary.nodes_created,
            edges = summary.edges_created,
            threshold = self.config.similarity_threshold,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "graph rebuilt"
        );
        Ok(summary)
    }

    /// The current graph. Later mutations do not affect a snapshot already
    /// handed out.
    pub fn snapshot(&self) -> Arc<KnowledgeGraph> {
        self.graph.read().clone()
    }

    /// Drop all nodes, edges and cached embeddings.
    pub fn clear(&self) {
        *self.graph.write() = Arc::new(KnowledgeGraph::new());
        tracing::info!("graph cleared");
    }
}
