//! Embedding abstraction and backends.
//!
//! Defines the [`Embedder`] trait (text → fixed-dimension vectors, order
//! preserving) and the [`EmbeddingAdapter`] the graph engine uses to encode
//! every node in one batched call. Concrete backends:
//! - **[`OpenAiEmbedder`]**: the OpenAI embeddings API with retry and backoff.
//! - **[`OllamaEmbedder`]**: a local Ollama instance's `/api/embed` endpoint.
//! - **`LocalEmbedder`**: in-process inference via fastembed
//!   (feature `local-embeddings`); no network calls after model download.
//!
//! Backends are created with [`create_embedder`], which loads the backend and
//! runs a startup encode so a missing model or unreachable service fails at
//! startup rather than on the first rebuild.
//!
//! # Retry Strategy
//!
//! The OpenAI and Ollama backends use exponential backoff for transient errors:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

#[cfg(feature = "local-embeddings")]
mod local;
mod remote;

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::EmbeddingConfig;
use crate::error::GraphError;
use crate::models::ContentItem;

#[cfg(feature = "local-embeddings")]
pub use local::LocalEmbedder;
pub use remote::{OllamaEmbedder, OpenAiEmbedder};

/// Number of content characters included in a node's embedding text.
pub const CONTENT_PREFIX_CHARS: usize = 500;

/// A text-embedding capability.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"all-minilm-l6-v2"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `384`).
    fn dims(&self) -> usize;
    /// Encode a batch of texts, returning one vector per text in input order.
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Similarity between two embedding vectors.
pub type SimilarityFn = fn(&[f32], &[f32]) -> f32;

/// Build the text embedded for an item: title, keywords, then the start of
/// the content.
pub fn composite_text(item: &ContentItem) -> String {
    let prefix: String = item.content.chars().take(CONTENT_PREFIX_CHARS).collect();
    format!("{} {} {}", item.title, item.keywords.join(" "), prefix)
}

/// Batches node texts through an [`Embedder`] and checks the shape of what
/// comes back.
#[derive(Clone)]
pub struct EmbeddingAdapter {
    embedder: Arc<dyn Embedder>,
}

impl EmbeddingAdapter {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    pub fn dims(&self) -> usize {
        self.embedder.dims()
    }

    /// Encode `items` in a single call. Returns `(id, vector)` pairs in input
    /// order.
    pub async fn embed_items<'a, I>(&self, items: I) -> Result<Vec<(String, Vec<f32>)>, GraphError>
    where
        I: IntoIterator<Item = &'a ContentItem>,
    {
        let (ids, texts): (Vec<String>, Vec<String>) = items
            .into_iter()
            .map(|item| (item.id.clone(), composite_text(item)))
            .unzip();
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::info!(
            count = texts.len(),
            model = self.model_name(),
            "generating embeddings"
        );
        let vectors = self
            .embedder
            .encode(&texts)
            .await
            .map_err(GraphError::Embedding)?;

        if vectors.len() != ids.len() {
            return Err(GraphError::VectorCount {
                expected: ids.len(),
                got: vectors.len(),
            });
        }
        let dims = self.dims();
        for (id, vector) in ids.iter().zip(&vectors) {
            if vector.len() != dims {
                return Err(GraphError::Dimension {
                    node_id: id.clone(),
                    expected: dims,
                    got: vector.len(),
                });
            }
        }

        Ok(ids.into_iter().zip(vectors).collect())
    }
}

/// Create the configured [`Embedder`] and verify it with a startup encode.
///
/// | Config Value | Backend |
/// |-------------|----------|
/// | `"local"` | `LocalEmbedder` (requires feature `local-embeddings`) |
/// | `"openai"` | [`OpenAiEmbedder`] |
/// | `"ollama"` | [`OllamaEmbedder`] |
///
/// # Errors
///
/// Unknown provider names, missing configuration or API keys, model load
/// failures, and startup check failures (including a dimension mismatch) are all
/// returned here.
pub async fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match config.provider.as_str() {
        "openai" => Arc::new(OpenAiEmbedder::new(config)?),
        "ollama" => Arc::new(OllamaEmbedder::new(config)?),
        #[cfg(feature = "local-embeddings")]
        "local" => Arc::new(LocalEmbedder::new(config).await?),
        #[cfg(not(feature = "local-embeddings"))]
        "local" => bail!("Local embedding provider requires --features local-embeddings"),
        other => bail!("Unknown embedding provider: {}", other),
    };

    verify(embedder.as_ref()).await?;
    tracing::info!(
        provider = %config.provider,
        model = embedder.model_name(),
        dims = embedder.dims(),
        "embedding backend ready"
    );
    Ok(embedder)
}

/// Encode one short text and check the dimension.
pub async fn verify(embedder: &dyn Embedder) -> Result<()> {
    let vectors = embedder
        .encode(&["embedding check".to_string()])
        .await
        .map_err(|e| e.context(format!("embedding backend '{}' failed its startup check", embedder.model_name())))?;
    match vectors.as_slice() {
        [v] if v.len() == embedder.dims() => Ok(()),
        [v] => bail!(
            "embedding backend '{}' returned {} dimensions, expected {}",
            embedder.model_name(),
            v.len(),
            embedder.dims()
        ),
        other => bail!(
            "embedding backend '{}' returned {} vectors for 1 check text",
            embedder.model_name(),
            other.len()
        ),
    }
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`:
/// - `1.0` = identical direction
/// - `0.0` = orthogonal (unrelated)
/// - `-1.0` = opposite direction
///
/// Returns `0.0` for empty vectors, vectors of different lengths, or a zero
/// vector.
///
/// # Formula
///
/// ```text
///            a · b
/// cos(θ) = ─────────
///          ‖a‖ × ‖b‖
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}
