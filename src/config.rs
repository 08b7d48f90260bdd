//! TOML configuration.
//!
//! Every section is optional; missing keys take the defaults below.
//! [`load_config`] validates ranges so the engine can assume sane values.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GraphConfig {
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    #[serde(default = "default_boost_factor")]
    pub boost_factor: f64,
    #[serde(default = "default_surprise_limit")]
    pub surprise_limit: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            boost_factor: default_boost_factor(),
            surprise_limit: default_surprise_limit(),
        }
    }
}

fn default_similarity_threshold() -> f64 {
    0.3
}
fn default_boost_factor() -> f64 {
    1.1
}
fn default_surprise_limit() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_max_keywords")]
    pub max_keywords: usize,
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,
    #[serde(default = "default_pdf_snippet_chars")]
    pub pdf_snippet_chars: usize,
    #[serde(default = "default_min_pdf_chars")]
    pub min_pdf_chars: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_keywords: default_max_keywords(),
            snippet_chars: default_snippet_chars(),
            pdf_snippet_chars: default_pdf_snippet_chars(),
            min_pdf_chars: default_min_pdf_chars(),
        }
    }
}

fn default_max_keywords() -> usize {
    crate::keywords::DEFAULT_MAX_KEYWORDS
}
fn default_snippet_chars() -> usize {
    200
}
fn default_pdf_snippet_chars() -> usize {
    300
}
fn default_min_pdf_chars() -> usize {
    crate::extract::MIN_PDF_CHARS
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Base URL for the Ollama provider.
    #[serde(default)]
    pub url: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            url: None,
        }
    }
}

fn default_provider() -> String {
    "local".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourcesConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_markdown_globs")]
    pub markdown_globs: Vec<String>,
    #[serde(default = "default_pdf_globs")]
    pub pdf_globs: Vec<String>,
    #[serde(default = "default_link_globs")]
    pub link_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            markdown_globs: default_markdown_globs(),
            pdf_globs: default_pdf_globs(),
            link_globs: default_link_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("./notes")
}
fn default_markdown_globs() -> Vec<String> {
    vec!["**/*.md".to_string(), "**/*.markdown".to_string()]
}
fn default_pdf_globs() -> Vec<String> {
    vec!["**/*.pdf".to_string()]
}
fn default_link_globs() -> Vec<String> {
    vec![
        "**/*links*.json".to_string(),
        "**/*bookmarks*.json".to_string(),
        "**/*links*.csv".to_string(),
    ]
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    config.validate()?;
    Ok(config)
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.graph.similarity_threshold) {
            bail!("graph.similarity_threshold must be in [0.0, 1.0]");
        }
        // Below 1.0 feedback would weaken edges.
        if !self.graph.boost_factor.is_finite() || self.graph.boost_factor < 1.0 {
            bail!("graph.boost_factor must be >= 1.0");
        }
        if self.ingest.max_keywords == 0 {
            bail!("ingest.max_keywords must be > 0");
        }
        if self.ingest.snippet_chars == 0 || self.ingest.pdf_snippet_chars == 0 {
            bail!("ingest snippet lengths must be > 0");
        }
        if self.embedding.batch_size == 0 {
            bail!("embedding.batch_size must be > 0");
        }
        if self.embedding.dims == Some(0) {
            bail!("embedding.dims must be > 0 when set");
        }

        match self.embedding.provider.as_str() {
            "local" | "openai" | "ollama" => {}
            other => bail!(
                "Unknown embedding provider: '{}'. Must be local, openai, or ollama.",
                other
            ),
        }

        if matches!(self.embedding.provider.as_str(), "openai" | "ollama") {
            if self.embedding.model.is_none() {
                bail!(
                    "embedding.model must be specified when provider is '{}'",
                    self.embedding.provider
                );
            }
            if self.embedding.dims.is_none() {
                bail!(
                    "embedding.dims must be specified when provider is '{}'",
                    self.embedding.provider
                );
            }
        }

        Ok(())
    }
}
