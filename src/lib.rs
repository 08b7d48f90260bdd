//! # Adaptive Knowledge Graph
//!
//! Builds an in-memory graph over personal content (markdown notes, PDFs,
//! saved links) whose edges are semantic-similarity relationships, and
//! strengthens those edges as the user interacts with nodes.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌────────────┐   ┌──────────────┐
//! │   Sources   │──▶│ Normalizer │──▶│ GraphEngine  │◀── Embedder
//! │ md/pdf/link │   │ ContentItem│   │ rebuild/swap │
//! └─────────────┘   └────────────┘   └──────┬───────┘
//!                                           │ snapshot
//!                           ┌───────────────┼───────────────┐
//!                           ▼               ▼               ▼
//!                      ┌─────────┐    ┌──────────┐    ┌──────────┐
//!                      │  query  │    │  stats   │    │ feedback │
//!                      └─────────┘    └──────────┘    └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! akg sources                  # list files found under sources.root
//! akg build                    # ingest and report node/edge counts
//! akg stats
//! akg surprising --limit 10
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`connector_fs`] | Filesystem source scan |
//! | [`ingest`] | Ingestion normalizer |
//! | [`markdown`] | Markdown title and plain-text conversion |
//! | [`extract`] | PDF text extraction |
//! | [`links`] | Links payload parsing |
//! | [`keywords`] | Keyword extraction |
//! | [`embedding`] | Embedding backends and adapter |
//! | [`graph`] | Node/edge store |
//! | [`engine`] | Graph construction and snapshots |
//! | [`feedback`] | Adaptive edge weighting |
//! | [`query`] | Graph views, connections, surprising edges |
//! | [`stats`] | Aggregate statistics |
//! | [`error`] | Error types |

pub mod config;
pub mod connector_fs;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod extract;
pub mod feedback;
pub mod graph;
pub mod ingest;
pub mod keywords;
pub mod links;
pub mod markdown;
pub mod models;
pub mod query;
pub mod stats;
