//! # Adaptive Knowledge Graph CLI (`akg`)
//!
//! Scans a folder of notes, PDFs and saved links, builds a similarity graph
//! in memory and prints views of it as JSON.
//!
//! ## Usage
//!
//! ```bash
//! akg --config ./config/akg.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `akg sources` | List the files that would be ingested |
//! | `akg build` | Ingest and build the graph, print counts |
//! | `akg graph` | Print all nodes and edges |
//! | `akg stats` | Print aggregate statistics |
//! | `akg connections <id>` | Print a node's neighbors, strongest first |
//! | `akg surprising` | Print the most surprising connections |
//! | `akg feedback <id>` | Record interactions and print updated neighbors |
//!
//! The graph is not persisted: every command rebuilds it from the sources.
//! Logs go to stderr; stdout carries only JSON.

use adaptive_kg::config::{self, Config};
use adaptive_kg::connector_fs::{scan_sources, SourceBundle};
use adaptive_kg::embedding::create_embedder;
use adaptive_kg::engine::GraphEngine;
use adaptive_kg::graph::KnowledgeGraph;
use adaptive_kg::ingest::Normalizer;
use adaptive_kg::models::Interaction;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Adaptive knowledge graph over personal notes, documents and links.
#[derive(Parser)]
#[command(name = "akg", version)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/akg.toml`. When the default file is absent the
    /// built-in defaults are used.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the markdown, PDF and links files found under `sources.root`.
    Sources,

    /// Ingest all sources and build the graph.
    Build,

    /// Print every node and edge.
    Graph,

    /// Print aggregate graph statistics.
    Stats,

    /// Print the neighbors of a node, strongest first.
    Connections {
        /// Node id (e.g. `md_notes/garden.md_1a2b3c4d`).
        id: String,
    },

    /// Print edges ranked by surprise score.
    Surprising {
        /// Maximum number of connections (defaults to `graph.surprise_limit`).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Record interactions with a node and print its updated neighbors.
    Feedback {
        /// Node id.
        id: String,

        /// Number of interactions to record.
        #[arg(long, default_value_t = 1)]
        times: u32,

        /// Interaction kind (e.g. `click`, `view`).
        #[arg(long, default_value = "click")]
        kind: String,

        /// Interaction duration in seconds.
        #[arg(long)]
        duration: Option<f64>,
    },
}

/// Result of `akg build`.
#[derive(Debug, Serialize)]
struct IngestReport {
    files_scanned: usize,
    items_processed: usize,
    nodes_created: usize,
    edges_created: usize,
}

#[derive(Serialize)]
struct SourceListing<'a> {
    markdown: Vec<&'a str>,
    pdfs: Vec<&'a str>,
    links: Vec<&'a str>,
}

const DEFAULT_CONFIG: &str = "./config/akg.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_directive = if cli.verbose {
        "akg=debug,adaptive_kg=debug"
    } else {
        "akg=info,adaptive_kg=info"
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive.into()))
        .init();

    let cfg = load(cli.config.as_deref())?;
    let sources = scan_sources(&cfg.sources)?;
    if sources.is_empty() {
        tracing::warn!(
            root = %cfg.sources.root.display(),
            "no markdown, PDF or links files found"
        );
    }

    if let Commands::Sources = cli.command {
        return print_json(&SourceListing {
            markdown: sources.markdown.iter().map(|d| d.filename.as_str()).collect(),
            pdfs: sources.pdfs.iter().map(|d| d.filename.as_str()).collect(),
            links: sources.links.iter().map(|l| l.name.as_str()).collect(),
        });
    }

    let (engine, report) = build(&cfg, &sources).await?;

    match cli.command {
        Commands::Sources => Ok(()),
        Commands::Build => print_json(&report),
        Commands::Graph => print_json(&engine.get_graph()),
        Commands::Stats => print_json(&engine.get_stats()),
        Commands::Connections { id } => {
            require_node(&engine.snapshot(), &id)?;
            print_json(&engine.node_connections(&id))
        }
        Commands::Surprising { limit } => {
            let limit = limit.unwrap_or(engine.config().surprise_limit);
            print_json(&engine.surprising_connections(limit))
        }
        Commands::Feedback {
            id,
            times,
            kind,
            duration,
        } => {
            require_node(&engine.snapshot(), &id)?;
            let mut connections = engine.node_connections(&id);
            for _ in 0..times {
                let mut interaction = Interaction::new(kind.as_str());
                if let Some(seconds) = duration {
                    interaction = interaction.with_duration(seconds);
                }
                match engine.record_interaction(&id, interaction) {
                    Some(updated) => connections = updated,
                    None => bail!("Node not found: {}", id),
                }
            }
            print_json(&connections)
        }
    }
}

fn load(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => config::load_config(path),
        None if Path::new(DEFAULT_CONFIG).exists() => config::load_config(Path::new(DEFAULT_CONFIG)),
        None => {
            tracing::info!("no config file at {}, using defaults", DEFAULT_CONFIG);
            Ok(Config::default())
        }
    }
}

async fn build(cfg: &Config, sources: &SourceBundle) -> Result<(GraphEngine, IngestReport)> {
    let embedder = create_embedder(&cfg.embedding)
        .await
        .context("Failed to initialize embedding backend")?;
    let engine = GraphEngine::new(embedder, cfg.graph.clone());

    let items = Normalizer::new(cfg.ingest.clone()).normalize(&sources.markdown, &sources.pdfs, &sources.links);
    let items_processed = items.len();
    let summary = engine.rebuild(items).await?;

    Ok((
        engine,
        IngestReport {
            files_scanned: sources.file_count(),
            items_processed,
            nodes_created: summary.nodes_created,
            edges_created: summary.edges_created,
        },
    ))
}

/// Fail with "Node not found" unless `id` is in the graph.
fn require_node(graph: &KnowledgeGraph, id: &str) -> Result<()> {
    if graph.node(id).is_none() {
        bail!("Node not found: {}", id);
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
