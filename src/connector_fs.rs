//! Filesystem source scan.
//!
//! Walks `sources.root` and sorts files into markdown notes, PDFs and links
//! collections by glob. Paths are matched relative to the root; the same
//! relative path (with `/` separators) becomes the item's source name.
//!
//! A file matching several classes is taken as links first, then PDF, then
//! markdown. Unreadable files are logged and skipped.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use walkdir::WalkDir;

use crate::config::SourcesConfig;
use crate::ingest::{LinksSource, MarkdownDoc, PdfDoc};
use crate::links::LinksPayload;

const DEFAULT_EXCLUDES: &[&str] = &["**/.git/**", "**/target/**", "**/node_modules/**"];

/// Everything found under the source root, each list sorted by path.
#[derive(Debug, Default)]
pub struct SourceBundle {
    pub markdown: Vec<MarkdownDoc>,
    pub pdfs: Vec<PdfDoc>,
    pub links: Vec<LinksSource>,
}

impl SourceBundle {
    pub fn is_empty(&self) -> bool {
        self.markdown.is_empty() && self.pdfs.is_empty() && self.links.is_empty()
    }

    pub fn file_count(&self) -> usize {
        self.markdown.len() + self.pdfs.len() + self.links.len()
    }
}

pub fn scan_sources(config: &SourcesConfig) -> Result<SourceBundle> {
    let root = &config.root;
    if !root.exists() {
        bail!("Source root does not exist: {}", root.display());
    }

    let markdown_set = build_globset(&config.markdown_globs)?;
    let pdf_set = build_globset(&config.pdf_globs)?;
    let links_set = build_globset(&config.link_globs)?;

    let mut excludes: Vec<String> = DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();
    excludes.extend(config.exclude_globs.iter().cloned());
    let exclude_set = build_globset(&excludes)?;

    let mut bundle = SourceBundle::default();

    let walker = WalkDir::new(root)
        .follow_links(config.follow_symlinks)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if exclude_set.is_match(&rel_str) {
            continue;
        }

        if links_set.is_match(&rel_str) {
            if let Some(source) = read_links(path, &rel_str) {
                bundle.links.push(source);
            }
        } else if pdf_set.is_match(&rel_str) {
            match std::fs::read(path) {
                Ok(bytes) => bundle.pdfs.push(PdfDoc {
                    filename: rel_str,
                    bytes,
                }),
                Err(e) => tracing::warn!(file = %rel_str, error = %e, "failed to read PDF, skipping"),
            }
        } else if markdown_set.is_match(&rel_str) {
            match std::fs::read_to_string(path) {
                Ok(content) => bundle.markdown.push(MarkdownDoc {
                    filename: rel_str,
                    content,
                }),
                Err(e) => tracing::warn!(file = %rel_str, error = %e, "markdown file is not readable UTF-8, skipping"),
            }
        }
    }

    bundle.markdown.sort_by(|a, b| a.filename.cmp(&b.filename));
    bundle.pdfs.sort_by(|a, b| a.filename.cmp(&b.filename));
    bundle.links.sort_by(|a, b| a.name.cmp(&b.name));

    tracing::info!(
        root = %root.display(),
        markdown = bundle.markdown.len(),
        pdfs = bundle.pdfs.len(),
        links = bundle.links.len(),
        "scanned sources"
    );
    Ok(bundle)
}

fn read_links(path: &Path, name: &str) -> Option<LinksSource> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(file = %name, error = %e, "failed to read links file, skipping");
            return None;
        }
    };
    match LinksPayload::from_file(name, &bytes) {
        Ok(payload) => Some(LinksSource::new(name, payload)),
        Err(e) => {
            tracing::error!(file = %name, error = %e, "error processing links data, skipping file");
            None
        }
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
