//! Ingestion normalizer.
//!
//! Converts raw markdown notes, PDF bytes and saved-link collections into
//! uniform [`ContentItem`]s. Failures are recovered per source: a bad PDF or
//! links payload is logged and skipped while the rest of the batch proceeds.
//!
//! Item ids are content-addressed (`<prefix>_<source>_<hash>`), so
//! re-ingesting unchanged bytes yields the same id.

use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::config::IngestConfig;
use crate::error::ExtractError;
use crate::extract::{clean_pdf_text, extract_pdf_text, pdf_title};
use crate::keywords::{extract_keywords, merge_unique};
use crate::links::{self, LinksPayload};
use crate::markdown;
use crate::models::{ContentItem, NodeType};

/// A markdown note as read from disk or upload.
#[derive(Debug, Clone)]
pub struct MarkdownDoc {
    pub filename: String,
    pub content: String,
}

/// A PDF document's raw bytes.
#[derive(Debug, Clone)]
pub struct PdfDoc {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A named links collection.
#[derive(Debug, Clone)]
pub struct LinksSource {
    pub name: String,
    pub payload: LinksPayload,
}

impl LinksSource {
    pub fn new(name: impl Into<String>, payload: LinksPayload) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

/// Short deterministic digest used in item ids.
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("{:x}", digest)[..8].to_string()
}

fn make_id(node_type: NodeType, source: &str, hash: &str) -> String {
    format!("{}_{}_{}", node_type.id_prefix(), source, hash)
}

/// Keep the first `max` characters, appending `...` when truncated.
pub fn snippet(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Stateless converter from raw sources to [`ContentItem`]s.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: IngestConfig,
}

impl Normalizer {
    pub fn new(config: IngestConfig) -> Self {
        Self { config }
    }

    /// Normalize a batch. Output order: markdown, then PDFs, then links,
    /// each in input order.
    pub fn normalize(
        &self,
        markdown_docs: &[MarkdownDoc],
        pdf_docs: &[PdfDoc],
        links: &[LinksSource],
    ) -> Vec<ContentItem> {
        let mut items = Vec::new();

        for doc in markdown_docs {
            items.push(self.markdown_item(doc));
        }

        for doc in pdf_docs {
            match self.pdf_item(doc) {
                Ok(item) => items.push(item),
                Err(ExtractError::NoText { found, min }) => tracing::warn!(
                    file = %doc.filename,
                    found,
                    min,
                    "could not extract meaningful text from PDF, skipping"
                ),
                Err(e) => tracing::warn!(file = %doc.filename, error = %e, "skipping unreadable PDF"),
            }
        }

        for source in links {
            items.extend(self.link_items(source));
        }

        let inputs = markdown_docs.len() + pdf_docs.len() + links.len();
        if inputs > 0 && items.is_empty() {
            tracing::error!(inputs, "every source in the batch failed to produce an item");
        } else {
            tracing::info!(items = items.len(), "normalized ingestion batch");
        }
        items
    }

    /// Convert one markdown note. Never fails: conversion problems fall back
    /// to naive stripping.
    pub fn markdown_item(&self, doc: &MarkdownDoc) -> ContentItem {
        let hash = content_hash(doc.content.as_bytes());
        let title = markdown::extract_title(&doc.content).unwrap_or_else(|| doc.filename.clone());
        let keywords = extract_keywords(&doc.content, self.config.max_keywords);
        let plain = markdown::to_plain_text(&doc.content);

        tracing::debug!(file = %doc.filename, %title, "processed markdown note");

        ContentItem {
            id: make_id(NodeType::Note, &doc.filename, &hash),
            title,
            snippet: snippet(&plain, self.config.snippet_chars),
            content: plain,
            node_type: NodeType::Note,
            keywords,
            source_file: Some(doc.filename.clone()),
            url: None,
            description: None,
            tags: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Convert one PDF. Errors when neither extraction strategy yields
    /// enough text.
    pub fn pdf_item(&self, doc: &PdfDoc) -> Result<ContentItem, ExtractError> {
        let raw = extract_pdf_text(&doc.bytes, self.config.min_pdf_chars)?;
        let text = clean_pdf_text(&raw);
        let found = text.chars().filter(|c| !c.is_whitespace()).count();
        if found < self.config.min_pdf_chars {
            return Err(ExtractError::NoText {
                found,
                min: self.config.min_pdf_chars,
            });
        }

        let hash = content_hash(&doc.bytes);
        let title = pdf_title(&raw).unwrap_or_else(|| strip_pdf_extension(&doc.filename));
        let keywords = extract_keywords(&text, self.config.max_keywords);

        tracing::debug!(file = %doc.filename, %title, chars = text.len(), "processed PDF");

        Ok(ContentItem {
            id: make_id(NodeType::Pdf, &doc.filename, &hash),
            title,
            snippet: snippet(&text, self.config.pdf_snippet_chars),
            content: text,
            node_type: NodeType::Pdf,
            keywords,
            source_file: Some(doc.filename.clone()),
            url: None,
            description: None,
            tags: Vec::new(),
            created_at: Utc::now(),
        })
    }

    /// Convert a links collection. A malformed payload yields no items.
    pub fn link_items(&self, source: &LinksSource) -> Vec<ContentItem> {
        let records = match source.payload.records() {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(source = %source.name, error = %e, "error processing links data, skipping batch");
                return Vec::new();
            }
        };

        let mut items = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            let Some(link) = links::resolve(record, index) else {
                tracing::warn!(source = %source.name, index, "no URL found in link record, skipping");
                continue;
            };

            let mut keywords = extract_keywords(
                &format!("{} {}", link.title, link.description),
                self.config.max_keywords,
            );
            merge_unique(&mut keywords, link.tags.iter().cloned());

            let content = format!("{}. {}", link.title, link.description)
                .trim()
                .to_string();
            let hash = content_hash(link.url.as_bytes());

            items.push(ContentItem {
                id: make_id(NodeType::Link, &source.name, &hash),
                title: link.title,
                snippet: snippet(&content, self.config.snippet_chars),
                content,
                node_type: NodeType::Link,
                keywords,
                source_file: Some(source.name.clone()),
                url: Some(link.url),
                description: Some(link.description),
                tags: link.tags,
                created_at: Utc::now(),
            });
        }

        tracing::info!(source = %source.name, links = items.len(), "processed links");
        items
    }
}

fn strip_pdf_extension(filename: &str) -> String {
    let len = filename.len();
    if len >= 4 && filename.is_char_boundary(len - 4) && filename[len - 4..].eq_ignore_ascii_case(".pdf") {
        filename[..len - 4].to_string()
    } else {
        filename.to_string()
    }
}
