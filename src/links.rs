//! Saved-link collections: JSON arrays/objects or header-keyed CSV.
//!
//! Every record is read as a string-keyed map and fields are resolved by
//! ordered alias rules, so exports from different bookmark tools work without
//! per-tool schemas.

use serde_json::{Map, Value};

use crate::error::LinksError;

/// Field aliases for the link URL, highest priority first.
pub const URL_FIELDS: &[&str] = &["url", "link", "href", "URL"];
/// Field aliases for the link title.
pub const TITLE_FIELDS: &[&str] = &["title", "name", "description"];
/// Field aliases for the free-text description.
pub const DESCRIPTION_FIELDS: &[&str] = &["description", "notes", "content"];

/// A generic link record.
pub type LinkRecord = Map<String, Value>;

/// Raw links payload as handed to the normalizer.
#[derive(Debug, Clone)]
pub enum LinksPayload {
    /// Already-parsed JSON: an array of objects or a single object.
    Json(Value),
    /// CSV text with a header row.
    Csv(String),
}

impl LinksPayload {
    /// Interpret file contents by extension: `.csv` is kept as text,
    /// anything else is parsed as JSON.
    pub fn from_file(name: &str, bytes: &[u8]) -> Result<Self, LinksError> {
        if name.to_ascii_lowercase().ends_with(".csv") {
            Ok(LinksPayload::Csv(String::from_utf8_lossy(bytes).into_owned()))
        } else {
            Ok(LinksPayload::Json(serde_json::from_slice(bytes)?))
        }
    }

    /// Split the payload into records. Non-object entries of a JSON array
    /// are dropped with a warning; a payload of the wrong shape is an error.
    pub fn records(&self) -> Result<Vec<LinkRecord>, LinksError> {
        match self {
            LinksPayload::Json(Value::Array(entries)) => Ok(entries
                .iter()
                .enumerate()
                .filter_map(|(i, entry)| match entry {
                    Value::Object(map) => Some(map.clone()),
                    other => {
                        tracing::warn!(index = i, kind = json_kind(other), "skipping non-object link entry");
                        None
                    }
                })
                .collect()),
            LinksPayload::Json(Value::Object(map)) => Ok(vec![map.clone()]),
            LinksPayload::Json(other) => Err(LinksError::UnexpectedShape(json_kind(other))),
            LinksPayload::Csv(text) => csv_records(text),
        }
    }
}

fn csv_records(text: &str) -> Result<Vec<LinkRecord>, LinksError> {
    // Rows may be shorter or longer than the header; missing cells are
    // absent fields and extra cells are ignored.
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let record: LinkRecord = headers
            .iter()
            .zip(row.iter())
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect();
        records.push(record);
    }
    Ok(records)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Read a field as non-empty text. Numbers and booleans are stringified.
fn field_text(record: &LinkRecord, key: &str) -> Option<String> {
    let text = match record.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// First alias in `keys` with a non-empty value.
pub fn first_field(record: &LinkRecord, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| field_text(record, key))
}

/// Last non-empty path segment of a URL, ignoring a trailing slash, query
/// and fragment. The host never counts as a segment.
pub fn last_url_segment(url: &str) -> Option<String> {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let (_, path) = rest.split_once('/')?;
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Resolved fields of one link record.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLink {
    pub url: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

/// Resolve a record through the alias rules. `None` when no URL is present.
pub fn resolve(record: &LinkRecord, index: usize) -> Option<ResolvedLink> {
    let url = first_field(record, URL_FIELDS)?;
    let title = first_field(record, TITLE_FIELDS)
        .or_else(|| last_url_segment(&url))
        .unwrap_or_else(|| format!("Link {}", index + 1));
    let description = first_field(record, DESCRIPTION_FIELDS).unwrap_or_default();
    let tags = tags(record);

    Some(ResolvedLink {
        url,
        title,
        description,
        tags,
    })
}

fn tags(record: &LinkRecord) -> Vec<String> {
    match record.get("tags") {
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
