//! Result normalization and schema-guided parsing.
//!
//! The agent's final output is free text that should contain one JSON
//! document shaped `{"results": [...]}`. This module attempts structured
//! extraction against the declared schema and degrades to the preserved raw
//! text when that fails. The raw output is never discarded just because it
//! failed validation.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Value};
use tracing::warn;

use crate::error::{Error, Result};
use crate::llm::Platform;

/// Fixed filename for the structured product artifact.
pub const PRODUCTS_FILE: &str = "products.json";

/// Fixed filename for the raw-text fallback artifact.
pub const RAW_RESULT_FILE: &str = "raw_result.txt";

/// One extracted product: declared field names mapped to values.
pub type ProductRecord = serde_json::Map<String, Value>;

/// The tagged result of attempting structured extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// The agent output parsed and validated against the declared schema
    Structured(Vec<ProductRecord>),
    /// Parsing failed; the raw output is preserved as-is
    Unstructured(String),
}

/// Build the JSON Schema describing the expected `results` document.
///
/// The Google backend rejects free-form schema keys, so it gets a fixed
/// simplified shape without per-field properties.
pub fn results_schema(declared: &[(String, String)], platform: Platform) -> Value {
    let items = if platform == Platform::Google {
        json!({ "type": "object" })
    } else {
        let properties: serde_json::Map<String, Value> = declared
            .iter()
            .map(|(name, description)| (name.clone(), json!({ "description": description })))
            .collect();
        json!({ "type": "object", "properties": properties })
    };
    json!({
        "type": "object",
        "required": ["results"],
        "properties": {
            "results": { "type": "array", "items": items }
        }
    })
}

/// Normalize raw agent output into a [`ParseOutcome`].
///
/// Pure and idempotent: the same input always yields the same outcome, and
/// failures never raise past this boundary.
pub fn normalize(raw: &str, declared: &[(String, String)], platform: Platform) -> ParseOutcome {
    let stripped = strip_code_fences(raw.trim());

    let document = match parse_json_document(&stripped) {
        Ok(document) => document,
        Err(reason) => {
            warn!(%reason, "agent output is not parseable JSON, keeping raw text");
            return ParseOutcome::Unstructured(raw.to_string());
        }
    };

    let schema = results_schema(declared, platform);
    let validator = match jsonschema::validator_for(&schema) {
        Ok(validator) => validator,
        Err(err) => {
            warn!(error = %err, "declared schema is not a valid JSON Schema, keeping raw text");
            return ParseOutcome::Unstructured(raw.to_string());
        }
    };
    if let Err(err) = validator.validate(&document) {
        warn!(error = %err, "agent output failed schema validation, keeping raw text");
        return ParseOutcome::Unstructured(raw.to_string());
    }

    let Some(results) = document.get("results").and_then(Value::as_array) else {
        warn!("agent output has no results array, keeping raw text");
        return ParseOutcome::Unstructured(raw.to_string());
    };

    let mut records = Vec::with_capacity(results.len());
    for entry in results {
        match entry.as_object() {
            Some(record) => records.push(record.clone()),
            None => {
                warn!("results entry is not an object, keeping raw text");
                return ParseOutcome::Unstructured(raw.to_string());
            }
        }
    }
    ParseOutcome::Structured(records)
}

/// Parse text as a JSON document, falling back to the outermost embedded
/// object when the whole text is not valid JSON.
fn parse_json_document(text: &str) -> std::result::Result<Value, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => Ok(value),
        Err(first_err) => {
            if let Some(embedded) = extract_json_object(text) {
                if let Ok(value) = serde_json::from_str::<Value>(embedded) {
                    return Ok(value);
                }
            }
            Err(first_err.to_string())
        }
    }
}

/// Slice out the outermost `{...}` span, if any.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

fn fence_regexes() -> &'static (Regex, Regex) {
    static REGEXES: OnceLock<(Regex, Regex)> = OnceLock::new();
    REGEXES.get_or_init(|| {
        (
            Regex::new(r"^```[^\n]*\n").unwrap(),
            Regex::new(r"\n```\s*$").unwrap(),
        )
    })
}

/// Strip a single leading and trailing fenced-code-block marker.
///
/// Only markers at the very start and very end of the text are removed;
/// fences inside the body stay untouched.
pub fn strip_code_fences(text: &str) -> String {
    let (leading, trailing) = fence_regexes();
    let text = leading.replace(text, "");
    trailing.replace(&text, "").into_owned()
}

/// Write the outcome to its durable artifact and return the path.
///
/// `Structured` goes to [`PRODUCTS_FILE`] as a `{"results": [...]}` JSON
/// document; `Unstructured` goes verbatim to [`RAW_RESULT_FILE`]. The full
/// content is assembled before the single write.
pub fn persist_outcome(outcome: &ParseOutcome, out_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(out_dir).map_err(|source| Error::Artifact {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let (path, content) = match outcome {
        ParseOutcome::Structured(records) => {
            let path = out_dir.join(PRODUCTS_FILE);
            let document = json!({ "results": records });
            let text = serde_json::to_string_pretty(&document).map_err(|e| Error::Artifact {
                path: path.clone(),
                source: std::io::Error::other(e),
            })?;
            (path, text)
        }
        ParseOutcome::Unstructured(raw) => (out_dir.join(RAW_RESULT_FILE), raw.clone()),
    };

    fs::write(&path, content).map_err(|source| Error::Artifact {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
