//! File loading for ingestion
//!
//! Supported inputs: PDF (text extraction), JSON arrays of document
//! payloads, and anything else as plain text. Every loaded document is
//! tagged with its source path.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::errors::{ChatError, Result};
use crate::types::{Document, DocumentInput};

/// Load one file into document inputs, dispatching on extension
pub fn load_path(path: &Path) -> Result<Vec<DocumentInput>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let inputs = match extension.as_deref() {
        Some("pdf") => vec![load_pdf(path)?],
        Some("json") => load_json(path)?,
        _ => vec![load_text(path)?],
    };

    debug!(path = %path.display(), count = inputs.len(), "file loaded");
    Ok(inputs)
}

fn source_label(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}

fn load_pdf(path: &Path) -> Result<DocumentInput> {
    let text = pdf_extract::extract_text(path)
        .map_err(|e| ChatError::Validation(format!("cannot extract text from PDF: {}", e)))?;

    if text.trim().is_empty() {
        return Err(ChatError::Validation(format!(
            "no extractable text in {}",
            path.display()
        )));
    }

    let mut doc = Document::new(text);
    doc.set_meta("source", source_label(path));
    Ok(DocumentInput::Document(doc))
}

fn load_text(path: &Path) -> Result<DocumentInput> {
    let text = std::fs::read_to_string(path)?;
    if text.trim().is_empty() {
        return Err(ChatError::Validation(format!(
            "{} is empty",
            path.display()
        )));
    }

    let mut doc = Document::new(text);
    doc.set_meta("source", source_label(path));
    Ok(DocumentInput::Document(doc))
}

/// JSON files carry an array of document payloads in any of the accepted
/// shapes (strings, document-shaped maps, generic objects)
fn load_json(path: &Path) -> Result<Vec<DocumentInput>> {
    let text = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&text)?;

    match value {
        Value::Array(items) => Ok(items.into_iter().map(DocumentInput::from_value).collect()),
        _ => Err(ChatError::Validation(format!(
            "{} must contain a JSON array of documents",
            path.display()
        ))),
    }
}

/// Load the sample-docs fallback file
pub fn load_sample_docs(path: &Path) -> Result<Vec<DocumentInput>> {
    if !path.exists() {
        return Err(ChatError::Validation(format!(
            "sample docs file {} does not exist",
            path.display()
        )));
    }
    load_json(path)
}
