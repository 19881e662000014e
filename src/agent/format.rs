//! Context-block formatting for grounded generation
//!
//! Documents are rendered as an XML-style block, one element per
//! document with its metadata as attributes, so the model can cite what
//! each passage is.

use serde_json::Value;

use crate::types::Document;

/// Format a single document with its metadata as attributes
pub fn format_doc(doc: &Document) -> String {
    let meta_attrs: String = doc
        .metadata
        .iter()
        .map(|(k, v)| {
            let text = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!(" {}=\"{}\"", k, text)
        })
        .collect();

    format!("<document{}>\n{}\n</document>", meta_attrs, doc.content)
}

/// Format a document list as a single context block.
/// Empty input yields an empty `<documents></documents>` element.
pub fn format_docs(docs: &[Document]) -> String {
    if docs.is_empty() {
        return "<documents></documents>".to_string();
    }

    let formatted: Vec<String> = docs.iter().map(format_doc).collect();
    format!("<documents>\n{}\n</documents>", formatted.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_doc_with_metadata() {
        let mut doc = Document::new("Hello");
        doc.set_meta("source", "test.pdf");
        doc.set_meta("page", 1);

        let result = format_doc(&doc);
        assert!(result.starts_with("<document"));
        assert!(result.contains("source=\"test.pdf\""));
        assert!(result.contains("page=\"1\""));
        assert!(result.contains("Hello"));
    }

    #[test]
    fn test_format_docs_empty() {
        assert_eq!(format_docs(&[]), "<documents></documents>");
    }

    #[test]
    fn test_format_docs_wraps_all() {
        let docs = vec![Document::new("Doc 1"), Document::new("Doc 2")];
        let result = format_docs(&docs);
        assert!(result.starts_with("<documents>"));
        assert!(result.contains("Doc 1"));
        assert!(result.contains("Doc 2"));
        assert!(result.ends_with("</documents>"));
    }
}
