//! Final-Pass Reconciler.
//!
//! At stream end the whole buffer is parsed as one document. This catches
//! objects the incremental matchers could not see (other key orders, edges
//! with nested fields, ...). Records are classified with the same rules as
//! the incremental path and handed back to the session, which skips any id
//! it already processed.

use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

use crate::graph::{Edge, Node, looks_like_edge};

/// A record recovered from the final document.
#[derive(Debug, Clone, PartialEq)]
pub enum FinalRecord {
    Node(Node),
    Edge(Edge),
}

#[derive(Debug, Default, Deserialize)]
struct FinalDocument {
    #[serde(default)]
    nodes: Vec<Value>,
    #[serde(default)]
    edges: Vec<Value>,
}

/// Parse the full buffer and classify its records, nodes before edges.
///
/// # Errors
///
/// Returns the decode error message when no JSON document can be recovered.
pub fn final_records(buffer: &str) -> Result<Vec<FinalRecord>, String> {
    let doc = parse_document(buffer)?;
    let mut records = Vec::with_capacity(doc.nodes.len() + doc.edges.len());

    for raw in &doc.nodes {
        let is_edge = raw.as_object().is_some_and(looks_like_edge);
        let record = if is_edge {
            Edge::from_value(raw).map(FinalRecord::Edge)
        } else {
            Node::from_value(raw).map(FinalRecord::Node)
        };
        match record {
            Ok(record) => records.push(record),
            Err(e) => trace!(error = %e, "extract: final pass skipped node entry"),
        }
    }
    for raw in &doc.edges {
        match Edge::from_value(raw) {
            Ok(edge) => records.push(FinalRecord::Edge(edge)),
            Err(e) => trace!(error = %e, "extract: final pass skipped edge entry"),
        }
    }
    Ok(records)
}

fn parse_document(buffer: &str) -> Result<FinalDocument, String> {
    let stripped = strip_wrapping(buffer);
    let first_err = match serde_json::from_str::<FinalDocument>(stripped) {
        Ok(doc) => return Ok(doc),
        Err(e) => e.to_string(),
    };

    // Prose around the document: retry on the outermost braces.
    if let (Some(open), Some(close)) = (stripped.find('{'), stripped.rfind('}')) {
        if open < close && (open > 0 || close + 1 < stripped.len()) {
            if let Ok(doc) = serde_json::from_str::<FinalDocument>(&stripped[open..=close]) {
                return Ok(doc);
            }
        }
    }
    Err(first_err)
}

/// Remove surrounding whitespace and Markdown code fences.
#[must_use]
pub fn strip_wrapping(buffer: &str) -> &str {
    let mut text = buffer.trim();
    if let Some(rest) = text.strip_prefix("```") {
        // Drop the optional language tag on the fence line.
        text = match rest.find('\n') {
            Some(newline) if !rest[..newline].contains('{') => &rest[newline + 1..],
            _ => rest,
        };
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

#[cfg(test)]
#[path = "reconcile_test.rs"]
mod tests;
