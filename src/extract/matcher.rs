//! Node and edge candidate matchers over the accumulated model output.
//!
//! Nodes nest (`data` is an object), so only their opening is matched here
//! and the session hands the offset to the balanced-object scanner. Edges are
//! flat, so a bounded match captures the whole object at once.
//!
//! Key order is fixed (`id` first, then `type`/`data` or `source`/`target`);
//! whitespace between tokens is tolerated since models often pretty-print.
//! Objects in any other key order are left to the final pass.

use std::sync::LazyLock;

use regex::Regex;

/// A JSON string body, escapes included.
const JSON_STR: &str = r#""((?:[^"\\]|\\.)*)""#;

static NODE_OPENING: LazyLock<Regex> = LazyLock::new(|| {
    let pattern =
        format!(r#"\{{\s*"id"\s*:\s*{JSON_STR}\s*,\s*"type"\s*:\s*{JSON_STR}\s*,\s*"data"\s*:\s*\{{"#);
    Regex::new(&pattern).expect("node opening pattern compiles")
});

static EDGE_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        r#"\{{\s*"id"\s*:\s*{JSON_STR}\s*,\s*"source"\s*:\s*{JSON_STR}\s*,\s*"target"\s*:\s*{JSON_STR}[^{{}}]*\}}"#
    );
    Regex::new(&pattern).expect("edge object pattern compiles")
});

/// Where a node object starts, and the id it announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeOpening<'a> {
    /// Raw (still JSON-escaped) id text.
    pub id: &'a str,
    /// Raw kind text.
    pub kind: &'a str,
    /// Byte offset of the opening `{`.
    pub start: usize,
}

/// A complete flat edge object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeMatch<'a> {
    pub id: &'a str,
    pub source: &'a str,
    pub target: &'a str,
    /// The full object text, `{` through `}`.
    pub text: &'a str,
    /// Byte offset of the opening `{`.
    pub start: usize,
}

/// Every node opening in `buffer`, in text order.
pub fn node_openings(buffer: &str) -> impl Iterator<Item = NodeOpening<'_>> {
    NODE_OPENING.captures_iter(buffer).filter_map(|caps| {
        let whole = caps.get(0)?;
        Some(NodeOpening { id: caps.get(1)?.as_str(), kind: caps.get(2)?.as_str(), start: whole.start() })
    })
}

/// Every complete edge object in `buffer`, in text order.
pub fn edge_objects(buffer: &str) -> impl Iterator<Item = EdgeMatch<'_>> {
    EDGE_OBJECT.captures_iter(buffer).filter_map(|caps| {
        let whole = caps.get(0)?;
        Some(EdgeMatch {
            id: caps.get(1)?.as_str(),
            source: caps.get(2)?.as_str(),
            target: caps.get(3)?.as_str(),
            text: whole.as_str(),
            start: whole.start(),
        })
    })
}

#[cfg(test)]
#[path = "matcher_test.rs"]
mod tests;
