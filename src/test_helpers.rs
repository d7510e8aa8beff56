//! Shared fixtures for unit tests: a recording sink and canned streams.

use serde_json::json;

use crate::error::SessionError;
use crate::extract::GraphSink;
use crate::graph::{Edge, Node};

/// One callback, as observed by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Progress(String, String),
    Node(String),
    Edge(String),
    Complete,
    Error(SessionError),
    BatchEnd,
}

/// Sink that records every callback in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub signals: Vec<Signal>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl RecordingSink {
    pub fn node_ids(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    pub fn edge_ids(&self) -> Vec<&str> {
        self.edges.iter().map(|e| e.id.as_str()).collect()
    }

    /// Signals without batch markers, for order assertions.
    pub fn graph_signals(&self) -> Vec<Signal> {
        self.signals
            .iter()
            .filter(|s| !matches!(s, Signal::BatchEnd | Signal::Progress(..)))
            .cloned()
            .collect()
    }

    /// Panics unless every edge came after both of its endpoints.
    pub fn assert_referential_integrity(&self) {
        let mut seen: Vec<&str> = Vec::new();
        for signal in &self.signals {
            match signal {
                Signal::Node(id) => {
                    assert!(!seen.contains(&id.as_str()), "node {id} delivered twice");
                    seen.push(id);
                }
                Signal::Edge(id) => {
                    let edge = self.edges.iter().find(|e| &e.id == id).expect("recorded edge");
                    assert!(seen.contains(&edge.source.as_str()), "edge {id} before source {}", edge.source);
                    assert!(seen.contains(&edge.target.as_str()), "edge {id} before target {}", edge.target);
                }
                _ => {}
            }
        }
    }

    /// Panics unless exactly one terminal signal fired and it came last.
    pub fn assert_single_terminal_last(&self) {
        let terminals: Vec<usize> = self
            .signals
            .iter()
            .enumerate()
            .filter(|(_, s)| matches!(s, Signal::Complete | Signal::Error(_)))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(terminals.len(), 1, "expected exactly one terminal signal: {:?}", self.signals);
        assert_eq!(terminals[0], self.signals.len() - 1, "terminal signal must be last");
    }
}

impl GraphSink for RecordingSink {
    fn on_progress(&mut self, stage: &str, message: &str) {
        self.signals
            .push(Signal::Progress(stage.to_owned(), message.to_owned()));
    }

    fn on_node(&mut self, node: Node) {
        self.signals.push(Signal::Node(node.id.clone()));
        self.nodes.push(node);
    }

    fn on_edge(&mut self, edge: Edge) {
        self.signals.push(Signal::Edge(edge.id.clone()));
        self.edges.push(edge);
    }

    fn on_complete(&mut self) {
        self.signals.push(Signal::Complete);
    }

    fn on_error(&mut self, error: &SessionError) {
        self.signals.push(Signal::Error(error.clone()));
    }

    fn on_batch_end(&mut self) {
        self.signals.push(Signal::BatchEnd);
    }
}

/// A small but realistic flow document, pretty-printed like model output.
///
/// Written out by hand: key order matters to the incremental matchers.
pub fn sample_flow() -> String {
    r#"```json
{
  "nodes": [
    {
      "id": "a1",
      "type": "action",
      "data": {
        "name": "Spearphishing Attachment",
        "technique_id": "T1566.001",
        "tactic_name": "Initial Access",
        "description": "Victim opens a macro-laden {invoice} document"
      }
    },
    {
      "id": "a2",
      "type": "action",
      "data": { "name": "PowerShell", "technique_id": "T1059.001", "tactic_name": "Execution" }
    },
    {
      "id": "t1",
      "type": "tool",
      "data": { "name": "Cobalt Strike", "command_line": "beacon.exe -c \"{}\"" }
    },
    { "id": "g1", "type": "AND_operator", "data": {} },
    {
      "id": "a3",
      "type": "action",
      "data": { "name": "LSASS Memory", "technique_id": "T1003.001", "tactic_name": "Credential Access" }
    },
    { "id": "as1", "type": "asset", "data": { "name": "Domain Controller" } }
  ],
  "edges": [
    { "id": "e1", "source": "a1", "target": "a2", "label": "leads to" },
    { "id": "e2", "source": "a2", "target": "t1", "label": "uses" },
    { "id": "e3", "source": "a2", "target": "g1", "label": "leads to" },
    { "id": "e4", "source": "g1", "target": "a3", "label": "leads to" },
    { "id": "e5", "source": "a3", "target": "as1", "label": "targets" }
  ]
}
```"#
        .to_owned()
}

/// Frame a text delta the way the backend does.
pub fn delta_frame(text: &str) -> String {
    format!("data: {}\n\n", json!({ "type": "content_block_delta", "delta": { "text": text } }))
}

/// Split `text` into chunks of at most `size` chars.
pub fn chunk_chars(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size.max(1))
        .map(|c| c.iter().collect())
        .collect()
}
