//! Extraction session: one streamed model response, start to terminal signal.
//!
//! DESIGN
//! ======
//! All per-stream state lives here: the append-only text buffer, the
//! processed/emitted id sets and the pending-edge list. A session is single
//! use; there is no reset, a new stream needs a new session.
//!
//! Every content delta triggers a rescan of the whole buffer. Processed-id
//! tracking turns rediscovery into a no-op, which keeps the scan trivially
//! re-entrant at the cost of O(n) work per delta.
//!
//! Guarantees towards the [`GraphSink`]:
//! - `on_node` fires at most once per id.
//! - `on_edge` fires only after both endpoints went through `on_node`.
//! - exactly one of `on_complete` / `on_error` fires, and nothing after it.

use std::collections::HashSet;
use std::ops::Range;

use serde_json::Value;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use super::matcher;
use super::pending::{PendingEdge, PendingEdges};
use super::reconcile::{self, FinalRecord};
use super::scanner::extract_balanced_object;
use crate::error::{NormalizeError, SessionError};
use crate::graph::{Edge, Node};
use crate::sse::StreamEvent;

// =============================================================================
// SINK
// =============================================================================

/// Consumer callbacks for one session.
pub trait GraphSink {
    /// Informational stage update. Zero or more.
    fn on_progress(&mut self, _stage: &str, _message: &str) {}

    /// A node, delivered once per id.
    fn on_node(&mut self, node: Node);

    /// An edge whose endpoints have both been delivered already.
    fn on_edge(&mut self, edge: Edge);

    /// Terminal success.
    fn on_complete(&mut self);

    /// Terminal failure. Everything delivered before stays valid.
    fn on_error(&mut self, error: &SessionError);

    /// One transport chunk has been fully processed.
    fn on_batch_end(&mut self) {}
}

impl<S: GraphSink + ?Sized> GraphSink for &mut S {
    fn on_progress(&mut self, stage: &str, message: &str) {
        (**self).on_progress(stage, message);
    }

    fn on_node(&mut self, node: Node) {
        (**self).on_node(node);
    }

    fn on_edge(&mut self, edge: Edge) {
        (**self).on_edge(edge);
    }

    fn on_complete(&mut self) {
        (**self).on_complete();
    }

    fn on_error(&mut self, error: &SessionError) {
        (**self).on_error(error);
    }

    fn on_batch_end(&mut self) {
        (**self).on_batch_end();
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Lifecycle position of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Streaming,
    Completed,
    Failed,
}

impl SessionStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

pub struct ExtractionSession<S: GraphSink> {
    id: Uuid,
    sink: S,
    status: SessionStatus,
    buffer: String,
    processed_node_ids: HashSet<String>,
    processed_edge_ids: HashSet<String>,
    emitted_node_ids: HashSet<String>,
    pending: PendingEdges,
    edges_emitted: usize,
}

impl<S: GraphSink> ExtractionSession<S> {
    #[must_use]
    pub fn new(sink: S) -> Self {
        let id = Uuid::new_v4();
        debug!(session = %id, "extract: session started");
        Self {
            id,
            sink,
            status: SessionStatus::Streaming,
            buffer: String::new(),
            processed_node_ids: HashSet::new(),
            processed_edge_ids: HashSet::new(),
            emitted_node_ids: HashSet::new(),
            pending: PendingEdges::new(),
            edges_emitted: 0,
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Accumulated model output so far.
    #[must_use]
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Edges that never resolved. Only meaningful once the session ended.
    pub fn unresolved_edges(&self) -> impl Iterator<Item = &PendingEdge> {
        self.pending.iter()
    }

    /// Dispatch one decoded stream event.
    pub fn handle_event(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Progress { stage, message } => self.progress(&stage, &message),
            StreamEvent::Error(message) => self.fail(SessionError::Provider(message)),
            StreamEvent::ContentDelta(text) => self.push_delta(&text),
            StreamEvent::Done => self.complete(),
        }
    }

    pub fn progress(&mut self, stage: &str, message: &str) {
        if self.is_terminal() {
            return;
        }
        debug!(session = %self.id, stage, message, "extract: progress");
        self.sink.on_progress(stage, message);
    }

    /// Append model output and emit whatever became complete.
    pub fn push_delta(&mut self, text: &str) {
        if self.is_terminal() || text.is_empty() {
            return;
        }
        self.buffer.push_str(text);
        self.rescan();
    }

    /// Rescan the whole buffer. Already processed ids are skipped.
    pub fn rescan(&mut self) {
        if self.is_terminal() {
            return;
        }
        let buffer = std::mem::take(&mut self.buffer);
        let node_spans = self.scan_nodes(&buffer);
        self.scan_edges(&buffer, &node_spans);
        self.buffer = buffer;
    }

    /// Tell the sink a transport batch is done, so it can re-lay-out.
    pub fn batch_end(&mut self) {
        if !self.is_terminal() {
            self.sink.on_batch_end();
        }
    }

    /// Run the final pass over the whole buffer, then end the session.
    pub fn complete(&mut self) {
        if self.is_terminal() {
            return;
        }
        let records = match reconcile::final_records(&self.buffer) {
            Ok(records) => records,
            Err(message) => {
                self.fail(SessionError::FinalDecode(message));
                return;
            }
        };
        for record in records {
            match record {
                FinalRecord::Node(node) => self.accept_node(node),
                FinalRecord::Edge(edge) => self.accept_edge(edge),
            }
        }
        self.flush_pending();

        self.status = SessionStatus::Completed;
        self.log_unresolved();
        info!(
            session = %self.id,
            nodes = self.emitted_node_ids.len(),
            edges = self.edges_emitted,
            buffer_len = self.buffer.len(),
            "extract: session complete"
        );
        self.sink.on_complete();
    }

    /// End the session with an error. No-op once terminal.
    pub fn fail(&mut self, error: SessionError) {
        if self.is_terminal() {
            return;
        }
        self.status = SessionStatus::Failed;
        warn!(
            session = %self.id,
            error = %error,
            nodes = self.emitted_node_ids.len(),
            edges = self.edges_emitted,
            "extract: session failed"
        );
        self.log_unresolved();
        self.sink.on_error(&error);
    }

    // -------------------------------------------------------------------------
    // scanning
    // -------------------------------------------------------------------------

    /// Returns the byte span of every node object seen, open ones running to
    /// the end of the buffer.
    fn scan_nodes(&mut self, buffer: &str) -> Vec<Range<usize>> {
        let mut spans = Vec::new();
        for opening in matcher::node_openings(buffer) {
            let object = extract_balanced_object(buffer, opening.start);
            spans.push(opening.start..object.map_or(buffer.len(), |o| opening.start + o.len()));
            if self.processed_node_ids.contains(opening.id) {
                continue;
            }
            let Some(object) = object else {
                continue;
            };
            let value: Value = match serde_json::from_str(object) {
                Ok(value) => value,
                Err(e) => {
                    trace!(id = opening.id, error = %e, "extract: node candidate not decodable yet");
                    continue;
                }
            };
            match Node::from_value(&value) {
                Ok(node) => self.accept_node(node),
                Err(NormalizeError::LooksLikeEdge) => {
                    trace!(id = opening.id, "extract: node-shaped edge skipped");
                }
                Err(e) => trace!(id = opening.id, kind = opening.kind, error = %e, "extract: node candidate rejected"),
            }
        }
        spans
    }

    fn scan_edges(&mut self, buffer: &str, node_spans: &[Range<usize>]) {
        for found in matcher::edge_objects(buffer) {
            if self.processed_edge_ids.contains(found.id) {
                continue;
            }
            // Edge-shaped values inside a node's data are payload, not edges.
            if node_spans.iter().any(|span| span.start < found.start && found.start < span.end) {
                trace!(id = found.id, "extract: edge candidate nested in node skipped");
                continue;
            }
            let edge = serde_json::from_str::<Value>(found.text)
                .map_err(|e| e.to_string())
                .and_then(|value| Edge::from_value(&value).map_err(|e| e.to_string()));
            match edge {
                Ok(edge) => self.accept_edge(edge),
                Err(e) => trace!(id = found.id, error = %e, "extract: edge candidate rejected"),
            }
        }
    }

    // -------------------------------------------------------------------------
    // emission
    // -------------------------------------------------------------------------

    fn accept_node(&mut self, node: Node) {
        if !self.processed_node_ids.insert(node.id.clone()) {
            return;
        }
        self.emitted_node_ids.insert(node.id.clone());
        debug!(session = %self.id, id = %node.id, kind = %node.kind(), "extract: node");
        self.sink.on_node(node);
        self.flush_pending();
    }

    fn accept_edge(&mut self, edge: Edge) {
        if !self.processed_edge_ids.insert(edge.id.clone()) {
            return;
        }
        if self.endpoints_emitted(&edge) {
            self.deliver_edge(edge);
        } else {
            debug!(session = %self.id, id = %edge.id, source = %edge.source, target = %edge.target, "extract: edge pending");
            self.pending.park(edge, &self.emitted_node_ids);
        }
    }

    fn flush_pending(&mut self) {
        for edge in self.pending.flush(&self.emitted_node_ids) {
            self.deliver_edge(edge);
        }
    }

    fn deliver_edge(&mut self, edge: Edge) {
        debug!(session = %self.id, id = %edge.id, source = %edge.source, target = %edge.target, "extract: edge");
        self.edges_emitted += 1;
        self.sink.on_edge(edge);
    }

    fn endpoints_emitted(&self, edge: &Edge) -> bool {
        self.emitted_node_ids.contains(&edge.source) && self.emitted_node_ids.contains(&edge.target)
    }

    fn log_unresolved(&self) {
        if self.pending.is_empty() {
            return;
        }
        let ids: Vec<&str> = self.pending.iter().map(|p| p.edge.id.as_str()).collect();
        warn!(session = %self.id, count = ids.len(), edges = ?ids, "extract: dropping unresolved edges");
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
