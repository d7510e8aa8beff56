//! Graph accumulator: a [`GraphSink`] that keeps the growing graph laid out.
//!
//! DESIGN
//! ======
//! Nodes and edges are appended in delivery order. Layout is not rerun per
//! record; it runs once per processed chunk (`on_batch_end`) and once more at
//! the terminal signal, and only when something changed since the last run.
//! Each run replaces the snapshot wholesale, so positions may shift as the
//! graph grows.
//!
//! An optional observer is called with every fresh snapshot, which is how a
//! progressive renderer hooks in.

use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::extract::GraphSink;
use crate::graph::{Edge, Node};
use crate::layout::{LayoutConfig, LayoutResult, layout};

type Observer = Box<dyn FnMut(&LayoutResult) + Send>;

/// Terminal outcome recorded by the accumulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Failed(SessionError),
}

pub struct GraphAccumulator {
    config: LayoutConfig,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    dirty: bool,
    snapshot: LayoutResult,
    layouts: usize,
    outcome: Option<Outcome>,
    last_progress: Option<(String, String)>,
    observer: Option<Observer>,
}

impl GraphAccumulator {
    #[must_use]
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            nodes: Vec::new(),
            edges: Vec::new(),
            dirty: false,
            snapshot: LayoutResult::default(),
            layouts: 0,
            outcome: None,
            last_progress: None,
            observer: None,
        }
    }

    /// Call `observer` with every new layout snapshot.
    #[must_use]
    pub fn with_observer(mut self, observer: impl FnMut(&LayoutResult) + Send + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Most recent layout. Empty until the first batch ends.
    pub fn snapshot(&self) -> &LayoutResult {
        &self.snapshot
    }

    /// Number of layout runs so far.
    pub fn layouts(&self) -> usize {
        self.layouts
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn last_progress(&self) -> Option<(&str, &str)> {
        self.last_progress
            .as_ref()
            .map(|(stage, message)| (stage.as_str(), message.as_str()))
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Final snapshot plus the terminal outcome, if any.
    #[must_use]
    pub fn into_parts(self) -> (LayoutResult, Option<Outcome>) {
        (self.snapshot, self.outcome)
    }

    fn relayout(&mut self) {
        if !self.dirty {
            return;
        }
        self.snapshot = layout(&self.nodes, &self.edges, &self.config);
        self.dirty = false;
        self.layouts += 1;
        debug!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            run = self.layouts,
            "accumulator: relayout"
        );
        if let Some(observer) = self.observer.as_mut() {
            observer(&self.snapshot);
        }
    }
}

impl GraphSink for GraphAccumulator {
    fn on_progress(&mut self, stage: &str, message: &str) {
        self.last_progress = Some((stage.to_owned(), message.to_owned()));
    }

    fn on_node(&mut self, node: Node) {
        self.nodes.push(node);
        self.dirty = true;
    }

    fn on_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
        self.dirty = true;
    }

    fn on_complete(&mut self) {
        self.relayout();
        info!(nodes = self.nodes.len(), edges = self.edges.len(), "accumulator: flow complete");
        self.outcome = Some(Outcome::Completed);
    }

    fn on_error(&mut self, error: &SessionError) {
        self.relayout();
        warn!(%error, nodes = self.nodes.len(), "accumulator: flow failed");
        self.outcome = Some(Outcome::Failed(error.clone()));
    }

    fn on_batch_end(&mut self) {
        self.relayout();
    }
}

#[cfg(test)]
#[path = "accumulator_test.rs"]
mod tests;
