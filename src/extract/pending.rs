//! Pending-Edge Resolver.
//!
//! Holds edges discovered before both endpoints were delivered. A flush
//! partitions the list in one pass: resolvable edges come out in discovery
//! order, the rest stay. Nothing expires; an edge leaves only by resolving or
//! by the session ending.

use std::collections::HashSet;

use crate::graph::Edge;

/// An edge waiting on one or both endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEdge {
    pub edge: Edge,
    /// Endpoint ids not yet emitted when the edge was parked.
    pub missing: Vec<String>,
}

impl PendingEdge {
    fn new(edge: Edge, emitted: &HashSet<String>) -> Self {
        let missing = [&edge.source, &edge.target]
            .into_iter()
            .filter(|id| !emitted.contains(id.as_str()))
            .cloned()
            .collect();
        Self { edge, missing }
    }

    fn is_resolved(&self, emitted: &HashSet<String>) -> bool {
        emitted.contains(&self.edge.source) && emitted.contains(&self.edge.target)
    }
}

/// Flat holding list of unresolved edges, in discovery order.
#[derive(Debug, Default)]
pub struct PendingEdges {
    edges: Vec<PendingEdge>,
}

impl PendingEdges {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Park `edge`, recording which endpoints are still missing.
    pub fn park(&mut self, edge: Edge, emitted: &HashSet<String>) {
        self.edges.push(PendingEdge::new(edge, emitted));
    }

    /// Remove and return every edge whose endpoints are both in `emitted`.
    pub fn flush(&mut self, emitted: &HashSet<String>) -> Vec<Edge> {
        if self.edges.is_empty() {
            return Vec::new();
        }
        let (ready, waiting): (Vec<PendingEdge>, Vec<PendingEdge>) =
            std::mem::take(&mut self.edges)
                .into_iter()
                .partition(|p| p.is_resolved(emitted));
        self.edges = waiting;
        ready.into_iter().map(|p| p.edge).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Edges still waiting, in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &PendingEdge> {
        self.edges.iter()
    }

    /// Drain everything still waiting (session end).
    pub fn drain(&mut self) -> Vec<PendingEdge> {
        std::mem::take(&mut self.edges)
    }
}

#[cfg(test)]
#[path = "pending_test.rs"]
mod tests;
