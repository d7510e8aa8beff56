//! Hierarchical (layered) layout for flow graphs.
//!
//! DESIGN
//! ======
//! Pure function of `(nodes, edges, config)`; every call recomputes from
//! scratch, so nodes may move as the graph grows while streaming. Phases:
//!
//! 1. cycle breaking: DFS in insertion order, back edges reversed
//! 2. ranking: longest path, then weighted tightening
//! 3. ordering: weighted barycenter sweeps inside each rank
//! 4. coordinates: priority placement pulling nodes towards neighbours
//!
//! Edges between two backbone kinds (the technique chain) weigh
//! `backbone_weight`, everything else weighs 1. Heavy edges win both the
//! ranking and the placement, which keeps the narrative chain straight while
//! tools, assets and infrastructure settle around it.
//!
//! Only insertion order drives tie-breaking; no hashing, no randomness.

mod coords;
mod order;
mod rank;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::ConfigError;
use crate::graph::{Edge, Node, Position};

pub const DEFAULT_RANK_SEP: f64 = 150.0;
pub const DEFAULT_NODE_SEP: f64 = 100.0;
pub const DEFAULT_MARGIN: f64 = 50.0;
pub const DEFAULT_NODE_WIDTH: f64 = 250.0;
pub const DEFAULT_NODE_HEIGHT: f64 = 120.0;
pub const DEFAULT_BACKBONE_WEIGHT: u32 = 10;
pub const DEFAULT_REFINE_PASSES: usize = 8;

/// Weight of any edge that is not between two backbone nodes.
const AUX_WEIGHT: u32 = 1;

// =============================================================================
// CONFIG
// =============================================================================

/// Primary axis along which ranks advance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    /// Top to bottom.
    #[default]
    TopBottom,
    /// Left to right.
    LeftRight,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TopBottom => "TB",
            Self::LeftRight => "LR",
        })
    }
}

impl FromStr for Direction {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "TB" | "TD" => Ok(Self::TopBottom),
            "LR" => Ok(Self::LeftRight),
            _ => Err(ConfigError::UnknownDirection(raw.to_owned())),
        }
    }
}

/// Fixed layout constants. Nothing here is derived from graph content.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub direction: Direction,
    pub rank_sep: f64,
    pub node_sep: f64,
    pub margin_x: f64,
    pub margin_y: f64,
    pub node_width: f64,
    pub node_height: f64,
    pub backbone_weight: u32,
    pub refine_passes: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            direction: Direction::TopBottom,
            rank_sep: DEFAULT_RANK_SEP,
            node_sep: DEFAULT_NODE_SEP,
            margin_x: DEFAULT_MARGIN,
            margin_y: DEFAULT_MARGIN,
            node_width: DEFAULT_NODE_WIDTH,
            node_height: DEFAULT_NODE_HEIGHT,
            backbone_weight: DEFAULT_BACKBONE_WEIGHT,
            refine_passes: DEFAULT_REFINE_PASSES,
        }
    }
}

impl LayoutConfig {
    #[must_use]
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Node extent along the rank axis and across it.
    fn extents(&self) -> (f64, f64) {
        match self.direction {
            Direction::TopBottom => (self.node_height, self.node_width),
            Direction::LeftRight => (self.node_width, self.node_height),
        }
    }
}

// =============================================================================
// RESULT
// =============================================================================

/// Positioned nodes plus the edges, unchanged.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct LayoutResult {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl LayoutResult {
    /// Width and height of the area covered by node boxes, margins included.
    #[must_use]
    pub fn extent(&self, config: &LayoutConfig) -> (f64, f64) {
        let mut width: f64 = 0.0;
        let mut height: f64 = 0.0;
        for pos in self.nodes.iter().filter_map(|n| n.position) {
            width = width.max(pos.x + config.node_width + config.margin_x);
            height = height.max(pos.y + config.node_height + config.margin_y);
        }
        (width, height)
    }

    #[must_use]
    pub fn position_of(&self, id: &str) -> Option<Position> {
        self.nodes.iter().find(|n| n.id == id).and_then(|n| n.position)
    }
}

// =============================================================================
// INTERNAL GRAPH
// =============================================================================

/// An edge between node indices, oriented for ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WeightedEdge {
    from: usize,
    to: usize,
    weight: u32,
}

fn build_edges(nodes: &[Node], edges: &[Edge], config: &LayoutConfig) -> Vec<WeightedEdge> {
    let index: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();

    edges
        .iter()
        .filter_map(|edge| {
            let from = *index.get(edge.source.as_str())?;
            let to = *index.get(edge.target.as_str())?;
            if from == to {
                return None;
            }
            let backbone = nodes[from].kind().is_backbone() && nodes[to].kind().is_backbone();
            let weight = if backbone { config.backbone_weight.max(AUX_WEIGHT) } else { AUX_WEIGHT };
            Some(WeightedEdge { from, to, weight })
        })
        .collect()
}

// =============================================================================
// ENTRY POINT
// =============================================================================

/// Assign a position to every node.
///
/// Edges naming unknown nodes and self-loops are ignored for placement but
/// returned unchanged.
#[must_use]
pub fn layout(nodes: &[Node], edges: &[Edge], config: &LayoutConfig) -> LayoutResult {
    if nodes.is_empty() {
        return LayoutResult { nodes: Vec::new(), edges: edges.to_vec() };
    }

    let n = nodes.len();
    let mut weighted = build_edges(nodes, edges, config);
    let reversed = rank::break_cycles(n, &mut weighted);
    let ranks = rank::assign_ranks(n, &weighted);
    let layers = order::order_layers(n, &ranks, &weighted);
    let (main, cross) = coords::assign(n, &layers, &weighted, config);

    let (_, cross_extent) = config.extents();
    let mut positioned: Vec<Position> = (0..n)
        .map(|v| {
            let cross_start = cross[v] - cross_extent / 2.0;
            match config.direction {
                Direction::TopBottom => Position { x: cross_start, y: main[v] },
                Direction::LeftRight => Position { x: main[v], y: cross_start },
            }
        })
        .collect();

    let min_x = positioned.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let min_y = positioned.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    for pos in &mut positioned {
        pos.x += config.margin_x - min_x;
        pos.y += config.margin_y - min_y;
    }

    debug!(
        nodes = n,
        edges = weighted.len(),
        reversed,
        ranks = layers.len(),
        direction = %config.direction,
        "layout: computed"
    );

    let nodes = nodes
        .iter()
        .zip(positioned)
        .map(|(node, pos)| Node { position: Some(pos), ..node.clone() })
        .collect();
    LayoutResult { nodes, edges: edges.to_vec() }
}

#[cfg(test)]
#[path = "layout_test.rs"]
mod tests;
