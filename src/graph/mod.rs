//! Graph data model and the accumulating consumer.

pub mod accumulator;
pub mod types;

pub use accumulator::{GraphAccumulator, Outcome};
pub use types::{
    ActionData, AssetData, Edge, Extra, GateData, InfrastructureData, MalwareData, Node, NodeKind,
    NodePayload, Position, ToolData, UrlData, VulnerabilityData, looks_like_edge,
};
