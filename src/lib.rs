//! Streaming attack-flow assembly.
//!
//! DESIGN
//! ======
//! A language model streams a JSON description of an attack flow. This crate
//! turns that token stream into graph records as soon as each one is
//! complete, keeps edges back until both endpoints exist, reconciles the whole
//! document once the stream ends, and lays the growing graph out
//! deterministically so a renderer can redraw it after every chunk.
//!
//! Data flows one way:
//!
//! ```text
//! ChunkSource -> FrameDecoder -> ExtractionSession -> GraphSink
//!  (transport)      (sse)          (extract)          (graph::GraphAccumulator -> layout)
//! ```
//!
//! [`driver::drive`] runs that pipeline for one stream.

pub mod config;
pub mod driver;
pub mod error;
pub mod extract;
pub mod graph;
pub mod layout;
pub mod sse;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use config::AppConfig;
pub use driver::{DriveOutcome, drive};
pub use error::{ConfigError, ErrorCode, NormalizeError, SessionError, TransportError};
pub use extract::{ExtractionSession, GraphSink, SessionStatus};
pub use graph::{Edge, GraphAccumulator, Node, NodeKind, Outcome};
pub use layout::{Direction, LayoutConfig, LayoutResult, layout};
