//! Incremental extraction of graph records from a growing model response.
//!
//! DESIGN
//! ======
//! - `scanner`: brace/string-aware balanced-object primitive.
//! - `matcher`: node-opening and flat-edge matchers built on top of it.
//! - `pending`: edges parked until both endpoints are delivered.
//! - `reconcile`: whole-document pass at stream end.
//! - `session`: owns the per-stream state and drives the others.

pub mod matcher;
pub mod pending;
pub mod reconcile;
pub mod scanner;
pub mod session;

pub use pending::{PendingEdge, PendingEdges};
pub use scanner::extract_balanced_object;
pub use session::{ExtractionSession, GraphSink, SessionStatus};
