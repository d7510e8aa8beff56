//! Stream Decoder: turns raw response chunks into typed stream events.

pub mod decoder;

pub use decoder::{FrameDecoder, StreamEvent};
