//! Driver: the read loop tying transport, decoder and session together.
//!
//! DESIGN
//! ======
//! Single task, strictly sequential: one chunk is decoded and every event it
//! completes is dispatched before the next chunk is requested. After each
//! chunk the sink gets `on_batch_end`, which is where consumers re-lay-out.
//!
//! Once the session is terminal (provider error) nothing is parsed anymore,
//! but the transport is still drained until EOF or the sentinel so the
//! backend sees a clean read of its response.

use tracing::{debug, warn};

use crate::error::SessionError;
use crate::extract::{ExtractionSession, GraphSink, SessionStatus};
use crate::sse::FrameDecoder;
use crate::transport::ChunkSource;

/// Summary of one driven stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveOutcome {
    pub status: SessionStatus,
    pub chunks: usize,
    pub bytes: usize,
    /// The `[DONE]` sentinel was seen.
    pub sentinel: bool,
}

/// Pump `source` into `session` until the stream ends.
///
/// Transport EOF without a sentinel completes the session normally. A
/// transport error fails it with [`SessionError::Transport`].
pub async fn drive<C, S>(source: &mut C, session: &mut ExtractionSession<S>) -> DriveOutcome
where
    C: ChunkSource + ?Sized,
    S: GraphSink,
{
    let mut decoder = FrameDecoder::new();
    let mut chunks = 0;
    let mut bytes = 0;

    while !decoder.is_finished() {
        match source.next_chunk().await {
            Ok(Some(chunk)) => {
                chunks += 1;
                bytes += chunk.len();
                for event in decoder.push(&chunk) {
                    session.handle_event(event);
                }
                session.batch_end();
            }
            Ok(None) => {
                debug!(session = %session.id(), chunks, bytes, "stream: eof");
                for event in decoder.finish() {
                    session.handle_event(event);
                }
                session.complete();
                break;
            }
            Err(e) => {
                warn!(session = %session.id(), error = %e, chunks, "stream: transport failed");
                session.fail(SessionError::from(e));
                break;
            }
        }
    }

    DriveOutcome { status: session.status(), chunks, bytes, sentinel: decoder.is_finished() }
}

#[cfg(test)]
#[path = "driver_test.rs"]
mod tests;
