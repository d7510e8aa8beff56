//! Transport: where response bytes come from.
//!
//! DESIGN
//! ======
//! The extraction pipeline only ever asks for "the next chunk of bytes".
//! [`ChunkSource`] is that seam. Chunk boundaries are arbitrary: frames and
//! UTF-8 sequences may be split anywhere, the decoder carries the remainder.
//!
//! - [`HttpSource`]: POSTs the analyst input to the backend streaming endpoint.
//! - [`ReaderSource`]: any `AsyncRead`, for replaying recorded streams.
//! - [`StreamSource`]: adapter over a `futures` byte stream.

pub mod http;

use futures::{Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::TransportError;

pub use http::{HttpSource, InputMode, StreamRequest};

/// Read size for [`ReaderSource`].
pub const DEFAULT_READ_CHUNK: usize = 8 * 1024;

// =============================================================================
// TRAIT
// =============================================================================

/// A pull-based source of response bytes.
#[async_trait::async_trait]
pub trait ChunkSource: Send {
    /// Next chunk, or `None` at end of stream.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the underlying read fails. The
    /// source should not be polled again afterwards.
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, TransportError>;
}

#[async_trait::async_trait]
impl<T: ChunkSource + ?Sized> ChunkSource for Box<T> {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        (**self).next_chunk().await
    }
}

// =============================================================================
// READER
// =============================================================================

/// Reads an `AsyncRead` in fixed-size chunks.
pub struct ReaderSource<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin + Send> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, DEFAULT_READ_CHUNK)
    }

    pub fn with_chunk_size(reader: R, size: usize) -> Self {
        Self { reader, buf: vec![0; size.max(1)] }
    }
}

#[async_trait::async_trait]
impl<R: AsyncRead + Unpin + Send> ChunkSource for ReaderSource<R> {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        let n = self.reader.read(&mut self.buf).await?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(self.buf[..n].to_vec()))
    }
}

// =============================================================================
// STREAM ADAPTER
// =============================================================================

/// Wraps a stream of byte chunks.
pub struct StreamSource<S> {
    inner: S,
}

impl<S> StreamSource<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait::async_trait]
impl<S, B> ChunkSource for StreamSource<S>
where
    S: Stream<Item = Result<B, TransportError>> + Unpin + Send,
    B: Into<Vec<u8>> + Send,
{
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        match self.inner.next().await {
            Some(Ok(bytes)) => Ok(Some(bytes.into())),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;
