//! Error types shared across the extraction pipeline.
//!
//! DESIGN
//! ======
//! One `thiserror` enum per concern. Every enum implements [`ErrorCode`] so the
//! CLI (and any embedding caller) can print a grepable code and decide whether
//! a retry makes sense without matching on variants.

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code and retryable flag for structured error reporting.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

// =============================================================================
// TRANSPORT
// =============================================================================

/// Errors produced while pulling chunks from the upstream response stream.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The request could not be sent or the connection dropped mid-body.
    #[error("request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success HTTP status.
    #[error("stream response error: status {status}")]
    Status { status: u16, body: String },

    /// Reading from a local source (file, stdin) failed.
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

impl ErrorCode for TransportError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::Request(_) => "E_STREAM_REQUEST",
            Self::Status { .. } => "E_STREAM_STATUS",
            Self::Io(_) => "E_STREAM_IO",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Status { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Terminal failure delivered to [`GraphSink::on_error`](crate::extract::GraphSink::on_error).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The analysis backend reported an error frame mid-stream.
    #[error("provider error: {0}")]
    Provider(String),

    /// The transport failed before the stream terminated.
    #[error("transport error: {0}")]
    Transport(String),

    /// The whole-buffer parse at stream end failed.
    #[error("failed to parse final document: {0}")]
    FinalDecode(String),
}

impl ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Provider(_) => "E_PROVIDER",
            Self::Transport(_) => "E_TRANSPORT",
            Self::FinalDecode(_) => "E_FINAL_DECODE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<TransportError> for SessionError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e.to_string())
    }
}

// =============================================================================
// NORMALIZATION
// =============================================================================

/// Reasons a decoded JSON object cannot become a graph record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("record is missing string field `{0}`")]
    MissingField(&'static str),

    #[error("unknown node kind: {0}")]
    UnknownKind(String),

    #[error("record has both `source` and `target`; it is an edge")]
    LooksLikeEdge,
}

impl ErrorCode for NormalizeError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotAnObject => "E_NOT_OBJECT",
            Self::MissingField(_) => "E_MISSING_FIELD",
            Self::UnknownKind(_) => "E_UNKNOWN_KIND",
            Self::LooksLikeEdge => "E_LOOKS_LIKE_EDGE",
        }
    }
}

// =============================================================================
// CONFIG
// =============================================================================

/// A configuration value could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown layout direction: {0} (expected 'TB' or 'LR')")]
    UnknownDirection(String),
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownDirection(_) => "E_CONFIG_PARSE",
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
