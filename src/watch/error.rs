//! Watch stream error types.

/// Errors raised while splitting the response body into frames.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FramingError {
    /// The chunk length header is not a hexadecimal integer.
    #[error("Invalid chunk length header: {0:?}")]
    InvalidLength(String),

    /// Declared chunk length does not match the payload.
    #[error("Data length mismatch (expected {expected}, have {actual})")]
    LengthMismatch {
        /// Length declared by the chunk header.
        expected: u64,
        /// Length of the payload line actually received.
        actual: u64,
    },

    /// A single line exceeded the buffering limit.
    #[error("Line exceeds {limit} bytes")]
    LineTooLong { limit: usize },
}

/// Coarse classification of a [`WatchError`].
///
/// All kinds are fatal to the current connection and receive the same
/// fixed-interval retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Framing,
    Decode,
    Transport,
}

/// Errors that end one watch connection.
#[derive(thiserror::Error, Debug)]
pub enum WatchError {
    /// Chunk framing was violated.
    #[error("Framing error: {0}")]
    Framing(#[from] FramingError),

    /// Frame payload was not a valid change event.
    #[error("Failed to decode event: {0}")]
    Decode(#[from] serde_json::Error),

    /// URL scheme the transport cannot speak.
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    /// URL has no host to connect to.
    #[error("URL has no host: {0}")]
    MissingHost(String),

    /// Connecting to the server failed or timed out.
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Server answered with a non-2xx status.
    #[error("Request failed ({status}): {reason}")]
    Status { status: u16, reason: String },

    /// Server response could not be understood.
    #[error("Invalid HTTP response: {0}")]
    InvalidResponse(String),

    /// I/O failure while reading the stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WatchError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Framing(_) => ErrorKind::Framing,
            Self::Decode(_) => ErrorKind::Decode,
            Self::UnsupportedScheme(_)
            | Self::MissingHost(_)
            | Self::Connect { .. }
            | Self::Status { .. }
            | Self::InvalidResponse(_)
            | Self::Io(_) => ErrorKind::Transport,
        }
    }
}
