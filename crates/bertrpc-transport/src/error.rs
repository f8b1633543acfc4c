use std::time::Duration;

/// Errors that can occur while moving a request and its reply.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The endpoint could not be parsed or uses an unsupported scheme.
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// A configuration value could not be parsed.
    #[error("invalid configuration {key}: {reason}")]
    InvalidConfig { key: &'static str, reason: String },

    /// Failed to connect to the endpoint.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        source: std::io::Error,
    },

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server answered with a non-success HTTP status.
    #[error("server returned HTTP status {status}")]
    Status { status: u16 },

    /// The HTTP client failed.
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    /// The round trip did not finish in time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The reply body exceeds the configured maximum size.
    #[error("reply too large ({size} bytes, max {max})")]
    ReplyTooLarge { size: usize, max: usize },

    /// BERP framing failed on a stream transport.
    #[error(transparent)]
    Frame(#[from] bertrpc_berp::BerpError),
}

pub type Result<T> = std::result::Result<T, TransportError>;
