/// Errors that can occur during BERP framing.
#[derive(Debug, thiserror::Error)]
pub enum BerpError {
    /// The declared or supplied payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing packets.
    #[error("BERP I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete packet was received.
    #[error("connection closed (incomplete packet)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, BerpError>;
