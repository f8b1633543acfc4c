//! Request/reply transports for BERT-RPC.
//!
//! A [`Transport`] takes one encoded `call` term and hands back the
//! BERP-framed reply. Two implementations ship here:
//! - [`HttpTransport`]: HTTP POST with `Content-Type: application/bert`
//!   (feature `http`, on by default)
//! - [`TcpTransport`]: raw BERP packets over a persistent TCP connection

pub mod config;
pub mod error;
#[cfg(feature = "http")]
pub mod http_client;
pub mod tcp;
pub mod traits;

pub use config::{TransportConfig, DEFAULT_TIMEOUT, ENV_ENDPOINT, ENV_TIMEOUT_MS, ENV_TOKEN};
pub use error::{Result, TransportError};
#[cfg(feature = "http")]
pub use http_client::{HttpTransport, CONTENT_TYPE_BERT};
pub use tcp::{TcpTransport, TCP_SCHEME};
pub use traits::Transport;
