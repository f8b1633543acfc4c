//! BERT-RPC calls and replies.
//!
//! A request is `{call, Module, Function, Args}`. The server answers with a
//! BERP-framed `{reply, Result}` or `{error, Info}`. [`Client`] ties the two
//! together over any [`bertrpc_transport::Transport`].
//!
//! ```no_run
//! use bertrpc_etf::CallResult;
//! use bertrpc_rpc::Client;
//! use bertrpc_transport::TransportConfig;
//!
//! let mut client = Client::tcp(TransportConfig::new("127.0.0.1:9999"))?;
//! let call = client
//!     .new_call("ejabberd_auth", "try_register")
//!     .arg("john")
//!     .arg("localhost")
//!     .arg("password");
//! let mut result = CallResult::<String>::default();
//! client.exec(&call, &mut result)?;
//! # Ok::<(), bertrpc_rpc::RpcError>(())
//! ```

pub mod call;
pub mod client;
pub mod error;
pub mod reply;

pub use call::{encode_call, Call};
pub use client::Client;
pub use error::{ApplicationError, RemoteError, Result, RpcError};
pub use reply::{decode_reply, decode_reply_with_limits};
