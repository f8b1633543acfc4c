//! BERT-RPC client and Erlang External Term Format codec.
//!
//! bertrpc talks to Erlang services that expose functions over BERT-RPC:
//! calls are encoded as ETF terms, sent over HTTP or raw TCP, and the
//! BERP-framed replies are decoded straight into Rust values.
//!
//! # Crate Structure
//!
//! - [`etf`]: term model, encoder, streaming decoder and decode targets
//! - [`berp`]: 4-byte length-prefixed packet framing
//! - [`transport`]: HTTP and TCP request/reply transports
//! - [`rpc`]: `call`/`reply` envelopes and the blocking [`Client`]
//!
//! ```no_run
//! use bertrpc::{CallResult, Client, TransportConfig};
//!
//! let mut client = Client::http(TransportConfig::new("http://localhost:8080/rpc"))?;
//! let call = client.new_call("ejabberd_auth", "check_password").arg("john").arg("localhost");
//! let mut result = CallResult::<String>::default();
//! client.exec(&call, &mut result)?;
//! # Ok::<(), bertrpc::RpcError>(())
//! ```

/// Re-export term codec types.
pub mod etf {
    pub use bertrpc_etf::*;
}

/// Re-export framing types.
pub mod berp {
    pub use bertrpc_berp::*;
}

/// Re-export transport types.
pub mod transport {
    pub use bertrpc_transport::*;
}

/// Re-export call/reply types.
pub mod rpc {
    pub use bertrpc_rpc::*;
}

pub use bertrpc_etf::{
    atom, binary, charlist, decode, encode, list, positional, tagged, tuple, Atom, CallResult,
    CharList, DecodeTarget, Encode, EtfError, Term,
};
pub use bertrpc_rpc::{
    decode_reply, encode_call, ApplicationError, Call, Client, RemoteError, RpcError,
};
pub use bertrpc_transport::{Transport, TransportConfig, TransportError};
