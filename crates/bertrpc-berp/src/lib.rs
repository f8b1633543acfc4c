//! BERP framing for BERT-RPC.
//!
//! A BERP packet is one ETF payload preceded by its length as a 4-byte
//! big-endian unsigned integer. Replies always arrive framed; requests are
//! framed only on stream transports.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::BerpCodec;
pub use codec::{decode_berp, encode_berp, wire_size, BerpConfig, DEFAULT_MAX_PAYLOAD, HEADER_SIZE};
pub use error::{BerpError, Result};
pub use reader::BerpReader;
pub use writer::BerpWriter;
