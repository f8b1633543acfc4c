//! Erlang External Term Format codec for the BERT-RPC subset.
//!
//! Covers integers up to 32 bits, atoms, binaries, charlists, tuples, proper
//! lists and nil. Every top-level term starts with the version byte `131`.
//!
//! - [`encode`] turns any [`Encode`] value into wire bytes.
//! - [`decode`] fills any [`DecodeTarget`] from wire bytes.
//! - [`positional!`] and [`tagged!`] derive targets for records.

pub mod decode;
pub mod encode;
pub mod error;
pub mod tag;
pub mod tagged;
pub mod target;
pub mod term;

pub use decode::{decode, decode_into, decode_term, DecodeLimits, Decoder, DEFAULT_MAX_DEPTH, DEFAULT_MAX_LENGTH};
pub use encode::{encode, encode_into, Encode};
pub use error::{EtfError, Result};
pub use tagged::{CallResult, FieldBinding, TaggedLayout, TaggedTarget};
pub use target::DecodeTarget;
pub use term::{atom, binary, charlist, list, tuple, Atom, CharList, Term};
