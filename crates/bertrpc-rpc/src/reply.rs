use std::io::Read;

use bertrpc_etf::{tag, DecodeLimits, DecodeTarget, Decoder, EtfError};
use tracing::{debug, warn};

use crate::error::{ApplicationError, RemoteError, Result, RpcError};

/// Decode a BERP-framed reply into `target`.
///
/// A `{reply, Result}` envelope decodes `Result` into the target. An
/// `{error, Info}` envelope fails with [`ApplicationError::Remote`]. The
/// declared frame length bounds every read, so a reply never consumes bytes
/// past its own frame.
pub fn decode_reply(reader: &mut dyn Read, target: Option<&mut dyn DecodeTarget>) -> Result<()> {
    decode_reply_with_limits(reader, target, DecodeLimits::default())
}

/// [`decode_reply`] with explicit decode limits.
pub fn decode_reply_with_limits(
    reader: &mut dyn Read,
    target: Option<&mut dyn DecodeTarget>,
    limits: DecodeLimits,
) -> Result<()> {
    let target = target.ok_or(RpcError::NilTarget)?;

    let length = Decoder::with_limits(&mut *reader, limits).read_u32()?;
    if length as usize > limits.max_length {
        return Err(EtfError::LimitExceeded {
            declared: length as usize,
            max: limits.max_length,
        }
        .into());
    }

    let mut body = reader.take(u64::from(length));
    let mut decoder = Decoder::with_limits(&mut body, limits);
    decoder.decode_version()?;

    let arity = decoder.decode_tuple_header()?;
    if arity != 2 {
        return Err(RpcError::Protocol(format!(
            "reply envelope has arity {arity}, expected 2"
        )));
    }
    let first = decoder.peek_tag()?;
    if !tag::is_atom(first) {
        return Err(RpcError::Protocol(format!(
            "reply envelope starts with {}, expected an atom",
            tag::tag_name(first)
        )));
    }

    match decoder.decode_atom()?.as_str() {
        "reply" => {
            target.decode_from(&mut decoder)?;
            debug!(
                length,
                discriminant = target.discriminant(),
                "decoded reply"
            );
            Ok(())
        }
        "error" => {
            let remote = RemoteError::from_term(decoder.decode_term()?);
            warn!(
                kind = %remote.kind,
                code = remote.code,
                detail = %remote.detail,
                "remote call failed"
            );
            Err(ApplicationError::Remote(remote).into())
        }
        other => Err(RpcError::Protocol(format!(
            "unexpected reply envelope atom {other:?}"
        ))),
    }
}
