use std::fmt;

use bertrpc_etf::Term;

/// Errors that can occur while making a BERT-RPC call.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// Encoding the call or decoding the reply failed.
    #[error(transparent)]
    Etf(#[from] bertrpc_etf::EtfError),

    /// The reply envelope is malformed.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The remote side reported a failure.
    #[error(transparent)]
    Application(#[from] ApplicationError),

    /// A reply was decoded without a target to receive it.
    #[error("no target to decode the reply into")]
    NilTarget,

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] bertrpc_transport::TransportError),
}

pub type Result<T> = std::result::Result<T, RpcError>;

/// Failure reported by the remote side rather than the wire.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    /// The server answered with the `{error, Info}` envelope.
    #[error("remote error: {0}")]
    Remote(RemoteError),

    /// The call completed but its result carries the `error` discriminant.
    #[error("call returned {discriminant}")]
    Returned { discriminant: String },
}

/// The `{Type, Code, Class, Detail, Backtrace}` payload of an `error`
/// envelope.
///
/// Payloads with another shape keep their text rendering in `detail` and
/// an empty `kind`. The decoded term is always available in `raw`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    /// `protocol`, `server`, `user` or `proxy`.
    pub kind: String,
    pub code: i64,
    pub class: String,
    pub detail: String,
    pub backtrace: Vec<String>,
    pub raw: Term,
}

impl RemoteError {
    pub fn from_term(raw: Term) -> Self {
        match raw.as_tuple() {
            Some([kind, code, class, detail, backtrace]) if kind.as_atom().is_some() => Self {
                kind: kind.as_atom().unwrap_or_default().to_string(),
                code: code.as_int().unwrap_or_default(),
                class: text_or_display(class),
                detail: text_or_display(detail),
                backtrace: backtrace
                    .as_list()
                    .unwrap_or_default()
                    .iter()
                    .map(text_or_display)
                    .collect(),
                raw,
            },
            _ => Self {
                kind: String::new(),
                code: 0,
                class: String::new(),
                detail: raw.to_string(),
                backtrace: Vec::new(),
                raw,
            },
        }
    }
}

fn text_or_display(term: &Term) -> String {
    term.as_text().unwrap_or_else(|| term.to_string())
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind.is_empty() {
            return f.write_str(&self.detail);
        }
        write!(f, "{} error {}", self.kind, self.code)?;
        if !self.class.is_empty() {
            write!(f, " ({})", self.class)?;
        }
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bertrpc_etf::{atom, binary, list, tuple};

    use super::*;

    #[test]
    fn parses_standard_error_payload() {
        let raw = tuple([
            atom("server"),
            Term::int(2),
            binary("UndefinedFunction"),
            binary("function nope/0 is undefined"),
            list([binary("mod.erl:12"), binary("mod.erl:40")]),
        ]);
        let err = RemoteError::from_term(raw.clone());
        assert_eq!(err.kind, "server");
        assert_eq!(err.code, 2);
        assert_eq!(err.class, "UndefinedFunction");
        assert_eq!(err.backtrace, vec!["mod.erl:12", "mod.erl:40"]);
        assert_eq!(err.raw, raw);
        assert_eq!(
            err.to_string(),
            "server error 2 (UndefinedFunction): function nope/0 is undefined"
        );
    }

    #[test]
    fn empty_backtrace_is_nil() {
        let raw = tuple([
            atom("user"),
            Term::int(500),
            atom("badarg"),
            binary("bad"),
            Term::Nil,
        ]);
        let err = RemoteError::from_term(raw);
        assert_eq!(err.class, "badarg");
        assert!(err.backtrace.is_empty());
    }

    #[test]
    fn other_shapes_keep_rendering() {
        let err = RemoteError::from_term(atom("timeout"));
        assert!(err.kind.is_empty());
        assert_eq!(err.detail, "timeout");
        assert_eq!(err.to_string(), "timeout");
    }

    #[test]
    fn transparent_etf_errors() {
        let err = RpcError::from(bertrpc_etf::EtfError::BadVersion(1));
        assert_eq!(err.to_string(), "incorrect term version tag: 1 (expected 131)");
    }
}
