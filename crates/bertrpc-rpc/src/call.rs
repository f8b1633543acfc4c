use bertrpc_berp::encode_berp;
use bertrpc_etf::encode::{put_atom, put_tuple_header};
use bertrpc_etf::{encode, Atom, Encode, Term};
use bertrpc_transport::TransportError;
use bytes::{Bytes, BytesMut};
use tracing::debug;

use crate::error::Result;

/// A `{call, Module, Function, Args}` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    module: Atom,
    function: Atom,
    args: Vec<Term>,
}

impl Call {
    pub fn new(module: impl Into<String>, function: impl Into<String>) -> Self {
        Self::with_args(module, function, Vec::new())
    }

    pub fn with_args(
        module: impl Into<String>,
        function: impl Into<String>,
        args: impl IntoIterator<Item = Term>,
    ) -> Self {
        Self {
            module: Atom::new(module),
            function: Atom::new(function),
            args: args.into_iter().collect(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<Term>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn push_arg(&mut self, arg: impl Into<Term>) {
        self.args.push(arg.into());
    }

    pub fn module(&self) -> &str {
        self.module.as_str()
    }

    pub fn function(&self) -> &str {
        self.function.as_str()
    }

    pub fn args(&self) -> &[Term] {
        &self.args
    }

    /// The request as a generic term.
    pub fn to_term(&self) -> Term {
        Term::Tuple(vec![
            Term::Atom(Atom::new("call")),
            Term::Atom(self.module.clone()),
            Term::Atom(self.function.clone()),
            Term::List(self.args.clone()),
        ])
    }

    /// The encoded request wrapped in a BERP length prefix, for stream
    /// transports.
    pub fn to_berp(&self) -> Result<Bytes> {
        let payload = encode_call(self)?;
        let mut framed = BytesMut::new();
        encode_berp(&payload, &mut framed).map_err(TransportError::from)?;
        Ok(framed.freeze())
    }
}

impl Encode for Call {
    fn encode_to(&self, dst: &mut BytesMut) -> bertrpc_etf::Result<()> {
        put_tuple_header(dst, 4)?;
        put_atom(dst, "call")?;
        put_atom(dst, self.module.as_str())?;
        put_atom(dst, self.function.as_str())?;
        self.args.encode_to(dst)
    }
}

/// Encode `call` as an unframed ETF term.
pub fn encode_call(call: &Call) -> Result<Bytes> {
    let payload = encode(call)?;
    debug!(
        module = call.module(),
        function = call.function(),
        args = call.args.len(),
        bytes = payload.len(),
        "encoded call"
    );
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use bertrpc_etf::{atom, binary, decode_term, CharList};

    use super::*;

    fn ejabberd_register() -> Call {
        Call::new("ejabberd_auth", "try_register")
            .arg("john")
            .arg("localhost")
            .arg("password")
    }

    #[test]
    fn encodes_call_tuple() {
        let mut want = vec![131, 104, 4, 119, 4];
        want.extend_from_slice(b"call");
        want.extend_from_slice(&[119, 13]);
        want.extend_from_slice(b"ejabberd_auth");
        want.extend_from_slice(&[119, 12]);
        want.extend_from_slice(b"try_register");
        want.extend_from_slice(&[108, 0, 0, 0, 3]);
        for arg in ["john", "localhost", "password"] {
            want.extend_from_slice(&[109, 0, 0, 0, arg.len() as u8]);
            want.extend_from_slice(arg.as_bytes());
        }
        want.push(106);

        assert_eq!(encode_call(&ejabberd_register()).unwrap().as_ref(), want.as_slice());
    }

    #[test]
    fn call_without_args_has_empty_list() {
        let bytes = encode_call(&Call::new("erlang", "node")).unwrap();
        assert!(bytes.ends_with(&[108, 0, 0, 0, 0, 106]));
    }

    #[test]
    fn encoding_matches_generic_term() {
        let call = Call::new("m", "f")
            .arg(atom("ok"))
            .arg(42)
            .arg(CharList::new("hi"));
        let decoded = decode_term(&encode_call(&call).unwrap()).unwrap();
        assert_eq!(decoded.as_tuple().map(<[Term]>::len), Some(4));
        assert!(decoded.as_tuple().unwrap()[0].is_atom("call"));
        assert_eq!(encode(&call.to_term()).unwrap(), encode_call(&call).unwrap());
    }

    #[test]
    fn berp_prefix() {
        let call = ejabberd_register();
        let payload = encode_call(&call).unwrap();
        let framed = call.to_berp().unwrap();
        assert_eq!(&framed[..4], &(payload.len() as u32).to_be_bytes());
        assert_eq!(&framed[4..], payload.as_ref());

        let mut wire = BytesMut::from(framed.as_ref());
        let packet = bertrpc_berp::decode_berp(&mut wire, usize::MAX).unwrap().unwrap();
        assert_eq!(packet, payload);
        assert!(wire.is_empty());
    }

    #[test]
    fn builder_accessors() {
        let mut call = Call::with_args("mod", "fun", [binary("a")]);
        call.push_arg(7);
        assert_eq!(call.module(), "mod");
        assert_eq!(call.function(), "fun");
        assert_eq!(call.args(), &[binary("a"), Term::int(7)]);
    }
}
