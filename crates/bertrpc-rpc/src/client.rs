use bertrpc_etf::{DecodeTarget, Term};
use bertrpc_transport::{TcpTransport, Transport, TransportConfig};
use tracing::debug;

use crate::call::{encode_call, Call};
use crate::error::{ApplicationError, Result};
use crate::reply::decode_reply;

/// Blocking BERT-RPC client over any [`Transport`].
///
/// One call is in flight at a time; `exec` takes `&mut self`.
#[derive(Debug)]
pub struct Client<T> {
    transport: T,
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Start building a call. Nothing is sent until [`Client::exec`].
    pub fn new_call(&self, module: impl Into<String>, function: impl Into<String>) -> Call {
        Call::new(module, function)
    }

    /// Send `call` and decode the reply into `target`.
    ///
    /// Fails with [`ApplicationError::Returned`] when the decoded result
    /// carries the `error` discriminant. The target is still filled in that
    /// case, so the reason can be read from it.
    pub fn exec(&mut self, call: &Call, target: &mut dyn DecodeTarget) -> Result<()> {
        let request = encode_call(call)?;
        let reply = self.transport.round_trip(&request)?;
        decode_reply(&mut reply.as_ref(), Some(&mut *target))?;

        if let Some(discriminant) = target.discriminant() {
            debug!(
                module = call.module(),
                function = call.function(),
                discriminant,
                "call returned"
            );
            if discriminant == "error" {
                return Err(ApplicationError::Returned {
                    discriminant: discriminant.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Build and execute a call in one step.
    pub fn call(
        &mut self,
        module: &str,
        function: &str,
        args: impl IntoIterator<Item = Term>,
        target: &mut dyn DecodeTarget,
    ) -> Result<()> {
        let call = Call::with_args(module, function, args);
        self.exec(&call, target)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }
}

#[cfg(feature = "http")]
impl Client<bertrpc_transport::HttpTransport> {
    /// Client posting calls to an `http://` endpoint.
    pub fn http(config: TransportConfig) -> Result<Self> {
        Ok(Self::new(bertrpc_transport::HttpTransport::new(config)?))
    }
}

impl Client<TcpTransport> {
    /// Client sending BERP packets over TCP to a `host:port` endpoint.
    pub fn tcp(config: TransportConfig) -> Result<Self> {
        Ok(Self::new(TcpTransport::new(config)?))
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;

    use bertrpc_etf::{atom, binary, decode_term, encode, tuple, CallResult};
    use bertrpc_transport::TransportError;
    use bytes::Bytes;

    use super::*;
    use crate::error::RpcError;

    /// Records requests and answers each with a canned reply term.
    struct MockTransport {
        reply: Term,
        requests: Vec<Bytes>,
    }

    impl MockTransport {
        fn replying(reply: Term) -> Self {
            Self {
                reply,
                requests: Vec::new(),
            }
        }
    }

    impl Transport for MockTransport {
        fn round_trip(&mut self, request: &[u8]) -> bertrpc_transport::Result<Bytes> {
            self.requests.push(Bytes::copy_from_slice(request));
            Ok(framed(&tuple([atom("reply"), self.reply.clone()])))
        }
    }

    struct FailingTransport;

    impl Transport for FailingTransport {
        fn round_trip(&mut self, _request: &[u8]) -> bertrpc_transport::Result<Bytes> {
            Err(TransportError::Status { status: 503 })
        }
    }

    fn framed(term: &Term) -> Bytes {
        let payload = encode(term).unwrap();
        let mut out = (payload.len() as u32).to_be_bytes().to_vec();
        out.extend_from_slice(&payload);
        Bytes::from(out)
    }

    #[test]
    fn registration_conflict_is_returned_error() {
        let mut client = Client::new(MockTransport::replying(tuple([
            atom("error"),
            atom("exists"),
        ])));
        let call = client
            .new_call("ejabberd_auth", "try_register")
            .arg("john")
            .arg("localhost")
            .arg("password");

        let mut result = CallResult::<String>::default();
        let err = client.exec(&call, &mut result).unwrap_err();

        assert!(matches!(
            err,
            RpcError::Application(ApplicationError::Returned { ref discriminant }) if discriminant == "error"
        ));
        assert_eq!(result.reason, "exists");

        let sent = decode_term(&client.transport().requests[0]).unwrap();
        let fields = sent.as_tuple().unwrap();
        assert!(fields[0].is_atom("call"));
        assert!(fields[1].is_atom("ejabberd_auth"));
        assert!(fields[2].is_atom("try_register"));
        assert_eq!(fields[3].as_list().map(<[Term]>::len), Some(3));
    }

    #[test]
    fn ok_result_succeeds() {
        let mut client = Client::new(MockTransport::replying(tuple([
            atom("ok"),
            binary("registered"),
        ])));
        let mut result = CallResult::<String>::default();
        client
            .call("ejabberd_auth", "try_register", [binary("jane")], &mut result)
            .unwrap();
        assert!(result.is_ok());
        assert_eq!(result.value, "registered");
    }

    #[test]
    fn reused_result_holds_only_latest_reply() {
        let mut client = Client::new(MockTransport::replying(tuple([
            atom("ok"),
            binary("first"),
        ])));
        let mut result = CallResult::<String>::default();
        client.call("m", "f", [], &mut result).unwrap();
        assert_eq!(result.value, "first");

        client.transport_mut().reply = tuple([atom("error"), atom("gone")]);
        client.call("m", "f", [], &mut result).unwrap_err();
        assert_eq!(result.reason, "gone");
        assert!(result.value.is_empty());
    }

    #[test]
    fn plain_targets_have_no_discriminant() {
        let mut client = Client::new(MockTransport::replying(Term::int(3)));
        let mut count = 0u16;
        client.call("math", "add", [Term::int(1), Term::int(2)], &mut count).unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn generic_term_with_error_tag() {
        let mut client = Client::new(MockTransport::replying(tuple([
            atom("error"),
            atom("badarg"),
        ])));
        let mut term = Term::Nil;
        let err = client.call("m", "f", [], &mut term).unwrap_err();
        assert!(matches!(err, RpcError::Application(_)));
        assert_eq!(term.to_string(), "{error,badarg}");
    }

    #[test]
    fn transport_errors_propagate() {
        let mut client = Client::new(FailingTransport);
        let err = client.call("m", "f", [], &mut ()).unwrap_err();
        assert!(matches!(
            err,
            RpcError::Transport(TransportError::Status { status: 503 })
        ));
    }

    #[test]
    fn tcp_end_to_end() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = listener.local_addr().unwrap().to_string();
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut header = [0u8; 4];
            stream.read_exact(&mut header).unwrap();
            let mut request = vec![0u8; u32::from_be_bytes(header) as usize];
            stream.read_exact(&mut request).unwrap();
            let call = decode_term(&request).unwrap();
            let name = call.as_tuple().unwrap()[3].as_list().unwrap()[0]
                .as_text()
                .unwrap();
            let reply = tuple([atom("reply"), tuple([atom("ok"), binary(format!("hi {name}"))])]);
            stream.write_all(&framed(&reply)).unwrap();
        });

        let mut client = Client::tcp(TransportConfig::new(endpoint)).unwrap();
        let mut result = CallResult::<String>::default();
        client
            .call("greeter", "hello", [binary("ana")], &mut result)
            .unwrap();
        assert_eq!(result.value, "hi ana");
        assert!(client.transport().is_connected());
        server.join().unwrap();
    }
}
