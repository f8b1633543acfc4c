use bytes::Bytes;
use http::header::{HeaderValue, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, HOST};
use http::{Method, Request, Uri};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio::runtime::Runtime;
use tracing::debug;

use crate::config::TransportConfig;
use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// Media type of BERT request bodies.
pub const CONTENT_TYPE_BERT: &str = "application/bert";

const DEFAULT_HTTP_PORT: u16 = 80;

/// BERT-RPC over HTTP POST.
///
/// Each round trip opens a connection, posts the encoded call and returns
/// the response body. Blocking calls run on a private current-thread runtime;
/// async callers can use [`HttpTransport::post`] directly.
pub struct HttpTransport {
    config: TransportConfig,
    uri: Uri,
    authorization: Option<HeaderValue>,
    runtime: Runtime,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Result<Self> {
        let uri: Uri = config
            .endpoint
            .parse()
            .map_err(|err: http::uri::InvalidUri| invalid(&config.endpoint, err.to_string()))?;
        match uri.scheme_str() {
            Some("http") => {}
            Some(other) => {
                return Err(invalid(
                    &config.endpoint,
                    format!("unsupported scheme {other:?} (expected http)"),
                ))
            }
            None => return Err(invalid(&config.endpoint, "missing scheme")),
        }
        if uri.host().is_none() {
            return Err(invalid(&config.endpoint, "missing host"));
        }

        let authorization = match &config.token {
            Some(token) => Some(HeaderValue::from_str(&format!("Bearer {token}")).map_err(
                |_| TransportError::InvalidConfig {
                    key: "token",
                    reason: "contains characters not allowed in an HTTP header".to_string(),
                },
            )?),
            None => None,
        };

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            config,
            uri,
            authorization,
            runtime,
        })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// POST `body` to the endpoint and return the response body.
    ///
    /// The reply is read through a length limit of `max_reply_size` plus the
    /// frame header. A declared `Content-Length` over the limit fails before
    /// any body bytes are read.
    pub async fn post(&self, body: Bytes) -> Result<Bytes> {
        let host = self.uri.host().unwrap_or_default();
        let port = self.uri.port_u16().unwrap_or(DEFAULT_HTTP_PORT);
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|source| TransportError::Connect {
                endpoint: self.config.endpoint.clone(),
                source,
            })?;

        let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream)).await?;
        tokio::spawn(async move {
            if let Err(err) = conn.await {
                debug!(%err, "HTTP connection driver stopped");
            }
        });

        let path = self
            .uri
            .path_and_query()
            .map(|p| p.as_str())
            .unwrap_or("/");
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(HOST, self.uri.authority().map(|a| a.as_str()).unwrap_or(host))
            .header(CONTENT_TYPE, CONTENT_TYPE_BERT);
        if let Some(value) = &self.authorization {
            builder = builder.header(AUTHORIZATION, value.clone());
        }
        let request_len = body.len();
        let request = builder
            .body(Full::new(body))
            .map_err(|err| invalid(&self.config.endpoint, err.to_string()))?;

        let response = sender.send_request(request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }

        let max = bertrpc_berp::wire_size(self.config.max_reply_size);
        let declared = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());
        if let Some(size) = declared.filter(|size| *size > max) {
            return Err(TransportError::ReplyTooLarge { size, max });
        }

        let reply = Limited::new(response.into_body(), max)
            .collect()
            .await
            .map_err(|err| body_error(err, max))?
            .to_bytes();

        debug!(
            endpoint = %self.config.endpoint,
            request = request_len,
            reply = reply.len(),
            "HTTP round trip complete"
        );
        Ok(reply)
    }
}

impl Transport for HttpTransport {
    fn round_trip(&mut self, request: &[u8]) -> Result<Bytes> {
        let timeout = self.config.timeout;
        let body = Bytes::copy_from_slice(request);
        self.runtime
            .block_on(async { tokio::time::timeout(timeout, self.post(body)).await })
            .map_err(|_| TransportError::Timeout(timeout))?
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Map a failed limited-body read. Past the limit only a lower bound on the
/// size is known.
fn body_error(err: Box<dyn std::error::Error + Send + Sync>, max: usize) -> TransportError {
    if err.is::<LengthLimitError>() {
        return TransportError::ReplyTooLarge {
            size: max.saturating_add(1),
            max,
        };
    }
    match err.downcast::<hyper::Error>() {
        Ok(err) => TransportError::Http(*err),
        Err(other) => TransportError::Io(std::io::Error::other(other)),
    }
}

fn invalid(endpoint: &str, reason: impl Into<String>) -> TransportError {
    TransportError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;
    use std::time::Duration;

    use super::*;

    /// Serves one HTTP request and returns the raw request text.
    fn one_shot_server(status: &'static str, reply: Vec<u8>) -> (String, JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}/rpc", listener.local_addr().unwrap());
        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            let head = format!(
                "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                reply.len()
            );
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(&reply).unwrap();
            request
        });
        (endpoint, handle)
    }

    fn read_request(stream: &mut std::net::TcpStream) -> Vec<u8> {
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).unwrap();
            request.extend_from_slice(&chunk[..n]);
            if let Some(end) = find(&request, b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&request[..end]).to_ascii_lowercase();
                let len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .map(|v| v.trim().parse::<usize>().unwrap())
                    .unwrap_or(0);
                while request.len() < end + 4 + len {
                    let n = stream.read(&mut chunk).unwrap();
                    request.extend_from_slice(&chunk[..n]);
                }
                return request;
            }
            if n == 0 {
                return request;
            }
        }
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    #[test]
    fn posts_bert_body_with_headers() {
        let reply = vec![0, 0, 0, 2, 131, 106];
        let (endpoint, server) = one_shot_server("200 OK", reply.clone());
        let config = TransportConfig::new(endpoint).with_token("abc123");
        let mut transport = HttpTransport::new(config).unwrap();

        let got = transport.round_trip(&[131, 104, 0]).unwrap();
        assert_eq!(got.as_ref(), reply.as_slice());

        let request = server.join().unwrap();
        let end = find(&request, b"\r\n\r\n").unwrap();
        let head = String::from_utf8_lossy(&request[..end]).to_ascii_lowercase();
        assert!(head.starts_with("post /rpc http/1.1"));
        assert!(head.contains("content-type: application/bert"));
        assert!(head.contains("authorization: bearer abc123"));
        assert_eq!(&request[end + 4..], &[131, 104, 0]);
    }

    #[test]
    fn no_authorization_without_token() {
        let (endpoint, server) = one_shot_server("200 OK", vec![0, 0, 0, 0]);
        let mut transport = HttpTransport::new(TransportConfig::new(endpoint)).unwrap();
        transport.round_trip(&[131, 106]).unwrap();

        let request = String::from_utf8_lossy(&server.join().unwrap()).to_ascii_lowercase();
        assert!(!request.contains("authorization"));
    }

    #[test]
    fn non_success_status() {
        let (endpoint, server) = one_shot_server("500 Internal Server Error", Vec::new());
        let mut transport = HttpTransport::new(TransportConfig::new(endpoint)).unwrap();
        let err = transport.round_trip(&[131, 106]).unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 500 }));
        server.join().unwrap();
    }

    #[test]
    fn oversized_reply() {
        let (endpoint, server) = one_shot_server("200 OK", vec![0; 64]);
        let mut config = TransportConfig::new(endpoint);
        config.max_reply_size = 8;
        let mut transport = HttpTransport::new(config).unwrap();
        let err = transport.round_trip(&[131, 106]).unwrap_err();
        assert!(matches!(err, TransportError::ReplyTooLarge { size: 64, max: 12 }));
        server.join().unwrap();
    }

    #[test]
    fn oversized_chunked_reply_stops_at_limit() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}/rpc", listener.local_addr().unwrap());
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            read_request(&mut stream);
            let head = "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n";
            let _ = stream.write_all(head.as_bytes());
            for _ in 0..4 {
                let _ = stream.write_all(b"10\r\n");
                let _ = stream.write_all(&[0u8; 16]);
                let _ = stream.write_all(b"\r\n");
            }
            let _ = stream.write_all(b"0\r\n\r\n");
        });

        let mut config = TransportConfig::new(endpoint);
        config.max_reply_size = 8;
        let mut transport = HttpTransport::new(config).unwrap();
        let err = transport.round_trip(&[131, 106]).unwrap_err();
        assert!(
            matches!(err, TransportError::ReplyTooLarge { size: 13, max: 12 }),
            "{err}"
        );
        server.join().unwrap();
    }

    #[test]
    fn chunked_reply_within_limit() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}/rpc", listener.local_addr().unwrap());
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            read_request(&mut stream);
            let head = "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n";
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(b"6\r\n\x00\x00\x00\x02\x83\x6a\r\n0\r\n\r\n").unwrap();
        });

        let mut transport = HttpTransport::new(TransportConfig::new(endpoint)).unwrap();
        let got = transport.round_trip(&[131, 106]).unwrap();
        assert_eq!(got.as_ref(), &[0, 0, 0, 2, 131, 106]);
        server.join().unwrap();
    }

    #[test]
    fn times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}/", listener.local_addr().unwrap());
        let server = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            std::thread::sleep(Duration::from_millis(300));
            drop(stream);
        });

        let config = TransportConfig::new(endpoint).with_timeout(Duration::from_millis(50));
        let mut transport = HttpTransport::new(config).unwrap();
        let err = transport.round_trip(&[131, 106]).unwrap_err();
        assert!(matches!(err, TransportError::Timeout(d) if d == Duration::from_millis(50)));
        server.join().unwrap();
    }

    #[test]
    fn rejects_bad_endpoints() {
        for endpoint in ["https://example.com/rpc", "localhost:8080", "not a uri"] {
            let err = HttpTransport::new(TransportConfig::new(endpoint)).unwrap_err();
            assert!(
                matches!(err, TransportError::InvalidEndpoint { .. }),
                "{endpoint}: {err}"
            );
        }
    }

    #[test]
    fn rejects_token_with_newline() {
        let config = TransportConfig::new("http://localhost/rpc").with_token("a\nb");
        let err = HttpTransport::new(config).unwrap_err();
        assert!(matches!(err, TransportError::InvalidConfig { key: "token", .. }));
    }
}
