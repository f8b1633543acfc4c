use std::io::ErrorKind;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};

use bertrpc_berp::{BerpConfig, BerpError, BerpReader, BerpWriter};
use bytes::Bytes;
use tracing::debug;

use crate::config::TransportConfig;
use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// Endpoint prefix selecting raw BERP over TCP.
pub const TCP_SCHEME: &str = "tcp://";

/// BERT-RPC over a persistent TCP connection with BERP framing both ways.
///
/// The connection is opened on first use and reused until an error occurs,
/// after which the next round trip reconnects.
#[derive(Debug)]
pub struct TcpTransport {
    config: TransportConfig,
    addr: String,
    conn: Option<Connection>,
}

#[derive(Debug)]
struct Connection {
    reader: BerpReader<TcpStream>,
    writer: BerpWriter<TcpStream>,
}

impl TcpTransport {
    pub fn new(config: TransportConfig) -> Result<Self> {
        let addr = tcp_address(&config.endpoint)?;
        Ok(Self {
            config,
            addr,
            conn: None,
        })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// `host:port` this transport connects to.
    pub fn address(&self) -> &str {
        &self.addr
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    fn connect(&self) -> Result<Connection> {
        let connect_err = |source| TransportError::Connect {
            endpoint: self.config.endpoint.clone(),
            source,
        };
        let addrs: Vec<SocketAddr> = self.addr.to_socket_addrs().map_err(connect_err)?.collect();

        let mut last_err = std::io::Error::new(ErrorKind::NotFound, "no addresses resolved");
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.config.timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    let berp = BerpConfig {
                        max_payload_size: self.config.max_reply_size,
                        read_timeout: Some(self.config.timeout),
                        write_timeout: Some(self.config.timeout),
                    };
                    let reader = BerpReader::with_config_tcp(stream.try_clone()?, berp.clone())?;
                    let writer = BerpWriter::with_config_tcp(stream, berp)?;
                    debug!(%addr, "connected");
                    return Ok(Connection { reader, writer });
                }
                Err(err) => last_err = err,
            }
        }
        Err(connect_err(last_err))
    }

    fn exchange(&self, conn: &mut Connection, request: &[u8]) -> Result<Bytes> {
        conn.writer.send(request).map_err(|err| self.frame_error(err))?;
        let reply = conn.reader.read_raw().map_err(|err| self.frame_error(err))?;
        debug!(
            addr = %self.addr,
            request = request.len(),
            reply = reply.len(),
            "TCP round trip complete"
        );
        Ok(reply)
    }

    fn frame_error(&self, err: BerpError) -> TransportError {
        match err {
            BerpError::Io(io) if matches!(io.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                TransportError::Timeout(self.config.timeout)
            }
            other => TransportError::Frame(other),
        }
    }
}

impl Transport for TcpTransport {
    fn round_trip(&mut self, request: &[u8]) -> Result<Bytes> {
        let mut conn = match self.conn.take() {
            Some(conn) => conn,
            None => self.connect()?,
        };
        let reply = self.exchange(&mut conn, request)?;
        self.conn = Some(conn);
        Ok(reply)
    }
}

/// Strip an optional `tcp://` prefix and check for `host:port`.
fn tcp_address(endpoint: &str) -> Result<String> {
    let addr = endpoint.strip_prefix(TCP_SCHEME).unwrap_or(endpoint);
    let invalid = |reason: &str| TransportError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: reason.to_string(),
    };
    if addr.contains("://") {
        return Err(invalid("unsupported scheme (expected tcp://)"));
    }
    match addr.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
            Ok(addr.to_string())
        }
        _ => Err(invalid("expected host:port")),
    }
}
