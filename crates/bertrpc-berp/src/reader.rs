use std::io::{ErrorKind, Read};
use std::net::TcpStream;

use bytes::{Bytes, BytesMut};

use crate::codec::{decode_berp, BerpConfig};
use crate::error::{BerpError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete BERP packets from any `Read` stream.
///
/// Handles partial reads internally; callers always get whole payloads.
#[derive(Debug)]
pub struct BerpReader<T> {
    inner: T,
    buf: BytesMut,
    config: BerpConfig,
}

impl<T: Read> BerpReader<T> {
    /// Create a new reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, BerpConfig::default())
    }

    /// Create a new reader with explicit configuration.
    pub fn with_config(inner: T, config: BerpConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the next complete payload (blocking).
    ///
    /// Returns `Err(BerpError::ConnectionClosed)` when EOF is reached.
    pub fn read_packet(&mut self) -> Result<Bytes> {
        loop {
            if let Some(payload) = decode_berp(&mut self.buf, self.config.max_payload_size)? {
                return Ok(payload);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(BerpError::Io(err)),
            };

            if read == 0 {
                return Err(BerpError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Read the next packet and return it with its header, as received.
    pub fn read_raw(&mut self) -> Result<Bytes> {
        let payload = self.read_packet()?;
        let mut raw = BytesMut::with_capacity(crate::codec::wire_size(payload.len()));
        crate::codec::encode_berp(&payload, &mut raw)?;
        Ok(raw.freeze())
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum payload size for subsequent reads.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    pub fn config(&self) -> &BerpConfig {
        &self.config
    }
}

impl BerpReader<TcpStream> {
    /// Create a reader for a TCP stream and apply the read timeout from config.
    pub fn with_config_tcp(inner: TcpStream, config: BerpConfig) -> Result<Self> {
        inner.set_read_timeout(config.read_timeout)?;
        Ok(Self::with_config(inner, config))
    }
}
