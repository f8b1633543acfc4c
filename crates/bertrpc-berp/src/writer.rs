use std::io::{ErrorKind, Write};
use std::net::TcpStream;

use bytes::BytesMut;

use crate::codec::{encode_berp, BerpConfig};
use crate::error::{BerpError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete BERP packets to any `Write` stream.
#[derive(Debug)]
pub struct BerpWriter<T> {
    inner: T,
    buf: BytesMut,
    config: BerpConfig,
}

impl<T: Write> BerpWriter<T> {
    /// Create a new writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, BerpConfig::default())
    }

    /// Create a new writer with explicit configuration.
    pub fn with_config(inner: T, config: BerpConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Frame and send one payload (blocking).
    ///
    /// `WouldBlock` is returned as [`BerpError::Io`]; on a socket with a write
    /// timeout that is how an expired timeout surfaces.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        if payload.len() > self.config.max_payload_size {
            return Err(BerpError::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_payload_size,
            });
        }

        self.buf.clear();
        encode_berp(payload, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(BerpError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(BerpError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(BerpError::Io(err)),
            }
        }
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

    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    pub fn config(&self) -> &BerpConfig {
        &self.config
    }
}

impl BerpWriter<TcpStream> {
    /// Create a writer for a TCP stream and apply the write timeout from config.
    pub fn with_config_tcp(inner: TcpStream, config: BerpConfig) -> Result<Self> {
        inner.set_write_timeout(config.write_timeout)?;
        Ok(Self::with_config(inner, config))
    }
}
