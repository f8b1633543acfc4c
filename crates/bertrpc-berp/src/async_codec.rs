use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_berp, encode_berp, DEFAULT_MAX_PAYLOAD};
use crate::error::{BerpError, Result};

/// `tokio_util` codec yielding one payload per BERP packet.
#[derive(Debug, Clone)]
pub struct BerpCodec {
    max_payload_size: usize,
}

impl BerpCodec {
    pub fn new() -> Self {
        Self::with_max_payload(DEFAULT_MAX_PAYLOAD)
    }

    pub fn with_max_payload(max_payload_size: usize) -> Self {
        Self { max_payload_size }
    }

    pub fn max_payload_size(&self) -> usize {
        self.max_payload_size
    }
}

impl Default for BerpCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for BerpCodec {
    type Item = Bytes;
    type Error = BerpError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        decode_berp(src, self.max_payload_size)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        match self.decode(src)? {
            Some(payload) => Ok(Some(payload)),
            None if src.is_empty() => Ok(None),
            None => Err(BerpError::ConnectionClosed),
        }
    }
}

impl<B: AsRef<[u8]>> Encoder<B> for BerpCodec {
    type Error = BerpError;

    fn encode(&mut self, payload: B, dst: &mut BytesMut) -> Result<()> {
        let payload = payload.as_ref();
        if payload.len() > self.max_payload_size {
            return Err(BerpError::PayloadTooLarge {
                size: payload.len(),
                max: self.max_payload_size,
            });
        }
        encode_berp(payload, dst)
    }
}
