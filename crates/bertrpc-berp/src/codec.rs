use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::error::{BerpError, Result};

/// Packet header: big-endian payload length.
pub const HEADER_SIZE: usize = 4;

/// Default maximum payload size: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// Wire size of a packet carrying `payload_len` bytes.
pub fn wire_size(payload_len: usize) -> usize {
    HEADER_SIZE + payload_len
}

/// Encode a payload as a BERP packet.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────────┐
/// │ Length       │ Payload          │
/// │ (4B BE)      │ (Length bytes)   │
/// └──────────────┴──────────────────┘
/// ```
pub fn encode_berp(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let len = u32::try_from(payload.len()).map_err(|_| BerpError::PayloadTooLarge {
        size: payload.len(),
        max: u32::MAX as usize,
    })?;
    dst.reserve(wire_size(payload.len()));
    dst.put_u32(len);
    dst.put_slice(payload);
    trace!(payload = payload.len(), "encoded BERP packet");
    Ok(())
}

/// Decode one packet from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete packet yet.
/// On success, consumes the packet bytes from the buffer and returns the
/// payload.
pub fn decode_berp(src: &mut BytesMut, max_payload: usize) -> Result<Option<Bytes>> {
    let Some(header) = src.get(..HEADER_SIZE) else {
        return Ok(None);
    };
    let payload_len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;

    if payload_len > max_payload {
        return Err(BerpError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    if src.len() < wire_size(payload_len) {
        src.reserve(wire_size(payload_len) - src.len());
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    Ok(Some(src.split_to(payload_len).freeze()))
}

/// Configuration for BERP readers and writers.
#[derive(Debug, Clone)]
pub struct BerpConfig {
    /// Maximum payload size in bytes. Default: 16 MiB.
    pub max_payload_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for BerpConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
