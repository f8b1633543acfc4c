use bytes::Bytes;

use crate::error::Result;

/// Moves one encoded request to a server and returns its reply.
///
/// `request` is an unframed ETF `call` term. The returned bytes are the
/// BERP-framed reply exactly as received: a 4-byte big-endian length
/// followed by the ETF payload.
pub trait Transport {
    fn round_trip(&mut self, request: &[u8]) -> Result<Bytes>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn round_trip(&mut self, request: &[u8]) -> Result<Bytes> {
        (**self).round_trip(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn round_trip(&mut self, request: &[u8]) -> Result<Bytes> {
        (**self).round_trip(request)
    }
}
