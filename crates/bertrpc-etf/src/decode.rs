use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};

use crate::encode::Encode;
use crate::error::{EtfError, Result};
use crate::tag;
use crate::target::DecodeTarget;
use crate::term::{Atom, Term};

/// Default cap on any declared length: 16 MiB.
pub const DEFAULT_MAX_LENGTH: usize = 16 * 1024 * 1024;

/// Default cap on generic term nesting.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Upper bound on up-front `Vec` reservation for declared element counts.
const PREALLOC_LIMIT: usize = 1024;

/// Bounds applied to lengths read from the wire before allocating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Largest accepted tuple arity, list count, or byte length.
    pub max_length: usize,
    /// Deepest accepted nesting when decoding generic terms.
    pub max_depth: usize,
}

impl DecodeLimits {
    /// No caps beyond the wire's own bit widths.
    pub fn unbounded() -> Self {
        Self {
            max_length: usize::MAX,
            max_depth: usize::MAX,
        }
    }
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Reads tagged values from a byte stream.
///
/// Each `decode_*` call consumes exactly one wire value. Short reads are
/// retried until the declared length is satisfied; a stream that ends early
/// fails with [`EtfError::TruncatedData`].
pub struct Decoder<'a> {
    reader: &'a mut dyn Read,
    limits: DecodeLimits,
    peeked: Option<u8>,
}

impl<'a> Decoder<'a> {
    /// Create a decoder with default limits.
    pub fn new(reader: &'a mut dyn Read) -> Self {
        Self::with_limits(reader, DecodeLimits::default())
    }

    /// Create a decoder with explicit limits.
    pub fn with_limits(reader: &'a mut dyn Read, limits: DecodeLimits) -> Self {
        Self {
            reader,
            limits,
            peeked: None,
        }
    }

    pub fn limits(&self) -> DecodeLimits {
        self.limits
    }

    /// Consume the version marker that precedes a top-level term.
    pub fn decode_version(&mut self) -> Result<()> {
        match self.read_tag()? {
            tag::VERSION => Ok(()),
            other => Err(EtfError::BadVersion(other)),
        }
    }

    /// Look at the next tag without consuming it.
    pub fn peek_tag(&mut self) -> Result<u8> {
        let tag = self.read_tag()?;
        self.peeked = Some(tag);
        Ok(tag)
    }

    pub fn decode_int(&mut self) -> Result<i64> {
        let tag = self.read_tag()?;
        self.int_body(tag)
    }

    /// Decode any text-like value: atom, binary, legacy string, or charlist.
    pub fn decode_text(&mut self) -> Result<String> {
        let tag = self.read_tag()?;
        match tag {
            tag::SMALL_ATOM_UTF8 | tag::ATOM_UTF8 | tag::ATOM_LATIN1 => self.atom_body(tag),
            tag::BINARY => {
                let len = self.read_u32()? as usize;
                utf8(self.read_bytes(len)?)
            }
            tag::STRING => {
                let len = usize::from(self.read_u16()?);
                Ok(latin1(&self.read_bytes(len)?))
            }
            tag::NIL => Ok(String::new()),
            tag::LIST => {
                let count = self.read_count()?;
                let mut text = String::with_capacity(count.min(PREALLOC_LIMIT));
                for _ in 0..count {
                    let cp = self.decode_int()?;
                    let ch = u32::try_from(cp)
                        .ok()
                        .and_then(char::from_u32)
                        .ok_or(EtfError::InvalidCodePoint(cp))?;
                    text.push(ch);
                }
                self.expect_nil()?;
                Ok(text)
            }
            other => Err(EtfError::UnexpectedTag {
                tag: other,
                context: "text",
            }),
        }
    }

    pub fn decode_atom(&mut self) -> Result<String> {
        let tag = self.read_tag()?;
        self.atom_body(tag)
    }

    /// Read a tuple header and return its arity. Elements follow.
    pub fn decode_tuple_header(&mut self) -> Result<usize> {
        let arity = match self.read_tag()? {
            tag::SMALL_TUPLE => usize::from(self.read_u8()?),
            tag::LARGE_TUPLE => self.read_u32()? as usize,
            other => {
                return Err(EtfError::UnexpectedTag {
                    tag: other,
                    context: "tuple",
                })
            }
        };
        self.checked_len(arity)
    }

    /// Consume the empty-list marker.
    pub fn decode_nil(&mut self) -> Result<()> {
        self.expect_nil()
    }

    /// Read a list header and return its element count.
    ///
    /// The caller reads `count` elements and then [`decode_nil`](Self::decode_nil).
    /// `Nil` reads as a header of zero elements and leaves itself as the
    /// terminator.
    pub fn decode_list_header(&mut self) -> Result<usize> {
        match self.read_tag()? {
            tag::LIST => self.read_count(),
            tag::NIL => {
                self.peeked = Some(tag::NIL);
                Ok(0)
            }
            other => Err(EtfError::UnexpectedTag {
                tag: other,
                context: "list",
            }),
        }
    }

    /// Decode a proper list, calling `each` once per element.
    ///
    /// A legacy byte string is treated as a list of small integers, which is
    /// how the runtime encodes short integer lists.
    pub fn decode_list<F>(&mut self, mut each: F) -> Result<usize>
    where
        F: FnMut(&mut Decoder<'_>) -> Result<()>,
    {
        if self.peek_tag()? == tag::STRING {
            self.peeked = None;
            let len = usize::from(self.read_u16()?);
            let bytes = self.read_bytes(len)?;
            for byte in &bytes {
                let mut src: &[u8] = &[tag::SMALL_INTEGER, *byte];
                let mut elem = Decoder::with_limits(&mut src, self.limits);
                each(&mut elem)?;
            }
            return Ok(bytes.len());
        }
        let count = self.decode_list_header()?;
        for _ in 0..count {
            each(self)?;
        }
        self.expect_nil()?;
        Ok(count)
    }

    /// Decode one value without a target shape.
    pub fn decode_term(&mut self) -> Result<Term> {
        self.term_at(0)
    }

    /// Consume one value and discard it.
    pub fn skip_term(&mut self) -> Result<()> {
        self.decode_term().map(drop)
    }

    /// Decode an already-materialized term into `target`.
    pub fn replay(&self, term: &Term, target: &mut dyn DecodeTarget) -> Result<()> {
        let mut buf = BytesMut::new();
        term.encode_to(&mut buf)?;
        let mut src: &[u8] = &buf;
        let mut decoder = Decoder::with_limits(&mut src, self.limits);
        target.decode_from(&mut decoder)
    }

    /// Read a raw big-endian `u32`, e.g. a frame length.
    pub fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.fill(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    fn term_at(&mut self, depth: usize) -> Result<Term> {
        if depth >= self.limits.max_depth {
            return Err(EtfError::LimitExceeded {
                declared: depth + 1,
                max: self.limits.max_depth,
            });
        }
        let tag = self.read_tag()?;
        let term = match tag {
            tag::SMALL_INTEGER => Term::SmallInt(self.read_u8()?),
            tag::INTEGER => Term::Int(self.read_i32()?),
            tag::SMALL_ATOM_UTF8 | tag::ATOM_UTF8 | tag::ATOM_LATIN1 => {
                Term::Atom(Atom::new(self.atom_body(tag)?))
            }
            tag::BINARY => {
                let len = self.read_u32()? as usize;
                Term::Binary(Bytes::from(self.read_bytes(len)?))
            }
            tag::STRING => {
                let len = usize::from(self.read_u16()?);
                Term::LegacyString(Bytes::from(self.read_bytes(len)?))
            }
            tag::SMALL_TUPLE | tag::LARGE_TUPLE => {
                let arity = if tag == tag::SMALL_TUPLE {
                    usize::from(self.read_u8()?)
                } else {
                    self.read_u32()? as usize
                };
                let arity = self.checked_len(arity)?;
                let mut elems = Vec::with_capacity(arity.min(PREALLOC_LIMIT));
                for _ in 0..arity {
                    elems.push(self.term_at(depth + 1)?);
                }
                Term::Tuple(elems)
            }
            tag::LIST => {
                let count = self.read_count()?;
                let mut elems = Vec::with_capacity(count.min(PREALLOC_LIMIT));
                for _ in 0..count {
                    elems.push(self.term_at(depth + 1)?);
                }
                self.expect_nil()?;
                Term::List(elems)
            }
            tag::NIL => Term::Nil,
            other => {
                return Err(EtfError::UnexpectedTag {
                    tag: other,
                    context: "term",
                })
            }
        };
        Ok(term)
    }

    fn int_body(&mut self, tag: u8) -> Result<i64> {
        match tag {
            tag::SMALL_INTEGER => Ok(i64::from(self.read_u8()?)),
            tag::INTEGER => Ok(i64::from(self.read_i32()?)),
            other => Err(EtfError::UnexpectedTag {
                tag: other,
                context: "integer",
            }),
        }
    }

    fn atom_body(&mut self, tag: u8) -> Result<String> {
        match tag {
            tag::SMALL_ATOM_UTF8 => {
                let len = usize::from(self.read_u8()?);
                utf8(self.read_bytes(len)?)
            }
            tag::ATOM_UTF8 => {
                let len = usize::from(self.read_u16()?);
                utf8(self.read_bytes(len)?)
            }
            tag::ATOM_LATIN1 => {
                let len = usize::from(self.read_u16()?);
                Ok(latin1(&self.read_bytes(len)?))
            }
            other => Err(EtfError::UnexpectedTag {
                tag: other,
                context: "atom",
            }),
        }
    }

    fn expect_nil(&mut self) -> Result<()> {
        match self.read_tag()? {
            tag::NIL => Ok(()),
            other => Err(EtfError::UnexpectedTag {
                tag: other,
                context: "list terminator",
            }),
        }
    }

    fn read_count(&mut self) -> Result<usize> {
        let declared = self.read_u32()? as usize;
        self.checked_len(declared)
    }

    fn checked_len(&self, declared: usize) -> Result<usize> {
        if declared > self.limits.max_length {
            return Err(EtfError::LimitExceeded {
                declared,
                max: self.limits.max_length,
            });
        }
        Ok(declared)
    }

    fn read_tag(&mut self) -> Result<u8> {
        if let Some(tag) = self.peeked.take() {
            return Ok(tag);
        }
        let mut buf = [0u8; 1];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return Err(EtfError::EndOfStream),
                Ok(_) => return Ok(buf[0]),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(EtfError::Io(err)),
            }
        }
    }

    fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.fill(&mut buf)?;
        Ok(buf[0])
    }

    fn read_u16(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.fill(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn read_i32(&mut self) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.fill(&mut buf)?;
        Ok(i32::from_be_bytes(buf))
    }

    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let len = self.checked_len(len)?;
        let mut buf = vec![0u8; len];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0usize;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(EtfError::TruncatedData {
                        expected: buf.len(),
                        available: filled,
                    })
                }
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(EtfError::Io(err)),
            }
        }
        Ok(())
    }
}

fn utf8(bytes: Vec<u8>) -> Result<String> {
    Ok(String::from_utf8(bytes)?)
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|b| char::from(*b)).collect()
}

/// Decode a top-level term from `reader` into `target`.
pub fn decode_into(reader: &mut dyn Read, target: &mut dyn DecodeTarget) -> Result<()> {
    let mut decoder = Decoder::new(reader);
    decoder.decode_version()?;
    target.decode_from(&mut decoder)
}

/// Decode a top-level term from a byte slice into a fresh `T`.
pub fn decode<T: DecodeTarget + Default>(mut bytes: &[u8]) -> Result<T> {
    let mut target = T::default();
    decode_into(&mut bytes, &mut target)?;
    Ok(target)
}

/// Decode a top-level term from a byte slice without a target shape.
pub fn decode_term(mut bytes: &[u8]) -> Result<Term> {
    let mut decoder = Decoder::new(&mut bytes);
    decoder.decode_version()?;
    decoder.decode_term()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::encode::encode;
    use crate::term::{atom, binary, list, tuple};

    #[test]
    fn integers() {
        let cases: [(&[u8], i64); 6] = [
            (&[131, 97, 42], 42),
            (&[131, 97, 255], 255),
            (&[131, 98, 255, 255, 255, 0], -256),
            (&[131, 98, 0, 0, 1, 0], 256),
            (&[131, 98, 128, 0, 0, 0], -2147483648),
            (&[131, 98, 127, 255, 255, 255], 2147483647),
        ];
        for (input, want) in cases {
            let got: i64 = decode(input).unwrap();
            assert_eq!(got, want);
        }
    }

    #[test]
    fn text_from_every_text_tag() {
        let long = "\u{1F596}".repeat(64);
        let mut long_atom = vec![131, 118, 1, 0];
        long_atom.extend_from_slice(long.as_bytes());

        let cases: Vec<(Vec<u8>, String)> = vec![
            (vec![131, 100, 0, 0], String::new()),
            (vec![131, 100, 0, 2, 111, 107], "ok".into()),
            (vec![131, 119, 4, 240, 159, 150, 150], "\u{1F596}".into()),
            (long_atom, long),
            (vec![131, 107, 0, 5, 72, 101, 108, 108, 111], "Hello".into()),
            (vec![131, 109, 0, 0, 0, 5, 72, 101, 108, 108, 111], "Hello".into()),
            (
                vec![131, 109, 0, 0, 0, 10, 240, 159, 150, 150, 32, 72, 101, 108, 108, 111],
                "\u{1F596} Hello".into(),
            ),
            (
                vec![131, 108, 0, 0, 0, 3, 98, 0, 1, 245, 150, 97, 72, 97, 105, 106],
                "\u{1F596}Hi".into(),
            ),
            (vec![131, 106], String::new()),
        ];
        for (input, want) in cases {
            let got: String = decode(&input).unwrap();
            assert_eq!(got, want);
        }
    }

    #[test]
    fn latin1_atom_maps_bytes_to_code_points() {
        let got: String = decode(&[131, 100, 0, 3, 0x63, 0x61, 0xE9]).unwrap();
        assert_eq!(got, "ca\u{e9}");
    }

    #[test]
    fn charlist_with_single_large_code_point() {
        let got: String = decode(&[131, 108, 0, 0, 0, 1, 98, 0, 1, 244, 150, 106]).unwrap();
        assert_eq!(got, "\u{1F496}");
        assert_eq!(got.chars().count(), 1);
    }

    #[test]
    fn charlist_without_terminator_fails() {
        let err = decode::<String>(&[131, 108, 0, 0, 0, 1, 97, 72]).unwrap_err();
        assert!(matches!(err, EtfError::EndOfStream));

        let err = decode::<String>(&[131, 108, 0, 0, 0, 1, 97, 72, 97]).unwrap_err();
        assert!(matches!(
            err,
            EtfError::UnexpectedTag {
                tag: 97,
                context: "list terminator"
            }
        ));
    }

    #[test]
    fn charlist_rejects_surrogates() {
        let err = decode::<String>(&[131, 108, 0, 0, 0, 1, 98, 0, 0, 0xD8, 0x00, 106]).unwrap_err();
        assert!(matches!(err, EtfError::InvalidCodePoint(0xD800)));
    }

    #[test]
    fn truncated_payload_is_not_end_of_stream() {
        let err = decode::<String>(&[131, 109, 0, 0, 0, 5, 72, 101]).unwrap_err();
        assert!(matches!(
            err,
            EtfError::TruncatedData {
                expected: 5,
                available: 2
            }
        ));

        let err = decode::<i64>(&[131, 98, 0, 0]).unwrap_err();
        assert!(matches!(err, EtfError::TruncatedData { expected: 4, .. }));

        let err = decode::<i64>(&[131]).unwrap_err();
        assert!(matches!(err, EtfError::EndOfStream));
    }

    #[test]
    fn bad_version_byte() {
        let err = decode::<i64>(&[130, 97, 1]).unwrap_err();
        assert!(matches!(err, EtfError::BadVersion(130)));
    }

    #[test]
    fn integer_from_wrong_tag() {
        let err = decode::<i64>(&[131, 109, 0, 0, 0, 0]).unwrap_err();
        assert!(matches!(
            err,
            EtfError::UnexpectedTag {
                tag: 109,
                context: "integer"
            }
        ));
    }

    #[test]
    fn tuple_header_consumes_only_header() {
        let mut src: &[u8] = &[104, 2, 97, 1, 97, 2, 105, 0, 0, 1, 0];
        let mut decoder = Decoder::new(&mut src);
        assert_eq!(decoder.decode_tuple_header().unwrap(), 2);
        assert_eq!(decoder.decode_int().unwrap(), 1);
        assert_eq!(decoder.decode_int().unwrap(), 2);
        assert_eq!(decoder.decode_tuple_header().unwrap(), 256);
        assert!(src.is_empty());
    }

    #[test]
    fn declared_length_over_limit() {
        let mut src: &[u8] = &[109, 0, 1, 0, 0];
        let limits = DecodeLimits {
            max_length: 1024,
            ..DecodeLimits::default()
        };
        let mut decoder = Decoder::with_limits(&mut src, limits);
        let err = decoder.decode_text().unwrap_err();
        assert!(matches!(
            err,
            EtfError::LimitExceeded {
                declared: 65536,
                max: 1024
            }
        ));
    }

    #[test]
    fn nesting_over_limit() {
        let mut bytes = vec![131];
        for _ in 0..8 {
            bytes.extend_from_slice(&[104, 1]);
        }
        bytes.push(106);
        let mut src: &[u8] = &bytes;
        let mut decoder = Decoder::with_limits(
            &mut src,
            DecodeLimits {
                max_depth: 4,
                ..DecodeLimits::default()
            },
        );
        decoder.decode_version().unwrap();
        let err = decoder.decode_term().unwrap_err();
        assert!(matches!(err, EtfError::LimitExceeded { max: 4, .. }));
    }

    #[test]
    fn generic_term_roundtrip() {
        let term = tuple([
            atom("reply"),
            list([binary("a"), Term::int(-7), Term::Nil]),
            Term::int(300),
        ]);
        let data = encode(&term).unwrap();
        assert_eq!(decode_term(&data).unwrap(), term);
    }

    #[test]
    fn empty_encoded_list_decodes_as_empty_list() {
        let data = encode(&Vec::<i32>::new()).unwrap();
        assert_eq!(decode_term(&data).unwrap(), Term::List(Vec::new()));
    }

    #[test]
    fn legacy_string_decodes_as_byte_list() {
        let got: Vec<i32> = decode(&[131, 107, 0, 3, 1, 2, 3]).unwrap();
        assert_eq!(got, vec![1, 2, 3]);
    }

    #[test]
    fn list_header_then_terminator() {
        let mut src: &[u8] = &[108, 0, 0, 0, 2, 97, 1, 97, 2, 106, 106];
        let mut decoder = Decoder::new(&mut src);
        assert_eq!(decoder.decode_list_header().unwrap(), 2);
        assert_eq!(decoder.decode_int().unwrap(), 1);
        assert_eq!(decoder.decode_int().unwrap(), 2);
        decoder.decode_nil().unwrap();
        assert_eq!(decoder.decode_list_header().unwrap(), 0);
        decoder.decode_nil().unwrap();
        assert!(matches!(decoder.decode_nil(), Err(EtfError::EndOfStream)));
    }

    #[test]
    fn peek_does_not_consume() {
        let mut src: &[u8] = &[97, 7];
        let mut decoder = Decoder::new(&mut src);
        assert_eq!(decoder.peek_tag().unwrap(), tag::SMALL_INTEGER);
        assert_eq!(decoder.decode_int().unwrap(), 7);
    }

    #[test]
    fn short_reads_are_retried() {
        let data = encode("a longer binary payload").unwrap();
        let mut reader = OneByteReader {
            inner: Cursor::new(data.to_vec()),
        };
        let mut target = String::new();
        decode_into(&mut reader, &mut target).unwrap();
        assert_eq!(target, "a longer binary payload");
    }

    #[test]
    fn interrupted_reads_are_retried() {
        let data = encode(&1000).unwrap();
        let mut reader = InterruptedOnce {
            interrupted: false,
            inner: Cursor::new(data.to_vec()),
        };
        let mut target = 0i32;
        decode_into(&mut reader, &mut target).unwrap();
        assert_eq!(target, 1000);
    }

    #[test]
    fn io_errors_propagate() {
        let mut reader = AlwaysFails;
        let mut target = 0i32;
        let err = decode_into(&mut reader, &mut target).unwrap_err();
        assert!(matches!(err, EtfError::Io(e) if e.kind() == ErrorKind::ConnectionReset));
    }

    struct OneByteReader {
        inner: Cursor<Vec<u8>>,
    }

    impl Read for OneByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let len = buf.len().min(1);
            self.inner.read(&mut buf[..len])
        }
    }

    struct InterruptedOnce {
        interrupted: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedOnce {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }

    struct AlwaysFails;

    impl Read for AlwaysFails {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::ConnectionReset))
        }
    }
}
