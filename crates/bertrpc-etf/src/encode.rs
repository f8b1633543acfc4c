use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::error::{EtfError, Result};
use crate::tag;
use crate::term::{Atom, CharList, Term};

/// A value with a known ETF representation.
pub trait Encode {
    /// Append the value's wire bytes (without the version marker) to `dst`.
    fn encode_to(&self, dst: &mut BytesMut) -> Result<()>;
}

/// Encode a top-level term, prefixed with the version marker.
pub fn encode<T: Encode + ?Sized>(value: &T) -> Result<Bytes> {
    let mut dst = BytesMut::new();
    encode_into(value, &mut dst)?;
    Ok(dst.freeze())
}

/// Append a top-level term to `dst`.
///
/// On failure `dst` is restored to its previous length.
pub fn encode_into<T: Encode + ?Sized>(value: &T, dst: &mut BytesMut) -> Result<()> {
    let start = dst.len();
    dst.put_u8(tag::VERSION);
    if let Err(err) = value.encode_to(dst) {
        dst.truncate(start);
        return Err(err);
    }
    trace!(bytes = dst.len() - start, "encoded term");
    Ok(())
}

/// Integer: small form for `0..=255`, 4-byte form otherwise.
pub fn put_int(dst: &mut BytesMut, value: i32) {
    match u8::try_from(value) {
        Ok(small) => {
            dst.put_u8(tag::SMALL_INTEGER);
            dst.put_u8(small);
        }
        Err(_) => {
            dst.put_u8(tag::INTEGER);
            dst.put_i32(value);
        }
    }
}

/// UTF-8 atom, small header when the name fits in 255 bytes.
pub fn put_atom(dst: &mut BytesMut, name: &str) -> Result<()> {
    let len = name.len();
    if let Ok(small) = u8::try_from(len) {
        dst.put_u8(tag::SMALL_ATOM_UTF8);
        dst.put_u8(small);
    } else if let Ok(standard) = u16::try_from(len) {
        dst.put_u8(tag::ATOM_UTF8);
        dst.put_u16(standard);
    } else {
        return Err(EtfError::LimitExceeded {
            declared: len,
            max: u16::MAX as usize,
        });
    }
    dst.put_slice(name.as_bytes());
    Ok(())
}

pub fn put_binary(dst: &mut BytesMut, bytes: &[u8]) -> Result<()> {
    let len = checked_u32(bytes.len())?;
    dst.reserve(5 + bytes.len());
    dst.put_u8(tag::BINARY);
    dst.put_u32(len);
    dst.put_slice(bytes);
    Ok(())
}

pub fn put_tuple_header(dst: &mut BytesMut, arity: usize) -> Result<()> {
    if let Ok(small) = u8::try_from(arity) {
        dst.put_u8(tag::SMALL_TUPLE);
        dst.put_u8(small);
    } else {
        dst.put_u8(tag::LARGE_TUPLE);
        dst.put_u32(checked_u32(arity)?);
    }
    Ok(())
}

/// List header. The caller writes `count` elements, then [`put_nil`].
pub fn put_list_header(dst: &mut BytesMut, count: usize) -> Result<()> {
    dst.put_u8(tag::LIST);
    dst.put_u32(checked_u32(count)?);
    Ok(())
}

pub fn put_nil(dst: &mut BytesMut) {
    dst.put_u8(tag::NIL);
}

pub fn put_charlist(dst: &mut BytesMut, text: &str) -> Result<()> {
    put_list_header(dst, text.chars().count())?;
    for ch in text.chars() {
        // Scalar values stop at 0x10FFFF.
        put_int(dst, ch as i32);
    }
    put_nil(dst);
    Ok(())
}

fn checked_u32(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| EtfError::LimitExceeded {
        declared: len,
        max: u32::MAX as usize,
    })
}

macro_rules! encode_lossless_int {
    ($($ty:ty),*) => {
        $(
            impl Encode for $ty {
                fn encode_to(&self, dst: &mut BytesMut) -> Result<()> {
                    put_int(dst, i32::from(*self));
                    Ok(())
                }
            }
        )*
    };
}

macro_rules! encode_narrowed_int {
    ($($ty:ty),*) => {
        $(
            impl Encode for $ty {
                fn encode_to(&self, dst: &mut BytesMut) -> Result<()> {
                    let value = i32::try_from(*self).map_err(|_| EtfError::OutOfRange {
                        value: i64::try_from(*self).unwrap_or(i64::MAX),
                        target: "i32",
                    })?;
                    put_int(dst, value);
                    Ok(())
                }
            }
        )*
    };
}

encode_lossless_int!(i8, i16, i32, u8, u16);
encode_narrowed_int!(i64, isize, u32, u64, usize);

impl Encode for str {
    fn encode_to(&self, dst: &mut BytesMut) -> Result<()> {
        put_binary(dst, self.as_bytes())
    }
}

impl Encode for String {
    fn encode_to(&self, dst: &mut BytesMut) -> Result<()> {
        put_binary(dst, self.as_bytes())
    }
}

impl Encode for Bytes {
    fn encode_to(&self, dst: &mut BytesMut) -> Result<()> {
        put_binary(dst, self)
    }
}

impl Encode for Atom {
    fn encode_to(&self, dst: &mut BytesMut) -> Result<()> {
        put_atom(dst, self.as_str())
    }
}

impl Encode for CharList {
    fn encode_to(&self, dst: &mut BytesMut) -> Result<()> {
        put_charlist(dst, self.as_str())
    }
}

impl Encode for Term {
    fn encode_to(&self, dst: &mut BytesMut) -> Result<()> {
        match self {
            Term::SmallInt(v) => {
                put_int(dst, i32::from(*v));
                Ok(())
            }
            Term::Int(v) => {
                put_int(dst, *v);
                Ok(())
            }
            Term::Atom(atom) => atom.encode_to(dst),
            Term::Binary(bytes) => put_binary(dst, bytes),
            Term::LegacyString(_) => Err(EtfError::UnsupportedType("legacy string")),
            Term::CharList(text) => text.encode_to(dst),
            Term::Tuple(elems) => {
                put_tuple_header(dst, elems.len())?;
                elems.iter().try_for_each(|e| e.encode_to(dst))
            }
            Term::List(elems) => elems.as_slice().encode_to(dst),
            Term::Nil => {
                put_nil(dst);
                Ok(())
            }
        }
    }
}

impl<T: Encode> Encode for [T] {
    fn encode_to(&self, dst: &mut BytesMut) -> Result<()> {
        put_list_header(dst, self.len())?;
        for elem in self {
            elem.encode_to(dst)?;
        }
        put_nil(dst);
        Ok(())
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode_to(&self, dst: &mut BytesMut) -> Result<()> {
        self.as_slice().encode_to(dst)
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode_to(&self, dst: &mut BytesMut) -> Result<()> {
        (**self).encode_to(dst)
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    fn encode_to(&self, dst: &mut BytesMut) -> Result<()> {
        (**self).encode_to(dst)
    }
}

/// The empty tuple `{}`.
impl Encode for () {
    fn encode_to(&self, dst: &mut BytesMut) -> Result<()> {
        put_tuple_header(dst, 0)
    }
}

macro_rules! encode_tuple {
    ($len:expr => $($name:ident),+) => {
        impl<$($name: Encode),+> Encode for ($($name,)+) {
            #[allow(non_snake_case)]
            fn encode_to(&self, dst: &mut BytesMut) -> Result<()> {
                let ($($name,)+) = self;
                put_tuple_header(dst, $len)?;
                $($name.encode_to(dst)?;)+
                Ok(())
            }
        }
    };
}

encode_tuple!(1 => A);
encode_tuple!(2 => A, B);
encode_tuple!(3 => A, B, C);
encode_tuple!(4 => A, B, C, D);
encode_tuple!(5 => A, B, C, D, E);
encode_tuple!(6 => A, B, C, D, E, F);
encode_tuple!(7 => A, B, C, D, E, F, G);
encode_tuple!(8 => A, B, C, D, E, F, G, H);
