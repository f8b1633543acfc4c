//! Decode targets.
//!
//! A [`DecodeTarget`] is a value that knows how to fill itself from the next
//! value on a [`Decoder`]. Positional records decode from a tuple whose arity
//! equals their field count; see [`positional!`](crate::positional).

use crate::decode::Decoder;
use crate::error::{EtfError, Result};
use crate::tag;
use crate::term::{Atom, Term};

/// A destination for one decoded wire value.
///
/// The trait is object safe so heterogeneous record fields can be decoded
/// through `&mut dyn DecodeTarget`.
pub trait DecodeTarget {
    /// Consume exactly one value from `decoder` into `self`.
    fn decode_from(&mut self, decoder: &mut Decoder<'_>) -> Result<()>;

    /// The decoded discriminant, for tag-discriminated targets.
    fn discriminant(&self) -> Option<&str> {
        None
    }
}

impl<T: DecodeTarget + ?Sized> DecodeTarget for &mut T {
    fn decode_from(&mut self, decoder: &mut Decoder<'_>) -> Result<()> {
        (**self).decode_from(decoder)
    }

    fn discriminant(&self) -> Option<&str> {
        (**self).discriminant()
    }
}

impl<T: DecodeTarget + ?Sized> DecodeTarget for Box<T> {
    fn decode_from(&mut self, decoder: &mut Decoder<'_>) -> Result<()> {
        (**self).decode_from(decoder)
    }

    fn discriminant(&self) -> Option<&str> {
        (**self).discriminant()
    }
}

macro_rules! int_target {
    ($($ty:ty),*) => {
        $(
            impl DecodeTarget for $ty {
                fn decode_from(&mut self, decoder: &mut Decoder<'_>) -> Result<()> {
                    let value = decoder.decode_int()?;
                    *self = <$ty>::try_from(value).map_err(|_| EtfError::OutOfRange {
                        value,
                        target: stringify!($ty),
                    })?;
                    Ok(())
                }
            }
        )*
    };
}

int_target!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl DecodeTarget for String {
    fn decode_from(&mut self, decoder: &mut Decoder<'_>) -> Result<()> {
        *self = decoder.decode_text()?;
        Ok(())
    }
}

impl DecodeTarget for Atom {
    fn decode_from(&mut self, decoder: &mut Decoder<'_>) -> Result<()> {
        *self = Atom::new(decoder.decode_atom()?);
        Ok(())
    }
}

impl DecodeTarget for Term {
    fn decode_from(&mut self, decoder: &mut Decoder<'_>) -> Result<()> {
        *self = decoder.decode_term()?;
        Ok(())
    }

    fn discriminant(&self) -> Option<&str> {
        match self {
            Term::Atom(atom) => Some(atom.as_str()),
            Term::Tuple(elems) => elems.first().and_then(Term::as_atom),
            _ => None,
        }
    }
}

impl<T: DecodeTarget + Default> DecodeTarget for Vec<T> {
    fn decode_from(&mut self, decoder: &mut Decoder<'_>) -> Result<()> {
        self.clear();
        decoder.decode_list(|elem| {
            let mut item = T::default();
            item.decode_from(elem)?;
            self.push(item);
            Ok(())
        })?;
        Ok(())
    }
}

/// `[]` and the atom `undefined` decode as `None`.
impl<T: DecodeTarget + Default> DecodeTarget for Option<T> {
    fn decode_from(&mut self, decoder: &mut Decoder<'_>) -> Result<()> {
        match decoder.peek_tag()? {
            tag::NIL => {
                decoder.decode_nil()?;
                *self = None;
            }
            t if tag::is_atom(t) => {
                let name = decoder.decode_atom()?;
                if name == "undefined" {
                    *self = None;
                } else {
                    let mut value = T::default();
                    decoder.replay(&Term::Atom(Atom::new(name)), &mut value)?;
                    *self = Some(value);
                }
            }
            _ => {
                let mut value = T::default();
                value.decode_from(decoder)?;
                *self = Some(value);
            }
        }
        Ok(())
    }
}

/// The unit target consumes one value and discards it.
impl DecodeTarget for () {
    fn decode_from(&mut self, decoder: &mut Decoder<'_>) -> Result<()> {
        decoder.skip_term()
    }
}

impl Decoder<'_> {
    /// Decode a tuple into `fields` in order.
    ///
    /// The tuple's arity must equal `fields.len()`. A target with no fields
    /// skips the next value, whatever its shape.
    pub fn decode_positional(&mut self, fields: &mut [&mut dyn DecodeTarget]) -> Result<()> {
        if fields.is_empty() {
            return self.skip_term();
        }
        let arity = self.decode_tuple_header()?;
        if arity != fields.len() {
            return Err(EtfError::ArityMismatch {
                expected: fields.len(),
                actual: arity,
            });
        }
        for field in fields.iter_mut() {
            field.decode_from(self)?;
        }
        Ok(())
    }
}

macro_rules! tuple_target {
    ($($name:ident . $idx:tt),+) => {
        impl<$($name: DecodeTarget),+> DecodeTarget for ($($name,)+) {
            fn decode_from(&mut self, decoder: &mut Decoder<'_>) -> Result<()> {
                decoder.decode_positional(&mut [$(&mut self.$idx as &mut dyn DecodeTarget),+])
            }
        }
    };
}

tuple_target!(A.0);
tuple_target!(A.0, B.1);
tuple_target!(A.0, B.1, C.2);
tuple_target!(A.0, B.1, C.2, D.3);
tuple_target!(A.0, B.1, C.2, D.3, E.4);
tuple_target!(A.0, B.1, C.2, D.3, E.4, F.5);
tuple_target!(A.0, B.1, C.2, D.3, E.4, F.5, G.6);
tuple_target!(A.0, B.1, C.2, D.3, E.4, F.5, G.6, H.7);

/// Implement [`DecodeTarget`] for a struct that decodes from a tuple of its
/// fields, in the listed order.
///
/// ```
/// use bertrpc_etf::{decode, encode, positional};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct User {
///     name: String,
///     age: u8,
/// }
/// positional!(User { name, age });
///
/// let data = encode(&("ada", 36)).unwrap();
/// let user: User = decode(&data).unwrap();
/// assert_eq!(user, User { name: "ada".into(), age: 36 });
/// ```
#[macro_export]
macro_rules! positional {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $crate::DecodeTarget for $ty {
            fn decode_from(
                &mut self,
                decoder: &mut $crate::Decoder<'_>,
            ) -> $crate::Result<()> {
                decoder.decode_positional(&mut [$(&mut self.$field as &mut dyn $crate::DecodeTarget),*])
            }
        }
    };
}
