//! Tag-discriminated records.
//!
//! Protocols built on tuples commonly lead with an atom naming the variant:
//! `{ok, Value}`, `{error, Reason}`, or a bare `ok`. A [`TaggedTarget`] keeps
//! that atom as its discriminant and routes the remaining elements into the
//! fields whose selectors name it.
//!
//! Element `i` (after the discriminant) goes to the first field, in
//! declaration order, that selects the discriminant and has not been filled
//! yet. Elements with no matching field are consumed and discarded. Every
//! layout field is reset to its default first, so a reused target never
//! carries values from an earlier decode.

use tracing::trace;

use crate::decode::Decoder;
use crate::error::{EtfError, Result};
use crate::tag;
use crate::target::DecodeTarget;

/// One field of a [`TaggedLayout`] and the discriminants that select it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldBinding {
    name: &'static str,
    selectors: &'static [&'static str],
}

impl FieldBinding {
    pub const fn new(name: &'static str, selectors: &'static [&'static str]) -> Self {
        Self { name, selectors }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn selectors(&self) -> &'static [&'static str] {
        self.selectors
    }

    /// True if this field participates when the discriminant is `value`.
    pub fn selects(&self, value: &str) -> bool {
        self.selectors.iter().any(|s| *s == value)
    }
}

/// Field bindings of a tagged record, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaggedLayout {
    fields: &'static [FieldBinding],
}

impl TaggedLayout {
    pub const fn new(fields: &'static [FieldBinding]) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &'static [FieldBinding] {
        self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// First unfilled field selected by `discriminant`.
    pub fn next_slot(&self, discriminant: &str, filled: &[bool]) -> Option<usize> {
        self.fields
            .iter()
            .enumerate()
            .find(|(i, field)| !filled.get(*i).copied().unwrap_or(false) && field.selects(discriminant))
            .map(|(i, _)| i)
    }
}

/// A record decoded from `{Discriminant, ...}` or a bare atom.
pub trait TaggedTarget {
    fn layout(&self) -> &'static TaggedLayout;

    fn discriminant(&self) -> &str;

    fn set_discriminant(&mut self, value: String);

    /// Restore every layout field to its default value.
    fn reset_fields(&mut self);

    /// Field `index` of the layout, as a decode target.
    fn field_mut(&mut self, index: usize) -> Option<&mut dyn DecodeTarget>;
}

#[doc(hidden)]
pub fn nth_field<'a, const N: usize>(
    index: usize,
    fields: [&'a mut dyn DecodeTarget; N],
) -> Option<&'a mut dyn DecodeTarget> {
    fields.into_iter().nth(index)
}

impl Decoder<'_> {
    /// Decode a tag-discriminated value into `target`.
    ///
    /// A bare atom sets only the discriminant. Layout fields are reset
    /// before any element is routed.
    pub fn decode_tagged(&mut self, target: &mut dyn TaggedTarget) -> Result<()> {
        let next = self.peek_tag()?;
        if tag::is_atom(next) {
            target.reset_fields();
            target.set_discriminant(self.decode_atom()?);
            return Ok(());
        }
        if !tag::is_tuple(next) {
            return Err(EtfError::UnexpectedTag {
                tag: next,
                context: "tagged value",
            });
        }

        let arity = self.decode_tuple_header()?;
        if arity == 0 {
            return Err(EtfError::MissingDiscriminant);
        }
        let first = self.peek_tag()?;
        if !tag::is_atom(first) {
            return Err(EtfError::UnexpectedTag {
                tag: first,
                context: "discriminant",
            });
        }
        let discriminant = self.decode_atom()?;
        target.reset_fields();

        let layout = target.layout();
        let mut filled = vec![false; layout.len()];
        let mut skipped = 0usize;
        for _ in 1..arity {
            let slot = layout.next_slot(&discriminant, &filled);
            match slot.and_then(|i| target.field_mut(i)) {
                Some(field) => field.decode_from(self)?,
                None => {
                    self.skip_term()?;
                    skipped += 1;
                }
            }
            if let Some(i) = slot {
                filled[i] = true;
            }
        }

        trace!(%discriminant, arity, skipped, "decoded tagged value");
        target.set_discriminant(discriminant);
        Ok(())
    }
}

/// Implement [`TaggedTarget`] and [`DecodeTarget`] for a struct.
///
/// The first entry names the `String` field that receives the discriminant.
/// Each following entry names a field and the discriminants that select it.
/// Listed fields must implement `Default`.
///
/// ```
/// use bertrpc_etf::{decode, encode, tagged, atom, tuple};
///
/// #[derive(Debug, Default)]
/// struct Lookup {
///     tag: String,
///     value: i32,
///     reason: String,
/// }
/// tagged!(Lookup { discriminant: tag, value => ["ok"], reason => ["error"] });
///
/// let data = encode(&tuple([atom("error"), atom("not_found")])).unwrap();
/// let got: Lookup = decode(&data).unwrap();
/// assert_eq!(got.tag, "error");
/// assert_eq!(got.reason, "not_found");
/// assert_eq!(got.value, 0);
/// ```
#[macro_export]
macro_rules! tagged {
    ($ty:ty { discriminant: $disc:ident $(, $field:ident => [$($sel:literal),* $(,)?])* $(,)? }) => {
        impl $crate::TaggedTarget for $ty {
            fn layout(&self) -> &'static $crate::TaggedLayout {
                static FIELDS: &[$crate::FieldBinding] = &[
                    $($crate::FieldBinding::new(stringify!($field), &[$($sel),*])),*
                ];
                static LAYOUT: $crate::TaggedLayout = $crate::TaggedLayout::new(FIELDS);
                &LAYOUT
            }

            fn discriminant(&self) -> &str {
                &self.$disc
            }

            fn set_discriminant(&mut self, value: ::std::string::String) {
                self.$disc = value;
            }

            fn reset_fields(&mut self) {
                $(self.$field = ::std::default::Default::default();)*
            }

            fn field_mut(
                &mut self,
                index: usize,
            ) -> ::std::option::Option<&mut dyn $crate::DecodeTarget> {
                $crate::tagged::nth_field(index, [$(&mut self.$field as &mut dyn $crate::DecodeTarget),*])
            }
        }

        impl $crate::DecodeTarget for $ty {
            fn decode_from(
                &mut self,
                decoder: &mut $crate::Decoder<'_>,
            ) -> $crate::Result<()> {
                decoder.decode_tagged(self)
            }

            fn discriminant(&self) -> ::std::option::Option<&str> {
                ::std::option::Option::Some(&self.$disc)
            }
        }
    };
}

/// `{ok, Value}` / `{error, Reason}` as returned by most remote functions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallResult<T, E = String> {
    pub tag: String,
    pub value: T,
    pub reason: E,
}

static CALL_RESULT_FIELDS: &[FieldBinding] = &[
    FieldBinding::new("value", &["ok"]),
    FieldBinding::new("reason", &["error"]),
];

static CALL_RESULT_LAYOUT: TaggedLayout = TaggedLayout::new(CALL_RESULT_FIELDS);

impl<T, E> CallResult<T, E> {
    pub fn is_ok(&self) -> bool {
        self.tag == "ok"
    }

    pub fn is_error(&self) -> bool {
        self.tag == "error"
    }

    /// `Err(reason)` when the discriminant is `error`, otherwise `Ok(value)`.
    pub fn into_result(self) -> std::result::Result<T, E> {
        if self.is_error() {
            Err(self.reason)
        } else {
            Ok(self.value)
        }
    }
}

impl<T: DecodeTarget + Default, E: DecodeTarget + Default> TaggedTarget for CallResult<T, E> {
    fn layout(&self) -> &'static TaggedLayout {
        &CALL_RESULT_LAYOUT
    }

    fn discriminant(&self) -> &str {
        &self.tag
    }

    fn set_discriminant(&mut self, value: String) {
        self.tag = value;
    }

    fn reset_fields(&mut self) {
        self.value = T::default();
        self.reason = E::default();
    }

    fn field_mut(&mut self, index: usize) -> Option<&mut dyn DecodeTarget> {
        match index {
            0 => Some(&mut self.value),
            1 => Some(&mut self.reason),
            _ => None,
        }
    }
}

impl<T: DecodeTarget + Default, E: DecodeTarget + Default> DecodeTarget for CallResult<T, E> {
    fn decode_from(&mut self, decoder: &mut Decoder<'_>) -> Result<()> {
        decoder.decode_tagged(self)
    }

    fn discriminant(&self) -> Option<&str> {
        Some(&self.tag)
    }
}
