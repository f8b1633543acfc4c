//! Term model.
//!
//! [`Term`] is the closed set of wire values this codec understands. [`Atom`]
//! and [`CharList`] are wrappers that tell the encoder to emit an atom or a
//! list of code points instead of the default binary for text.

use std::fmt;

use bytes::Bytes;

/// An Erlang atom.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(String);

impl Atom {
    /// Create an atom from its name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The atom name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the atom and return its name.
    pub fn into_string(self) -> String {
        self.0
    }

    /// True when the name fits the 1-byte length header.
    pub fn is_small(&self) -> bool {
        self.0.len() <= u8::MAX as usize
    }
}

impl From<&str> for Atom {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Atom {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for Atom {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Atom {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Atom {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if is_bare_atom(&self.0) {
            f.write_str(&self.0)
        } else {
            f.write_str("'")?;
            for ch in self.0.chars() {
                match ch {
                    '\'' => f.write_str("\\'")?,
                    '\\' => f.write_str("\\\\")?,
                    _ => write!(f, "{ch}")?,
                }
            }
            f.write_str("'")
        }
    }
}

fn is_bare_atom(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '@')
        }
        _ => false,
    }
}

/// Text encoded as an Erlang charlist (a list of code points).
///
/// Only affects encoding. Charlists on the wire always decode as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CharList(String);

impl CharList {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for CharList {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for CharList {
    fn from(text: String) -> Self {
        Self(text)
    }
}

/// A decoded or to-be-encoded wire value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Term {
    /// Integer in `0..=255`.
    SmallInt(u8),
    /// Signed 32-bit integer.
    Int(i32),
    Atom(Atom),
    Binary(Bytes),
    /// Deprecated 16-bit-length byte string. Decode only.
    LegacyString(Bytes),
    CharList(CharList),
    Tuple(Vec<Term>),
    /// Proper list. The terminator is implicit.
    List(Vec<Term>),
    #[default]
    Nil,
}

impl Term {
    /// Build an integer term, picking the small form for `0..=255`.
    pub fn int(value: i32) -> Self {
        match u8::try_from(value) {
            Ok(small) => Term::SmallInt(small),
            Err(_) => Term::Int(value),
        }
    }

    /// Name of the wire kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Term::SmallInt(_) => "small_integer",
            Term::Int(_) => "integer",
            Term::Atom(_) => "atom",
            Term::Binary(_) => "binary",
            Term::LegacyString(_) => "string",
            Term::CharList(_) => "charlist",
            Term::Tuple(_) => "tuple",
            Term::List(_) => "list",
            Term::Nil => "nil",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Term::SmallInt(v) => Some(i64::from(*v)),
            Term::Int(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Term::Atom(atom) => Some(atom.as_str()),
            _ => None,
        }
    }

    /// True if this is the atom `name`.
    pub fn is_atom(&self, name: &str) -> bool {
        self.as_atom() == Some(name)
    }

    /// Text view of any term that decodes as text.
    ///
    /// Lists qualify when every element is an integer code point.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Term::Atom(atom) => Some(atom.as_str().to_string()),
            Term::Binary(bytes) => String::from_utf8(bytes.to_vec()).ok(),
            Term::LegacyString(bytes) => Some(bytes.iter().map(|b| char::from(*b)).collect()),
            Term::CharList(text) => Some(text.as_str().to_string()),
            Term::Nil => Some(String::new()),
            Term::List(elems) => elems
                .iter()
                .map(|e| {
                    e.as_int()
                        .and_then(|cp| u32::try_from(cp).ok())
                        .and_then(char::from_u32)
                })
                .collect(),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[Term]> {
        match self {
            Term::Tuple(elems) => Some(elems),
            _ => None,
        }
    }

    /// Elements of a list. `Nil` is the empty list.
    pub fn as_list(&self) -> Option<&[Term]> {
        match self {
            Term::List(elems) => Some(elems),
            Term::Nil => Some(&[]),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Term::Nil)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::SmallInt(v) => write!(f, "{v}"),
            Term::Int(v) => write!(f, "{v}"),
            Term::Atom(atom) => write!(f, "{atom}"),
            Term::Binary(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => {
                    f.write_str("<<\"")?;
                    write_escaped(f, text.chars())?;
                    f.write_str("\">>")
                }
                Err(_) => {
                    f.write_str("<<")?;
                    write_joined(f, bytes.iter())?;
                    f.write_str(">>")
                }
            },
            Term::LegacyString(bytes) => {
                f.write_str("\"")?;
                write_escaped(f, bytes.iter().map(|b| char::from(*b)))?;
                f.write_str("\"")
            }
            Term::CharList(text) => {
                f.write_str("\"")?;
                write_escaped(f, text.as_str().chars())?;
                f.write_str("\"")
            }
            Term::Tuple(elems) => {
                f.write_str("{")?;
                write_joined(f, elems.iter())?;
                f.write_str("}")
            }
            Term::List(elems) => {
                f.write_str("[")?;
                write_joined(f, elems.iter())?;
                f.write_str("]")
            }
            Term::Nil => f.write_str("[]"),
        }
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, chars: impl Iterator<Item = char>) -> fmt::Result {
    for ch in chars {
        match ch {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            _ => write!(f, "{ch}")?,
        }
    }
    Ok(())
}

fn write_joined<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = T>,
) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

macro_rules! term_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Term {
                fn from(value: $ty) -> Self {
                    Term::int(i32::from(value))
                }
            }
        )*
    };
}

term_from_int!(i8, i16, i32, u8, u16);

impl From<&str> for Term {
    fn from(text: &str) -> Self {
        Term::Binary(Bytes::copy_from_slice(text.as_bytes()))
    }
}

impl From<String> for Term {
    fn from(text: String) -> Self {
        Term::Binary(Bytes::from(text.into_bytes()))
    }
}

impl From<Atom> for Term {
    fn from(atom: Atom) -> Self {
        Term::Atom(atom)
    }
}

impl From<CharList> for Term {
    fn from(text: CharList) -> Self {
        Term::CharList(text)
    }
}

impl From<Bytes> for Term {
    fn from(bytes: Bytes) -> Self {
        Term::Binary(bytes)
    }
}

impl From<Vec<Term>> for Term {
    fn from(elems: Vec<Term>) -> Self {
        Term::List(elems)
    }
}

/// Atom term.
pub fn atom(name: impl Into<String>) -> Term {
    Term::Atom(Atom::new(name))
}

/// Binary term holding UTF-8 text.
pub fn binary(text: impl Into<String>) -> Term {
    Term::from(text.into())
}

/// Charlist term.
pub fn charlist(text: impl Into<String>) -> Term {
    Term::CharList(CharList::new(text))
}

/// Tuple term.
pub fn tuple(elems: impl IntoIterator<Item = Term>) -> Term {
    Term::Tuple(elems.into_iter().collect())
}

/// List term.
pub fn list(elems: impl IntoIterator<Item = Term>) -> Term {
    Term::List(elems.into_iter().collect())
}
