//! ETF tag bytes.
//!
//! Only the subset used by BERT-RPC calls and replies is listed here.
//! Reference: <https://www.erlang.org/doc/apps/erts/erl_ext_dist.html>

/// Version marker, written once in front of a top-level term.
pub const VERSION: u8 = 131;

/// Unsigned 8-bit integer.
pub const SMALL_INTEGER: u8 = 97;

/// Signed 32-bit big-endian integer.
pub const INTEGER: u8 = 98;

/// Latin-1 atom with a 2-byte length. Decode only.
pub const ATOM_LATIN1: u8 = 100;

/// Tuple with a 1-byte arity.
pub const SMALL_TUPLE: u8 = 104;

/// Tuple with a 4-byte arity.
pub const LARGE_TUPLE: u8 = 105;

/// Empty list, also the proper list terminator.
pub const NIL: u8 = 106;

/// Byte string with a 2-byte length. Decode only.
pub const STRING: u8 = 107;

/// List with a 4-byte count, followed by its tail.
pub const LIST: u8 = 108;

/// Binary with a 4-byte length.
pub const BINARY: u8 = 109;

/// UTF-8 atom with a 2-byte length.
pub const ATOM_UTF8: u8 = 118;

/// UTF-8 atom with a 1-byte length.
pub const SMALL_ATOM_UTF8: u8 = 119;

/// Returns a human-readable name for a tag byte.
pub fn tag_name(tag: u8) -> &'static str {
    match tag {
        VERSION => "VERSION",
        SMALL_INTEGER => "SMALL_INTEGER",
        INTEGER => "INTEGER",
        ATOM_LATIN1 => "ATOM",
        SMALL_TUPLE => "SMALL_TUPLE",
        LARGE_TUPLE => "LARGE_TUPLE",
        NIL => "NIL",
        STRING => "STRING",
        LIST => "LIST",
        BINARY => "BINARY",
        ATOM_UTF8 => "ATOM_UTF8",
        SMALL_ATOM_UTF8 => "SMALL_ATOM_UTF8",
        _ => "UNKNOWN",
    }
}

/// Returns true if the tag introduces an atom.
pub fn is_atom(tag: u8) -> bool {
    matches!(tag, ATOM_LATIN1 | ATOM_UTF8 | SMALL_ATOM_UTF8)
}

/// Returns true if the tag introduces a tuple header.
pub fn is_tuple(tag: u8) -> bool {
    matches!(tag, SMALL_TUPLE | LARGE_TUPLE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_known_tags() {
        assert_eq!(tag_name(SMALL_ATOM_UTF8), "SMALL_ATOM_UTF8");
        assert_eq!(tag_name(NIL), "NIL");
        assert_eq!(tag_name(70), "UNKNOWN");
    }

    #[test]
    fn classifies_atoms_and_tuples() {
        assert!(is_atom(ATOM_LATIN1));
        assert!(is_atom(ATOM_UTF8));
        assert!(!is_atom(BINARY));
        assert!(is_tuple(LARGE_TUPLE));
        assert!(!is_tuple(LIST));
    }
}
