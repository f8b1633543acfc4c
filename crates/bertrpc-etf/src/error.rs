/// Errors that can occur while encoding or decoding terms.
#[derive(Debug, thiserror::Error)]
pub enum EtfError {
    /// Fewer bytes were available than a declared length required.
    #[error("truncated data (expected {expected} bytes, got {available})")]
    TruncatedData { expected: usize, available: usize },

    /// The stream ended where the tag of a new value was expected.
    #[error("end of stream while expecting a term")]
    EndOfStream,

    /// The wire tag is not valid in the current decoding context.
    #[error("unexpected tag {tag} ({}) while decoding {context}", crate::tag::tag_name(*tag))]
    UnexpectedTag { tag: u8, context: &'static str },

    /// The top-level term did not start with the version marker.
    #[error("incorrect term version tag: {0} (expected 131)")]
    BadVersion(u8),

    /// A tuple's arity does not match the target's field count.
    #[error("cannot decode tuple of arity {actual} into a target with {expected} fields")]
    ArityMismatch { expected: usize, actual: usize },

    /// An integer does not fit the target type.
    #[error("value {value} out of range for {target}")]
    OutOfRange { value: i64, target: &'static str },

    /// No wire representation is known for the value.
    #[error("unsupported type: {0}")]
    UnsupportedType(&'static str),

    /// A declared length is larger than the configured limit.
    #[error("declared length {declared} exceeds limit {max}")]
    LimitExceeded { declared: usize, max: usize },

    /// A tag-discriminated target received an empty tuple.
    #[error("no discriminant available in an empty tuple")]
    MissingDiscriminant,

    /// Binary or atom payload is not valid UTF-8.
    #[error("invalid UTF-8 text: {0}")]
    InvalidText(#[from] std::string::FromUtf8Error),

    /// A charlist element is not a Unicode scalar value.
    #[error("invalid code point {0} in charlist")]
    InvalidCodePoint(i64),

    /// An I/O error occurred on the underlying stream or sink.
    #[error("term I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EtfError>;
