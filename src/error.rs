//! Error types
//!
//! Each subsystem has its own error enum; [`Error`] wraps them so callers
//! that drive the whole pipeline can use a single `Result`.

use thiserror::Error;

/// Result type used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug, Error)]
pub enum Error {
    /// Transport decoding failed
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Ring buffer write rejected
    #[error("buffer error: {0}")]
    Buffer(#[from] BufferError),

    /// Filter could not be compiled
    #[error("filter error: {0}")]
    Filter(#[from] FilterError),

    /// Channel read ended
    #[error("read error: {0}")]
    Read(#[from] ReadError),

    /// Stored record could not be decoded
    #[error("malformed record: {0}")]
    MalformedRecord(&'static str),

    /// Generic I/O failure outside the transport (e.g. opening a file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while decoding the framed byte stream
#[derive(Debug, Error)]
pub enum TransportError {
    /// The announced payload does not fit the decoder's buffer. The stream
    /// has no resynchronization marker, so decoding cannot continue.
    #[error("framing lost: payload of {len} bytes exceeds buffer of {capacity} bytes")]
    FramingLost {
        /// Payload length announced by the header
        len: usize,
        /// Size of the destination buffer
        capacity: usize,
    },

    /// The stream ended in the middle of a frame
    #[error("stream ended inside a frame ({missing} bytes missing)")]
    Truncated {
        /// Bytes still expected when the source hit EOF
        missing: usize,
    },

    /// Underlying source failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the ring buffer
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// A single entry is larger than the whole arena
    #[error("entry of {size} bytes exceeds ring buffer capacity of {capacity} bytes")]
    CapacityExceeded {
        /// Serialized entry size
        size: usize,
        /// Arena capacity
        capacity: usize,
    },
}

/// Errors raised while compiling a filter expression
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// Unexpected character
    #[error("unexpected character at offset {offset}")]
    Lex {
        /// 1-based byte offset of the offending character
        offset: usize,
    },

    /// Identifier that is not one of the known keys
    #[error("unknown key '{key}' at offset {offset}")]
    UnknownKey {
        /// 1-based byte offset where the identifier starts
        offset: usize,
        /// The identifier as written
        key: String,
    },

    /// Backslash followed by anything but `"` or `\`
    #[error("invalid escape sequence at offset {offset}")]
    BadEscape {
        /// 1-based byte offset of the escaped character
        offset: usize,
    },

    /// Input ended inside a string literal
    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString {
        /// 1-based byte offset of the opening quote
        offset: usize,
    },

    /// Integer literal does not fit in 32 bits
    #[error("integer literal out of range at offset {offset}")]
    IntegerOverflow {
        /// 1-based byte offset where the literal starts
        offset: usize,
    },

    /// Parentheses do not pair up
    #[error("mismatched parenthesis")]
    MismatchedParen,

    /// A group `()` with nothing inside
    #[error("empty parentheses")]
    EmptyGroup,

    /// Right operand of `=~` / `!~` is not a valid regular expression
    #[error("invalid regular expression '{pattern}': {reason}")]
    InvalidRegex {
        /// Pattern as written
        pattern: String,
        /// Message from the regex compiler
        reason: String,
    },

    /// Expression is syntactically valid but cannot be evaluated
    #[error("expression cannot be evaluated: {0}")]
    Semantic(EvalError),
}

/// Internal failures while evaluating a compiled filter
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EvalError {
    /// Operator applied to operands of the wrong kind
    #[error("operand type mismatch")]
    TypeMismatch,

    /// Operator found fewer operands than it needs
    #[error("missing operand")]
    StackUnderflow,

    /// Logical operator applied to something other than a boolean
    #[error("logical operator applied to a non-boolean")]
    NotBoolean,

    /// Evaluation did not end with exactly one boolean
    #[error("expression does not reduce to a single boolean")]
    Unbalanced,
}

/// Reasons a blocking channel read returns without a message
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ReadError {
    /// The channel was closed
    #[error("channel closed")]
    Closed,

    /// The session is inactive and no further records will arrive
    #[error("end of stream")]
    EndOfStream,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_conversion() {
        let err: Error = BufferError::CapacityExceeded {
            size: 10,
            capacity: 4,
        }
        .into();
        assert!(matches!(err, Error::Buffer(_)));
        assert!(err.to_string().contains("10 bytes"));
    }

    #[test]
    fn test_filter_error_display_has_offset() {
        let err = FilterError::Lex { offset: 4 };
        assert_eq!(err.to_string(), "unexpected character at offset 4");
    }

    #[test]
    fn test_transport_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let err: Error = TransportError::from(io).into();
        assert!(matches!(err, Error::Transport(TransportError::Io(_))));
    }
}
