//! Error types for the core container and stream codec.
//!
//! Hot call sites (construction, conversion, save/load dispatch) report
//! failure through sentinel results (an invalid `Value`, `None`, or a
//! `false` flag), never through unwinding. The structured errors here cover
//! the places where a caller needs to know *why* a byte stream could not be
//! decoded.

use thiserror::Error;

use crate::TypeId;

/// Errors produced while decoding a byte stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// The stream ended before the requested fixed-width field.
    #[error("unexpected end of stream: needed {needed} bytes, {remaining} left")]
    UnexpectedEof { needed: usize, remaining: usize },

    /// A length prefix exceeds the bytes remaining in the stream.
    #[error("length prefix {len} exceeds remaining stream size {remaining}")]
    LengthOutOfBounds { len: usize, remaining: usize },

    /// A length-prefixed text field was not valid UTF-8.
    #[error("text field is not valid utf-8")]
    InvalidUtf8,

    /// A serialized value named a type id with no registered load hook.
    #[error("no load operation registered for {0}")]
    UnsupportedType(TypeId),

    /// A registered load hook rejected the payload bytes.
    #[error("payload for {0} could not be decoded")]
    DecodeFailed(TypeId),
}
