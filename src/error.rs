//! Error types for array encoding and decoding.
//!
//! All failures surface as a single [`Error`] enum so that callers can match
//! on the failure class without string-sniffing.
//!
//! ## Error Categories
//!
//! - **I/O errors**: short reads/writes or transport failures on the
//!   underlying stream, propagated unchanged
//! - **Syntax errors**: malformed array literal text, with the byte position
//!   of the offending character
//! - **Header errors**: malformed binary array headers
//! - **Conversion errors**: a native shape the value cannot be converted
//!   from or assigned to
//! - **Element errors**: failures reported by the embedded element codec,
//!   propagated unchanged
//!
//! No operation in this crate retries or returns a partially decoded value:
//! an array is either fully decoded/encoded or the call fails.
//!
//! ## Examples
//!
//! ```rust
//! use pg_array::{parse_untyped_text_array, Error};
//!
//! let result = parse_untyped_text_array("{1,2");
//! assert!(matches!(result, Err(Error::Syntax { .. })));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors that can occur while encoding or decoding
/// a PostgreSQL array value.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O failure on the underlying stream.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed array literal text.
    #[error("syntax error at byte {position}: {msg}")]
    Syntax { position: usize, msg: String },

    /// Malformed binary array header.
    #[error("invalid array header: {0}")]
    Header(String),

    /// The value cannot be converted from, or assigned to, the given native
    /// shape.
    #[error("cannot convert between {source_shape} and {target_shape}")]
    Conversion {
        source_shape: String,
        target_shape: String,
    },

    /// An encode operation was attempted on a value that was never set.
    #[error("cannot encode undefined value")]
    Undefined,

    /// The product of the declared dimension lengths overflows.
    #[error("array dimensions overflow element count")]
    Overflow,

    /// A binary header declares more elements than the remaining payload
    /// could possibly hold.
    #[error("header declares {expected} elements but only {remaining} payload bytes remain")]
    SizeGuard { expected: usize, remaining: usize },

    /// The element count does not match the product of the dimension
    /// lengths. This indicates a bug in the code that produced the value,
    /// not malformed input.
    #[error("array has {elements} elements but dimensions require {expected}")]
    ShapeMismatch { elements: usize, expected: usize },

    /// Failure reported by the embedded element codec.
    #[error("element codec error: {0}")]
    Element(String),
}

impl Error {
    /// Creates a syntax error at the given byte position in the literal.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pg_array::Error;
    ///
    /// let err = Error::syntax(4, "unexpected end of input");
    /// assert!(err.to_string().contains("byte 4"));
    /// ```
    pub fn syntax(position: usize, msg: impl Into<String>) -> Self {
        Error::Syntax {
            position,
            msg: msg.into(),
        }
    }

    /// Creates a header error for a malformed binary preamble.
    pub fn header(msg: impl Into<String>) -> Self {
        Error::Header(msg.into())
    }

    /// Creates a conversion error naming both the source and target shape.
    pub fn conversion(source_shape: impl Into<String>, target_shape: impl Into<String>) -> Self {
        Error::Conversion {
            source_shape: source_shape.into(),
            target_shape: target_shape.into(),
        }
    }

    /// Creates an element error. Element codec implementations use this to
    /// report scalar-level failures; the array layer propagates them
    /// unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pg_array::Error;
    ///
    /// let err = Error::element("invalid int4 literal");
    /// assert!(err.to_string().contains("invalid int4"));
    /// ```
    pub fn element<T: fmt::Display>(msg: T) -> Self {
        Error::Element(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
