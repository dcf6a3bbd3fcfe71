//! The element codec contract.
//!
//! An [`Array`](crate::Array) is generic over its element type. Any scalar
//! that implements [`ArrayElement`] plugs into the single generic array
//! engine; the array logic is never re-derived per element type.
//!
//! ## Division of labor
//!
//! The array layer owns everything that is the same for every element type:
//! length-prefix framing, the `NULL` marker, quoting and escaping in the text
//! form. Element implementations only ever see their own payload:
//!
//! - [`decode_text`](ArrayElement::decode_text) receives the unescaped,
//!   unquoted element body
//! - [`decode_binary`](ArrayElement::decode_binary) receives the element
//!   payload with its length prefix already stripped
//! - [`encode_text`](ArrayElement::encode_text) writes the raw body; the
//!   array layer quotes it if the text form requires quotes
//! - [`encode_binary`](ArrayElement::encode_binary) writes the payload; the
//!   array layer prepends the length prefix
//!
//! Null handling is split the same way: the array layer recognizes the
//! unquoted `NULL` literal and the `-1` binary sentinel and constructs the
//! element via [`null`](ArrayElement::null) without calling the decode
//! methods at all. The encode methods are likewise only invoked on elements
//! whose [`status`](ArrayElement::status) is [`Status::Present`].

use std::fmt;

use crate::error::Result;
use crate::value::Status;

/// The capability set a scalar type must provide to be embedded in the
/// generic array codec.
///
/// `Plain` is the element's natural native type, used by the array-level
/// conversion operations ([`Array::convert_from`](crate::Array::convert_from)
/// and the `assign_to_*` family).
pub trait ArrayElement: Sized {
    /// The native scalar type this element converts from and assigns to.
    type Plain;

    /// Constructs a SQL NULL element.
    fn null() -> Self;

    /// The element's own presence status, independent of the array's.
    fn status(&self) -> Status;

    /// Converts a native scalar into a present element.
    fn from_plain(value: Self::Plain) -> Result<Self>;

    /// Assigns the element to its native scalar type. Must fail for a null
    /// element, because `Plain` cannot represent SQL NULL.
    fn to_plain(&self) -> Result<Self::Plain>;

    /// Decodes the text form of a single scalar. `raw` is the element body
    /// with array-level quoting and escaping already removed.
    fn decode_text(raw: &str) -> Result<Self>;

    /// Decodes the binary form of a single scalar. `payload` is the element
    /// payload with its length prefix already stripped.
    fn decode_binary(payload: &[u8]) -> Result<Self>;

    /// Writes the text form of a present element. The output must not be
    /// pre-quoted; the array layer decides whether quoting is needed.
    fn encode_text(&self, out: &mut String) -> Result<()>;

    /// Writes the binary payload of a present element, without a length
    /// prefix.
    fn encode_binary(&self, out: &mut Vec<u8>) -> Result<()>;
}

/// A native ordered-collection shape an array value converts from or
/// assigns to.
///
/// This is the conversion surface for [`Array`](crate::Array): an absent
/// collection maps to a null array, an empty collection to the empty array,
/// and a non-empty collection to a single-dimension array with lower
/// bound 1.
///
/// Unknown collection shapes (e.g. a newtype around `Vec<T>`) are handled by
/// a caller-supplied resolver that maps the foreign shape to its structurally
/// equivalent `NativeArray` — see
/// [`Array::convert_from_with`](crate::Array::convert_from_with). The
/// resolver is invoked at most once; there is no recursive shape search.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeArray<T> {
    /// No collection at all (maps to SQL NULL).
    Absent,
    /// A collection of plain values, none of which may be null.
    Plain(Vec<T>),
    /// A collection of nullable values.
    Nullable(Vec<Option<T>>),
}

impl<T> NativeArray<T> {
    /// A short name for the shape, used in conversion error messages.
    pub(crate) fn shape_name(&self) -> &'static str {
        match self {
            NativeArray::Absent => "absent collection",
            NativeArray::Plain(_) => "plain collection",
            NativeArray::Nullable(_) => "nullable collection",
        }
    }
}

impl<T> From<Option<Vec<T>>> for NativeArray<T> {
    fn from(value: Option<Vec<T>>) -> Self {
        match value {
            None => NativeArray::Absent,
            Some(values) => NativeArray::Plain(values),
        }
    }
}

impl<T> From<Vec<T>> for NativeArray<T> {
    fn from(values: Vec<T>) -> Self {
        NativeArray::Plain(values)
    }
}

impl<T> From<Vec<Option<T>>> for NativeArray<T> {
    fn from(values: Vec<Option<T>>) -> Self {
        NativeArray::Nullable(values)
    }
}

impl<T> fmt::Display for NativeArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.shape_name())
    }
}
