//! # pg_array
//!
//! A generic codec for PostgreSQL multi-dimensional array values, covering
//! both the human-readable text literal form (`{1,2,3}`) and the compact
//! length-prefixed binary form of the wire protocol.
//!
//! ## What it does
//!
//! PostgreSQL arrays are n-dimensional, rectangular, may carry non-default
//! lower bounds, and may contain NULL elements. This crate converts between
//! that wire representation and an in-process value model, generic over an
//! element type that knows how to encode and decode a single scalar:
//!
//! - **Untyped text parser**: turns a brace-delimited literal into a flat
//!   element list plus dimension metadata, handling quoting and escaping
//! - **Nesting renderer**: re-nests a flat element list into correctly
//!   bracketed output in a single linear pass
//! - **Binary header codec**: the dimension-count/flags/OID preamble with
//!   per-dimension length and lower-bound pairs
//! - **Generic array value**: [`Array<E>`] with the four codec operations
//!   and conversion against native collection shapes
//!
//! Elements are always stored flat in row-major order (the last dimension
//! varies fastest); the dimension descriptor is the only source of nesting
//! shape.
//!
//! ## What it does not do
//!
//! Scalar codecs for specific SQL types are consumed through the
//! [`ArrayElement`] trait, never implemented here. Transport, SQL execution,
//! and OID catalog lookup are likewise external concerns.
//!
//! ## Quick start
//!
//! Implement [`ArrayElement`] for your scalar, then use [`Array`]:
//!
//! ```rust
//! use pg_array::{Array, ArrayElement, Error, NativeArray, Result, Status};
//!
//! /// An `int4` element: either a value or SQL NULL.
//! #[derive(Debug, Clone, PartialEq)]
//! struct Int4(Option<i32>);
//!
//! impl ArrayElement for Int4 {
//!     type Plain = i32;
//!
//!     fn null() -> Self {
//!         Int4(None)
//!     }
//!
//!     fn status(&self) -> Status {
//!         if self.0.is_some() { Status::Present } else { Status::Null }
//!     }
//!
//!     fn from_plain(value: i32) -> Result<Self> {
//!         Ok(Int4(Some(value)))
//!     }
//!
//!     fn to_plain(&self) -> Result<i32> {
//!         self.0.ok_or_else(|| Error::element("cannot assign null to i32"))
//!     }
//!
//!     fn decode_text(raw: &str) -> Result<Self> {
//!         raw.parse().map(|v| Int4(Some(v))).map_err(Error::element)
//!     }
//!
//!     fn decode_binary(payload: &[u8]) -> Result<Self> {
//!         let bytes: [u8; 4] = payload
//!             .try_into()
//!             .map_err(|_| Error::element("int4 payload must be 4 bytes"))?;
//!         Ok(Int4(Some(i32::from_be_bytes(bytes))))
//!     }
//!
//!     fn encode_text(&self, out: &mut String) -> Result<()> {
//!         out.push_str(&self.0.unwrap().to_string());
//!         Ok(())
//!     }
//!
//!     fn encode_binary(&self, out: &mut Vec<u8>) -> Result<()> {
//!         out.extend_from_slice(&self.0.unwrap().to_be_bytes());
//!         Ok(())
//!     }
//! }
//!
//! // Build from a native collection, encode, decode back.
//! let array = Array::<Int4>::convert_from(NativeArray::Plain(vec![1, 2, 3]))?;
//!
//! let mut wire = Vec::new();
//! array.encode_text(&mut wire)?;
//! assert_eq!(&wire[4..], b"{1,2,3}");
//!
//! let decoded = Array::<Int4>::decode_text(&mut wire.as_slice())?;
//! assert_eq!(decoded.assign_to_vec()?, Some(vec![1, 2, 3]));
//! # Ok::<(), Error>(())
//! ```
//!
//! ## Value model
//!
//! Every array and every element carries a tri-state [`Status`]:
//! `Undefined` (never set — encoding it is an error), `Null` (SQL NULL), or
//! `Present`. A present array with zero dimensions is the empty array,
//! which is distinct from NULL on the wire in both formats.
//!
//! ## Wire formats
//!
//! Both forms are framed with an `i32` total length, `-1` meaning NULL.
//! The text payload is the literal grammar with an optional `[lb:ub]...=`
//! bounds prefix; the binary payload is the array header followed by
//! self-framed element payloads in row-major order. Encode operations
//! buffer the payload to compute the exact length before writing the
//! prefix — this bounds memory by one array's encoded size and avoids a
//! two-pass or length-backpatching protocol.
//!
//! ## Concurrency
//!
//! The codec is synchronous and stateless across calls: every operation
//! owns its buffers and element sequence, so independent encodes/decodes
//! can run on any number of threads without synchronization.

pub mod binary;
pub mod element;
pub mod error;
pub mod parse;
pub mod render;
pub mod value;

pub use binary::ArrayHeader;
pub use element::{ArrayElement, NativeArray};
pub use error::{Error, Result};
pub use parse::{parse_untyped_text_array, TextElement, UntypedTextArray};
pub use value::{Array, Dimension, Status};
