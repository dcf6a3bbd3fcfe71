//! The generic array value model.
//!
//! [`Array<E>`] owns a flat, row-major element sequence, a dimension
//! descriptor, and a presence [`Status`]. It provides the four codec
//! operations (decode/encode × text/binary) for any element type
//! implementing [`ArrayElement`], plus conversion to and from native
//! collection shapes.
//!
//! ## Value lifecycle
//!
//! A freshly constructed (`Default`) value is [`Status::Undefined`]: it was
//! never set, and encoding it is an error. Every decode call produces a
//! fresh value — either [`Status::Null`] from the wire's `-1` sentinel, or
//! [`Status::Present`] with newly allocated elements. Elements are never
//! shared between two array values.
//!
//! ## Shapes
//!
//! The dimension descriptor is the only source of nesting shape; elements
//! are always stored flat in row-major order (last dimension varies
//! fastest). A `Present` value with zero dimensions is the empty array,
//! which is distinct from `Null`. For a non-empty descriptor the element
//! count must equal the product of the dimension lengths; a mismatch is a
//! bug in the producing code and is reported as [`Error::ShapeMismatch`]
//! before anything is written to the wire.
//!
//! ## Usage
//!
//! ```rust
//! use pg_array::{Array, ArrayElement, NativeArray, Result, Status};
//!
//! # #[derive(Debug, Clone, PartialEq)]
//! # struct Int4(Option<i32>);
//! # impl ArrayElement for Int4 {
//! #     type Plain = i32;
//! #     fn null() -> Self { Int4(None) }
//! #     fn status(&self) -> Status {
//! #         if self.0.is_some() { Status::Present } else { Status::Null }
//! #     }
//! #     fn from_plain(value: i32) -> Result<Self> { Ok(Int4(Some(value))) }
//! #     fn to_plain(&self) -> Result<i32> {
//! #         self.0.ok_or_else(|| pg_array::Error::element("null int4"))
//! #     }
//! #     fn decode_text(raw: &str) -> Result<Self> {
//! #         raw.parse().map(|v| Int4(Some(v))).map_err(pg_array::Error::element)
//! #     }
//! #     fn decode_binary(payload: &[u8]) -> Result<Self> {
//! #         let bytes: [u8; 4] = payload
//! #             .try_into()
//! #             .map_err(|_| pg_array::Error::element("int4 payload must be 4 bytes"))?;
//! #         Ok(Int4(Some(i32::from_be_bytes(bytes))))
//! #     }
//! #     fn encode_text(&self, out: &mut String) -> Result<()> {
//! #         out.push_str(&self.0.unwrap().to_string());
//! #         Ok(())
//! #     }
//! #     fn encode_binary(&self, out: &mut Vec<u8>) -> Result<()> {
//! #         out.extend_from_slice(&self.0.unwrap().to_be_bytes());
//! #         Ok(())
//! #     }
//! # }
//! let array = Array::<Int4>::convert_from(NativeArray::Plain(vec![1, 2, 3]))?;
//!
//! let mut wire = Vec::new();
//! array.encode_text(&mut wire)?;
//! // wire now holds an i32 length prefix followed by b"{1,2,3}"
//!
//! let decoded = Array::<Int4>::decode_text(&mut wire.as_slice())?;
//! assert_eq!(decoded, array);
//! # Ok::<(), pg_array::Error>(())
//! ```

use std::io::{Read, Write};

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

use crate::binary::{self, ArrayHeader};
use crate::element::{ArrayElement, NativeArray};
use crate::error::{Error, Result};
use crate::parse::parse_untyped_text_array;
use crate::render;

/// Tri-state presence marker used at both array and element granularity.
///
/// `Undefined` means the value was never set; `Null` is SQL NULL; `Present`
/// with zero dimensions is the empty array, which is not the same thing as
/// `Null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Undefined,
    Null,
    Present,
}

/// One axis of an array's shape: an element count and the index of the
/// first element on that axis.
///
/// The lower bound only affects how external indices are interpreted; it
/// never changes element ordering, which is always row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub length: i32,
    pub lower_bound: i32,
}

impl Default for Dimension {
    fn default() -> Self {
        Dimension {
            length: 0,
            lower_bound: 1,
        }
    }
}

/// A generic PostgreSQL array value.
#[derive(Debug, Clone, PartialEq)]
pub struct Array<E> {
    pub elements: Vec<E>,
    pub dimensions: Vec<Dimension>,
    pub status: Status,
}

impl<E> Default for Array<E> {
    fn default() -> Self {
        Array {
            elements: Vec::new(),
            dimensions: Vec::new(),
            status: Status::Undefined,
        }
    }
}

impl<E: ArrayElement> Array<E> {
    /// A SQL NULL array.
    pub fn null() -> Self {
        Array {
            elements: Vec::new(),
            dimensions: Vec::new(),
            status: Status::Null,
        }
    }

    /// The empty array: present, zero dimensions, zero elements.
    pub fn empty() -> Self {
        Array {
            elements: Vec::new(),
            dimensions: Vec::new(),
            status: Status::Present,
        }
    }

    /// The element count required by a dimension descriptor: the product of
    /// the lengths, overflow-checked because dimension lengths can come off
    /// the wire.
    fn element_count(dimensions: &[Dimension]) -> Result<usize> {
        let mut count: usize = 1;
        for d in dimensions {
            count = count
                .checked_mul(d.length as usize)
                .ok_or(Error::Overflow)?;
        }
        Ok(count)
    }

    /// Verifies the element-count invariant before encoding. A violation is
    /// a logic error in the code that built the value, not bad input.
    fn check_shape(&self) -> Result<()> {
        if self.dimensions.is_empty() {
            if self.elements.is_empty() {
                return Ok(());
            }
            return Err(Error::ShapeMismatch {
                elements: self.elements.len(),
                expected: 0,
            });
        }
        let expected = Self::element_count(&self.dimensions)?;
        if self.elements.len() != expected {
            return Err(Error::ShapeMismatch {
                elements: self.elements.len(),
                expected,
            });
        }
        Ok(())
    }

    /// Decodes the text wire form: an `i32` length prefix (`-1` for NULL)
    /// followed by an array literal.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] on a short read, [`Error::Syntax`] on a malformed
    /// literal, or whatever the element codec returns for a bad scalar —
    /// any element failure aborts the whole decode.
    pub fn decode_text(r: &mut impl Read) -> Result<Self> {
        let Some(payload) = binary::read_frame(r)? else {
            return Ok(Self::null());
        };
        let text = std::str::from_utf8(&payload)
            .map_err(|e| Error::syntax(e.valid_up_to(), "array literal is not valid UTF-8"))?;

        let parsed = parse_untyped_text_array(text)?;
        let mut elements = Vec::with_capacity(parsed.elements.len());
        for raw in &parsed.elements {
            if raw.is_null() {
                elements.push(E::null());
            } else {
                elements.push(E::decode_text(&raw.value)?);
            }
        }

        Ok(Array {
            elements,
            dimensions: parsed.dimensions,
            status: Status::Present,
        })
    }

    /// Decodes the binary wire form: length prefix, array header, then the
    /// element payloads in row-major order.
    ///
    /// The element count is the overflow-checked product of the dimension
    /// lengths, and the declared payload must be able to hold at least one
    /// length prefix per element before any element is allocated or read.
    pub fn decode_binary(r: &mut impl Read) -> Result<Self> {
        let Some(payload) = binary::read_frame(r)? else {
            return Ok(Self::null());
        };
        let mut buf = payload.as_slice();
        let header = ArrayHeader::decode(&mut buf)?;

        if header.dimensions.is_empty() {
            return Ok(Self::empty());
        }

        let count = Self::element_count(&header.dimensions)?;
        let min_bytes = count.checked_mul(4).ok_or(Error::Overflow)?;
        if min_bytes > buf.len() {
            return Err(Error::SizeGuard {
                expected: count,
                remaining: buf.len(),
            });
        }

        let mut elements = Vec::with_capacity(count);
        for _ in 0..count {
            if buf.remaining() < 4 {
                return Err(Error::header("truncated element frame"));
            }
            let len = buf.get_i32();
            if len == -1 {
                elements.push(E::null());
                continue;
            }
            if len < 0 {
                return Err(Error::header(format!("invalid element frame length {len}")));
            }
            let len = len as usize;
            if len > buf.len() {
                return Err(Error::header(format!(
                    "element frame of {len} bytes exceeds remaining payload"
                )));
            }
            let (elem_payload, rest) = buf.split_at(len);
            elements.push(E::decode_binary(elem_payload)?);
            buf = rest;
        }

        Ok(Array {
            elements,
            dimensions: header.dimensions,
            status: Status::Present,
        })
    }

    /// Encodes the text wire form.
    ///
    /// A `Null` value writes only the `-1` sentinel; the empty array writes
    /// the framed two-byte literal `{}`. Otherwise the full literal is
    /// buffered first, because the length prefix must precede bytes whose
    /// length is unknown until rendering completes.
    ///
    /// # Errors
    ///
    /// [`Error::Undefined`] if the value was never set.
    pub fn encode_text(&self, w: &mut impl Write) -> Result<()> {
        match self.status {
            Status::Undefined => return Err(Error::Undefined),
            Status::Null => return binary::write_null_frame(w),
            Status::Present => {}
        }
        self.check_shape()?;

        if self.elements.is_empty() {
            return binary::write_frame(w, b"{}");
        }

        let mut body = String::new();
        render::write_dimension_prefix(&mut body, &self.dimensions);

        let mut scratch = String::new();
        render::render_nested(&mut body, self.elements.len(), &self.dimensions, |i, out| {
            let elem = &self.elements[i];
            match elem.status() {
                Status::Undefined => Err(Error::Undefined),
                Status::Null => {
                    out.push_str("NULL");
                    Ok(())
                }
                Status::Present => {
                    scratch.clear();
                    elem.encode_text(&mut scratch)?;
                    render::append_quoted_if_needed(out, &scratch);
                    Ok(())
                }
            }
        })?;

        binary::write_frame(w, body.as_bytes())
    }

    /// Encodes the binary wire form.
    ///
    /// The element payloads are encoded into one buffer (tracking whether
    /// any element is null) and the header into another, then a single
    /// length prefix covering both is written, then the header, then the
    /// elements. Buffering is required because the total length precedes
    /// content whose size is unknowable before encoding completes.
    pub fn encode_binary(&self, w: &mut impl Write, element_oid: i32) -> Result<()> {
        match self.status {
            Status::Undefined => return Err(Error::Undefined),
            Status::Null => return binary::write_null_frame(w),
            Status::Present => {}
        }
        self.check_shape()?;

        let mut elem_buf = Vec::new();
        let mut contains_null = false;
        let mut scratch = Vec::new();
        for elem in &self.elements {
            match elem.status() {
                Status::Undefined => return Err(Error::Undefined),
                Status::Null => {
                    contains_null = true;
                    elem_buf.put_i32(-1);
                }
                Status::Present => {
                    scratch.clear();
                    elem.encode_binary(&mut scratch)?;
                    elem_buf.put_i32(scratch.len() as i32);
                    elem_buf.extend_from_slice(&scratch);
                }
            }
        }

        let mut header_buf = Vec::new();
        ArrayHeader {
            contains_null,
            element_oid,
            dimensions: self.dimensions.clone(),
        }
        .encode(&mut header_buf);

        w.write_all(&((header_buf.len() + elem_buf.len()) as i32).to_be_bytes())?;
        w.write_all(&header_buf)?;
        w.write_all(&elem_buf)?;
        Ok(())
    }

    /// Converts from a native collection shape.
    ///
    /// An absent collection maps to `Null`, an empty one to the empty
    /// array, and a non-empty one to a single dimension with lower bound 1.
    /// Multi-dimensional values are only ever produced by decoding; they
    /// cannot be built through native conversion.
    pub fn convert_from(src: NativeArray<E::Plain>) -> Result<Self> {
        match src {
            NativeArray::Absent => Ok(Self::null()),
            NativeArray::Plain(values) => {
                let elements = values
                    .into_iter()
                    .map(E::from_plain)
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self::from_flat_elements(elements))
            }
            NativeArray::Nullable(values) => {
                let elements = values
                    .into_iter()
                    .map(|v| match v {
                        None => Ok(E::null()),
                        Some(value) => E::from_plain(value),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self::from_flat_elements(elements))
            }
        }
    }

    /// Converts from an unknown source shape by delegating once to a
    /// caller-supplied resolver that maps the shape to its structural
    /// [`NativeArray`] equivalent (e.g. unwrapping a newtype around
    /// `Vec<T>`). The resolver is invoked at most once; `None` fails with a
    /// conversion error naming both shapes.
    pub fn convert_from_with<S, F>(src: S, resolve: F) -> Result<Self>
    where
        F: FnOnce(S) -> Option<NativeArray<E::Plain>>,
    {
        match resolve(src) {
            Some(native) => Self::convert_from(native),
            None => Err(Error::conversion(
                std::any::type_name::<S>(),
                "array value",
            )),
        }
    }

    fn from_flat_elements(elements: Vec<E>) -> Self {
        if elements.is_empty() {
            return Self::empty();
        }
        let dimensions = vec![Dimension {
            length: elements.len() as i32,
            lower_bound: 1,
        }];
        Array {
            elements,
            dimensions,
            status: Status::Present,
        }
    }

    /// Assigns to a flat collection of plain values. Yields `None` when the
    /// array is not present.
    ///
    /// # Errors
    ///
    /// [`Error::Conversion`] for a multi-dimensional value (a flat `Vec`
    /// cannot represent its shape without data loss; use
    /// [`assign_to_flat_nullable_vec`](Self::assign_to_flat_nullable_vec)
    /// for explicit flattening), or the element codec's error for a null
    /// element.
    pub fn assign_to_vec(&self) -> Result<Option<Vec<E::Plain>>> {
        if self.status != Status::Present {
            return Ok(None);
        }
        self.reject_multidimensional("flat collection of plain values")?;
        let values = self
            .elements
            .iter()
            .map(E::to_plain)
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(values))
    }

    /// Assigns to a flat collection of nullable values. Yields `None` when
    /// the array is not present; rejects multi-dimensional values like
    /// [`assign_to_vec`](Self::assign_to_vec).
    pub fn assign_to_nullable_vec(&self) -> Result<Option<Vec<Option<E::Plain>>>> {
        if self.status != Status::Present {
            return Ok(None);
        }
        self.reject_multidimensional("flat collection of nullable values")?;
        self.nullable_values().map(Some)
    }

    /// Assigns to a flat collection of nullable values, flattening a
    /// multi-dimensional value in row-major order. This is lossy: the
    /// dimension descriptor is discarded.
    pub fn assign_to_flat_nullable_vec(&self) -> Result<Option<Vec<Option<E::Plain>>>> {
        if self.status != Status::Present {
            return Ok(None);
        }
        self.nullable_values().map(Some)
    }

    /// Assigns to an unknown target shape by delegating once to a
    /// caller-supplied resolver, which receives the value in its canonical
    /// [`NativeArray`] form and adapts it to the target (e.g. wrapping it
    /// in a newtype). Single-level: the resolver is invoked at most once,
    /// and `None` fails with a conversion error naming both shapes.
    pub fn assign_to_with<D, F>(&self, resolve: F) -> Result<D>
    where
        F: FnOnce(NativeArray<E::Plain>) -> Option<D>,
    {
        let native = if self.status == Status::Present {
            self.reject_multidimensional(std::any::type_name::<D>())?;
            NativeArray::Nullable(self.nullable_values()?)
        } else {
            NativeArray::Absent
        };
        resolve(native)
            .ok_or_else(|| Error::conversion("array value", std::any::type_name::<D>()))
    }

    fn nullable_values(&self) -> Result<Vec<Option<E::Plain>>> {
        self.elements
            .iter()
            .map(|e| match e.status() {
                Status::Null => Ok(None),
                _ => e.to_plain().map(Some),
            })
            .collect()
    }

    fn reject_multidimensional(&self, target: &str) -> Result<()> {
        if self.dimensions.len() > 1 {
            return Err(Error::conversion(
                format!("{}-dimensional array", self.dimensions.len()),
                target,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A minimal element codec for exercising the generic machinery.
    #[derive(Debug, Clone, PartialEq)]
    struct Int4(Option<i32>);

    impl ArrayElement for Int4 {
        type Plain = i32;

        fn null() -> Self {
            Int4(None)
        }

        fn status(&self) -> Status {
            if self.0.is_some() {
                Status::Present
            } else {
                Status::Null
            }
        }

        fn from_plain(value: i32) -> Result<Self> {
            Ok(Int4(Some(value)))
        }

        fn to_plain(&self) -> Result<i32> {
            self.0.ok_or_else(|| Error::element("null int4 element"))
        }

        fn decode_text(raw: &str) -> Result<Self> {
            raw.parse().map(|v| Int4(Some(v))).map_err(Error::element)
        }

        fn decode_binary(payload: &[u8]) -> Result<Self> {
            let bytes: [u8; 4] = payload
                .try_into()
                .map_err(|_| Error::element("int4 payload must be 4 bytes"))?;
            Ok(Int4(Some(i32::from_be_bytes(bytes))))
        }

        fn encode_text(&self, out: &mut String) -> Result<()> {
            out.push_str(&self.0.expect("encode_text on null element").to_string());
            Ok(())
        }

        fn encode_binary(&self, out: &mut Vec<u8>) -> Result<()> {
            out.extend_from_slice(&self.0.expect("encode_binary on null element").to_be_bytes());
            Ok(())
        }
    }

    fn present(values: &[i32]) -> Array<Int4> {
        Array::convert_from(NativeArray::Plain(values.to_vec())).unwrap()
    }

    #[test]
    fn test_default_is_undefined() {
        let array = Array::<Int4>::default();
        assert_eq!(array.status, Status::Undefined);
        assert!(array.elements.is_empty());
        assert!(array.dimensions.is_empty());
    }

    #[test]
    fn test_encode_undefined_is_misuse() {
        let array = Array::<Int4>::default();
        let mut out = Vec::new();
        assert!(matches!(
            array.encode_text(&mut out),
            Err(Error::Undefined)
        ));
        assert!(matches!(
            array.encode_binary(&mut out, 23),
            Err(Error::Undefined)
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn test_null_encodes_as_sentinel_only() {
        let mut wire = Vec::new();
        Array::<Int4>::null().encode_text(&mut wire).unwrap();
        assert_eq!(wire, (-1i32).to_be_bytes());

        let mut wire = Vec::new();
        Array::<Int4>::null().encode_binary(&mut wire, 23).unwrap();
        assert_eq!(wire, (-1i32).to_be_bytes());
    }

    #[test]
    fn test_empty_array_text_form() {
        let mut wire = Vec::new();
        Array::<Int4>::empty().encode_text(&mut wire).unwrap();
        assert_eq!(&wire[..4], 2i32.to_be_bytes());
        assert_eq!(&wire[4..], b"{}");
    }

    #[test]
    fn test_zero_length_dimension_renders_empty() {
        let array = Array::<Int4> {
            elements: Vec::new(),
            dimensions: vec![Dimension {
                length: 0,
                lower_bound: 1,
            }],
            status: Status::Present,
        };
        let mut wire = Vec::new();
        array.encode_text(&mut wire).unwrap();
        assert_eq!(&wire[4..], b"{}");
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let array = Array::<Int4> {
            elements: vec![Int4(Some(1)), Int4(Some(2))],
            dimensions: vec![Dimension {
                length: 3,
                lower_bound: 1,
            }],
            status: Status::Present,
        };
        let mut wire = Vec::new();
        assert!(matches!(
            array.encode_text(&mut wire),
            Err(Error::ShapeMismatch {
                elements: 2,
                expected: 3
            })
        ));
    }

    #[test]
    fn test_text_round_trip() {
        let array = present(&[1, -2, 3]);
        let mut wire = Vec::new();
        array.encode_text(&mut wire).unwrap();
        assert_eq!(&wire[4..], b"{1,-2,3}");

        let decoded = Array::<Int4>::decode_text(&mut wire.as_slice()).unwrap();
        assert_eq!(decoded, array);
    }

    #[test]
    fn test_binary_round_trip_with_nulls() {
        let array = Array::<Int4>::convert_from(NativeArray::Nullable(vec![
            Some(10),
            None,
            Some(30),
        ]))
        .unwrap();

        let mut wire = Vec::new();
        array.encode_binary(&mut wire, 23).unwrap();

        let decoded = Array::<Int4>::decode_binary(&mut wire.as_slice()).unwrap();
        assert_eq!(decoded, array);
        assert_eq!(decoded.elements[1], Int4(None));
    }

    #[test]
    fn test_conversion_symmetry() {
        assert_eq!(
            Array::<Int4>::convert_from(NativeArray::Absent)
                .unwrap()
                .status,
            Status::Null
        );

        let empty = Array::<Int4>::convert_from(NativeArray::Plain(Vec::new())).unwrap();
        assert_eq!(empty.status, Status::Present);
        assert!(empty.dimensions.is_empty());

        let three = present(&[1, 2, 3]);
        assert_eq!(
            three.dimensions,
            vec![Dimension {
                length: 3,
                lower_bound: 1
            }]
        );
        assert_eq!(three.assign_to_vec().unwrap(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_assign_rejects_multidimensional() {
        let array = Array::<Int4> {
            elements: vec![Int4(Some(1)), Int4(Some(2)), Int4(Some(3)), Int4(Some(4))],
            dimensions: vec![
                Dimension {
                    length: 2,
                    lower_bound: 1,
                },
                Dimension {
                    length: 2,
                    lower_bound: 1,
                },
            ],
            status: Status::Present,
        };

        assert!(matches!(
            array.assign_to_vec(),
            Err(Error::Conversion { .. })
        ));
        assert!(matches!(
            array.assign_to_nullable_vec(),
            Err(Error::Conversion { .. })
        ));

        // The explicit lossy path flattens in row-major order.
        assert_eq!(
            array.assign_to_flat_nullable_vec().unwrap(),
            Some(vec![Some(1), Some(2), Some(3), Some(4)])
        );
    }

    #[test]
    fn test_assign_null_element_to_plain_vec_fails() {
        let array =
            Array::<Int4>::convert_from(NativeArray::Nullable(vec![Some(1), None])).unwrap();
        assert!(matches!(
            array.assign_to_vec(),
            Err(Error::Element(_))
        ));
        assert_eq!(
            array.assign_to_nullable_vec().unwrap(),
            Some(vec![Some(1), None])
        );
    }

    #[test]
    fn test_resolvers_are_single_shot() {
        #[derive(Debug, Clone, PartialEq)]
        struct Ids(Vec<i32>);

        let array =
            Array::<Int4>::convert_from_with(Ids(vec![1, 2]), |ids| Some(ids.0.into())).unwrap();
        assert_eq!(array.assign_to_vec().unwrap(), Some(vec![1, 2]));

        let err = Array::<Int4>::convert_from_with(Ids(vec![1]), |_| None).unwrap_err();
        assert!(matches!(err, Error::Conversion { .. }));

        let ids: Ids = array
            .assign_to_with(|native| match native {
                NativeArray::Nullable(values) => values
                    .into_iter()
                    .collect::<Option<Vec<_>>>()
                    .map(Ids),
                _ => None,
            })
            .unwrap();
        assert_eq!(ids, Ids(vec![1, 2]));
    }
}
