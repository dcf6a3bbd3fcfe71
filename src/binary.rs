//! The binary array header codec and wire framing helpers.
//!
//! Every array value on the binary wire is framed as an `i32` total length
//! (`-1` for SQL NULL) followed by that many payload bytes. The payload
//! opens with a fixed preamble:
//!
//! ```text
//! i32 dimension count          (0 = the empty array)
//! i32 flags                    (bit 0: at least one element is null)
//! i32 element type OID
//! dimension count × { i32 length, i32 lower bound }
//! ```
//!
//! followed by the element payloads, each framed with its own `i32` length
//! (`-1` for a null element). The header codec never computes element
//! counts; that is the caller's job, as the product of the dimension
//! lengths.

use std::io::{Read, Write};

use bytes::{Buf, BufMut};

use crate::error::{Error, Result};
use crate::value::Dimension;

/// Bit 0 of the header flags word marks an array containing null elements.
const FLAG_CONTAINS_NULL: i32 = 1;

/// The fixed binary preamble of an array value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArrayHeader {
    /// True iff at least one element is SQL NULL. Consumers may rely on
    /// this for fast-path null checks without scanning elements.
    pub contains_null: bool,
    /// The OID of the element type.
    pub element_oid: i32,
    pub dimensions: Vec<Dimension>,
}

impl ArrayHeader {
    /// Decodes the preamble from the front of `buf`, advancing it past the
    /// header bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Header`] on a short buffer, a negative dimension
    /// count, or a dimension count requiring more header bytes than remain.
    pub fn decode(buf: &mut &[u8]) -> Result<Self> {
        if buf.remaining() < 12 {
            return Err(Error::header("truncated array header"));
        }
        let ndim = buf.get_i32();
        let flags = buf.get_i32();
        let element_oid = buf.get_i32();

        if ndim < 0 {
            return Err(Error::header(format!("negative dimension count {ndim}")));
        }
        let ndim = ndim as usize;
        if buf.remaining() < ndim * 8 {
            return Err(Error::header(format!(
                "{ndim} dimensions require {} header bytes but only {} remain",
                ndim * 8,
                buf.remaining()
            )));
        }

        let mut dimensions = Vec::with_capacity(ndim);
        for _ in 0..ndim {
            let length = buf.get_i32();
            let lower_bound = buf.get_i32();
            if length < 0 {
                return Err(Error::header(format!("negative dimension length {length}")));
            }
            dimensions.push(Dimension {
                length,
                lower_bound,
            });
        }

        Ok(ArrayHeader {
            contains_null: flags & FLAG_CONTAINS_NULL != 0,
            element_oid,
            dimensions,
        })
    }

    /// Encodes the preamble into `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) {
        buf.put_i32(self.dimensions.len() as i32);
        buf.put_i32(if self.contains_null {
            FLAG_CONTAINS_NULL
        } else {
            0
        });
        buf.put_i32(self.element_oid);
        for d in &self.dimensions {
            buf.put_i32(d.length);
            buf.put_i32(d.lower_bound);
        }
    }
}

/// Reads a big-endian `i32` from the stream.
pub(crate) fn read_i32(r: &mut impl Read) -> Result<i32> {
    let mut bytes = [0u8; 4];
    r.read_exact(&mut bytes)?;
    Ok(i32::from_be_bytes(bytes))
}

/// Reads a length-prefixed frame from the stream. The `-1` length sentinel
/// (SQL NULL) yields `None`; any other negative length is a header error.
pub(crate) fn read_frame(r: &mut impl Read) -> Result<Option<Vec<u8>>> {
    let len = read_i32(r)?;
    if len == -1 {
        return Ok(None);
    }
    if len < 0 {
        return Err(Error::header(format!("invalid frame length {len}")));
    }
    let mut payload = vec![0u8; len as usize];
    r.read_exact(&mut payload)?;
    Ok(Some(payload))
}

/// Writes the `-1` absence sentinel.
pub(crate) fn write_null_frame(w: &mut impl Write) -> Result<()> {
    w.write_all(&(-1i32).to_be_bytes())?;
    Ok(())
}

/// Writes a length-prefixed frame: the payload's length as a big-endian
/// `i32`, then the payload itself.
pub(crate) fn write_frame(w: &mut impl Write, payload: &[u8]) -> Result<()> {
    w.write_all(&(payload.len() as i32).to_be_bytes())?;
    w.write_all(payload)?;
    Ok(())
}
