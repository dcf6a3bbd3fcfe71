//! Sample element codecs shared by the integration and property tests.
//!
//! These model the two shapes of scalar the array engine has to care about:
//! a fixed-width binary payload (`Int4`) and a variable-length one whose
//! text form can collide with the literal grammar (`Text`).

use pg_array::{ArrayElement, Error, Result, Status};

pub const INT4_OID: i32 = 23;
pub const TEXT_OID: i32 = 25;

#[derive(Debug, Clone, PartialEq)]
pub struct Int4(pub Option<i32>);

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
        self.0.ok_or_else(|| Error::element("cannot assign null to i32"))
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

#[derive(Debug, Clone, PartialEq)]
pub struct Text(pub Option<String>);

impl ArrayElement for Text {
    type Plain = String;

    fn null() -> Self {
        Text(None)
    }

    fn status(&self) -> Status {
        if self.0.is_some() {
            Status::Present
        } else {
            Status::Null
        }
    }

    fn from_plain(value: String) -> Result<Self> {
        Ok(Text(Some(value)))
    }

    fn to_plain(&self) -> Result<String> {
        self.0
            .clone()
            .ok_or_else(|| Error::element("cannot assign null to String"))
    }

    fn decode_text(raw: &str) -> Result<Self> {
        Ok(Text(Some(raw.to_string())))
    }

    fn decode_binary(payload: &[u8]) -> Result<Self> {
        let s = std::str::from_utf8(payload).map_err(Error::element)?;
        Ok(Text(Some(s.to_string())))
    }

    fn encode_text(&self, out: &mut String) -> Result<()> {
        out.push_str(self.0.as_deref().expect("encode_text on null element"));
        Ok(())
    }

    fn encode_binary(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(
            self.0
                .as_deref()
                .expect("encode_binary on null element")
                .as_bytes(),
        );
        Ok(())
    }
}

/// Frames a payload the way the wire does: i32 length, then the bytes.
pub fn framed(payload: &[u8]) -> Vec<u8> {
    let mut wire = (payload.len() as i32).to_be_bytes().to_vec();
    wire.extend_from_slice(payload);
    wire
}
