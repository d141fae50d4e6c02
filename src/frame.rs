//! Frame handling: carry a format string and its payload in one buffer.
//!
//! The core encode/decode pair has no wire header; the format string travels
//! beside the payload. A [`Frame`] bundles the two for transports that move a
//! single buffer per message:
//!
//! ```text
//! [u16 BE: format text length][format text, e.g. "!2shf"][payload]
//! ```

use crate::codec::{self, CodecError};
use crate::format::FormatString;
use crate::typemap::TypeMap;
use crate::value::Value;
use byteorder::{NetworkEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read};

/// Format string plus packed payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub format: FormatString,
    pub payload: Vec<u8>,
}

impl Frame {
    /// Encode a value into a frame.
    pub fn from_value(value: &Value) -> Result<Self, CodecError> {
        let encoded = codec::encode(value)?;
        Ok(Frame { format: encoded.format, payload: encoded.bytes })
    }

    /// Serialize the frame. Fails if the format text does not fit the u16 prefix.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let text = self.format.packer_format();
        let len = u16::try_from(text.len())
            .map_err(|_| CodecError::Pack(format!("format text is {} bytes, max {}", text.len(), u16::MAX)))?;
        let mut out = Vec::with_capacity(2 + text.len() + self.payload.len());
        out.write_u16::<NetworkEndian>(len)?;
        out.extend_from_slice(text.as_bytes());
        out.extend_from_slice(&self.payload);
        Ok(out)
    }

    /// Parse a frame; the payload must be exactly as long as the format declares.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = Cursor::new(bytes);
        let len = r
            .read_u16::<NetworkEndian>()
            .map_err(|_| CodecError::Unpack("frame shorter than its length prefix".to_string()))?;
        let mut text = vec![0u8; len as usize];
        r.read_exact(&mut text)
            .map_err(|_| CodecError::Unpack(format!("frame shorter than its {}-byte format text", len)))?;
        let text = String::from_utf8(text).map_err(|_| CodecError::FormatParse("format text is not UTF-8".to_string()))?;
        let format = FormatString::parse(&text)?;
        let payload = bytes[r.position() as usize..].to_vec();
        if payload.len() != format.byte_len() {
            return Err(CodecError::Unpack(format!(
                "frame payload is {} bytes, format {} needs {}",
                payload.len(),
                text,
                format.byte_len()
            )));
        }
        Ok(Frame { format, payload })
    }

    /// Re-nest the payload against `type_map`.
    pub fn to_value(&self, type_map: &TypeMap) -> Result<Value, CodecError> {
        codec::decode(&self.payload, &self.format, type_map)
    }
}
