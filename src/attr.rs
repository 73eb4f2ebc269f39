use crate::binary_xml::{encode_xml_entities, FastDataInput};
use crate::{AbxError, Result};
use crate::{TYPE_BOOLEAN_FALSE, TYPE_BOOLEAN_TRUE, TYPE_NULL};
use crate::{TYPE_BYTES_BASE64, TYPE_BYTES_HEX, TYPE_STRING, TYPE_STRING_INTERNED};
use crate::{TYPE_DOUBLE, TYPE_FLOAT, TYPE_INT, TYPE_INT_HEX, TYPE_LONG, TYPE_LONG_HEX};
use base64::Engine;
use std::io::{Read, Write};

/// A typed ABX attribute payload, one arm per wire type.
///
/// The deserializer decodes into this by the token's high nibble and renders
/// the textual form; the type inference engine produces it from attribute
/// strings for the serializer to dispatch on.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Decode-only; some writers emit it, this crate never does.
    Null,
    String(String),
    InternedString(String),
    BytesHex(Vec<u8>),
    BytesBase64(Vec<u8>),
    Int(i32),
    IntHex(i32),
    Long(i64),
    LongHex(i64),
    Float(f32),
    Double(f64),
    BooleanTrue,
    BooleanFalse,
}

impl AttrValue {
    /// Decode the payload for the given type nibble from the input stream.
    ///
    /// The attribute name has already been consumed by the caller.
    pub fn decode<R: Read>(type_info: u8, input: &mut FastDataInput<R>) -> Result<Self> {
        match type_info {
            TYPE_NULL => Ok(AttrValue::Null),
            TYPE_STRING => Ok(AttrValue::String(input.read_utf()?)),
            TYPE_STRING_INTERNED => Ok(AttrValue::InternedString(input.read_interned_utf()?)),
            TYPE_BYTES_HEX => {
                let length = input.read_short()?;
                Ok(AttrValue::BytesHex(input.read_bytes(length)?))
            }
            TYPE_BYTES_BASE64 => {
                let length = input.read_short()?;
                Ok(AttrValue::BytesBase64(input.read_bytes(length)?))
            }
            TYPE_INT => Ok(AttrValue::Int(input.read_int()?)),
            TYPE_INT_HEX => Ok(AttrValue::IntHex(input.read_int()?)),
            TYPE_LONG => Ok(AttrValue::Long(input.read_long()?)),
            TYPE_LONG_HEX => Ok(AttrValue::LongHex(input.read_long()?)),
            TYPE_FLOAT => Ok(AttrValue::Float(input.read_float()?)),
            TYPE_DOUBLE => Ok(AttrValue::Double(input.read_double()?)),
            TYPE_BOOLEAN_TRUE => Ok(AttrValue::BooleanTrue),
            TYPE_BOOLEAN_FALSE => Ok(AttrValue::BooleanFalse),
            other => Err(AbxError::UnknownAttributeType(other)),
        }
    }

    /// The type nibble this payload is written with
    pub fn type_token(&self) -> u8 {
        match self {
            AttrValue::Null => TYPE_NULL,
            AttrValue::String(_) => TYPE_STRING,
            AttrValue::InternedString(_) => TYPE_STRING_INTERNED,
            AttrValue::BytesHex(_) => TYPE_BYTES_HEX,
            AttrValue::BytesBase64(_) => TYPE_BYTES_BASE64,
            AttrValue::Int(_) => TYPE_INT,
            AttrValue::IntHex(_) => TYPE_INT_HEX,
            AttrValue::Long(_) => TYPE_LONG,
            AttrValue::LongHex(_) => TYPE_LONG_HEX,
            AttrValue::Float(_) => TYPE_FLOAT,
            AttrValue::Double(_) => TYPE_DOUBLE,
            AttrValue::BooleanTrue => TYPE_BOOLEAN_TRUE,
            AttrValue::BooleanFalse => TYPE_BOOLEAN_FALSE,
        }
    }

    /// Write the textual attribute value, Android-reader compatible.
    ///
    /// Hex integers render lowercase without a `0x` prefix, except `-1`,
    /// which keeps its decimal form. Floats and doubles carry a trailing
    /// `.0` when integral.
    pub fn render<W: Write>(&self, out: &mut W) -> Result<()> {
        match self {
            AttrValue::Null => out.write_all(b"null")?,
            AttrValue::String(value) | AttrValue::InternedString(value) => {
                out.write_all(encode_xml_entities(value).as_bytes())?;
            }
            AttrValue::BytesHex(bytes) => out.write_all(hex::encode(bytes).as_bytes())?,
            AttrValue::BytesBase64(bytes) => {
                let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
                out.write_all(encoded.as_bytes())?;
            }
            AttrValue::Int(value) => write!(out, "{}", value)?,
            AttrValue::IntHex(value) => {
                if *value == -1 {
                    write!(out, "{}", value)?;
                } else {
                    write!(out, "{:x}", *value as u32)?;
                }
            }
            AttrValue::Long(value) => write!(out, "{}", value)?,
            AttrValue::LongHex(value) => {
                if *value == -1 {
                    write!(out, "{}", value)?;
                } else {
                    write!(out, "{:x}", *value as u64)?;
                }
            }
            AttrValue::Float(value) => {
                if value.is_finite() && value.fract() == 0.0 {
                    write!(out, "{:.1}", value)?;
                } else {
                    write!(out, "{}", value)?;
                }
            }
            AttrValue::Double(value) => {
                if value.is_finite() && value.fract() == 0.0 {
                    write!(out, "{:.1}", value)?;
                } else {
                    write!(out, "{}", value)?;
                }
            }
            AttrValue::BooleanTrue => out.write_all(b"true")?,
            AttrValue::BooleanFalse => out.write_all(b"false")?,
        }
        Ok(())
    }
}
