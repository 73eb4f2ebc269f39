use crate::attr::AttrValue;
use crate::binary_xml::FastDataOutput;
use crate::{AbxError, Result, MAX_UNSIGNED_SHORT, PROTOCOL_MAGIC_VERSION_0};
use crate::{ATTRIBUTE, CDSECT, COMMENT, DOCDECL, END_DOCUMENT, END_TAG, ENTITY_REF};
use crate::{IGNORABLE_WHITESPACE, PROCESSING_INSTRUCTION, START_DOCUMENT, START_TAG, TEXT};
use crate::{TYPE_BOOLEAN_FALSE, TYPE_BOOLEAN_TRUE, TYPE_NULL};
use crate::{TYPE_BYTES_BASE64, TYPE_BYTES_HEX, TYPE_STRING, TYPE_STRING_INTERNED};
use crate::{TYPE_DOUBLE, TYPE_FLOAT, TYPE_INT, TYPE_INT_HEX, TYPE_LONG, TYPE_LONG_HEX};
use std::io::Write;

/// Binary XML serializer that writes ABX from XML events.
///
/// The constructor writes the four magic bytes; no other bytes precede them.
/// A tag-name stack validates start/end pairing. Content is written exactly
/// as given: the serializer never escapes or validates string payloads.
pub struct BinaryXmlSerializer<W: Write> {
    output: FastDataOutput<W>,
    tag_stack: Vec<String>,
}

impl<W: Write> BinaryXmlSerializer<W> {
    /// Create a new serializer and write the magic header
    pub fn new(writer: W) -> Result<Self> {
        let mut output = FastDataOutput::new(writer);
        output.write_bytes(&PROTOCOL_MAGIC_VERSION_0)?;
        Ok(Self {
            output,
            tag_stack: Vec::new(),
        })
    }

    fn write_string_token(&mut self, command: u8, text: &str) -> Result<()> {
        self.output.write_byte(command | TYPE_STRING)?;
        self.output.write_utf(text)
    }

    pub fn start_document(&mut self) -> Result<()> {
        self.output.write_byte(START_DOCUMENT | TYPE_NULL)
    }

    /// End the document and flush the underlying sink.
    ///
    /// Fails with `UnbalancedEnd` when elements remain open.
    pub fn end_document(&mut self) -> Result<()> {
        if let Some(open) = self.tag_stack.last() {
            return Err(AbxError::UnbalancedEnd(format!(
                "end_document with <{}> still open",
                open
            )));
        }
        self.output.write_byte(END_DOCUMENT | TYPE_NULL)?;
        self.output.flush()
    }

    pub fn start_tag(&mut self, name: &str) -> Result<()> {
        self.tag_stack.push(name.to_string());
        self.output.write_byte(START_TAG | TYPE_STRING_INTERNED)?;
        self.output.write_interned_utf(name)
    }

    /// Close the innermost element; `name` must match the open tag.
    pub fn end_tag(&mut self, name: &str) -> Result<()> {
        match self.tag_stack.last() {
            None => {
                return Err(AbxError::UnbalancedEnd(format!(
                    "end_tag </{}> without matching start_tag",
                    name
                )))
            }
            Some(top) if top != name => {
                return Err(AbxError::TagMismatch {
                    expected: top.clone(),
                    found: name.to_string(),
                })
            }
            Some(_) => {
                self.tag_stack.pop();
            }
        }
        self.output.write_byte(END_TAG | TYPE_STRING_INTERNED)?;
        self.output.write_interned_utf(name)
    }

    /// Current element nesting depth
    pub fn depth(&self) -> usize {
        self.tag_stack.len()
    }

    pub fn attribute(&mut self, name: &str, value: &str) -> Result<()> {
        self.output.write_byte(ATTRIBUTE | TYPE_STRING)?;
        self.output.write_interned_utf(name)?;
        self.output.write_utf(value)
    }

    pub fn attribute_interned(&mut self, name: &str, value: &str) -> Result<()> {
        self.output.write_byte(ATTRIBUTE | TYPE_STRING_INTERNED)?;
        self.output.write_interned_utf(name)?;
        self.output.write_interned_utf(value)
    }

    pub fn attribute_bytes_hex(&mut self, name: &str, value: &[u8]) -> Result<()> {
        if value.len() > MAX_UNSIGNED_SHORT {
            return Err(AbxError::StringTooLong(value.len(), MAX_UNSIGNED_SHORT));
        }
        self.output.write_byte(ATTRIBUTE | TYPE_BYTES_HEX)?;
        self.output.write_interned_utf(name)?;
        self.output.write_short(value.len() as u16)?;
        self.output.write_bytes(value)
    }

    pub fn attribute_bytes_base64(&mut self, name: &str, value: &[u8]) -> Result<()> {
        if value.len() > MAX_UNSIGNED_SHORT {
            return Err(AbxError::StringTooLong(value.len(), MAX_UNSIGNED_SHORT));
        }
        self.output.write_byte(ATTRIBUTE | TYPE_BYTES_BASE64)?;
        self.output.write_interned_utf(name)?;
        self.output.write_short(value.len() as u16)?;
        self.output.write_bytes(value)
    }

    pub fn attribute_int(&mut self, name: &str, value: i32) -> Result<()> {
        self.output.write_byte(ATTRIBUTE | TYPE_INT)?;
        self.output.write_interned_utf(name)?;
        self.output.write_int(value)
    }

    pub fn attribute_int_hex(&mut self, name: &str, value: i32) -> Result<()> {
        self.output.write_byte(ATTRIBUTE | TYPE_INT_HEX)?;
        self.output.write_interned_utf(name)?;
        self.output.write_int(value)
    }

    pub fn attribute_long(&mut self, name: &str, value: i64) -> Result<()> {
        self.output.write_byte(ATTRIBUTE | TYPE_LONG)?;
        self.output.write_interned_utf(name)?;
        self.output.write_long(value)
    }

    pub fn attribute_long_hex(&mut self, name: &str, value: i64) -> Result<()> {
        self.output.write_byte(ATTRIBUTE | TYPE_LONG_HEX)?;
        self.output.write_interned_utf(name)?;
        self.output.write_long(value)
    }

    pub fn attribute_float(&mut self, name: &str, value: f32) -> Result<()> {
        self.output.write_byte(ATTRIBUTE | TYPE_FLOAT)?;
        self.output.write_interned_utf(name)?;
        self.output.write_float(value)
    }

    pub fn attribute_double(&mut self, name: &str, value: f64) -> Result<()> {
        self.output.write_byte(ATTRIBUTE | TYPE_DOUBLE)?;
        self.output.write_interned_utf(name)?;
        self.output.write_double(value)
    }

    pub fn attribute_boolean(&mut self, name: &str, value: bool) -> Result<()> {
        let token = if value {
            ATTRIBUTE | TYPE_BOOLEAN_TRUE
        } else {
            ATTRIBUTE | TYPE_BOOLEAN_FALSE
        };
        self.output.write_byte(token)?;
        self.output.write_interned_utf(name)
    }

    /// Dispatch a typed attribute payload to the matching writer.
    ///
    /// `AttrValue::Null` is decode-only on the wire; re-encoding writes its
    /// textual form as a plain string.
    pub fn attribute_value(&mut self, name: &str, value: &AttrValue) -> Result<()> {
        match value {
            AttrValue::Null => self.attribute(name, "null"),
            AttrValue::String(s) => self.attribute(name, s),
            AttrValue::InternedString(s) => self.attribute_interned(name, s),
            AttrValue::BytesHex(bytes) => self.attribute_bytes_hex(name, bytes),
            AttrValue::BytesBase64(bytes) => self.attribute_bytes_base64(name, bytes),
            AttrValue::Int(v) => self.attribute_int(name, *v),
            AttrValue::IntHex(v) => self.attribute_int_hex(name, *v),
            AttrValue::Long(v) => self.attribute_long(name, *v),
            AttrValue::LongHex(v) => self.attribute_long_hex(name, *v),
            AttrValue::Float(v) => self.attribute_float(name, *v),
            AttrValue::Double(v) => self.attribute_double(name, *v),
            AttrValue::BooleanTrue => self.attribute_boolean(name, true),
            AttrValue::BooleanFalse => self.attribute_boolean(name, false),
        }
    }

    pub fn text(&mut self, text: &str) -> Result<()> {
        self.write_string_token(TEXT, text)
    }

    pub fn cdsect(&mut self, text: &str) -> Result<()> {
        self.write_string_token(CDSECT, text)
    }

    pub fn comment(&mut self, text: &str) -> Result<()> {
        self.write_string_token(COMMENT, text)
    }

    /// Target alone, or `target data` joined by a single space.
    pub fn processing_instruction(&mut self, target: &str, data: Option<&str>) -> Result<()> {
        match data {
            Some(data) if !data.is_empty() => {
                let full = format!("{} {}", target, data);
                self.write_string_token(PROCESSING_INSTRUCTION, &full)
            }
            _ => self.write_string_token(PROCESSING_INSTRUCTION, target),
        }
    }

    pub fn docdecl(&mut self, text: &str) -> Result<()> {
        self.write_string_token(DOCDECL, text)
    }

    pub fn ignorable_whitespace(&mut self, text: &str) -> Result<()> {
        self.write_string_token(IGNORABLE_WHITESPACE, text)
    }

    pub fn entity_ref(&mut self, name: &str) -> Result<()> {
        self.write_string_token(ENTITY_REF, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_begins_with_magic() {
        let mut buf = Vec::new();
        {
            let mut ser = BinaryXmlSerializer::new(&mut buf).unwrap();
            ser.start_document().unwrap();
            ser.end_document().unwrap();
        }
        assert_eq!(&buf[0..4], b"ABX\0");
        assert_eq!(&buf[4..], &[0x10, 0x11]);
    }

    #[test]
    fn end_tag_must_match_innermost_start() {
        let mut ser = BinaryXmlSerializer::new(Vec::new()).unwrap();
        ser.start_document().unwrap();
        ser.start_tag("outer").unwrap();
        ser.start_tag("inner").unwrap();
        let err = ser.end_tag("outer").unwrap_err();
        match err {
            AbxError::TagMismatch { expected, found } => {
                assert_eq!(expected, "inner");
                assert_eq!(found, "outer");
            }
            other => panic!("expected TagMismatch, got {:?}", other),
        }
    }

    #[test]
    fn end_tag_on_empty_stack_is_unbalanced() {
        let mut ser = BinaryXmlSerializer::new(Vec::new()).unwrap();
        ser.start_document().unwrap();
        assert!(matches!(
            ser.end_tag("r").unwrap_err(),
            AbxError::UnbalancedEnd(_)
        ));
    }

    #[test]
    fn end_document_with_open_tag_is_unbalanced() {
        let mut ser = BinaryXmlSerializer::new(Vec::new()).unwrap();
        ser.start_document().unwrap();
        ser.start_tag("r").unwrap();
        assert!(matches!(
            ser.end_document().unwrap_err(),
            AbxError::UnbalancedEnd(_)
        ));
    }

    #[test]
    fn depth_tracks_nesting() {
        let mut ser = BinaryXmlSerializer::new(Vec::new()).unwrap();
        ser.start_document().unwrap();
        assert_eq!(ser.depth(), 0);
        ser.start_tag("a").unwrap();
        ser.start_tag("b").unwrap();
        assert_eq!(ser.depth(), 2);
        ser.end_tag("b").unwrap();
        ser.end_tag("a").unwrap();
        assert_eq!(ser.depth(), 0);
    }

    #[test]
    fn repeated_tag_names_reuse_pool_indices() {
        let mut buf = Vec::new();
        {
            let mut ser = BinaryXmlSerializer::new(&mut buf).unwrap();
            ser.start_document().unwrap();
            ser.start_tag("a").unwrap();
            ser.attribute_int("x", 1).unwrap();
            ser.start_tag("a").unwrap();
            ser.attribute_int("x", 2).unwrap();
            ser.end_tag("a").unwrap();
            ser.end_tag("a").unwrap();
            ser.end_document().unwrap();
        }
        // "a" and "x" each appear in the raw stream exactly once
        let raw = String::from_utf8_lossy(&buf);
        assert_eq!(raw.matches('a').count(), 1);
        assert_eq!(raw.matches('x').count(), 1);
    }

    #[test]
    fn oversized_byte_attribute_is_rejected() {
        let mut ser = BinaryXmlSerializer::new(Vec::new()).unwrap();
        ser.start_document().unwrap();
        ser.start_tag("r").unwrap();
        let blob = vec![0u8; MAX_UNSIGNED_SHORT + 1];
        assert!(matches!(
            ser.attribute_bytes_hex("big", &blob).unwrap_err(),
            AbxError::StringTooLong(65536, 65535)
        ));
    }

    #[test]
    fn processing_instruction_joins_target_and_data() {
        let mut buf = Vec::new();
        {
            let mut ser = BinaryXmlSerializer::new(&mut buf).unwrap();
            ser.start_document().unwrap();
            ser.processing_instruction("target", Some("data")).unwrap();
            ser.processing_instruction("lone", None).unwrap();
            ser.end_document().unwrap();
        }
        let raw = String::from_utf8_lossy(&buf);
        assert!(raw.contains("target data"));
        assert!(raw.contains("lone"));
    }

    #[test]
    fn attribute_value_round_trips_through_the_wire_types() {
        let mut buf = Vec::new();
        {
            let mut ser = BinaryXmlSerializer::new(&mut buf).unwrap();
            ser.start_document().unwrap();
            ser.start_tag("r").unwrap();
            ser.attribute_value("b", &AttrValue::BooleanTrue).unwrap();
            ser.attribute_value("i", &AttrValue::Int(42)).unwrap();
            ser.attribute_value("f", &AttrValue::Float(3.14)).unwrap();
            ser.attribute_value("h", &AttrValue::IntHex(255)).unwrap();
            ser.end_tag("r").unwrap();
            ser.end_document().unwrap();
        }

        let mut output = Vec::new();
        let mut deserializer =
            crate::BinaryXmlDeserializer::new(std::io::Cursor::new(buf), &mut output).unwrap();
        deserializer.deserialize().unwrap();
        let xml = String::from_utf8(output).unwrap();
        assert!(xml.ends_with("<r b=\"true\" i=\"42\" f=\"3.14\" h=\"ff\"></r>"));
    }
}
