use crate::attr::AttrValue;
use crate::binary_xml::{encode_xml_entities, FastDataInput};
use crate::{AbxError, Options, Result, PROTOCOL_MAGIC_VERSION_0};
use crate::{ATTRIBUTE, CDSECT, COMMENT, DOCDECL, END_DOCUMENT, END_TAG, ENTITY_REF};
use crate::{IGNORABLE_WHITESPACE, PROCESSING_INSTRUCTION, START_DOCUMENT, START_TAG, TEXT};
use crate::TYPE_STRING;
use std::io::{Read, Write};

/// Binary XML deserializer that converts ABX format to XML.
///
/// Runs a token loop until END_DOCUMENT. Unknown command tokens are reported
/// through the warning callback and skipped, matching the tolerance of
/// Android's reader; every other failure is fatal and the instance must be
/// discarded. Trailing bytes after END_DOCUMENT are never read.
#[derive(Debug)]
pub struct BinaryXmlDeserializer<R: Read, W: Write> {
    input: FastDataInput<R>,
    output: W,
    options: Options,
}

impl<R: Read, W: Write> BinaryXmlDeserializer<R, W> {
    /// Create a new deserializer with the given reader and writer.
    ///
    /// Reads and verifies the four magic bytes up front.
    pub fn new(reader: R, output: W) -> Result<Self> {
        Self::with_options(reader, output, Options::new())
    }

    /// Create a deserializer with explicit options (warning callback).
    pub fn with_options(mut reader: R, output: W, options: Options) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader
            .read_exact(&mut magic)
            .map_err(|_| AbxError::UnexpectedEof("magic header"))?;

        if magic != PROTOCOL_MAGIC_VERSION_0 {
            return Err(AbxError::InvalidMagicHeader {
                expected: PROTOCOL_MAGIC_VERSION_0,
                actual: magic,
            });
        }

        Ok(Self {
            input: FastDataInput::new(reader),
            output,
            options,
        })
    }

    /// Deserialize the binary XML to text XML
    pub fn deserialize(&mut self) -> Result<()> {
        self.output
            .write_all(b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;

        while self.process_token()? {}
        Ok(())
    }

    /// Process a single token; returns false once END_DOCUMENT is reached
    fn process_token(&mut self) -> Result<bool> {
        let token = self.input.read_byte()?;
        let command = token & 0x0F;
        let type_info = token & 0xF0;

        match command {
            START_DOCUMENT => Ok(true),

            END_DOCUMENT => Ok(false),

            START_TAG => {
                let tag_name = self.input.read_interned_utf()?;
                self.output.write_all(b"<")?;
                self.output.write_all(tag_name.as_bytes())?;

                // Attribute records bind to the span right after a start
                // tag: peek one token, consume iff it is an ATTRIBUTE.
                while let Ok(next_token) = self.input.peek_byte() {
                    if (next_token & 0x0F) != ATTRIBUTE {
                        break;
                    }
                    let attr_token = self.input.read_byte()?;
                    self.process_attribute(attr_token)?;
                }

                self.output.write_all(b">")?;
                Ok(true)
            }

            END_TAG => {
                let tag_name = self.input.read_interned_utf()?;
                self.output.write_all(b"</")?;
                self.output.write_all(tag_name.as_bytes())?;
                self.output.write_all(b">")?;
                Ok(true)
            }

            TEXT => {
                if type_info == TYPE_STRING {
                    let text = self.input.read_utf()?;
                    if !text.is_empty() {
                        self.output
                            .write_all(encode_xml_entities(&text).as_bytes())?;
                    }
                }
                Ok(true)
            }

            CDSECT => {
                if type_info == TYPE_STRING {
                    let text = self.input.read_utf()?;
                    self.output.write_all(b"<![CDATA[")?;
                    self.output.write_all(text.as_bytes())?;
                    self.output.write_all(b"]]>")?;
                }
                Ok(true)
            }

            COMMENT => {
                if type_info == TYPE_STRING {
                    let text = self.input.read_utf()?;
                    self.output.write_all(b"<!--")?;
                    self.output.write_all(text.as_bytes())?;
                    self.output.write_all(b"-->")?;
                }
                Ok(true)
            }

            PROCESSING_INSTRUCTION => {
                if type_info == TYPE_STRING {
                    let text = self.input.read_utf()?;
                    self.output.write_all(b"<?")?;
                    self.output.write_all(text.as_bytes())?;
                    self.output.write_all(b"?>")?;
                }
                Ok(true)
            }

            DOCDECL => {
                if type_info == TYPE_STRING {
                    let text = self.input.read_utf()?;
                    self.output.write_all(b"<!DOCTYPE ")?;
                    self.output.write_all(text.as_bytes())?;
                    self.output.write_all(b">")?;
                }
                Ok(true)
            }

            ENTITY_REF => {
                if type_info == TYPE_STRING {
                    let text = self.input.read_utf()?;
                    self.output.write_all(b"&")?;
                    self.output.write_all(text.as_bytes())?;
                    self.output.write_all(b";")?;
                }
                Ok(true)
            }

            IGNORABLE_WHITESPACE => {
                if type_info == TYPE_STRING {
                    let text = self.input.read_utf()?;
                    self.output.write_all(text.as_bytes())?;
                }
                Ok(true)
            }

            unknown => {
                self.options.warn(
                    "Unknown command token",
                    &format!("Skipping token {:#04x} with command {}", token, unknown),
                );
                Ok(true)
            }
        }
    }

    /// Decode one attribute record and emit ` name="value"`
    fn process_attribute(&mut self, token: u8) -> Result<()> {
        let type_info = token & 0xF0;
        let name = self.input.read_interned_utf()?;

        self.output.write_all(b" ")?;
        self.output.write_all(name.as_bytes())?;
        self.output.write_all(b"=\"")?;

        let value = AttrValue::decode(type_info, &mut self.input)?;
        value.render(&mut self.output)?;

        self.output.write_all(b"\"")?;
        Ok(())
    }
}
