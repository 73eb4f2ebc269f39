use crate::infer::infer_attribute;
use crate::serializer::BinaryXmlSerializer;
use crate::{Options, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{BufRead, Write};

/// Streams quick-xml events into serializer calls, in document order.
///
/// Namespace prefixes pass through verbatim; the first `xmlns` declaration
/// or colon-prefixed name seen produces a warning, once per run. Attribute
/// textual order is preserved.
pub(crate) struct Driver<W: Write> {
    serializer: BinaryXmlSerializer<W>,
    options: Options,
    warned_namespaces: bool,
    warned_encoding: bool,
}

impl<W: Write> Driver<W> {
    pub fn new(writer: W, options: Options) -> Result<Self> {
        Ok(Self {
            serializer: BinaryXmlSerializer::new(writer)?,
            options,
            warned_namespaces: false,
            warned_encoding: false,
        })
    }

    /// Consume the XML event stream and write the full ABX document
    pub fn run<R: BufRead>(mut self, mut reader: Reader<R>) -> Result<()> {
        reader
            .config_mut()
            .trim_text(self.options.collapse_whitespace);

        let mut buf = Vec::new();
        self.serializer.start_document()?;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => self.element(&e, false)?,
                Event::Empty(e) => self.element(&e, true)?,
                Event::End(e) => {
                    let name = std::str::from_utf8(e.name().as_ref())?.to_string();
                    self.serializer.end_tag(&name)?;
                }
                Event::Text(e) => {
                    let text = std::str::from_utf8(&e)?;
                    if is_whitespace_only(text) {
                        if !self.options.collapse_whitespace {
                            self.serializer.ignorable_whitespace(text)?;
                        }
                    } else {
                        self.serializer.text(text)?;
                    }
                }
                Event::CData(e) => {
                    let text = std::str::from_utf8(&e)?;
                    self.serializer.cdsect(text)?;
                }
                Event::Comment(e) => {
                    let text = std::str::from_utf8(&e)?;
                    self.serializer.comment(text)?;
                }
                Event::PI(e) => {
                    let target = std::str::from_utf8(e.target())?.to_string();
                    let content = e.content();
                    let data = if content.is_empty() {
                        None
                    } else {
                        Some(std::str::from_utf8(content)?.to_string())
                    };
                    if target == "xml" {
                        if let Some(content) = data.as_deref() {
                            self.check_encoding(content);
                        }
                    }
                    self.serializer
                        .processing_instruction(&target, data.as_deref())?;
                }
                Event::Decl(decl) => {
                    // The declaration is regenerated on decode; only check
                    // that the input does not claim a foreign encoding.
                    if let Some(enc_result) = decl.encoding() {
                        let enc_bytes = enc_result
                            .map_err(|e| crate::AbxError::XmlParsing(e.to_string()))?;
                        let enc = std::str::from_utf8(enc_bytes.as_ref())?.to_string();
                        self.check_encoding(&enc);
                    }
                }
                Event::DocType(e) => {
                    let text = std::str::from_utf8(&e)?;
                    self.serializer.docdecl(text)?;
                }
                Event::GeneralRef(e) => {
                    let name = std::str::from_utf8(&e)?;
                    self.serializer.entity_ref(name)?;
                }
                Event::Eof => break,
            }
            buf.clear();
        }

        self.serializer.end_document()
    }

    fn element(&mut self, e: &BytesStart, empty: bool) -> Result<()> {
        let name = std::str::from_utf8(e.name().as_ref())?.to_string();
        if name.contains(':') {
            self.warn_namespaces(&format!("Found prefixed element: {}", name));
        }

        self.serializer.start_tag(&name)?;

        for attr in e.attributes() {
            let attr = attr?;
            let attr_name = std::str::from_utf8(attr.key.as_ref())?.to_string();
            let attr_value = attr
                .unescape_value()
                .map_err(|e| crate::AbxError::XmlParsing(e.to_string()))?;

            if attr_name.starts_with("xmlns") || attr_name.contains(':') {
                self.warn_namespaces(&format!(
                    "Found namespace declaration or prefixed attribute: {}",
                    attr_name
                ));
            }

            let value = infer_attribute(&attr_value);
            self.serializer.attribute_value(&attr_name, &value)?;
        }

        if empty {
            self.serializer.end_tag(&name)?;
        }
        Ok(())
    }

    fn warn_namespaces(&mut self, message: &str) {
        if !self.warned_namespaces {
            self.warned_namespaces = true;
            self.options.warn("Namespaces and prefixes", message);
        }
    }

    fn check_encoding(&mut self, declared: &str) {
        if !declared.to_lowercase().contains("utf-8") && !self.warned_encoding {
            self.warned_encoding = true;
            self.options
                .warn("Non-UTF-8 encoding", &format!("Found in declaration: {}", declared));
        }
    }
}

fn is_whitespace_only(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
}
