//! A library for converting between Android Binary XML (ABX) and
//! human-readable XML.
//!
//! ABX is the length-prefixed, big-endian, token-tagged binary encoding used
//! by Android system services for configuration and state files. This crate
//! supports both directions: parsing XML and emitting ABX with automatic
//! per-attribute type inference, and parsing ABX and emitting textual XML
//! compatible with Android's reader.
//!
//! # Examples
//!
//! ```no_run
//! use apiary::{AbxToXmlConverter, XmlToAbxConverter, Options};
//!
//! // ABX file to XML file
//! AbxToXmlConverter::convert_file("input.abx", "output.xml").unwrap();
//!
//! // XML string to ABX bytes, collapsing insignificant whitespace
//! let abx = XmlToAbxConverter::convert_str_with_options(
//!     r#"<manifest package="com.example.app" versionCode="1"/>"#,
//!     Options::new().collapse_whitespace(true),
//! ).unwrap();
//! assert_eq!(&abx[0..4], b"ABX\0");
//! ```
//!
//! For fine-grained control over the wire output, drive a
//! [`BinaryXmlSerializer`] directly:
//!
//! ```no_run
//! use apiary::BinaryXmlSerializer;
//!
//! let mut buf = Vec::new();
//! let mut ser = BinaryXmlSerializer::new(&mut buf).unwrap();
//! ser.start_document().unwrap();
//! ser.start_tag("manifest").unwrap();
//! ser.attribute("package", "com.example.app").unwrap();
//! ser.attribute_int("versionCode", 1).unwrap();
//! ser.end_tag("manifest").unwrap();
//! ser.end_document().unwrap();
//! ```

use std::io;
use thiserror::Error;

mod attr;
mod binary_xml;
pub mod cli;
mod converter;
mod deserializer;
mod driver;
mod infer;
pub mod pretty;
mod serializer;
pub mod util;

pub use attr::AttrValue;
pub use binary_xml::{encode_xml_entities, FastDataInput, FastDataOutput};
pub use converter::{AbxToXmlConverter, XmlToAbxConverter};
pub use deserializer::BinaryXmlDeserializer;
pub use infer::infer_attribute;
pub use serializer::BinaryXmlSerializer;

/// Error types for ABX parsing and conversion
#[derive(Error, Debug)]
pub enum AbxError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(
        "Invalid ABX file format - magic header mismatch. Expected: {expected:02X?}, got: {actual:02X?}"
    )]
    InvalidMagicHeader { expected: [u8; 4], actual: [u8; 4] },
    #[error("Unexpected end of stream while reading {0}")]
    UnexpectedEof(&'static str),
    #[error("Invalid interned string index: {0}")]
    InvalidInternedStringIndex(u16),
    #[error("Unknown command token: {0}")]
    UnknownCommand(u8),
    #[error("Unknown attribute type: {0}")]
    UnknownAttributeType(u8),
    #[error("String too long: {0} bytes (max: {1})")]
    StringTooLong(usize, usize),
    #[error("String pool is full ({0} entries)")]
    PoolOverflow(usize),
    #[error("Mismatched tags: expected '{expected}', got '{found}'")]
    TagMismatch { expected: String, found: String },
    #[error("Unbalanced document: {0}")]
    UnbalancedEnd(String),
    #[error("XML parsing failed: {0}")]
    XmlParsing(String),
    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("Invalid hex string")]
    InvalidHex,
    #[error("Invalid base64 string")]
    InvalidBase64,
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl From<quick_xml::Error> for AbxError {
    fn from(err: quick_xml::Error) -> Self {
        AbxError::XmlParsing(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for AbxError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        AbxError::XmlParsing(err.to_string())
    }
}

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, AbxError>;

// Protocol constants - exposed for advanced users
pub const PROTOCOL_MAGIC_VERSION_0: [u8; 4] = [0x41, 0x42, 0x58, 0x00];

// Command tokens (lower 4 bits)
pub const START_DOCUMENT: u8 = 0;
pub const END_DOCUMENT: u8 = 1;
pub const START_TAG: u8 = 2;
pub const END_TAG: u8 = 3;
pub const TEXT: u8 = 4;
pub const CDSECT: u8 = 5;
pub const ENTITY_REF: u8 = 6;
pub const IGNORABLE_WHITESPACE: u8 = 7;
pub const PROCESSING_INSTRUCTION: u8 = 8;
pub const COMMENT: u8 = 9;
pub const DOCDECL: u8 = 10;
pub const ATTRIBUTE: u8 = 15;

// Type tokens (upper 4 bits)
pub const TYPE_NULL: u8 = 1 << 4;
pub const TYPE_STRING: u8 = 2 << 4;
pub const TYPE_STRING_INTERNED: u8 = 3 << 4;
pub const TYPE_BYTES_HEX: u8 = 4 << 4;
pub const TYPE_BYTES_BASE64: u8 = 5 << 4;
pub const TYPE_INT: u8 = 6 << 4;
pub const TYPE_INT_HEX: u8 = 7 << 4;
pub const TYPE_LONG: u8 = 8 << 4;
pub const TYPE_LONG_HEX: u8 = 9 << 4;
pub const TYPE_FLOAT: u8 = 10 << 4;
pub const TYPE_DOUBLE: u8 = 11 << 4;
pub const TYPE_BOOLEAN_TRUE: u8 = 12 << 4;
pub const TYPE_BOOLEAN_FALSE: u8 = 13 << 4;

/// Maximum byte length of a length-prefixed UTF-8 string or byte array
pub const MAX_UNSIGNED_SHORT: usize = 65535;

/// Interned reference value introducing a new raw string
pub const INTERNED_STRING_NEW_MARKER: u16 = 0xFFFF;

/// Warning callback: receives a category and a message.
pub type WarningHandler = Box<dyn FnMut(&str, &str)>;

/// Options for XML to ABX conversion.
///
/// # Examples
///
/// ```
/// use apiary::Options;
///
/// let opts = Options::new().collapse_whitespace(true);
/// ```
#[derive(Default)]
pub struct Options {
    /// Drop whitespace-only text nodes instead of encoding them as
    /// IGNORABLE_WHITESPACE records.
    pub collapse_whitespace: bool,
    warning_handler: Option<WarningHandler>,
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("collapse_whitespace", &self.collapse_whitespace)
            .field("warning_handler", &self.warning_handler.is_some())
            .finish()
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collapse_whitespace(mut self, value: bool) -> Self {
        self.collapse_whitespace = value;
        self
    }

    /// Install a warning callback. Without one, warnings go to stderr.
    pub fn on_warning<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&str, &str) + 'static,
    {
        self.warning_handler = Some(Box::new(handler));
        self
    }

    pub(crate) fn warn(&mut self, category: &str, message: &str) {
        match self.warning_handler.as_mut() {
            Some(handler) => handler(category, message),
            None => {
                eprintln!("WARNING: {} is not supported and might be lost.", category);
                eprintln!("  {}", message);
            }
        }
    }
}
