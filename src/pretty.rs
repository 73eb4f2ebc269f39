//! Indentation-based reformatting of XML text, backing `abx2xml -p`.

use crate::{AbxError, Result};
use quick_xml::events::Event;
use quick_xml::{Reader, Writer};

/// Re-indent an XML document with four-space indentation.
///
/// Whitespace-only text nodes are dropped and regenerated from the element
/// structure; everything else passes through unchanged.
///
/// # Examples
///
/// ```
/// use apiary::pretty;
///
/// let out = pretty::reformat("<a><b>t</b></a>").unwrap();
/// assert_eq!(out, "<a>\n    <b>t</b>\n</a>");
/// ```
pub fn reformat(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
    loop {
        match reader.read_event()? {
            Event::Eof => break,
            event => writer
                .write_event(event)
                .map_err(|e| AbxError::XmlParsing(e.to_string()))?,
        }
    }

    String::from_utf8(writer.into_inner())
        .map_err(|_| AbxError::ParseError("Invalid UTF-8 in output".to_string()))
}
