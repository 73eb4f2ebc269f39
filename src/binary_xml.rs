use crate::{AbxError, Result};
use crate::{INTERNED_STRING_NEW_MARKER, MAX_UNSIGNED_SHORT};
use byteorder::{BigEndian, WriteBytesExt};
use std::collections::HashMap;
use std::io::{ErrorKind, Read, Write};

/// Fast data input reader for binary ABX format.
///
/// Provides typed big-endian primitives over any byte source plus a one-byte
/// lookahead used by the deserializer's attribute sub-loop. The lookahead
/// replaces positional seeking so that non-seekable sources (pipes, stdin)
/// work unmodified.
#[derive(Debug)]
pub struct FastDataInput<R: Read> {
    reader: R,
    interned_strings: Vec<String>,
    peeked_byte: Option<u8>,
}

impl<R: Read> FastDataInput<R> {
    /// Create a new FastDataInput reader
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            interned_strings: Vec::new(),
            peeked_byte: None,
        }
    }

    fn fill(&mut self, buf: &mut [u8], what: &'static str) -> Result<()> {
        self.reader.read_exact(buf).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                AbxError::UnexpectedEof(what)
            } else {
                AbxError::Io(e)
            }
        })
    }

    /// Read a single byte
    pub fn read_byte(&mut self) -> Result<u8> {
        if let Some(byte) = self.peeked_byte.take() {
            return Ok(byte);
        }
        let mut buf = [0u8; 1];
        self.fill(&mut buf, "byte")?;
        Ok(buf[0])
    }

    /// Peek the next byte without consuming it
    pub fn peek_byte(&mut self) -> Result<u8> {
        if let Some(byte) = self.peeked_byte {
            return Ok(byte);
        }
        let byte = self.read_byte()?;
        self.peeked_byte = Some(byte);
        Ok(byte)
    }

    // Multi-byte reads splice in the pending lookahead byte, if any.
    fn fill_spliced(&mut self, buf: &mut [u8], what: &'static str) -> Result<()> {
        let start = if let Some(byte) = self.peeked_byte.take() {
            buf[0] = byte;
            1
        } else {
            0
        };
        self.reader.read_exact(&mut buf[start..]).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                AbxError::UnexpectedEof(what)
            } else {
                AbxError::Io(e)
            }
        })
    }

    /// Read a 16-bit unsigned integer (big-endian)
    pub fn read_short(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.fill_spliced(&mut buf, "short")?;
        Ok(u16::from_be_bytes(buf))
    }

    /// Read a 32-bit signed integer (big-endian)
    pub fn read_int(&mut self) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.fill_spliced(&mut buf, "int")?;
        Ok(i32::from_be_bytes(buf))
    }

    /// Read a 64-bit signed integer (big-endian)
    pub fn read_long(&mut self) -> Result<i64> {
        let mut buf = [0u8; 8];
        self.fill_spliced(&mut buf, "long")?;
        Ok(i64::from_be_bytes(buf))
    }

    /// Read a 32-bit float from its raw big-endian bits
    pub fn read_float(&mut self) -> Result<f32> {
        let bits = self.read_int()? as u32;
        Ok(f32::from_bits(bits))
    }

    /// Read a 64-bit double from its raw big-endian bits
    pub fn read_double(&mut self) -> Result<f64> {
        let bits = self.read_long()? as u64;
        Ok(f64::from_bits(bits))
    }

    /// Read a length-prefixed UTF-8 string
    pub fn read_utf(&mut self) -> Result<String> {
        let length = self.read_short()?;
        let buffer = self.read_bytes(length)?;
        String::from_utf8(buffer)
            .map_err(|_| AbxError::ParseError("invalid UTF-8 in string payload".to_string()))
    }

    /// Read an interned string reference.
    ///
    /// The sentinel `0xFFFF` introduces a new raw string, which is appended
    /// to the pool; any other value indexes an existing pool entry.
    pub fn read_interned_utf(&mut self) -> Result<String> {
        let index = self.read_short()?;
        if index == INTERNED_STRING_NEW_MARKER {
            let string = self.read_utf()?;
            self.interned_strings.push(string.clone());
            Ok(string)
        } else {
            self.interned_strings
                .get(index as usize)
                .cloned()
                .ok_or(AbxError::InvalidInternedStringIndex(index))
        }
    }

    /// Read a byte array of specified length
    pub fn read_bytes(&mut self, length: u16) -> Result<Vec<u8>> {
        let mut data = vec![0u8; length as usize];
        if !data.is_empty() {
            self.fill_spliced(&mut data, "bytes")?;
        }
        Ok(data)
    }

    /// Get the interned strings table (for debugging)
    pub fn interned_strings(&self) -> &[String] {
        &self.interned_strings
    }
}

/// Fast data output writer for binary ABX format.
///
/// The dual of [`FastDataInput`]: typed big-endian primitives over any byte
/// sink, plus the write-side string pool. The pool keeps both a lookup map
/// and the insertion-order list so the indices it hands out mirror exactly
/// what a reader will reconstruct.
pub struct FastDataOutput<W: Write> {
    writer: W,
    string_pool: HashMap<String, u16>,
    interned_strings: Vec<String>,
}

impl<W: Write> FastDataOutput<W> {
    /// Create a new FastDataOutput writer
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            string_pool: HashMap::new(),
            interned_strings: Vec::new(),
        }
    }

    /// Write a single byte
    pub fn write_byte(&mut self, value: u8) -> Result<()> {
        self.writer.write_u8(value)?;
        Ok(())
    }

    /// Write a 16-bit unsigned integer (big-endian)
    pub fn write_short(&mut self, value: u16) -> Result<()> {
        self.writer.write_u16::<BigEndian>(value)?;
        Ok(())
    }

    /// Write a 32-bit signed integer (big-endian)
    pub fn write_int(&mut self, value: i32) -> Result<()> {
        self.writer.write_i32::<BigEndian>(value)?;
        Ok(())
    }

    /// Write a 64-bit signed integer (big-endian)
    pub fn write_long(&mut self, value: i64) -> Result<()> {
        self.writer.write_i64::<BigEndian>(value)?;
        Ok(())
    }

    /// Write a 32-bit float as its raw big-endian bits
    pub fn write_float(&mut self, value: f32) -> Result<()> {
        self.writer.write_f32::<BigEndian>(value)?;
        Ok(())
    }

    /// Write a 64-bit double as its raw big-endian bits
    pub fn write_double(&mut self, value: f64) -> Result<()> {
        self.writer.write_f64::<BigEndian>(value)?;
        Ok(())
    }

    /// Write a length-prefixed UTF-8 string (max 65535 bytes)
    pub fn write_utf(&mut self, s: &str) -> Result<()> {
        let bytes = s.as_bytes();
        if bytes.len() > MAX_UNSIGNED_SHORT {
            return Err(AbxError::StringTooLong(bytes.len(), MAX_UNSIGNED_SHORT));
        }
        self.write_short(bytes.len() as u16)?;
        self.writer.write_all(bytes)?;
        Ok(())
    }

    /// Write an interned string reference.
    ///
    /// First sight writes the `0xFFFF` sentinel followed by the raw string
    /// and assigns the next pool index; later occurrences write the index.
    pub fn write_interned_utf(&mut self, s: &str) -> Result<()> {
        if let Some(&index) = self.string_pool.get(s) {
            self.write_short(index)?;
        } else {
            // Index 0xFFFF is the sentinel, so the pool caps at 65535 entries.
            if self.interned_strings.len() >= MAX_UNSIGNED_SHORT {
                return Err(AbxError::PoolOverflow(self.interned_strings.len()));
            }
            self.write_short(INTERNED_STRING_NEW_MARKER)?;
            self.write_utf(s)?;
            let index = self.interned_strings.len() as u16;
            self.string_pool.insert(s.to_string(), index);
            self.interned_strings.push(s.to_string());
        }
        Ok(())
    }

    /// Write raw bytes without a length prefix
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        Ok(())
    }

    /// Flush the underlying sink
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Number of distinct strings interned so far
    pub fn pool_len(&self) -> usize {
        self.interned_strings.len()
    }
}

/// XML entity encoder for safe XML output
pub fn encode_xml_entities(text: &str) -> std::borrow::Cow<'_, str> {
    if !text
        .bytes()
        .any(|b| matches!(b, b'&' | b'<' | b'>' | b'"' | b'\''))
    {
        return std::borrow::Cow::Borrowed(text);
    }

    let mut result = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            _ => result.push(ch),
        }
    }
    std::borrow::Cow::Owned(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn primitives_round_trip_big_endian() {
        let mut buf = Vec::new();
        {
            let mut out = FastDataOutput::new(&mut buf);
            out.write_byte(0x7F).unwrap();
            out.write_short(0xBEEF).unwrap();
            out.write_int(-2).unwrap();
            out.write_long(i64::MIN).unwrap();
            out.write_float(3.14).unwrap();
            out.write_double(-0.5).unwrap();
        }
        // Big-endian on the wire
        assert_eq!(&buf[1..3], &[0xBE, 0xEF]);
        assert_eq!(&buf[3..7], &[0xFF, 0xFF, 0xFF, 0xFE]);

        let mut input = FastDataInput::new(Cursor::new(buf));
        assert_eq!(input.read_byte().unwrap(), 0x7F);
        assert_eq!(input.read_short().unwrap(), 0xBEEF);
        assert_eq!(input.read_int().unwrap(), -2);
        assert_eq!(input.read_long().unwrap(), i64::MIN);
        assert_eq!(input.read_float().unwrap(), 3.14);
        assert_eq!(input.read_double().unwrap(), -0.5);
    }

    #[test]
    fn peek_does_not_consume() {
        let mut input = FastDataInput::new(Cursor::new(vec![0xAB, 0xCD]));
        assert_eq!(input.peek_byte().unwrap(), 0xAB);
        assert_eq!(input.peek_byte().unwrap(), 0xAB);
        assert_eq!(input.read_byte().unwrap(), 0xAB);
        assert_eq!(input.read_byte().unwrap(), 0xCD);
    }

    #[test]
    fn peeked_byte_splices_into_multibyte_reads() {
        let mut input = FastDataInput::new(Cursor::new(vec![0x12, 0x34, 0x56, 0x78]));
        assert_eq!(input.peek_byte().unwrap(), 0x12);
        assert_eq!(input.read_int().unwrap(), 0x12345678);
    }

    #[test]
    fn utf_round_trip() {
        let mut buf = Vec::new();
        FastDataOutput::new(&mut buf).write_utf("héllo wörld").unwrap();
        let mut input = FastDataInput::new(Cursor::new(buf));
        assert_eq!(input.read_utf().unwrap(), "héllo wörld");
    }

    #[test]
    fn utf_rejects_oversized_string() {
        let long = "x".repeat(MAX_UNSIGNED_SHORT + 1);
        let err = FastDataOutput::new(Vec::new()).write_utf(&long).unwrap_err();
        assert!(matches!(err, AbxError::StringTooLong(65536, 65535)));
    }

    #[test]
    fn utf_accepts_max_length_string() {
        let exact = "x".repeat(MAX_UNSIGNED_SHORT);
        let mut buf = Vec::new();
        FastDataOutput::new(&mut buf).write_utf(&exact).unwrap();
        assert_eq!(buf.len(), 2 + MAX_UNSIGNED_SHORT);
    }

    #[test]
    fn interning_first_sight_then_index() {
        let mut buf = Vec::new();
        {
            let mut out = FastDataOutput::new(&mut buf);
            out.write_interned_utf("tag").unwrap();
            out.write_interned_utf("other").unwrap();
            out.write_interned_utf("tag").unwrap();
        }
        // FFFF + len + "tag", FFFF + len + "other", then index 0
        assert_eq!(&buf[0..2], &[0xFF, 0xFF]);
        assert_eq!(&buf[buf.len() - 2..], &[0x00, 0x00]);

        let mut input = FastDataInput::new(Cursor::new(buf));
        assert_eq!(input.read_interned_utf().unwrap(), "tag");
        assert_eq!(input.read_interned_utf().unwrap(), "other");
        assert_eq!(input.read_interned_utf().unwrap(), "tag");
        assert_eq!(input.interned_strings(), ["tag", "other"]);
    }

    #[test]
    fn interned_index_out_of_range() {
        let mut input = FastDataInput::new(Cursor::new(vec![0xFF, 0xFE]));
        let err = input.read_interned_utf().unwrap_err();
        assert!(matches!(err, AbxError::InvalidInternedStringIndex(0xFFFE)));
    }

    #[test]
    fn pool_rejects_entry_65536() {
        let mut out = FastDataOutput::new(std::io::sink());
        for i in 0..MAX_UNSIGNED_SHORT {
            out.write_interned_utf(&i.to_string()).unwrap();
        }
        assert_eq!(out.pool_len(), 65535);
        // Re-interning an existing string is still fine
        out.write_interned_utf("0").unwrap();
        let err = out.write_interned_utf("one too many").unwrap_err();
        assert!(matches!(err, AbxError::PoolOverflow(65535)));
    }

    #[test]
    fn short_read_is_unexpected_eof() {
        let mut input = FastDataInput::new(Cursor::new(vec![0x01]));
        let err = input.read_int().unwrap_err();
        assert!(matches!(err, AbxError::UnexpectedEof(_)));
    }

    #[test]
    fn encode_entities_escapes_all_five() {
        assert_eq!(
            encode_xml_entities(r#"5 < 6 & "t" > 'u'"#),
            "5 &lt; 6 &amp; &quot;t&quot; &gt; &apos;u&apos;"
        );
    }

    #[test]
    fn encode_entities_borrows_when_clean() {
        assert!(matches!(
            encode_xml_entities("plain text"),
            std::borrow::Cow::Borrowed(_)
        ));
    }
}
