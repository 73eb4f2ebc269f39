//! Encoding helpers shared by the codec and exposed for callers.

use crate::{AbxError, Result};
use base64::Engine;

/// Encode binary data as standard base64 with `=` padding
pub fn base64_encode(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// Decode a standard base64 string
pub fn base64_decode(encoded: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|_| AbxError::InvalidBase64)
}

/// Encode binary data as lowercase hexadecimal, no `0x` prefix
pub fn hex_encode(data: &[u8]) -> String {
    hex::encode(data)
}

/// Decode a hexadecimal string (case-insensitive)
pub fn hex_decode(encoded: &str) -> Result<Vec<u8>> {
    hex::decode(encoded).map_err(|_| AbxError::InvalidHex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_known_vector() {
        assert_eq!(base64_encode(&[0xDE, 0xAD, 0xBE, 0xEF]), "3q2+7w==");
        assert_eq!(
            base64_decode("3q2+7w==").unwrap(),
            vec![0xDE, 0xAD, 0xBE, 0xEF]
        );
    }

    #[test]
    fn hex_is_lowercase_and_case_insensitive_on_decode() {
        assert_eq!(hex_encode(b"Hello"), "48656c6c6f");
        assert_eq!(hex_decode("48656C6C6F").unwrap(), b"Hello");
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        assert!(matches!(
            base64_decode("not base64!").unwrap_err(),
            AbxError::InvalidBase64
        ));
        assert!(matches!(hex_decode("abc").unwrap_err(), AbxError::InvalidHex));
        assert!(matches!(hex_decode("zz").unwrap_err(), AbxError::InvalidHex));
    }
}
