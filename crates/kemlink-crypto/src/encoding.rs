//! Base64 boundary encoding and display fingerprints.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use sha2::{Digest, Sha256};

use crate::CryptoError;

/// Number of digest bytes shown in a fingerprint.
const FINGERPRINT_BYTES: usize = 8;

/// Encode bytes as standard (padded) base64.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode standard base64, naming the input in the error.
pub fn decode(what: &'static str, input: &str) -> Result<Vec<u8>, CryptoError> {
    STANDARD
        .decode(input)
        .map_err(|e| CryptoError::InvalidEncoding { what, reason: e.to_string() })
}

/// Short hex fingerprint (first 8 bytes of SHA-256).
///
/// Lets two parties compare secrets visually without revealing them.
pub fn fingerprint(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(&digest[..FINGERPRINT_BYTES])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_rejects_invalid_alphabet() {
        let result = decode("ciphertext", "not base64!!");
        assert!(matches!(result, Err(CryptoError::InvalidEncoding { what: "ciphertext", .. })));
    }

    #[test]
    fn encode_is_standard_padded() {
        assert_eq!(encode(b"ab"), "YWI=");
        assert_eq!(decode("x", "YWI=").unwrap(), b"ab");
    }

    #[test]
    fn fingerprint_is_16_hex_chars() {
        let fp = fingerprint(b"secret");
        assert_eq!(fp.len(), 16);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn fingerprint_distinguishes_inputs() {
        assert_ne!(fingerprint(b"one"), fingerprint(b"two"));
        assert_eq!(fingerprint(b"one"), fingerprint(b"one"));
    }
}
