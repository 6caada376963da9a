//! Fuzz target for AES-GCM blob opening
//!
//! # Strategy
//!
//! - Arbitrary key and blob bytes, including blobs shorter than the nonce
//! - Sealed blobs with one byte flipped
//!
//! # Invariants
//!
//! - Opening never panics
//! - A blob shorter than the nonce is malformed, never decrypted
//! - Any modification of a sealed blob fails authentication

#![no_main]

use arbitrary::Arbitrary;
use kemlink_crypto::{CryptoError, NONCE_SIZE, SymmetricKey, open, seal};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Input {
    Raw { key: [u8; 32], blob: Vec<u8> },
    Flipped { key: [u8; 32], nonce: [u8; NONCE_SIZE], plaintext: Vec<u8>, position: u16, mask: u8 },
}

fuzz_target!(|input: Input| {
    match input {
        Input::Raw { key, blob } => {
            let result = open(&SymmetricKey::from_bytes(key), &blob);
            if blob.len() < NONCE_SIZE {
                assert!(matches!(result, Err(CryptoError::MalformedBlob { .. })));
            }
        },
        Input::Flipped { key, nonce, plaintext, position, mask } => {
            let key = SymmetricKey::from_bytes(key);
            let mut blob = seal(&key, &plaintext, nonce).unwrap();
            assert_eq!(open(&key, &blob).unwrap(), plaintext);

            if mask == 0 {
                return;
            }
            let index = usize::from(position) % blob.len();
            blob[index] ^= mask;
            assert!(open(&key, &blob).is_err(), "tampered blob opened at byte {index}");
        },
    }
});
