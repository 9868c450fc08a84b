//! Password encryption for the Google login endpoint.
//!
//! The key is Google's published login key in its binary layout:
//! `modulus_len (u32 BE) | modulus | exponent_len (u32 BE) | exponent`.
//! The ciphertext is prefixed with `0x00` and the first four bytes of the
//! key's SHA-1, then URL-safe base64 encoded.

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use rsa::{BigUint, Oaep, RsaPublicKey};
use sha1::{Digest, Sha1};

use crate::api::ParseError;

const GOOGLE_PUBKEY: &str = "AAAAgMom/1a/v0lblO2Ubrt60J2gcuXSljGFQXgcyZWveWLEwo6prwgi3iJIZdodyhKZQrNWp5nKJ3srRXcUW\
    +F1BD3baEVGcmEgqaLZUNBjm057pKRI16kB0YppeGx5qIQ5QjKzsR8ETQbKLNWgRY0QRNVz34kMJR3P/LgHax\
    /6rmf5AAAAAwEAAQ==";

fn read_u32(bytes: &[u8], at: usize) -> Result<usize, ParseError> {
    bytes
        .get(at..at + 4)
        .and_then(|b| <[u8; 4]>::try_from(b).ok())
        .map(|b| u32::from_be_bytes(b) as usize)
        .ok_or_else(|| ParseError::format("login key truncated"))
}

fn slice(bytes: &[u8], start: usize, len: usize) -> Result<&[u8], ParseError> {
    bytes
        .get(start..start + len)
        .ok_or_else(|| ParseError::format("login key truncated"))
}

/// Encrypt `email\0password` for the `EncryptedPasswd` login field.
pub fn encrypt_password(email: &str, password: &str) -> Result<String, ParseError> {
    let key = STANDARD
        .decode(GOOGLE_PUBKEY)
        .map_err(|e| ParseError::format(format!("login key: {}", e)))?;

    let modulus_len = read_u32(&key, 0)?;
    let modulus = BigUint::from_bytes_be(slice(&key, 4, modulus_len)?);
    let exponent_len = read_u32(&key, 4 + modulus_len)?;
    let exponent = BigUint::from_bytes_be(slice(&key, 8 + modulus_len, exponent_len)?);

    let public_key = RsaPublicKey::new(modulus, exponent)
        .map_err(|e| ParseError::format(format!("login key: {}", e)))?;

    let digest = Sha1::digest(&key);
    let mut plaintext = Vec::with_capacity(email.len() + password.len() + 1);
    plaintext.extend_from_slice(email.as_bytes());
    plaintext.push(0);
    plaintext.extend_from_slice(password.as_bytes());

    let ciphertext = public_key
        .encrypt(&mut rand::thread_rng(), Oaep::new::<Sha1>(), &plaintext)
        .map_err(|e| ParseError::format(format!("password encryption: {}", e)))?;

    let mut out = Vec::with_capacity(5 + ciphertext.len());
    out.push(0);
    out.extend_from_slice(&digest[..4]);
    out.extend_from_slice(&ciphertext);
    Ok(URL_SAFE.encode(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypted_password_layout() {
        let encoded = encrypt_password("user@example.com", "pw").unwrap();
        let raw = URL_SAFE.decode(&encoded).unwrap();

        // 1024-bit key: 5 byte prefix plus 128 bytes of ciphertext.
        assert_eq!(raw.len(), 5 + 128);
        assert_eq!(raw[0], 0);

        let key = STANDARD.decode(GOOGLE_PUBKEY).unwrap();
        assert_eq!(&raw[1..5], &Sha1::digest(&key)[..4]);
    }

    #[test]
    fn test_encryption_is_randomized() {
        let a = encrypt_password("user@example.com", "pw").unwrap();
        let b = encrypt_password("user@example.com", "pw").unwrap();
        assert_ne!(a, b);
        assert_eq!(a[..6], b[..6]);
    }
}
