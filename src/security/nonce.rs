use crate::constants::{DEFAULT_NONCE_LENGTH, MIN_NONCE_LENGTH};
use crate::error::CspError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64, Engine};
use getrandom::getrandom;
use smallvec::SmallVec;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Upper bound on the length of a nonce accepted from a client handshake.
const MAX_FORWARDED_NONCE_LEN: usize = 128;

/// Mints nonces from the operating system CSPRNG, encoded as unpadded
/// base64url so they can be embedded in a source expression without escaping.
#[derive(Debug)]
pub struct NonceGenerator {
    length: usize,
    generated: AtomicUsize,
}

impl NonceGenerator {
    /// `length` is the number of random bytes; values below 16 are raised to 16.
    #[inline]
    pub fn new(length: usize) -> Self {
        Self {
            length: length.max(MIN_NONCE_LENGTH),
            generated: AtomicUsize::new(0),
        }
    }

    pub fn generate(&self) -> Result<String, CspError> {
        let mut buffer: SmallVec<[u8; 64]> = SmallVec::from_elem(0, self.length);
        getrandom(&mut buffer).map_err(|e| CspError::CryptoError(e.to_string()))?;
        self.generated.fetch_add(1, Ordering::Relaxed);
        Ok(BASE64.encode(&buffer))
    }

    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn generated_count(&self) -> usize {
        self.generated.load(Ordering::Relaxed)
    }
}

impl Default for NonceGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_NONCE_LENGTH)
    }
}

/// Whether `value` can be placed inside `'nonce-…'` and an HTML attribute
/// as-is: non-empty, bounded, and drawn from the base64 / base64url alphabets.
pub fn is_valid_nonce(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_FORWARDED_NONCE_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'+' | b'/' | b'='))
}
