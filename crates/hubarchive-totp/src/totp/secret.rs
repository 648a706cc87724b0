//! Shared-secret decoding.
//!
//! Secrets are handed out base-32 encoded (sometimes grouped with spaces or
//! dashes, sometimes lowercase, with or without `=` padding). Decoded key
//! bytes are wiped from memory when the [`SecretKey`] is dropped.

use crate::totp::types::{TotpError, TotpErrorKind};
use data_encoding::BASE32_NOPAD;
use std::fmt;
use zeroize::Zeroizing;

/// RFC 4226 §4 R6: keys shorter than 128 bits are below the required strength.
const RECOMMENDED_MIN_KEY_BYTES: usize = 16;

/// Decoded shared secret.
#[derive(Clone)]
pub struct SecretKey(Zeroizing<Vec<u8>>);

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("len", &self.0.len())
            .finish_non_exhaustive()
    }
}

impl SecretKey {
    /// Decode a base-32 secret (with or without spaces/dashes, case-insensitive).
    ///
    /// Trailing `=` padding is optional. Anything else that is not canonical
    /// RFC 4648 base-32 (stray `=`, impossible lengths, non-zero trailing
    /// bits) is rejected.
    pub fn from_base32(b32: &str) -> Result<Self, TotpError> {
        let cleaned = normalise_base32(b32);
        let unpadded = cleaned.trim_end_matches('=');
        if unpadded.is_empty() {
            return Err(empty_secret());
        }
        let bytes = BASE32_NOPAD.decode(unpadded.as_bytes()).map_err(|e| {
            TotpError::new(TotpErrorKind::InvalidSecret, "Invalid base-32 secret")
                .with_detail(e.to_string())
        })?;
        Self::from_bytes(bytes)
    }

    /// Decode a hex secret, as printed by some identity providers.
    pub fn from_hex(hex_str: &str) -> Result<Self, TotpError> {
        let cleaned: String = hex_str.chars().filter(|c| !c.is_whitespace()).collect();
        if cleaned.is_empty() {
            return Err(empty_secret());
        }
        let bytes = hex::decode(&cleaned).map_err(|e| {
            TotpError::new(TotpErrorKind::InvalidSecret, "Invalid hex secret").with_detail(e.to_string())
        })?;
        Self::from_bytes(bytes)
    }

    /// Use raw key bytes as-is.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, TotpError> {
        let bytes = Zeroizing::new(bytes.into());
        if bytes.is_empty() {
            return Err(empty_secret());
        }
        if bytes.len() < RECOMMENDED_MIN_KEY_BYTES {
            log::warn!(
                "TOTP secret is {} bits, below the 128 bits RFC 4226 requires",
                bytes.len() * 8
            );
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Key length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Uppercase, no spaces/dashes.
pub(crate) fn normalise_base32(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_uppercase()
}

fn empty_secret() -> TotpError {
    TotpError::new(TotpErrorKind::InvalidSecret, "Secret is empty")
}
