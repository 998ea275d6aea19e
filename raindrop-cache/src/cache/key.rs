//! Credential-derived cache keys.
//!
//! `CacheKey`'s private inner field means a key can only come out of a
//! [`KeyDeriver`]. There is no way to index a cache partition by a raw token.

use raindrop_core::CacheError;
use sha2::{Digest, Sha256};
use std::fmt;

/// Length of the short prefix used in log fields.
const SHORT_LEN: usize = 8;

/// A partition key derived from a caller's credential.
///
/// # Format
///
/// Uppercase hex of the credential's SHA-256 digest: always 64 characters,
/// whatever the length of the input. Equal credentials always map to the
/// same key.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    /// Private - only constructible through a deriver.
    digest: String,
}

impl CacheKey {
    /// Derive a key with the default SHA-256 deriver.
    pub fn derive(raw_credential: &str) -> Result<Self, CacheError> {
        Sha256KeyDeriver.derive(raw_credential)
    }

    fn from_digest(digest: &[u8]) -> Self {
        Self {
            digest: hex::encode_upper(digest),
        }
    }

    /// The full hex digest.
    pub fn as_str(&self) -> &str {
        &self.digest
    }

    /// First few characters of the digest, for log fields.
    pub fn short(&self) -> &str {
        &self.digest[..SHORT_LEN.min(self.digest.len())]
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({}..)", self.short())
    }
}

/// Maps a raw credential to a cache partition key.
///
/// Implementations must be deterministic and one-way, must reject an empty
/// credential with [`CacheError::InvalidCredential`], and must never return
/// a key equal to the raw credential.
pub trait KeyDeriver: Send + Sync {
    fn derive(&self, raw_credential: &str) -> Result<CacheKey, CacheError>;
}

/// SHA-256 over the UTF-8 bytes of the credential.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256KeyDeriver;

impl KeyDeriver for Sha256KeyDeriver {
    fn derive(&self, raw_credential: &str) -> Result<CacheKey, CacheError> {
        if raw_credential.is_empty() {
            return Err(CacheError::InvalidCredential);
        }
        let digest = Sha256::digest(raw_credential.as_bytes());
        Ok(CacheKey::from_digest(&digest))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_derive_is_deterministic() {
        let a = CacheKey::derive("token-a").unwrap();
        let b = CacheKey::derive("token-a").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_credentials_differ() {
        let a = CacheKey::derive("token-a").unwrap();
        let b = CacheKey::derive("token-b").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_known_digest_is_uppercase_hex() {
        // sha256("abc")
        let key = CacheKey::derive("abc").unwrap();
        assert_eq!(
            key.as_str(),
            "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD"
        );
    }

    #[test]
    fn test_empty_credential_is_rejected() {
        assert_eq!(CacheKey::derive(""), Err(CacheError::InvalidCredential));
        assert_eq!(
            Sha256KeyDeriver.derive(""),
            Err(CacheError::InvalidCredential)
        );
    }

    #[test]
    fn test_debug_shows_only_prefix() {
        let key = CacheKey::derive("abc").unwrap();
        let debug = format!("{:?}", key);
        assert_eq!(debug, "CacheKey(BA7816BF..)");
        assert!(!debug.contains(key.as_str()));
    }

    proptest! {
        #[test]
        fn prop_key_is_fixed_length_and_never_the_credential(raw in ".{1,512}") {
            let key = CacheKey::derive(&raw).unwrap();
            prop_assert_eq!(key.as_str().len(), 64);
            prop_assert_ne!(key.as_str(), raw.as_str());
            prop_assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        }
    }
}
