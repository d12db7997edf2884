//! # Record Digests
//!
//! Keccak-256 digests over the canonical message — the value that lives in
//! a record's `hash` field. Because `hash` is itself one of the volatile
//! fields the canonicalizer strips, a record's digest is stable across its
//! own lifecycle: hash it, store the digest in `hash`, sign it, store the
//! signature in `sig`, hash it again — same digest. That self-referential
//! stability is the whole point, and the reason the digest is computed over
//! the canonical form rather than the raw record.

use sha3::{Digest, Keccak256};
use thiserror::Error;
use tracing::debug;

use crate::canonical::{self, CanonicalError};
use crate::record;
use crate::record::validate::SerializabilityError;
use crate::record::value::Value;

/// Errors from digest computation.
#[derive(Debug, Error)]
pub enum DigestError {
    /// The record is absent.
    #[error("digester.hash_object :: invalid obj")]
    InvalidInput,

    /// The record is not serializable; carries the offending path.
    #[error("digester.hash_object :: {source}")]
    Unserializable {
        #[from]
        source: SerializabilityError,
    },

    /// Canonicalization failed.
    #[error("digester.hash_object :: {source}")]
    Canonical {
        #[from]
        source: CanonicalError,
    },
}

/// Compute the Keccak-256 digest of a record's canonical message, as
/// lowercase `0x`-prefixed hex.
///
/// `excepted_keys` extends the default volatile-field exclusions, exactly
/// as in [`signer::sign_object`](crate::signer::sign_object).
pub fn hash_object(object: &Value, excepted_keys: &[&str]) -> Result<String, DigestError> {
    if matches!(object, Value::Null | Value::Undefined) {
        return Err(DigestError::InvalidInput);
    }
    record::validate(object)?;
    let message = canonical::canonicalize(object, excepted_keys)?;
    debug!(message_len = message.len(), "hashing canonical message");
    let digest = Keccak256::digest(message.as_bytes());
    Ok(format!("0x{}", hex::encode(digest)))
}

/// Structural check for digest strings: `0x` + 64 hex digits.
pub fn is_valid_hash(value: &str) -> bool {
    value
        .strip_prefix("0x")
        .map(|h| h.len() == 64 && h.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false)
}
