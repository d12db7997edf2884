//! # Signing Orchestration
//!
//! The write side of the pipeline: take an untrusted record, prove it is
//! signable, reduce it to canonical bytes, and hand exactly those bytes to
//! the key provider. Every check happens before the provider is touched —
//! fail fast, no partial signing, no retries.
//!
//! The order of operations is the contract:
//!
//! 1. The record must exist and carry a syntactically valid `wallet` field
//!    naming the signer. A record that does not say who signs it is not a
//!    signable record, it is a bug report waiting to happen.
//! 2. The serializability validator runs on the full graph. Its error (with
//!    the offending path) is propagated verbatim, prefixed with this
//!    operation's name for traceability.
//! 3. The canonicalizer strips the volatile fields (plus any caller
//!    exceptions) and produces the message.
//! 4. The provider signs. The returned signature is already normalized to
//!    lowercase hex by the [`Signature`] type.

use tracing::debug;

use crate::canonical::{self, CanonicalError};
use crate::keys::{Address, Signature};
use crate::provider::{KeyProvider, ProviderError};
use crate::record;
use crate::record::validate::SerializabilityError;
use crate::record::value::Value;

/// Errors from signing orchestration. Messages follow the
/// `<component>.<operation> :: <reason>` convention so a caller can always
/// tell which step refused.
#[derive(Debug, thiserror::Error)]
pub enum SignError {
    /// The record is absent (null or undefined).
    #[error("signer.sign_object :: invalid obj")]
    InvalidInput,

    /// The message to sign is absent or empty.
    #[error("signer.sign_message :: invalid message")]
    InvalidMessage,

    /// The record's `wallet` field is missing or not a valid address.
    #[error("signer.sign_object :: obj.wallet is not a valid wallet address")]
    MissingSignerIdentity,

    /// The record is not serializable; carries the offending path.
    #[error("signer.sign_object :: {source}")]
    Unserializable {
        #[from]
        source: SerializabilityError,
    },

    /// Canonicalization failed.
    #[error("signer.sign_object :: {source}")]
    Canonical {
        #[from]
        source: CanonicalError,
    },

    /// The key provider refused, propagated with the calling operation.
    #[error("{operation} :: {source}")]
    Provider {
        operation: &'static str,
        source: ProviderError,
    },
}

/// Sign a record on behalf of the wallet named in its `wallet` field.
///
/// `excepted_keys` extends the default volatile-field set
/// ([`canonical::DEFAULT_EXCLUDED_KEYS`]) for this record; verification must
/// use the same exceptions or it will spuriously fail.
///
/// The signature covers the canonical message, so mutating `sig`, `hash`,
/// `createdAt` or `updatedAt` afterwards — the expected lifecycle of a
/// stored record — does not invalidate it.
pub async fn sign_object<P: KeyProvider>(
    provider: &P,
    object: &Value,
    excepted_keys: &[&str],
) -> Result<Signature, SignError> {
    if matches!(object, Value::Null | Value::Undefined) {
        return Err(SignError::InvalidInput);
    }
    match object.get("wallet") {
        Some(Value::String(wallet)) if Address::is_valid(wallet.trim()) => {}
        _ => return Err(SignError::MissingSignerIdentity),
    }

    record::validate(object)?;
    let message = canonical::canonicalize(object, excepted_keys)?;
    debug!(message_len = message.len(), "signing canonical message");

    provider
        .sign(message.as_bytes())
        .await
        .map_err(|source| SignError::Provider {
            operation: "signer.sign_object",
            source,
        })
}

/// Sign an already-canonical message. For callers that ran the
/// canonicalizer themselves; no validation or exclusion happens here.
pub async fn sign_message<P: KeyProvider>(
    provider: &P,
    message: &str,
) -> Result<Signature, SignError> {
    if message.is_empty() {
        return Err(SignError::InvalidMessage);
    }
    debug!(message_len = message.len(), "signing raw message");
    provider
        .sign(message.as_bytes())
        .await
        .map_err(|source| SignError::Provider {
            operation: "signer.sign_message",
            source,
        })
}

/// Structural signature check: `0x` + 130 hex digits (65 bytes). Does not
/// verify anything cryptographic.
pub fn is_valid_signature(value: &str) -> bool {
    Signature::is_wellformed(value)
}
