//! # Verification Orchestration
//!
//! The read side: given a claimed address, a record, and a signature,
//! decide whether that address actually produced that signature over that
//! record. Checks run cheapest-first, and the outcome discipline matters
//! more than any single check:
//!
//! - A malformed *question* (bad claimed address, non-map record, empty
//!   signature) is an **error** — the caller asked something unanswerable.
//! - An *unverifiable or mismatched* signature is **`Ok(false)`** — the
//!   question was fine, the answer is no. Verification mismatches are
//!   results, not faults, and must never be confused with errors.
//!
//! Verification canonicalizes with exactly the same exclusion rules as
//! signing — same defaults, same caller exceptions. This symmetry is a
//! correctness invariant: one excluded key out of step and every honest
//! signature verifies as `false`.

use tracing::{debug, trace};

use crate::canonical::{self, CanonicalError};
use crate::keys::Address;
use crate::provider::KeyProvider;
use crate::record::value::Value;

/// Errors from verification orchestration. Only malformed inputs land here;
/// every "the signature doesn't check out" case is an `Ok(false)`.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// The claimed signer address is not syntactically valid.
    #[error("verifier.validate_object :: invalid signerWalletAddress")]
    InvalidAddress,

    /// The record is absent or not a plain map.
    #[error("verifier.validate_object :: invalid obj")]
    InvalidInput,

    /// The signature is absent or empty.
    #[error("verifier.validate_object :: invalid sig")]
    InvalidSignature,

    /// Canonicalization failed (non-signable or cyclic record).
    #[error("verifier.validate_object :: {source}")]
    Canonical {
        #[from]
        source: CanonicalError,
    },
}

/// Decide whether `claimed_address` signed `object`.
///
/// `excepted_keys` must match whatever was passed at signing time. Returns
/// `Ok(true)` iff the address recovered from the signature equals the
/// claimed address (trimmed, case-insensitive).
pub async fn validate_object<P: KeyProvider>(
    provider: &P,
    claimed_address: &str,
    object: &Value,
    signature: &str,
    excepted_keys: &[&str],
) -> Result<bool, VerifyError> {
    let claimed: Address = claimed_address
        .trim()
        .parse()
        .map_err(|_| VerifyError::InvalidAddress)?;
    if !object.is_map() {
        return Err(VerifyError::InvalidInput);
    }
    if signature.trim().is_empty() {
        return Err(VerifyError::InvalidSignature);
    }

    let message = canonical::canonicalize(object, excepted_keys)?;
    debug!(message_len = message.len(), "verifying canonical message");
    Ok(recovered_matches(provider, claimed, &message, signature).await)
}

/// Decide whether `claimed_address` signed an already-canonical message.
pub async fn validate_message<P: KeyProvider>(
    provider: &P,
    claimed_address: &str,
    message: &str,
    signature: &str,
) -> Result<bool, VerifyError> {
    let claimed: Address = claimed_address
        .trim()
        .parse()
        .map_err(|_| VerifyError::InvalidAddress)?;
    if message.is_empty() {
        return Err(VerifyError::InvalidInput);
    }
    if signature.trim().is_empty() {
        return Err(VerifyError::InvalidSignature);
    }
    Ok(recovered_matches(provider, claimed, message, signature).await)
}

// An unverifiable signature is a negative result, not a fault: bad hex, bad
// recovery id, failed curve math — all of them mean "this signer did not
// produce this signature", which is exactly what `false` says.
async fn recovered_matches<P: KeyProvider>(
    provider: &P,
    claimed: Address,
    message: &str,
    signature: &str,
) -> bool {
    let Ok(sig) = signature.trim().parse() else {
        trace!("signature is not decodable; verification is negative");
        return false;
    };
    match provider.recover_address(message.as_bytes(), &sig).await {
        Ok(recovered) => recovered == claimed,
        Err(reason) => {
            trace!(%reason, "address recovery failed; verification is negative");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::LocalKeyProvider;
    use crate::signer;

    async fn signed_record() -> (LocalKeyProvider, String, Value, String) {
        let provider = LocalKeyProvider::generate();
        let address = provider.address().unwrap().to_string();
        let object = Value::from_pairs([
            ("wallet", Value::from(address.clone())),
            ("name", Value::from("Sam")),
            ("deleted", Value::from(0i64)),
        ]);
        let sig = signer::sign_object(&provider, &object, &[])
            .await
            .unwrap()
            .to_hex();
        (provider, address, object, sig)
    }

    #[tokio::test]
    async fn honest_signature_verifies() {
        let (provider, address, object, sig) = signed_record().await;
        let ok = validate_object(&provider, &address, &object, &sig, &[])
            .await
            .unwrap();
        assert!(ok);
    }

    #[tokio::test]
    async fn claimed_address_is_case_insensitive_and_trimmed() {
        let (provider, address, object, sig) = signed_record().await;
        let sloppy = format!("  {}  ", address.to_lowercase());
        let ok = validate_object(&provider, &sloppy, &object, &sig, &[])
            .await
            .unwrap();
        assert!(ok);
    }

    #[tokio::test]
    async fn tampered_field_fails_verification() {
        let (provider, address, object, sig) = signed_record().await;
        object.insert("name", "Mallory");
        let ok = validate_object(&provider, &address, &object, &sig, &[])
            .await
            .unwrap();
        assert!(!ok);
    }

    #[tokio::test]
    async fn wrong_claimed_signer_is_false_not_error() {
        let (provider, _, object, sig) = signed_record().await;
        let other = LocalKeyProvider::generate().address().unwrap().to_string();
        let ok = validate_object(&provider, &other, &object, &sig, &[])
            .await
            .unwrap();
        assert!(!ok);
    }

    #[tokio::test]
    async fn undecodable_signature_is_false_not_error() {
        let (provider, address, object, _) = signed_record().await;
        let ok = validate_object(&provider, &address, &object, "0x1234", &[])
            .await
            .unwrap();
        assert!(!ok);
    }

    #[tokio::test]
    async fn malformed_claimed_address_is_an_error() {
        let (provider, _, object, sig) = signed_record().await;
        let err = validate_object(&provider, "not-an-address", &object, &sig, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::InvalidAddress));
    }

    #[tokio::test]
    async fn non_map_record_is_an_error() {
        let (provider, address, _, sig) = signed_record().await;
        let err = validate_object(&provider, &address, &Value::from(1i64), &sig, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::InvalidInput));
    }

    #[tokio::test]
    async fn empty_signature_is_an_error() {
        let (provider, address, object, _) = signed_record().await;
        let err = validate_object(&provider, &address, &object, "  ", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::InvalidSignature));
    }

    #[tokio::test]
    async fn validate_message_agrees_with_validate_object() {
        let (provider, address, object, sig) = signed_record().await;
        let message = canonical::canonicalize(&object, &[]).unwrap();
        assert!(validate_message(&provider, &address, &message, &sig)
            .await
            .unwrap());
        assert!(!validate_message(&provider, &address, "{}", &sig)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn excepted_keys_must_match_signing() {
        let provider = LocalKeyProvider::generate();
        let address = provider.address().unwrap().to_string();
        let object = Value::from_pairs([
            ("wallet", Value::from(address.clone())),
            ("name", Value::from("Sam")),
            ("nonce", Value::from(7i64)),
        ]);
        let sig = signer::sign_object(&provider, &object, &["nonce"])
            .await
            .unwrap()
            .to_hex();

        // Same exceptions: verifies even after the excepted field churns.
        object.insert("nonce", 8i64);
        assert!(validate_object(&provider, &address, &object, &sig, &["nonce"])
            .await
            .unwrap());

        // Different exceptions: spurious failure, exactly as documented.
        assert!(!validate_object(&provider, &address, &object, &sig, &[])
            .await
            .unwrap());
    }
}
