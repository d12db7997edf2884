//! # The KeyProvider Capability
//!
//! The seam between the deterministic world (validation, canonicalization)
//! and the world that actually holds keys. Everything that touches private
//! key material sits behind the [`KeyProvider`] trait, and the trait is
//! async on purpose: real deployments keep keys in HSMs, enclaves, or
//! remote signing services, and a signature request is an I/O operation
//! there, not a math call. Completion order is unconstrained; nothing here
//! retries — a provider failure surfaces immediately, and retry policy
//! belongs to the caller.
//!
//! [`LocalKeyProvider`] is the in-process implementation: secp256k1
//! recoverable ECDSA (RFC 6979, so signatures are deterministic) over the
//! EIP-191 personal-sign digest. The `\x19Ethereum Signed Message:\n`
//! prefix domain-separates signed records from raw transactions — a signed
//! record can never be replayed as a transaction, because the digests can
//! never collide.
//!
//! Key bytes are never logged and never appear in `Debug` output. The
//! signing key zeroizes itself on drop (courtesy of `k256`).

use async_trait::async_trait;
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use sha3::{Digest, Keccak256};
use thiserror::Error;

use crate::keys::{Address, Signature, ADDRESS_LENGTH, SIGNATURE_LENGTH};

/// Errors surfaced by key providers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider holds no key material (e.g. a recovery-only provider
    /// was asked to sign, or an empty private key was supplied).
    #[error("invalid private key")]
    MissingKeyMaterial,

    /// Key material was supplied but is malformed. Deliberately vague about
    /// *how* — error messages must not describe key bytes.
    #[error("invalid format of private key")]
    InvalidKeyMaterial,

    /// The underlying ECDSA signing operation failed.
    #[error("signing failed: {reason}")]
    Signing { reason: String },

    /// No address could be recovered from the signature.
    #[error("address recovery failed: {reason}")]
    Recovery { reason: String },
}

/// An external capability that can sign messages and recover signer
/// addresses. Implement this to plug in hardware wallets, KMS backends, or
/// remote signing daemons.
#[async_trait]
pub trait KeyProvider: Send + Sync {
    /// Sign a raw message under the personal-sign scheme and return the
    /// 65-byte recoverable signature.
    async fn sign(&self, message: &[u8]) -> Result<Signature, ProviderError>;

    /// Recover the signer address from a message and signature — the
    /// inverse of [`sign`](KeyProvider::sign).
    async fn recover_address(
        &self,
        message: &[u8],
        signature: &Signature,
    ) -> Result<Address, ProviderError>;
}

/// The EIP-191 personal-sign digest of a message:
/// `keccak256("\x19Ethereum Signed Message:\n" ‖ len(message) ‖ message)`.
pub fn personal_digest(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(b"\x19Ethereum Signed Message:\n");
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

/// An in-process [`KeyProvider`] backed by a secp256k1 key.
pub struct LocalKeyProvider {
    key: Option<SigningKey>,
}

// No derived Debug: a derive would happily print the signing key.
impl std::fmt::Debug for LocalKeyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalKeyProvider")
            .field("address", &self.address().map(|a| a.to_checksum()))
            .finish_non_exhaustive()
    }
}

impl LocalKeyProvider {
    /// Load a provider from a hex-encoded private key. The `0x` prefix is
    /// optional. An empty string is "no key material", not a malformed key.
    pub fn from_private_key(private_key: &str) -> Result<Self, ProviderError> {
        let trimmed = private_key.trim();
        if trimmed.is_empty() {
            return Err(ProviderError::MissingKeyMaterial);
        }
        let hex_part = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(hex_part).map_err(|_| ProviderError::InvalidKeyMaterial)?;
        let key = SigningKey::from_slice(&bytes).map_err(|_| ProviderError::InvalidKeyMaterial)?;
        Ok(Self { key: Some(key) })
    }

    /// Generate a fresh random key using the OS RNG.
    pub fn generate() -> Self {
        Self {
            key: Some(SigningKey::random(&mut OsRng)),
        }
    }

    /// A provider with no key material at all. It can recover addresses
    /// (pure curve math) but every `sign` call fails — the right shape for
    /// verification-only deployments that should be physically unable to
    /// sign anything.
    pub fn recovery_only() -> Self {
        Self { key: None }
    }

    /// The wallet address of the held key, if any.
    pub fn address(&self) -> Option<Address> {
        self.key
            .as_ref()
            .map(|k| address_of(k.verifying_key()))
    }

    /// The uncompressed SEC1 public key as `0x`-prefixed hex, if a key is
    /// held.
    pub fn public_key_hex(&self) -> Option<String> {
        self.key.as_ref().map(|k| {
            let point = k.verifying_key().to_encoded_point(false);
            format!("0x{}", hex::encode(point.as_bytes()))
        })
    }
}

#[async_trait]
impl KeyProvider for LocalKeyProvider {
    async fn sign(&self, message: &[u8]) -> Result<Signature, ProviderError> {
        let key = self.key.as_ref().ok_or(ProviderError::MissingKeyMaterial)?;
        let digest = personal_digest(message);
        let (sig, recovery_id) =
            key.sign_prehash_recoverable(&digest)
                .map_err(|e| ProviderError::Signing {
                    reason: e.to_string(),
                })?;

        let mut bytes = [0u8; SIGNATURE_LENGTH];
        bytes[..64].copy_from_slice(&sig.to_bytes());
        // Legacy v encoding: 27 + recovery id, as personal_sign produces.
        bytes[64] = recovery_id.to_byte() + 27;
        Ok(Signature::from_bytes(bytes))
    }

    async fn recover_address(
        &self,
        message: &[u8],
        signature: &Signature,
    ) -> Result<Address, ProviderError> {
        let digest = personal_digest(message);
        let bytes = signature.as_bytes();

        let v = signature.recovery_byte();
        let recovery_id = RecoveryId::from_byte(if v >= 27 { v - 27 } else { v }).ok_or(
            ProviderError::Recovery {
                reason: format!("recovery id {v} out of range"),
            },
        )?;
        let sig =
            EcdsaSignature::from_slice(&bytes[..64]).map_err(|e| ProviderError::Recovery {
                reason: e.to_string(),
            })?;

        let verifying_key = VerifyingKey::recover_from_prehash(&digest, &sig, recovery_id)
            .map_err(|e| ProviderError::Recovery {
                reason: e.to_string(),
            })?;
        Ok(address_of(&verifying_key))
    }
}

/// Derive the wallet address of a public key:
/// `keccak256(uncompressed_pubkey[1..])[12..]`.
fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    // Skip the 0x04 SEC1 tag byte; hash the 64 coordinate bytes.
    let digest = Keccak256::digest(&point.as_bytes()[1..]);
    let mut bytes = [0u8; ADDRESS_LENGTH];
    bytes.copy_from_slice(&digest[32 - ADDRESS_LENGTH..]);
    Address::from_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Key/address pair cross-checked against other Ethereum tooling.
    const KNOWN_KEY: &str = "6fe42879ece8a11c0df224953ded12cd3c19d0353aaf80057bddfd4d4fc90530";
    const KNOWN_ADDRESS: &str = "0xff7f1b7dbaaf35259dda7cb42564cb7507c1d88d";

    #[test]
    fn known_key_derives_known_address() {
        let provider = LocalKeyProvider::from_private_key(KNOWN_KEY).unwrap();
        let expected: Address = KNOWN_ADDRESS.parse().unwrap();
        assert_eq!(provider.address(), Some(expected));
    }

    #[test]
    fn prefixed_and_bare_keys_are_equivalent() {
        let bare = LocalKeyProvider::from_private_key(KNOWN_KEY).unwrap();
        let prefixed =
            LocalKeyProvider::from_private_key(&format!("0x{KNOWN_KEY}")).unwrap();
        assert_eq!(bare.address(), prefixed.address());
    }

    #[test]
    fn empty_key_is_missing_not_malformed() {
        assert_eq!(
            LocalKeyProvider::from_private_key("").unwrap_err(),
            ProviderError::MissingKeyMaterial
        );
        assert_eq!(
            LocalKeyProvider::from_private_key("   ").unwrap_err(),
            ProviderError::MissingKeyMaterial
        );
    }

    #[test]
    fn garbage_key_is_malformed() {
        assert_eq!(
            LocalKeyProvider::from_private_key("0xnothex").unwrap_err(),
            ProviderError::InvalidKeyMaterial
        );
        assert_eq!(
            LocalKeyProvider::from_private_key("0x1234").unwrap_err(),
            ProviderError::InvalidKeyMaterial
        );
    }

    #[test]
    fn debug_output_never_contains_key_bytes() {
        let provider = LocalKeyProvider::from_private_key(KNOWN_KEY).unwrap();
        let rendered = format!("{provider:?}");
        assert!(!rendered.to_lowercase().contains(&KNOWN_KEY[..16]));
    }

    #[tokio::test]
    async fn sign_and_recover_round_trip() {
        let provider = LocalKeyProvider::generate();
        let address = provider.address().unwrap();

        let message = b"{\"deleted\":0,\"name\":\"Sam\"}";
        let sig = provider.sign(message).await.unwrap();
        assert!(sig.recovery_byte() == 27 || sig.recovery_byte() == 28);

        let recovered = provider.recover_address(message, &sig).await.unwrap();
        assert_eq!(recovered, address);
    }

    #[tokio::test]
    async fn recovery_accepts_raw_recovery_ids() {
        let provider = LocalKeyProvider::generate();
        let message = b"ethseal";
        let sig = provider.sign(message).await.unwrap();

        let mut raw = *sig.as_bytes();
        raw[64] -= 27;
        let normalized = Signature::from_bytes(raw);
        let recovered = provider.recover_address(message, &normalized).await.unwrap();
        assert_eq!(Some(recovered), provider.address());
    }

    #[tokio::test]
    async fn signing_is_deterministic() {
        // RFC 6979: same key, same message, same signature. Every time.
        let provider = LocalKeyProvider::from_private_key(KNOWN_KEY).unwrap();
        let a = provider.sign(b"stable").await.unwrap();
        let b = provider.sign(b"stable").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn different_message_recovers_different_address() {
        let provider = LocalKeyProvider::generate();
        let sig = provider.sign(b"original").await.unwrap();
        let recovered = provider.recover_address(b"tampered", &sig).await;
        // Either recovery fails outright or it yields some other address;
        // both mean "not this signer".
        match recovered {
            Ok(addr) => assert_ne!(Some(addr), provider.address()),
            Err(ProviderError::Recovery { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn recovery_only_provider_cannot_sign() {
        let provider = LocalKeyProvider::recovery_only();
        assert_eq!(provider.address(), None);
        assert_eq!(
            provider.sign(b"anything").await.unwrap_err(),
            ProviderError::MissingKeyMaterial
        );
    }

    #[tokio::test]
    async fn recovery_only_provider_can_recover() {
        let signer = LocalKeyProvider::generate();
        let verifier = LocalKeyProvider::recovery_only();
        let sig = signer.sign(b"record").await.unwrap();
        let recovered = verifier.recover_address(b"record", &sig).await.unwrap();
        assert_eq!(Some(recovered), signer.address());
    }

    #[test]
    fn personal_digest_is_length_prefixed() {
        // "a" and "ab" must domain-separate through the length prefix.
        assert_ne!(personal_digest(b"a"), personal_digest(b"ab"));
        assert_ne!(personal_digest(b""), personal_digest(b"\0"));
    }

    #[tokio::test]
    async fn out_of_range_recovery_id_fails() {
        let provider = LocalKeyProvider::recovery_only();
        let mut raw = [0x11u8; SIGNATURE_LENGTH];
        raw[64] = 35; // maps to recovery id 8: out of range
        let sig = Signature::from_bytes(raw);
        let err = provider.recover_address(b"x", &sig).await.unwrap_err();
        assert!(matches!(err, ProviderError::Recovery { .. }));
    }
}
