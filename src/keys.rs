//! # Addresses & Signatures
//!
//! Thin, strongly-typed wrappers around the two wire formats the rest of the
//! crate passes around:
//!
//! - **Address** — 20 bytes, rendered as `0x` + 40 hex with EIP-55 mixed-case
//!   checksumming. Parsing accepts all-lowercase and all-uppercase input
//!   (legacy, checksum-free forms) but rejects mixed case that fails the
//!   checksum; comparison is byte-wise, so it is case-insensitive by
//!   construction.
//! - **Signature** — 65 bytes (32-byte r ‖ 32-byte s ‖ 1-byte recovery id),
//!   rendered as lowercase `0x` + 130 hex.
//!
//! Everything here is *structural*. Whether a signature is actually valid
//! over some message is the [`verifier`](crate::verifier)'s business; whether
//! an address actually owns anything is the blockchain's.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use thiserror::Error;

/// Byte length of an address.
pub const ADDRESS_LENGTH: usize = 20;

/// Byte length of a recoverable signature (r ‖ s ‖ v).
pub const SIGNATURE_LENGTH: usize = 65;

/// Errors from parsing addresses and signatures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// The string is not a well-formed address.
    #[error("invalid address: {reason}")]
    InvalidAddress { reason: &'static str },

    /// The string is not a well-formed 65-byte signature.
    #[error("invalid signature encoding: {reason}")]
    InvalidSignatureEncoding { reason: &'static str },
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 20-byte wallet address.
///
/// # Examples
///
/// ```
/// use ethseal::keys::Address;
///
/// let addr: Address = "0xd8da6bf26964af9d7eed9e03e53415d37aa96045".parse().unwrap();
/// assert_eq!(addr.to_string(), "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// Wrap raw address bytes.
    pub fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Address(bytes)
    }

    /// The raw 20 bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Structural validity check for address strings. `true` iff the string
    /// would parse: `0x` prefix, 40 hex digits, and a correct EIP-55
    /// checksum when the hex is mixed-case.
    pub fn is_valid(value: &str) -> bool {
        Address::from_str(value).is_ok()
    }

    /// The EIP-55 checksummed rendering.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let digest = Keccak256::digest(lower.as_bytes());
        let mut out = String::with_capacity(2 + 2 * ADDRESS_LENGTH);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let byte = digest[i / 2];
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
            if nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl FromStr for Address {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_part = s.strip_prefix("0x").ok_or(KeyError::InvalidAddress {
            reason: "missing 0x prefix",
        })?;
        if hex_part.len() != 2 * ADDRESS_LENGTH {
            return Err(KeyError::InvalidAddress {
                reason: "expected 40 hex digits",
            });
        }
        let mut bytes = [0u8; ADDRESS_LENGTH];
        hex::decode_to_slice(hex_part, &mut bytes).map_err(|_| KeyError::InvalidAddress {
            reason: "not hexadecimal",
        })?;

        let addr = Address(bytes);
        let all_lower = !hex_part.chars().any(|c| c.is_ascii_uppercase());
        let all_upper = !hex_part.chars().any(|c| c.is_ascii_lowercase());
        if all_lower || all_upper {
            // Checksum-free legacy forms are accepted as-is.
            return Ok(addr);
        }
        if addr.to_checksum()[2..] != *hex_part {
            return Err(KeyError::InvalidAddress {
                reason: "EIP-55 checksum mismatch",
            });
        }
        Ok(addr)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// A 65-byte recoverable ECDSA signature: r ‖ s ‖ recovery id.
///
/// The canonical rendering is lowercase `0x`-prefixed hex, 132 characters
/// total. Parsing accepts any hex casing and normalizes on output.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LENGTH]);

impl Signature {
    /// Wrap raw signature bytes.
    pub fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Signature(bytes)
    }

    /// The raw 65 bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    /// The recovery-id byte (last of the 65).
    pub fn recovery_byte(&self) -> u8 {
        self.0[SIGNATURE_LENGTH - 1]
    }

    /// The normalized lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Structural validity check: `0x` prefix followed by exactly 130 hex
    /// digits. Says nothing about whether the signature verifies.
    pub fn is_wellformed(value: &str) -> bool {
        value
            .strip_prefix("0x")
            .map(|h| h.len() == 2 * SIGNATURE_LENGTH && h.chars().all(|c| c.is_ascii_hexdigit()))
            .unwrap_or(false)
    }
}

impl FromStr for Signature {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_part = s.strip_prefix("0x").ok_or(KeyError::InvalidSignatureEncoding {
            reason: "missing 0x prefix",
        })?;
        if hex_part.len() != 2 * SIGNATURE_LENGTH {
            return Err(KeyError::InvalidSignatureEncoding {
                reason: "expected 130 hex digits",
            });
        }
        let mut bytes = [0u8; SIGNATURE_LENGTH];
        hex::decode_to_slice(hex_part, &mut bytes).map_err(|_| {
            KeyError::InvalidSignatureEncoding {
                reason: "not hexadecimal",
            }
        })?;
        Ok(Signature(bytes))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Structural key checks
// ---------------------------------------------------------------------------

/// `true` iff the string looks like a private key: 64 hex digits, `0x`
/// prefix optional. Does not check that the scalar is in range — that is the
/// provider's job when it actually loads the key.
pub fn is_valid_private_key(value: &str) -> bool {
    let h = value.strip_prefix("0x").unwrap_or(value);
    h.len() == 64 && h.chars().all(|c| c.is_ascii_hexdigit())
}

/// `true` iff the string looks like a SEC1 public key: `0x` + 33 bytes
/// compressed (`02`/`03` tag) or 65 bytes uncompressed (`04` tag).
pub fn is_valid_public_key(value: &str) -> bool {
    let Some(h) = value.strip_prefix("0x") else {
        return false;
    };
    if !h.chars().all(|c| c.is_ascii_hexdigit()) {
        return false;
    }
    match h.len() {
        66 => h.starts_with("02") || h.starts_with("03"),
        130 => h.starts_with("04"),
        _ => false,
    }
}
