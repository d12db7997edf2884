//! # Canonical Message Encoding
//!
//! Turns a validated record into the one byte sequence that gets signed,
//! hashed, and verified. Two records that differ only in field insertion
//! order, or only in the volatile metadata fields, must produce identical
//! bytes — that is the entire contract, and everything here serves it:
//!
//! 1. The effective excluded-key set (the volatile defaults plus any caller
//!    extras) is removed from the **top level only**. Nested objects are not
//!    filtered; a nested `sig` field is application data, not metadata.
//! 2. Every map's keys are reordered ascending by code point, at **every**
//!    nesting depth. Shallow sorting would leave nested objects
//!    order-dependent, which is a determinism hole, not a policy choice.
//! 3. The result is serialized as compact JSON: no insignificant whitespace,
//!    standard literal grammar, list order untouched.
//!
//! The encoder assumes its input already passed
//! [`record::validate`](crate::record::validate) — but "assumes" never means
//! "panics": a cycle or foreign value that sneaks in comes back as a typed
//! error, not a blown stack.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;

use crate::record::value::Value;

/// Top-level keys excluded from every canonical message. These are the
/// fields expected to change between signing and verification: the previous
/// signature, the cached digest, and bookkeeping timestamps.
pub const DEFAULT_EXCLUDED_KEYS: &[&str] = &["sig", "hash", "createdAt", "updatedAt"];

/// Errors from canonical encoding and decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CanonicalError {
    /// The top-level value is absent (null or undefined).
    #[error("canonical.canonicalize :: invalid obj")]
    InvalidInput,

    /// A non-signable value reached the encoder; the caller skipped
    /// validation.
    #[error("canonical.canonicalize :: unserializable value found: {kind}")]
    Unsupported { kind: &'static str },

    /// A container reached the encoder twice; the caller skipped validation.
    #[error("canonical.canonicalize :: circular reference detected")]
    CircularReference,

    /// The JSON writer failed (effectively unreachable for tree input).
    #[error("canonical.canonicalize :: {reason}")]
    Encode { reason: String },

    /// `decanonicalize` was handed a string that does not parse as JSON.
    #[error("canonical.decanonicalize :: malformed message: {reason}")]
    MalformedMessage { reason: String },
}

/// Produce the canonical message for a record.
///
/// `extra_excluded` is unioned with [`DEFAULT_EXCLUDED_KEYS`] (duplicates
/// collapse) and applied only to the top-level map. Canonicalization is
/// idempotent: decoding a canonical message and re-encoding it yields the
/// same string, as long as no volatile fields were reintroduced.
///
/// # Examples
///
/// ```
/// use ethseal::canonical::canonicalize;
/// use ethseal::record::Value;
///
/// let a = Value::from_pairs([("name", Value::from("Sam")), ("deleted", Value::from(0i64))]);
/// let b = Value::from_pairs([("deleted", Value::from(0i64)), ("name", Value::from("Sam"))]);
/// assert_eq!(canonicalize(&a, &[]).unwrap(), canonicalize(&b, &[]).unwrap());
/// assert_eq!(canonicalize(&a, &[]).unwrap(), r#"{"deleted":0,"name":"Sam"}"#);
/// ```
pub fn canonicalize(value: &Value, extra_excluded: &[&str]) -> Result<String, CanonicalError> {
    if matches!(value, Value::Null | Value::Undefined) {
        return Err(CanonicalError::InvalidInput);
    }

    let excluded: HashSet<&str> = DEFAULT_EXCLUDED_KEYS
        .iter()
        .copied()
        .chain(extra_excluded.iter().copied())
        .collect();

    let mut seen: HashSet<usize> = HashSet::new();
    let json = match value {
        Value::Map(entries) => {
            seen.insert(Arc::as_ptr(entries) as usize);
            let entries = entries.read();
            let kept: Vec<(String, Value)> = entries
                .iter()
                .filter(|(key, _)| !excluded.contains(key.as_str()))
                .cloned()
                .collect();
            drop(entries);
            sorted_object(kept, &mut seen)?
        }
        other => to_sorted_json(other, &mut seen)?,
    };

    serde_json::to_string(&json).map_err(|e| CanonicalError::Encode {
        reason: e.to_string(),
    })
}

/// Parse a canonical message back into a [`Value`].
///
/// Provided for symmetry and debugging; the signing hot path never needs it.
/// Fields removed during canonicalization are gone — decoding cannot restore
/// them.
pub fn decanonicalize(message: &str) -> Result<Value, CanonicalError> {
    let json: serde_json::Value =
        serde_json::from_str(message).map_err(|e| CanonicalError::MalformedMessage {
            reason: e.to_string(),
        })?;
    Ok(Value::from_json(&json))
}

// Recursive conversion to serde_json::Value with keys inserted in sorted
// order. serde_json's map keeps whatever order it is given (BTreeMap sorts,
// preserve_order keeps insertion order) — pre-sorting makes the output
// identical under either feature.
fn to_sorted_json(
    value: &Value,
    seen: &mut HashSet<usize>,
) -> Result<serde_json::Value, CanonicalError> {
    match value {
        Value::Null => Ok(serde_json::Value::Null),
        Value::Bool(b) => Ok(serde_json::Value::Bool(*b)),
        Value::Number(n) => Ok(serde_json::Value::Number(n.clone())),
        Value::String(s) => Ok(serde_json::Value::String(s.clone())),

        Value::List(items) => {
            if !seen.insert(Arc::as_ptr(items) as usize) {
                return Err(CanonicalError::CircularReference);
            }
            let items = items.read();
            let mut out = Vec::with_capacity(items.len());
            for child in items.iter() {
                out.push(to_sorted_json(child, seen)?);
            }
            Ok(serde_json::Value::Array(out))
        }

        Value::Map(entries) => {
            if !seen.insert(Arc::as_ptr(entries) as usize) {
                return Err(CanonicalError::CircularReference);
            }
            let pairs = entries.read().clone();
            sorted_object(pairs, seen)
        }

        foreign => Err(CanonicalError::Unsupported {
            kind: foreign.kind(),
        }),
    }
}

fn sorted_object(
    mut pairs: Vec<(String, Value)>,
    seen: &mut HashSet<usize>,
) -> Result<serde_json::Value, CanonicalError> {
    // Ascending code-point order; str's Ord is exactly that for UTF-8.
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    let mut out = serde_json::Map::with_capacity(pairs.len());
    for (key, child) in pairs {
        out.insert(key, to_sorted_json(&child, seen)?);
    }
    Ok(serde_json::Value::Object(out))
}
