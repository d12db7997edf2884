//! # Serializability Validation
//!
//! Decides whether a [`Value`] graph is a well-formed signable record before
//! anything downstream spends a single cycle on it. The rules are strict on
//! purpose: anything that cannot survive a lossless round trip through the
//! canonical JSON encoding is rejected here, with the exact path of the
//! offending field, because a value that decodes into something different
//! from what was signed is a signature break waiting to happen.
//!
//! Dates and regular expressions deserve a note: both *are* JSON-encodable
//! as opaque values, and both are rejected anyway. After one
//! decode-reencode cycle they come back as plain strings, the canonical
//! bytes change, and the original signature is quietly dead. A plain numeric
//! timestamp carries the same information without the trap, and passes.
//!
//! Cycle detection uses container identity, not value equality — two
//! structurally identical but distinct maps are not a cycle. The visited set
//! is constructed at the top of every [`validate`] call and threaded through
//! the recursion; no state outlives a call, so concurrent validations of
//! overlapping graphs are independent. The set persists for the whole
//! traversal, which means an aliased container reached a second time is
//! reported as circular at its second reach site.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;

use super::path;
use super::value::Value;

/// The first violation found in a record, with the path that reaches it.
///
/// Each variant is one category of unsignable value. The messages mirror the
/// wire-level contract: `validator.validate :: unserializable value found:
/// <kind>, path: <path>`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerializabilityError {
    /// A field is present but holds no value (distinct from JSON null).
    #[error("validator.validate :: unserializable value found: undefined, path: {path}")]
    UndefinedValue { path: String },

    /// A function or closure.
    #[error("validator.validate :: unserializable value found: function, path: {path}")]
    UnsupportedCallable { path: String },

    /// A unique non-serializable atom.
    #[error("validator.validate :: unserializable value found: symbol, path: {path}")]
    UnsupportedSymbol { path: String },

    /// A keyed container that is not a plain string-keyed map.
    #[error("validator.validate :: unserializable value found: Map, path: {path}")]
    UnsupportedKeyedCollection { path: String },

    /// A set-like container.
    #[error("validator.validate :: unserializable value found: Set, path: {path}")]
    UnsupportedUniqueCollection { path: String },

    /// An arbitrary-precision integer outside the standard numeric type.
    #[error("validator.validate :: unserializable value found: BigInt, path: {path}")]
    UnsupportedBigInteger { path: String },

    /// A date/time object (numeric timestamps are fine).
    #[error("validator.validate :: unserializable value found: Date Object, path: {path}")]
    UnsupportedTemporal { path: String },

    /// A regular-expression object.
    #[error("validator.validate :: unserializable value found: RegExp Object, path: {path}")]
    UnsupportedPattern { path: String },

    /// A container whose identity was already visited in this call.
    #[error("validator.validate :: circular reference detected, path: {path}")]
    CircularReference { path: String },
}

impl SerializabilityError {
    /// The path at which the violation was found.
    pub fn path(&self) -> &str {
        match self {
            SerializabilityError::UndefinedValue { path }
            | SerializabilityError::UnsupportedCallable { path }
            | SerializabilityError::UnsupportedSymbol { path }
            | SerializabilityError::UnsupportedKeyedCollection { path }
            | SerializabilityError::UnsupportedUniqueCollection { path }
            | SerializabilityError::UnsupportedBigInteger { path }
            | SerializabilityError::UnsupportedTemporal { path }
            | SerializabilityError::UnsupportedPattern { path }
            | SerializabilityError::CircularReference { path } => path,
        }
    }
}

/// Validate that `value` is a well-formed signable graph.
///
/// Traverses depth-first, visiting map and list children in their natural
/// order, and returns the first violation together with its path. `Ok(())`
/// means every node is a signable leaf or a plain map/list of signable
/// values, and the record is safe to canonicalize and sign.
pub fn validate(value: &Value) -> Result<(), SerializabilityError> {
    // Fresh per call. Sharing this across calls would poison unrelated
    // validations with stale identities.
    let mut seen: HashSet<usize> = HashSet::new();
    traverse(value, path::ROOT, &mut seen)
}

fn traverse(
    value: &Value,
    at: &str,
    seen: &mut HashSet<usize>,
) -> Result<(), SerializabilityError> {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Ok(()),

        Value::Undefined => Err(SerializabilityError::UndefinedValue { path: at.into() }),
        Value::Callable => Err(SerializabilityError::UnsupportedCallable { path: at.into() }),
        Value::Symbol => Err(SerializabilityError::UnsupportedSymbol { path: at.into() }),
        Value::KeyedCollection => {
            Err(SerializabilityError::UnsupportedKeyedCollection { path: at.into() })
        }
        Value::UniqueCollection => {
            Err(SerializabilityError::UnsupportedUniqueCollection { path: at.into() })
        }
        Value::BigInteger(_) => {
            Err(SerializabilityError::UnsupportedBigInteger { path: at.into() })
        }
        Value::Temporal(_) => Err(SerializabilityError::UnsupportedTemporal { path: at.into() }),
        Value::Pattern(_) => Err(SerializabilityError::UnsupportedPattern { path: at.into() }),

        Value::List(items) => {
            if !seen.insert(Arc::as_ptr(items) as usize) {
                return Err(SerializabilityError::CircularReference { path: at.into() });
            }
            let items = items.read();
            for (index, child) in items.iter().enumerate() {
                traverse(child, &path::child(at, &index.to_string()), seen)?;
            }
            Ok(())
        }

        Value::Map(entries) => {
            if !seen.insert(Arc::as_ptr(entries) as usize) {
                return Err(SerializabilityError::CircularReference { path: at.into() });
            }
            let entries = entries.read();
            for (key, child) in entries.iter() {
                traverse(child, &path::child(at, key), seen)?;
            }
            Ok(())
        }
    }
}
