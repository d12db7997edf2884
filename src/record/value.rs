//! # The Value Sum Type
//!
//! [`Value`] is the single representation every record must pass through
//! before it can be validated, canonicalized, hashed, or signed. It covers
//! the JSON-shaped subset that *can* be signed — null, booleans, finite
//! numbers, strings, lists, string-keyed maps — plus explicit variants for
//! the foreign runtime values that arrive over dynamic boundaries (an FFI
//! bridge, a scripting host, a loosely-typed RPC layer) and must be
//! *rejected*, with a useful error, rather than silently mangled.
//!
//! ## Why shared containers?
//!
//! Lists and maps are `Arc<RwLock<…>>`. That buys three things:
//!
//! - Records can alias and even cycle, exactly like the object graphs a
//!   dynamic payload can describe. The validator detects cycles by container
//!   identity (`Arc::as_ptr`), which is meaningless without sharing.
//! - `Value` is `Send + Sync`, so concurrent verification of overlapping
//!   graphs needs no external locking.
//! - Cloning a `Value` is cheap and shares structure, which is how tests
//!   (and attackers) build the self-referential records the validator must
//!   catch.
//!
//! ## Why `serde_json::Number`?
//!
//! Because it cannot hold NaN or infinity. "Finite number" is not a runtime
//! check here — it is enforced at construction ([`TryFrom<f64>`] fails on
//! non-finite input), so the rest of the pipeline never sees one.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Number;
use thiserror::Error;

/// A shared, mutable list of values.
pub type SharedList = Arc<RwLock<Vec<Value>>>;

/// A shared, mutable string-keyed map. Entries keep their insertion order;
/// keys are unique (inserting an existing key replaces its value).
pub type SharedMap = Arc<RwLock<Vec<(String, Value)>>>;

/// Returned by [`Value::try_from`] when a float is NaN or infinite.
#[derive(Debug, Error)]
#[error("non-finite number cannot enter a signable record")]
pub struct NonFiniteNumber;

/// A dynamically-shaped record value at the trust boundary.
///
/// The first six variants form the signable subset. The remaining variants
/// model values that are representable in a dynamic runtime but not in
/// canonical JSON — they exist so the validator can name exactly what it
/// rejected and where.
#[derive(Clone, Debug)]
pub enum Value {
    /// JSON `null`.
    Null,
    /// JSON boolean.
    Bool(bool),
    /// A finite JSON number (integer or float).
    Number(Number),
    /// A UTF-8 string.
    String(String),
    /// An ordered list. Element order is significant and preserved.
    List(SharedList),
    /// A string-keyed map with unique, case-sensitive keys.
    Map(SharedMap),

    /// A field that is present but holds no value — distinct from `Null`.
    Undefined,
    /// A function or closure.
    Callable,
    /// A unique, non-serializable atom ("symbol").
    Symbol,
    /// A keyed container that is not a plain string-keyed map.
    KeyedCollection,
    /// A set-like container of unique elements.
    UniqueCollection,
    /// An arbitrary-precision integer, carried as its decimal digits.
    BigInteger(String),
    /// A date/time *object* (epoch milliseconds). Rejected by the validator:
    /// it round-trips through JSON as a string or number and silently stops
    /// being a date, which breaks any signature computed after a
    /// decode-reencode cycle. Plain numeric timestamps are fine.
    Temporal(i64),
    /// A regular-expression object, carried as its source text. Rejected for
    /// the same round-trip reason as `Temporal`.
    Pattern(String),
}

impl Value {
    /// Create an empty map.
    pub fn object() -> Self {
        Value::Map(Arc::new(RwLock::new(Vec::new())))
    }

    /// Create a map from key/value pairs. Later duplicates replace earlier
    /// ones, mirroring object-literal semantics.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let obj = Value::object();
        for (k, v) in pairs {
            obj.insert(k, v);
        }
        obj
    }

    /// Create a list from values.
    pub fn list<V, I>(items: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        Value::List(Arc::new(RwLock::new(
            items.into_iter().map(Into::into).collect(),
        )))
    }

    /// Insert (or replace) a key in a map. Returns `false` if `self` is not
    /// a map, in which case nothing happens.
    pub fn insert<K: Into<String>, V: Into<Value>>(&self, key: K, value: V) -> bool {
        let Value::Map(entries) = self else {
            return false;
        };
        let key = key.into();
        let value = value.into();
        let mut entries = entries.write();
        if let Some(slot) = entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            entries.push((key, value));
        }
        true
    }

    /// Remove a key from a map. Returns `true` if the key was present.
    pub fn remove(&self, key: &str) -> bool {
        let Value::Map(entries) = self else {
            return false;
        };
        let mut entries = entries.write();
        match entries.iter().position(|(k, _)| k == key) {
            Some(idx) => {
                entries.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Look up a key in a map. Returns a (structure-sharing) clone.
    pub fn get(&self, key: &str) -> Option<Value> {
        let Value::Map(entries) = self else {
            return None;
        };
        let entries = entries.read();
        entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    /// Push a value onto a list. Returns `false` if `self` is not a list.
    pub fn push<V: Into<Value>>(&self, value: V) -> bool {
        let Value::List(items) = self else {
            return false;
        };
        items.write().push(value.into());
        true
    }

    /// `true` for the map variant.
    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    /// `true` for JSON null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// A short name for the variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "object",
            Value::Undefined => "undefined",
            Value::Callable => "function",
            Value::Symbol => "symbol",
            Value::KeyedCollection => "Map",
            Value::UniqueCollection => "Set",
            Value::BigInteger(_) => "BigInt",
            Value::Temporal(_) => "Date Object",
            Value::Pattern(_) => "RegExp Object",
        }
    }

    /// Convert parsed JSON into a `Value`. Total: every JSON document is a
    /// well-formed signable record, so this is the usual trust-boundary
    /// entry point for data arriving off the wire.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.clone()),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::list(items.iter().map(Value::from_json))
            }
            serde_json::Value::Object(entries) => Value::from_pairs(
                entries.iter().map(|(k, v)| (k.clone(), Value::from_json(v))),
            ),
        }
    }
}

// Structural equality. Maps compare as key/value sets (insertion order is a
// canonicalization concern, not an identity one); lists compare in order.
// Only call this on acyclic values — equality of cyclic graphs is not a
// question this crate needs to answer.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Undefined, Value::Undefined) => true,
            (Value::Callable, Value::Callable) => true,
            (Value::Symbol, Value::Symbol) => true,
            (Value::KeyedCollection, Value::KeyedCollection) => true,
            (Value::UniqueCollection, Value::UniqueCollection) => true,
            (Value::BigInteger(a), Value::BigInteger(b)) => a == b,
            (Value::Temporal(a), Value::Temporal(b)) => a == b,
            (Value::Pattern(a), Value::Pattern(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                let (a, b) = (a.read(), b.read());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
            }
            (Value::Map(a), Value::Map(b)) => {
                let (a, b) = (a.read(), b.read());
                a.len() == b.len()
                    && a.iter().all(|(k, v)| {
                        b.iter().any(|(bk, bv)| bk == k && bv == v)
                    })
            }
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(Number::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Number::from(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(Number::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}

impl TryFrom<f64> for Value {
    type Error = NonFiniteNumber;

    fn try_from(n: f64) -> Result<Self, Self::Error> {
        Number::from_f64(n).map(Value::Number).ok_or(NonFiniteNumber)
    }
}
