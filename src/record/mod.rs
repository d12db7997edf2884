//! # Record Module
//!
//! Everything about *untrusted* application records before they are allowed
//! anywhere near a signing key.
//!
//! ```text
//! value.rs    — The Value sum type: JSON-shaped data plus the foreign
//!               runtime values (undefined, functions, Maps, Dates, …) that
//!               arrive over dynamic boundaries and must be rejected
//! path.rs     — Slash-delimited field paths for diagnostics (/parent/child)
//! validate.rs — The serializability validator: depth-first, fail-fast,
//!               cycle-aware, reports the first violation with its path
//! ```
//!
//! ## The trust boundary
//!
//! A record enters the system as a [`Value`] exactly once — typically via
//! [`Value::from_json`] or the builder methods. From that point on the
//! pipeline is statically typed: no duck typing, no "is this thing
//! object-shaped" guesswork. The validator decides membership in the
//! signable subset; the canonicalizer and signer simply trust its verdict.

pub mod path;
pub mod validate;
pub mod value;

pub use validate::{validate, SerializabilityError};
pub use value::Value;
