// Copyright (c) 2026 the ethseal authors. MIT License.
// See LICENSE for details.

//! # ethseal — Deterministic Object Signing
//!
//! ethseal lets an application sign arbitrary JSON-like records with an
//! Ethereum wallet and lets anyone holding only the claimed address verify
//! them later. The cryptography is the easy part — secp256k1 and Keccak have
//! been boring for a decade. The hard part, and the reason this crate exists,
//! is that **the same logical record must always serialize to the exact same
//! bytes**, no matter what order its fields were inserted in and no matter
//! how much churn its metadata (timestamps, cached hashes, the previous
//! signature) has seen since signing. One nondeterministic byte and every
//! downstream signature check is dead.
//!
//! ## Architecture
//!
//! The modules mirror the pipeline:
//!
//! - **record** — The `Value` sum type for untrusted records, path
//!   diagnostics, and the serializability validator that keeps cycles and
//!   unsignable runtime values away from the wire.
//! - **canonical** — Volatile-field removal, recursive key sorting, and the
//!   compact JSON encoding that everything downstream signs and hashes.
//! - **keys** — Addresses (EIP-55), 65-byte recoverable signatures, and
//!   structural validity checks.
//! - **provider** — The async `KeyProvider` seam. Bring your own HSM or
//!   remote signer; a `k256`-backed local implementation is included.
//! - **signer** / **verifier** — The orchestration layers: validate,
//!   canonicalize, delegate, compare. Fail fast, never retry.
//! - **digester** — Keccak-256 digests of the canonical form, for the
//!   `hash` field the canonicalizer deliberately ignores.
//!
//! ## Design Philosophy
//!
//! 1. Determinism is a correctness property, not an optimization.
//! 2. Every rejection carries the exact path of the offending field.
//! 3. A failed verification is a `false`, not an error. An error means the
//!    question itself was malformed.
//! 4. No retries inside the library. Retrying a signature is caller policy.

pub mod canonical;
pub mod digester;
pub mod keys;
pub mod provider;
pub mod record;
pub mod signer;
pub mod verifier;
