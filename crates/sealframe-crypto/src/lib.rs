//! Sealframe Key Derivation
//!
//! Deterministic session-key derivation from a negotiated master secret.
//! Pure functions with no side effects; the only cryptographic building
//! block is the keyed hash (HMAC-SHA1) supplied by the RustCrypto stack.
//!
//! ```text
//! Negotiated master secret
//!        │
//!        ▼
//! P_SHA1 PRF expansion (label || seed)
//!        │
//!        ▼
//! Derived key slots ── position 0: signing, position 1: encryption, ...
//! ```
//!
//! A single secret yields multiple independent derived keys for the same
//! session by selecting a slot position in the PRF output stream, so the
//! master secret is never used directly for message protection.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod derivation;
pub mod error;

pub use derivation::{MAX_KEY_BITS, MAX_POSITION, derive_key};
pub use error::DerivationError;
