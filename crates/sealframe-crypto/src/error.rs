//! Error types for key derivation.

use thiserror::Error;

/// Errors from derived-key generation.
///
/// All variants are caller contract violations: derivation itself is
/// deterministic and cannot fail once its inputs validate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DerivationError {
    /// Requested key length is zero, not byte-aligned, or above the ceiling.
    #[error(
        "derived key length of {bits} bits must be a positive multiple of 8 no larger than {max}"
    )]
    InvalidKeyLength {
        /// Requested length in bits
        bits: usize,
        /// Supported ceiling in bits
        max: usize,
    },

    /// Requested key slot is above the ceiling.
    #[error("derived key position {position} exceeds the supported maximum {max}")]
    PositionOutOfRange {
        /// Requested slot
        position: u32,
        /// Supported ceiling
        max: u32,
    },
}
