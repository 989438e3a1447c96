//! P_SHA1 pseudo-random-function key expansion.
//!
//! TLS-PRF style construction over HMAC-SHA1:
//!
//! ```text
//! S        = label || seed
//! A(1)     = HMAC(secret, S)
//! A(i)     = HMAC(secret, A(i-1))
//! block(i) = HMAC(secret, A(i) || S)
//! stream   = block(1) || block(2) || ...
//! ```
//!
//! A derived key of `n` bytes at slot `position` is `stream[position * n ..
//! (position + 1) * n]`: later slots continue the stream instead of
//! recomputing it, so one secret yields independent signing and encryption
//! keys for the same session.
//!
//! # Security
//!
//! - Deterministic: identical inputs always produce identical output
//! - Slot isolation: distinct positions yield non-overlapping stream ranges
//! - Intermediate PRF state is zeroized before returning

use hmac::{Hmac, Mac};
use sha1::Sha1;
use zeroize::Zeroize;

use crate::error::DerivationError;

type HmacSha1 = Hmac<Sha1>;

const SHA1_OUTPUT_SIZE: usize = 20;

/// Largest derivable key, in bits.
pub const MAX_KEY_BITS: usize = 4096;

/// Largest supported key slot.
///
/// Bounds the PRF stream length a caller can demand; well above the
/// handful of slots (signing, encryption, and their response-direction
/// counterparts) a session ever uses.
pub const MAX_POSITION: u32 = 64;

/// Derive `output_bits / 8` bytes of key material for slot `position`.
///
/// # Errors
///
/// - [`DerivationError::InvalidKeyLength`] if `output_bits` is zero, not a
///   multiple of 8, or larger than [`MAX_KEY_BITS`];
/// - [`DerivationError::PositionOutOfRange`] if `position` exceeds
///   [`MAX_POSITION`].
pub fn derive_key(
    secret: &[u8],
    label: &[u8],
    seed: &[u8],
    output_bits: usize,
    position: u32,
) -> Result<Vec<u8>, DerivationError> {
    if output_bits == 0 || output_bits % 8 != 0 || output_bits > MAX_KEY_BITS {
        return Err(DerivationError::InvalidKeyLength { bits: output_bits, max: MAX_KEY_BITS });
    }
    if position > MAX_POSITION {
        return Err(DerivationError::PositionOutOfRange { position, max: MAX_POSITION });
    }

    let length = output_bits / 8;
    let offset = position as usize * length;
    let total = offset + length;

    let mut stream_seed = Vec::with_capacity(label.len() + seed.len());
    stream_seed.extend_from_slice(label);
    stream_seed.extend_from_slice(seed);

    let mut a = keyed_hash(secret, &[&stream_seed]);
    let mut stream = Vec::with_capacity(total.next_multiple_of(SHA1_OUTPUT_SIZE));
    while stream.len() < total {
        let block = keyed_hash(secret, &[&a, &stream_seed]);
        stream.extend_from_slice(&block);
        let next = keyed_hash(secret, &[&a]);
        a.zeroize();
        a = next;
    }

    let key = stream[offset..total].to_vec();
    stream.zeroize();
    stream_seed.zeroize();
    a.zeroize();
    Ok(key)
}

fn keyed_hash(secret: &[u8], parts: &[&[u8]]) -> [u8; SHA1_OUTPUT_SIZE] {
    let Ok(mut mac) = HmacSha1::new_from_slice(secret) else {
        unreachable!("HMAC accepts keys of any length");
    };
    for part in parts {
        mac.update(part);
    }
    mac.finalize().into_bytes().into()
}
