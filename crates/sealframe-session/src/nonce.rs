//! Nonce replay cache.
//!
//! Records the nonces extracted from inbound tokens so a replayed message
//! is detected before acceptance. The contract is pluggable (in-memory,
//! persistent, distributed); [`InMemoryNonceCache`] is the process-local
//! implementation.
//!
//! The caching span should be at least twice the maximum tolerated clock
//! skew plus the replay-window size, so a nonce cannot be legitimately
//! resubmitted outside the cache's retention but inside the protocol's
//! replay-tolerance window.

#![allow(clippy::expect_used, reason = "Mutex poisoning should cause a panic")]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use crate::{env::Clock, error::SessionError};

/// Largest accepted caching span.
///
/// Caps expiration arithmetic so `now + span` cannot overflow the instant
/// representation.
pub const MAX_CACHING_SPAN: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Replay-evidence store consulted before a message is accepted.
///
/// A `false` from [`try_add_nonce`](Self::try_add_nonce) is a normal,
/// expected outcome - the message-security layer translates it into a
/// rejection, not an error.
pub trait NonceCache: Send + Sync {
    /// Record `nonce` if it is not already present and unexpired.
    ///
    /// Returns `false` when the nonce is a replay or the implementation's
    /// capacity is exhausted; `true` when newly recorded.
    fn try_add_nonce(&self, nonce: &[u8]) -> bool;

    /// Membership test without mutating state.
    fn check_nonce(&self, nonce: &[u8]) -> bool;
}

/// Process-local nonce cache with TTL expiration and a capacity bound.
///
/// Thread-safe via `Arc<Mutex<_>>`; clones share the same underlying
/// storage. Expired entries are reclaimed opportunistically when an insert
/// finds the cache full.
pub struct InMemoryNonceCache<C: Clock> {
    entries: Arc<Mutex<HashMap<Vec<u8>, C::Instant>>>,
    caching_span: Duration,
    cache_size: usize,
    clock: C,
}

impl<C: Clock> Clone for InMemoryNonceCache<C> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            caching_span: self.caching_span,
            cache_size: self.cache_size,
            clock: self.clock.clone(),
        }
    }
}

impl<C: Clock> InMemoryNonceCache<C> {
    /// Create a cache retaining nonces for `caching_span`, holding at most
    /// `cache_size` entries.
    ///
    /// # Errors
    ///
    /// [`SessionError::SpanOutOfRange`] if `caching_span` exceeds
    /// [`MAX_CACHING_SPAN`]. (`Duration` rules out negative spans at the
    /// type level.)
    pub fn new(caching_span: Duration, cache_size: usize, clock: C) -> Result<Self, SessionError> {
        if caching_span > MAX_CACHING_SPAN {
            return Err(SessionError::SpanOutOfRange {
                span: caching_span,
                max: MAX_CACHING_SPAN,
            });
        }
        Ok(Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            caching_span,
            cache_size,
            clock,
        })
    }

    /// Number of entries currently stored, expired or not.
    pub fn count(&self) -> usize {
        self.entries.lock().expect("InMemoryNonceCache mutex poisoned").len()
    }
}

impl<C: Clock> NonceCache for InMemoryNonceCache<C> {
    fn try_add_nonce(&self, nonce: &[u8]) -> bool {
        let now = self.clock.now();
        let mut entries = self.entries.lock().expect("InMemoryNonceCache mutex poisoned");

        if let Some(&expires_at) = entries.get(nonce) {
            if expires_at > now {
                // Replay
                return false;
            }
            // Expired entry for the same nonce: re-record in place
            entries.insert(nonce.to_vec(), now + self.caching_span);
            return true;
        }

        if entries.len() >= self.cache_size {
            entries.retain(|_, &mut expires_at| expires_at > now);
        }
        if entries.len() >= self.cache_size {
            tracing::warn!(
                target: "sealframe::session",
                capacity = self.cache_size,
                "nonce cache capacity exhausted"
            );
            return false;
        }

        entries.insert(nonce.to_vec(), now + self.caching_span);
        tracing::trace!(
            target: "sealframe::session",
            fill_ratio = entries.len() as f64 / self.cache_size.max(1) as f64,
            "nonce recorded"
        );
        true
    }

    fn check_nonce(&self, nonce: &[u8]) -> bool {
        let now = self.clock.now();
        let entries = self.entries.lock().expect("InMemoryNonceCache mutex poisoned");
        entries.get(nonce).is_some_and(|&expires_at| expires_at > now)
    }
}
