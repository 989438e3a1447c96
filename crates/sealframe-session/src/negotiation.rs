//! Bounded, time-expiring cache of per-context negotiation state.
//!
//! A session-oriented protocol stores its handshake state here between
//! round trips; after insertion the protocol layer holds only the context
//! string, never the state object. Entries expire a fixed span after
//! insertion and the cache disposes evicted state so derived session tokens
//! are not leaked.
//!
//! Capacity overflow is a hard failure for the triggering insert - silently
//! dropping negotiation state would strand a client mid-handshake, and
//! silently evicting an unrelated live entry would strand a different one.

#![allow(clippy::expect_used, reason = "Mutex poisoning should cause a panic")]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use zeroize::Zeroize;

use crate::{env::Clock, error::SessionError};

/// State an implementation stores per negotiation context.
///
/// The cache invokes [`dispose`](Self::dispose) exactly once for every entry
/// it gives up, whether by explicit removal or expiration purge.
pub trait SessionState: Send + Sync + 'static {
    /// Release resources held by this state (derived session tokens,
    /// handles). Called by the cache on eviction.
    fn dispose(&self);
}

/// Opaque session token bytes produced by a completed negotiation.
///
/// Zeroized on drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    bytes: Vec<u8>,
}

impl SessionToken {
    /// Wrap raw token bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Token bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Drop for SessionToken {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

/// Per-context session-establishment record.
///
/// The session token is present only once negotiation completes; disposal
/// clears it.
#[derive(Debug, Default)]
pub struct NegotiationState {
    token: Mutex<Option<SessionToken>>,
}

impl NegotiationState {
    /// State for a negotiation still in progress.
    pub fn pending() -> Self {
        Self::default()
    }

    /// State for a completed negotiation holding its session token.
    pub fn completed(token: SessionToken) -> Self {
        Self { token: Mutex::new(Some(token)) }
    }

    /// Whether negotiation has completed.
    pub fn is_complete(&self) -> bool {
        self.token.lock().expect("NegotiationState mutex poisoned").is_some()
    }

    /// Take ownership of the session token, leaving the state pending.
    pub fn take_token(&self) -> Option<SessionToken> {
        self.token.lock().expect("NegotiationState mutex poisoned").take()
    }
}

impl SessionState for NegotiationState {
    fn dispose(&self) {
        // SessionToken zeroizes on drop
        self.token.lock().expect("NegotiationState mutex poisoned").take();
    }
}

struct CacheEntry<S, I> {
    state: Arc<S>,
    expires_at: I,
}

/// Bounded map from negotiation context identifier to session state.
///
/// Thread-safe via `Arc<Mutex<_>>`; clones share the same underlying
/// storage. Entries expire `caching_span` after insertion; a background
/// purge driven by [`run_purge_loop`](Self::run_purge_loop) reclaims them,
/// and insertion purges opportunistically before reporting quota exhaustion.
pub struct NegotiationStateCache<S, C>
where
    S: SessionState,
    C: Clock,
{
    inner: Arc<Mutex<HashMap<String, CacheEntry<S, C::Instant>>>>,
    caching_span: Duration,
    capacity: usize,
    clock: C,
}

impl<S, C> Clone for NegotiationStateCache<S, C>
where
    S: SessionState,
    C: Clock,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            caching_span: self.caching_span,
            capacity: self.capacity,
            clock: self.clock.clone(),
        }
    }
}

impl<S, C> NegotiationStateCache<S, C>
where
    S: SessionState,
    C: Clock,
{
    /// Create a cache whose entries live for `caching_span` and whose total
    /// live entries never exceed `capacity`.
    pub fn new(caching_span: Duration, capacity: usize, clock: C) -> Self {
        Self { inner: Arc::new(Mutex::new(HashMap::new())), caching_span, capacity, clock }
    }

    /// Insert state for `context`.
    ///
    /// # Errors
    ///
    /// - [`SessionError::DuplicateContext`] if an unexpired entry already
    ///   exists for `context`;
    /// - [`SessionError::QuotaExceeded`] if the cache is full after purging
    ///   expired entries. Unrelated live entries are never evicted to make
    ///   room.
    pub fn add_state(&self, context: &str, state: S) -> Result<(), SessionError> {
        let now = self.clock.now();
        let mut disposed: Vec<Arc<S>> = Vec::new();
        let result = {
            let mut entries = self.inner.lock().expect("NegotiationStateCache mutex poisoned");

            if let Some(entry) = entries.get(context) {
                if entry.expires_at > now {
                    return Err(SessionError::DuplicateContext { context: context.to_owned() });
                }
                // Expired entry under the same context: replace it
            }
            if let Some(entry) = entries.remove(context) {
                disposed.push(entry.state);
            }

            if entries.len() >= self.capacity {
                disposed.extend(take_expired(&mut entries, now));
            }

            if entries.len() >= self.capacity {
                tracing::warn!(
                    target: "sealframe::session",
                    capacity = self.capacity,
                    "negotiation state cache quota exceeded"
                );
                Err(SessionError::QuotaExceeded { capacity: self.capacity })
            } else {
                entries.insert(
                    context.to_owned(),
                    CacheEntry { state: Arc::new(state), expires_at: now + self.caching_span },
                );
                tracing::debug!(
                    target: "sealframe::session",
                    fill_ratio = entries.len() as f64 / self.capacity.max(1) as f64,
                    "negotiation state cached"
                );
                Ok(())
            }
        };

        // Dispose outside the lock so lookups are not blocked on hooks
        for state in disposed {
            state.dispose();
        }
        result
    }

    /// State for `context`, if present and unexpired.
    pub fn get_state(&self, context: &str) -> Option<Arc<S>> {
        let now = self.clock.now();
        let entries = self.inner.lock().expect("NegotiationStateCache mutex poisoned");
        entries
            .get(context)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| Arc::clone(&entry.state))
    }

    /// Remove and dispose the state for `context`.
    ///
    /// Idempotent: removing an absent context is not an error.
    pub fn remove_state(&self, context: &str) {
        let removed = {
            let mut entries = self.inner.lock().expect("NegotiationStateCache mutex poisoned");
            entries.remove(context)
        };
        if let Some(entry) = removed {
            entry.state.dispose();
        }
    }

    /// Remove and dispose every expired entry.
    ///
    /// The lock is held only while already-expired entries are unlinked;
    /// disposal hooks run after it is released.
    pub fn purge_expired(&self) {
        let now = self.clock.now();
        let expired = {
            let mut entries = self.inner.lock().expect("NegotiationStateCache mutex poisoned");
            take_expired(&mut entries, now)
        };
        for state in expired {
            state.dispose();
        }
    }

    /// Interval between background purges: one quarter of the caching span.
    pub fn purge_interval(&self) -> Duration {
        self.caching_span / 4
    }

    /// Background purge driver: purges expired entries every
    /// [`purge_interval`](Self::purge_interval), forever. Spawn on the host
    /// runtime.
    pub async fn run_purge_loop(&self) {
        let interval = self.purge_interval();
        loop {
            self.clock.sleep(interval).await;
            self.purge_expired();
        }
    }

    /// Number of entries currently stored, expired or not.
    pub fn count(&self) -> usize {
        self.inner.lock().expect("NegotiationStateCache mutex poisoned").len()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

fn take_expired<S, I: Copy + Ord>(
    entries: &mut HashMap<String, CacheEntry<S, I>>,
    now: I,
) -> Vec<Arc<S>> {
    let expired_keys: Vec<String> = entries
        .iter()
        .filter(|(_, entry)| entry.expires_at <= now)
        .map(|(context, _)| context.clone())
        .collect();
    expired_keys
        .into_iter()
        .filter_map(|context| entries.remove(&context))
        .map(|entry| entry.state)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::env::ManualClock;

    const SPAN: Duration = Duration::from_secs(300);

    #[derive(Default)]
    struct CountingState {
        disposals: Arc<AtomicUsize>,
    }

    impl SessionState for CountingState {
        fn dispose(&self) {
            self.disposals.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn cache(capacity: usize) -> (NegotiationStateCache<CountingState, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        (NegotiationStateCache::new(SPAN, capacity, clock.clone()), clock)
    }

    #[test]
    fn duplicate_context_is_rejected_until_expiry() {
        let (cache, clock) = cache(8);

        cache.add_state("ctx1", CountingState::default()).unwrap();
        assert_eq!(
            cache.add_state("ctx1", CountingState::default()),
            Err(SessionError::DuplicateContext { context: "ctx1".to_string() })
        );

        clock.advance(SPAN + Duration::from_secs(1));
        cache.add_state("ctx1", CountingState::default()).unwrap();
    }

    #[test]
    fn quota_rejects_insert_without_evicting_live_entries() {
        let (cache, _clock) = cache(2);

        cache.add_state("ctx1", CountingState::default()).unwrap();
        cache.add_state("ctx2", CountingState::default()).unwrap();
        assert_eq!(
            cache.add_state("ctx3", CountingState::default()),
            Err(SessionError::QuotaExceeded { capacity: 2 })
        );

        assert!(cache.get_state("ctx1").is_some());
        assert!(cache.get_state("ctx2").is_some());
        assert!(cache.get_state("ctx3").is_none());
    }

    #[test]
    fn expired_entries_make_room_before_quota_failure() {
        let (cache, clock) = cache(1);

        let disposals = Arc::new(AtomicUsize::new(0));
        cache
            .add_state("ctx1", CountingState { disposals: Arc::clone(&disposals) })
            .unwrap();

        clock.advance(SPAN + Duration::from_secs(1));
        cache.add_state("ctx2", CountingState::default()).unwrap();

        assert_eq!(disposals.load(Ordering::SeqCst), 1, "evicted state must be disposed");
        assert!(cache.get_state("ctx2").is_some());
    }

    #[test]
    fn expired_entries_are_invisible_to_lookups() {
        let (cache, clock) = cache(8);
        cache.add_state("ctx1", CountingState::default()).unwrap();

        clock.advance(SPAN + Duration::from_secs(1));
        assert!(cache.get_state("ctx1").is_none());
    }

    #[test]
    fn remove_is_idempotent_and_disposes() {
        let (cache, _clock) = cache(8);
        let disposals = Arc::new(AtomicUsize::new(0));
        cache
            .add_state("ctx1", CountingState { disposals: Arc::clone(&disposals) })
            .unwrap();

        cache.remove_state("ctx1");
        cache.remove_state("ctx1");
        cache.remove_state("never-inserted");

        assert_eq!(disposals.load(Ordering::SeqCst), 1);
        assert!(cache.get_state("ctx1").is_none());
    }

    #[test]
    fn purge_disposes_only_expired_entries() {
        let (cache, clock) = cache(8);
        let old = Arc::new(AtomicUsize::new(0));
        let fresh = Arc::new(AtomicUsize::new(0));

        cache.add_state("old", CountingState { disposals: Arc::clone(&old) }).unwrap();
        clock.advance(SPAN + Duration::from_secs(1));
        cache.add_state("fresh", CountingState { disposals: Arc::clone(&fresh) }).unwrap();

        cache.purge_expired();

        assert_eq!(old.load(Ordering::SeqCst), 1);
        assert_eq!(fresh.load(Ordering::SeqCst), 0);
        assert_eq!(cache.count(), 1);
    }

    #[test]
    fn clone_shares_state() {
        let (cache, _clock) = cache(8);
        let shared = cache.clone();

        cache.add_state("ctx1", CountingState::default()).unwrap();
        assert!(shared.get_state("ctx1").is_some());
    }

    #[test]
    fn negotiation_state_lifecycle() {
        let pending = NegotiationState::pending();
        assert!(!pending.is_complete());
        assert!(pending.take_token().is_none());

        let completed = NegotiationState::completed(SessionToken::new(vec![1, 2, 3]));
        assert!(completed.is_complete());

        completed.dispose();
        assert!(!completed.is_complete());
        assert!(completed.take_token().is_none());
    }

    #[test]
    fn purge_interval_is_quarter_span() {
        let (cache, _clock) = cache(8);
        assert_eq!(cache.purge_interval(), SPAN / 4);
    }
}
