//! Property-based tests for the session caches

use std::time::Duration;

use proptest::prelude::*;
use sealframe_session::{
    InMemoryNonceCache, ManualClock, NegotiationState, NegotiationStateCache, NonceCache,
    SessionError,
};

const SPAN: Duration = Duration::from_secs(300);

/// Property: a nonce added once is a replay until the span elapses, then
/// addable again.
#[test]
fn prop_nonce_replay_window() {
    proptest!(|(
        nonce in prop::collection::vec(any::<u8>(), 1..64),
        early in 0u64..300,
        late in 301u64..1000,
    )| {
        let clock = ManualClock::new();
        let cache = InMemoryNonceCache::new(SPAN, 1024, clock.clone()).unwrap();

        prop_assert!(cache.try_add_nonce(&nonce));

        clock.advance(Duration::from_secs(early));
        prop_assert!(!cache.try_add_nonce(&nonce), "replay inside the window must be detected");

        let clock = ManualClock::new();
        let cache = InMemoryNonceCache::new(SPAN, 1024, clock.clone()).unwrap();
        prop_assert!(cache.try_add_nonce(&nonce));
        clock.advance(Duration::from_secs(late));
        prop_assert!(cache.try_add_nonce(&nonce), "expired nonce must be addable again");
    });
}

/// Property: check_nonce never changes subsequent outcomes.
#[test]
fn prop_check_is_pure() {
    proptest!(|(
        nonces in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..16), 1..32),
        probes in prop::collection::vec(any::<usize>(), 0..64),
    )| {
        let clock = ManualClock::new();
        let cache = InMemoryNonceCache::new(SPAN, 1024, clock).unwrap();

        let mut expected = Vec::new();
        for nonce in &nonces {
            expected.push(cache.try_add_nonce(nonce));
        }
        for probe in probes {
            let nonce = &nonces[probe % nonces.len()];
            prop_assert!(cache.check_nonce(nonce));
        }
        // Re-adding any recorded nonce is still a replay after all the checks
        for nonce in &nonces {
            prop_assert!(!cache.try_add_nonce(nonce));
        }
        // First insertion of each distinct nonce succeeded
        for (i, nonce) in nonces.iter().enumerate() {
            let first = nonces[..i].iter().all(|earlier| earlier != nonce);
            prop_assert_eq!(expected[i], first);
        }
    });
}

/// Property: distinct contexts insert independently up to capacity, and the
/// first insert past capacity fails with QuotaExceeded while earlier
/// contexts remain retrievable.
#[test]
fn prop_negotiation_quota() {
    proptest!(|(capacity in 1usize..16, extra in 1usize..8)| {
        let clock = ManualClock::new();
        let cache = NegotiationStateCache::new(SPAN, capacity, clock);

        for i in 0..capacity {
            cache.add_state(&format!("ctx-{i}"), NegotiationState::pending())?;
        }
        for i in 0..extra {
            let result =
                cache.add_state(&format!("overflow-{i}"), NegotiationState::pending());
            prop_assert_eq!(result, Err(SessionError::QuotaExceeded { capacity }));
        }
        for i in 0..capacity {
            let context = format!("ctx-{i}");
            prop_assert!(cache.get_state(&context).is_some());
        }
    });
}

/// Property: a context becomes reusable exactly when its entry expires.
#[test]
fn prop_context_reuse_after_expiry() {
    proptest!(|(context in "[a-z0-9-]{1,24}")| {
        let clock = ManualClock::new();
        let cache = NegotiationStateCache::new(SPAN, 8, clock.clone());

        cache.add_state(&context, NegotiationState::pending())?;
        prop_assert_eq!(
            cache.add_state(&context, NegotiationState::pending()),
            Err(SessionError::DuplicateContext { context: context.clone() })
        );

        clock.advance(SPAN + Duration::from_secs(1));
        prop_assert!(cache.get_state(&context).is_none());
        cache.add_state(&context, NegotiationState::pending())?;
        prop_assert!(cache.get_state(&context).is_some());
    });
}
