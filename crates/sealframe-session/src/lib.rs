//! Sealframe Session Caches
//!
//! Process-wide shared state for session-oriented security protocols: the
//! negotiation state cache tracks multi-round handshakes by context
//! identifier, and the nonce replay cache guards against resubmitted
//! messages. Both are bounded and time-expiring.
//!
//! ```text
//! Message processing (many in flight)
//!        │                     │
//!        ▼                     ▼
//! NegotiationStateCache   NonceCache
//!   context → state         nonce set
//!   TTL + quota             TTL + capacity
//! ```
//!
//! # Concurrency
//!
//! Both caches are `Send + Sync` and safe under concurrent calls from many
//! sessions; every check-then-act sequence (duplicate check + insert,
//! capacity check + insert, purge + insert) runs under one exclusive lock
//! per cache instance. Failure of a single message's processing never
//! corrupts cache bookkeeping.
//!
//! Protocol logic is decoupled from wall-clock time through the [`Clock`]
//! trait so expiration behavior is testable against a virtual clock.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod env;
pub mod error;
pub mod negotiation;
pub mod nonce;

pub use env::{Clock, ManualClock, SystemClock};
pub use error::SessionError;
pub use negotiation::{NegotiationState, NegotiationStateCache, SessionState, SessionToken};
pub use nonce::{InMemoryNonceCache, MAX_CACHING_SPAN, NonceCache};
