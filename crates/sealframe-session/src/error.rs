//! Error types for the session caches.
//!
//! A detected replay is NOT an error: `try_add_nonce` returns `false` and
//! the message-security layer translates that into a rejection. Errors here
//! are negotiation-fatal conditions or configuration contract violations.

use std::time::Duration;

use thiserror::Error;

/// Errors from negotiation-state and nonce-cache operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// An unexpired entry already exists for this negotiation context.
    ///
    /// Insertion never overwrites; the negotiation protocol layer decides
    /// whether to fault the exchange.
    #[error("negotiation state already cached for context {context:?}")]
    DuplicateContext {
        /// Colliding context identifier
        context: String,
    },

    /// Cache capacity exhausted after purging expired entries.
    ///
    /// Fatal to the triggering insert; unrelated live entries are never
    /// evicted to make room.
    #[error("negotiation state cache quota of {capacity} entries exceeded")]
    QuotaExceeded {
        /// Configured capacity
        capacity: usize,
    },

    /// Configured caching span exceeds the supported ceiling.
    #[error("caching span of {span:?} exceeds the supported maximum {max:?}")]
    SpanOutOfRange {
        /// Requested span
        span: Duration,
        /// Supported ceiling
        max: Duration,
    },
}
