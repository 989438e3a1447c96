//! Error types for security-header processing.
//!
//! Layout violations are security-relevant rejections of the inbound
//! message. Invalid raw enum values are configuration errors surfaced at the
//! conversion boundary instead of by unwinding.

use thiserror::Error;

use crate::layout::LayoutPolicy;

/// Errors from header element classification and layout inference.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    /// A Timestamp element appeared at a position the layout policy forbids.
    #[error("malformed security header: timestamp at index {index} violates {policy:?} ordering")]
    MisplacedTimestamp {
        /// Policy whose ordering constraint was broken
        policy: LayoutPolicy,
        /// Document-order index where the timestamp was found
        index: usize,
    },

    /// More than one element carries the Primary binding role.
    #[error("malformed security header: more than one primary signature")]
    DuplicatePrimarySignature,

    /// Raw layout policy value does not name a defined policy.
    #[error("undefined layout policy value: {0}")]
    InvalidPolicy(u8),

    /// Raw attachment mode value does not name a defined mode.
    #[error("undefined token attachment mode value: {0}")]
    InvalidAttachmentMode(u8),

    /// Caller indexed past the end of a table or confirmation set.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// Offending index
        index: usize,
        /// Length of the indexed collection
        len: usize,
    },
}

impl HeaderError {
    /// Returns true if this error rejects the message itself rather than
    /// flagging a caller/configuration bug.
    ///
    /// Layout violations are adversarial-input rejections; the remaining
    /// variants indicate a programming error in the calling protocol layer.
    pub fn is_layout_violation(&self) -> bool {
        matches!(self, Self::MisplacedTimestamp { .. } | Self::DuplicatePrimarySignature)
    }
}
