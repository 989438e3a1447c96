//! Sealframe Security Header Processing
//!
//! Receiver-side classification of an inbound message's security header.
//! The external XML layer tokenizes the header and feeds each child element
//! into an [`ElementTable`] in document order; once the decryption passes
//! complete, a [`LayoutPolicy`] engine assigns every element its structural
//! [`BindingRole`] and validates ordering constraints (timestamp position,
//! primary-signature uniqueness).
//!
//! ```text
//! XML reader (external)
//!        │  parsed elements, document order
//!        ▼
//! ElementTable ── identity resolution across decryption layers
//!        │
//!        ▼
//! LayoutPolicy engine ── binding-role assignment + ordering checks
//!        │
//!        ▼
//! Protocol layer ── protection requirements per role
//! ```
//!
//! # Security
//!
//! - An element's externally visible identifier changes as it passes through
//!   zero, one, or two layers of encryption. [`HeaderElement::matches_id`]
//!   resolves all three forms; collapsing them to a single identifier would
//!   open id-confusion attacks.
//! - Ordering violations are surfaced as errors and never silently
//!   corrected. A table that failed marking must be discarded, not reused.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod attachment;
pub mod confirmation;
pub mod element;
pub mod errors;
pub mod layout;

pub use attachment::{AttachmentCategory, AttachmentMode, categorize};
pub use confirmation::SignatureConfirmationSet;
pub use element::{
    BindingModeSet, BindingRole, ElementCategory, ElementTable, HeaderElement, TokenTrackerId,
};
pub use errors::HeaderError;
pub use layout::{ElementSource, LayoutPolicy, execute_processing_passes, mark_elements};
