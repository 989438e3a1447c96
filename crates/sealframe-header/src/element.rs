//! Security-header element table with identity resolution across decryption.
//!
//! One [`HeaderElement`] per security-header child, stored in document order
//! by [`ElementTable`]. Elements are mutated in place as processing passes
//! proceed: decryption replaces the payload (preserving the identifier the
//! element carried in encrypted form), and the layout engine assigns binding
//! roles. The table lives for a single inbound message and is discarded once
//! role assignment and policy validation complete.

use bitflags::bitflags;
use bytes::Bytes;

use crate::errors::HeaderError;

/// Structural category of a security-header child element.
///
/// Determined by the external XML reader from the element's qualified name
/// before the element enters the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementCategory {
    /// An XML signature over message parts or supporting tokens
    Signature,
    /// An encrypted content block
    EncryptedData,
    /// A wrapped symmetric key
    EncryptedKey,
    /// A confirmation echoing a request signature value
    SignatureConfirmation,
    /// A list of references to encrypted elements
    ReferenceList,
    /// A reference to a token defined elsewhere
    TokenReference,
    /// The header timestamp
    Timestamp,
    /// A security token (credential material)
    Token,
}

/// Structural function assigned to an element within the header.
///
/// Assigned exclusively by the layout inference engine; every element starts
/// as [`BindingRole::Unknown`] and an engine never reassigns an element that
/// is already marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BindingRole {
    /// Not yet assigned
    #[default]
    Unknown,
    /// The single signature binding the message body
    Primary,
    /// A signature endorsing the primary signature or supporting tokens
    Endorsing,
    /// A token covered by the primary signature
    Signed,
    /// A token that is both signed and endorsing
    SignedEndorsing,
    /// A token that must additionally be encrypted
    Basic,
}

bitflags! {
    /// Set of assignable binding roles.
    ///
    /// Used as a declared expectation set for supporting-token
    /// specifications: dispatch checks an element's assigned role against the
    /// set the binding configuration allows.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BindingModeSet: u8 {
        /// Primary signature
        const PRIMARY = 1 << 0;
        /// Endorsing signature
        const ENDORSING = 1 << 1;
        /// Signed supporting token
        const SIGNED = 1 << 2;
        /// Signed and endorsing supporting token
        const SIGNED_ENDORSING = 1 << 3;
        /// Basic (signed and encrypted) supporting token
        const BASIC = 1 << 4;
    }
}

impl BindingModeSet {
    /// Whether this set admits the given assigned role.
    ///
    /// [`BindingRole::Unknown`] is admitted by no set.
    pub fn contains_role(self, role: BindingRole) -> bool {
        match role {
            BindingRole::Unknown => false,
            BindingRole::Primary => self.contains(Self::PRIMARY),
            BindingRole::Endorsing => self.contains(Self::ENDORSING),
            BindingRole::Signed => self.contains(Self::SIGNED),
            BindingRole::SignedEndorsing => self.contains(Self::SIGNED_ENDORSING),
            BindingRole::Basic => self.contains(Self::BASIC),
        }
    }
}

/// Opaque handle associating an element with the protocol layer's token
/// tracking record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenTrackerId(pub u32);

/// One security-header child element as parsed.
///
/// # Invariants
///
/// - `encrypted_form_id` is write-once: set by
///   [`preserve_id_before_decryption`](Self::preserve_id_before_decryption)
///   and never reassigned afterwards, so references citing the pre-decryption
///   identifier stay resolvable.
#[derive(Debug, Clone)]
pub struct HeaderElement {
    category: ElementCategory,
    payload: Bytes,
    binding_role: BindingRole,
    id: Option<String>,
    encrypted_form_id: Option<String>,
    wrapped_form_id: Option<String>,
    signed: bool,
    encrypted: bool,
    decrypted_buffer: Option<Bytes>,
    token_tracker: Option<TokenTrackerId>,
    double_encrypted: bool,
}

impl HeaderElement {
    /// Create an element as discovered by the external parser.
    pub fn new(category: ElementCategory, payload: Bytes) -> Self {
        Self {
            category,
            payload,
            binding_role: BindingRole::Unknown,
            id: None,
            encrypted_form_id: None,
            wrapped_form_id: None,
            signed: false,
            encrypted: false,
            decrypted_buffer: None,
            token_tracker: None,
            double_encrypted: false,
        }
    }

    /// Attach the element's plain identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Structural category.
    pub fn category(&self) -> ElementCategory {
        self.category
    }

    /// Opaque payload handle produced by the external XML layer.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Assigned binding role ([`BindingRole::Unknown`] until marking).
    pub fn binding_role(&self) -> BindingRole {
        self.binding_role
    }

    /// Plain identifier, if the element carried one.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Identifier the element was referenced under before decryption.
    pub fn encrypted_form_id(&self) -> Option<&str> {
        self.encrypted_form_id.as_deref()
    }

    /// Secondary identifier of the doubly wrapped form.
    pub fn wrapped_form_id(&self) -> Option<&str> {
        self.wrapped_form_id.as_deref()
    }

    /// Whether a signature covers this element.
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// Whether this element arrived encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// Whether this element passed through two encryption layers.
    pub fn is_double_encrypted(&self) -> bool {
        self.double_encrypted
    }

    /// Decrypted contents, once decryption has occurred.
    pub fn decrypted_buffer(&self) -> Option<&Bytes> {
        self.decrypted_buffer.as_ref()
    }

    /// Associated token-tracking handle.
    pub fn token_tracker(&self) -> Option<TokenTrackerId> {
        self.token_tracker
    }

    /// Associate a token-tracking handle with this element.
    pub fn set_token_tracker(&mut self, tracker: TokenTrackerId) {
        self.token_tracker = Some(tracker);
    }

    /// Mark the element as covered by a signature.
    pub fn set_signed(&mut self) {
        self.signed = true;
    }

    /// Record the pre-decryption identifier before the payload is replaced.
    ///
    /// Write-once: a second decryption layer does not overwrite the
    /// identifier preserved by the first.
    pub fn preserve_id_before_decryption(&mut self) {
        if self.encrypted_form_id.is_none() {
            self.encrypted_form_id = self.id.take();
        }
    }

    /// Record that this element was wrapped twice, remembering the inner
    /// wrapped form's identifier.
    pub fn mark_double_encrypted(&mut self, wrapped_form_id: impl Into<String>) {
        self.double_encrypted = true;
        self.wrapped_form_id = Some(wrapped_form_id.into());
    }

    /// Replace the element's identity and contents after a decryption pass.
    ///
    /// Preserves the encrypted-form identifier, installs the decrypted
    /// buffer, and rewrites the category and plain identifier to those of the
    /// revealed element.
    pub fn apply_decryption(
        &mut self,
        category: ElementCategory,
        plain_id: Option<String>,
        decrypted: Bytes,
    ) {
        self.preserve_id_before_decryption();
        self.category = category;
        self.id = plain_id;
        self.encrypted = true;
        self.decrypted_buffer = Some(decrypted);
    }

    /// Assign the binding role. Engine use only; does not overwrite an
    /// existing assignment.
    pub(crate) fn assign_role(&mut self, role: BindingRole) {
        if self.binding_role == BindingRole::Unknown {
            self.binding_role = role;
        }
    }

    /// Whether `candidate` names this element.
    ///
    /// Resolution precedence:
    ///
    /// 1. doubly encrypted elements match the encrypted-form identifier or
    ///    the wrapped-form identifier;
    /// 2. otherwise, when `require_encrypted_form` is set, only the
    ///    encrypted-form identifier matches;
    /// 3. otherwise the plain identifier matches.
    pub fn matches_id(&self, candidate: &str, require_encrypted_form: bool) -> bool {
        if self.double_encrypted {
            self.encrypted_form_id.as_deref() == Some(candidate)
                || self.wrapped_form_id.as_deref() == Some(candidate)
        } else if require_encrypted_form {
            self.encrypted_form_id.as_deref() == Some(candidate)
        } else {
            self.id.as_deref() == Some(candidate)
        }
    }
}

/// Ordered store of parsed security-header elements, index = document order.
///
/// Owned exclusively by the per-message processing context; never shared
/// across concurrently processed messages.
#[derive(Debug, Default)]
pub struct ElementTable {
    elements: Vec<HeaderElement>,
}

impl ElementTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element in document order, returning its index.
    pub fn append(&mut self, element: HeaderElement) -> usize {
        self.elements.push(element);
        self.elements.len() - 1
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the table holds no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Element at `index`, if present.
    pub fn get(&self, index: usize) -> Option<&HeaderElement> {
        self.elements.get(index)
    }

    /// Mutable element at `index`, if present.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut HeaderElement> {
        self.elements.get_mut(index)
    }

    /// Iterate elements in document order.
    pub fn iter(&self) -> impl Iterator<Item = &HeaderElement> {
        self.elements.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut HeaderElement> {
        self.elements.iter_mut()
    }

    /// Index of the first element matching `candidate` under the
    /// [`HeaderElement::matches_id`] precedence rules.
    pub fn find_by_id(&self, candidate: &str, require_encrypted_form: bool) -> Option<usize> {
        self.elements.iter().position(|e| e.matches_id(candidate, require_encrypted_form))
    }

    /// Rewrite the element at `index` after a decryption pass.
    ///
    /// # Errors
    ///
    /// [`HeaderError::IndexOutOfRange`] if `index` is past the end.
    pub fn set_element_after_decryption(
        &mut self,
        index: usize,
        category: ElementCategory,
        plain_id: Option<String>,
        decrypted: Bytes,
    ) -> Result<(), HeaderError> {
        let len = self.elements.len();
        let element = self
            .elements
            .get_mut(index)
            .ok_or(HeaderError::IndexOutOfRange { index, len })?;
        element.apply_decryption(category, plain_id, decrypted);
        Ok(())
    }

    /// Replace the entire entry at `index` (post-decryption category
    /// rewrite where the revealed element is re-parsed from scratch).
    ///
    /// # Errors
    ///
    /// [`HeaderError::IndexOutOfRange`] if `index` is past the end.
    pub fn replace_entry(
        &mut self,
        index: usize,
        element: HeaderElement,
    ) -> Result<(), HeaderError> {
        let len = self.elements.len();
        let slot = self
            .elements
            .get_mut(index)
            .ok_or(HeaderError::IndexOutOfRange { index, len })?;
        *slot = element;
        Ok(())
    }
}
