//! Signature confirmation accumulator.
//!
//! Collects the signature values echoed back while a response is
//! constructed. Encryption protection is tracked for the whole set rather
//! than per entry: interoperating peers expect all confirmations in one
//! response to share protection, so the set-level flag is part of the wire
//! contract and must not be "fixed" to per-entry granularity.

use bytes::Bytes;

use crate::errors::HeaderError;

/// Append-only collection of signature-confirmation values.
#[derive(Debug)]
pub struct SignatureConfirmationSet {
    confirmations: Vec<Bytes>,
    any_encrypted: bool,
}

impl SignatureConfirmationSet {
    /// Create an empty set.
    ///
    /// Starts with room for a single confirmation; growth is amortized
    /// doubling.
    pub fn new() -> Self {
        Self { confirmations: Vec::with_capacity(1), any_encrypted: false }
    }

    /// Append a confirmation value, folding its encryption protection into
    /// the set-wide flag.
    pub fn add_confirmation(&mut self, value: Bytes, encrypted: bool) {
        self.confirmations.push(value);
        self.any_encrypted |= encrypted;
    }

    /// Confirmation at `index` plus the set-wide encryption flag.
    ///
    /// The returned flag reflects the whole set, not the individual entry.
    ///
    /// # Errors
    ///
    /// [`HeaderError::IndexOutOfRange`] if `index` is not in `[0, len)`.
    pub fn get_confirmation(&self, index: usize) -> Result<(&[u8], bool), HeaderError> {
        let len = self.confirmations.len();
        let value = self
            .confirmations
            .get(index)
            .ok_or(HeaderError::IndexOutOfRange { index, len })?;
        Ok((value.as_ref(), self.any_encrypted))
    }

    /// Number of confirmations collected.
    pub fn len(&self) -> usize {
        self.confirmations.len()
    }

    /// Whether no confirmation has been collected.
    pub fn is_empty(&self) -> bool {
        self.confirmations.is_empty()
    }

    /// Whether any collected confirmation was encryption-protected.
    pub fn any_encrypted(&self) -> bool {
        self.any_encrypted
    }
}

impl Default for SignatureConfirmationSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encryption_flag_is_set_wide() {
        let mut set = SignatureConfirmationSet::new();
        set.add_confirmation(Bytes::from_static(b"v1"), false);
        set.add_confirmation(Bytes::from_static(b"v2"), true);

        let (v1, enc1) = set.get_confirmation(0).unwrap();
        let (v2, enc2) = set.get_confirmation(1).unwrap();

        assert_eq!(v1, b"v1");
        assert_eq!(v2, b"v2");
        // Both report the OR of all appended flags
        assert!(enc1);
        assert!(enc2);
    }

    #[test]
    fn unencrypted_set_stays_unencrypted() {
        let mut set = SignatureConfirmationSet::new();
        set.add_confirmation(Bytes::from_static(b"v1"), false);

        let (_, encrypted) = set.get_confirmation(0).unwrap();
        assert!(!encrypted);
        assert!(!set.any_encrypted());
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut set = SignatureConfirmationSet::new();
        set.add_confirmation(Bytes::from_static(b"v1"), false);

        assert_eq!(
            set.get_confirmation(1),
            Err(HeaderError::IndexOutOfRange { index: 1, len: 1 })
        );
        assert_eq!(
            SignatureConfirmationSet::new().get_confirmation(0),
            Err(HeaderError::IndexOutOfRange { index: 0, len: 0 })
        );
    }

    #[test]
    fn default_reserves_the_initial_slot() {
        let set = SignatureConfirmationSet::default();
        assert!(set.confirmations.capacity() >= 1);
        assert!(set.is_empty());
        assert!(!set.any_encrypted());
    }

    #[test]
    fn growth_preserves_order() {
        let mut set = SignatureConfirmationSet::new();
        for i in 0..17u8 {
            set.add_confirmation(Bytes::copy_from_slice(&[i]), false);
        }
        assert_eq!(set.len(), 17);
        for i in 0..17u8 {
            let (value, _) = set.get_confirmation(usize::from(i)).unwrap();
            assert_eq!(value, [i]);
        }
    }
}
