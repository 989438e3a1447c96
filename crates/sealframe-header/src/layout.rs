//! Layout inference: binding-role assignment under an ordering policy.
//!
//! Four interoperability profiles govern how a peer arranges its security
//! header. The engine for a profile is pure and stateless: it is selected
//! once per security-binding configuration and applied to every inbound
//! message against that binding.
//!
//! The Lax variants share one marking function; the timestamp-position
//! profiles are guards composed in front of it rather than subclasses of it.

use crate::{
    element::{BindingRole, ElementCategory, ElementTable, HeaderElement},
    errors::HeaderError,
};

/// Ordering discipline a security configuration enforces on header element
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutPolicy {
    /// Exactly one processing pass, single-primary-signature discipline
    Strict,
    /// No ordering constraint on the timestamp
    Lax,
    /// Timestamp, if present, must be the first element
    LaxTimestampFirst,
    /// Timestamp, if present, must be the final element
    LaxTimestampLast,
}

impl LayoutPolicy {
    /// Decode a policy from its wire/configuration value.
    ///
    /// # Errors
    ///
    /// [`HeaderError::InvalidPolicy`] for an undefined value.
    pub fn from_u8(raw: u8) -> Result<Self, HeaderError> {
        match raw {
            0 => Ok(Self::Strict),
            1 => Ok(Self::Lax),
            2 => Ok(Self::LaxTimestampFirst),
            3 => Ok(Self::LaxTimestampLast),
            other => Err(HeaderError::InvalidPolicy(other)),
        }
    }

    /// Wire/configuration value of this policy.
    pub fn to_u8(self) -> u8 {
        match self {
            Self::Strict => 0,
            Self::Lax => 1,
            Self::LaxTimestampFirst => 2,
            Self::LaxTimestampLast => 3,
        }
    }
}

/// External supplier of parsed header elements in document order.
///
/// Implemented by the XML-reader boundary; any iterator over elements
/// satisfies it.
pub trait ElementSource {
    /// Next element in document order, `None` once the header is exhausted.
    fn next_element(&mut self) -> Option<HeaderElement>;
}

impl<I> ElementSource for I
where
    I: Iterator<Item = HeaderElement>,
{
    fn next_element(&mut self) -> Option<HeaderElement> {
        self.next()
    }
}

/// Drain the element source into the table.
///
/// Every policy performs exactly one full decrypt-then-classify traversal in
/// this design; the Lax variants reserve the ability to reprocess.
pub fn execute_processing_passes<S: ElementSource>(
    policy: LayoutPolicy,
    table: &mut ElementTable,
    source: &mut S,
) {
    match policy {
        LayoutPolicy::Strict
        | LayoutPolicy::Lax
        | LayoutPolicy::LaxTimestampFirst
        | LayoutPolicy::LaxTimestampLast => {
            while let Some(element) = source.next_element() {
                table.append(element);
            }
        },
    }
}

/// Assign a binding role to every element under `policy`.
///
/// Elements already marked by an earlier pass are never reassigned.
///
/// # Errors
///
/// - [`HeaderError::MisplacedTimestamp`] when a timestamp-position guard
///   fails;
/// - [`HeaderError::DuplicatePrimarySignature`] under
///   [`LayoutPolicy::Strict`] when two elements end up with the Primary role.
pub fn mark_elements(
    policy: LayoutPolicy,
    table: &mut ElementTable,
    is_message_security_mode: bool,
) -> Result<(), HeaderError> {
    match policy {
        LayoutPolicy::Strict => {
            mark_signatures(table, is_message_security_mode);
            verify_single_primary(table)
        },
        LayoutPolicy::Lax => {
            mark_signatures(table, is_message_security_mode);
            Ok(())
        },
        LayoutPolicy::LaxTimestampFirst => {
            verify_timestamp_first(table)?;
            mark_signatures(table, is_message_security_mode);
            Ok(())
        },
        LayoutPolicy::LaxTimestampLast => {
            verify_timestamp_last(table)?;
            mark_signatures(table, is_message_security_mode);
            Ok(())
        },
    }
}

/// Shared lax marking: the first Signature becomes Primary (message-security
/// mode only), every later Signature becomes Endorsing.
fn mark_signatures(table: &mut ElementTable, is_message_security_mode: bool) {
    let mut primary_found = false;
    for element in table.iter_mut() {
        if element.binding_role() == BindingRole::Primary {
            primary_found = true;
            continue;
        }
        if element.binding_role() != BindingRole::Unknown {
            continue;
        }
        if element.category() == ElementCategory::Signature {
            if is_message_security_mode && !primary_found {
                element.assign_role(BindingRole::Primary);
                primary_found = true;
            } else {
                element.assign_role(BindingRole::Endorsing);
            }
        }
    }
}

/// Strict-mode uniqueness: at most one element may carry the Primary role.
fn verify_single_primary(table: &ElementTable) -> Result<(), HeaderError> {
    let primaries = table.iter().filter(|e| e.binding_role() == BindingRole::Primary).count();
    if primaries > 1 {
        return Err(HeaderError::DuplicatePrimarySignature);
    }
    Ok(())
}

fn verify_timestamp_first(table: &ElementTable) -> Result<(), HeaderError> {
    for (index, element) in table.iter().enumerate().skip(1) {
        if element.category() == ElementCategory::Timestamp {
            return Err(HeaderError::MisplacedTimestamp {
                policy: LayoutPolicy::LaxTimestampFirst,
                index,
            });
        }
    }
    Ok(())
}

fn verify_timestamp_last(table: &ElementTable) -> Result<(), HeaderError> {
    let last = table.len().saturating_sub(1);
    for (index, element) in table.iter().enumerate().take(last) {
        if element.category() == ElementCategory::Timestamp {
            return Err(HeaderError::MisplacedTimestamp {
                policy: LayoutPolicy::LaxTimestampLast,
                index,
            });
        }
    }
    Ok(())
}
