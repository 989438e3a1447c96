//! Token attachment-mode classification.
//!
//! Maps a supporting token's declared attachment mode to the protection the
//! dispatch layer must require: whether the token is basic (must additionally
//! be encrypted), merely signed, or endorsing.

use crate::{element::BindingRole, errors::HeaderError};

/// Declared attachment mode of a supporting token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentMode {
    /// Token is covered by the primary signature
    Signed,
    /// Token endorses the primary signature
    Endorsing,
    /// Token is both signed and endorsing
    SignedEndorsing,
    /// Token is signed and encrypted
    SignedEncrypted,
}

impl AttachmentMode {
    /// Decode a mode from its wire/configuration value.
    ///
    /// # Errors
    ///
    /// [`HeaderError::InvalidAttachmentMode`] for an undefined value.
    pub fn from_u8(raw: u8) -> Result<Self, HeaderError> {
        match raw {
            0 => Ok(Self::Signed),
            1 => Ok(Self::Endorsing),
            2 => Ok(Self::SignedEndorsing),
            3 => Ok(Self::SignedEncrypted),
            other => Err(HeaderError::InvalidAttachmentMode(other)),
        }
    }

    /// Wire/configuration value of this mode.
    pub fn to_u8(self) -> u8 {
        match self {
            Self::Signed => 0,
            Self::Endorsing => 1,
            Self::SignedEndorsing => 2,
            Self::SignedEncrypted => 3,
        }
    }
}

/// Protection requirements derived from an attachment mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentCategory {
    /// Token must be part of the encrypted reference list
    pub is_basic: bool,
    /// Token must be signed but carries no encryption requirement
    pub is_signed_but_not_basic: bool,
    /// Binding role the layout engine is expected to assign
    pub binding_role: BindingRole,
}

/// Classify an attachment mode.
///
/// | mode              | basic | signed-not-basic | role              |
/// |-------------------|-------|------------------|-------------------|
/// | `Endorsing`       | no    | no               | `Endorsing`       |
/// | `Signed`          | no    | yes              | `Signed`          |
/// | `SignedEncrypted` | yes   | no               | `Basic`           |
/// | `SignedEndorsing` | no    | yes              | `SignedEndorsing` |
pub fn categorize(mode: AttachmentMode) -> AttachmentCategory {
    match mode {
        AttachmentMode::Endorsing => AttachmentCategory {
            is_basic: false,
            is_signed_but_not_basic: false,
            binding_role: BindingRole::Endorsing,
        },
        AttachmentMode::Signed => AttachmentCategory {
            is_basic: false,
            is_signed_but_not_basic: true,
            binding_role: BindingRole::Signed,
        },
        AttachmentMode::SignedEncrypted => AttachmentCategory {
            is_basic: true,
            is_signed_but_not_basic: false,
            binding_role: BindingRole::Basic,
        },
        AttachmentMode::SignedEndorsing => AttachmentCategory {
            is_basic: false,
            is_signed_but_not_basic: true,
            binding_role: BindingRole::SignedEndorsing,
        },
    }
}
