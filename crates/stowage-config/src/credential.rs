//! Password material held by a draft user.
//!
//! A credential is either an existing one-way hash or plaintext waiting to be
//! hashed at submission. Editing the password always lands in `Pending`; the
//! only way back to `Hashed` is through a [`CredentialHasher`](crate::CredentialHasher).

use std::fmt;

/// Password state for a user being edited.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Hash as stored in the canonical configuration.
    Hashed(String),
    /// Plaintext entered by the user; must be hashed before it leaves the client.
    Pending(String),
}

impl Credential {
    /// Start editing: switch to `Pending` and clear the displayed value.
    pub fn begin_edit(&mut self) {
        *self = Self::Pending(String::new());
    }

    /// Replace the password with new plaintext.
    pub fn set_plaintext(&mut self, plaintext: impl Into<String>) {
        *self = Self::Pending(plaintext.into());
    }

    /// Whether the value still needs hashing.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Whether the field holds no value at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Hashed(value) | Self::Pending(value) => value.is_empty(),
        }
    }
}

impl Default for Credential {
    fn default() -> Self {
        Self::Pending(String::new())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hashed(hash) => f.debug_tuple("Hashed").field(hash).finish(),
            Self::Pending(_) => f.write_str("Pending(<redacted>)"),
        }
    }
}
