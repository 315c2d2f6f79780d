//! Field-level validation of a settings draft.
//!
//! # Design
//! - Pure function over the draft snapshot; no IO, no logging.
//! - Errors identify the field path and the violated rule; wording is left to the caller.
//! - Document-level rules (auth usability, unique names) are checked after merge.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use stowage_i18n::translate;
use thiserror::Error;

use crate::credential::Credential;
use crate::draft::Draft;

/// Pattern shared by instance ids and user names.
pub const IDENTIFIER_PATTERN: &str = r"^[A-Za-z0-9_.-]+$";

static IDENTIFIER: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(IDENTIFIER_PATTERN).ok());

/// Whether `value` is a non-empty identifier.
#[must_use]
pub fn is_identifier(value: &str) -> bool {
    IDENTIFIER.as_ref().is_some_and(|pattern| pattern.is_match(value))
}

/// Location of a draft field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPath {
    /// `instance`
    Instance,
    /// `auth.users[i].name`
    UserName(usize),
    /// `auth.users[i].passwordHash`
    UserPassword(usize),
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance => f.write_str("instance"),
            Self::UserName(index) => write!(f, "auth.users[{index}].name"),
            Self::UserPassword(index) => write!(f, "auth.users[{index}].passwordHash"),
        }
    }
}

/// Rule a field violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Value is empty.
    Required,
    /// Value does not match [`IDENTIFIER_PATTERN`].
    Pattern,
}

/// A single field-scoped validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Offending field.
    pub path: FieldPath,
    /// Violated rule.
    pub rule: FieldRule,
}

impl FieldError {
    /// Message in the active locale.
    #[must_use]
    pub fn localized(&self) -> String {
        let key = match (self.path, self.rule) {
            (FieldPath::Instance, FieldRule::Required) => "validation.instance.required",
            (FieldPath::Instance, FieldRule::Pattern) => "validation.instance.pattern",
            (FieldPath::UserName(_), FieldRule::Required) => "validation.user.name_required",
            (FieldPath::UserName(_), FieldRule::Pattern) => "validation.user.name_pattern",
            (FieldPath::UserPassword(_), _) => "validation.user.password_required",
        };
        translate(key)
    }
}

/// All field errors found in one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{} field(s) failed validation", .0.len())]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    /// Iterate over the collected errors.
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Errors attached to `path`.
    pub fn for_path(&self, path: FieldPath) -> impl Iterator<Item = &FieldError> {
        self.0.iter().filter(move |error| error.path == path)
    }

    /// Number of errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no errors were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, path: FieldPath, rule: FieldRule) {
        self.0.push(FieldError { path, rule });
    }
}

/// A user entry that passed field validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUser {
    pub(crate) name: String,
    pub(crate) credential: Credential,
}

impl ValidatedUser {
    /// Login name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Password state.
    #[must_use]
    pub const fn credential(&self) -> &Credential {
        &self.credential
    }
}

/// Snapshot of a draft whose fields all passed validation.
///
/// Only [`validate`] constructs this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedDraft {
    pub(crate) instance: String,
    pub(crate) auth_disabled: bool,
    pub(crate) users: Vec<ValidatedUser>,
}

impl ValidatedDraft {
    /// Validated instance id.
    #[must_use]
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Whether authentication is disabled.
    #[must_use]
    pub const fn auth_disabled(&self) -> bool {
        self.auth_disabled
    }

    /// Validated users in draft order.
    #[must_use]
    pub fn users(&self) -> &[ValidatedUser] {
        &self.users
    }

    /// Number of users whose password still needs hashing.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.users
            .iter()
            .filter(|user| user.credential.is_pending())
            .count()
    }
}

/// Check every draft field and return a validated snapshot.
///
/// # Errors
///
/// Returns every field-scoped violation found in the draft.
pub fn validate(draft: &Draft) -> Result<ValidatedDraft, FieldErrors> {
    let mut errors = FieldErrors::default();

    check_identifier(&mut errors, FieldPath::Instance, draft.instance());

    for (index, user) in draft.users().iter().enumerate() {
        check_identifier(&mut errors, FieldPath::UserName(index), &user.name);
        if user.credential.is_empty() {
            errors.push(FieldPath::UserPassword(index), FieldRule::Required);
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ValidatedDraft {
        instance: draft.instance().to_string(),
        auth_disabled: draft.auth_disabled(),
        users: draft
            .users()
            .iter()
            .map(|user| ValidatedUser {
                name: user.name.clone(),
                credential: user.credential.clone(),
            })
            .collect(),
    })
}

fn check_identifier(errors: &mut FieldErrors, path: FieldPath, value: &str) {
    if value.is_empty() {
        errors.push(path, FieldRule::Required);
    } else if !is_identifier(value) {
        errors.push(path, FieldRule::Pattern);
    }
}
