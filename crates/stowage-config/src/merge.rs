//! Merge of a hashed draft onto the canonical configuration.

use std::collections::HashSet;

use crate::error::{ConfigError, ConfigResult};
use crate::hasher::HashedDraft;
use crate::model::Configuration;

/// Clone `current`, overwrite `instance` and `auth`, then check document invariants
/// on the merged result.
///
/// # Errors
///
/// - [`ConfigError::ImmutableField`] when the draft renames an already set instance.
/// - [`ConfigError::InvalidAuthState`] when auth is enabled with no users.
/// - [`ConfigError::DuplicateUserName`] when two users share a name.
pub fn merge(current: &Configuration, draft: &HashedDraft) -> ConfigResult<Configuration> {
    ensure_instance_unchanged(current, &draft.instance)?;

    let mut merged = current.clone();
    merged.instance.clone_from(&draft.instance);
    merged.auth.clone_from(&draft.auth);

    if !merged.auth.is_usable() {
        return Err(ConfigError::InvalidAuthState);
    }
    ensure_unique_names(merged.auth.users.iter().map(|user| user.name.as_str()))?;

    Ok(merged)
}

/// An instance id, once set, can only be written back unchanged.
pub(crate) fn ensure_instance_unchanged(
    current: &Configuration,
    instance: &str,
) -> ConfigResult<()> {
    if !current.instance.is_empty() && current.instance != instance {
        return Err(ConfigError::ImmutableField { field: "instance" });
    }
    Ok(())
}

pub(crate) fn ensure_unique_names<'a>(
    names: impl IntoIterator<Item = &'a str>,
) -> ConfigResult<()> {
    let mut seen = HashSet::new();
    match names.into_iter().find(|name| !seen.insert(*name)) {
        Some(name) => Err(ConfigError::DuplicateUserName {
            name: name.to_string(),
        }),
        None => Ok(()),
    }
}
