//! Editable copy of the settings owned by the editor.
//!
//! # Design
//! - Seeded from the canonical configuration; holds only `instance` and `auth`.
//! - The instance id is locked once the loaded configuration has one.
//! - Mutations never touch the network; submission lives in [`crate::session`].

use serde_json::{Value, json};

use crate::credential::Credential;
use crate::error::{ConfigError, ConfigResult};
use crate::model::Configuration;

const MASK: &str = "********";

/// One user row in the draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftUser {
    /// Login name as typed.
    pub name: String,
    /// Password state.
    pub credential: Credential,
}

/// In-progress edit of the settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    instance: String,
    instance_locked: bool,
    auth_disabled: bool,
    users: Vec<DraftUser>,
}

impl Draft {
    /// Seed a draft from the current configuration.
    #[must_use]
    pub fn from_config(config: &Configuration) -> Self {
        Self {
            instance: config.instance.clone(),
            instance_locked: !config.instance.is_empty(),
            auth_disabled: config.auth.disabled,
            users: config
                .auth
                .users
                .iter()
                .map(|user| DraftUser {
                    name: user.name.clone(),
                    credential: Credential::Hashed(user.password_hash.clone()),
                })
                .collect(),
        }
    }

    /// Instance id being edited.
    #[must_use]
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Whether the instance id can no longer be edited.
    #[must_use]
    pub const fn instance_locked(&self) -> bool {
        self.instance_locked
    }

    /// Whether authentication is disabled in the draft.
    #[must_use]
    pub const fn auth_disabled(&self) -> bool {
        self.auth_disabled
    }

    /// User rows in display order.
    #[must_use]
    pub fn users(&self) -> &[DraftUser] {
        &self.users
    }

    /// Position of the first user named `name`.
    #[must_use]
    pub fn user_index(&self, name: &str) -> Option<usize> {
        self.users.iter().position(|user| user.name == name)
    }

    /// Set the instance id.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ImmutableField`] once the configuration already has an id.
    pub fn set_instance(&mut self, value: impl Into<String>) -> ConfigResult<()> {
        if self.instance_locked {
            return Err(ConfigError::ImmutableField { field: "instance" });
        }
        self.instance = value.into();
        Ok(())
    }

    /// Toggle the "disable authentication" switch.
    pub fn set_auth_disabled(&mut self, disabled: bool) {
        self.auth_disabled = disabled;
    }

    /// Append a blank user row and return its index.
    pub fn add_user(&mut self) -> usize {
        self.users.push(DraftUser::default());
        self.users.len() - 1
    }

    /// Remove a user row.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UserIndexOutOfRange`] for an unknown row.
    pub fn remove_user(&mut self, index: usize) -> ConfigResult<DraftUser> {
        if index >= self.users.len() {
            return Err(ConfigError::UserIndexOutOfRange { index });
        }
        Ok(self.users.remove(index))
    }

    /// Rename a user row.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UserIndexOutOfRange`] for an unknown row.
    pub fn set_user_name(&mut self, index: usize, name: impl Into<String>) -> ConfigResult<()> {
        self.user_mut(index)?.name = name.into();
        Ok(())
    }

    /// Focus the password field: marks it pending and clears the shown value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UserIndexOutOfRange`] for an unknown row.
    pub fn begin_password_edit(&mut self, index: usize) -> ConfigResult<()> {
        self.user_mut(index)?.credential.begin_edit();
        Ok(())
    }

    /// Type a new password for a user row.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UserIndexOutOfRange`] for an unknown row.
    pub fn set_user_password(
        &mut self,
        index: usize,
        plaintext: impl Into<String>,
    ) -> ConfigResult<()> {
        self.user_mut(index)?.credential.set_plaintext(plaintext);
        Ok(())
    }

    /// JSON view of the draft with pending passwords masked.
    #[must_use]
    pub fn preview(&self) -> Value {
        let users: Vec<Value> = self
            .users
            .iter()
            .map(|user| match &user.credential {
                Credential::Hashed(hash) => json!({
                    "name": user.name,
                    "passwordHash": hash,
                }),
                Credential::Pending(plaintext) => json!({
                    "name": user.name,
                    "passwordHash": if plaintext.is_empty() { "" } else { MASK },
                    "needsHashing": true,
                }),
            })
            .collect();
        json!({
            "instance": self.instance,
            "auth": {
                "disabled": self.auth_disabled,
                "users": users,
            },
        })
    }

    fn user_mut(&mut self, index: usize) -> ConfigResult<&mut DraftUser> {
        self.users
            .get_mut(index)
            .ok_or(ConfigError::UserIndexOutOfRange { index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Auth, User};

    fn configured() -> Configuration {
        Configuration {
            instance: "home-1".into(),
            auth: Auth {
                disabled: false,
                users: vec![User {
                    name: "alice".into(),
                    password_hash: "$argon2id$alice".into(),
                }],
            },
            ..Configuration::default()
        }
    }

    #[test]
    fn seeded_instance_is_locked() {
        let mut draft = Draft::from_config(&configured());
        assert!(draft.instance_locked());
        assert!(matches!(
            draft.set_instance("other"),
            Err(ConfigError::ImmutableField { field: "instance" })
        ));
        assert_eq!(draft.instance(), "home-1");
    }

    #[test]
    fn empty_instance_can_be_set_repeatedly() {
        let mut draft = Draft::from_config(&Configuration::default());
        draft.set_instance("first").expect("unlocked");
        draft.set_instance("second").expect("still unlocked until committed");
        assert_eq!(draft.instance(), "second");
    }

    #[test]
    fn password_edit_moves_to_pending() {
        let mut draft = Draft::from_config(&configured());
        assert_eq!(
            draft.users()[0].credential,
            Credential::Hashed("$argon2id$alice".into())
        );

        draft.begin_password_edit(0).expect("row exists");
        assert_eq!(draft.users()[0].credential, Credential::Pending(String::new()));
        draft.set_user_password(0, "s3cret").expect("row exists");
        assert!(draft.users()[0].credential.is_pending());
    }

    #[test]
    fn rows_are_added_and_removed_by_index() {
        let mut draft = Draft::from_config(&configured());
        let index = draft.add_user();
        assert_eq!(index, 1);
        draft.set_user_name(index, "bob").expect("row exists");
        assert_eq!(draft.user_index("bob"), Some(1));

        let removed = draft.remove_user(0).expect("row exists");
        assert_eq!(removed.name, "alice");
        assert_eq!(draft.user_index("bob"), Some(0));
        assert!(matches!(
            draft.set_user_name(5, "x"),
            Err(ConfigError::UserIndexOutOfRange { index: 5 })
        ));
    }

    #[test]
    fn preview_masks_pending_plaintext() {
        let mut draft = Draft::from_config(&configured());
        draft.set_user_password(0, "hunter2").expect("row exists");
        let preview = draft.preview();
        assert_eq!(preview["auth"]["users"][0]["passwordHash"], MASK);
        assert_eq!(preview["auth"]["users"][0]["needsHashing"], true);
        assert!(!preview.to_string().contains("hunter2"));
    }
}
