//! One-way transformation of pending credentials.
//!
//! # Design
//! - The hash service is an async seam; implementations live with the transport.
//! - Pending credentials are hashed in draft order; the first failure aborts the pass.
//! - The output type only carries hashed users, so plaintext cannot reach the merge.

use anyhow::{Result, anyhow};
use argon2::Argon2;
use argon2::password_hash::{PasswordHasher, SaltString};
use async_trait::async_trait;
use rand_core::OsRng;
use tracing::info;

use crate::credential::Credential;
use crate::error::{ConfigError, ConfigResult};
use crate::model::{Auth, User};
use crate::validate::ValidatedDraft;

#[async_trait]
/// Service turning a plaintext secret into its one-way hash.
pub trait CredentialHasher: Send + Sync {
    /// Hash `plaintext`.
    async fn hash(&self, plaintext: &str) -> Result<String>;
}

/// Local Argon2id hasher producing PHC strings; used when editing the file directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

#[async_trait]
impl CredentialHasher for Argon2Hasher {
    async fn hash(&self, plaintext: &str) -> Result<String> {
        hash_secret(plaintext)
    }
}

fn hash_secret(input: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon = Argon2::default();
    let hash = argon
        .hash_password(input.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash secret material: {err}"))?;
    Ok(hash.to_string())
}

/// Validated draft whose credentials have all been hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedDraft {
    pub(crate) instance: String,
    pub(crate) auth: Auth,
}

impl HashedDraft {
    /// Instance id to write.
    #[must_use]
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Authentication section to write.
    #[must_use]
    pub const fn auth(&self) -> &Auth {
        &self.auth
    }
}

/// Hash every pending credential of `draft`.
///
/// The draft is borrowed, so a failure leaves it untouched and a retry hashes the
/// same set of credentials again.
///
/// # Errors
///
/// Returns [`ConfigError::HashService`] for the first credential the service fails on.
pub async fn hash_pending(
    draft: &ValidatedDraft,
    hasher: &dyn CredentialHasher,
) -> ConfigResult<HashedDraft> {
    let mut users = Vec::with_capacity(draft.users.len());
    for user in &draft.users {
        let password_hash = match &user.credential {
            Credential::Hashed(hash) => hash.clone(),
            Credential::Pending(plaintext) => {
                let hash =
                    hasher
                        .hash(plaintext)
                        .await
                        .map_err(|source| ConfigError::HashService {
                            user: user.name.clone(),
                            source,
                        })?;
                info!(user = %user.name, "hashed pending credential");
                hash
            }
        };
        users.push(User {
            name: user.name.clone(),
            password_hash,
        });
    }

    Ok(HashedDraft {
        instance: draft.instance.clone(),
        auth: Auth {
            disabled: draft.auth_disabled,
            users,
        },
    })
}
