//! Editing session: validate, hash, merge and commit a settings draft.
//!
//! # Design
//! - One session owns one draft; `submit` takes `&mut self`, so a second submission
//!   cannot start while one is in flight.
//! - Nothing is sent unless the draft validated, every credential hashed and the
//!   merged document satisfies the auth invariant.
//! - The server's reply replaces local state; a reload is scheduled after a short delay.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use stowage_i18n::{translate, translate_with};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::draft::Draft;
use crate::error::{ConfigError, ConfigResult};
use crate::hasher::{CredentialHasher, hash_pending};
use crate::merge::{ensure_instance_unchanged, ensure_unique_names, merge};
use crate::model::Configuration;
use crate::validate::{ValidatedDraft, ValidatedUser, validate};

/// How long the success notification stays visible.
pub const SUCCESS_DISPLAY: Duration = Duration::from_secs(5);
/// How long failure alerts stay visible.
pub const ERROR_DISPLAY: Duration = Duration::from_secs(15);
/// Delay between a successful commit and the application reload.
pub const RELOAD_DELAY: Duration = Duration::from_millis(500);

#[async_trait]
/// Server-side configuration store.
pub trait ConfigBackend: Send + Sync {
    /// Fetch the canonical configuration.
    async fn get_config(&self) -> Result<Configuration>;
    /// Replace the configuration; returns what the server accepted.
    async fn set_config(&self, config: &Configuration) -> Result<Configuration>;
}

/// Non-blocking user notifications.
pub trait Notifier: Send + Sync {
    /// Show a success message.
    fn success(&self, message: &str, display_for: Duration);
    /// Show a failure alert.
    fn error(&self, message: &str, display_for: Duration);
}

#[async_trait]
/// Full application state reload after a commit.
pub trait Reloader: Send + Sync {
    /// Reload the application from the server's state.
    async fn reload(&self) -> Result<()>;
}

/// Collaborators used by a [`SettingsSession`].
#[derive(Clone)]
pub struct SessionDeps {
    /// Configuration store.
    pub backend: Arc<dyn ConfigBackend>,
    /// Hash service for pending credentials.
    pub hasher: Arc<dyn CredentialHasher>,
    /// Notification sink.
    pub notifier: Arc<dyn Notifier>,
    /// Reload hook run after a successful commit.
    pub reloader: Arc<dyn Reloader>,
    /// Delay before the reload hook runs.
    pub reload_delay: Duration,
}

impl SessionDeps {
    /// Bundle collaborators with the default reload delay.
    #[must_use]
    pub fn new(
        backend: Arc<dyn ConfigBackend>,
        hasher: Arc<dyn CredentialHasher>,
        notifier: Arc<dyn Notifier>,
        reloader: Arc<dyn Reloader>,
    ) -> Self {
        Self {
            backend,
            hasher,
            notifier,
            reloader,
            reload_delay: RELOAD_DELAY,
        }
    }
}

/// Hash, merge and send a validated draft; returns the server's configuration.
///
/// Nothing reaches `backend` unless every pending credential hashed and the merged
/// document passed its invariants. Instance and name checks run before any
/// plaintext is handed to `hasher`.
///
/// # Errors
///
/// Returns [`ConfigError::ImmutableField`], [`ConfigError::DuplicateUserName`],
/// [`ConfigError::HashService`], [`ConfigError::InvalidAuthState`] or
/// [`ConfigError::Commit`].
pub async fn commit(
    current: &Configuration,
    draft: &ValidatedDraft,
    hasher: &dyn CredentialHasher,
    backend: &dyn ConfigBackend,
) -> ConfigResult<Configuration> {
    ensure_instance_unchanged(current, draft.instance())?;
    ensure_unique_names(draft.users().iter().map(ValidatedUser::name))?;

    let hashed = hash_pending(draft, hasher).await?;
    let merged = merge(current, &hashed)?;
    backend
        .set_config(&merged)
        .await
        .map_err(|source| ConfigError::Commit { source })
}

/// Result of a successful submission.
#[derive(Debug)]
pub struct Committed {
    /// Canonical configuration returned by the server.
    pub config: Configuration,
    /// Handle to the scheduled reload.
    pub reload: JoinHandle<()>,
}

/// A single settings editing session.
pub struct SettingsSession {
    current: Configuration,
    draft: Draft,
    deps: SessionDeps,
}

impl SettingsSession {
    /// Open a session over an already-loaded configuration.
    #[must_use]
    pub fn open(current: Configuration, deps: SessionDeps) -> Self {
        let draft = Draft::from_config(&current);
        Self {
            current,
            draft,
            deps,
        }
    }

    /// Fetch the configuration from the backend and open a session over it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Fetch`] when the backend cannot be read.
    pub async fn load(deps: SessionDeps) -> ConfigResult<Self> {
        let current = deps
            .backend
            .get_config()
            .await
            .map_err(|source| ConfigError::Fetch { source })?;
        Ok(Self::open(current, deps))
    }

    /// Canonical configuration the draft is based on.
    #[must_use]
    pub const fn current(&self) -> &Configuration {
        &self.current
    }

    /// Draft being edited.
    #[must_use]
    pub const fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Mutable access for field edits.
    pub const fn draft_mut(&mut self) -> &mut Draft {
        &mut self.draft
    }

    /// Whether the initial-setup notice should be shown.
    #[must_use]
    pub fn needs_initial_setup(&self) -> bool {
        self.current.needs_initial_setup()
    }

    /// Validate, hash, merge and commit the draft.
    ///
    /// On success the server's configuration becomes current, the draft is reseeded
    /// from it and a reload is scheduled. On failure the draft and current
    /// configuration are left exactly as they were.
    ///
    /// # Errors
    ///
    /// Returns the first failing stage: field validation, hashing, document
    /// invariants, or the commit call.
    #[instrument(name = "settings.submit", skip(self), fields(instance = %self.draft.instance()))]
    pub async fn submit(&mut self) -> ConfigResult<Committed> {
        match self.commit_draft().await {
            Ok(config) => {
                info!(instance = %config.instance, users = config.auth.users.len(), "settings committed");
                self.deps
                    .notifier
                    .success(&translate("settings.updated"), SUCCESS_DISPLAY);
                self.draft = Draft::from_config(&config);
                self.current = config.clone();
                let reload = self.schedule_reload();
                Ok(Committed { config, reload })
            }
            Err(err) => {
                if err.is_local() {
                    debug!(error = %err, "settings draft rejected locally");
                } else {
                    warn!(error = ?err, "settings submission failed");
                }
                let detail = err.localized();
                self.deps.notifier.error(
                    &translate_with("alert.operation_error", &[("error", detail.as_str())]),
                    ERROR_DISPLAY,
                );
                Err(err)
            }
        }
    }

    /// Discard the draft without side effects.
    pub fn cancel(self) {
        debug!(instance = %self.draft.instance(), "settings draft discarded");
    }

    async fn commit_draft(&self) -> ConfigResult<Configuration> {
        let validated = validate(&self.draft)?;
        commit(
            &self.current,
            &validated,
            self.deps.hasher.as_ref(),
            self.deps.backend.as_ref(),
        )
        .await
    }

    fn schedule_reload(&self) -> JoinHandle<()> {
        let reloader = Arc::clone(&self.deps.reloader);
        let delay = self.deps.reload_delay;
        tokio::spawn(async move {
            sleep(delay).await;
            if let Err(err) = reloader.reload().await {
                warn!(error = %err, "reload after settings commit failed");
            }
        })
    }
}
