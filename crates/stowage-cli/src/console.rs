//! Terminal notifier and the reload step run after a commit.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use stowage_config::{ConfigBackend, Notifier, Reloader};
use stowage_i18n::translate;
use tracing::debug;

/// Writes success notifications to stderr so stdout stays machine-readable.
///
/// Failure alerts are only logged; the exit path prints the error once.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn success(&self, message: &str, display_for: Duration) {
        debug!(?display_for, "success notification");
        eprintln!("{message}");
    }

    fn error(&self, message: &str, display_for: Duration) {
        debug!(?display_for, alert = message, "error notification");
    }
}

/// Re-reads the configuration so the process observes the server's accepted state.
pub(crate) struct RefetchReloader {
    backend: Arc<dyn ConfigBackend>,
}

impl RefetchReloader {
    pub(crate) fn new(backend: Arc<dyn ConfigBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Reloader for RefetchReloader {
    async fn reload(&self) -> Result<()> {
        let config = self.backend.get_config().await?;
        debug!(instance = %config.instance, users = config.auth.users.len(), "configuration reloaded");
        eprintln!("{}", translate("settings.reloaded"));
        Ok(())
    }
}
