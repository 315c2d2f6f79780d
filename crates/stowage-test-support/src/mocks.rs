//! Fake collaborators for exercising a settings session without IO.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use stowage_config::{
    ConfigBackend, Configuration, CredentialHasher, Notifier, Reloader, SessionDeps,
};

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Server response hook: maps the submitted document to the returned one.
pub type Canonicalize = fn(Configuration) -> Configuration;

/// In-memory backend recording every submitted document.
#[derive(Debug)]
pub struct RecordingBackend {
    current: Mutex<Configuration>,
    sent: Mutex<Vec<Configuration>>,
    failure: Mutex<Option<String>>,
    canonicalize: Option<Canonicalize>,
}

impl RecordingBackend {
    /// Backend serving `current`.
    #[must_use]
    pub fn new(current: Configuration) -> Self {
        Self {
            current: Mutex::new(current),
            sent: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            canonicalize: None,
        }
    }

    /// Apply `canonicalize` to accepted documents before returning them.
    #[must_use]
    pub fn with_canonicalize(mut self, canonicalize: Canonicalize) -> Self {
        self.canonicalize = Some(canonicalize);
        self
    }

    /// Make subsequent `set_config` calls fail with `message` (or succeed with `None`).
    pub fn fail_with(&self, message: Option<&str>) {
        *locked(&self.failure) = message.map(ToString::to_string);
    }

    /// Documents passed to `set_config`, including rejected ones.
    #[must_use]
    pub fn sent(&self) -> Vec<Configuration> {
        locked(&self.sent).clone()
    }

    /// Document the backend currently holds.
    #[must_use]
    pub fn current(&self) -> Configuration {
        locked(&self.current).clone()
    }
}

#[async_trait]
impl ConfigBackend for RecordingBackend {
    async fn get_config(&self) -> Result<Configuration> {
        Ok(self.current())
    }

    async fn set_config(&self, config: &Configuration) -> Result<Configuration> {
        locked(&self.sent).push(config.clone());
        if let Some(message) = locked(&self.failure).clone() {
            bail!(message);
        }
        let accepted = self
            .canonicalize
            .map_or_else(|| config.clone(), |f| f(config.clone()));
        *locked(&self.current) = accepted.clone();
        Ok(accepted)
    }
}

/// Deterministic hasher returning `h:<plaintext>`.
#[derive(Debug, Default)]
pub struct PrefixHasher {
    calls: Mutex<Vec<String>>,
    fail_on: Mutex<Option<String>>,
}

impl PrefixHasher {
    /// Fail when asked to hash `plaintext` (or never with `None`).
    pub fn fail_on(&self, plaintext: Option<&str>) {
        *locked(&self.fail_on) = plaintext.map(ToString::to_string);
    }

    /// Plaintexts received, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        locked(&self.calls).clone()
    }
}

#[async_trait]
impl CredentialHasher for PrefixHasher {
    async fn hash(&self, plaintext: &str) -> Result<String> {
        locked(&self.calls).push(plaintext.to_string());
        if locked(&self.fail_on).as_deref() == Some(plaintext) {
            return Err(anyhow!("hash service unavailable"));
        }
        Ok(format!("h:{plaintext}"))
    }
}

/// Notifier capturing messages and their display durations.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    successes: Mutex<Vec<(String, Duration)>>,
    errors: Mutex<Vec<(String, Duration)>>,
}

impl RecordingNotifier {
    /// Success notifications received.
    #[must_use]
    pub fn successes(&self) -> Vec<(String, Duration)> {
        locked(&self.successes).clone()
    }

    /// Error alerts received.
    #[must_use]
    pub fn errors(&self) -> Vec<(String, Duration)> {
        locked(&self.errors).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str, display_for: Duration) {
        locked(&self.successes).push((message.to_string(), display_for));
    }

    fn error(&self, message: &str, display_for: Duration) {
        locked(&self.errors).push((message.to_string(), display_for));
    }
}

/// Reloader counting how often it ran.
#[derive(Debug, Default)]
pub struct CountingReloader {
    count: AtomicUsize,
}

impl CountingReloader {
    /// Number of completed reloads.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Reloader for CountingReloader {
    async fn reload(&self) -> Result<()> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// All fakes wired together, with handles kept for assertions.
#[derive(Debug, Clone)]
pub struct FakeStack {
    /// Backend fake.
    pub backend: Arc<RecordingBackend>,
    /// Hasher fake.
    pub hasher: Arc<PrefixHasher>,
    /// Notifier fake.
    pub notifier: Arc<RecordingNotifier>,
    /// Reloader fake.
    pub reloader: Arc<CountingReloader>,
}

impl FakeStack {
    /// Stack whose backend serves `current`.
    #[must_use]
    pub fn new(current: Configuration) -> Self {
        Self::with_backend(RecordingBackend::new(current))
    }

    /// Stack around a preconfigured backend.
    #[must_use]
    pub fn with_backend(backend: RecordingBackend) -> Self {
        Self {
            backend: Arc::new(backend),
            hasher: Arc::new(PrefixHasher::default()),
            notifier: Arc::new(RecordingNotifier::default()),
            reloader: Arc::new(CountingReloader::default()),
        }
    }

    /// Session dependencies with a 1 ms reload delay.
    #[must_use]
    pub fn deps(&self) -> SessionDeps {
        let mut deps = SessionDeps::new(
            self.backend.clone(),
            self.hasher.clone(),
            self.notifier.clone(),
            self.reloader.clone(),
        );
        deps.reload_delay = Duration::from_millis(1);
        deps
    }
}
