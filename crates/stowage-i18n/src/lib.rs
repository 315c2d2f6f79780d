#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![warn(
    missing_docs,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]

//! Process-wide translation registry backed by JSON dictionaries.
//!
//! # Design
//! - The registry is built once at startup from an [`I18nConfig`] and never mutated.
//! - Lookups never fail: active locale, then fallback locale, then the key itself.
//! - Until [`init`] runs, lookups resolve against the bundled English dictionary.

use std::collections::HashMap;
use std::sync::{LazyLock, OnceLock};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Locales shipped with the bundled dictionaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocaleCode {
    /// English.
    En,
    /// Chinese (Simplified).
    Zh,
}

impl LocaleCode {
    /// All bundled locales in display order.
    #[must_use]
    pub const fn all() -> [Self; 2] {
        [Self::En, Self::Zh]
    }

    /// Two-letter code used as the dictionary key.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Zh => "zh",
        }
    }

    /// Map an arbitrary language tag (`zh-CN`, `en_US.UTF-8`) to a bundled locale.
    #[must_use]
    pub fn from_lang_tag(tag: &str) -> Option<Self> {
        let lowered = tag.trim().to_ascii_lowercase();
        let base = lowered.split(['-', '_', '.']).next().unwrap_or_default();
        Self::all()
            .iter()
            .copied()
            .find(|locale| locale.code() == base)
    }

    /// Detect the user's locale from `LC_ALL`, `LC_MESSAGES` and `LANG`.
    #[must_use]
    pub fn detect() -> Option<Self> {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find_map(|value| Self::from_lang_tag(&value))
    }

    const fn raw_dictionary(self) -> &'static str {
        match self {
            Self::En => include_str!("../i18n/en.json"),
            Self::Zh => include_str!("../i18n/zh.json"),
        }
    }

    fn dictionary(self) -> Result<Value, I18nError> {
        serde_json::from_str(self.raw_dictionary()).map_err(|source| {
            I18nError::InvalidDictionary {
                locale: self.code().to_string(),
                source,
            }
        })
    }
}

/// Default fallback locale.
pub const DEFAULT_LOCALE: LocaleCode = LocaleCode::En;

/// Errors raised while building or installing the registry.
#[derive(Debug, Error)]
pub enum I18nError {
    /// [`init`] was called after the registry had already been installed.
    #[error("localization registry already initialised")]
    AlreadyInitialized,
    /// The configured fallback locale has no dictionary.
    #[error("no dictionary for fallback locale '{locale}'")]
    UnknownFallback {
        /// Fallback locale requested by the caller.
        locale: String,
    },
    /// A dictionary payload was not valid JSON.
    #[error("invalid dictionary for locale '{locale}'")]
    InvalidDictionary {
        /// Locale whose dictionary failed to parse.
        locale: String,
        /// Parse failure.
        source: serde_json::Error,
    },
}

/// Options recognised when building the registry.
#[derive(Debug, Clone)]
pub struct I18nConfig {
    /// Locale consulted when the active locale lacks a key.
    pub fallback_locale: String,
    /// Locale consulted first.
    pub active_locale: String,
    /// Dictionary trees keyed by locale code; keys are resolved as dotted paths.
    pub dictionaries: HashMap<String, Value>,
}

impl I18nConfig {
    /// Configuration using the bundled dictionaries with English as fallback.
    ///
    /// # Errors
    ///
    /// Returns [`I18nError::InvalidDictionary`] when a bundled dictionary does not parse.
    pub fn bundled(active: LocaleCode) -> Result<Self, I18nError> {
        let dictionaries: HashMap<String, Value> = LocaleCode::all()
            .into_iter()
            .map(|locale| Ok((locale.code().to_string(), locale.dictionary()?)))
            .collect::<Result<_, I18nError>>()?;
        Ok(Self {
            fallback_locale: DEFAULT_LOCALE.code().to_string(),
            active_locale: active.code().to_string(),
            dictionaries,
        })
    }

    /// Add or replace a dictionary from its JSON source.
    ///
    /// # Errors
    ///
    /// Returns [`I18nError::InvalidDictionary`] when `json` does not parse.
    pub fn with_dictionary(mut self, locale: &str, json: &str) -> Result<Self, I18nError> {
        let tree = serde_json::from_str(json).map_err(|source| I18nError::InvalidDictionary {
            locale: locale.to_string(),
            source,
        })?;
        self.dictionaries.insert(locale.to_string(), tree);
        Ok(self)
    }
}

/// Immutable lookup table built from an [`I18nConfig`].
#[derive(Debug)]
pub struct Registry {
    active: Value,
    fallback: Value,
    active_locale: String,
}

impl Registry {
    /// Build a registry, checking the fallback locale exists.
    ///
    /// # Errors
    ///
    /// Returns [`I18nError::UnknownFallback`] when the fallback dictionary is missing.
    pub fn new(mut config: I18nConfig) -> Result<Self, I18nError> {
        let fallback = config
            .dictionaries
            .get(&config.fallback_locale)
            .cloned()
            .ok_or_else(|| I18nError::UnknownFallback {
                locale: config.fallback_locale.clone(),
            })?;
        let active = config
            .dictionaries
            .remove(&config.active_locale)
            .unwrap_or(Value::Null);
        Ok(Self {
            active,
            fallback,
            active_locale: config.active_locale,
        })
    }

    /// Resolve a dotted key; falls back to the fallback locale, then the key itself.
    #[must_use]
    pub fn text(&self, key: &str) -> String {
        resolve(&self.active, key)
            .or_else(|| resolve(&self.fallback, key))
            .unwrap_or_else(|| key.to_string())
    }

    /// Resolve a key and substitute `{{name}}` placeholders.
    #[must_use]
    pub fn text_with(&self, key: &str, args: &[(&str, &str)]) -> String {
        interpolate(self.text(key), args)
    }

    /// Locale consulted first.
    #[must_use]
    pub fn active_locale(&self) -> &str {
        &self.active_locale
    }
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

// Lookups echo keys if the bundled English dictionary is malformed.
static BUNDLED: LazyLock<Registry> = LazyLock::new(|| Registry {
    active: Value::Null,
    fallback: DEFAULT_LOCALE.dictionary().unwrap_or(Value::Null),
    active_locale: DEFAULT_LOCALE.code().to_string(),
});

/// Install the process-wide registry. Only the first call succeeds.
///
/// # Errors
///
/// Returns an error when the configuration is invalid or a registry is already installed.
pub fn init(config: I18nConfig) -> Result<(), I18nError> {
    let registry = Registry::new(config)?;
    let locale = registry.active_locale.clone();
    REGISTRY
        .set(registry)
        .map_err(|_| I18nError::AlreadyInitialized)?;
    tracing::debug!(locale = %locale, "localization registry initialised");
    Ok(())
}

/// The installed registry, or the bundled English registry before [`init`].
#[must_use]
pub fn registry() -> &'static Registry {
    REGISTRY.get().unwrap_or(&BUNDLED)
}

/// Look up a display string for `key` in the active locale.
#[must_use]
pub fn translate(key: &str) -> String {
    registry().text(key)
}

/// Look up a display string and substitute `{{name}}` placeholders.
#[must_use]
pub fn translate_with(key: &str, args: &[(&str, &str)]) -> String {
    registry().text_with(key, args)
}

fn resolve(tree: &Value, path: &str) -> Option<String> {
    let mut node = tree;
    for segment in path.split('.') {
        node = node.get(segment)?;
    }
    node.as_str().map(ToString::to_string)
}

fn interpolate(template: String, args: &[(&str, &str)]) -> String {
    args.iter().fold(template, |text, (name, value)| {
        text.replace(&format!("{{{{{name}}}}}"), value)
    })
}
