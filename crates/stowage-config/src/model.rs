//! Canonical configuration document as exchanged with the server.
//!
//! # Design
//! - Pure data carriers; only `instance` and `auth` are owned by the editor.
//! - Every other top-level field is kept as raw JSON text in [`Passthrough`] and
//!   written back byte for byte.
//! - User entries on this type are always hashed; pending plaintext lives in the draft.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::{RawValue, to_raw_value};

/// Persisted configuration document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    /// Instance identifier; immutable once non-empty.
    pub instance: String,
    /// Authentication settings.
    pub auth: Auth,
    /// Fields not owned by the settings editor (repos, plans, ...).
    pub passthrough: Passthrough,
}

/// Top-level fields the editor does not own, kept as the exact JSON text received.
#[derive(Debug, Clone, Default)]
pub struct Passthrough(IndexMap<String, Box<RawValue>>);

impl Passthrough {
    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no field is carried.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Field names in document order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Raw JSON text of a field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|raw| raw.get())
    }

    /// Set a field from any serialisable value.
    ///
    /// # Errors
    ///
    /// Returns the serialisation failure of `value`.
    pub fn insert<T: Serialize + ?Sized>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> serde_json::Result<()> {
        self.0.insert(key.into(), to_raw_value(value)?);
        Ok(())
    }
}

impl PartialEq for Passthrough {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .zip(&other.0)
                .all(|((lk, lv), (rk, rv))| lk == rk && lv.get() == rv.get())
    }
}

impl Serialize for Configuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2 + self.passthrough.len()))?;
        map.serialize_entry("instance", &self.instance)?;
        map.serialize_entry("auth", &self.auth)?;
        for (key, value) in &self.passthrough.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Configuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ConfigurationVisitor)
    }
}

struct ConfigurationVisitor;

impl<'de> Visitor<'de> for ConfigurationVisitor {
    type Value = Configuration;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a configuration object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Configuration, A::Error> {
        let mut instance: Option<String> = None;
        let mut auth: Option<Auth> = None;
        let mut passthrough = Passthrough::default();

        while let Some(key) = map.next_key::<String>()? {
            if key == "instance" {
                if instance.is_some() {
                    return Err(de::Error::duplicate_field("instance"));
                }
                instance = Some(map.next_value()?);
            } else if key == "auth" {
                if auth.is_some() {
                    return Err(de::Error::duplicate_field("auth"));
                }
                auth = Some(map.next_value()?);
            } else {
                let value: Box<RawValue> = map.next_value()?;
                if passthrough.0.contains_key(&key) {
                    return Err(de::Error::custom(format_args!("duplicate field `{key}`")));
                }
                passthrough.0.insert(key, value);
            }
        }

        Ok(Configuration {
            instance: instance.unwrap_or_default(),
            auth: auth.unwrap_or_default(),
            passthrough,
        })
    }
}

impl Configuration {
    /// True when no user is configured and authentication is still enabled.
    #[must_use]
    pub fn needs_initial_setup(&self) -> bool {
        self.auth.users.is_empty() && !self.auth.disabled
    }
}

/// Authentication section of the configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auth {
    /// When set, no user is required to reach the interface.
    #[serde(default)]
    pub disabled: bool,
    /// Configured users.
    #[serde(default)]
    pub users: Vec<User>,
}

impl Auth {
    /// Whether authentication can still be satisfied: disabled, or at least one user.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.disabled || !self.users.is_empty()
    }
}

/// A user credential with its one-way password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Login name.
    pub name: String,
    /// Hashed password; never plaintext.
    #[serde(rename = "passwordHash", alias = "passwordBcrypt")]
    pub password_hash: String,
}
