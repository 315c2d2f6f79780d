//! Sample configuration documents.

use serde_json::json;
use stowage_config::Configuration;

/// A server that has never been set up: no instance id, no users.
///
/// Carries one pass-through field (`otherField`).
#[must_use]
pub fn blank_config() -> Configuration {
    parse(json!({
        "instance": "",
        "auth": {"disabled": false, "users": []},
        "otherField": "X"
    }))
}

/// A configured server with one user and several pass-through sections.
#[must_use]
pub fn configured_config() -> Configuration {
    parse(json!({
        "modno": 7,
        "instance": "home-1",
        "repos": [
            {"id": "nas", "uri": "sftp://nas/backups", "env": ["RESTIC_PASSWORD_FILE=/run/pw"]}
        ],
        "plans": [
            {"id": "daily", "repo": "nas", "paths": ["/home"], "schedule": {"cron": "0 3 * * *"}}
        ],
        "auth": {
            "disabled": false,
            "users": [{"name": "alice", "passwordHash": "$argon2id$v=19$alice"}]
        }
    }))
}

fn parse(value: serde_json::Value) -> Configuration {
    serde_json::from_value(value).unwrap_or_else(|err| panic!("fixture should parse: {err}"))
}
