//! HTTP implementations of the configuration store and hash service.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use stowage_config::{ConfigBackend, Configuration, CredentialHasher};
use url::Url;

use crate::client::RemoteProblem;

const CONFIG_PATH: &str = "/v1/config";
const HASH_PATH: &str = "/v1/auth/hash-password";

fn endpoint(base_url: &Url, path: &str) -> Result<Url> {
    base_url
        .join(path)
        .with_context(|| format!("invalid base URL {base_url}"))
}

/// Configuration store served by a Stowage instance.
#[derive(Debug, Clone)]
pub(crate) struct HttpConfigBackend {
    client: Client,
    base_url: Url,
}

impl HttpConfigBackend {
    pub(crate) const fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl ConfigBackend for HttpConfigBackend {
    async fn get_config(&self) -> Result<Configuration> {
        let response = self
            .client
            .get(endpoint(&self.base_url, CONFIG_PATH)?)
            .send()
            .await
            .with_context(|| format!("request to {CONFIG_PATH} failed"))?;
        if !response.status().is_success() {
            return Err(RemoteProblem::from_response(response).await.into());
        }
        response
            .json::<Configuration>()
            .await
            .context("failed to parse configuration")
    }

    async fn set_config(&self, config: &Configuration) -> Result<Configuration> {
        let response = self
            .client
            .put(endpoint(&self.base_url, CONFIG_PATH)?)
            .json(config)
            .send()
            .await
            .with_context(|| format!("request to {CONFIG_PATH} failed"))?;
        if !response.status().is_success() {
            return Err(RemoteProblem::from_response(response).await.into());
        }
        response
            .json::<Configuration>()
            .await
            .context("failed to parse accepted configuration")
    }
}

#[derive(Serialize, Deserialize)]
struct HashPayload {
    value: String,
}

/// Server-side password hashing endpoint.
#[derive(Debug, Clone)]
pub(crate) struct HttpHasher {
    client: Client,
    base_url: Url,
}

impl HttpHasher {
    pub(crate) const fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl CredentialHasher for HttpHasher {
    async fn hash(&self, plaintext: &str) -> Result<String> {
        let response = self
            .client
            .post(endpoint(&self.base_url, HASH_PATH)?)
            .json(&HashPayload {
                value: plaintext.to_string(),
            })
            .send()
            .await
            .with_context(|| format!("request to {HASH_PATH} failed"))?;
        if !response.status().is_success() {
            return Err(RemoteProblem::from_response(response).await.into());
        }
        let body = response
            .json::<HashPayload>()
            .await
            .context("failed to parse hash response")?;
        anyhow::ensure!(!body.value.is_empty(), "hash service returned an empty value");
        Ok(body.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use stowage_config::ConfigError;
    use stowage_test_support::fixtures::configured_config;

    fn base_url(server: &MockServer) -> Result<Url> {
        server
            .base_url()
            .parse()
            .map_err(|_| anyhow::anyhow!("valid URL"))
    }

    #[tokio::test]
    async fn get_and_put_config_round_trip_through_server() -> Result<()> {
        let server = MockServer::start_async().await;
        let stored = serde_json::to_value(configured_config())?;
        let get = server.mock(|when, then| {
            when.method(GET).path("/v1/config");
            then.status(200).json_body(stored.clone());
        });
        let mut accepted = stored.clone();
        accepted["modno"] = json!(8);
        let put = server.mock(|when, then| {
            when.method(PUT)
                .path("/v1/config")
                .json_body(stored.clone());
            then.status(200).json_body(accepted.clone());
        });

        let backend = HttpConfigBackend::new(Client::new(), base_url(&server)?);
        let config = backend.get_config().await?;
        assert_eq!(config, configured_config());
        let returned = backend.set_config(&config).await?;
        assert_eq!(returned.passthrough.get("modno"), Some("8"));

        get.assert();
        put.assert();
        Ok(())
    }

    #[tokio::test]
    async fn rejected_put_carries_problem_status() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(PUT).path("/v1/config");
            then.status(409).json_body(json!({
                "title": "conflict",
                "status": 409,
                "detail": "config modno mismatch"
            }));
        });

        let backend = HttpConfigBackend::new(Client::new(), base_url(&server)?);
        let err = backend
            .set_config(&configured_config())
            .await
            .unwrap_err();
        let problem = err
            .downcast_ref::<RemoteProblem>()
            .ok_or_else(|| anyhow::anyhow!("expected a remote problem"))?;
        assert!(problem.is_rejection());

        let cli_err = crate::client::CliError::from(ConfigError::Commit { source: err });
        assert_eq!(cli_err.exit_code(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn hasher_posts_plaintext_and_returns_hash() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/auth/hash-password")
                .json_body(json!({"value": "secret123"}));
            then.status(200)
                .json_body(json!({"value": "$argon2id$v=19$stub"}));
        });

        let hasher = HttpHasher::new(Client::new(), base_url(&server)?);
        assert_eq!(hasher.hash("secret123").await?, "$argon2id$v=19$stub");
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn hasher_surfaces_server_errors() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/v1/auth/hash-password");
            then.status(500).body("boom");
        });

        let hasher = HttpHasher::new(Client::new(), base_url(&server)?);
        let err = hasher.hash("pw").await.unwrap_err();
        assert!(format!("{err:#}").contains("boom"));
        Ok(())
    }
}
