//! Shared client utilities and error types for the CLI.

use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use anyhow::anyhow;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use stowage_config::ConfigError;
use url::Url;

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub(crate) const DEFAULT_API_URL: &str = "http://127.0.0.1:9898";

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.display_message())
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        let rejected_by_server = match &err {
            ConfigError::Commit { source } | ConfigError::Fetch { source } => source
                .downcast_ref::<RemoteProblem>()
                .is_some_and(RemoteProblem::is_rejection),
            _ => false,
        };
        if err.is_local() || rejected_by_server {
            Self::Validation(err.localized())
        } else {
            Self::Failure(anyhow!(err.localized()))
        }
    }
}

/// Dependencies constructed from CLI options.
#[derive(Clone)]
pub(crate) struct CliDependencies {
    pub(crate) client: Client,
}

impl CliDependencies {
    /// Construct an HTTP client tagging every request with `trace_id`.
    pub(crate) fn new(timeout_secs: u64, trace_id: &str) -> CliResult<Self> {
        let mut default_headers = HeaderMap::new();
        let request_id = HeaderValue::from_str(trace_id).map_err(|_| {
            CliError::failure(anyhow!("trace identifier contains invalid characters"))
        })?;
        default_headers.insert(HEADER_REQUEST_ID, request_id);

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))?;

        Ok(Self { client })
    }
}

/// Parse the API URL provided to the CLI.
pub(crate) fn parse_url(input: &str) -> Result<Url, String> {
    input
        .parse::<Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))
}

/// RFC 9457 problem body returned by the server on failure.
#[derive(Debug, Deserialize)]
struct ProblemDetails {
    title: String,
    status: u16,
    #[serde(default)]
    detail: Option<String>,
}

/// Non-success HTTP response, carried inside `anyhow` errors from the remote seams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RemoteProblem {
    pub(crate) status: StatusCode,
    pub(crate) message: String,
}

impl RemoteProblem {
    /// Whether the server refused the request content rather than failing.
    pub(crate) fn is_rejection(&self) -> bool {
        matches!(
            self.status,
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY
        )
    }

    /// Read a failed response body into a problem description.
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let bytes = response.bytes().await.unwrap_or_default();
        let body_text = String::from_utf8_lossy(&bytes).trim().to_string();
        let problem = serde_json::from_slice::<ProblemDetails>(&bytes).ok();

        let message = match problem {
            Some(ProblemDetails {
                detail: Some(detail),
                status,
                ..
            }) => format!("{detail} (status {status})"),
            Some(ProblemDetails { title, status, .. }) => format!("{title} (status {status})"),
            None if !body_text.is_empty() => format!("{body_text} (status {status})"),
            None => format!("request failed with status {status}"),
        };
        Self { status, message }
    }
}

impl Display for RemoteProblem {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.message)
    }
}

impl std::error::Error for RemoteProblem {}
