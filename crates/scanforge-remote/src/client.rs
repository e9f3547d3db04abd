// crates/scanforge-remote/src/client.rs
// ============================================================================
// Module: ScanForge Remote Client
// Description: Fail-closed HTTP transport to a remote tool-execution server.
// Purpose: Route a constructed command string to a remote executor.
// Dependencies: reqwest, serde, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! `safe_get`/`safe_post` never return a Rust [`Result`] error to the
//! caller: every failure mode (connection refused, timeout, non-2xx
//! status, unparseable body) is folded into
//! [`RemoteResponse::Failure`], mirroring the original prototype's
//! `KaliToolsClient.safe_get`/`safe_post`, which always returns a
//! dictionary rather than raising.

use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use tracing::debug;
use tracing::error;

/// Default request timeout in seconds (distilled spec §6).
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Errors constructing a [`RemoteClient`].
#[derive(Debug, Error)]
pub enum RemoteClientError {
    /// The underlying HTTP client could not be built.
    #[error("remote client build failed: {0}")]
    Build(String),
}

/// Outcome of a remote request.
///
/// # Invariants
/// - `Failure` always carries `success = false`, matching the
///   original prototype's `{"error": ..., "success": False}` shape.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteResponse {
    /// The server responded with a 2xx status and a parseable JSON body.
    Value(Value),
    /// The request failed before or while reading a usable response.
    Failure {
        /// Human-readable failure reason.
        error: String,
        /// Always `false`; present for wire-shape parity with the original.
        success: bool,
    },
}

impl RemoteResponse {
    /// Builds a failure response with `success = false`.
    fn failure(error: impl Into<String>) -> Self {
        Self::Failure { error: error.into(), success: false }
    }

    /// Returns `true` if this response carries a transport-level value.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Renders this response as the JSON value a caller would see on the
    /// wire (the raw server body on success, or the fail-closed
    /// `{error, success}` object on failure).
    #[must_use]
    pub fn into_json(self) -> Value {
        match self {
            Self::Value(value) => value,
            Self::Failure { error, success } => json!({ "error": error, "success": success }),
        }
    }
}

/// HTTP client routing adapter commands to a remote execution server.
pub struct RemoteClient {
    /// Base server URL with any trailing slash stripped.
    server_url: String,
    /// Underlying async HTTP client.
    client: reqwest::Client,
}

impl RemoteClient {
    /// Builds a client targeting `server_url` with the default 300s timeout.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteClientError`] when the HTTP client cannot be built.
    pub fn new(server_url: impl Into<String>) -> Result<Self, RemoteClientError> {
        Self::with_timeout(server_url, DEFAULT_REQUEST_TIMEOUT_SECS)
    }

    /// Builds a client targeting `server_url` with an explicit timeout.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteClientError`] when the HTTP client cannot be built.
    pub fn with_timeout(server_url: impl Into<String>, timeout_secs: u64) -> Result<Self, RemoteClientError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|err| RemoteClientError::Build(err.to_string()))?;
        let server_url = server_url.into();
        Ok(Self { server_url: server_url.trim_end_matches('/').to_string(), client })
    }

    /// Performs a `GET` against `endpoint`, folding every failure into
    /// [`RemoteResponse::Failure`] rather than returning an `Err`.
    pub async fn safe_get(&self, endpoint: &str, params: &[(&str, &str)]) -> RemoteResponse {
        let url = format!("{}/{endpoint}", self.server_url);
        debug!(%url, "GET");
        let response = match self.client.get(&url).query(params).send().await {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, "request failed");
                return RemoteResponse::failure(format!("Request failed: {err}"));
            }
        };
        parse_response(response).await
    }

    /// Performs a `POST` of `json_data` against `endpoint`, folding every
    /// failure into [`RemoteResponse::Failure`] rather than returning an `Err`.
    pub async fn safe_post(&self, endpoint: &str, json_data: &Value) -> RemoteResponse {
        let url = format!("{}/{endpoint}", self.server_url);
        debug!(%url, "POST");
        let response = match self.client.post(&url).json(json_data).send().await {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, "request failed");
                return RemoteResponse::failure(format!("Request failed: {err}"));
            }
        };
        parse_response(response).await
    }

    /// Posts `command` to `api/command` on the remote server.
    pub async fn execute_command(&self, command: &str) -> RemoteResponse {
        self.safe_post("api/command", &json!({ "command": command })).await
    }

    /// Gets `health` on the remote server.
    pub async fn check_health(&self) -> RemoteResponse {
        self.safe_get("health", &[]).await
    }
}

/// Validates the status and parses the JSON body of a response, folding
/// both non-2xx statuses and undecodable bodies into a failure.
async fn parse_response(response: reqwest::Response) -> RemoteResponse {
    let response = match response.error_for_status() {
        Ok(response) => response,
        Err(err) => {
            error!(error = %err, "request failed");
            return RemoteResponse::failure(format!("Request failed: {err}"));
        }
    };
    match response.json::<Value>().await {
        Ok(value) => RemoteResponse::Value(value),
        Err(err) => {
            error!(error = %err, "unexpected error");
            RemoteResponse::failure(format!("Unexpected error: {err}"))
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::*;

    #[test]
    fn server_url_trailing_slash_is_stripped() {
        let client = RemoteClient::new("http://localhost:8000/").expect("client builds");
        assert_eq!(client.server_url, "http://localhost:8000");
    }

    #[tokio::test]
    async fn connection_refused_is_folded_into_a_failure_response() {
        let client = RemoteClient::with_timeout("http://127.0.0.1:1", 1).expect("client builds");
        let response = client.check_health().await;
        assert!(!response.is_success());
        match response {
            RemoteResponse::Failure { success, .. } => assert!(!success),
            RemoteResponse::Value(_) => panic!("expected a failure response"),
        }
    }

    #[test]
    fn failure_into_json_matches_original_prototype_shape() {
        let response = RemoteResponse::failure("boom");
        let value = response.into_json();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "boom");
    }
}
