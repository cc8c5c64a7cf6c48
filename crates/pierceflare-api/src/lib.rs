// # PierceFlare API Client
//
// This crate provides the PierceFlare management API client used by the
// runner to validate its token and submit IP updates.
//
// ## Implementation
//
// - One HTTP request per call, bounded by a 10 second timeout
// - Full error propagation to the runner (no retry, no backoff here)
// - Bearer token authentication on every request
// - Specific error mapping for HTTP status codes (401/403, 429, other)
// - Structured `{errCode, message}` error bodies are parsed when present
//
// ## Security Requirements
//
// - API token NEVER appears in logs or `Debug` output
// - Client MUST fail fast if token is empty
//
// ## API Reference
//
// - Token check: GET `/api/infos` -> text domain bound to the token
// - Update: PUT `/api/flare` `{ "ip": "1.2.3.4", "dummy": true }`
//   -> `{ "op": "batch" | "dummy", "resolvedIp": "1.2.3.4" }`

use async_trait::async_trait;
use pierceflare_core::traits::{FlareApi, FlareReceipt};
use pierceflare_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Token validation endpoint
pub const ENDPOINT_GET_INFOS: &str = "/api/infos";

/// Update submission endpoint
pub const ENDPOINT_PUT_FLARE: &str = "/api/flare";

/// Default HTTP timeout for API requests (10 seconds)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest response body snippet kept in errors
const MAX_BODY_SNIPPET: usize = 200;

/// Body of `PUT /api/flare`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlareRequest {
    /// Address to report
    pub ip: String,

    /// Heartbeat flag, omitted when false
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub dummy: bool,
}

/// Structured error body returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    /// Machine-readable error code, e.g. `UNRESOLVABLE`
    pub err_code: String,
    /// Human-readable message
    pub message: String,
}

/// PierceFlare API client
///
/// Stateless and single-shot. Retries are owned by the runner: a failed
/// update is retried on the next tick.
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API token.
pub struct PierceFlareClient {
    /// Bearer token
    /// ⚠️ NEVER log this value
    api_key: String,

    /// Base URL, without trailing slash
    server_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for PierceFlareClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PierceFlareClient")
            .field("api_key", &"<REDACTED>")
            .field("server_url", &self.server_url)
            .finish()
    }
}

impl PierceFlareClient {
    /// Create a new API client
    ///
    /// # Parameters
    ///
    /// - `api_key`: Bearer token issued by the PierceFlare server
    /// - `server_url`: Base URL of the server (trailing `/` is ignored)
    pub fn new(api_key: impl Into<String>, server_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(api_key, server_url, DEFAULT_HTTP_TIMEOUT)
    }

    /// Create a new API client with a custom request timeout
    pub fn with_timeout(
        api_key: impl Into<String>,
        server_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::config("PierceFlare API token cannot be empty"));
        }

        let server_url = server_url.into().trim_end_matches('/').to_string();
        if server_url.is_empty() {
            return Err(Error::config("PierceFlare server URL cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pierceflare-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            server_url,
            client,
        })
    }

    /// Base URL requests are sent to
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.server_url, endpoint)
    }

    /// Turn a non-2xx response into an error
    async fn error_from(response: reqwest::Response) -> Error {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());

        let (err_code, message) = match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(parsed) => (Some(parsed.err_code), parsed.message),
            Err(_) => (None, snippet(&body)),
        };

        tracing::error!(
            status = status.as_u16(),
            "Request failed (HTTP {}): {}",
            status.as_u16(),
            message
        );

        match status.as_u16() {
            401 | 403 => Error::auth(format!(
                "Invalid API token or insufficient permissions (HTTP {}): {}",
                status.as_u16(),
                message
            )),
            429 => Error::rate_limited(format!(
                "Too many requests, retry later (HTTP {}): {}",
                status.as_u16(),
                message
            )),
            code => Error::api(code, err_code, message),
        }
    }
}

#[async_trait]
impl FlareApi for PierceFlareClient {
    /// Validate the token
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /api/infos
    /// Authorization: Bearer <token>
    /// ```
    async fn check_token(&self) -> Result<String> {
        let url = self.url(ENDPOINT_GET_INFOS);
        tracing::debug!("Checking token validity against {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| Error::http(format!("Request to {} failed: {}", url, e)))?;

        tracing::debug!("HTTP response code: {}", response.status().as_u16());

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let domain = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response: {}", e)))?;

        Ok(domain.trim().to_string())
    }

    /// Submit an IP update
    ///
    /// # API Call
    ///
    /// ```http
    /// PUT /api/flare
    /// Authorization: Bearer <token>
    /// Content-Type: application/json
    ///
    /// { "ip": "1.2.3.4", "dummy": true }
    /// ```
    async fn send_flare(&self, ip: IpAddr, dummy: bool) -> Result<Option<FlareReceipt>> {
        let url = self.url(ENDPOINT_PUT_FLARE);
        let payload = FlareRequest {
            ip: ip.to_string(),
            dummy,
        };

        tracing::debug!(
            "Sending {} to {}: {}",
            if dummy { "dummy update" } else { "update" },
            url,
            serde_json::to_string(&payload)?
        );

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::http(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        tracing::debug!("HTTP response code: {}", status.as_u16());

        if !status.is_success() {
            return Err(Self::error_from(response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response: {}", e)))?;

        match serde_json::from_str::<FlareReceipt>(&body) {
            Ok(receipt) => Ok(Some(receipt)),
            Err(_) => {
                tracing::debug!(
                    "Update accepted (HTTP {}) with unrecognized body: {}",
                    status.as_u16(),
                    snippet(&body)
                );
                Ok(None)
            }
        }
    }
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_BODY_SNIPPET) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
