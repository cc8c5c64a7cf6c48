// # HTTP IP Resolver
//
// This crate provides the IP resolver used by the PierceFlare client.
//
// ## Strategy
//
// Queries a fixed, ordered list of plaintext IP-echo services and returns
// the first answer that parses as an IPv4 or IPv6 literal:
//
// - Services are tried in priority order, one at a time (never raced)
// - Each request is bounded by a 5 second timeout
// - A failing service (transport error, non-2xx, bad body) is logged and
//   the next one is tried; there is no retry within a service
// - If every service fails, the result is `Error::NoAddressFound`

use async_trait::async_trait;
use pierceflare_core::traits::IpResolver;
use pierceflare_core::{Error, Result};

use std::net::IpAddr;
use std::time::Duration;

/// Default IP-echo services, in priority order
pub const DEFAULT_IP_SERVICES: &[&str] = &[
    "https://ifconfig.me/ip", // Plain text IP
    "https://api.ipify.org", // Plain text IP
    "https://icanhazip.com", // Plain text IP, trailing newline
];

/// Per-request timeout for IP-echo services
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest body snippet kept in logs
const MAX_SNIPPET_LEN: usize = 64;

/// Why a single service did not produce an address
#[derive(Debug)]
enum ServiceFailure {
    Transport(String),
    Status(u16),
    InvalidPayload(String),
}

impl std::fmt::Display for ServiceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceFailure::Transport(e) => write!(f, "request failed: {}", e),
            ServiceFailure::Status(status) => write!(f, "HTTP status {}", status),
            ServiceFailure::InvalidPayload(snippet) => {
                write!(f, "invalid IP payload: {:?}", snippet)
            }
        }
    }
}

/// IP resolver over a prioritized list of HTTP IP-echo services
#[derive(Debug, Clone)]
pub struct HttpIpResolver {
    /// Service URLs, in priority order
    services: Vec<String>,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpResolver {
    /// Create a resolver over [`DEFAULT_IP_SERVICES`]
    pub fn new() -> Result<Self> {
        Self::with_services(DEFAULT_IP_SERVICES.iter().map(|s| s.to_string()))
    }

    /// Create a resolver over custom services
    ///
    /// # Parameters
    ///
    /// - `services`: URLs returning the caller's IP as plain text, in
    ///   priority order
    pub fn with_services<I, S>(services: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_timeout(services, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a resolver over custom services with a custom timeout
    pub fn with_timeout<I, S>(services: I, timeout: Duration) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let services: Vec<String> = services.into_iter().map(Into::into).collect();
        if services.is_empty() {
            return Err(Error::config("At least one IP service is required"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pierceflare-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { services, client })
    }

    /// Configured services, in priority order
    pub fn services(&self) -> &[String] {
        &self.services
    }

    /// Query a single service
    async fn query(&self, url: &str) -> std::result::Result<IpAddr, ServiceFailure> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ServiceFailure::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceFailure::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ServiceFailure::Transport(format!("failed to read body: {}", e)))?;

        parse_ip(&body).ok_or_else(|| ServiceFailure::InvalidPayload(snippet(&body)))
    }
}

#[async_trait]
impl IpResolver for HttpIpResolver {
    async fn resolve(&self) -> Result<IpAddr> {
        for service in &self.services {
            tracing::debug!(service = %service, "Querying IP service");

            match self.query(service).await {
                Ok(ip) => {
                    tracing::debug!(service = %service, ip = %ip, "IP resolved");
                    return Ok(ip);
                }
                Err(failure) => {
                    tracing::warn!(service = %service, "IP service failed: {}", failure);
                }
            }
        }

        tracing::error!("Failed to retrieve IP from all services");
        Err(Error::NoAddressFound {
            attempts: self.services.len(),
        })
    }

    fn resolver_name(&self) -> &'static str {
        "http"
    }
}

/// Parse a trimmed IP-echo body as an IPv4 or IPv6 literal
pub fn parse_ip(body: &str) -> Option<IpAddr> {
    body.trim().parse().ok()
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_SNIPPET_LEN) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
