// # Flare API Trait
//
// Defines the interface to the PierceFlare management API.
//
// ## Implementations
//
// - Bearer-token HTTP client: `pierceflare-api` crate
//
// ## Endpoints
//
// - `GET /api/infos`: token validation, answers with the token's domain
// - `PUT /api/flare`: `{ "ip": "1.2.3.4", "dummy": true }` update submission

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// How the server queued a flare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteOperation {
    /// Queued for propagation to DNS
    Batch,
    /// Acknowledged as a heartbeat, not propagated
    Dummy,
}

/// Body of a successful `PUT /api/flare`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlareReceipt {
    /// Operation the server queued
    pub op: RemoteOperation,
    /// Address the server decided to use
    pub resolved_ip: String,
}

/// Trait for the update API
///
/// Every call is a single bounded request. Any 2xx answer is a success;
/// everything else is an error the runner reports and retries next tick.
#[async_trait]
pub trait FlareApi: Send + Sync {
    /// Validate the API token
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The domain bound to the token
    /// - `Err(Error)`: If the token is rejected or the server is unreachable
    async fn check_token(&self) -> Result<String, crate::Error>;

    /// Submit an IP update
    ///
    /// # Parameters
    ///
    /// - `ip`: The address to report
    /// - `dummy`: Heartbeat flag, the server must not propagate it to DNS
    ///
    /// # Returns
    ///
    /// - `Ok(Some(receipt))`: Success with a parsed receipt
    /// - `Ok(None)`: Success with a body that was not a receipt
    /// - `Err(Error)`: Transport failure or non-2xx answer
    async fn send_flare(&self, ip: IpAddr, dummy: bool)
        -> Result<Option<FlareReceipt>, crate::Error>;
}
