// # IP Resolver Trait
//
// Defines the interface for discovering the host's current public address.
//
// ## Implementations
//
// - HTTP IP-echo services: `pierceflare-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use pierceflare_core::IpResolver;
//
// #[tokio::main]
// async fn main() -> pierceflare_core::Result<()> {
//     let resolver = /* IpResolver implementation */;
//     let ip = resolver.resolve().await?;
//     println!("Public IP: {}", ip);
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for public IP discovery
///
/// A resolver is called once per tick by the runner. It must bound every
/// network call with a timeout and must not keep state between calls:
/// the address is rediscovered on every tick.
///
/// Implementations must not retry a failed call themselves beyond their own
/// fallback order; the next tick is the retry.
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Resolve the current public IP address
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: A syntactically valid IPv4 or IPv6 address
    /// - `Err(Error::NoAddressFound)`: If no source produced a valid address
    async fn resolve(&self) -> Result<IpAddr, crate::Error>;

    /// Short name used in logs
    fn resolver_name(&self) -> &'static str {
        "resolver"
    }
}
