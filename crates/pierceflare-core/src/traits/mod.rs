//! Core traits for the PierceFlare client
//!
//! This module defines the collaborator interfaces the runner drives.
//!
//! - [`IpResolver`]: Discover the host's current public IP address
//! - [`FlareApi`]: Validate the token and submit IP updates

pub mod ip_resolver;
pub mod flare_api;

pub use ip_resolver::IpResolver;
pub use flare_api::{FlareApi, FlareReceipt, RemoteOperation};
