// # pierceflare-core
//
// Core library for the PierceFlare dynamic DNS client.
//
// ## Architecture Overview
//
// This library provides the IP-change detection and update-reporting loop:
// - **IpResolver**: Trait for discovering the current public IP
// - **FlareApi**: Trait for validating the token and submitting updates
// - **ClientState**: Last confirmed IP and success-notice counter
// - **policy**: Pure real / dummy / no-op decision for a tick
// - **FlareRunner**: Scheduler driving one-shot or continuous execution
//
// ## Design Principles
//
// 1. **Separation of Concerns**: HTTP transports live in their own crates
// 2. **Single Owner**: ClientState is owned by the running loop, never shared
// 3. **Caller Decides**: Errors are returned; one-shot treats them as fatal,
//    continuous mode logs them and retries on the next tick
// 4. **Library-First**: The binary is a thin integration layer

pub mod traits;
pub mod engine;
pub mod policy;
pub mod config;
pub mod error;
pub mod state;

// Re-export core types for convenience
pub use traits::{IpResolver, FlareApi, FlareReceipt, RemoteOperation};
pub use engine::{FlareRunner, RunMode, RunnerEvent};
pub use policy::{UpdateDecision, evaluate};
pub use config::{ClientConfig, LogLevel, RunnerConfig};
pub use error::{Error, Result};
pub use state::ClientState;
