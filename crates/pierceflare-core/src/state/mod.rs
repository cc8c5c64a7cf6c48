// # Client State
//
// Runtime state held by the runner. Nothing here survives a restart.

pub mod client;

pub use client::ClientState;
