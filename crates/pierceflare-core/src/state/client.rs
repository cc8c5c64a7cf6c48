// # Client State
//
// In-memory state owned by the runner for the lifetime of the process.
//
// ## Crash Behavior
//
// - Nothing is persisted; all state is lost on restart
// - The first tick after a restart is always an "initial IP detected" update
//
// ## Ownership
//
// A single `ClientState` is created by the runner and mutated only between
// ticks, never from two paths at once. It is passed by `&mut` rather than
// shared behind a lock.

use chrono::{DateTime, Utc};
use std::net::IpAddr;

/// Mutable per-process client state
///
/// Heartbeat mode is fixed for a run and lives in
/// [`RunnerConfig::dummy_updates`](crate::config::RunnerConfig::dummy_updates).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientState {
    /// Last IP confirmed by a successful real update (`None` until then)
    last_sent_ip: Option<IpAddr>,

    /// When `last_sent_ip` was confirmed
    last_sent_at: Option<DateTime<Utc>>,

    /// Unchanged ticks since the last success notice
    success_counter: u32,
}

impl ClientState {
    /// Fresh state: no IP sent yet
    pub fn new() -> Self {
        Self::default()
    }

    /// State that already reported `ip`
    pub fn with_last_sent(ip: IpAddr) -> Self {
        Self {
            last_sent_ip: Some(ip),
            last_sent_at: Some(Utc::now()),
            success_counter: 0,
        }
    }

    /// Last IP confirmed by the server
    pub fn last_sent_ip(&self) -> Option<IpAddr> {
        self.last_sent_ip
    }

    /// When the last real update was confirmed
    pub fn last_sent_at(&self) -> Option<DateTime<Utc>> {
        self.last_sent_at
    }

    /// Unchanged ticks counted toward the next success notice
    pub fn success_counter(&self) -> u32 {
        self.success_counter
    }

    /// Record a confirmed real update
    ///
    /// Must only be called once the server acknowledged the update.
    pub fn confirm_sent(&mut self, ip: IpAddr) {
        self.last_sent_ip = Some(ip);
        self.last_sent_at = Some(Utc::now());
    }

    /// Count an unchanged tick
    ///
    /// Returns `true` when the success notice is due, in which case the
    /// counter is reset. A `period` of 0 makes every tick due.
    pub fn note_unchanged(&mut self, period: u32) -> bool {
        self.success_counter = self.success_counter.saturating_add(1);
        if period == 0 || self.success_counter >= period {
            self.success_counter = 0;
            return true;
        }
        false
    }
}
