//! Update policy
//!
//! Decides, once per tick, what the runner sends for a freshly resolved
//! address. Rules, in priority order:
//!
//! 1. Address differs from the last confirmed one (or nothing was sent yet):
//!    real update, even in heartbeat mode
//! 2. Heartbeat mode: dummy update, not propagated to DNS
//! 3. Otherwise: no update
//!
//! The policy is pure. It never mutates [`ClientState`]; the runner applies
//! the outcome once the server confirmed it.

use crate::state::ClientState;
use std::net::IpAddr;

/// What to do on this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateDecision {
    /// Send a real update
    RealUpdate {
        /// Address to send
        ip: IpAddr,
        /// Last confirmed address, `None` on the first update
        previous: Option<IpAddr>,
    },

    /// Send a heartbeat update flagged as dummy
    DummyUpdate(IpAddr),

    /// Nothing to send
    NoOp(IpAddr),
}

impl UpdateDecision {
    /// The address this decision is about
    pub fn ip(&self) -> IpAddr {
        match self {
            UpdateDecision::RealUpdate { ip, .. } => *ip,
            UpdateDecision::DummyUpdate(ip) | UpdateDecision::NoOp(ip) => *ip,
        }
    }

    /// `true` for the first real update of the process
    pub fn is_initial(&self) -> bool {
        matches!(self, UpdateDecision::RealUpdate { previous: None, .. })
    }
}

/// Evaluate the policy for `current`
pub fn evaluate(current: IpAddr, state: &ClientState, dummy_enabled: bool) -> UpdateDecision {
    match state.last_sent_ip() {
        Some(last) if last == current => {
            if dummy_enabled {
                UpdateDecision::DummyUpdate(current)
            } else {
                UpdateDecision::NoOp(current)
            }
        }
        previous => UpdateDecision::RealUpdate {
            ip: current,
            previous,
        },
    }
}
