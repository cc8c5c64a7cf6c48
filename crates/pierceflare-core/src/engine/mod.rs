//! Core PierceFlare runner
//!
//! The FlareRunner is responsible for:
//! - Resolving the public IP via IpResolver on each tick
//! - Deciding between a real, dummy or no update
//! - Submitting updates via FlareApi
//! - Recording confirmed updates in ClientState
//!
//! ## Architecture
//!
//! ```text
//!  ┌──────────────┐     ┌──────────────┐
//!  │ interval     │     │ shutdown     │
//!  │ (ticks)      │     │ (signal)     │
//!  └──────────────┘     └──────────────┘
//!         │                    │
//!         └────── select! ─────┘
//!                    │
//!                    ▼
//!           ┌──────────────┐
//!           │ FlareRunner  │── ClientState (owned)
//!           └──────────────┘
//!                    │
//!     ┌──────────────┼──────────────┐
//!     ▼              ▼              ▼
//! ┌──────────┐ ┌────────────┐ ┌───────────┐
//! │IpResolver│ │ FlareApi   │ │  Events   │
//! │(resolve) │ │ (update)   │ │ (notify)  │
//! └──────────┘ └────────────┘ └───────────┘
//! ```
//!
//! ## Tick Flow
//!
//! 1. Resolve the current IP
//! 2. Evaluate the update policy against ClientState
//! 3. Submit a real or dummy update if needed
//! 4. On confirmed real update, record the IP in ClientState
//! 5. Emit events for monitoring/logging
//!
//! ## Modes
//!
//! - One-shot: a single forced real update; every error is returned
//! - Continuous: an immediate tick, then one tick per interval until the
//!   shutdown future resolves; tick errors are logged and the loop goes on

use crate::config::RunnerConfig;
use crate::error::{Error, Result};
use crate::policy::{UpdateDecision, evaluate};
use crate::state::ClientState;
use crate::traits::{FlareApi, IpResolver};
use std::future::Future;
use std::net::IpAddr;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::MissedTickBehavior;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, error, info, warn};

/// Execution mode of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Single forced update, then exit
    OneShot,
    /// Periodic checks until shutdown
    Continuous,
}

/// Events emitted by the FlareRunner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerEvent {
    /// Runner started
    Started {
        mode: RunMode,
    },

    /// First address seen by this process
    InitialIpDetected {
        ip: IpAddr,
    },

    /// Address differs from the last confirmed one
    IpChanged {
        previous: IpAddr,
        current: IpAddr,
    },

    /// Server acknowledged an update
    UpdateSucceeded {
        ip: IpAddr,
        dummy: bool,
    },

    /// Address unchanged, nothing sent
    Unchanged {
        ip: IpAddr,
        /// Whether the periodic success notice fired on this tick
        notice: bool,
    },

    /// Resolution or submission failed; state left untouched
    CycleFailed {
        error: String,
    },

    /// Runner stopped
    Stopped {
        reason: String,
    },
}

impl RunnerEvent {
    /// `true` for the event that closes a tick
    pub fn ends_cycle(&self) -> bool {
        matches!(
            self,
            RunnerEvent::UpdateSucceeded { .. }
                | RunnerEvent::Unchanged { .. }
                | RunnerEvent::CycleFailed { .. }
        )
    }
}

/// Core PierceFlare runner
///
/// The runner drives the resolve → decide → update cycle, either once or
/// on a fixed interval.
///
/// ## Lifecycle
///
/// 1. Create with [`FlareRunner::new()`]
/// 2. Optionally validate the token with [`FlareRunner::validate_token()`]
/// 3. Run with [`FlareRunner::run_once()`] or [`FlareRunner::run_until()`]
///
/// ## Threading
///
/// Ticks run sequentially on the calling task and never overlap. The
/// [`ClientState`] of a continuous run lives on that task's stack.
///
/// ## Cancellation
///
/// Shutdown is observed while waiting for the next tick. A tick in flight
/// runs to completion (every request has its own timeout) before the
/// shutdown is seen.
pub struct FlareRunner {
    /// Public IP discovery
    resolver: Box<dyn IpResolver>,

    /// Update API
    api: Box<dyn FlareApi>,

    /// Scheduler settings
    config: RunnerConfig,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<RunnerEvent>,
}

impl FlareRunner {
    /// Create a new runner
    ///
    /// # Returns
    ///
    /// A tuple of (runner, event_receiver) where event_receiver yields runner events
    pub fn new(
        resolver: Box<dyn IpResolver>,
        api: Box<dyn FlareApi>,
        config: RunnerConfig,
    ) -> Result<(Self, mpsc::Receiver<RunnerEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let runner = Self {
            resolver,
            api,
            config,
            event_tx: tx,
        };

        Ok((runner, rx))
    }

    /// Scheduler settings in use
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Validate the API token
    ///
    /// Returns the domain bound to the token.
    pub async fn validate_token(&self) -> Result<String> {
        debug!("Checking token validity");
        let domain = self.api.check_token().await?;
        debug!(domain = %domain, "API token valid");
        Ok(domain)
    }

    /// Run a single forced update on a fresh state
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: The address the server acknowledged
    /// - `Err(Error)`: Resolution or submission failure
    pub async fn run_once(&self) -> Result<IpAddr> {
        info!("Running in one-shot mode - sending immediate ping");
        self.emit_event(RunnerEvent::Started {
            mode: RunMode::OneShot,
        });

        let mut state = ClientState::new();
        let result = self.force_ping(&mut state).await;

        self.emit_event(RunnerEvent::Stopped {
            reason: "One-shot run finished".to_string(),
        });
        result
    }

    /// Resolve and send a real update, whatever the policy says
    ///
    /// Never sends a dummy update, even in heartbeat mode.
    pub async fn force_ping(&self, state: &mut ClientState) -> Result<IpAddr> {
        let result = async {
            let ip = self.resolver.resolve().await?;
            debug!("Current IP address: {}", ip);

            self.submit(ip, false).await?;
            state.confirm_sent(ip);
            info!("IP update successful");
            Ok::<IpAddr, Error>(ip)
        }
        .await;

        if let Err(ref e) = result {
            self.emit_event(RunnerEvent::CycleFailed {
                error: e.to_string(),
            });
        }

        result
    }

    /// Run one resolve → decide → update cycle
    ///
    /// `state` is only changed after a confirmed real update, or to count
    /// an unchanged tick. On error it is left as it was.
    pub async fn tick(&self, state: &mut ClientState) -> Result<UpdateDecision> {
        debug!(resolver = self.resolver.resolver_name(), "Resolving public IP");
        let current = self.resolver.resolve().await?;

        debug!(
            "IP check: current={}, last={}",
            current,
            state
                .last_sent_ip()
                .map(|ip| ip.to_string())
                .unwrap_or_else(|| "None".to_string())
        );

        let decision = evaluate(current, state, self.config.dummy_updates);

        match decision {
            UpdateDecision::RealUpdate { ip, previous } => {
                match previous {
                    Some(previous) => {
                        info!("IP address changed: {} -> {}", previous, ip);
                        self.emit_event(RunnerEvent::IpChanged {
                            previous,
                            current: ip,
                        });
                    }
                    None => {
                        info!("Initial IP detected: {}", ip);
                        self.emit_event(RunnerEvent::InitialIpDetected { ip });
                    }
                }

                self.submit(ip, false).await?;
                state.confirm_sent(ip);
                info!("IP update successful");
            }
            UpdateDecision::DummyUpdate(ip) => {
                info!("Sending a test update (dummy updates mode enabled)");
                self.submit(ip, true).await?;
                info!("Test update successful");
            }
            UpdateDecision::NoOp(ip) => {
                let notice = state.note_unchanged(self.config.success_log_period);
                if notice {
                    let since = state
                        .last_sent_at()
                        .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                        .unwrap_or_else(|| "startup".to_string());
                    info!(
                        "✓ IP unchanged ({}) since {} - Connection with PierceFlare server maintained",
                        ip, since
                    );
                }
                debug!("IP address unchanged ({}). No update needed.", ip);
                self.emit_event(RunnerEvent::Unchanged { ip, notice });
            }
        }

        Ok(decision)
    }

    /// Run in continuous mode until `shutdown` resolves
    ///
    /// The first tick fires immediately. When the shutdown future and a
    /// tick are ready on the same wake, shutdown wins.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!("Running in continuous mode");
        debug!("Interval between checks: {:?}", self.config.check_interval());

        self.emit_event(RunnerEvent::Started {
            mode: RunMode::Continuous,
        });

        let mut interval = tokio::time::interval(self.config.check_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = IntervalStream::new(interval);

        let mut state = ClientState::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                // Handle shutdown signal
                _ = &mut shutdown => {
                    info!("Shutdown signal received, stopping");
                    self.emit_event(RunnerEvent::Stopped {
                        reason: "Shutdown signal".to_string(),
                    });
                    break;
                }

                // Handle periodic check
                Some(_) = ticks.next() => {
                    if let Err(e) = self.tick(&mut state).await {
                        error!("Check failed: {}", e);
                        self.emit_event(RunnerEvent::CycleFailed {
                            error: e.to_string(),
                        });
                        // Continue running despite errors
                    }
                }
            }
        }

        Ok(())
    }

    /// Run in continuous mode until `shutdown_rx` fires or is dropped
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: tokio::sync::oneshot::Receiver<()>,
    ) -> Result<()> {
        self.run_until(async {
            let _ = shutdown_rx.await;
        })
        .await
    }

    /// Submit one update and report the outcome
    async fn submit(&self, ip: IpAddr, dummy: bool) -> Result<()> {
        if dummy {
            debug!("Sending dummy IP update: {}", ip);
        } else {
            debug!("Sending IP update: {}", ip);
        }

        let receipt = self.api.send_flare(ip, dummy).await?;

        if let Some(receipt) = receipt {
            debug!(
                op = ?receipt.op,
                resolved_ip = %receipt.resolved_ip,
                "Flare acknowledged by server"
            );
        }

        self.emit_event(RunnerEvent::UpdateSucceeded { ip, dummy });
        Ok(())
    }

    /// Emit a runner event
    fn emit_event(&self, event: RunnerEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                // Nobody is draining fast enough; drop rather than grow
                warn!(
                    "Event channel full, dropping event {:?}. Consider increasing event_channel_capacity.",
                    event
                );
            }
            Err(TrySendError::Closed(_)) => {}
        }
    }
}
