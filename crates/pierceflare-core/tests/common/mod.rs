//! Test doubles and common utilities for runner contract tests
//!
//! These doubles script resolver answers and record every API call so the
//! tests can assert on exactly what the runner sent.

#![allow(dead_code)]

use pierceflare_core::config::RunnerConfig;
use pierceflare_core::error::{Error, Result};
use pierceflare_core::traits::{FlareApi, FlareReceipt, IpResolver, RemoteOperation};
use pierceflare_core::{FlareRunner, RunnerEvent};
use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Parse an address literal
pub fn ip(s: &str) -> IpAddr {
    s.parse().expect("valid IP literal")
}

/// One scripted resolver answer
#[derive(Debug, Clone, Copy)]
pub enum Step {
    Ip(IpAddr),
    Fail,
}

/// A resolver that replays a script, repeating the last step once exhausted
#[derive(Clone)]
pub struct ScriptedResolver {
    script: Arc<Mutex<VecDeque<Step>>>,
    last: Arc<Mutex<Step>>,
    call_count: Arc<AtomicUsize>,
    /// Simulated network latency of every resolve() call
    latency: Option<Duration>,
}

impl ScriptedResolver {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: Arc::new(Mutex::new(steps.into_iter().collect())),
            last: Arc::new(Mutex::new(Step::Fail)),
            call_count: Arc::new(AtomicUsize::new(0)),
            latency: None,
        }
    }

    /// Make every resolve() call take `latency` (tokio time)
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// A resolver that always answers `addr`
    pub fn fixed(addr: IpAddr) -> Self {
        Self::new([Step::Ip(addr)])
    }

    /// Number of times resolve() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpResolver for ScriptedResolver {
    async fn resolve(&self) -> Result<IpAddr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        let step = {
            let mut script = self.script.lock().unwrap();
            let mut last = self.last.lock().unwrap();
            if let Some(step) = script.pop_front() {
                *last = step;
            }
            *last
        };

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match step {
            Step::Ip(addr) => Ok(addr),
            Step::Fail => Err(Error::NoAddressFound { attempts: 3 }),
        }
    }

    fn resolver_name(&self) -> &'static str {
        "scripted"
    }
}

/// A mock FlareApi that records calls
#[derive(Clone)]
pub struct MockFlareApi {
    /// (ip, dummy) of every send_flare() call
    calls: Arc<Mutex<Vec<(IpAddr, bool)>>>,
    /// Outcomes for upcoming send_flare() calls; `false` fails. Empty = succeed.
    outcomes: Arc<Mutex<VecDeque<bool>>>,
    /// Call counter for check_token()
    token_checks: Arc<AtomicUsize>,
    /// Whether check_token() succeeds
    token_valid: bool,
}

impl MockFlareApi {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            outcomes: Arc::new(Mutex::new(VecDeque::new())),
            token_checks: Arc::new(AtomicUsize::new(0)),
            token_valid: true,
        }
    }

    /// A mock whose token is rejected
    pub fn with_invalid_token() -> Self {
        Self {
            token_valid: false,
            ..Self::new()
        }
    }

    /// Queue outcomes for the next send_flare() calls
    pub fn script_outcomes(&self, outcomes: impl IntoIterator<Item = bool>) {
        self.outcomes.lock().unwrap().extend(outcomes);
    }

    /// Every recorded send_flare() call
    pub fn calls(&self) -> Vec<(IpAddr, bool)> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of check_token() calls
    pub fn token_checks(&self) -> usize {
        self.token_checks.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl FlareApi for MockFlareApi {
    async fn check_token(&self) -> Result<String> {
        self.token_checks.fetch_add(1, Ordering::SeqCst);
        if self.token_valid {
            Ok("home.pierceflare.test".to_string())
        } else {
            Err(Error::auth("Token rejected (HTTP 401)"))
        }
    }

    async fn send_flare(&self, addr: IpAddr, dummy: bool) -> Result<Option<FlareReceipt>> {
        self.calls.lock().unwrap().push((addr, dummy));

        let succeed = self.outcomes.lock().unwrap().pop_front().unwrap_or(true);
        if !succeed {
            return Err(Error::api(503, None, "Service unavailable"));
        }

        Ok(Some(FlareReceipt {
            op: if dummy {
                RemoteOperation::Dummy
            } else {
                RemoteOperation::Batch
            },
            resolved_ip: addr.to_string(),
        }))
    }
}

/// Runner settings for tests: 10s interval, notice every tick
pub fn test_config() -> RunnerConfig {
    RunnerConfig {
        check_interval_secs: 10,
        dummy_updates: false,
        success_log_period: 0,
        event_channel_capacity: 256,
    }
}

/// Build a runner over the given doubles
pub fn runner(
    resolver: &ScriptedResolver,
    api: &MockFlareApi,
    config: RunnerConfig,
) -> (FlareRunner, mpsc::Receiver<RunnerEvent>) {
    FlareRunner::new(Box::new(resolver.clone()), Box::new(api.clone()), config)
        .expect("runner construction succeeds")
}

/// Drain every event currently buffered
pub fn drain(rx: &mut mpsc::Receiver<RunnerEvent>) -> Vec<RunnerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Wait until `n` ticks have completed, returning every event seen
pub async fn wait_for_cycles(
    rx: &mut mpsc::Receiver<RunnerEvent>,
    n: usize,
) -> Vec<RunnerEvent> {
    let mut events = Vec::new();
    let mut done = 0;
    while done < n {
        let event = rx.recv().await.expect("runner still emitting");
        if event.ends_cycle() {
            done += 1;
        }
        events.push(event);
    }
    events
}
