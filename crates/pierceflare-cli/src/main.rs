// # pierceflare-cli - PierceFlare dynamic DNS client
//
// This binary is a THIN integration layer. All detection and update logic
// lives in pierceflare-core.
//
// The binary is responsible for:
// 1. Validating command-line arguments
// 2. Reading configuration from environment variables
// 3. Initializing logging and the runtime
// 4. Validating the API token
// 5. Running the client once or continuously
//
// ## Configuration
//
// - `PIERCEFLARE_API_KEY`: API token (required)
// - `PIERCEFLARE_SERVER_URL`: PierceFlare server URL (required)
// - `PIERCEFLARE_CHECK_INTERVAL`: Seconds between checks (default 300, min 10)
// - `PIERCEFLARE_ONE_SHOT`: `true` to send one update and exit
// - `PIERCEFLARE_DUMMY_UPDATES`: `true` to send heartbeat updates
// - `PIERCEFLARE_LOG_LEVEL`: error, info or debug (default info)
// - `PIERCEFLARE_LOG_TIMESTAMP`: `false` to drop timestamps from logs
// - `PIERCEFLARE_SUCCESS_LOG_PERIOD`: Unchanged checks between two success
//   notices (default 10, 0 = every check)
//
// ## Example
//
// ```bash
// export PIERCEFLARE_API_KEY=your_token
// export PIERCEFLARE_SERVER_URL=https://pierceflare.example.com
//
// pierceflare-cli                # continuous mode
// pierceflare-cli --force-ping   # one real update, then exit
// ```

mod cli;

use anyhow::{Context, Result};
use pierceflare_api::PierceFlareClient;
use pierceflare_core::{ClientConfig, FlareRunner, LogLevel};
use pierceflare_ip_http::HttpIpResolver;
use std::future::Future;
use std::process::ExitCode;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy)]
enum PierceFlareExitCode {
    /// Clean shutdown or successful one-shot run
    Success = 0,
    /// Usage, configuration, token or one-shot failure
    Failure = 1,
    /// Runtime could not be created
    RuntimeError = 2,
}

impl From<PierceFlareExitCode> for ExitCode {
    fn from(code: PierceFlareExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    // Validate arguments before anything else
    let args = match cli::parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(arg) => {
            eprintln!("Error: Unrecognized argument '{}'", arg);
            eprintln!("Valid arguments: {}", cli::FORCE_PING);
            return PierceFlareExitCode::Failure.into();
        }
    };

    // Load and validate configuration from environment
    let config = match ClientConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}", e);
            return PierceFlareExitCode::Failure.into();
        }
    };

    if let Err(e) = init_tracing(&config) {
        eprintln!("{:#}", e);
        return PierceFlareExitCode::Failure.into();
    }

    info!("Client starting...");
    debug!("Server URL: {}", config.server_url);
    debug!("Check interval: {}s", config.check_interval_secs);
    debug!("Log level: {:?}", config.log_level);
    debug!(
        "Success log period: {} executions",
        config.success_log_period
    );

    if config.dummy_updates {
        info!(
            "Dummy updates mode (PIERCEFLARE_DUMMY_UPDATES) enabled - Updates will be sent to server with no intent to propagate to DNS"
        );
    }

    let one_shot = args.force_ping || config.one_shot;

    // Ticks never overlap, a single thread drives everything
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return PierceFlareExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match run_client(config, one_shot).await {
            Ok(()) => PierceFlareExitCode::Success,
            Err(e) => {
                error!("{:#}", e);
                PierceFlareExitCode::Failure
            }
        }
    });

    result.into()
}

/// Build the collaborators and run the client
async fn run_client(config: ClientConfig, one_shot: bool) -> Result<()> {
    let api = PierceFlareClient::new(config.api_key.clone(), config.server_url.clone())?;
    let resolver = HttpIpResolver::new()?;

    let (runner, events) =
        FlareRunner::new(Box::new(resolver), Box::new(api), config.runner_config())?;
    // Events are for embedders; logging already covers them here
    drop(events);

    let domain = runner
        .validate_token()
        .await
        .context("Token validation error")?;
    info!("API token valid for domain {}", domain);

    if one_shot {
        runner
            .run_once()
            .await
            .context("One-shot update failed")?;
        return Ok(());
    }

    let shutdown = shutdown_signal()?;
    runner.run_until(shutdown).await?;

    info!("Client stopped");
    Ok(())
}

/// Initialize the global tracing subscriber
fn init_tracing(config: &ClientConfig) -> Result<()> {
    let builder = FmtSubscriber::builder()
        .with_max_level(level_for(config.log_level))
        .with_target(false);

    let result = if config.log_timestamp {
        tracing::subscriber::set_global_default(builder.finish())
    } else {
        tracing::subscriber::set_global_default(builder.without_time().finish())
    };

    result.context("Failed to set tracing subscriber")
}

fn level_for(level: LogLevel) -> Level {
    match level {
        LogLevel::Error => Level::ERROR,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
    }
}

/// Install SIGTERM/SIGINT handlers and return a future resolving on either
///
/// Handlers are installed eagerly so a failure is reported before the
/// loop starts.
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint =
        signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;

    Ok(async move {
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        info!("Signal received: {}, shutting down...", name);
    })
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Signal received: CTRL-C, shutting down..."),
            Err(e) => error!("Failed to wait for CTRL-C: {}, shutting down...", e),
        }
    })
}
