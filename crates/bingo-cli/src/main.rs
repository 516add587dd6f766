//! Bingo lobby browser binary.
//!
//! Polls the lobby service and logs the lobby list with each lobby's join
//! control, re-rendering whenever the directory, identity or join state
//! changes.
//!
//! # Usage
//!
//! ```bash
//! # Browse with a token issued by the host
//! bingo-lobbies --api-url http://localhost:8000 --token "$BINGO_TOKEN"
//!
//! # No host bridge: offline identity and the development token
//! bingo-lobbies --no-bridge
//!
//! # Join a lobby as soon as its control is enabled
//! bingo-lobbies --token "$BINGO_TOKEN" --join lobby_abc123
//! ```

mod render;

use std::{sync::Arc, time::Duration};

use bingo_app::{App, BridgeStatus, Runtime, RuntimeConfig, RuntimeHandle, SystemEnv, bridge};
use bingo_client::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_BUY_IN, HttpLobbyApi};
use bingo_core::{OverlapPolicy, SyncConfig};
use clap::{Parser, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// What to do when a poll is due while the previous one is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Overlap {
    /// Fetch anyway; the last completion wins.
    LastWriteWins,
    /// Skip the poll.
    SkipIfBusy,
}

impl From<Overlap> for OverlapPolicy {
    fn from(value: Overlap) -> Self {
        match value {
            Overlap::LastWriteWins => OverlapPolicy::LastWriteWins,
            Overlap::SkipIfBusy => OverlapPolicy::SkipIfBusy,
        }
    }
}

/// Bingo lobby browser
#[derive(Parser, Debug)]
#[command(name = "bingo-lobbies")]
#[command(about = "Browse and join bingo lobbies")]
#[command(version)]
struct Args {
    /// Lobby service base URL
    #[arg(long, env = "BINGO_API_URL", default_value = DEFAULT_BASE_URL)]
    api_url: String,

    /// Bearer token delivered by the host
    #[arg(long, env = "BINGO_TOKEN", conflicts_with = "no_bridge")]
    token: Option<String>,

    /// Run as if no host bridge exists (offline identity)
    #[arg(long)]
    no_bridge: bool,

    /// Milliseconds between polls
    #[arg(long, default_value = "3000")]
    poll_interval_ms: u64,

    /// Overlapping poll policy
    #[arg(long, value_enum, default_value = "last-write-wins")]
    overlap: Overlap,

    /// Coins staked when joining
    #[arg(long, default_value_t = DEFAULT_BUY_IN)]
    buy_in: u64,

    /// Per-request timeout in milliseconds
    #[arg(long, default_value = "10000")]
    request_timeout_ms: u64,

    /// Lobby to join once its control is enabled
    #[arg(long)]
    join: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn bridge_status(&self) -> BridgeStatus {
        match (&self.token, self.no_bridge) {
            (_, true) => BridgeStatus::unavailable(),
            (Some(token), false) => BridgeStatus::authenticated(token.clone()),
            (None, false) => BridgeStatus::pending(),
        }
    }

    fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            sync: SyncConfig {
                poll_interval: Duration::from_millis(self.poll_interval_ms),
                overlap: self.overlap.into(),
            },
            buy_in: self.buy_in,
            enabled: true,
        }
    }

    fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_url.clone(),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            ..ClientConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("Bingo lobby browser starting");
    tracing::info!("Lobby service at {}", args.api_url);

    let api = Arc::new(HttpLobbyApi::new(&args.client_config())?);
    match api.health().await {
        Ok(health) => tracing::info!(
            status = %health.status,
            redis_connected = health.redis_connected,
            "lobby service health"
        ),
        Err(error) => tracing::warn!(%error, "health check failed, polling anyway"),
    }

    let status = args.bridge_status();
    if status == BridgeStatus::pending() {
        tracing::warn!("No token supplied - waiting for one (pass --token or --no-bridge)");
    }

    let (_bridge_handle, bridge) = bridge::channel(status);
    let (runtime, handle) = Runtime::new(SystemEnv::new(), api, bridge, args.runtime_config());
    let task = tokio::spawn(runtime.run());

    watch_view(&handle, args.join).await?;

    // Runtime may already be gone if it failed; nothing left to stop then.
    let _ = handle.shutdown();
    task.await?;
    Ok(())
}

/// Log every view change until Ctrl-C or the runtime exits.
async fn watch_view(
    handle: &RuntimeHandle,
    mut join_target: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut view = handle.view();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = view.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let app = view.borrow_and_update().clone();
                log_view(&app);

                if let Some(lobby_id) = join_target.as_deref()
                    && app.decision_for(lobby_id).is_some_and(|decision| decision.enabled)
                {
                    tracing::info!(%lobby_id, "joining lobby");
                    handle.select_lobby(lobby_id)?;
                    join_target = None;
                }
            },
            result = &mut shutdown => {
                result?;
                tracing::info!("Shutting down");
                return Ok(());
            },
        }
    }
}

fn log_view(app: &App) {
    for line in render::view_lines(app) {
        tracing::info!("{line}");
    }
}
