//! Sweeper Cache demo
//!
//! Seeds a session cache and lets the sweeper evict stale sessions.

use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sweeper_cache::{Cache, Config, Key, SweeperConfig};

/// How long a session stays valid in the demo
const SESSION_TTL_SECS: i64 = 2;
/// How long the demo runs before shutting itself down
const DEMO_DURATION: Duration = Duration::from_secs(6);

#[derive(Debug, Clone, Serialize)]
struct Session {
    user: String,
    last_seen: DateTime<Utc>,
}

impl Session {
    fn new(user: &str, age_secs: i64) -> Self {
        Self {
            user: user.to_string(),
            last_seen: Utc::now() - chrono::Duration::seconds(age_secs),
        }
    }

    fn is_stale(&self) -> bool {
        Utc::now() - self.last_seen > chrono::Duration::seconds(SESSION_TTL_SECS)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sweeper_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::from_env();
    config.sweeper_enabled = true;
    info!(
        "Configuration loaded: debug_mode={}, max_cache_size={:?}, sweeper_interval={}ms",
        config.debug_mode, config.max_cache_size, config.sweeper_interval_ms
    );

    let cache: Cache<Session> = Cache::builder()
        .config(config)
        .sweeper(SweeperConfig::new(
            |session: &Session, _: &Key| session.is_stale(),
            Duration::from_millis(500),
        ))
        .build()
        .context("failed to build session cache")?;

    cache.create("alice", Session::new("alice", 0));
    cache.create("bob", Session::new("bob", 10));
    cache.create(42, Session::new("service-account", 1));
    info!("Seeded {} sessions", cache.size());

    tokio::select! {
        _ = tokio::time::sleep(DEMO_DURATION) => {
            info!("Demo finished");
        }
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    cache.destroy_sweeper();

    let stats = serde_json::to_string_pretty(&cache.stats())?;
    println!("{}", stats);
    let remaining = serde_json::to_string_pretty(&cache.entries())?;
    println!("{}", remaining);

    Ok(())
}
