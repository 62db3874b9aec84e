//! vg-daemon entry point.
//!
//! Load config, set up tracing, build the shared state,
//! wire middleware, serve. Route handlers live in `routes.rs`; shared state
//! lives in `state.rs`.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};
use vg_config::{ConfigMode, GateSettings, UnusedKeyPolicy};
use vg_daemon::{routes, state};

/// Comma-separated layered config paths, in merge order.
const ENV_CONFIG_PATHS: &str = "VG_CONFIG_PATHS";
const ENV_DAEMON_ADDR: &str = "VG_DAEMON_ADDR";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env.local if present (dev convenience).
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let raw_paths = std::env::var(ENV_CONFIG_PATHS)
        .with_context(|| format!("{ENV_CONFIG_PATHS} must list the layered config files"))?;
    let paths: Vec<&str> = raw_paths
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    let loaded = vg_config::load_layered_yaml(&paths)?;

    let report = vg_config::report_unused_keys(
        ConfigMode::Promote,
        &loaded.config_json,
        UnusedKeyPolicy::Warn,
    )?;
    if !report.is_clean() {
        warn!(unused = ?report.unused_leaf_pointers, "config contains keys the daemon does not read");
    }

    let settings = GateSettings::from_config_json(ConfigMode::Promote, &loaded.config_json)?;
    let addr = bind_addr_from_env().unwrap_or(settings.daemon_addr);

    let shared = Arc::new(state::AppState::new(settings, loaded.config_hash));

    state::spawn_heartbeat(shared.bus.clone(), Duration::from_secs(1));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    info!(
        config_hash = %shared.config_hash,
        active_slot = %shared.settings.active_model_path.display(),
        "vg-daemon listening on http://{}",
        addr
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn bind_addr_from_env() -> Option<SocketAddr> {
    std::env::var(ENV_DAEMON_ADDR).ok()?.parse().ok()
}

/// CORS: allow only localhost origins.
fn cors_localhost_only() -> CorsLayer {
    let allowed_origins = [
        "http://localhost",
        "http://127.0.0.1",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ];

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(tower_http::cors::Any)
}
