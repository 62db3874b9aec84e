//! Shared runtime state for vg-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The active model is
//! never cached here: every prediction and status call re-reads the slot.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;
use vg_config::GateSettings;
use vg_promotion::{PromotionGate, PromotionRecord};
use vg_serving::Predictor;

// ---------------------------------------------------------------------------
// BusMsg: SSE event bus payload
// ---------------------------------------------------------------------------

/// Messages broadcast over the internal event bus and surfaced as SSE events.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMsg {
    Heartbeat { ts_millis: i64 },
    Status(StatusSnapshot),
    Promotion(PromotionRecord),
    PromotionAborted {
        cycle_id: Uuid,
        stage: String,
        kind: String,
        error: String,
    },
}

impl BusMsg {
    pub fn event_name(&self) -> &'static str {
        match self {
            BusMsg::Heartbeat { .. } => "heartbeat",
            BusMsg::Status(_) => "status",
            BusMsg::Promotion(_) => "promotion",
            BusMsg::PromotionAborted { .. } => "promotion_aborted",
        }
    }
}

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

/// Static build metadata included in health / status responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// StatusSnapshot
// ---------------------------------------------------------------------------

/// Point-in-time view returned by GET /v1/status and carried in SSE `status`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub daemon_uptime_secs: u64,
    pub config_hash: String,
    pub model_deployed: bool,
    pub active_model_id: Option<Uuid>,
    /// Set when the active slot exists but cannot be read or parsed.
    pub active_slot_error: Option<String>,
    pub last_promotion: Option<PromotionRecord>,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Cloneable (Arc) handle shared across all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Broadcast bus for SSE.
    pub bus: broadcast::Sender<BusMsg>,
    /// Static build metadata.
    pub build: BuildInfo,
    pub settings: Arc<GateSettings>,
    /// Hash of the layered config the daemon booted with; stamped on every cycle.
    pub config_hash: String,
    pub gate: PromotionGate,
    pub predictor: Predictor,
    /// Most recent completed cycle seen by this process.
    pub last_promotion: Arc<RwLock<Option<PromotionRecord>>>,
}

impl AppState {
    pub fn new(settings: GateSettings, config_hash: impl Into<String>) -> Self {
        let (bus, _rx) = broadcast::channel::<BusMsg>(1024);

        Self {
            bus,
            build: BuildInfo {
                service: "vg-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            gate: PromotionGate::from_settings(&settings),
            predictor: Predictor::from_path(&settings.active_model_path),
            settings: Arc::new(settings),
            config_hash: config_hash.into(),
            last_promotion: Arc::new(RwLock::new(None)),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Monotonically increasing uptime since first call (process lifetime).
pub fn uptime_secs() -> u64 {
    static START: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();
    START
        .get_or_init(std::time::Instant::now)
        .elapsed()
        .as_secs()
}

/// Spawn a background task that emits a heartbeat SSE every `interval`.
pub fn spawn_heartbeat(bus: broadcast::Sender<BusMsg>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let ts = chrono::Utc::now().timestamp_millis();
            let _ = bus.send(BusMsg::Heartbeat { ts_millis: ts });
        }
    });
}
