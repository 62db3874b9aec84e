//! Axum router and all HTTP handlers for vg-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Gate cycles and slot reads are blocking filesystem
//! work and run on the blocking pool.

use std::{collections::BTreeMap, convert::Infallible, sync::Arc};

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Form, Json, Router,
};
use futures_util::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};
use vg_eval::EvaluationDataset;
use vg_promotion::{ChallengerModel, PromotionError};
use vg_schemas::ModelError;

use crate::{
    api_types::{ErrorResponse, HealthResponse, PredictResponse, PromoteRequest},
    state::{uptime_secs, AppState, BusMsg, StatusSnapshot},
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/status", get(status_handler))
        .route("/v1/stream", get(stream))
        .route("/v1/predict", post(predict_json))
        .route("/v1/predict/form", post(predict_form))
        .route("/v1/promote", post(promote))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

fn status_for(kind: &str) -> StatusCode {
    match kind {
        "FEATURE_SCHEMA_MISMATCH" => StatusCode::UNPROCESSABLE_ENTITY,
        "NO_MODEL_DEPLOYED" => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn model_error_response(e: &ModelError) -> Response {
    (
        status_for(e.kind()),
        Json(ErrorResponse {
            error: e.to_string(),
            kind: e.kind().to_string(),
            cycle_id: None,
            stage: None,
        }),
    )
        .into_response()
}

fn promotion_error_response(e: &PromotionError) -> Response {
    (
        status_for(e.kind()),
        Json(ErrorResponse {
            error: e.to_string(),
            kind: e.kind().to_string(),
            cycle_id: Some(e.cycle_id),
            stage: Some(e.stage.as_str().to_string()),
        }),
    )
        .into_response()
}

fn join_error_response(e: tokio::task::JoinError) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: format!("blocking task failed: {e}"),
            kind: "INTERNAL".to_string(),
            cycle_id: None,
            stage: None,
        }),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service.to_string(),
            version: st.build.version.to_string(),
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/status
// ---------------------------------------------------------------------------

pub(crate) async fn status_handler(State(st): State<Arc<AppState>>) -> Response {
    let predictor = st.predictor.clone();
    let deployed = match tokio::task::spawn_blocking(move || predictor.deployed_model()).await {
        Ok(d) => d,
        Err(e) => return join_error_response(e),
    };

    let (model_deployed, active_model_id, active_slot_error) = match deployed {
        Ok(Some(m)) => (true, Some(m.model_id), None),
        Ok(None) => (false, None, None),
        Err(e) => (false, None, Some(format!("{}: {e}", e.kind()))),
    };

    let snap = StatusSnapshot {
        daemon_uptime_secs: uptime_secs(),
        config_hash: st.config_hash.clone(),
        model_deployed,
        active_model_id,
        active_slot_error,
        last_promotion: st.last_promotion.read().await.clone(),
    };

    let _ = st.bus.send(BusMsg::Status(snap.clone()));
    (StatusCode::OK, Json(snap)).into_response()
}

// ---------------------------------------------------------------------------
// POST /v1/predict  /v1/predict/form
// ---------------------------------------------------------------------------

pub(crate) async fn predict_json(
    State(st): State<Arc<AppState>>,
    Json(fields): Json<BTreeMap<String, String>>,
) -> Response {
    predict_fields(st, fields).await
}

/// Same fields as `/v1/predict`, posted urlencoded by an HTML form.
pub(crate) async fn predict_form(
    State(st): State<Arc<AppState>>,
    Form(fields): Form<BTreeMap<String, String>>,
) -> Response {
    predict_fields(st, fields).await
}

async fn predict_fields(st: Arc<AppState>, fields: BTreeMap<String, String>) -> Response {
    let predictor = st.predictor.clone();
    let result = tokio::task::spawn_blocking(move || predictor.predict_fields(&fields)).await;

    match result {
        Ok(Ok(p)) => (
            StatusCode::OK,
            Json(PredictResponse {
                label: p.label,
                outcome: p.outcome.as_str().to_string(),
                model_id: p.model_id,
            }),
        )
            .into_response(),
        Ok(Err(e)) => {
            warn!(kind = e.kind(), error = %e, "prediction refused");
            model_error_response(&e)
        }
        Err(e) => join_error_response(e),
    }
}

// ---------------------------------------------------------------------------
// POST /v1/promote
// ---------------------------------------------------------------------------

enum CycleFailure {
    Dataset(ModelError),
    Cycle(PromotionError),
}

pub(crate) async fn promote(
    State(st): State<Arc<AppState>>,
    Json(req): Json<PromoteRequest>,
) -> Response {
    let gate = st.gate.clone();
    let settings = Arc::clone(&st.settings);
    let config_hash = st.config_hash.clone();
    let challenger = ChallengerModel::new(req.artifact_path, req.f1_score);

    let result = tokio::task::spawn_blocking(move || {
        let dataset_path = settings.test_dataset_path.clone().ok_or_else(|| {
            CycleFailure::Dataset(ModelError::InvalidDataset {
                reason: "no held-out dataset configured".to_string(),
            })
        })?;
        let dataset = EvaluationDataset::load_csv(&dataset_path, settings.current_year)
            .map_err(CycleFailure::Dataset)?;
        gate.run_cycle(&challenger, &dataset, &config_hash)
            .map_err(CycleFailure::Cycle)
    })
    .await;

    match result {
        Ok(Ok(record)) => {
            info!(
                cycle_id = %record.cycle_id,
                accepted = record.accepted,
                score_delta = record.score_delta,
                "promote"
            );
            *st.last_promotion.write().await = Some(record.clone());
            let _ = st.bus.send(BusMsg::Promotion(record.clone()));
            (StatusCode::OK, Json(record)).into_response()
        }
        Ok(Err(CycleFailure::Dataset(e))) => model_error_response(&e),
        Ok(Err(CycleFailure::Cycle(e))) => {
            let _ = st.bus.send(BusMsg::PromotionAborted {
                cycle_id: e.cycle_id,
                stage: e.stage.as_str().to_string(),
                kind: e.kind().to_string(),
                error: e.to_string(),
            });
            promotion_error_response(&e)
        }
        Err(e) => join_error_response(e),
    }
}

// ---------------------------------------------------------------------------
// GET /v1/stream  (SSE)
// ---------------------------------------------------------------------------

pub(crate) async fn stream(State(st): State<Arc<AppState>>) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));
    headers.insert("Connection", HeaderValue::from_static("keep-alive"));

    let rx = st.bus.subscribe();
    let events = broadcast_to_sse(rx);

    (headers, Sse::new(events).keep_alive(KeepAlive::new())).into_response()
}

fn broadcast_to_sse(
    rx: broadcast::Receiver<BusMsg>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx).filter_map(|msg| async move {
        match msg {
            Ok(m) => {
                let data = serde_json::to_string(&m).ok()?;
                Some(Ok(Event::default().event(m.event_name()).data(data)))
            }
            Err(_) => None, // lagged / closed
        }
    })
}
