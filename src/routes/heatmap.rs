use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::config::HeatmapConfig;
use crate::error::FetchError;
use crate::state::{AppState, SharedCache};

#[derive(Debug, Clone, Serialize)]
pub struct ConfigResponse {
    pub title: String,
    pub refresh_seconds: u64,
    pub time_window: String,
    pub max_points: i64,
}

/// Upstream context echoed in debug-mode failures. Credentials stay out.
#[derive(Debug, Clone, Serialize)]
pub struct QueryContext {
    pub host: String,
    pub port: u16,
    pub db: String,
    pub measurement: String,
    pub window: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataErrorResponse {
    pub error: &'static str,
    pub exception: String,
    pub query: QueryContext,
}

impl DataErrorResponse {
    fn new(err: &FetchError, config: &HeatmapConfig) -> Self {
        Self {
            error: err.kind(),
            exception: err.to_string(),
            query: QueryContext {
                host: config.influx_host.clone(),
                port: config.influx_port,
                db: config.influx_database.clone(),
                measurement: config.measurement.clone(),
                window: config.time_window.clone(),
            },
        }
    }
}

/// Degrades to an empty array when the upstream is unavailable.
pub(crate) async fn data_handler(State(cache): State<SharedCache>) -> Response {
    let read = cache.get_or_fetch(Utc::now()).await;
    Json(read.points.as_slice()).into_response()
}

pub(crate) async fn data_debug_handler(State(state): State<AppState>) -> Response {
    let read = state.cache.get_or_fetch(Utc::now()).await;
    match read.error {
        None => Json(read.points.as_slice()).into_response(),
        Some(err) => (
            StatusCode::BAD_GATEWAY,
            Json(DataErrorResponse::new(&err, &state.config)),
        )
            .into_response(),
    }
}

pub(crate) async fn config_handler(
    State(config): State<Arc<HeatmapConfig>>,
) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        title: config.title.clone(),
        refresh_seconds: config.refresh_seconds,
        time_window: config.time_window.clone(),
        max_points: config.max_points,
    })
}

pub fn router(debug: bool) -> Router<AppState> {
    let data = if debug {
        get(data_debug_handler)
    } else {
        get(data_handler)
    };
    Router::new()
        .route("/data", data)
        .route("/config", get(config_handler))
}
