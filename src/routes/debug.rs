//! Diagnostics that only exist when `HEATMAP_DEBUG` is set. With debug off
//! the paths stay registered but answer 404, so they never fall through to
//! the static front end.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::error::{AppError, FetchErrorSummary};
use crate::state::{AppState, SharedCache};

#[derive(Debug, Clone, Serialize)]
pub struct LastErrorResponse {
    pub last_error: Option<FetchErrorSummary>,
    pub fetched_at: Option<String>,
    pub points: usize,
}

pub(crate) async fn query_handler(State(cache): State<SharedCache>) -> String {
    cache.source().query()
}

pub(crate) async fn last_error_handler(State(cache): State<SharedCache>) -> Json<LastErrorResponse> {
    let status = cache.status();
    Json(LastErrorResponse {
        last_error: status.last_error.as_ref().map(|err| err.summary()),
        fetched_at: status.fetched_at.map(|at| at.to_rfc3339()),
        points: status.points,
    })
}

async fn disabled_handler() -> AppError {
    AppError::not_found("Not Found")
}

pub fn router(enabled: bool) -> Router<AppState> {
    if enabled {
        Router::new()
            .route("/debug/query", get(query_handler))
            .route("/debug/error", get(last_error_handler))
    } else {
        Router::new()
            .route("/debug/query", get(disabled_handler))
            .route("/debug/error", get(disabled_handler))
    }
}
