pub mod debug;
pub mod health;
pub mod heatmap;

use axum::Router;

use crate::state::AppState;

/// Debug capability is resolved here, once, so handlers below never branch on it.
pub fn router(state: AppState) -> Router {
    let debug = state.config.debug;
    Router::new()
        .merge(health::router())
        .merge(heatmap::router(debug))
        .merge(debug::router(debug))
        .with_state(state)
}
