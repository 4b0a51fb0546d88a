pub mod health;
pub mod jobs;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /ws                 WebSocket (status events)
///
/// /jobs               list, drop files (GET, POST)
/// /jobs/{index}       get one job (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/jobs", jobs::router())
}
