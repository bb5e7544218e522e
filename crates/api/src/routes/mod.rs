pub mod health;
pub mod uploads;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                WebSocket (token query param)
///
/// /events/{event_id}/uploads         create (POST), list (GET)
/// /uploads/{id}                      full record (GET)
/// /uploads/{id}/process              processor invocation (POST)
/// /uploads/{id}/cancel               direct cancellation (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .merge(uploads::router())
}
