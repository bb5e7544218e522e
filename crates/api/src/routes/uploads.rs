//! Route definitions for the upload-job pipeline.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{process, uploads};
use crate::state::AppState;

/// Upload-job routes.
///
/// ```text
/// POST   /events/{event_id}/uploads   -> create
/// GET    /events/{event_id}/uploads   -> list_by_event
/// GET    /uploads/{id}                -> get_by_id
/// POST   /uploads/{id}/process        -> process::invoke
/// POST   /uploads/{id}/cancel         -> cancel
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/events/{event_id}/uploads",
            post(uploads::create).get(uploads::list_by_event),
        )
        .route("/uploads/{id}", get(uploads::get_by_id))
        .route("/uploads/{id}/process", post(process::invoke))
        .route("/uploads/{id}/cancel", post(uploads::cancel))
}
