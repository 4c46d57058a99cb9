//! Teacher session routes. The teacher guard is applied by the parent router
//! and inserts the `teacher::Model` every handler here reads.

pub mod get;
pub mod post;
pub mod put;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use util::state::AppState;

use crate::auth::middleware::limit_api;
use get::{active_sessions, list_sessions, session_attendance, session_qr};
use post::create_session;
use put::end_session;

/// Builds the `/teacher` route group.
///
/// - `POST /teacher/sessions` → `create_session` (api rate limit)
/// - `GET /teacher/sessions` → `list_sessions`
/// - `GET /teacher/sessions/active` → `active_sessions`
/// - `PUT /teacher/sessions/{session_id}/end` → `end_session`
/// - `GET /teacher/sessions/{session_id}/attendance` → `session_attendance`
/// - `GET /teacher/sessions/{session_id}/qr` → `session_qr`
pub fn teacher_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/sessions",
            post(create_session)
                .route_layer(from_fn_with_state(app_state, limit_api))
                .get(list_sessions),
        )
        .route("/sessions/active", get(active_sessions))
        .route("/sessions/{session_id}/end", put(end_session))
        .route("/sessions/{session_id}/attendance", get(session_attendance))
        .route("/sessions/{session_id}/qr", get(session_qr))
}
