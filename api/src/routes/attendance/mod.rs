//! Student-facing attendance routes. The student guard is applied by the parent router.

pub mod get;
pub mod post;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use util::state::AppState;

use crate::auth::middleware::limit_attendance;
use get::{my_attendance, token_status};
use post::mark_attendance;

/// Builds the `/attendance` route group.
///
/// - `POST /attendance/mark` → `mark_attendance` (attendance rate limit)
/// - `GET /attendance/me` → `my_attendance`
/// - `GET /attendance/token-status` → `token_status`
pub fn attendance_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/mark",
            post(mark_attendance).route_layer(from_fn_with_state(app_state, limit_attendance)),
        )
        .route("/me", get(my_attendance))
        .route("/token-status", get(token_status))
}
