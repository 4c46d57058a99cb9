//! Administrative overrides. The admin guard is applied by the parent router.

pub mod delete;
pub mod get;
pub mod post;
pub mod put;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use util::state::AppState;

use delete::{delete_attendance, delete_student};
use get::{get_student, store_stats};
use post::{flush_store, reset_device, reset_token};
use put::force_end_session;

/// Builds the `/admin` route group.
///
/// - `GET /admin/students/{student_id}` → `get_student`
/// - `POST /admin/students/{student_id}/reset-device` → `reset_device`
/// - `POST /admin/students/{student_id}/reset-token` → `reset_token`
/// - `DELETE /admin/students/{student_id}` → `delete_student`
/// - `PUT /admin/sessions/{session_id}/force-end` → `force_end_session`
/// - `DELETE /admin/attendance/{record_id}` → `delete_attendance`
/// - `GET /admin/store` → `store_stats`
/// - `POST /admin/store/flush` → `flush_store`
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/students/{student_id}", get(get_student).delete(delete_student))
        .route("/students/{student_id}/reset-device", post(reset_device))
        .route("/students/{student_id}/reset-token", post(reset_token))
        .route("/sessions/{session_id}/force-end", put(force_end_session))
        .route("/attendance/{record_id}", delete(delete_attendance))
        .route("/store", get(store_stats))
        .route("/store/flush", post(flush_store))
}
