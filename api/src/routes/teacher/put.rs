use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use db::models::{attendance_session, teacher};
use services::session_service::SessionService;
use util::state::AppState;

use crate::response::{ApiError, ApiResponse};

/// PUT /teacher/sessions/{session_id}/end
///
/// Ends one of the caller's sessions. Scans arriving afterwards are rejected.
///
/// - `200 OK` with the ended session (`"active": false`)
/// - `404 Not Found` when the session does not exist or belongs to another teacher
pub async fn end_session(
    State(state): State<AppState>,
    Extension(teacher): Extension<teacher::Model>,
    Path(session_id): Path<i64>,
) -> Result<(StatusCode, Json<ApiResponse<attendance_session::Model>>), ApiError> {
    let ended = SessionService::end(state.db(), state.tokens(), session_id, Some(teacher.id)).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(ended, "Session ended"))))
}
