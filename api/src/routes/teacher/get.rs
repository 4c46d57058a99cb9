use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use db::models::teacher;
use services::session_service::{AttendanceEntry, RenderedQr, SessionService, SessionSummary};
use util::state::AppState;

use crate::response::{ApiError, ApiResponse};

type HandlerResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

/// GET /teacher/sessions/active
///
/// Live sessions with the advisory live counter. The counter may trail the
/// durable record count after a store hiccup.
///
/// ```json
/// {
///   "success": true,
///   "data": [ { "id": 3, "code": "4b0c7a52-...", "subject": "Networks", "attendance_count": 23 } ],
///   "message": "Active sessions retrieved"
/// }
/// ```
pub async fn active_sessions(
    State(state): State<AppState>,
    Extension(teacher): Extension<teacher::Model>,
) -> HandlerResult<Vec<SessionSummary>> {
    let sessions =
        SessionService::active_sessions(state.db(), state.tokens(), teacher.id, Utc::now()).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(sessions, "Active sessions retrieved"))))
}

/// GET /teacher/sessions
///
/// The caller's 50 most recent sessions with durable attendance counts.
pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(teacher): Extension<teacher::Model>,
) -> HandlerResult<Vec<SessionSummary>> {
    let sessions = SessionService::recent_sessions(state.db(), teacher.id).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(sessions, "Sessions retrieved"))))
}

/// GET /teacher/sessions/{session_id}/attendance
///
/// Every record of one of the caller's sessions, oldest first, with the student.
///
/// - `404 Not Found` when the session is not the caller's
pub async fn session_attendance(
    State(state): State<AppState>,
    Extension(teacher): Extension<teacher::Model>,
    Path(session_id): Path<i64>,
) -> HandlerResult<Vec<AttendanceEntry>> {
    let entries = SessionService::session_attendance(state.db(), session_id, teacher.id).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(entries, "Attendance retrieved"))))
}

/// GET /teacher/sessions/{session_id}/qr
///
/// Re-renders the QR code of a live session. The code and expiry are unchanged.
pub async fn session_qr(
    State(state): State<AppState>,
    Extension(teacher): Extension<teacher::Model>,
    Path(session_id): Path<i64>,
) -> HandlerResult<RenderedQr> {
    let qr = SessionService::regenerate_qr(state.db(), session_id, teacher.id, Utc::now()).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(qr, "QR code regenerated"))))
}
