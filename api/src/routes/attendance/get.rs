use axum::{Extension, Json, extract::State, http::StatusCode};
use db::models::student;
use serde::Serialize;
use services::{
    attendance_service::{AttendanceService, HistoryEntry},
    error::cooldown_minutes,
};
use util::state::AppState;

use crate::response::{ApiError, ApiResponse};

/// GET /attendance/me
///
/// The student's own marks, newest first.
///
/// ```json
/// {
///   "success": true,
///   "data": [
///     {
///       "id": 17,
///       "subject": "Networks",
///       "status": "present",
///       "marked_at": "2025-10-18T09:01:12Z",
///       "session_code": "4b0c7a52-...",
///       "department": "CSE",
///       "teacher_name": "Ada"
///     }
///   ],
///   "message": "Attendance history retrieved"
/// }
/// ```
pub async fn my_attendance(
    State(state): State<AppState>,
    Extension(student): Extension<student::Model>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<HistoryEntry>>>), ApiError> {
    let history = AttendanceService::my_attendance(state.db(), student.id).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(history, "Attendance history retrieved")),
    ))
}

#[derive(Debug, Serialize)]
pub struct TokenStatus {
    pub has_token: bool,
    pub cooldown_remaining: u64,
    pub cooldown_remaining_minutes: u64,
}

/// GET /attendance/token-status
///
/// Whether the student may scan now. An unreachable store reports no token.
///
/// ```json
/// {
///   "success": true,
///   "data": { "has_token": false, "cooldown_remaining": 1200, "cooldown_remaining_minutes": 20 },
///   "message": "Token status retrieved"
/// }
/// ```
pub async fn token_status(
    State(state): State<AppState>,
    Extension(student): Extension<student::Model>,
) -> (StatusCode, Json<ApiResponse<TokenStatus>>) {
    let tokens = state.tokens();
    let has_token = tokens.has_available_token(student.id).await;
    let cooldown_remaining = tokens.cooldown_remaining(student.id).await;

    (
        StatusCode::OK,
        Json(ApiResponse::success(
            TokenStatus {
                has_token,
                cooldown_remaining,
                cooldown_remaining_minutes: cooldown_minutes(cooldown_remaining),
            },
            "Token status retrieved",
        )),
    )
}
