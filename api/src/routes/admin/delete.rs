use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use services::admin_service::AdminService;
use util::state::AppState;

use crate::response::{ApiError, ApiResponse, Empty};

/// DELETE /admin/students/{student_id}
///
/// Removes the student, their attendance records and token history, then
/// drops their device lock and cooldown from the ephemeral store.
pub async fn delete_student(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
) -> Result<(StatusCode, Json<ApiResponse<Empty>>), ApiError> {
    let student = AdminService::delete_student(state.db(), state.tokens(), student_id).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            Empty,
            format!("Student {} deleted", student.roll_number),
        )),
    ))
}

/// DELETE /admin/attendance/{record_id}
///
/// - `200 OK`
/// - `404 Not Found` when no record has that id
pub async fn delete_attendance(
    State(state): State<AppState>,
    Path(record_id): Path<i64>,
) -> Result<(StatusCode, Json<ApiResponse<Empty>>), ApiError> {
    AdminService::delete_attendance(state.db(), record_id).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(Empty, "Attendance record deleted"))))
}
