use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use services::admin_service::{AdminService, StoreStats, StudentDetails};
use util::state::AppState;

use crate::response::{ApiError, ApiResponse};

/// GET /admin/students/{student_id}
///
/// Student profile with the 50 most recent attendance records, the 20 most
/// recent token history rows, the remaining cooldown and the bound device.
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "student": { "id": 7, "roll_number": "CS2024-017", "...": "..." },
///     "attendance": [],
///     "token_history": [],
///     "token_cooldown": 1800,
///     "bound_device": "9f2c..."
///   },
///   "message": "Student details retrieved"
/// }
/// ```
pub async fn get_student(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
) -> Result<(StatusCode, Json<ApiResponse<StudentDetails>>), ApiError> {
    let details = AdminService::student_details(state.db(), state.tokens(), student_id).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(details, "Student details retrieved"))))
}

/// GET /admin/store
///
/// Key counts per family plus the full key list of the ephemeral store.
pub async fn store_stats(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<StoreStats>>), ApiError> {
    let stats = AdminService::store_stats(state.tokens()).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(stats, "Store statistics retrieved"))))
}
