use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use db::models::attendance_session;
use services::admin_service::AdminService;
use util::state::AppState;

use crate::response::{ApiError, ApiResponse};

/// PUT /admin/sessions/{session_id}/force-end
///
/// Ends any session regardless of owner.
///
/// - `200 OK` with the ended session
/// - `404 Not Found`
pub async fn force_end_session(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
) -> Result<(StatusCode, Json<ApiResponse<attendance_session::Model>>), ApiError> {
    let ended = AdminService::force_end_session(state.db(), state.tokens(), session_id).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(ended, "Session force-ended"))))
}
