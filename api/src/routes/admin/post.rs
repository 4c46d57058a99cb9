use std::str::FromStr;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use services::{
    AppError,
    admin_service::{AdminService, FlushTarget},
};
use util::state::AppState;

use crate::response::{ApiError, ApiResponse, Empty};
use crate::routes::common::ApiJson;

/// POST /admin/students/{student_id}/reset-device
///
/// Unbinds the student's device in both stores so the next scan binds anew.
pub async fn reset_device(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
) -> Result<(StatusCode, Json<ApiResponse<Empty>>), ApiError> {
    let student = AdminService::reset_device(state.db(), state.tokens(), student_id).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            Empty,
            format!("Device lock reset for {}", student.roll_number),
        )),
    ))
}

/// POST /admin/students/{student_id}/reset-token
///
/// Clears the student's cooldown so they can mark again immediately.
pub async fn reset_token(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
) -> Result<(StatusCode, Json<ApiResponse<Empty>>), ApiError> {
    let student = AdminService::reset_token(state.db(), state.tokens(), student_id).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            Empty,
            format!("Token cooldown reset for {}", student.roll_number),
        )),
    ))
}

#[derive(Debug, Deserialize)]
pub struct FlushReq {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FlushResult {
    pub flushed: String,
    pub keys_deleted: usize,
}

/// POST /admin/store/flush
///
/// ### Request Body
/// ```json
/// { "type": "tokens" }
/// ```
/// `type` is one of `tokens`, `devices`, `sessions`, `ratelimits` or `all`.
///
/// ### Responses
/// - `200 OK`
/// ```json
/// { "success": true, "data": { "flushed": "tokens", "keys_deleted": 12 }, "message": "Flushed tokens" }
/// ```
/// - `400 Bad Request` for any other `type`
pub async fn flush_store(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<FlushReq>,
) -> Result<(StatusCode, Json<ApiResponse<FlushResult>>), ApiError> {
    let target = body
        .kind
        .as_deref()
        .and_then(|kind| FlushTarget::from_str(kind).ok())
        .ok_or_else(|| {
            AppError::Validation(
                "Invalid type. Use: tokens, devices, sessions, ratelimits, all".into(),
            )
        })?;

    let keys_deleted = AdminService::flush_store(state.db(), state.tokens(), target).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            FlushResult {
                flushed: target.to_string(),
                keys_deleted,
            },
            format!("Flushed {target}"),
        )),
    ))
}
