use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use chrono::Utc;
use db::models::student;
use serde::Deserialize;
use services::{
    attendance_service::{AttendanceService, MarkOutcome, MarkRequest},
    device_service::parse_device_details,
};
use util::state::AppState;

use crate::response::{ApiError, ApiResponse};
use crate::routes::common::ApiJson;

pub const FINGERPRINT_HEADER: &str = "x-device-fingerprint";

#[derive(Debug, Deserialize)]
pub struct MarkAttendanceReq {
    #[serde(default, alias = "sessionCode")]
    pub session_code: Option<String>,
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// POST /attendance/mark
///
/// Marks the authenticated student present in the session behind a scanned
/// QR code. The device fingerprint travels in the `X-Device-Fingerprint` header.
///
/// ### Request Body
/// ```json
/// { "session_code": "4b0c7a52-2f7e-4d8e-9d3c-1a2b3c4d5e6f" }
/// ```
///
/// ### Responses
/// - `201 Created`
/// ```json
/// {
///   "success": true,
///   "data": {
///     "attendance_id": 17,
///     "subject": "Networks",
///     "marked_at": "2025-10-18T09:01:12Z",
///     "status": "present",
///     "total_attendance_in_session": 23
///   },
///   "message": "Attendance marked successfully!"
/// }
/// ```
/// - `400 Bad Request`: validation, `session_expired`, `already_marked`
/// - `403 Forbidden`: `device_mismatch`
/// - `404 Not Found`: `session_not_found`
/// - `429 Too Many Requests`: `duplicate_request`, `scan_in_progress`, `cooldown_active`
/// ```json
/// {
///   "success": false,
///   "data": { "reason": "cooldown_active", "cooldown_remaining": 3590, "cooldown_remaining_minutes": 60 },
///   "message": "You already marked attendance recently. Try again in 60 minute(s)."
/// }
/// ```
pub async fn mark_attendance(
    State(state): State<AppState>,
    Extension(student): Extension<student::Model>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<MarkAttendanceReq>,
) -> Result<(StatusCode, Json<ApiResponse<MarkOutcome>>), ApiError> {
    let session_code = body.session_code.unwrap_or_default();
    let device = parse_device_details(
        header(&headers, "user-agent"),
        header(&headers, "sec-ch-ua-platform"),
        header(&headers, "sec-ch-ua-mobile"),
    );

    let outcome = AttendanceService::mark(
        state.db(),
        state.tokens(),
        MarkRequest {
            student: &student,
            session_code: &session_code,
            fingerprint: header(&headers, FINGERPRINT_HEADER),
            device,
        },
        Utc::now(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(outcome, "Attendance marked successfully!")),
    ))
}
