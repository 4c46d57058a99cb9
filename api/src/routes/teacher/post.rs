use axum::{Extension, Json, extract::State, http::StatusCode};
use chrono::Utc;
use db::models::teacher;
use serde::Deserialize;
use services::{
    AppError,
    session_service::{CreateSession, CreatedSession, SessionService},
};
use util::{config, state::AppState};
use validator::Validate;

use crate::response::{ApiError, ApiResponse};
use crate::routes::common::{ApiJson, format_validation_errors};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSessionReq {
    #[validate(length(min = 1, max = 200, message = "Subject is required"))]
    pub subject: String,

    #[validate(length(max = 100, message = "Department is too long"))]
    pub department: Option<String>,

    #[validate(range(min = 1, max = 4, message = "Year must be between 1 and 4"))]
    pub year: Option<i32>,

    #[validate(length(max = 20, message = "Section is too long"))]
    pub section: Option<String>,

    #[validate(range(min = 1, max = 1440, message = "expiry_minutes must be between 1 and 1440"))]
    pub expiry_minutes: Option<i64>,
}

/// POST /teacher/sessions
///
/// Opens an attendance session and returns its QR code as an SVG document.
///
/// ### Request Body
/// ```json
/// { "subject": "Networks", "department": "CSE", "year": 2, "section": "A", "expiry_minutes": 5 }
/// ```
///
/// ### Responses
/// - `201 Created`
/// ```json
/// {
///   "success": true,
///   "data": {
///     "session": { "id": 3, "code": "4b0c7a52-...", "subject": "Networks", "active": true, "expires_at": "..." },
///     "qr_svg": "<svg ...>"
///   },
///   "message": "Session created successfully"
/// }
/// ```
/// - `400 Bad Request` (validation failure)
pub async fn create_session(
    State(state): State<AppState>,
    Extension(teacher): Extension<teacher::Model>,
    ApiJson(body): ApiJson<CreateSessionReq>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedSession>>), ApiError> {
    body.validate()
        .map_err(|e| ApiError(AppError::Validation(format_validation_errors(&e))))?;

    let created = SessionService::create(
        state.db(),
        state.tokens(),
        &teacher,
        CreateSession {
            subject: body.subject,
            department: body.department,
            year: body.year,
            section: body.section,
            expiry_minutes: body.expiry_minutes,
        },
        config::session_default_minutes(),
        Utc::now(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(created, "Session created successfully")),
    ))
}
