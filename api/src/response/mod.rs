use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use services::{AppError, error::cooldown_minutes};

/// Standardized API response wrapper for all outgoing JSON responses.
///
/// ```json
/// {
///   "success": true,
///   "data": { ... },
///   "message": "Some message"
/// }
/// ```
///
/// - `T` is the type of the `data` payload.
/// - `success` is a boolean indicating operation status.
/// - `message` provides a human-readable context string.
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    /// Constructs a success response with the given data and message.
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
        }
    }

    /// Constructs an error response with a message and default `data`.
    pub fn error(message: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self {
            success: false,
            data: T::default(),
            message: message.into(),
        }
    }
}

#[derive(Serialize, Default)]
pub struct Empty;

/// `data` of every rejected request.
#[derive(Debug, Serialize)]
pub struct Rejection {
    pub reason: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown_remaining: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown_remaining_minutes: Option<u64>,
}

/// Request-level wrapper that turns an [`AppError`] into a JSON response.
///
/// Policy and contention rejections are expected and are not logged as
/// errors. Infrastructure failures are logged and reported generically.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AppError::Validation(_) | AppError::SessionExpired | AppError::AlreadyMarked => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) | AppError::SessionNotFound => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) | AppError::DeviceMismatch => StatusCode::FORBIDDEN,
            AppError::DuplicateRequest | AppError::ScanInProgress | AppError::CooldownActive { .. } => {
                StatusCode::TOO_MANY_REQUESTS
            }
            AppError::Database(_) | AppError::Store(_) | AppError::Qr(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let err = self.0;

        let message = if err.is_internal() {
            tracing::error!(error = %err, "Request failed");
            "Internal server error".to_owned()
        } else {
            err.to_string()
        };

        let cooldown = err.cooldown_remaining();
        let body = ApiResponse {
            success: false,
            data: Rejection {
                reason: err.reason(),
                cooldown_remaining: cooldown,
                cooldown_remaining_minutes: cooldown.map(cooldown_minutes),
            },
            message,
        };

        (status, Json(body)).into_response()
    }
}
