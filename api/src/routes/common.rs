use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use services::AppError;
use validator::ValidationErrors;

use crate::response::ApiError;

/// Joins every field message into one `; `-separated string.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .values()
        .flat_map(|errs| {
            errs.iter()
                .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

/// `Json<T>` whose rejection (bad syntax, wrong shape, missing content type)
/// is reported through the `ApiResponse` envelope as a `validation_error`.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| ApiJson(value))
            .map_err(|rejection| ApiError(AppError::Validation(rejection.body_text())))
    }
}
