use axum::{Extension, Json, extract::State, http::StatusCode};
use db::models::{admin, student, teacher};
use sea_orm::EntityTrait;
use serde::Serialize;
use services::AppError;
use util::state::AppState;

use crate::auth::{AuthUser, Role};
use crate::response::{ApiError, ApiResponse};

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub role: Role,
    pub user: serde_json::Value,
}

/// GET /auth/me
///
/// Returns the account behind the bearer token.
///
/// ```json
/// {
///   "success": true,
///   "data": { "role": "teacher", "user": { "id": 1, "name": "Ada", "email": "ada@college.edu" } },
///   "message": "User data retrieved successfully"
/// }
/// ```
///
/// - `401 Unauthorized` when the account no longer exists
pub async fn get_me(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> Result<(StatusCode, Json<ApiResponse<MeResponse>>), ApiError> {
    let db = state.db();
    let id = claims.sub;

    let user = match claims.role {
        Role::Student => student::Entity::find_by_id(id)
            .one(db)
            .await
            .map_err(AppError::from)?
            .map(serde_json::to_value),
        Role::Teacher => teacher::Entity::find_by_id(id)
            .one(db)
            .await
            .map_err(AppError::from)?
            .map(serde_json::to_value),
        Role::Admin => admin::Entity::find_by_id(id)
            .one(db)
            .await
            .map_err(AppError::from)?
            .map(serde_json::to_value),
    }
    .ok_or_else(|| ApiError(AppError::Unauthorized("User not found".into())))?
    .map_err(|e| ApiError(AppError::Internal(e.to_string())))?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            MeResponse {
                role: claims.role,
                user,
            },
            "User data retrieved successfully",
        )),
    ))
}
