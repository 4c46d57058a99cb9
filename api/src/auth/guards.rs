//! Role guards. Each one authenticates the bearer token, checks the role and
//! loads the account row into the request extensions, so handlers take
//! `Extension<student::Model>` (or teacher/admin) directly.

use crate::auth::claims::{AuthUser, Role};
use crate::response::{ApiResponse, Empty};
use axum::{
    Json,
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use db::models::{admin, student, teacher};
use sea_orm::{DbErr, EntityTrait};
use util::state::AppState;

type GuardRejection = (StatusCode, Json<ApiResponse<Empty>>);

fn reject(status: StatusCode, message: &str) -> GuardRejection {
    (status, Json(ApiResponse::error(message)))
}

fn lookup_failed(e: DbErr) -> GuardRejection {
    tracing::error!(error = %e, "Account lookup failed in guard");
    reject(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

/// Helper to extract and validate the caller's claims, then insert them back into the request.
async fn extract_and_insert_authuser(
    mut req: Request<Body>,
) -> Result<(Request<Body>, AuthUser), GuardRejection> {
    let (mut parts, body) = req.into_parts();
    let user = AuthUser::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| reject(StatusCode::UNAUTHORIZED, "No token provided. Access denied."))?;

    req = Request::from_parts(parts, body);
    req.extensions_mut().insert(user.clone());
    Ok((req, user))
}

fn require_role(user: &AuthUser, role: Role, message: &str) -> Result<(), GuardRejection> {
    if user.0.role != role {
        return Err(reject(StatusCode::FORBIDDEN, message));
    }
    Ok(())
}

/// Basic guard to ensure the request is authenticated, whatever the role.
pub async fn allow_authenticated(
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardRejection> {
    let (req, _user) = extract_and_insert_authuser(req).await?;
    Ok(next.run(req).await)
}

/// Student-only guard; inserts the `student::Model`.
pub async fn allow_student(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardRejection> {
    let (mut req, user) = extract_and_insert_authuser(req).await?;
    require_role(&user, Role::Student, "Access denied. Students only.")?;

    let student = student::Entity::find_by_id(user.0.sub)
        .one(state.db())
        .await
        .map_err(lookup_failed)?
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Student not found."))?;

    req.extensions_mut().insert(student);
    Ok(next.run(req).await)
}

/// Teacher-only guard; inserts the `teacher::Model`.
pub async fn allow_teacher(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardRejection> {
    let (mut req, user) = extract_and_insert_authuser(req).await?;
    require_role(&user, Role::Teacher, "Access denied. Teachers only.")?;

    let teacher = teacher::Entity::find_by_id(user.0.sub)
        .one(state.db())
        .await
        .map_err(lookup_failed)?
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Teacher not found."))?;

    req.extensions_mut().insert(teacher);
    Ok(next.run(req).await)
}

/// Admin-only guard; inserts the `admin::Model`.
pub async fn allow_admin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardRejection> {
    let (mut req, user) = extract_and_insert_authuser(req).await?;
    require_role(&user, Role::Admin, "Admin access required")?;

    let admin = admin::Entity::find_by_id(user.0.sub)
        .one(state.db())
        .await
        .map_err(lookup_failed)?
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Admin not found."))?;

    req.extensions_mut().insert(admin);
    Ok(next.run(req).await)
}
