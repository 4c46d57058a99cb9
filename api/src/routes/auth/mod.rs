//! # auth Routes Module
//!
//! - `post.rs`: teacher/admin login and student register-or-login
//! - `get.rs`: the caller's own account
//!
//! Every POST here sits behind the auth rate limit.

pub mod get;
pub mod post;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use util::state::AppState;

use crate::auth::{guards::allow_authenticated, middleware::limit_auth};
use get::get_me;
use post::{admin_login, student_register, teacher_login};

/// Builds the `/auth` route group.
///
/// - `POST /auth/teacher/login` → `teacher_login`
/// - `POST /auth/admin/login` → `admin_login`
/// - `POST /auth/student/register` → `student_register`
/// - `GET /auth/me` → `get_me`
pub fn auth_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/teacher/login", post(teacher_login))
        .route("/admin/login", post(admin_login))
        .route("/student/register", post(student_register))
        .route_layer(from_fn_with_state(app_state, limit_auth))
        .route("/me", get(get_me).route_layer(from_fn(allow_authenticated)))
}
