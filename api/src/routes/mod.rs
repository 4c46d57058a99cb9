//! HTTP route entry point for `/api/...`.
//!
//! Route groups:
//! - `/health` → liveness and dependency check (public)
//! - `/auth` → teacher/admin login and student register-or-login (auth rate limit)
//! - `/attendance` → scanning and the student's own history (students)
//! - `/teacher` → session lifecycle and dashboards (teachers)
//! - `/admin` → overrides and ephemeral store management (admins)

use axum::{Router, middleware::from_fn_with_state};
use util::state::AppState;

use crate::auth::guards::{allow_admin, allow_student, allow_teacher};
use crate::routes::{
    admin::admin_routes, attendance::attendance_routes, auth::auth_routes, health::health_routes,
    teacher::teacher_routes,
};

pub mod admin;
pub mod attendance;
pub mod auth;
pub mod common;
pub mod health;
pub mod teacher;

/// Builds the complete application router for all HTTP endpoints.
///
/// Role guards run as `route_layer`s so unknown paths still fall through to 404.
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health_routes())
        .nest("/auth", auth_routes(app_state.clone()))
        .nest(
            "/attendance",
            attendance_routes(app_state.clone())
                .route_layer(from_fn_with_state(app_state.clone(), allow_student)),
        )
        .nest(
            "/teacher",
            teacher_routes(app_state.clone())
                .route_layer(from_fn_with_state(app_state.clone(), allow_teacher)),
        )
        .nest(
            "/admin",
            admin_routes().route_layer(from_fn_with_state(app_state.clone(), allow_admin)),
        )
        .with_state(app_state)
}
