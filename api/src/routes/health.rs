use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use serde::Serialize;
use util::state::AppState;

use crate::response::ApiResponse;

/// Builds the `/health` route group.
///
/// A single `GET /health` endpoint for uptime checks and load balancers.
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: &'static str,
    pub store: &'static str,
}

fn up_down(ok: bool) -> &'static str {
    if ok { "up" } else { "down" }
}

/// GET /health
///
/// Always `200 OK` while the process serves requests; dependency state is
/// reported in the body.
///
/// ```json
/// {
///   "success": true,
///   "data": { "status": "OK", "database": "up", "store": "up" },
///   "message": "Health check passed"
/// }
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = state.db().ping().await.is_ok();
    let store = state.tokens().store().ping().await.is_ok();

    Json(ApiResponse::success(
        HealthStatus {
            status: "OK",
            database: up_down(database),
            store: up_down(store),
        },
        "Health check passed",
    ))
}
