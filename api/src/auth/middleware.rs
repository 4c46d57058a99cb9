use axum::{
    Json,
    body::Body,
    extract::{ConnectInfo, FromRequestParts, OriginalUri, State},
    http::{HeaderMap, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::TypedHeader;
use cache::{RateDecision, RateLimitPolicy};
use headers::{Origin, UserAgent};
use serde::Serialize;
use std::net::SocketAddr;
use tracing::{info, warn};
use util::state::AppState;

use crate::auth::claims::AuthUser;
use crate::response::ApiResponse;

/// Logs method, path, IP address, caller (if authenticated), origin, and user-agent
/// for each incoming HTTP request. Skips CORS preflight `OPTIONS` requests.
///
/// ### Usage:
/// ```ignore
/// use axum::Router;
/// use axum::middleware::from_fn;
/// use api::auth::middleware::log_request;
///
/// let app = Router::new().layer(from_fn(log_request));
/// ```
///
/// ### Fields Logged:
/// - `method`: HTTP method used (`GET`, `POST`, etc.)
/// - `path`: Requested URI path
/// - `ip`: Remote IP address of the client
/// - `user`: Account id if authenticated, `0` if not
/// - `role`: Token role if authenticated
/// - `origin`: Value of the `Origin` header if present
/// - `user_agent`: Value of the `User-Agent` header if present
pub async fn log_request(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let (mut parts, body) = req.into_parts();

    if parts.method == Method::OPTIONS {
        let req = Request::from_parts(parts, body);
        return Ok(next.run(req).await);
    }

    let caller = AuthUser::from_request_parts(&mut parts, &())
        .await
        .ok()
        .map(|AuthUser(c)| (c.sub, c.role.as_str()));

    let origin = TypedHeader::<Origin>::from_request_parts(&mut parts, &())
        .await
        .ok()
        .map(|TypedHeader(o)| o.to_string());

    let user_agent = TypedHeader::<UserAgent>::from_request_parts(&mut parts, &())
        .await
        .ok()
        .map(|TypedHeader(ua)| ua.to_string());

    info!(
        method = ?parts.method,
        path = %parts.uri.path(),
        ip = %addr.ip(),
        user = caller.map(|(id, _)| id).unwrap_or(0),
        role = caller.map(|(_, role)| role).unwrap_or("anonymous"),
        origin = origin.unwrap_or_else(|| "unknown".into()),
        user_agent = user_agent.unwrap_or_else(|| "unknown".into()),
        "Incoming request"
    );

    let req = Request::from_parts(parts, body);
    Ok(next.run(req).await)
}

#[derive(Debug, Serialize)]
pub struct RateLimited {
    pub reason: &'static str,
    pub retry_after: u64,
}

/// 5 scans per minute per client and path.
pub async fn limit_attendance(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    enforce_rate_limit(&state, &RateLimitPolicy::attendance(), req, next).await
}

/// 60 requests per minute per client and path.
pub async fn limit_api(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    enforce_rate_limit(&state, &RateLimitPolicy::api(), req, next).await
}

/// 10 attempts per 15 minutes per client and path.
pub async fn limit_auth(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    enforce_rate_limit(&state, &RateLimitPolicy::auth(), req, next).await
}

/// Fixed-window limiter. An unreachable store lets the request through.
async fn enforce_rate_limit(
    state: &AppState,
    policy: &RateLimitPolicy,
    req: Request<Body>,
    next: Next,
) -> Response {
    let client = client_ip(&req);
    let path = req
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.0.path().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    let decision = match state.tokens().hit_rate_limit(policy, &client, &path).await {
        Ok(decision) => decision,
        Err(e) => {
            warn!(scope = policy.scope, error = %e, "Rate limiter unavailable; allowing request");
            return next.run(req).await;
        }
    };

    if decision.limited {
        warn!(scope = policy.scope, client = %client, path = %path, "Rate limit exceeded");
        let body = ApiResponse {
            success: false,
            data: RateLimited {
                reason: "rate_limited",
                retry_after: decision.reset_after,
            },
            message: policy.message.to_owned(),
        };
        let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
        apply_rate_headers(response.headers_mut(), &decision);
        return response;
    }

    let mut response = next.run(req).await;
    apply_rate_headers(response.headers_mut(), &decision);
    response
}

fn apply_rate_headers(headers: &mut HeaderMap, decision: &RateDecision) {
    headers.insert("x-ratelimit-limit", HeaderValue::from(decision.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(decision.remaining));
    headers.insert("x-ratelimit-reset", HeaderValue::from(decision.reset_after));
}

/// Peer address when served with connect info, else the first forwarded hop.
fn client_ip(req: &Request<Body>) -> String {
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_owned())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| "unknown".into())
}
