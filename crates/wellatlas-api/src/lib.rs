//! # wellatlas-api
//!
//! HTTP surface for the wellatlas record keeper: site search, entity
//! creation and detail views, quick-add, and bearer share links.
//!
//! [`build_router`] assembles the full application with its middleware stack;
//! the `wellatlas-api` binary wires it to configuration, logging and a
//! listener.

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use std::any::Any;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;
use wellatlas_core::logging::token_prefix;

pub use config::ServerConfig;
pub use error::ApiError;
pub use state::{AppState, GlobalRateLimiter};

use handlers::{customers, health, jobs, quick_add, share, sites};

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Generates UUIDv7 request ids so ids sort by arrival time.
#[derive(Clone, Copy, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Turn configured origins into header values, skipping invalid entries.
pub fn parse_allowed_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("Invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect()
}

/// Request path as it may appear in logs: share tokens are cut to a prefix.
pub fn redacted_path(path: &str) -> String {
    match path.strip_prefix("/share/") {
        Some(rest)
            if !rest.is_empty()
                && !rest.contains('/')
                && rest != "customer"
                && rest != "job" =>
        {
            format!("/share/{}…", token_prefix(rest))
        }
        _ => path.to_string(),
    }
}

/// Reject requests once the global quota is spent.
async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    if let Some(limiter) = &state.rate_limiter {
        if limiter.check().is_err() {
            tracing::warn!(subsystem = "api", component = "rate_limit", "Rate limit exceeded");
            return Err((
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({
                    "error": "rate limit exceeded, try again later"
                })),
            ));
        }
    }
    Ok(next.run(request).await)
}

fn handle_panic(_err: Box<dyn Any + Send + 'static>) -> Response {
    ApiError::Internal(wellatlas_core::Error::Internal(
        "request handler panicked".to_string(),
    ))
    .into_response()
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("no such route".to_string())
}

/// Assemble the application router and its middleware stack.
pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    let api = Router::new()
        .route(
            "/customers",
            get(customers::list_customers).post(customers::create_customer),
        )
        .route("/customers/:id", get(customers::get_customer))
        .route("/sites", get(sites::list_sites).post(sites::create_site))
        .route("/sites/:id", get(sites::get_site).delete(sites::delete_site))
        .route("/sites/:id/jobs", post(jobs::create_job))
        .route("/jobs", get(jobs::list_jobs))
        .route("/jobs/:id", get(jobs::get_job).delete(jobs::delete_job))
        .route("/jobs/:id/notes", post(jobs::append_note))
        .route("/quick_add", post(quick_add::quick_add));

    let share = Router::new()
        .route("/customer/:id", post(share::share_customer))
        .route("/job/:id", post(share::share_job))
        .route("/:token", get(share::resolve_share));

    Router::new()
        .route("/healthz", get(health::health_check))
        .nest("/api", api)
        .nest("/share", share)
        .fallback(route_not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %redacted_path(request.uri().path()),
                    request_id = %request_id,
                )
            }),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(parse_allowed_origins(allowed_origins)))
                .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
                .max_age(std::time::Duration::from_secs(3600)),
        )
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}
