//! Share-link issuance and resolution.
//!
//! Tokens are bearer capabilities: whoever holds the URL can read the scoped
//! subtree. Tokens are never logged in full.

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::debug;

use wellatlas_core::{logging::token_prefix, ShareScope, ShareTokenService, SharedView};

use super::parse_id;
use crate::{ApiError, AppState};

async fn issue(
    state: &AppState,
    scope: ShareScope,
    raw_id: &str,
) -> Result<Json<serde_json::Value>, ApiError> {
    let kind = match scope {
        ShareScope::Customer => "Customer",
        ShareScope::Job => "Job",
    };
    let target_id = parse_id(kind, raw_id)?;
    let token = state.db.shares.issue(scope, target_id).await?;
    debug!(
        subsystem = "api",
        component = "share",
        scope = %scope,
        target_id = %target_id,
        token_prefix = token_prefix(&token.token),
        "Share link issued"
    );
    Ok(Json(serde_json::json!({ "url": state.share_url(&token.token) })))
}

/// `POST /share/customer/:id`
///
/// # Returns
/// - 200 OK with `{url}`
/// - 404 Not Found for an unknown customer
pub async fn share_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    issue(&state, ShareScope::Customer, &id).await
}

/// `POST /share/job/:id`
///
/// # Returns
/// - 200 OK with `{url}`
/// - 404 Not Found for an unknown or deleted job
pub async fn share_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    issue(&state, ShareScope::Job, &id).await
}

/// `GET /share/:token`
///
/// Unknown tokens and tokens whose target has gone away are both 404.
pub async fn resolve_share(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<SharedView>, ApiError> {
    Ok(Json(state.db.shares.resolve(&token).await?))
}
