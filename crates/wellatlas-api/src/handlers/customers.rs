//! Customer HTTP handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use wellatlas_core::{
    CustomerIdentity, CustomerRepository, CustomerSummary, CustomerView, NewCustomer,
    ViewAssembler,
};

use super::parse_id;
use crate::{ApiError, AppState};

/// List all customers ordered by name.
///
/// # Returns
/// - 200 OK with `[{id, name}]`
pub async fn list_customers(
    State(state): State<AppState>,
) -> Result<Json<Vec<CustomerSummary>>, ApiError> {
    Ok(Json(state.db.customers.list().await?))
}

/// Create a customer, or resolve the existing one with the same name.
///
/// # Returns
/// - 200 OK with `{id, created}`; `created` is false when the name was taken
/// - 400 Bad Request when the name is blank
pub async fn create_customer(
    State(state): State<AppState>,
    payload: Result<Json<NewCustomer>, JsonRejection>,
) -> Result<Json<CustomerIdentity>, ApiError> {
    let Json(req) = payload?;
    Ok(Json(state.db.customers.find_or_create(req).await?))
}

/// Customer detail: every active site with its active jobs.
///
/// # Returns
/// - 200 OK with the customer view
/// - 404 Not Found for an unknown id
pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CustomerView>, ApiError> {
    let id = parse_id("Customer", &id)?;
    Ok(Json(state.db.views.customer_view(id).await?))
}
