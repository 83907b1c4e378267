//! Site HTTP handlers, including the filtered site listing.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::debug;
use uuid::Uuid;

use wellatlas_core::{
    optional_text, require_name, GeoPoint, NewSite, SiteDetailView, SiteFilter, SiteRepository,
    SiteView, ViewAssembler,
};

use super::parse_id;
use crate::{ApiError, AppState};

/// Query parameters for `GET /api/sites`. Blank values are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct SiteSearchQuery {
    /// Free-text term matched against customer, site, job and note text.
    pub q: Option<String>,
    /// Job category some active job at the site must have.
    pub job: Option<String>,
    /// Exact customer name.
    pub customer: Option<String>,
}

impl SiteSearchQuery {
    pub fn to_filter(&self) -> SiteFilter {
        SiteFilter::new(
            self.q.as_deref(),
            self.job.as_deref(),
            self.customer.as_deref(),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSiteRequest {
    pub customer_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Number or numeric string; malformed values are dropped.
    #[serde(default)]
    pub latitude: Option<JsonValue>,
    #[serde(default)]
    pub longitude: Option<JsonValue>,
}

/// Search active sites.
///
/// # Query Parameters
/// - `q`, `job`, `customer`: optional, combined with AND
///
/// # Returns
/// - 200 OK with matching sites in the configured order
pub async fn list_sites(
    State(state): State<AppState>,
    Query(query): Query<SiteSearchQuery>,
) -> Result<Json<Vec<SiteView>>, ApiError> {
    let filter = query.to_filter();
    debug!(
        subsystem = "api",
        component = "sites",
        predicate_count = filter.active_criteria(),
        order = %state.site_order,
        "Site search"
    );
    Ok(Json(state.db.sites.search(&filter, state.site_order).await?))
}

/// Create a site under an existing customer.
///
/// # Returns
/// - 200 OK with `{id}`
/// - 400 Bad Request for a blank name
/// - 404 Not Found for an unknown customer
pub async fn create_site(
    State(state): State<AppState>,
    payload: Result<Json<CreateSiteRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(req) = payload?;
    let site = NewSite {
        customer_id: req.customer_id,
        name: require_name("name", &req.name)?,
        description: optional_text("description", req.description.as_deref())?,
        location: GeoPoint::from_loose(req.latitude.as_ref(), req.longitude.as_ref()),
    };
    let id = state.db.sites.create(site).await?;
    Ok(Json(serde_json::json!({ "id": id })))
}

/// Site detail with its active jobs.
///
/// # Returns
/// - 200 OK with the site view
/// - 404 Not Found for an unknown or deleted site
pub async fn get_site(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SiteDetailView>, ApiError> {
    let id = parse_id("Site", &id)?;
    Ok(Json(state.db.views.site_view(id).await?))
}

/// Soft-delete a site.
///
/// # Returns
/// - 204 No Content
/// - 404 Not Found for an unknown or already deleted site
pub async fn delete_site(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id("Site", &id)?;
    state.db.sites.soft_delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_blank_values_are_absent() {
        let query = SiteSearchQuery {
            q: Some("  ".to_string()),
            job: Some("Ag".to_string()),
            customer: None,
        };
        let filter = query.to_filter();
        assert!(filter.q.is_none());
        assert_eq!(filter.job.as_deref(), Some("Ag"));
        assert_eq!(filter.active_criteria(), 1);
    }

    #[test]
    fn test_create_site_request_accepts_string_coordinates() {
        let req: CreateSiteRequest = serde_json::from_value(serde_json::json!({
            "customer_id": Uuid::nil(),
            "name": "Ridge",
            "latitude": "40.1",
            "longitude": -122.2
        }))
        .unwrap();
        let point = GeoPoint::from_loose(req.latitude.as_ref(), req.longitude.as_ref()).unwrap();
        assert_eq!(point.latitude, 40.1);
    }
}
