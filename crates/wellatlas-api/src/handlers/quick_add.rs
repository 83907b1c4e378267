//! One-shot creation of customer, site and first job.
//!
//! The body is read as loose JSON: coordinates may arrive as numbers or
//! strings, and anything malformed in an optional field is dropped rather
//! than rejected. Only `customer_name` is required. The body is parsed as
//! JSON whatever `Content-Type` the client sent.

use axum::{body::Bytes, extract::State, Json};
use serde_json::Value as JsonValue;
use tracing::debug;

use wellatlas_core::{optional_text, GeoPoint, JobCategory, QuickAdd};

use crate::{ApiError, AppState};

/// Build a quick-add request from a loosely typed body.
///
/// Fails for a missing customer name, an unrecognised job category, or text
/// containing NUL.
pub fn parse_quick_add(body: &JsonValue) -> Result<QuickAdd, ApiError> {
    let text = |key: &str| optional_text(key, body.get(key).and_then(JsonValue::as_str));

    let customer_name = text("customer_name")?
        .ok_or_else(|| ApiError::BadRequest("customer_name is required".to_string()))?;
    let job_category = match text("job_category")? {
        Some(raw) => Some(raw.parse::<JobCategory>()?),
        None => None,
    };
    let job_number = match text("job_number")? {
        Some(number) => Some(number),
        None => body
            .get("job_number")
            .and_then(JsonValue::as_u64)
            .map(|n| n.to_string()),
    };

    Ok(QuickAdd {
        customer_name,
        site_name: text("site_name")?,
        location: GeoPoint::from_loose(body.get("latitude"), body.get("longitude")),
        job_number,
        job_category,
    })
}

/// `POST /api/quick_add`
///
/// # Returns
/// - 200 OK with `{ok, site_id, customer_id, job_id}`
/// - 400 Bad Request when `customer_name` is missing or blank; nothing is written
pub async fn quick_add(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<JsonValue>, ApiError> {
    let body: JsonValue = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {}", e)))?;
    let req = parse_quick_add(&body)?;
    debug!(
        subsystem = "api",
        component = "quick_add",
        has_location = req.location.is_some(),
        "Quick add"
    );
    let outcome = state.db.quick_add(req).await?;
    Ok(Json(serde_json::json!({
        "ok": true,
        "site_id": outcome.site_id,
        "customer_id": outcome.customer.id,
        "job_id": outcome.job_id,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_customer_name_is_bad_request() {
        for body in [
            json!({}),
            json!({ "customer_name": "   " }),
            json!({ "customer_name": 42 }),
            json!({ "site_name": "Orphan" }),
        ] {
            assert!(matches!(
                parse_quick_add(&body),
                Err(ApiError::BadRequest(_))
            ));
        }
    }

    #[test]
    fn test_malformed_coordinates_are_dropped() {
        let req = parse_quick_add(&json!({
            "customer_name": "Lincoln Irrigation",
            "latitude": "north-ish",
            "longitude": -122.1
        }))
        .unwrap();
        assert_eq!(req.customer_name, "Lincoln Irrigation");
        assert!(req.location.is_none());
    }

    #[test]
    fn test_string_coordinates_and_fields() {
        let req = parse_quick_add(&json!({
            "customer_name": " Madison Wells ",
            "site_name": "Ranch Pump",
            "latitude": "39.93",
            "longitude": "-122.19",
            "job_number": 26002,
            "job_category": "electrical"
        }))
        .unwrap();
        assert_eq!(req.customer_name, "Madison Wells");
        assert_eq!(req.site_name.as_deref(), Some("Ranch Pump"));
        assert_eq!(req.location, GeoPoint::new(39.93, -122.19));
        assert_eq!(req.job_number.as_deref(), Some("26002"));
        assert_eq!(req.job_category, Some(JobCategory::Electrical));
    }

    #[test]
    fn test_nul_in_text_is_bad_request() {
        for body in [
            json!({ "customer_name": "x\u{0}y" }),
            json!({ "customer_name": "Tyler Wells", "site_name": "Gate\u{0}" }),
        ] {
            assert!(matches!(
                parse_quick_add(&body),
                Err(ApiError::BadRequest(_))
            ));
        }
    }

    #[test]
    fn test_unknown_category_is_bad_request() {
        let err = parse_quick_add(&json!({
            "customer_name": "Monroe Pumps",
            "job_category": "Plumbing"
        }))
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
