//! Core data models for wellatlas.
//!
//! These types are shared across all wellatlas crates and represent the
//! field-service domain: customers, their sites, jobs performed at those
//! sites, notes on jobs, and share tokens granting read access to them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::Error;

// =============================================================================
// RECORD STATE
// =============================================================================

/// Lifecycle state of a soft-deletable record (sites and jobs).
///
/// Listings and searches only ever return `Active` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordState {
    #[default]
    Active,
    Deleted,
}

impl RecordState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RecordState::Active => "active",
            RecordState::Deleted => "deleted",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, RecordState::Active)
    }
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(RecordState::Active),
            "deleted" => Ok(RecordState::Deleted),
            other => Err(Error::InvalidInput(format!(
                "unknown record state '{}'",
                other
            ))),
        }
    }
}

// =============================================================================
// JOB CATEGORY
// =============================================================================

/// Fixed vocabulary of job categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum JobCategory {
    #[default]
    Domestic,
    Drilling,
    Ag,
    Electrical,
}

impl JobCategory {
    pub const ALL: [JobCategory; 4] = [
        JobCategory::Domestic,
        JobCategory::Drilling,
        JobCategory::Ag,
        JobCategory::Electrical,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            JobCategory::Domestic => "Domestic",
            JobCategory::Drilling => "Drilling",
            JobCategory::Ag => "Ag",
            JobCategory::Electrical => "Electrical",
        }
    }
}

impl fmt::Display for JobCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobCategory {
    type Err = Error;

    /// Parses case-insensitively; the stored form is always the canonical name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        JobCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "unknown job category '{}' (expected one of Domestic, Drilling, Ag, Electrical)",
                    trimmed
                ))
            })
    }
}

// =============================================================================
// SHARE SCOPE
// =============================================================================

/// Entity kind a share token grants read access to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareScope {
    Customer,
    Job,
}

impl ShareScope {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ShareScope::Customer => "customer",
            ShareScope::Job => "job",
        }
    }
}

impl fmt::Display for ShareScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShareScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(ShareScope::Customer),
            "job" => Ok(ShareScope::Job),
            other => Err(Error::InvalidInput(format!(
                "unknown share scope '{}'",
                other
            ))),
        }
    }
}

// =============================================================================
// COORDINATES
// =============================================================================

/// A validated latitude/longitude pair.
///
/// Sites carry either both coordinates or neither; this type is the only way
/// coordinates enter the store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Build a point, rejecting non-finite or out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let lat_ok = latitude.is_finite() && (-90.0..=90.0).contains(&latitude);
        let lon_ok = longitude.is_finite() && (-180.0..=180.0).contains(&longitude);
        (lat_ok && lon_ok).then_some(Self {
            latitude,
            longitude,
        })
    }

    /// Leniently build a point from loosely typed client input.
    ///
    /// Accepts JSON numbers or numeric strings. Anything missing, empty or
    /// malformed degrades to `None` instead of failing the request, and a
    /// half pair is dropped entirely.
    pub fn from_loose(latitude: Option<&JsonValue>, longitude: Option<&JsonValue>) -> Option<Self> {
        let lat = latitude.and_then(parse_loose_coordinate)?;
        let lon = longitude.and_then(parse_loose_coordinate)?;
        Self::new(lat, lon)
    }

    /// Split into the nullable column pair stored on a site row.
    pub fn into_columns(point: Option<Self>) -> (Option<f64>, Option<f64>) {
        match point {
            Some(p) => (Some(p.latitude), Some(p.longitude)),
            None => (None, None),
        }
    }

    /// Rebuild from the nullable column pair; a half pair reads as no point.
    pub fn from_columns(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Self::new(lat, lon),
            _ => None,
        }
    }
}

/// Parse one coordinate from a JSON number or numeric string.
pub fn parse_loose_coordinate(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    }
    .filter(|v| v.is_finite())
}

// =============================================================================
// CUSTOMER TYPES
// =============================================================================

/// A customer of the business. `name` is the only globally unique business key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Minimal customer listing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSummary {
    pub id: Uuid,
    pub name: String,
}

/// Result of find-or-create on a customer name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerIdentity {
    pub id: Uuid,
    /// False when the name already existed and the existing row was reused.
    pub created: bool,
}

/// Request for creating (or resolving) a customer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewCustomer {
    /// A customer with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Trim a required name, rejecting empty or whitespace-only input.
pub fn require_name(field: &str, value: &str) -> Result<String, Error> {
    optional_text(field, Some(value))?
        .ok_or_else(|| Error::InvalidInput(format!("{} is required", field)))
}

/// Trim an optional text field, mapping blank input to `None`.
///
/// Text containing NUL can never be stored and is rejected.
pub fn optional_text(field: &str, value: Option<&str>) -> Result<Option<String>, Error> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) if s.contains('\0') => Err(Error::InvalidInput(format!(
            "{} must not contain NUL characters",
            field
        ))),
        other => Ok(other.map(str::to_string)),
    }
}

// =============================================================================
// SITE TYPES
// =============================================================================

/// A service site owned by exactly one customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub state: RecordState,
    pub created_at: DateTime<Utc>,
}

/// A site joined with its owning customer's name; the search result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteView {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub name: String,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub state: RecordState,
    pub created_at: DateTime<Utc>,
}

impl SiteView {
    pub fn from_site(site: Site, customer_name: impl Into<String>) -> Self {
        Self {
            id: site.id,
            customer_id: site.customer_id,
            customer_name: customer_name.into(),
            name: site.name,
            description: site.description,
            latitude: site.latitude,
            longitude: site.longitude,
            state: site.state,
            created_at: site.created_at,
        }
    }
}

/// Request for creating a site.
#[derive(Debug, Clone)]
pub struct NewSite {
    pub customer_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<GeoPoint>,
}

// =============================================================================
// JOB TYPES
// =============================================================================

/// Engineering measurements recorded against a well job. All optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WellMeasurements {
    #[serde(default)]
    pub depth_ft: Option<f64>,
    #[serde(default)]
    pub casing_diameter_in: Option<f64>,
    #[serde(default)]
    pub pump_hp: Option<f64>,
    #[serde(default)]
    pub flow_gpm: Option<f64>,
    #[serde(default)]
    pub static_level_ft: Option<f64>,
    #[serde(default)]
    pub drawdown_ft: Option<f64>,
    #[serde(default)]
    pub install_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<String>,
}

/// A job performed at a site.
///
/// `job_number` is not unique; it sorts as an integer where it is numeric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub site_id: Uuid,
    pub job_number: String,
    pub job_category: JobCategory,
    pub description: Option<String>,
    #[serde(flatten)]
    pub measurements: WellMeasurements,
    pub state: RecordState,
    pub created_at: DateTime<Utc>,
}

/// Request for creating a job.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub site_id: Uuid,
    pub job_number: String,
    pub job_category: JobCategory,
    pub description: Option<String>,
    pub measurements: WellMeasurements,
}

/// Append-only free-text note on a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobNote {
    pub id: Uuid,
    pub job_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// QUICK ADD
// =============================================================================

/// Job number given to a quick-added job when the caller supplies none.
pub const DEFAULT_QUICK_ADD_JOB_NUMBER: &str = "25999";

/// Site name given to a quick-added site when the caller supplies none.
pub const DEFAULT_QUICK_ADD_SITE_NAME: &str = "New Site";

/// Parsed quick-add request: customer (found or created), site and first job
/// written atomically.
#[derive(Debug, Clone)]
pub struct QuickAdd {
    pub customer_name: String,
    pub site_name: Option<String>,
    pub location: Option<GeoPoint>,
    pub job_number: Option<String>,
    pub job_category: Option<JobCategory>,
}

/// Identities written by a quick-add.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickAddOutcome {
    pub customer: CustomerIdentity,
    pub site_id: Uuid,
    pub job_id: Uuid,
}

// =============================================================================
// SHARE TOKENS
// =============================================================================

/// An immutable bearer capability bound to one (scope, target) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareToken {
    pub token: String,
    pub scope: ShareScope,
    pub target_id: Uuid,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// COMPOSED READ VIEWS
// =============================================================================

/// A site with its active jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteWithJobs {
    pub site: SiteView,
    pub jobs: Vec<Job>,
}

/// A customer with all active sites, each with its active jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerView {
    pub customer: Customer,
    pub sites: Vec<SiteWithJobs>,
}

/// Detail page for one active site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteDetailView {
    pub site: SiteView,
    pub jobs: Vec<Job>,
}

/// A job with its owning site, customer name, and notes newest-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobView {
    pub job: Job,
    pub site: SiteView,
    pub customer_name: String,
    pub notes: Vec<JobNote>,
}

/// The snapshot a resolved share token grants access to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "view", rename_all = "lowercase")]
pub enum SharedView {
    Customer(CustomerView),
    Job(JobView),
}

impl SharedView {
    pub fn scope(&self) -> ShareScope {
        match self {
            SharedView::Customer(_) => ShareScope::Customer,
            SharedView::Job(_) => ShareScope::Job,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_state_roundtrip_str() {
        for state in [RecordState::Active, RecordState::Deleted] {
            assert_eq!(state.as_str().parse::<RecordState>().unwrap(), state);
        }
        assert!("archived".parse::<RecordState>().is_err());
    }

    #[test]
    fn test_record_state_defaults_active() {
        assert!(RecordState::default().is_active());
        assert!(!RecordState::Deleted.is_active());
    }

    #[test]
    fn test_job_category_parses_case_insensitively() {
        assert_eq!("drilling".parse::<JobCategory>().unwrap(), JobCategory::Drilling);
        assert_eq!(" AG ".parse::<JobCategory>().unwrap(), JobCategory::Ag);
        assert_eq!(
            "Electrical".parse::<JobCategory>().unwrap(),
            JobCategory::Electrical
        );
    }

    #[test]
    fn test_job_category_rejects_unknown() {
        let err = "Plumbing".parse::<JobCategory>().unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_share_scope_serializes_lowercase() {
        assert_eq!(serde_json::to_value(ShareScope::Customer).unwrap(), json!("customer"));
        assert_eq!("job".parse::<ShareScope>().unwrap(), ShareScope::Job);
        assert!("site".parse::<ShareScope>().is_err());
    }

    #[test]
    fn test_geo_point_rejects_out_of_range() {
        assert!(GeoPoint::new(40.385, -122.28).is_some());
        assert!(GeoPoint::new(91.0, 0.0).is_none());
        assert!(GeoPoint::new(0.0, -181.0).is_none());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_none());
    }

    #[test]
    fn test_loose_coordinates_accept_numbers_and_strings() {
        let p = GeoPoint::from_loose(Some(&json!(39.728)), Some(&json!("-121.837"))).unwrap();
        assert_eq!(p.latitude, 39.728);
        assert_eq!(p.longitude, -121.837);
    }

    #[test]
    fn test_loose_coordinates_degrade_to_none() {
        assert!(GeoPoint::from_loose(Some(&json!("north")), Some(&json!(-122.0))).is_none());
        assert!(GeoPoint::from_loose(Some(&json!("")), Some(&json!(""))).is_none());
        assert!(GeoPoint::from_loose(None, None).is_none());
        assert!(GeoPoint::from_loose(Some(&json!(null)), Some(&json!(1.0))).is_none());
    }

    #[test]
    fn test_loose_coordinates_drop_half_pair() {
        assert!(GeoPoint::from_loose(Some(&json!(40.0)), None).is_none());
        assert!(GeoPoint::from_loose(None, Some(&json!(-122.0))).is_none());
    }

    #[test]
    fn test_geo_point_columns_are_paired() {
        assert_eq!(GeoPoint::into_columns(None), (None, None));
        let p = GeoPoint::new(1.5, 2.5);
        assert_eq!(GeoPoint::into_columns(p), (Some(1.5), Some(2.5)));
        assert!(GeoPoint::from_columns(Some(1.0), None).is_none());
    }

    #[test]
    fn test_require_name_trims_and_rejects_blank() {
        assert_eq!(require_name("name", "  Acme Wells ").unwrap(), "Acme Wells");
        assert!(matches!(
            require_name("customer_name", "   "),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_optional_text_blank_is_none() {
        assert_eq!(optional_text("notes", Some("  ")).unwrap(), None);
        assert_eq!(
            optional_text("notes", Some(" x ")).unwrap(),
            Some("x".to_string())
        );
        assert_eq!(optional_text("notes", None).unwrap(), None);
    }

    #[test]
    fn test_text_with_nul_is_invalid_input() {
        assert!(matches!(
            require_name("customer_name", "x\0y"),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            optional_text("description", Some("a\0")),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_job_flattens_measurements() {
        let job = Job {
            id: Uuid::nil(),
            site_id: Uuid::nil(),
            job_number: "25001".to_string(),
            job_category: JobCategory::Drilling,
            description: None,
            measurements: WellMeasurements {
                depth_ft: Some(320.0),
                ..Default::default()
            },
            state: RecordState::Active,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["depth_ft"], json!(320.0));
        assert_eq!(value["job_category"], json!("Drilling"));
        assert_eq!(value["state"], json!("active"));
    }

    #[test]
    fn test_shared_view_is_tagged_by_scope() {
        let view = SharedView::Customer(CustomerView {
            customer: Customer {
                id: Uuid::nil(),
                name: "Acme".to_string(),
                address: None,
                phone: None,
                email: None,
                notes: None,
                created_at: Utc::now(),
            },
            sites: vec![],
        });
        assert_eq!(view.scope(), ShareScope::Customer);
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["scope"], json!("customer"));
        assert_eq!(value["view"]["customer"]["name"], json!("Acme"));
    }
}
