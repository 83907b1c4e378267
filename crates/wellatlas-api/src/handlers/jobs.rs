//! Job and job note HTTP handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use wellatlas_core::{
    optional_text, require_name, Job, JobCategory, JobNoteRepository, JobRepository, JobView,
    NewJob, ViewAssembler, WellMeasurements,
};

use super::parse_id;
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub job_number: String,
    /// One of Domestic, Drilling, Ag, Electrical (any case). Defaults to Domestic.
    #[serde(default)]
    pub job_category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub measurements: WellMeasurements,
}

#[derive(Debug, Deserialize)]
pub struct AppendNoteRequest {
    pub body: String,
}

/// Active jobs on active sites, in job-number order.
pub async fn list_jobs(State(state): State<AppState>) -> Result<Json<Vec<Job>>, ApiError> {
    Ok(Json(state.db.jobs.list().await?))
}

/// Create a job at an active site.
///
/// # Returns
/// - 200 OK with `{id}`
/// - 400 Bad Request for a blank job number or unknown category
/// - 404 Not Found for an unknown or deleted site
pub async fn create_job(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
    payload: Result<Json<CreateJobRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let site_id = parse_id("Site", &site_id)?;
    let Json(req) = payload?;
    let job_category = match optional_text("job_category", req.job_category.as_deref())? {
        Some(raw) => raw.parse::<JobCategory>()?,
        None => JobCategory::default(),
    };
    let job = NewJob {
        site_id,
        job_number: require_name("job_number", &req.job_number)?,
        job_category,
        description: optional_text("description", req.description.as_deref())?,
        measurements: req.measurements,
    };
    let id = state.db.jobs.create(job).await?;
    Ok(Json(serde_json::json!({ "id": id })))
}

/// Job detail with its site, customer name and notes.
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobView>, ApiError> {
    let id = parse_id("Job", &id)?;
    Ok(Json(state.db.views.job_view(id).await?))
}

/// Soft-delete a job.
pub async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id("Job", &id)?;
    state.db.jobs.soft_delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Append a note to an active job.
///
/// # Returns
/// - 200 OK with `{id}`
/// - 400 Bad Request for a blank body
/// - 404 Not Found for an unknown or deleted job
pub async fn append_note(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    payload: Result<Json<AppendNoteRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let job_id = parse_id("Job", &job_id)?;
    let Json(req) = payload?;
    let id = state.db.job_notes.append(job_id, &req.body).await?;
    Ok(Json(serde_json::json!({ "id": id })))
}
