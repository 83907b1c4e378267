//! Job repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use wellatlas_core::{
    new_v7, optional_text, require_name, Error, Job, JobCategory, JobRepository, NewJob,
    RecordState, Result, WellMeasurements,
};

use crate::site_filter::active_clause;

pub(crate) const JOB_COLUMNS: &str = "j.id, j.site_id, j.job_number, j.job_category, j.description, \
     j.depth_ft, j.casing_diameter_in, j.pump_hp, j.flow_gpm, j.static_level_ft, j.drawdown_ft, \
     j.install_date, j.status, j.state, j.created_at";

/// Numeric job numbers sort as integers; anything else sorts after them as text.
pub(crate) const JOB_NUMBER_ORDER: &str =
    "CASE WHEN j.job_number ~ '^[0-9]+$' THEN j.job_number::numeric END NULLS LAST, j.job_number, j.id";

/// PostgreSQL implementation of JobRepository.
#[derive(Clone)]
pub struct PgJobRepository {
    pool: Pool<Postgres>,
}

impl PgJobRepository {
    /// Create a new PgJobRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

pub(crate) fn job_from_row(r: &PgRow) -> Result<Job> {
    Ok(Job {
        id: r.get("id"),
        site_id: r.get("site_id"),
        job_number: r.get("job_number"),
        job_category: r.get::<String, _>("job_category").parse::<JobCategory>()?,
        description: r.get("description"),
        measurements: WellMeasurements {
            depth_ft: r.get("depth_ft"),
            casing_diameter_in: r.get("casing_diameter_in"),
            pump_hp: r.get("pump_hp"),
            flow_gpm: r.get("flow_gpm"),
            static_level_ft: r.get("static_level_ft"),
            drawdown_ft: r.get("drawdown_ft"),
            install_date: r.get("install_date"),
            status: r.get("status"),
        },
        state: r.get::<String, _>("state").parse::<RecordState>()?,
        created_at: r.get("created_at"),
    })
}

/// Active jobs of one site, newest first.
pub(crate) async fn list_active_for_site(conn: &mut PgConnection, site_id: Uuid) -> Result<Vec<Job>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM job j WHERE j.site_id = $1 AND {} ORDER BY j.created_at DESC, j.id DESC",
        JOB_COLUMNS,
        active_clause("j")
    ))
    .bind(site_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(Error::Database)?;

    rows.iter().map(job_from_row).collect()
}

/// Insert a job on an open connection or transaction.
///
/// The site must exist and be active; the check and the insert are one statement.
pub(crate) async fn create_job_on(conn: &mut PgConnection, req: NewJob) -> Result<Uuid> {
    let job_number = require_name("job_number", &req.job_number)?;
    let description = optional_text("description", req.description.as_deref())?;
    let m = req.measurements;
    let status = optional_text("status", m.status.as_deref())?;

    let id: Option<Uuid> = sqlx::query_scalar(&format!(
        r#"
        INSERT INTO job (
            id, site_id, job_number, job_category, description,
            depth_ft, casing_diameter_in, pump_hp, flow_gpm, static_level_ft, drawdown_ft,
            install_date, status, state, created_at
        )
        SELECT $1, s.id, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15
        FROM site s
        WHERE s.id = $2 AND {}
        RETURNING id
        "#,
        active_clause("s")
    ))
    .bind(new_v7())
    .bind(req.site_id)
    .bind(&job_number)
    .bind(req.job_category.as_str())
    .bind(description)
    .bind(m.depth_ft)
    .bind(m.casing_diameter_in)
    .bind(m.pump_hp)
    .bind(m.flow_gpm)
    .bind(m.static_level_ft)
    .bind(m.drawdown_ft)
    .bind(m.install_date)
    .bind(status)
    .bind(RecordState::Active.as_str())
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await
    .map_err(Error::Database)?;

    id.ok_or_else(|| Error::not_found("Site", req.site_id))
}

#[async_trait]
impl JobRepository for PgJobRepository {
    async fn create(&self, req: NewJob) -> Result<Uuid> {
        let site_id = req.site_id;
        let mut conn = self.pool.acquire().await.map_err(Error::Database)?;
        let id = create_job_on(&mut conn, req).await?;

        debug!(
            subsystem = "db",
            component = "jobs",
            op = "create",
            job_id = %id,
            site_id = %site_id,
            "Created job"
        );
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Job> {
        let row = sqlx::query(&format!("SELECT {} FROM job j WHERE j.id = $1", JOB_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        match row {
            Some(r) => job_from_row(&r),
            None => Err(Error::not_found("Job", id)),
        }
    }

    async fn list(&self) -> Result<Vec<Job>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM job j JOIN site s ON s.id = j.site_id WHERE {} AND {} ORDER BY {}",
            JOB_COLUMNS,
            active_clause("j"),
            active_clause("s"),
            JOB_NUMBER_ORDER
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(job_from_row).collect()
    }

    async fn list_for_site(&self, site_id: Uuid) -> Result<Vec<Job>> {
        let mut conn = self.pool.acquire().await.map_err(Error::Database)?;
        list_active_for_site(&mut conn, site_id).await
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("UPDATE job SET state = $2 WHERE id = $1 AND state = $3")
            .bind(id)
            .bind(RecordState::Deleted.as_str())
            .bind(RecordState::Active.as_str())
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("Job", id));
        }

        debug!(
            subsystem = "db",
            component = "jobs",
            op = "soft_delete",
            job_id = %id,
            "Job marked deleted"
        );
        Ok(())
    }
}
