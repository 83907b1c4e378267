//! Composed read views over customers, sites, jobs and notes.
//!
//! Every view is read inside one repeatable-read, read-only transaction so the
//! fan-out queries see a single consistent snapshot. Deleted rows are never
//! part of a view; a deleted or missing entity on the path fails the whole
//! composition with `NotFound`.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgConnection, Pool, Postgres, Row, Transaction};
use uuid::Uuid;

use wellatlas_core::{
    CustomerView, Error, Job, JobView, Result, SiteDetailView, SiteView, SiteWithJobs,
    ViewAssembler,
};

use crate::customers::{customer_from_row, CUSTOMER_COLUMNS};
use crate::job_notes::list_notes_for_job;
use crate::jobs::{job_from_row, list_active_for_site, JOB_COLUMNS};
use crate::site_filter::active_clause;
use crate::sites::{site_view_from_row, SITE_VIEW_COLUMNS};

/// PostgreSQL implementation of ViewAssembler.
#[derive(Clone)]
pub struct PgViewAssembler {
    pool: Pool<Postgres>,
}

impl PgViewAssembler {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Open a repeatable-read, read-only transaction.
pub(crate) async fn begin_snapshot(pool: &Pool<Postgres>) -> Result<Transaction<'static, Postgres>> {
    let mut tx = pool.begin().await.map_err(Error::Database)?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;
    Ok(tx)
}

/// An active site joined with its customer's name.
async fn active_site_view(conn: &mut PgConnection, site_id: Uuid) -> Result<Option<SiteView>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM site s JOIN customer c ON c.id = s.customer_id WHERE s.id = $1 AND {}",
        SITE_VIEW_COLUMNS,
        active_clause("s")
    ))
    .bind(site_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(Error::Database)?;

    row.as_ref().map(site_view_from_row).transpose()
}

pub(crate) async fn customer_view_on(
    conn: &mut PgConnection,
    customer_id: Uuid,
) -> Result<CustomerView> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM customer WHERE id = $1",
        CUSTOMER_COLUMNS
    ))
    .bind(customer_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(Error::Database)?;
    let customer = row
        .as_ref()
        .map(customer_from_row)
        .ok_or_else(|| Error::not_found("Customer", customer_id))?;

    let site_rows = sqlx::query(&format!(
        "SELECT {} FROM site s JOIN customer c ON c.id = s.customer_id \
         WHERE s.customer_id = $1 AND {} ORDER BY s.name, s.id",
        SITE_VIEW_COLUMNS,
        active_clause("s")
    ))
    .bind(customer_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(Error::Database)?;
    let sites = site_rows
        .iter()
        .map(site_view_from_row)
        .collect::<Result<Vec<_>>>()?;

    // One query for every site's jobs rather than one per site.
    let site_ids: Vec<Uuid> = sites.iter().map(|s| s.id).collect();
    let job_rows = sqlx::query(&format!(
        "SELECT {} FROM job j WHERE j.site_id = ANY($1) AND {} ORDER BY j.created_at DESC, j.id DESC",
        JOB_COLUMNS,
        active_clause("j")
    ))
    .bind(&site_ids)
    .fetch_all(&mut *conn)
    .await
    .map_err(Error::Database)?;

    let mut jobs_by_site: HashMap<Uuid, Vec<Job>> = HashMap::new();
    for r in &job_rows {
        let site_id: Uuid = r.get("site_id");
        jobs_by_site.entry(site_id).or_default().push(job_from_row(r)?);
    }

    let sites = sites
        .into_iter()
        .map(|site| {
            let jobs = jobs_by_site.remove(&site.id).unwrap_or_default();
            SiteWithJobs { site, jobs }
        })
        .collect();

    Ok(CustomerView { customer, sites })
}

pub(crate) async fn job_view_on(conn: &mut PgConnection, job_id: Uuid) -> Result<JobView> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM job j WHERE j.id = $1 AND {}",
        JOB_COLUMNS,
        active_clause("j")
    ))
    .bind(job_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(Error::Database)?;
    let job = match row {
        Some(r) => job_from_row(&r)?,
        None => return Err(Error::not_found("Job", job_id)),
    };

    // A live job under a deleted site is not reachable either.
    let site = active_site_view(conn, job.site_id)
        .await?
        .ok_or_else(|| Error::not_found("Job", job_id))?;

    let notes = list_notes_for_job(conn, job.id).await?;

    Ok(JobView {
        customer_name: site.customer_name.clone(),
        job,
        site,
        notes,
    })
}

#[async_trait]
impl ViewAssembler for PgViewAssembler {
    async fn customer_view(&self, customer_id: Uuid) -> Result<CustomerView> {
        let mut tx = begin_snapshot(&self.pool).await?;
        let view = customer_view_on(&mut tx, customer_id).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(view)
    }

    async fn site_view(&self, site_id: Uuid) -> Result<SiteDetailView> {
        let mut tx = begin_snapshot(&self.pool).await?;
        let site = active_site_view(&mut tx, site_id)
            .await?
            .ok_or_else(|| Error::not_found("Site", site_id))?;
        let jobs = list_active_for_site(&mut tx, site_id).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(SiteDetailView { site, jobs })
    }

    async fn job_view(&self, job_id: Uuid) -> Result<JobView> {
        let mut tx = begin_snapshot(&self.pool).await?;
        let view = job_view_on(&mut tx, job_id).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(view)
    }
}
