//! Append-only job notes.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Pool, Postgres, Row};
use uuid::Uuid;

use wellatlas_core::{new_v7, require_name, Error, JobNote, JobNoteRepository, Result};

use crate::site_filter::active_clause;

/// PostgreSQL implementation of JobNoteRepository.
#[derive(Clone)]
pub struct PgJobNoteRepository {
    pool: Pool<Postgres>,
}

impl PgJobNoteRepository {
    /// Create a new PgJobNoteRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn note_from_row(r: &PgRow) -> JobNote {
    JobNote {
        id: r.get("id"),
        job_id: r.get("job_id"),
        body: r.get("body"),
        created_at: r.get("created_at"),
    }
}

/// Notes of one job, newest first.
pub(crate) async fn list_notes_for_job(conn: &mut PgConnection, job_id: Uuid) -> Result<Vec<JobNote>> {
    let rows = sqlx::query(
        "SELECT id, job_id, body, created_at FROM job_note WHERE job_id = $1 ORDER BY created_at DESC, id DESC",
    )
    .bind(job_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(Error::Database)?;

    Ok(rows.iter().map(note_from_row).collect())
}

#[async_trait]
impl JobNoteRepository for PgJobNoteRepository {
    async fn append(&self, job_id: Uuid, body: &str) -> Result<Uuid> {
        let body = require_name("body", body)?;

        let id: Option<Uuid> = sqlx::query_scalar(&format!(
            r#"
            INSERT INTO job_note (id, job_id, body, created_at)
            SELECT $1, j.id, $3, $4
            FROM job j
            WHERE j.id = $2 AND {}
            RETURNING id
            "#,
            active_clause("j")
        ))
        .bind(new_v7())
        .bind(job_id)
        .bind(&body)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        let id = id.ok_or_else(|| Error::not_found("Job", job_id))?;

        tracing::debug!(
            subsystem = "db",
            component = "job_notes",
            op = "append",
            job_id = %job_id,
            body_len = body.len(),
            "Appended job note"
        );
        Ok(id)
    }

    async fn list_for_job(&self, job_id: Uuid) -> Result<Vec<JobNote>> {
        let mut conn = self.pool.acquire().await.map_err(Error::Database)?;
        list_notes_for_job(&mut conn, job_id).await
    }
}
