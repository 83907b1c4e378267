//! Share token issuance and resolution.
//!
//! A share token is a bearer capability: whoever holds the string can read
//! the scoped subtree with no further identity check. Tokens never expire and
//! have no revocation path, so they suit low-sensitivity sharing only.
//! Full token values are never written to logs.

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use sqlx::{PgConnection, Pool, Postgres, Row};
use tracing::{info, warn};
use uuid::Uuid;

use wellatlas_core::logging::token_prefix;
use wellatlas_core::{Error, Result, ShareScope, ShareToken, ShareTokenService, SharedView};

use crate::site_filter::active_clause;
use crate::views::{begin_snapshot, customer_view_on, job_view_on};

/// Random bytes per token (192 bits).
pub const SHARE_TOKEN_BYTES: usize = 24;

/// Fresh tokens tried before giving up on a run of collisions.
const MAX_ISSUE_ATTEMPTS: usize = 5;

/// Generate a URL-safe token from the operating system's CSPRNG.
pub fn generate_share_token() -> String {
    let mut bytes = [0u8; SHARE_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    base64_url_encode(&bytes)
}

fn base64_url_encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Whether `token` has the shape of a minted token: unpadded base64url of
/// exactly [`SHARE_TOKEN_BYTES`] bytes. Anything else cannot be stored.
pub fn is_well_formed_token(token: &str) -> bool {
    URL_SAFE_NO_PAD
        .decode(token)
        .map(|bytes| bytes.len() == SHARE_TOKEN_BYTES)
        .unwrap_or(false)
}

/// PostgreSQL implementation of ShareTokenService.
#[derive(Clone)]
pub struct PgShareService {
    pool: Pool<Postgres>,
}

impl PgShareService {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Whether the target is a live entity of the given scope.
    async fn target_exists(&self, scope: ShareScope, target_id: Uuid) -> Result<bool> {
        let sql = match scope {
            ShareScope::Customer => "SELECT EXISTS(SELECT 1 FROM customer WHERE id = $1)".to_string(),
            ShareScope::Job => format!(
                "SELECT EXISTS(SELECT 1 FROM job j JOIN site s ON s.id = j.site_id WHERE j.id = $1 AND {} AND {})",
                active_clause("j"),
                active_clause("s")
            ),
        };

        let exists: bool = sqlx::query_scalar(&sql)
            .bind(target_id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(exists)
    }
}

async fn lookup_on(conn: &mut PgConnection, token: &str) -> Result<Option<ShareToken>> {
    let row = sqlx::query("SELECT token, scope, target_id, created_at FROM share_token WHERE token = $1")
        .bind(token)
        .fetch_optional(&mut *conn)
        .await
        .map_err(Error::Database)?;

    match row {
        Some(r) => Ok(Some(ShareToken {
            token: r.get("token"),
            scope: r.get::<String, _>("scope").parse::<ShareScope>()?,
            target_id: r.get("target_id"),
            created_at: r.get("created_at"),
        })),
        None => Ok(None),
    }
}

fn unknown_token() -> Error {
    Error::NotFound("share link not found".to_string())
}

#[async_trait]
impl ShareTokenService for PgShareService {
    async fn issue(&self, scope: ShareScope, target_id: Uuid) -> Result<ShareToken> {
        if !self.target_exists(scope, target_id).await? {
            return Err(Error::not_found(
                match scope {
                    ShareScope::Customer => "Customer",
                    ShareScope::Job => "Job",
                },
                target_id,
            ));
        }

        for attempt in 1..=MAX_ISSUE_ATTEMPTS {
            let token = generate_share_token();

            // The primary key on token is the collision backstop.
            let created_at: Option<DateTime<Utc>> = sqlx::query_scalar(
                r#"
                INSERT INTO share_token (token, scope, target_id, created_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (token) DO NOTHING
                RETURNING created_at
                "#,
            )
            .bind(&token)
            .bind(scope.as_str())
            .bind(target_id)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

            if let Some(created_at) = created_at {
                info!(
                    subsystem = "db",
                    component = "share_tokens",
                    op = "issue",
                    scope = %scope,
                    target_id = %target_id,
                    token_prefix = token_prefix(&token),
                    "Issued share token"
                );
                return Ok(ShareToken {
                    token,
                    scope,
                    target_id,
                    created_at,
                });
            }

            warn!(
                subsystem = "db",
                component = "share_tokens",
                op = "issue",
                attempt,
                "Share token collided with an existing token, regenerating"
            );
        }

        Err(Error::Internal(format!(
            "could not mint a unique share token after {} attempts",
            MAX_ISSUE_ATTEMPTS
        )))
    }

    async fn lookup(&self, token: &str) -> Result<Option<ShareToken>> {
        if !is_well_formed_token(token) {
            return Ok(None);
        }
        let mut conn = self.pool.acquire().await.map_err(Error::Database)?;
        lookup_on(&mut conn, token).await
    }

    async fn resolve(&self, token: &str) -> Result<SharedView> {
        if !is_well_formed_token(token) {
            return Err(unknown_token());
        }
        let mut tx = begin_snapshot(&self.pool).await?;
        let record = lookup_on(&mut tx, token).await?.ok_or_else(unknown_token)?;

        // A deleted or vanished target reads the same as an unknown token.
        let view = match record.scope {
            ShareScope::Customer => customer_view_on(&mut tx, record.target_id)
                .await
                .map(SharedView::Customer),
            ShareScope::Job => job_view_on(&mut tx, record.target_id)
                .await
                .map(SharedView::Job),
        }
        .map_err(|e| match e {
            Error::NotFound(_) => unknown_token(),
            other => other,
        })?;
        tx.commit().await.map_err(Error::Database)?;

        tracing::debug!(
            subsystem = "db",
            component = "share_tokens",
            op = "resolve",
            scope = %record.scope,
            token_prefix = token_prefix(token),
            "Resolved share token"
        );
        Ok(view)
    }
}
