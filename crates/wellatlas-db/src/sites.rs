//! Site repository implementation, including the multi-predicate search.

use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use wellatlas_core::{
    new_v7, optional_text, require_name, Error, GeoPoint, NewSite, RecordState, Result, Site,
    SiteFilter, SiteOrder, SiteRepository, SiteView,
};

use crate::site_filter::{active_clause, bind_params, order_clause, SiteFilterQueryBuilder};

pub(crate) const SITE_COLUMNS: &str =
    "s.id, s.customer_id, s.name, s.description, s.latitude, s.longitude, s.state, s.created_at";

/// Site columns plus the owning customer's name; requires `JOIN customer c`.
pub(crate) const SITE_VIEW_COLUMNS: &str =
    "s.id, s.customer_id, c.name AS customer_name, s.name, s.description, s.latitude, s.longitude, s.state, s.created_at";

/// PostgreSQL implementation of SiteRepository.
#[derive(Clone)]
pub struct PgSiteRepository {
    pool: Pool<Postgres>,
}

impl PgSiteRepository {
    /// Create a new PgSiteRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

pub(crate) fn site_from_row(r: &PgRow) -> Result<Site> {
    Ok(Site {
        id: r.get("id"),
        customer_id: r.get("customer_id"),
        name: r.get("name"),
        description: r.get("description"),
        latitude: r.get("latitude"),
        longitude: r.get("longitude"),
        state: r.get::<String, _>("state").parse::<RecordState>()?,
        created_at: r.get("created_at"),
    })
}

pub(crate) fn site_view_from_row(r: &PgRow) -> Result<SiteView> {
    let customer_name: String = r.get("customer_name");
    Ok(SiteView::from_site(site_from_row(r)?, customer_name))
}

/// Insert a site on an open connection or transaction.
///
/// The owning customer must exist; the check and the insert are one statement.
pub(crate) async fn create_site_on(conn: &mut PgConnection, req: NewSite) -> Result<Uuid> {
    let name = require_name("name", &req.name)?;
    let description = optional_text("description", req.description.as_deref())?;
    let (latitude, longitude) = GeoPoint::into_columns(req.location);

    let id: Option<Uuid> = sqlx::query_scalar(
        r#"
        INSERT INTO site (id, customer_id, name, description, latitude, longitude, state, created_at)
        SELECT $1, c.id, $3, $4, $5, $6, $7, $8
        FROM customer c
        WHERE c.id = $2
        RETURNING id
        "#,
    )
    .bind(new_v7())
    .bind(req.customer_id)
    .bind(&name)
    .bind(description)
    .bind(latitude)
    .bind(longitude)
    .bind(RecordState::Active.as_str())
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await
    .map_err(Error::Database)?;

    id.ok_or_else(|| Error::not_found("Customer", req.customer_id))
}

#[async_trait]
impl SiteRepository for PgSiteRepository {
    async fn create(&self, req: NewSite) -> Result<Uuid> {
        let customer_id = req.customer_id;
        let mut conn = self.pool.acquire().await.map_err(Error::Database)?;
        let id = create_site_on(&mut conn, req).await?;

        debug!(
            subsystem = "db",
            component = "sites",
            op = "create",
            site_id = %id,
            customer_id = %customer_id,
            "Created site"
        );
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Site> {
        let row = sqlx::query(&format!("SELECT {} FROM site s WHERE s.id = $1", SITE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        match row {
            Some(r) => site_from_row(&r),
            None => Err(Error::not_found("Site", id)),
        }
    }

    async fn search(&self, filter: &SiteFilter, order: SiteOrder) -> Result<Vec<SiteView>> {
        let start = Instant::now();
        if !filter.can_match() {
            debug!(
                subsystem = "db",
                component = "site_search",
                op = "search",
                "Filter cannot match any stored value, skipping query"
            );
            return Ok(Vec::new());
        }
        let built = SiteFilterQueryBuilder::new(filter.clone(), 0).build();

        let sql = format!(
            "SELECT {} FROM site s JOIN customer c ON c.id = s.customer_id WHERE {} ORDER BY {}",
            SITE_VIEW_COLUMNS,
            built.where_clause,
            order_clause(order)
        );

        debug!(
            subsystem = "db",
            component = "site_search",
            op = "build",
            predicate_count = built.active_predicates,
            joins = ?built.joins,
            where_clause = %built.where_clause,
            "Built site search predicate"
        );

        let rows = bind_params(sqlx::query(&sql), &built.params)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let sites = rows
            .iter()
            .map(site_view_from_row)
            .collect::<Result<Vec<_>>>()?;

        debug!(
            subsystem = "db",
            component = "site_search",
            op = "search",
            order = %order,
            result_count = sites.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Site search complete"
        );
        Ok(sites)
    }

    async fn list_for_customer(&self, customer_id: Uuid) -> Result<Vec<Site>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM site s WHERE s.customer_id = $1 AND {} ORDER BY s.name, s.id",
            SITE_COLUMNS,
            active_clause("s")
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(site_from_row).collect()
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("UPDATE site SET state = $2 WHERE id = $1 AND state = $3")
            .bind(id)
            .bind(RecordState::Deleted.as_str())
            .bind(RecordState::Active.as_str())
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("Site", id));
        }

        debug!(
            subsystem = "db",
            component = "sites",
            op = "soft_delete",
            site_id = %id,
            "Site marked deleted"
        );
        Ok(())
    }
}
