//! Customer repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Pool, Postgres, Row};
use uuid::Uuid;

use wellatlas_core::{
    new_v7, optional_text, require_name, Customer, CustomerIdentity, CustomerRepository,
    CustomerSummary, Error, NewCustomer, Result,
};

pub(crate) const CUSTOMER_COLUMNS: &str =
    "id, name, address, phone, email, notes, created_at";

/// PostgreSQL implementation of CustomerRepository.
#[derive(Clone)]
pub struct PgCustomerRepository {
    pool: Pool<Postgres>,
}

impl PgCustomerRepository {
    /// Create a new PgCustomerRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

pub(crate) fn customer_from_row(r: &PgRow) -> Customer {
    Customer {
        id: r.get("id"),
        name: r.get("name"),
        address: r.get("address"),
        phone: r.get("phone"),
        email: r.get("email"),
        notes: r.get("notes"),
        created_at: r.get("created_at"),
    }
}

/// Find-or-create on an open connection or transaction.
///
/// The insert is a no-op on a name conflict, in which case the committed
/// row is read back. Two racing callers with the same name both end up
/// with the single surviving id.
pub(crate) async fn find_or_create_on(
    conn: &mut PgConnection,
    req: NewCustomer,
) -> Result<CustomerIdentity> {
    let name = require_name("name", &req.name)?;
    let address = optional_text("address", req.address.as_deref())?;
    let phone = optional_text("phone", req.phone.as_deref())?;
    let email = optional_text("email", req.email.as_deref())?;
    let notes = optional_text("notes", req.notes.as_deref())?;

    let inserted: Option<Uuid> = sqlx::query_scalar(
        r#"
        INSERT INTO customer (id, name, address, phone, email, notes, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (name) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(new_v7())
    .bind(&name)
    .bind(address)
    .bind(phone)
    .bind(email)
    .bind(notes)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await
    .map_err(Error::Database)?;

    if let Some(id) = inserted {
        return Ok(CustomerIdentity { id, created: true });
    }

    let id: Uuid = sqlx::query_scalar("SELECT id FROM customer WHERE name = $1")
        .bind(&name)
        .fetch_one(&mut *conn)
        .await
        .map_err(Error::Database)?;

    Ok(CustomerIdentity { id, created: false })
}

#[async_trait]
impl CustomerRepository for PgCustomerRepository {
    async fn find_or_create(&self, req: NewCustomer) -> Result<CustomerIdentity> {
        let mut conn = self.pool.acquire().await.map_err(Error::Database)?;
        let identity = find_or_create_on(&mut conn, req).await?;

        tracing::debug!(
            subsystem = "db",
            component = "customers",
            op = "find_or_create",
            customer_id = %identity.id,
            created = identity.created,
            "Resolved customer by name"
        );
        Ok(identity)
    }

    async fn get(&self, id: Uuid) -> Result<Customer> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM customer WHERE id = $1",
            CUSTOMER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref()
            .map(customer_from_row)
            .ok_or_else(|| Error::not_found("Customer", id))
    }

    async fn list(&self) -> Result<Vec<CustomerSummary>> {
        let rows = sqlx::query("SELECT id, name FROM customer ORDER BY name, id")
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| CustomerSummary {
                id: r.get("id"),
                name: r.get("name"),
            })
            .collect())
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM customer WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;
        Ok(exists)
    }
}
