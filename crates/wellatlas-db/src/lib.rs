//! # wellatlas-db
//!
//! PostgreSQL database layer for wellatlas.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for customers, sites, jobs and job notes
//! - The multi-predicate site search query builder
//! - Composed read views and share token issuance/resolution
//! - Atomic quick-add and the demo data seeder
//!
//! ## Example
//!
//! ```rust,ignore
//! use wellatlas_db::{Database, SiteFilter, SiteOrder, SiteRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/wellatlas").await?;
//!
//!     let filter = SiteFilter::new(Some("pump"), Some("Drilling"), None);
//!     for site in db.sites.search(&filter, SiteOrder::default()).await? {
//!         println!("{} / {}", site.customer_name, site.name);
//!     }
//!     Ok(())
//! }
//! ```
pub mod customers;
pub mod job_notes;
pub mod jobs;
pub mod pool;
pub mod quick_add;
pub mod seed;
pub mod shares;
pub mod site_filter;
pub mod sites;
pub mod views;

// Always compiled so integration tests (in tests/) can share the setup.
pub mod test_fixtures;

// Re-export core types
pub use wellatlas_core::*;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
///
/// Use with `ESCAPE '\'` so user text is matched literally.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

pub use customers::PgCustomerRepository;
pub use job_notes::PgJobNoteRepository;
pub use jobs::PgJobRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use seed::{seed_demo_if_empty, SeedOutcome};
pub use shares::{generate_share_token, is_well_formed_token, PgShareService};
pub use site_filter::{SiteFilterQueryBuilder, SiteFilterResult};
pub use sites::PgSiteRepository;
pub use views::PgViewAssembler;

/// Database handle with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Customer repository (find-or-create by name).
    pub customers: PgCustomerRepository,
    /// Site repository, including search.
    pub sites: PgSiteRepository,
    /// Job repository.
    pub jobs: PgJobRepository,
    /// Append-only job notes.
    pub job_notes: PgJobNoteRepository,
    /// Composed customer/site/job views.
    pub views: PgViewAssembler,
    /// Share token issuance and resolution.
    pub shares: PgShareService,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            customers: PgCustomerRepository::new(pool.clone()),
            sites: PgSiteRepository::new(pool.clone()),
            jobs: PgJobRepository::new(pool.clone()),
            job_notes: PgJobNoteRepository::new(pool.clone()),
            views: PgViewAssembler::new(pool.clone()),
            shares: PgShareService::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Create a customer, site and job in one transaction.
    pub async fn quick_add(&self, req: QuickAdd) -> Result<QuickAddOutcome> {
        quick_add::quick_add(&self.pool, req).await
    }

    /// Populate demo data when the store holds no sites.
    pub async fn seed_demo_if_empty(&self) -> Result<SeedOutcome> {
        seed::seed_demo_if_empty(&self.pool).await
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_plain_text_unchanged() {
        assert_eq!(escape_like("Hilltop Well"), "Hilltop Well");
    }

    #[test]
    fn test_escape_like_wildcards() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("c:\\x"), "c:\\\\x");
    }
}
