//! Core traits for wellatlas abstractions.
//!
//! These traits define the interfaces the PostgreSQL implementations in
//! `wellatlas-db` satisfy.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;
use crate::site_filter::{SiteFilter, SiteOrder};

// =============================================================================
// CUSTOMER REPOSITORY
// =============================================================================

/// Repository for customers.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Create a customer, or return the existing identity when the name is taken.
    ///
    /// Never fails on a duplicate name; fails with `InvalidInput` on a blank one.
    async fn find_or_create(&self, req: NewCustomer) -> Result<CustomerIdentity>;

    /// Fetch a customer by id.
    async fn get(&self, id: Uuid) -> Result<Customer>;

    /// List all customers ordered by name.
    async fn list(&self) -> Result<Vec<CustomerSummary>>;

    /// Check if a customer exists.
    async fn exists(&self, id: Uuid) -> Result<bool>;
}

// =============================================================================
// SITE REPOSITORY
// =============================================================================

/// Repository for sites, including the multi-predicate search.
#[async_trait]
pub trait SiteRepository: Send + Sync {
    /// Create a site under an existing customer.
    async fn create(&self, req: NewSite) -> Result<Uuid>;

    /// Fetch a site by id regardless of state.
    async fn get(&self, id: Uuid) -> Result<Site>;

    /// Find active sites matching every supplied criterion.
    async fn search(&self, filter: &SiteFilter, order: SiteOrder) -> Result<Vec<SiteView>>;

    /// Active sites of one customer ordered by name.
    async fn list_for_customer(&self, customer_id: Uuid) -> Result<Vec<Site>>;

    /// Mark an active site deleted.
    async fn soft_delete(&self, id: Uuid) -> Result<()>;
}

// =============================================================================
// JOB REPOSITORY
// =============================================================================

/// Repository for jobs.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Create a job at an active site.
    async fn create(&self, req: NewJob) -> Result<Uuid>;

    /// Fetch a job by id regardless of state.
    async fn get(&self, id: Uuid) -> Result<Job>;

    /// Active jobs on active sites ordered by job number.
    async fn list(&self) -> Result<Vec<Job>>;

    /// Active jobs of one site, newest first.
    async fn list_for_site(&self, site_id: Uuid) -> Result<Vec<Job>>;

    /// Mark an active job deleted.
    async fn soft_delete(&self, id: Uuid) -> Result<()>;
}

// =============================================================================
// JOB NOTE REPOSITORY
// =============================================================================

/// Repository for append-only job notes.
#[async_trait]
pub trait JobNoteRepository: Send + Sync {
    /// Append a note to an active job.
    async fn append(&self, job_id: Uuid, body: &str) -> Result<Uuid>;

    /// Notes of one job, newest first.
    async fn list_for_job(&self, job_id: Uuid) -> Result<Vec<JobNote>>;
}

// =============================================================================
// READ VIEWS
// =============================================================================

/// Assembles an entity and everything it owns into one snapshot.
///
/// A missing or deleted entity anywhere on the path is `NotFound` for the
/// whole composition.
#[async_trait]
pub trait ViewAssembler: Send + Sync {
    async fn customer_view(&self, customer_id: Uuid) -> Result<CustomerView>;

    async fn site_view(&self, site_id: Uuid) -> Result<SiteDetailView>;

    async fn job_view(&self, job_id: Uuid) -> Result<JobView>;
}

// =============================================================================
// SHARE TOKENS
// =============================================================================

/// Issues and resolves bearer share tokens.
///
/// Holding a token is the only credential needed to read its scoped subtree.
/// Tokens never expire and cannot be revoked.
#[async_trait]
pub trait ShareTokenService: Send + Sync {
    /// Mint a fresh token for an existing target.
    async fn issue(&self, scope: ShareScope, target_id: Uuid) -> Result<ShareToken>;

    /// Look up the stored record for a token.
    async fn lookup(&self, token: &str) -> Result<Option<ShareToken>>;

    /// Resolve a token to the snapshot it grants access to.
    async fn resolve(&self, token: &str) -> Result<SharedView>;
}
