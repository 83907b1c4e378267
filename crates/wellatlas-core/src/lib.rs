//! # wellatlas-core
//!
//! Core types, traits, and abstractions for the wellatlas record keeper.
//!
//! This crate provides the domain model (customers, sites, jobs, job notes,
//! share tokens), the error taxonomy and the repository traits that the
//! other wellatlas crates depend on. It performs no I/O.

pub mod error;
pub mod logging;
pub mod models;
pub mod site_filter;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use site_filter::{SiteFilter, SiteOrder};
pub use traits::*;
pub use uuid_utils::{extract_timestamp, is_v7, new_v7};
