//! Site search filter types.
//!
//! A [`SiteFilter`] carries up to three independent, optional criteria. The
//! SQL translation lives in `wellatlas-db`; this module only owns the shape
//! and normalization of the criteria.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Optional criteria for finding sites.
///
/// Every supplied criterion must hold for a site to match (conjunction);
/// absent criteria constrain nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteFilter {
    /// Case-insensitive substring matched against customer name, site name,
    /// site description, job numbers, job descriptions and job note bodies.
    /// Any job under the site counts, including deleted ones.
    pub q: Option<String>,
    /// Exact job category some active job at the site must have.
    pub job: Option<String>,
    /// Exact, case-sensitive customer name.
    pub customer: Option<String>,
}

impl SiteFilter {
    /// Build a filter from raw request parameters.
    ///
    /// Values are trimmed and blank values are treated as absent.
    pub fn new(q: Option<&str>, job: Option<&str>, customer: Option<&str>) -> Self {
        Self {
            q: normalize(q),
            job: normalize(job),
            customer: normalize(customer),
        }
    }

    pub fn with_q(mut self, q: &str) -> Self {
        self.q = normalize(Some(q));
        self
    }

    pub fn with_job(mut self, job: &str) -> Self {
        self.job = normalize(Some(job));
        self
    }

    pub fn with_customer(mut self, customer: &str) -> Self {
        self.customer = normalize(Some(customer));
        self
    }

    /// Number of criteria that were supplied.
    pub fn active_criteria(&self) -> usize {
        [&self.q, &self.job, &self.customer]
            .iter()
            .filter(|c| c.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.active_criteria() == 0
    }

    /// False when some criterion holds text no stored value can contain
    /// (NUL), so the filter matches nothing and needs no query.
    pub fn can_match(&self) -> bool {
        [&self.q, &self.job, &self.customer]
            .iter()
            .filter_map(|c| c.as_deref())
            .all(|c| !c.contains('\0'))
    }
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Ordering policy for site listings and searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteOrder {
    /// Customer name ascending, then site name ascending.
    #[default]
    CustomerName,
    /// Site creation time descending.
    NewestFirst,
}

impl SiteOrder {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SiteOrder::CustomerName => "customer_name",
            SiteOrder::NewestFirst => "newest_first",
        }
    }
}

impl fmt::Display for SiteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SiteOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer_name" => Ok(SiteOrder::CustomerName),
            "newest_first" => Ok(SiteOrder::NewestFirst),
            other => Err(Error::Config(format!(
                "unknown site order '{}' (expected customer_name or newest_first)",
                other
            ))),
        }
    }
}
