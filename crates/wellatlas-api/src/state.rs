use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use wellatlas_core::SiteOrder;
use wellatlas_db::Database;

use crate::config::{RateLimitConfig, ServerConfig};

/// Global (unkeyed) rate limiter shared by every request.
pub type GlobalRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub public_base_url: String,
    pub site_order: SiteOrder,
    pub rate_limiter: Option<Arc<GlobalRateLimiter>>,
}

impl AppState {
    pub fn new(db: Database, config: &ServerConfig) -> Self {
        Self {
            db,
            public_base_url: config.public_base_url.clone(),
            site_order: config.site_order,
            rate_limiter: config.rate_limit.and_then(build_rate_limiter).map(Arc::new),
        }
    }

    /// Absolute URL under which a share token resolves.
    pub fn share_url(&self, token: &str) -> String {
        format!("{}/share/{}", self.public_base_url, token)
    }
}

/// Allow `requests` per `period_secs`, all of them available as one burst.
fn build_rate_limiter(limit: RateLimitConfig) -> Option<GlobalRateLimiter> {
    let burst = NonZeroU32::new(limit.requests)?;
    let per_request = Duration::from_secs(limit.period_secs) / limit.requests;
    let quota = Quota::with_period(per_request)?.allow_burst(burst);
    Some(RateLimiter::direct(quota))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_allows_burst_then_refuses() {
        let limiter = build_rate_limiter(RateLimitConfig {
            requests: 3,
            period_secs: 60,
        })
        .unwrap();
        for _ in 0..3 {
            assert!(limiter.check().is_ok());
        }
        assert!(limiter.check().is_err());
    }

    #[test]
    fn test_zero_requests_builds_no_limiter() {
        assert!(build_rate_limiter(RateLimitConfig {
            requests: 0,
            period_secs: 60
        })
        .is_none());
    }
}
