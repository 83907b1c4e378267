//! Server configuration from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `DATABASE_URL` | `postgres://localhost/wellatlas` |
//! | `HOST` / `PORT` | `0.0.0.0` / `5000` |
//! | `PUBLIC_BASE_URL` | `http://{HOST}:{PORT}` |
//! | `SEED_DEMO_DATA` | `false` |
//! | `SITE_LIST_ORDER` | `customer_name` (or `newest_first`) |
//! | `DB_MAX_CONNECTIONS` | `10` |
//! | `RATE_LIMIT_ENABLED` / `RATE_LIMIT_REQUESTS` / `RATE_LIMIT_PERIOD_SECS` | `true` / `120` / `60` |
//! | `ALLOWED_ORIGINS` | `http://localhost:5000` |
//! | `LOG_FORMAT` / `LOG_FILE` / `LOG_ANSI` | `text` / unset / auto |
//!
//! Malformed numbers fall back to their default with a warning. An unknown
//! `SITE_LIST_ORDER` is a configuration error.

use std::str::FromStr;

use tracing::warn;
use wellatlas_core::{Error, Result, SiteOrder};

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/wellatlas";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_RATE_LIMIT_REQUESTS: u32 = 120;
pub const DEFAULT_RATE_LIMIT_PERIOD_SECS: u64 = 60;
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:5000";

/// Global request quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests allowed per period (burst size).
    pub requests: u32,
    pub period_secs: u64,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Daily-rotated log file; stdout when unset.
    pub file: Option<String>,
    /// ANSI colour override; auto-detected when unset.
    pub ansi: Option<bool>,
}

impl LogConfig {
    /// Logging settings alone, so logging can start before the rest is parsed.
    pub fn from_env() -> Self {
        Self::from_lookup(&|key: &str| {
            std::env::var(key)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        })
    }

    fn from_lookup(var: &impl Fn(&str) -> Option<String>) -> Self {
        Self {
            format: match var("LOG_FORMAT").as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
            file: var("LOG_FILE"),
            ansi: var("LOG_ANSI").map(|v| v == "true" || v == "1"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Prefix for share URLs handed back to clients, without trailing slash.
    pub public_base_url: String,
    pub seed_demo_data: bool,
    pub site_order: SiteOrder,
    pub db_max_connections: u32,
    /// `None` when rate limiting is disabled.
    pub rate_limit: Option<RateLimitConfig>,
    pub allowed_origins: Vec<String>,
    pub log: LogConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            public_base_url: format!("http://{}:{}", DEFAULT_HOST, DEFAULT_PORT),
            seed_demo_data: false,
            site_order: SiteOrder::default(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            rate_limit: Some(RateLimitConfig {
                requests: DEFAULT_RATE_LIMIT_REQUESTS,
                period_secs: DEFAULT_RATE_LIMIT_PERIOD_SECS,
            }),
            allowed_origins: parse_origins(DEFAULT_ALLOWED_ORIGINS),
            log: LogConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or_default(&var, "PORT", DEFAULT_PORT);
        let public_base_url = var("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://{}:{}", host, port))
            .trim_end_matches('/')
            .to_string();

        let site_order = match var("SITE_LIST_ORDER") {
            Some(v) => SiteOrder::from_str(&v)?,
            None => SiteOrder::default(),
        };

        let rate_limit = if flag(&var, "RATE_LIMIT_ENABLED", true) {
            let requests = parse_or_default(&var, "RATE_LIMIT_REQUESTS", DEFAULT_RATE_LIMIT_REQUESTS);
            let period_secs =
                parse_or_default(&var, "RATE_LIMIT_PERIOD_SECS", DEFAULT_RATE_LIMIT_PERIOD_SECS);
            if requests == 0 || period_secs == 0 {
                return Err(Error::Config(
                    "RATE_LIMIT_REQUESTS and RATE_LIMIT_PERIOD_SECS must be non-zero".to_string(),
                ));
            }
            Some(RateLimitConfig {
                requests,
                period_secs,
            })
        } else {
            None
        };

        let log = LogConfig::from_lookup(&var);

        Ok(Self {
            database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            host,
            port,
            public_base_url,
            seed_demo_data: flag(&var, "SEED_DEMO_DATA", false),
            site_order,
            db_max_connections: parse_or_default(
                &var,
                "DB_MAX_CONNECTIONS",
                DEFAULT_DB_MAX_CONNECTIONS,
            ),
            rate_limit,
            allowed_origins: parse_origins(
                var("ALLOWED_ORIGINS")
                    .as_deref()
                    .unwrap_or(DEFAULT_ALLOWED_ORIGINS),
            ),
            log,
        })
    }

    /// `host:port` for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn flag(var: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

fn parse_or_default<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display + Copy,
{
    match var(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(
                subsystem = "api",
                component = "config",
                variable = key,
                value = %raw,
                default = %default,
                "Malformed setting, using default"
            );
            default
        }),
        None => default,
    }
}

/// Split a comma-separated origin list, dropping blanks.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
