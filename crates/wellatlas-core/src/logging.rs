//! Logging conventions shared by the wellatlas crates.
//!
//! Events carry literal `subsystem` (`"api"` or `"db"`), `component` and
//! `op` fields. Share tokens only ever appear through [`token_prefix`].
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown, seeding), share issuance |
//! | DEBUG | Decision points, built queries, config choices |
//! | TRACE | Per-row iteration |

/// Number of characters of a share token that may appear in logs.
pub const TOKEN_LOG_PREFIX_LEN: usize = 6;

/// Truncate a share token to the prefix that is safe to log.
pub fn token_prefix(token: &str) -> &str {
    match token.char_indices().nth(TOKEN_LOG_PREFIX_LEN) {
        Some((idx, _)) => &token[..idx],
        None => token,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_prefix_truncates() {
        assert_eq!(token_prefix("abcdefghijkl"), "abcdef");
    }

    #[test]
    fn test_token_prefix_short_token_unchanged() {
        assert_eq!(token_prefix("abc"), "abc");
        assert_eq!(token_prefix(""), "");
    }
}
