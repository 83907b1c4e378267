//! HTTP handlers for wellatlas-api.

pub mod customers;
pub mod health;
pub mod jobs;
pub mod quick_add;
pub mod share;
pub mod sites;

use uuid::Uuid;

use crate::ApiError;

/// Parse a path id; anything that is not a UUID cannot name a record.
pub(crate) fn parse_id(kind: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(format!("{} {} not found", kind, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_accepts_uuid() {
        let id = Uuid::now_v7();
        assert_eq!(parse_id("Site", &id.to_string()).unwrap(), id);
    }

    #[test]
    fn test_malformed_id_is_not_found() {
        assert!(matches!(
            parse_id("Site", "not-a-uuid"),
            Err(ApiError::NotFound(_))
        ));
    }
}
