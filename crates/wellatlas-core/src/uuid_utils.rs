//! UUID v7 utilities for time-ordered identifiers.
//!
//! Every store-assigned identity in wellatlas is a UUIDv7, so ids sort in
//! creation order and embed their creation millisecond.

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

/// Generate a new UUIDv7 identifier.
///
/// # Example
///
/// ```
/// use wellatlas_core::uuid_utils::new_v7;
///
/// let id = new_v7();
/// assert_eq!(id.get_version_num(), 7);
/// ```
#[inline]
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}

/// Extract the embedded creation time from a UUIDv7.
///
/// Returns `None` for any other UUID version.
pub fn extract_timestamp(uuid: &Uuid) -> Option<DateTime<Utc>> {
    if !is_v7(uuid) {
        return None;
    }
    let bytes = uuid.as_bytes();
    let millis = bytes[..6]
        .iter()
        .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
    Utc.timestamp_millis_opt(millis as i64).single()
}

/// Check whether a UUID is version 7.
#[inline]
pub fn is_v7(uuid: &Uuid) -> bool {
    uuid.get_version_num() == 7
}
