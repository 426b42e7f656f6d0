//! Wall-clock helpers. All timestamps persisted to the database are
//! RFC 3339 strings in UTC, matching the teacher's `created_at: Option<String>`
//! convention in the entity layer.

use chrono::{DateTime, Utc};

#[must_use]
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

pub fn parse_rfc3339(s: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

/// Seconds elapsed between `since` (an RFC 3339 timestamp) and now. Negative
/// if `since` is in the future; callers treat that as "just reset".
pub fn seconds_since(since: &str) -> anyhow::Result<i64> {
    let then = parse_rfc3339(since)?;
    Ok((Utc::now() - then).num_seconds())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_rfc3339() {
        let s = now_rfc3339();
        let parsed = parse_rfc3339(&s).unwrap();
        assert!(parsed.timestamp() > 0);
    }

    #[test]
    fn seconds_since_recent_timestamp_is_near_zero() {
        let s = now_rfc3339();
        let elapsed = seconds_since(&s).unwrap();
        assert!((0..2).contains(&elapsed));
    }
}
