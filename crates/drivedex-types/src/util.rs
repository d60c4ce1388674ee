use chrono::{DateTime, SecondsFormat, Utc};

/// Current time as an RFC 3339 string, the storage format for all timestamps
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Render a timestamp the way the index stores it
pub fn to_rfc3339(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a stored timestamp back; returns None on malformed input rather
/// than failing a whole row read
pub fn parse_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_round_trip() {
        let ts = parse_rfc3339("2023-04-01T12:30:00Z").unwrap();
        assert_eq!(to_rfc3339(&ts), "2023-04-01T12:30:00Z");
    }

    #[test]
    fn malformed_timestamp_is_none() {
        assert!(parse_rfc3339("yesterday").is_none());
    }
}
