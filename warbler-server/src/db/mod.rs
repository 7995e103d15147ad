pub mod connection;
pub mod repositories;
pub mod schema;
pub mod seed;

use chrono::{DateTime, SecondsFormat, Utc};

pub use connection::{parse_database_url, Database, DatabaseLocation, DbConnection, DbPool};

/// Fixed-width RFC 3339 so text ordering in SQL matches time ordering
pub(crate) fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_timestamp_is_fixed_width() {
        let whole = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
        let fractional = whole + chrono::Duration::milliseconds(500);

        assert_eq!(format_timestamp(&whole), "2024-03-05T12:00:00.000000Z");
        assert_eq!(format_timestamp(&whole).len(), format_timestamp(&fractional).len());
        assert!(format_timestamp(&whole) < format_timestamp(&fractional));
    }
}
