use chrono::{DateTime, NaiveDateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unable to parse datetime: {0:?}")]
pub struct DateTimeError(pub String);

enum Layout {
    /// Naive layout, interpreted as UTC.
    Utc(&'static str),
    Rfc3339,
    /// Layout carrying its own offset.
    Offset(&'static str),
}

/// Tried in order; the first layout that parses wins.
const LAYOUTS: &[Layout] = &[
    Layout::Utc("%Y-%m-%dT%H:%M:%S%.3fZ"),
    Layout::Rfc3339,
    Layout::Utc("%Y-%m-%dT%H:%M:%SZ"),
    Layout::Offset("%Y-%m-%dT%H:%M:%S%.3f%:z"),
    Layout::Offset("%Y-%m-%dT%H:%M:%S%:z"),
];

/// Parses a HAR `startedDateTime`, normalized to UTC.
pub fn parse_har_datetime(value: &str) -> Result<DateTime<Utc>, DateTimeError> {
    LAYOUTS
        .iter()
        .find_map(|layout| try_layout(layout, value))
        .ok_or_else(|| DateTimeError(value.to_string()))
}

fn try_layout(layout: &Layout, value: &str) -> Option<DateTime<Utc>> {
    match layout {
        Layout::Utc(fmt) => NaiveDateTime::parse_from_str(value, fmt)
            .ok()
            .map(|naive| naive.and_utc()),
        Layout::Rfc3339 => DateTime::parse_from_rfc3339(value)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Layout::Offset(fmt) => DateTime::parse_from_str(value, fmt)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_har_datetime;

    fn utc(value: &str) -> String {
        parse_har_datetime(value)
            .unwrap()
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string()
    }

    #[test]
    fn normalizes_offsets_to_utc() {
        assert_eq!(
            utc("2023-01-15T14:30:45.123-08:00"),
            "2023-01-15T22:30:45.123Z"
        );
        assert_eq!(utc("2023-01-01T12:00:00-07:00"), "2023-01-01T19:00:00.000Z");
    }

    #[test]
    fn accepts_har_and_rfc3339_layouts() {
        assert_eq!(utc("2023-01-01T12:00:00.123Z"), "2023-01-01T12:00:00.123Z");
        assert_eq!(utc("2023-01-01T12:00:00Z"), "2023-01-01T12:00:00.000Z");
        assert_eq!(
            utc("2023-01-01T12:00:00.123456789Z"),
            "2023-01-01T12:00:00.123Z"
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_har_datetime("not-a-valid-date").is_err());
        assert!(parse_har_datetime("").is_err());
    }
}
