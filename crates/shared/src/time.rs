use chrono::{DateTime, NaiveDateTime};

const DISPLAY_FORMAT: &str = "%d %b %Y %H:%M";

/// Render a server timestamp for display.
///
/// The API emits both RFC 3339 and naive ISO timestamps. The wall-clock time
/// is shown as sent, without converting time zones. Unparseable input is
/// returned unchanged.
pub fn format_timestamp(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format(DISPLAY_FORMAT).to_string();
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return dt.format(DISPLAY_FORMAT).to_string();
        }
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_rfc3339() {
        assert_eq!(format_timestamp("2024-05-01T18:30:00Z"), "01 May 2024 18:30");
        assert_eq!(format_timestamp("2024-05-01T18:30:00+03:00"), "01 May 2024 18:30");
    }

    #[test]
    fn test_format_naive() {
        assert_eq!(format_timestamp("2024-05-01T18:30:00"), "01 May 2024 18:30");
        assert_eq!(format_timestamp("2024-05-01T18:30:00.123456"), "01 May 2024 18:30");
        assert_eq!(format_timestamp("2024-05-01 09:05:00"), "01 May 2024 09:05");
    }

    #[test]
    fn test_format_garbage_passthrough() {
        assert_eq!(format_timestamp("tomorrow"), "tomorrow");
        assert_eq!(format_timestamp(""), "");
    }
}
