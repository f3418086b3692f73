//! InfluxQL for the heatmap aggregate.
//!
//! The window and measurement come from operator configuration, not from
//! requests, so the checks here guard against typos and quoting accidents
//! rather than hostile input.

use regex::Regex;
use std::sync::OnceLock;

pub const FALLBACK_WINDOW: &str = "24h";

fn duration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]+(ms|s|m|h|d|w)$").expect("valid duration pattern"))
}

pub fn is_valid_window(window: &str) -> bool {
    duration_pattern().is_match(window)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub measurement: String,
    pub window: String,
}

impl QuerySpec {
    pub fn new(measurement: impl Into<String>, window: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            window: window.into(),
        }
    }

    pub fn build(&self) -> String {
        build_query(&self.measurement, &self.window)
    }
}

/// Sums the `count` field per latitude/longitude tag pair over the window
/// that just ended.
pub fn build_query(measurement: &str, window: &str) -> String {
    let trimmed = window.trim();
    let window = if is_valid_window(trimmed) {
        trimmed
    } else {
        tracing::warn!(
            window = %window,
            fallback = FALLBACK_WINDOW,
            "invalid heatmap time window; using fallback"
        );
        FALLBACK_WINDOW
    };

    let measurement = measurement.replace('"', "");
    format!(
        r#"SELECT SUM("count") AS hits FROM "{measurement}" WHERE time > now() - {window} GROUP BY "latitude","longitude""#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_grouped_sum_query() {
        assert_eq!(
            build_query("geoip2influx", "24h"),
            r#"SELECT SUM("count") AS hits FROM "geoip2influx" WHERE time > now() - 24h GROUP BY "latitude","longitude""#
        );
    }

    #[test]
    fn valid_windows_are_used_verbatim() {
        for window in ["1ms", "30s", "15m", "12h", "7d", "2w", "0h", "365d"] {
            let query = build_query("geo", window);
            assert!(
                query.contains(&format!("now() - {window} GROUP BY")),
                "{window}: {query}"
            );
        }
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let query = build_query("geo", " 6h\n");
        assert!(query.contains("now() - 6h GROUP BY"));
    }

    #[test]
    fn invalid_windows_fall_back() {
        for window in [
            "",
            "h",
            "24",
            "24 h",
            "24H",
            "1y",
            "-1h",
            "1.5h",
            "24h; DROP DATABASE geo",
            "24h GROUP BY \"x\"",
        ] {
            let query = build_query("geo", window);
            assert!(
                query.contains("now() - 24h GROUP BY"),
                "{window:?}: {query}"
            );
            assert!(!query.contains("DROP"));
        }
    }

    #[test]
    fn strips_quotes_from_measurement() {
        let query = build_query(r#"geo" WHERE 1=1 --"#, "1h");
        assert!(query.contains(r#"FROM "geo WHERE 1=1 --" WHERE"#));
        assert_eq!(query.matches('"').count(), 8);
    }

    #[test]
    fn window_grammar() {
        assert!(is_valid_window("10m"));
        assert!(is_valid_window("10ms"));
        assert!(!is_valid_window("10mss"));
        assert!(!is_valid_window("m10"));
    }

    #[test]
    fn query_builds_from_fields() {
        let spec = QuerySpec::new("geo", "bogus");
        assert_eq!(spec.build(), build_query("geo", "24h"));
    }
}
