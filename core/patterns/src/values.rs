use chrono::{DateTime, NaiveTime, Timelike};
use health_insight_schemas::DailyRecord;
use serde_json::Value;
use tracing::debug;

/// Record field holding one or more caffeine intake times.
pub const CAFFEINE_TIME: &str = "caffeine_time";

/// Read a metric as a finite number. Numeric strings are accepted; anything else is missing.
pub fn numeric(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match number {
        Some(n) if n.is_finite() => Some(n),
        _ => {
            debug!("Treating malformed numeric value as missing: {}", value);
            None
        }
    }
}

/// First value of a metric that reads as a number, device section first.
/// A malformed value in one section does not hide a usable one in the other.
pub fn numeric_metric(record: &DailyRecord, name: &str) -> Option<f64> {
    record.metric_values(name).find_map(numeric)
}

/// Intake times from the first section holding at least one parsable time.
pub fn caffeine_metric(record: &DailyRecord) -> Vec<NaiveTime> {
    record
        .metric_values(CAFFEINE_TIME)
        .map(caffeine_times)
        .find(|times| !times.is_empty())
        .unwrap_or_default()
}

/// Parse `HH:MM`, `HH:MM:SS` or an RFC3339 timestamp into a time of day.
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.time()))
}

/// Every parsable intake time in a caffeine field (a string or an array of strings).
pub fn caffeine_times(value: &Value) -> Vec<NaiveTime> {
    let raw: Vec<&str> = match value {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };

    raw.into_iter()
        .filter_map(|s| {
            let parsed = parse_time_of_day(s);
            if parsed.is_none() {
                debug!("Ignoring unparsable caffeine time: {:?}", s);
            }
            parsed
        })
        .collect()
}

/// Time of day as fractional hours, e.g. 15:30 → 15.5.
pub fn hour_fraction(time: NaiveTime) -> f64 {
    time.hour() as f64 + time.minute() as f64 / 60.0 + time.second() as f64 / 3600.0
}
