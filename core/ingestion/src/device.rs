use health_insight_schemas::Fields;
use serde_json::{json, Value};
use tracing::debug;

/// Flat keys accepted verbatim when a bundle is already normalized.
const PASSTHROUGH_KEYS: &[&str] = &["sleep_hours", "hrv", "steps", "resting_heart_rate"];

/// Turn a wearable daily bundle `{ activity, sleep, hrv }` into a flat record fragment.
///
/// Reads the Fitbit Web API response shapes:
/// - `sleep.summary.totalMinutesAsleep` → `sleep_hours` (two decimals)
/// - `hrv.hrv[0].value.dailyRmssd` → `hrv`
/// - `activity.summary.steps` → `steps`
/// - `activity.summary.restingHeartRate` → `resting_heart_rate`
///
/// Sections that are missing or shaped differently contribute nothing.
pub fn normalize_device_bundle(bundle: &Value) -> Fields {
    let mut fields = Fields::new();

    for key in PASSTHROUGH_KEYS {
        if let Some(value) = bundle.get(*key).filter(|v| v.is_number()) {
            fields.insert((*key).to_string(), value.clone());
        }
    }

    if let Some(minutes) = bundle
        .pointer("/sleep/summary/totalMinutesAsleep")
        .and_then(Value::as_f64)
    {
        let hours = (minutes / 60.0 * 100.0).round() / 100.0;
        fields.entry("sleep_hours".to_string()).or_insert(json!(hours));
    }

    if let Some(rmssd) = bundle
        .pointer("/hrv/hrv/0/value/dailyRmssd")
        .and_then(Value::as_f64)
    {
        fields.entry("hrv".to_string()).or_insert(json!(rmssd));
    }

    if let Some(steps) = bundle
        .pointer("/activity/summary/steps")
        .and_then(Value::as_u64)
    {
        fields.entry("steps".to_string()).or_insert(json!(steps));
    }

    if let Some(resting) = bundle
        .pointer("/activity/summary/restingHeartRate")
        .and_then(Value::as_f64)
    {
        fields
            .entry("resting_heart_rate".to_string())
            .or_insert(json!(resting));
    }

    debug!("Normalized device bundle into {} fields", fields.len());
    fields
}
