use health_insight_schemas::{DailyRecord, DayFlags, Flag, Metric};
use serde_json::Value;
use tracing::debug;

use crate::config::Thresholds;
use crate::values::{caffeine_metric, numeric, numeric_metric};

/// Derives per-day condition flags from a merged record.
///
/// Pure: the same record and thresholds always give the same flags. A flag whose
/// input field is missing or malformed is `false`; summarizing never fails.
#[derive(Debug, Clone, Default)]
pub struct DaySummarizer {
    thresholds: Thresholds,
}

impl DaySummarizer {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn summarize(&self, record: &DailyRecord) -> DayFlags {
        let t = &self.thresholds;
        let mut flags = DayFlags::none();

        flags.set(
            Flag::ShortSleep,
            metric(record, Metric::SleepHours).map_or(false, |hours| hours < t.min_sleep_hours),
        );
        flags.set(
            Flag::LowHrv,
            metric(record, Metric::Hrv).map_or(false, |hrv| hrv < t.min_hrv),
        );
        flags.set(
            Flag::HighStress,
            metric(record, Metric::Stress).map_or(false, |stress| stress > t.max_stress),
        );
        flags.set(Flag::Anxiety, self.anxious(record));
        flags.set(Flag::LateCaffeine, self.late_caffeine(record));

        debug!(
            "Summarized {}: [{}]",
            record.date,
            flags.active().map(|f| f.as_str()).collect::<Vec<_>>().join(", ")
        );
        flags
    }

    /// A boolean indicator counts as-is; a score must exceed `max_anxiety`.
    fn anxious(&self, record: &DailyRecord) -> bool {
        record
            .metric_values(Metric::Anxiety.field())
            .find_map(|value| match value {
                Value::Bool(indicator) => Some(*indicator),
                other => numeric(other).map(|score| score > self.thresholds.max_anxiety),
            })
            .unwrap_or(false)
    }

    fn late_caffeine(&self, record: &DailyRecord) -> bool {
        caffeine_metric(record)
            .iter()
            .any(|time| *time >= self.thresholds.late_caffeine_cutoff)
    }
}

fn metric(record: &DailyRecord, metric: Metric) -> Option<f64> {
    numeric_metric(record, metric.field())
}

#[cfg(test)]
mod tests {
    use super::*;
    use health_insight_schemas::DayKey;
    use serde_json::json;

    fn record(device: Value, manual: Value) -> DailyRecord {
        let mut record = DailyRecord::new(DayKey::parse("2025-02-10").unwrap());
        record.device = serde_json::from_value(device).unwrap();
        record.manual = serde_json::from_value(manual).unwrap();
        record
    }

    fn active(flags: &DayFlags) -> Vec<Flag> {
        flags.active().collect()
    }

    #[test]
    fn test_empty_record_has_no_flags() {
        let flags = DaySummarizer::default().summarize(&record(json!({}), json!({})));
        assert_eq!(flags, DayFlags::none());
    }

    #[test]
    fn test_every_flag_fires() {
        let rec = record(
            json!({ "sleep_hours": 4, "hrv": 20 }),
            json!({ "stress": 8, "anxiety": 7, "caffeine_time": "16:30" }),
        );
        let flags = DaySummarizer::default().summarize(&rec);
        assert_eq!(active(&flags), Flag::ALL.to_vec());
    }

    #[test]
    fn test_threshold_boundaries() {
        // Exactly at the cutoff: below/above comparisons are strict, caffeine is inclusive.
        let rec = record(
            json!({ "sleep_hours": 6.0, "hrv": 40 }),
            json!({ "stress": 6, "anxiety": 6, "caffeine_time": "15:00" }),
        );
        let flags = DaySummarizer::default().summarize(&rec);
        assert_eq!(active(&flags), vec![Flag::LateCaffeine]);

        let rec = record(json!({}), json!({ "caffeine_time": "14:59" }));
        assert!(!DaySummarizer::default().summarize(&rec).is_set(Flag::LateCaffeine));
    }

    #[test]
    fn test_custom_thresholds() {
        let summarizer = DaySummarizer::new(Thresholds {
            min_sleep_hours: 7.5,
            ..Thresholds::default()
        });
        let rec = record(json!({ "sleep_hours": 7 }), json!({}));
        assert!(summarizer.summarize(&rec).is_set(Flag::ShortSleep));
        assert!(!DaySummarizer::default().summarize(&rec).is_set(Flag::ShortSleep));
    }

    #[test]
    fn test_malformed_fields_are_missing() {
        let rec = record(
            json!({ "sleep_hours": "lots", "hrv": { "dailyRmssd": 20 } }),
            json!({ "stress": [9], "anxiety": "high", "caffeine_time": 1700 }),
        );
        assert_eq!(DaySummarizer::default().summarize(&rec), DayFlags::none());
    }

    #[test]
    fn test_anxiety_indicator_and_caffeine_list() {
        let rec = record(
            json!({}),
            json!({ "anxiety": true, "caffeine_time": ["07:30", "bad", "17:15"] }),
        );
        let flags = DaySummarizer::default().summarize(&rec);
        assert_eq!(active(&flags), vec![Flag::Anxiety, Flag::LateCaffeine]);
    }

    #[test]
    fn test_malformed_device_value_does_not_hide_manual() {
        let rec = record(
            json!({ "hrv": "n/a", "anxiety": "unknown", "caffeine_time": "soon" }),
            json!({ "hrv": 20, "anxiety": 8, "caffeine_time": "17:00" }),
        );
        let flags = DaySummarizer::default().summarize(&rec);
        assert_eq!(active(&flags), vec![Flag::LowHrv, Flag::Anxiety, Flag::LateCaffeine]);
    }

    #[test]
    fn test_manual_section_fills_in_for_device() {
        let rec = record(json!({}), json!({ "sleep_hours": "5.5" }));
        assert!(DaySummarizer::default().summarize(&rec).is_set(Flag::ShortSleep));
    }
}
