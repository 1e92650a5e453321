use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Cutoffs the day summarizer compares record fields against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// `short_sleep` when `sleep_hours` is below this.
    pub min_sleep_hours: f64,
    /// `low_hrv` when `hrv` is below this.
    pub min_hrv: f64,
    /// `high_stress` when `stress` is above this.
    pub max_stress: f64,
    /// `anxiety` when a numeric `anxiety` score is above this.
    pub max_anxiety: f64,
    /// `late_caffeine` when any intake is at or after this time of day.
    #[serde(with = "clock_time")]
    pub late_caffeine_cutoff: NaiveTime,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_sleep_hours: 6.0,
            min_hrv: 40.0,
            max_stress: 6.0,
            max_anxiety: 6.0,
            late_caffeine_cutoff: NaiveTime::from_hms_opt(15, 0, 0).unwrap_or_default(),
        }
    }
}

impl Thresholds {
    pub const ENV_MIN_SLEEP_HOURS: &'static str = "HEALTH_MIN_SLEEP_HOURS";
    pub const ENV_MIN_HRV: &'static str = "HEALTH_MIN_HRV";
    pub const ENV_MAX_STRESS: &'static str = "HEALTH_MAX_STRESS";
    pub const ENV_MAX_ANXIETY: &'static str = "HEALTH_MAX_ANXIETY";
    pub const ENV_LATE_CAFFEINE: &'static str = "HEALTH_LATE_CAFFEINE";

    /// Defaults overridden by any `HEALTH_*` threshold variables that are set
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden through an arbitrary key lookup. Unparsable values keep the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut thresholds = Self::default();

        let numeric_overrides: [(&str, &mut f64); 4] = [
            (Self::ENV_MIN_SLEEP_HOURS, &mut thresholds.min_sleep_hours),
            (Self::ENV_MIN_HRV, &mut thresholds.min_hrv),
            (Self::ENV_MAX_STRESS, &mut thresholds.max_stress),
            (Self::ENV_MAX_ANXIETY, &mut thresholds.max_anxiety),
        ];
        for (key, slot) in numeric_overrides {
            if let Some(raw) = lookup(key) {
                match raw.trim().parse::<f64>() {
                    Ok(value) if value.is_finite() => *slot = value,
                    _ => warn!("Ignoring {}={:?}: not a number", key, raw),
                }
            }
        }

        if let Some(raw) = lookup(Self::ENV_LATE_CAFFEINE) {
            match crate::values::parse_time_of_day(&raw) {
                Some(cutoff) => thresholds.late_caffeine_cutoff = cutoff,
                None => warn!(
                    "Ignoring {}={:?}: expected HH:MM",
                    Self::ENV_LATE_CAFFEINE,
                    raw
                ),
            }
        }

        thresholds
    }
}

mod clock_time {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format("%H:%M"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        crate::values::parse_time_of_day(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid time of day: {}", raw)))
    }
}
