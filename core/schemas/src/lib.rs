use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Field map for one section of a daily record: metric name → JSON value.
pub type Fields = BTreeMap<String, Value>;

// ============================================================================
// ULID and ID Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BriefingId(pub String);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for BriefingId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Day Keys
// ============================================================================

/// Calendar date a record is keyed by. Serialized as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayKey(pub NaiveDate);

impl DayKey {
    pub const FORMAT: &'static str = "%Y-%m-%d";

    pub fn parse(s: &str) -> Result<Self, chrono::ParseError> {
        s.parse()
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl FromStr for DayKey {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), Self::FORMAT).map(DayKey)
    }
}

impl From<NaiveDate> for DayKey {
    fn from(date: NaiveDate) -> Self {
        DayKey(date)
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}

// ============================================================================
// Daily Record Schema
// ============================================================================

/// Where a record fragment came from. Each source writes its own section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordSource {
    #[serde(rename = "manual")]
    Manual,
    #[serde(rename = "device")]
    Device,
}

impl RecordSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordSource::Manual => "manual",
            RecordSource::Device => "device",
        }
    }

    /// The section a fragment from this source does not write to.
    pub fn other(&self) -> RecordSource {
        match self {
            RecordSource::Manual => RecordSource::Device,
            RecordSource::Device => RecordSource::Manual,
        }
    }
}

/// Merged document for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: DayKey,
    #[serde(default, alias = "fitbit")]
    pub device: Fields,
    #[serde(default)]
    pub manual: Fields,
}

impl DailyRecord {
    pub fn new(date: DayKey) -> Self {
        Self {
            date,
            device: Fields::new(),
            manual: Fields::new(),
        }
    }

    pub fn section(&self, source: RecordSource) -> &Fields {
        match source {
            RecordSource::Manual => &self.manual,
            RecordSource::Device => &self.device,
        }
    }

    pub fn section_mut(&mut self, source: RecordSource) -> &mut Fields {
        match source {
            RecordSource::Manual => &mut self.manual,
            RecordSource::Device => &mut self.device,
        }
    }

    /// Look up a metric, device section first. `null` counts as absent.
    pub fn metric(&self, name: &str) -> Option<&Value> {
        [&self.device, &self.manual]
            .into_iter()
            .filter_map(|fields| fields.get(name))
            .find(|value| !value.is_null())
    }

    /// Every non-null value for a metric, device section first.
    pub fn metric_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        [&self.device, &self.manual]
            .into_iter()
            .filter_map(move |fields| fields.get(name))
            .filter(|value| !value.is_null())
    }

    pub fn is_empty(&self) -> bool {
        self.device.is_empty() && self.manual.is_empty()
    }
}

// ============================================================================
// Flags
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    ShortSleep,
    LowHrv,
    HighStress,
    Anxiety,
    LateCaffeine,
}

impl Flag {
    pub const ALL: [Flag; 5] = [
        Flag::ShortSleep,
        Flag::LowHrv,
        Flag::HighStress,
        Flag::Anxiety,
        Flag::LateCaffeine,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Flag::ShortSleep => "short_sleep",
            Flag::LowHrv => "low_hrv",
            Flag::HighStress => "high_stress",
            Flag::Anxiety => "anxiety",
            Flag::LateCaffeine => "late_caffeine",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Flag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Flag::ALL
            .into_iter()
            .find(|flag| flag.as_str() == s)
            .ok_or_else(|| format!("unknown flag: {}", s))
    }
}

/// Derived condition flags for one day. Every flag in [`Flag::ALL`] is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayFlags(BTreeMap<Flag, bool>);

impl Default for DayFlags {
    fn default() -> Self {
        Self::none()
    }
}

impl DayFlags {
    /// All flags false.
    pub fn none() -> Self {
        Self(Flag::ALL.into_iter().map(|flag| (flag, false)).collect())
    }

    pub fn set(&mut self, flag: Flag, value: bool) {
        self.0.insert(flag, value);
    }

    pub fn is_set(&self, flag: Flag) -> bool {
        self.0.get(&flag).copied().unwrap_or(false)
    }

    /// True flags, in [`Flag::ALL`] order.
    pub fn active(&self) -> impl Iterator<Item = Flag> + '_ {
        self.0.iter().filter(|(_, on)| **on).map(|(flag, _)| *flag)
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    /// Flags true on both days.
    pub fn shared_with(&self, other: &DayFlags) -> BTreeSet<Flag> {
        self.active().filter(|flag| other.is_set(*flag)).collect()
    }

    /// Fraction of flags that are true, in `[0, 1]`.
    pub fn score(&self) -> f64 {
        if self.0.is_empty() {
            return 0.0;
        }
        self.active_count() as f64 / self.0.len() as f64
    }

    pub fn iter(&self) -> impl Iterator<Item = (Flag, bool)> + '_ {
        self.0.iter().map(|(flag, on)| (*flag, *on))
    }
}

// ============================================================================
// Corpus
// ============================================================================

/// Snapshot of every stored record, ordered by date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    records: BTreeMap<DayKey, DailyRecord>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing any record already held for its date.
    pub fn insert(&mut self, record: DailyRecord) -> Option<DailyRecord> {
        self.records.insert(record.date, record)
    }

    pub fn get(&self, date: &DayKey) -> Option<&DailyRecord> {
        self.records.get(date)
    }

    pub fn contains(&self, date: &DayKey) -> bool {
        self.records.contains_key(date)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in ascending date order.
    pub fn iter(&self) -> impl Iterator<Item = &DailyRecord> {
        self.records.values()
    }

    pub fn dates(&self) -> impl Iterator<Item = &DayKey> {
        self.records.keys()
    }
}

impl FromIterator<DailyRecord> for Corpus {
    fn from_iter<I: IntoIterator<Item = DailyRecord>>(iter: I) -> Self {
        let mut corpus = Corpus::new();
        for record in iter {
            corpus.insert(record);
        }
        corpus
    }
}

// ============================================================================
// Similarity and Pattern Schemas
// ============================================================================

/// A historical day sharing at least one active flag with the target day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityResult {
    pub date: DayKey,
    pub shared: BTreeSet<Flag>,
    pub score: usize,
}

/// A statistic that may be undefined for lack of data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Measurement {
    Defined { value: f64, samples: usize },
    InsufficientData { samples: usize },
}

impl Measurement {
    pub fn value(&self) -> Option<f64> {
        match self {
            Measurement::Defined { value, .. } => Some(*value),
            Measurement::InsufficientData { .. } => None,
        }
    }

    pub fn samples(&self) -> usize {
        match self {
            Measurement::Defined { samples, .. } | Measurement::InsufficientData { samples } => {
                *samples
            }
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Measurement::Defined { .. })
    }
}

/// Numeric metrics tracked by the global aggregator. The serde name is the record field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    SleepHours,
    Hrv,
    Stress,
    Anxiety,
    RestingHeartRate,
    Steps,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::SleepHours,
        Metric::Hrv,
        Metric::Stress,
        Metric::Anxiety,
        Metric::RestingHeartRate,
        Metric::Steps,
    ];

    pub fn field(&self) -> &'static str {
        match self {
            Metric::SleepHours => "sleep_hours",
            Metric::Hrv => "hrv",
            Metric::Stress => "stress",
            Metric::Anxiety => "anxiety",
            Metric::RestingHeartRate => "resting_heart_rate",
            Metric::Steps => "steps",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.field())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalPatternSummary {
    pub day_count: usize,
    pub averages: BTreeMap<Metric, Measurement>,
    pub caffeine_sleep_correlation: Measurement,
    pub high_stress_days: usize,
    /// Co-occurrence with `high_stress` for every other flag, zeros included.
    pub stress_triggers: BTreeMap<Flag, usize>,
}

impl GlobalPatternSummary {
    pub fn average(&self, metric: Metric) -> Measurement {
        self.averages
            .get(&metric)
            .copied()
            .unwrap_or(Measurement::InsufficientData { samples: 0 })
    }

    /// Most frequent stress triggers, count descending then flag order. Zero counts are skipped.
    pub fn top_triggers(&self, n: usize) -> Vec<(Flag, usize)> {
        let mut ranked: Vec<(Flag, usize)> = self
            .stress_triggers
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(flag, count)| (*flag, *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }
}

/// Persisted result of a global recompute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSnapshot {
    pub computed_at: String, // RFC3339
    pub summary: GlobalPatternSummary,
}

// ============================================================================
// Subjective Event Schema
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectiveEvent {
    pub id: EventId,
    pub date: DayKey,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// RFC3339. Empty for events logged before timestamps were kept.
    #[serde(default)]
    pub recorded_at: String,
}

// ============================================================================
// Briefing Schema
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BriefingStyle {
    #[serde(rename = "short")]
    Short,
    #[serde(rename = "standard")]
    Standard,
    #[serde(rename = "detailed")]
    Detailed,
}

impl BriefingStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BriefingStyle::Short => "short",
            BriefingStyle::Standard => "standard",
            BriefingStyle::Detailed => "detailed",
        }
    }
}

impl FromStr for BriefingStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short" => Ok(BriefingStyle::Short),
            "standard" => Ok(BriefingStyle::Standard),
            "detailed" => Ok(BriefingStyle::Detailed),
            other => Err(format!("unknown briefing style: {}", other)),
        }
    }
}

/// Everything known about one day, bundled for an LLM tool layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyBriefing {
    pub briefing_id: BriefingId,
    pub date: DayKey,
    pub record: DailyRecord,
    pub flags: DayFlags,
    pub similar: Vec<SimilarityResult>,
    pub patterns: GlobalPatternSummary,
    pub events: Vec<SubjectiveEvent>,
    pub style: BriefingStyle,
    pub text: String,
}

// ============================================================================
// Helper Functions
// ============================================================================

pub fn generate_event_id() -> EventId {
    EventId(format!("evt_{}", ulid::Ulid::new()))
}

pub fn generate_briefing_id() -> BriefingId {
    BriefingId(format!("brief_{}", ulid::Ulid::new()))
}
