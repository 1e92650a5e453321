use health_insight_schemas::{Corpus, DailyRecord, DayKey, Fields, RecordSource};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::files::{read_json, write_json};
use crate::merge::merge_fragment;

/// Parse a `YYYY-MM-DD` key supplied by a caller.
pub fn parse_day_key(raw: &str) -> StoreResult<DayKey> {
    DayKey::parse(raw).map_err(|_| StoreError::InvalidDate(raw.to_string()))
}

/// Date-keyed record storage. Writes go through a non-overwriting merge.
pub trait RecordStore {
    fn get(&self, date: &DayKey) -> StoreResult<Option<DailyRecord>>;

    /// Fill absent fields of the record for `date` from `fragment`, creating the record if needed.
    fn upsert_merge(
        &mut self,
        date: &DayKey,
        source: RecordSource,
        fragment: Fields,
    ) -> StoreResult<DailyRecord>;

    /// Every stored date, ascending.
    fn list_all(&self) -> StoreResult<Vec<DayKey>>;

    /// Snapshot of all records for the pattern engine.
    fn load_corpus(&self) -> StoreResult<Corpus> {
        let mut corpus = Corpus::new();
        for date in self.list_all()? {
            if let Some(record) = self.get(&date)? {
                corpus.insert(record);
            }
        }
        Ok(corpus)
    }
}

/// One pretty-printed JSON document per day under `<data_dir>/daily/`.
pub struct JsonDayStore {
    daily_dir: PathBuf,
}

impl JsonDayStore {
    pub const DAILY_DIR: &'static str = "daily";

    /// Open (and create if needed) the daily directory under `data_dir`
    pub fn open<P: AsRef<Path>>(data_dir: P) -> StoreResult<Self> {
        let daily_dir = data_dir.as_ref().join(Self::DAILY_DIR);
        fs::create_dir_all(&daily_dir).map_err(|e| StoreError::io(&daily_dir, e))?;

        info!("Daily record store opened at: {}", daily_dir.display());
        Ok(Self { daily_dir })
    }

    pub fn path_for(&self, date: &DayKey) -> PathBuf {
        self.daily_dir.join(format!("{}.json", date))
    }

    pub fn daily_dir(&self) -> &Path {
        &self.daily_dir
    }
}

impl RecordStore for JsonDayStore {
    fn get(&self, date: &DayKey) -> StoreResult<Option<DailyRecord>> {
        let path = self.path_for(date);
        let Some(mut raw) = read_json::<Value>(&path)? else {
            return Ok(None);
        };

        // The filename is authoritative; older documents may omit the date or disagree.
        if let Value::Object(ref mut map) = raw {
            let key = Value::String(date.to_string());
            match map.get("date") {
                Some(stored) if *stored != key => warn!(
                    "Record {} carries date {}, using the filename",
                    path.display(),
                    stored
                ),
                _ => {}
            }
            map.insert("date".to_string(), key);
        }

        let record: DailyRecord =
            serde_json::from_value(raw).map_err(|e| StoreError::json(&path, e))?;
        Ok(Some(record))
    }

    fn upsert_merge(
        &mut self,
        date: &DayKey,
        source: RecordSource,
        fragment: Fields,
    ) -> StoreResult<DailyRecord> {
        let mut record = self.get(date)?.unwrap_or_else(|| DailyRecord::new(*date));
        let outcome = merge_fragment(&mut record, source, fragment);

        if !outcome.kept.is_empty() {
            info!(
                "Record {} kept existing {} values for: {}",
                date,
                source.as_str(),
                outcome.kept.join(", ")
            );
        }

        write_json(&self.path_for(date), &record)?;
        debug!("Saved record {}", date);
        Ok(record)
    }

    fn list_all(&self) -> StoreResult<Vec<DayKey>> {
        let entries =
            fs::read_dir(&self.daily_dir).map_err(|e| StoreError::io(&self.daily_dir, e))?;

        let mut dates = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| StoreError::io(&self.daily_dir, e))?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            match DayKey::parse(stem) {
                Ok(date) => dates.push(date),
                Err(_) => warn!("Skipping non-date file in daily store: {}", path.display()),
            }
        }

        dates.sort();
        Ok(dates)
    }
}

/// Volatile store with the same merge semantics, for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: BTreeMap<DayKey, DailyRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for InMemoryStore {
    fn get(&self, date: &DayKey) -> StoreResult<Option<DailyRecord>> {
        Ok(self.records.get(date).cloned())
    }

    fn upsert_merge(
        &mut self,
        date: &DayKey,
        source: RecordSource,
        fragment: Fields,
    ) -> StoreResult<DailyRecord> {
        let record = self
            .records
            .entry(*date)
            .or_insert_with(|| DailyRecord::new(*date));
        merge_fragment(record, source, fragment);
        Ok(record.clone())
    }

    fn list_all(&self) -> StoreResult<Vec<DayKey>> {
        Ok(self.records.keys().copied().collect())
    }
}
