use health_insight_schemas::{DailyRecord, DayFlags, DayKey};
use std::collections::HashMap;
use tracing::debug;

use crate::config::Thresholds;
use crate::summarizer::DaySummarizer;

struct CachedSummary {
    record: DailyRecord,
    flags: DayFlags,
}

/// Caller-owned memo of day summaries keyed by date.
///
/// An entry is reused only while the record it was computed from is unchanged,
/// and the whole cache is dropped when the summarizer's thresholds change.
#[derive(Default)]
pub struct SummaryCache {
    thresholds: Option<Thresholds>,
    entries: HashMap<DayKey, CachedSummary>,
}

impl SummaryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summarize(&mut self, summarizer: &DaySummarizer, record: &DailyRecord) -> DayFlags {
        if self.thresholds.as_ref() != Some(summarizer.thresholds()) {
            self.clear();
            self.thresholds = Some(summarizer.thresholds().clone());
        }

        if let Some(cached) = self.entries.get(&record.date) {
            if cached.record == *record {
                return cached.flags.clone();
            }
            debug!("Record {} changed since last summary, recomputing", record.date);
        }

        let flags = summarizer.summarize(record);
        self.entries.insert(
            record.date,
            CachedSummary {
                record: record.clone(),
                flags: flags.clone(),
            },
        );
        flags
    }

    /// Drop the entry for `date`. Returns whether one was cached.
    pub fn invalidate(&mut self, date: &DayKey) -> bool {
        self.entries.remove(date).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
