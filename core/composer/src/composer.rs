use chrono::Utc;
use health_insight_ingestion::{EventLog, RecordStore, SnapshotFile};
use health_insight_patterns::{
    DaySummarizer, PatternAggregator, SimilarDays, SimilarityMatcher, SummaryCache, Thresholds,
};
use health_insight_schemas::{
    generate_briefing_id, BriefingStyle, DailyBriefing, DailyRecord, DayFlags, DayKey, Fields,
    GlobalPatternSummary, PatternSnapshot, RecordSource, SubjectiveEvent,
};
use tracing::{debug, info, warn};

use crate::error::{ComposerError, ComposerResult};
use crate::templates::TemplateRenderer;

/// Daily briefing composer.
///
/// Owns the record store and event log and keeps a summary cache in step with
/// every write that goes through it.
pub struct Composer<S, E> {
    store: S,
    events: E,
    matcher: SimilarityMatcher,
    aggregator: PatternAggregator,
    renderer: TemplateRenderer,
    cache: SummaryCache,
    snapshot: Option<SnapshotFile>,
}

impl<S: RecordStore, E: EventLog> Composer<S, E> {
    pub fn new(store: S, events: E, thresholds: Thresholds) -> Self {
        let summarizer = DaySummarizer::new(thresholds);
        Self {
            store,
            events,
            matcher: SimilarityMatcher::new(summarizer.clone()),
            aggregator: PatternAggregator::new(summarizer),
            renderer: TemplateRenderer::new(),
            cache: SummaryCache::new(),
            snapshot: None,
        }
    }

    /// Persist every global recompute to `snapshot`.
    pub fn with_snapshot(mut self, snapshot: SnapshotFile) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    pub fn thresholds(&self) -> &Thresholds {
        self.matcher.summarizer().thresholds()
    }

    pub fn list_days(&self) -> ComposerResult<Vec<DayKey>> {
        Ok(self.store.list_all()?)
    }

    pub fn record(&self, date: &DayKey) -> ComposerResult<DailyRecord> {
        self.store
            .get(date)?
            .ok_or(ComposerError::NotFound(*date))
    }

    /// Merge a fragment into the day's record and drop its cached summary.
    pub fn record_fragment(
        &mut self,
        date: &DayKey,
        source: RecordSource,
        fields: Fields,
    ) -> ComposerResult<DailyRecord> {
        let record = self.store.upsert_merge(date, source, fields)?;
        if self.cache.invalidate(date) {
            debug!("Invalidated cached summary for {}", date);
        }
        Ok(record)
    }

    pub fn flags(&mut self, date: &DayKey) -> ComposerResult<DayFlags> {
        let record = self.record(date)?;
        Ok(self.cache.summarize(self.matcher.summarizer(), &record))
    }

    pub fn similar(&mut self, date: &DayKey, limit: usize) -> ComposerResult<SimilarDays> {
        let record = self.record(date)?;
        let corpus = self.store.load_corpus()?;
        Ok(self
            .matcher
            .find_similar_cached(&record, &corpus, &mut self.cache)
            .top(limit))
    }

    pub fn log_event(
        &mut self,
        date: &DayKey,
        tags: Vec<String>,
        body: &str,
    ) -> ComposerResult<SubjectiveEvent> {
        Ok(self.events.append(date, tags, body)?)
    }

    pub fn events_for(&self, date: &DayKey) -> ComposerResult<Vec<SubjectiveEvent>> {
        Ok(self.events.get_by_date(date)?)
    }

    /// Recompute global patterns over the whole store and persist the snapshot.
    pub fn refresh_patterns(&mut self) -> ComposerResult<PatternSnapshot> {
        let summary = self.global_summary()?;
        let snapshot = PatternSnapshot {
            computed_at: Utc::now().to_rfc3339(),
            summary,
        };

        if let Some(ref file) = self.snapshot {
            file.save(&snapshot)?;
        }
        Ok(snapshot)
    }

    /// Last persisted snapshot, if any.
    pub fn last_snapshot(&self) -> ComposerResult<Option<PatternSnapshot>> {
        match self.snapshot {
            Some(ref file) => Ok(file.load()?),
            None => Ok(None),
        }
    }

    /// Build the full briefing for one day.
    pub fn compose(&mut self, date: &DayKey, style: BriefingStyle) -> ComposerResult<DailyBriefing> {
        info!("Composing {} briefing for {}", style.as_str(), date);

        let record = self.record(date)?;
        let corpus = self.store.load_corpus()?;
        let flags = self.cache.summarize(self.matcher.summarizer(), &record);
        let similar = self
            .matcher
            .find_similar_cached(&record, &corpus, &mut self.cache)
            .top(SimilarityMatcher::DEFAULT_LIMIT)
            .into_vec();
        let patterns = self.aggregator.aggregate(&corpus);

        let events = self.events.get_by_date(date).unwrap_or_else(|e| {
            warn!("Failed to load events for {}: {}, continuing without", date, e);
            Vec::new()
        });

        let mut briefing = DailyBriefing {
            briefing_id: generate_briefing_id(),
            date: *date,
            record,
            flags,
            similar,
            patterns,
            events,
            style,
            text: String::new(),
        };
        briefing.text = self.renderer.render(&briefing);

        info!(
            "Composed briefing: {} ({} similar days, {} events)",
            briefing.briefing_id,
            briefing.similar.len(),
            briefing.events.len()
        );
        Ok(briefing)
    }

    fn global_summary(&self) -> ComposerResult<GlobalPatternSummary> {
        let corpus = self.store.load_corpus()?;
        Ok(self.aggregator.aggregate(&corpus))
    }
}
