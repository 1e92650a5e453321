use health_insight_schemas::{Corpus, DailyRecord, DayFlags, DayKey, SimilarityResult};
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::SummaryCache;
use crate::error::{PatternError, PatternResult};
use crate::summarizer::DaySummarizer;

/// Ranked past days sharing at least one active flag with a target day.
///
/// Ordered by shared-flag count descending, then by date with the most recent first.
/// The sequence is finite and can be iterated any number of times.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SimilarDays {
    results: Vec<SimilarityResult>,
}

impl SimilarDays {
    pub fn iter(&self) -> std::slice::Iter<'_, SimilarityResult> {
        self.results.iter()
    }

    /// Keep only the `n` best matches.
    pub fn top(mut self, n: usize) -> Self {
        self.results.truncate(n);
        self
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn into_vec(self) -> Vec<SimilarityResult> {
        self.results
    }
}

impl IntoIterator for SimilarDays {
    type Item = SimilarityResult;
    type IntoIter = std::vec::IntoIter<SimilarityResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a> IntoIterator for &'a SimilarDays {
    type Item = &'a SimilarityResult;
    type IntoIter = std::slice::Iter<'a, SimilarityResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// Finds historical days whose flags overlap a target day's flags.
#[derive(Debug, Clone, Default)]
pub struct SimilarityMatcher {
    summarizer: DaySummarizer,
}

impl SimilarityMatcher {
    /// Number of matches surfaced when a caller gives no limit.
    pub const DEFAULT_LIMIT: usize = 5;

    pub fn new(summarizer: DaySummarizer) -> Self {
        Self { summarizer }
    }

    pub fn summarizer(&self) -> &DaySummarizer {
        &self.summarizer
    }

    /// Match a day that is part of the corpus. Fails with `NotFound` if it is not.
    pub fn find_similar(&self, date: &DayKey, corpus: &Corpus) -> PatternResult<SimilarDays> {
        let target = corpus.get(date).ok_or(PatternError::NotFound(*date))?;
        Ok(self.find_similar_to(target, corpus))
    }

    /// Match a record that may or may not be stored in the corpus.
    pub fn find_similar_to(&self, target: &DailyRecord, corpus: &Corpus) -> SimilarDays {
        rank(target, corpus, |record| self.summarizer.summarize(record))
    }

    /// Same as [`find_similar_to`](Self::find_similar_to), reusing summaries from `cache`.
    pub fn find_similar_cached(
        &self,
        target: &DailyRecord,
        corpus: &Corpus,
        cache: &mut SummaryCache,
    ) -> SimilarDays {
        rank(target, corpus, |record| cache.summarize(&self.summarizer, record))
    }
}

fn rank<F>(target: &DailyRecord, corpus: &Corpus, mut summarize: F) -> SimilarDays
where
    F: FnMut(&DailyRecord) -> DayFlags,
{
    let target_flags = summarize(target);
    if target_flags.active_count() == 0 {
        debug!("{} has no active flags, nothing to match", target.date);
        return SimilarDays::default();
    }

    let mut results: Vec<SimilarityResult> = corpus
        .iter()
        .filter(|record| record.date != target.date)
        .filter_map(|record| {
            let shared = target_flags.shared_with(&summarize(record));
            if shared.is_empty() {
                return None;
            }
            Some(SimilarityResult {
                date: record.date,
                score: shared.len(),
                shared,
            })
        })
        .collect();

    results.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| b.date.cmp(&a.date)));

    info!(
        "Found {} similar days for {} out of {}",
        results.len(),
        target.date,
        corpus.len()
    );
    SimilarDays { results }
}

#[cfg(test)]
mod tests {
    use super::*;
    use health_insight_schemas::Flag;
    use serde_json::{json, Value};

    fn day(s: &str) -> DayKey {
        DayKey::parse(s).unwrap()
    }

    fn record(date: &str, device: Value, manual: Value) -> DailyRecord {
        let mut record = DailyRecord::new(day(date));
        record.device = serde_json::from_value(device).unwrap();
        record.manual = serde_json::from_value(manual).unwrap();
        record
    }

    fn dates(similar: &SimilarDays) -> Vec<String> {
        similar.iter().map(|r| r.date.to_string()).collect()
    }

    #[test]
    fn test_missing_target_is_not_found() {
        let corpus = Corpus::new();
        let err = SimilarityMatcher::default()
            .find_similar(&day("2024-01-01"), &corpus)
            .unwrap_err();
        assert_eq!(err, PatternError::NotFound(day("2024-01-01")));
    }

    #[test]
    fn test_lone_target_yields_empty() {
        let corpus: Corpus = vec![record("2024-01-01", json!({ "sleep_hours": 4 }), json!({}))]
            .into_iter()
            .collect();
        let similar = SimilarityMatcher::default()
            .find_similar(&day("2024-01-01"), &corpus)
            .unwrap();
        assert!(similar.is_empty());
    }

    #[test]
    fn test_ranks_by_score_then_recency() {
        let corpus: Corpus = vec![
            record("2024-01-01", json!({ "sleep_hours": 4, "hrv": 20 }), json!({ "stress": 9 })),
            record("2024-01-02", json!({ "sleep_hours": 5 }), json!({})),
            record("2024-01-03", json!({ "sleep_hours": 5, "hrv": 30 }), json!({})),
            record("2024-01-04", json!({ "hrv": 25 }), json!({})),
            record("2024-01-05", json!({ "sleep_hours": 9, "hrv": 80 }), json!({})),
            record("2024-01-06", json!({ "hrv": 35 }), json!({ "stress": 7 })),
        ]
        .into_iter()
        .collect();

        let similar = SimilarityMatcher::default()
            .find_similar(&day("2024-01-01"), &corpus)
            .unwrap();

        assert_eq!(
            dates(&similar),
            vec!["2024-01-06", "2024-01-03", "2024-01-04", "2024-01-02"]
        );
        let first = similar.iter().next().unwrap();
        assert_eq!(first.score, 2);
        assert_eq!(
            first.shared.iter().copied().collect::<Vec<_>>(),
            vec![Flag::LowHrv, Flag::HighStress]
        );

        // Restartable: a second pass sees the same sequence.
        assert_eq!(dates(&similar), dates(&similar));
        assert_eq!(dates(&similar.clone().top(2)), vec!["2024-01-06", "2024-01-03"]);
    }

    #[test]
    fn test_unstored_target_is_matched() {
        let corpus: Corpus = vec![record("2024-01-02", json!({ "hrv": 10 }), json!({}))]
            .into_iter()
            .collect();
        let target = record("2024-03-01", json!({ "hrv": 12 }), json!({}));

        let similar = SimilarityMatcher::default().find_similar_to(&target, &corpus);
        assert_eq!(dates(&similar), vec!["2024-01-02"]);
    }

    #[test]
    fn test_cached_matches_uncached() {
        let corpus: Corpus = vec![
            record("2024-01-01", json!({ "sleep_hours": 4 }), json!({})),
            record("2024-01-02", json!({ "sleep_hours": 5 }), json!({})),
        ]
        .into_iter()
        .collect();
        let matcher = SimilarityMatcher::default();
        let mut cache = SummaryCache::new();
        let target = corpus.get(&day("2024-01-01")).unwrap();

        let cached = matcher.find_similar_cached(target, &corpus, &mut cache);
        assert_eq!(cached, matcher.find_similar_to(target, &corpus));
        assert_eq!(cache.len(), 2);
    }
}
