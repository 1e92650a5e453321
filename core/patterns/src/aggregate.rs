use health_insight_schemas::{
    Corpus, DailyRecord, Flag, GlobalPatternSummary, Measurement, Metric,
};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::stats::{mean, pearson};
use crate::summarizer::DaySummarizer;
use crate::values::{caffeine_metric, hour_fraction, numeric_metric};

/// Computes corpus-wide statistics: metric averages, caffeine/sleep correlation
/// and stress trigger frequencies.
#[derive(Debug, Clone, Default)]
pub struct PatternAggregator {
    summarizer: DaySummarizer,
}

impl PatternAggregator {
    pub fn new(summarizer: DaySummarizer) -> Self {
        Self { summarizer }
    }

    pub fn aggregate(&self, corpus: &Corpus) -> GlobalPatternSummary {
        let averages: BTreeMap<Metric, Measurement> = Metric::ALL
            .into_iter()
            .map(|metric| {
                let values = corpus
                    .iter()
                    .filter_map(|record| numeric_metric(record, metric.field()));
                (metric, mean(values))
            })
            .collect();

        let pairs: Vec<(f64, f64)> = corpus.iter().filter_map(caffeine_sleep_pair).collect();
        let caffeine_sleep_correlation = pearson(&pairs);

        let mut stress_triggers: BTreeMap<Flag, usize> = Flag::ALL
            .into_iter()
            .filter(|flag| *flag != Flag::HighStress)
            .map(|flag| (flag, 0))
            .collect();
        let mut high_stress_days = 0;

        for record in corpus.iter() {
            let flags = self.summarizer.summarize(record);
            if !flags.is_set(Flag::HighStress) {
                continue;
            }
            high_stress_days += 1;
            for flag in flags.active().filter(|flag| *flag != Flag::HighStress) {
                *stress_triggers.entry(flag).or_insert(0) += 1;
            }
        }

        debug!(
            "Correlation over {} caffeine/sleep pairs, {} high-stress days",
            pairs.len(),
            high_stress_days
        );
        info!("Aggregated global patterns over {} days", corpus.len());

        GlobalPatternSummary {
            day_count: corpus.len(),
            averages,
            caffeine_sleep_correlation,
            high_stress_days,
            stress_triggers,
        }
    }
}

/// Latest caffeine intake hour and sleep hours, when a day has both.
fn caffeine_sleep_pair(record: &DailyRecord) -> Option<(f64, f64)> {
    let sleep = numeric_metric(record, Metric::SleepHours.field())?;
    let latest = caffeine_metric(record).into_iter().max()?;
    Some((hour_fraction(latest), sleep))
}
