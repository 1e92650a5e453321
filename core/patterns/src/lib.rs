//! Pattern engine: per-day condition flags, similar-day retrieval and
//! corpus-wide aggregates over daily health records.

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod error;
pub mod similar;
pub mod stats;
pub mod summarizer;
pub mod values;

pub use aggregate::PatternAggregator;
pub use cache::SummaryCache;
pub use config::Thresholds;
pub use error::{PatternError, PatternResult};
pub use similar::{SimilarDays, SimilarityMatcher};
pub use summarizer::DaySummarizer;
