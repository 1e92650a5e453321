use health_insight_schemas::DayKey;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// The requested day has no record to summarize.
    #[error("no record for {0}")]
    NotFound(DayKey),
}

pub type PatternResult<T> = std::result::Result<T, PatternError>;
