use health_insight_ingestion::StoreError;
use health_insight_patterns::PatternError;
use health_insight_schemas::DayKey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComposerError {
    #[error("no record for {0}")]
    NotFound(DayKey),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<PatternError> for ComposerError {
    fn from(err: PatternError) -> Self {
        match err {
            PatternError::NotFound(date) => ComposerError::NotFound(date),
        }
    }
}

pub type ComposerResult<T> = std::result::Result<T, ComposerError>;
