use health_insight_patterns::Thresholds;
use std::path::PathBuf;

/// Runtime settings for the HTTP service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub data_dir: PathBuf,
    pub bind_addr: String,
    pub thresholds: Thresholds,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(Self::DEFAULT_DATA_DIR),
            bind_addr: Self::DEFAULT_BIND_ADDR.to_string(),
            thresholds: Thresholds::default(),
        }
    }
}

impl ServiceConfig {
    pub const ENV_DATA_DIR: &'static str = "HEALTH_DATA_DIR";
    pub const ENV_BIND_ADDR: &'static str = "HEALTH_BIND_ADDR";
    pub const DEFAULT_DATA_DIR: &'static str = "data";
    pub const DEFAULT_BIND_ADDR: &'static str = "127.0.0.1:21960";

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            data_dir: non_empty(Self::ENV_DATA_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            bind_addr: non_empty(Self::ENV_BIND_ADDR).unwrap_or(defaults.bind_addr),
            thresholds: Thresholds::from_lookup(&lookup),
        }
    }
}
