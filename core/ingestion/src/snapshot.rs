use health_insight_schemas::PatternSnapshot;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::StoreResult;
use crate::files::{read_json, write_json};

/// Last computed global patterns, kept in `<data_dir>/global_patterns.json`.
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub const FILE_NAME: &'static str = "global_patterns.json";

    pub fn open<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            path: data_dir.as_ref().join(Self::FILE_NAME),
        }
    }

    pub fn save(&self, snapshot: &PatternSnapshot) -> StoreResult<()> {
        write_json(&self.path, snapshot)?;
        info!(
            "Saved global patterns over {} days to {}",
            snapshot.summary.day_count,
            self.path.display()
        );
        Ok(())
    }

    pub fn load(&self) -> StoreResult<Option<PatternSnapshot>> {
        read_json(&self.path)
    }
}
