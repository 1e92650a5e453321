use chrono::Utc;
use health_insight_schemas::{generate_event_id, DayKey, SubjectiveEvent};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::StoreResult;
use crate::files::{read_json, write_json};

/// Append-only log of free-text subjective events (mood, stress, energy notes).
pub trait EventLog {
    fn append(&mut self, date: &DayKey, tags: Vec<String>, body: &str)
        -> StoreResult<SubjectiveEvent>;

    /// Events recorded for `date`, in append order.
    fn get_by_date(&self, date: &DayKey) -> StoreResult<Vec<SubjectiveEvent>> {
        Ok(self
            .load_all()?
            .into_iter()
            .filter(|event| event.date == *date)
            .collect())
    }

    fn load_all(&self) -> StoreResult<Vec<SubjectiveEvent>>;
}

/// Build an event with a fresh id. Tags are trimmed, lowercased and deduplicated.
pub fn new_event(date: &DayKey, tags: Vec<String>, body: &str) -> SubjectiveEvent {
    let mut clean_tags: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !clean_tags.contains(&tag) {
            clean_tags.push(tag);
        }
    }

    SubjectiveEvent {
        id: generate_event_id(),
        date: *date,
        body: body.trim().to_string(),
        tags: clean_tags,
        recorded_at: Utc::now().to_rfc3339(),
    }
}

/// All events kept as one JSON array in `<data_dir>/subjective_events.json`.
pub struct JsonEventLog {
    path: PathBuf,
}

impl JsonEventLog {
    pub const FILE_NAME: &'static str = "subjective_events.json";

    pub fn open<P: AsRef<Path>>(data_dir: P) -> Self {
        let path = data_dir.as_ref().join(Self::FILE_NAME);
        info!("Subjective event log at: {}", path.display());
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventLog for JsonEventLog {
    fn append(
        &mut self,
        date: &DayKey,
        tags: Vec<String>,
        body: &str,
    ) -> StoreResult<SubjectiveEvent> {
        let mut events = self.load_all()?;
        let event = new_event(date, tags, body);
        events.push(event.clone());
        write_json(&self.path, &events)?;

        debug!("Appended event {} for {}", event.id, date);
        Ok(event)
    }

    fn load_all(&self) -> StoreResult<Vec<SubjectiveEvent>> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    events: Vec<SubjectiveEvent>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventLog for InMemoryEventLog {
    fn append(
        &mut self,
        date: &DayKey,
        tags: Vec<String>,
        body: &str,
    ) -> StoreResult<SubjectiveEvent> {
        let event = new_event(date, tags, body);
        self.events.push(event.clone());
        Ok(event)
    }

    fn load_all(&self) -> StoreResult<Vec<SubjectiveEvent>> {
        Ok(self.events.clone())
    }
}
