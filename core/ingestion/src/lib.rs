pub mod device;
pub mod error;
pub mod events;
mod files;
pub mod merge;
pub mod snapshot;
pub mod store;

pub use device::normalize_device_bundle;
pub use error::{StoreError, StoreResult};
pub use events::{new_event, EventLog, InMemoryEventLog, JsonEventLog};
pub use merge::{merge_fragment, MergeOutcome};
pub use snapshot::SnapshotFile;
pub use store::{parse_day_key, InMemoryStore, JsonDayStore, RecordStore};
