use health_insight_schemas::{DailyRecord, Fields, RecordSource};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// What a merge did to the record, as dotted field paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    /// Fields that were absent (or null) and got filled.
    pub filled: Vec<String>,
    /// Incoming fields ignored because a non-null value was already present.
    pub kept: Vec<String>,
}

impl MergeOutcome {
    pub fn is_noop(&self) -> bool {
        self.filled.is_empty()
    }
}

/// Merge a fragment into one section of a record without overwriting populated fields.
///
/// A metric already held by the other source's section is populated for the
/// day, so the incoming value is kept out and reported in `kept`.
pub fn merge_fragment(
    record: &mut DailyRecord,
    source: RecordSource,
    mut fragment: Fields,
) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();

    let other = record.section(source.other());
    fragment.retain(|key, value| {
        let held_elsewhere = other.get(key).map_or(false, |existing| !existing.is_null());
        if held_elsewhere && !value.is_null() {
            debug!(
                "Keeping {} value for {}, ignoring {} value {}",
                source.other().as_str(),
                key,
                source.as_str(),
                value
            );
            outcome.kept.push(key.clone());
            return false;
        }
        true
    });

    merge_fields(record.section_mut(source), fragment, "", &mut outcome);

    debug!(
        "Merged {} fragment into {}: {} filled, {} kept",
        source.as_str(),
        record.date,
        outcome.filled.len(),
        outcome.kept.len()
    );
    outcome
}

fn merge_fields(existing: &mut Fields, incoming: Fields, prefix: &str, outcome: &mut MergeOutcome) {
    for (key, value) in incoming {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        if value.is_null() {
            continue;
        }

        match existing.get_mut(&key) {
            None => {
                existing.insert(key, value);
                outcome.filled.push(path);
            }
            Some(slot) if slot.is_null() => {
                *slot = value;
                outcome.filled.push(path);
            }
            Some(Value::Object(current)) => match value {
                Value::Object(nested) => {
                    let mut current_fields: Fields = std::mem::take(current).into_iter().collect();
                    merge_fields(&mut current_fields, nested.into_iter().collect(), &path, outcome);
                    *current = current_fields.into_iter().collect();
                }
                _ => outcome.kept.push(path),
            },
            Some(slot) => {
                if *slot != value {
                    debug!("Keeping existing value for {} (incoming {})", path, value);
                }
                outcome.kept.push(path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use health_insight_schemas::DayKey;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        serde_json::from_value(value).unwrap()
    }

    fn record() -> DailyRecord {
        DailyRecord::new(DayKey::parse("2025-02-10").unwrap())
    }

    #[test]
    fn test_fills_absent_fields() {
        let mut rec = record();
        let outcome = merge_fragment(
            &mut rec,
            RecordSource::Manual,
            fields(json!({ "stress": 7, "caffeine_time": "16:00" })),
        );

        assert_eq!(outcome.filled, vec!["caffeine_time", "stress"]);
        assert_eq!(rec.manual.get("stress"), Some(&json!(7)));
        assert!(rec.device.is_empty());
    }

    #[test]
    fn test_never_overwrites_populated_field() {
        let mut rec = record();
        merge_fragment(&mut rec, RecordSource::Device, fields(json!({ "sleep_hours": 6.5 })));
        let outcome = merge_fragment(
            &mut rec,
            RecordSource::Device,
            fields(json!({ "sleep_hours": 9.0, "hrv": 41 })),
        );

        assert_eq!(rec.device.get("sleep_hours"), Some(&json!(6.5)));
        assert_eq!(rec.device.get("hrv"), Some(&json!(41)));
        assert_eq!(outcome.kept, vec!["sleep_hours"]);
        assert_eq!(outcome.filled, vec!["hrv"]);
    }

    #[test]
    fn test_null_is_absent_both_ways() {
        let mut rec = record();
        rec.manual.insert("anxiety".into(), Value::Null);

        let outcome = merge_fragment(
            &mut rec,
            RecordSource::Manual,
            fields(json!({ "anxiety": 8, "stress": null })),
        );

        assert_eq!(rec.manual.get("anxiety"), Some(&json!(8)));
        assert!(!rec.manual.contains_key("stress"));
        assert_eq!(outcome.filled, vec!["anxiety"]);
    }

    #[test]
    fn test_nested_objects_merge_recursively() {
        let mut rec = record();
        merge_fragment(
            &mut rec,
            RecordSource::Device,
            fields(json!({ "heart": { "resting": 58 } })),
        );
        let outcome = merge_fragment(
            &mut rec,
            RecordSource::Device,
            fields(json!({ "heart": { "resting": 70, "max": 160 } })),
        );

        assert_eq!(rec.device["heart"], json!({ "resting": 58, "max": 160 }));
        assert_eq!(outcome.filled, vec!["heart.max"]);
        assert_eq!(outcome.kept, vec!["heart.resting"]);
    }

    #[test]
    fn test_other_section_value_is_not_shadowed() {
        let mut rec = record();
        merge_fragment(&mut rec, RecordSource::Manual, fields(json!({ "sleep_hours": 5 })));
        let outcome = merge_fragment(
            &mut rec,
            RecordSource::Device,
            fields(json!({ "sleep_hours": 8, "hrv": 45 })),
        );

        assert_eq!(rec.metric("sleep_hours"), Some(&json!(5)));
        assert!(!rec.device.contains_key("sleep_hours"));
        assert_eq!(rec.device.get("hrv"), Some(&json!(45)));
        assert_eq!(outcome.kept, vec!["sleep_hours"]);
        assert_eq!(outcome.filled, vec!["hrv"]);
    }

    #[test]
    fn test_null_in_other_section_does_not_block() {
        let mut rec = record();
        rec.device.insert("stress".into(), Value::Null);
        let outcome = merge_fragment(&mut rec, RecordSource::Manual, fields(json!({ "stress": 8 })));

        assert!(!outcome.is_noop());
        assert_eq!(rec.metric("stress"), Some(&json!(8)));
    }
}
