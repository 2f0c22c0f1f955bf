//! Folding backend change-feed events into an in-memory file list.

use serde::{Deserialize, Serialize};

use crate::models::{FileId, FileRecord};

/// One change pushed by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", content = "record", rename_all = "UPPERCASE")]
pub enum ChangeEvent {
    Insert(FileRecord),
    Update(FileRecord),
    Delete(FileId),
}

/// Apply one event. Inserts of a known id replace it, updates of an unknown
/// id insert it, and deletes of an unknown id do nothing.
pub fn apply_change(records: &mut Vec<FileRecord>, event: ChangeEvent) {
    match event {
        ChangeEvent::Insert(record) | ChangeEvent::Update(record) => {
            if let Some(existing) = records.iter_mut().find(|r| r.id == record.id) {
                *existing = record;
            } else {
                records.push(record);
            }
        }
        ChangeEvent::Delete(id) => records.retain(|record| record.id != id),
    }
}

/// Apply events in order.
pub fn apply_changes(records: &mut Vec<FileRecord>, events: impl IntoIterator<Item = ChangeEvent>) {
    for event in events {
        apply_change(records, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::resolve;
    use crate::models::RetentionPolicy;

    #[test]
    fn fold_insert_update_delete() {
        let first = FileRecord::new("One", Some("abc".to_string()));
        let mut renamed = first.clone();
        renamed.title = "One (edited)".to_string();
        let second = FileRecord::new("Two", None);

        let mut records = Vec::new();
        apply_changes(
            &mut records,
            [
                ChangeEvent::Insert(first.clone()),
                ChangeEvent::Insert(second.clone()),
                ChangeEvent::Update(renamed),
                ChangeEvent::Delete(second.id),
                ChangeEvent::Delete(FileId::new()),
            ],
        );

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, first.id);
        assert_eq!(records[0].title, "One (edited)");
    }

    #[test]
    fn rerunning_resolve_after_fold_picks_up_new_duplicate() {
        let now = chrono::Utc::now().timestamp_millis();
        let first = FileRecord::new("Call", Some("same".to_string()));
        let mut records = vec![first];
        assert!(resolve(&records, &RetentionPolicy::default(), now).is_empty());

        apply_change(
            &mut records,
            ChangeEvent::Insert(FileRecord::new("Call copy", Some("same".to_string()))),
        );
        assert_eq!(resolve(&records, &RetentionPolicy::default(), now).len(), 1);
    }

    #[test]
    fn events_deserialize_from_tagged_json() {
        let id = FileId::new();
        let event: ChangeEvent =
            serde_json::from_str(&format!(r#"{{"event_type":"DELETE","record":"{id}"}}"#)).unwrap();
        assert_eq!(event, ChangeEvent::Delete(id));
    }
}
