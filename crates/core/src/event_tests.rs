// SPDX-License-Identifier: MIT

use super::*;
use crate::job::JobStatus;

#[test]
fn event_builds_with_fields() {
    let event = MigrationEvent::new("job-1", JobStatus::Running)
        .with_field("percentage", 42.5)
        .with_field("staged_id", "staged-1");

    assert_eq!(event.job_id, "job-1");
    assert_eq!(event.field("percentage"), Some(&serde_json::json!(42.5)));
    assert_eq!(event.field("staged_id"), Some(&serde_json::json!("staged-1")));
    assert_eq!(event.field("missing"), None);
}

#[test]
fn fields_flatten_into_payload() {
    let event = MigrationEvent::new("job-1", JobStatus::Completed).with_field("items_deleted", 7);
    let value = serde_json::to_value(&event).unwrap();

    assert_eq!(value["job_id"], "job-1");
    assert_eq!(value["status"], "completed");
    // Flattened, not nested under "fields".
    assert_eq!(value["items_deleted"], 7);
    assert!(value.get("fields").is_none());
}

#[test]
fn topic_constant() {
    assert_eq!(MIGRATION_TOPIC, "migration");
}
