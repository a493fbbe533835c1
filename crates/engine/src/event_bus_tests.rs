// SPDX-License-Identifier: MIT

use super::*;
use airlift_core::{JobStatus, MigrationEvent};

#[tokio::test]
async fn publish_reaches_subscribers() {
    let bus = MigrationBus::new();
    let mut rx = bus.subscribe();

    bus.publish(MigrationEvent::new("job-1", JobStatus::Running).with_field("percentage", 50.0));

    let event = rx.recv().await.unwrap();
    assert_eq!(event.job_id, "job-1");
    assert_eq!(event.status, JobStatus::Running);
    assert_eq!(event.field("percentage"), Some(&serde_json::json!(50.0)));
}

#[test]
fn publish_without_subscribers_is_fire_and_forget() {
    let bus = MigrationBus::new();
    // No receiver exists; the send error is swallowed.
    bus.publish(MigrationEvent::new("job-1", JobStatus::Completed));
}

#[tokio::test]
async fn slow_subscriber_lags_without_blocking_publisher() {
    let bus = MigrationBus::with_capacity(4);
    let mut rx = bus.subscribe();

    for i in 0..16 {
        bus.publish(MigrationEvent::new(format!("job-{i}"), JobStatus::Running));
    }

    // The lagging receiver reports loss but the publisher never stalled.
    let err = rx.recv().await.unwrap_err();
    assert!(matches!(
        err,
        tokio::sync::broadcast::error::RecvError::Lagged(_)
    ));
}

#[tokio::test]
async fn each_subscriber_sees_every_event() {
    let bus = MigrationBus::new();
    let mut a = bus.subscribe();
    let mut b = bus.subscribe();

    bus.publish(MigrationEvent::new("job-1", JobStatus::Completed));

    assert_eq!(a.recv().await.unwrap().job_id, "job-1");
    assert_eq!(b.recv().await.unwrap().job_id, "job-1");
}
