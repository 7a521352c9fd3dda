//! Behaviour of the in-memory Report Store.
//!
//! The PostgreSQL store shares the same trait contract; these tests pin the
//! semantics without needing a database.

use std::sync::Arc;

use assert_matches::assert_matches;
use crowdalert_core::intake::{normalize, RawSubmission};
use crowdalert_core::report::{EmergencyType, Severity};
use crowdalert_db::models::report::CreateReport;
use crowdalert_db::store::{MemoryReportStore, ReportStore};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_report(description: &str, key: Option<&str>) -> CreateReport {
    let mut raw = RawSubmission::default();
    raw.set_field("description", description.to_string());
    raw.set_field("emergencyType", "Fire".to_string());
    raw.set_field("severity", "Critical".to_string());
    raw.set_field("lat", "28.6".to_string());
    raw.set_field("lng", "77.2".to_string());
    let new = normalize(raw).expect("valid submission");
    CreateReport::new(new, None, key.map(str::to_string))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_assigns_id_and_timestamp() {
    let store = MemoryReportStore::new();
    let created = store.create(new_report("Building on fire", None)).await.unwrap();

    assert!(!created.replayed);
    let report = created.report;
    assert!(report.timestamp.is_some());
    assert_eq!(report.emergency_type, Some(EmergencyType::Fire));
    assert_eq!(report.severity, Some(Severity::Critical));
    assert_eq!(report.lat, Some(28.6));

    let found = store.find_by_id(report.id).await.unwrap();
    assert_eq!(found, Some(report));
}

#[tokio::test]
async fn list_is_newest_first() {
    let store = MemoryReportStore::new();
    for i in 0..3 {
        store.create(new_report(&format!("report {i}"), None)).await.unwrap();
    }
    let reports = store.list().await.unwrap();
    let descriptions: Vec<&str> = reports.iter().map(|r| r.description.as_str()).collect();
    assert_eq!(descriptions, vec!["report 2", "report 1", "report 0"]);
}

#[tokio::test]
async fn repeated_idempotency_key_replays_original() {
    let store = MemoryReportStore::new();
    let first = store.create(new_report("first", Some("key-1"))).await.unwrap();
    let second = store.create(new_report("second", Some("key-1"))).await.unwrap();

    assert!(!first.replayed);
    assert!(second.replayed);
    assert_eq!(second.report.id, first.report.id);
    assert_eq!(second.report.description, "first");
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn concurrent_creates_with_one_key_store_one_report() {
    let store = Arc::new(MemoryReportStore::new());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .create(new_report(&format!("attempt {i}"), Some("same-key")))
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut fresh = 0;
    for handle in handles {
        if !handle.await.unwrap().replayed {
            fresh += 1;
        }
    }
    assert_eq!(fresh, 1);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn delete_removes_report_and_frees_key() {
    let store = MemoryReportStore::new();
    let created = store.create(new_report("gone soon", Some("k"))).await.unwrap();

    assert!(store.delete(created.report.id).await.unwrap());
    assert!(!store.delete(created.report.id).await.unwrap());
    assert_matches!(store.find_by_id(created.report.id).await, Ok(None));
    assert!(store.is_empty().await);

    let again = store.create(new_report("new one", Some("k"))).await.unwrap();
    assert!(!again.replayed);
}

#[tokio::test]
async fn lookup_by_idempotency_key() {
    let store = MemoryReportStore::new();
    let created = store.create(new_report("keyed", Some("lookup"))).await.unwrap();

    let found = store.find_by_idempotency_key("lookup").await.unwrap();
    assert_eq!(found.map(|r| r.id), Some(created.report.id));
    assert_matches!(store.find_by_idempotency_key("other").await, Ok(None));
}
