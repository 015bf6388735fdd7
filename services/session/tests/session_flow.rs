//! End-to-end session behavior against the in-memory and SQLite stores.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use roster_core::{ChangeRecord, Period, Roster, ShiftCode};
use roster_docstore::{DocumentStore, MemoryStore, SqliteStore};
use roster_session::{Collections, RosterContext, SessionError};
use rstest::rstest;
use serde_json::json;

const SCHEDULES: &str = "turnos";
const AUDIT: &str = "historial";

fn june() -> Period {
    Period::new(2025, 6).unwrap()
}

fn context(store: &MemoryStore) -> RosterContext {
    RosterContext::new(Arc::new(store.clone()), Roster::reference())
}

#[tokio::test]
async fn test_first_load_generates_and_persists() {
    let store = MemoryStore::new();
    let session = context(&store).load(june()).await.unwrap();

    assert_eq!(session.schedule().days(), 30);
    assert_eq!(session.schedule().get("Juan Carlos", 1), ShiftCode::Day);
    assert_eq!(session.schedule().get("Diana", 1), ShiftCode::Evening);

    let stored = store.get_document(SCHEDULES, "2025-6").await.unwrap().unwrap();
    assert_eq!(stored["Tato"][0], json!("N"));
    assert_eq!(stored["Abelardo"][0], json!("M"));
    assert_eq!(stored["Yolanda"][3], json!("L"));
}

#[tokio::test]
async fn test_existing_schedule_is_not_regenerated() {
    let store = MemoryStore::new();
    let partial = json!({ "Diana": ["N", "N"] }).as_object().cloned().unwrap();
    store.set_document(SCHEDULES, "2025-6", partial).await.unwrap();

    let session = context(&store).load(june()).await.unwrap();
    assert_eq!(session.schedule().days(), 2);
    assert_eq!(session.schedule().get("Diana", 1), ShiftCode::Night);
    assert_eq!(session.schedule().get("Juan Carlos", 1), ShiftCode::Off);

    // Loading does not write the normalized form back.
    let stored = store.get_document(SCHEDULES, "2025-6").await.unwrap().unwrap();
    assert!(stored.get("Juan Carlos").is_none());
}

#[tokio::test]
async fn test_reload_round_trips() {
    let store = MemoryStore::new();
    let ctx = context(&store);

    let first = ctx.load(june()).await.unwrap();
    let second = ctx.load(june()).await.unwrap();
    assert_eq!(first.schedule(), second.schedule());
}

#[rstest]
#[case("Tato", ShiftCode::Night, ShiftCode::Morning)]
#[case("Juan Carlos", ShiftCode::Day, ShiftCode::Evening)]
#[case("Abelardo", ShiftCode::Morning, ShiftCode::Off)]
#[case("Sebastian", ShiftCode::Off, ShiftCode::Day)]
#[tokio::test]
async fn test_advance_persists_cell_and_records_change(
    #[case] worker: &str,
    #[case] previous: ShiftCode,
    #[case] next: ShiftCode,
) {
    let store = MemoryStore::new();
    let mut session = context(&store).load(june()).await.unwrap();

    let pending = session.request_advance(worker, 1).unwrap();
    assert_eq!(session.schedule().get(worker, 1), next);

    let outcome = pending.wait().await;
    assert!(outcome.is_complete());
    assert_eq!(outcome.transition.previous, previous);

    let stored = store.get_document(SCHEDULES, "2025-6").await.unwrap().unwrap();
    assert_eq!(stored[worker][0], json!(next.code()));

    let record_id = outcome.audit.unwrap();
    let record = store.get_document(AUDIT, &record_id).await.unwrap().unwrap();
    let record = ChangeRecord::from_document(&record).unwrap();
    assert_eq!(record.worker, worker);
    assert_eq!(record.day, 1);
    assert_eq!(record.previous, previous);
    assert_eq!(record.next, next);
    assert_eq!(record.period, Some(june()));
}

#[tokio::test]
async fn test_five_clicks_restore_the_cell() {
    let store = MemoryStore::new();
    let mut session = context(&store).load(june()).await.unwrap();

    for _ in 0..5 {
        session.request_advance("Diana", 2).unwrap().wait().await;
    }

    assert_eq!(session.schedule().get("Diana", 2), ShiftCode::Off);
    assert_eq!(store.len(AUDIT), 5);
}

/// Clicks several cells in quick succession, waits for every write, then
/// checks the stored document agrees with the in-memory schedule.
async fn assert_overlapping_clicks_persist_in_order(store: Arc<dyn DocumentStore>) {
    let mut session = RosterContext::new(Arc::clone(&store), Roster::reference())
        .load(june())
        .await
        .unwrap();

    let mut pending = Vec::new();
    for day in 1..=30 {
        for worker in ["Diana", "Tato", "Sonia"] {
            for _ in 0..3 {
                pending.push(session.request_advance(worker, day).unwrap());
            }
        }
    }
    for write in pending {
        assert!(write.wait().await.is_complete());
    }

    let stored = store.get_document(SCHEDULES, "2025-6").await.unwrap().unwrap();
    for day in 1..=30u32 {
        for worker in ["Diana", "Tato", "Sonia"] {
            let expected = session.schedule().get(worker, day);
            assert_eq!(
                stored[worker][(day - 1) as usize],
                json!(expected.code()),
                "{worker} day {day}"
            );
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_overlapping_clicks_persist_in_order_memory() {
    assert_overlapping_clicks_persist_in_order(Arc::new(MemoryStore::new())).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_overlapping_clicks_persist_in_order_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(dir.path().join("roster.db")).unwrap();
    assert_overlapping_clicks_persist_in_order(Arc::new(store)).await;
}

#[tokio::test]
async fn test_day_out_of_range_is_rejected() {
    let store = MemoryStore::new();
    let mut session = context(&store).load(june()).await.unwrap();

    let err = session.request_advance("Diana", 31).unwrap_err();
    assert!(matches!(err, SessionError::Roster(ref e) if e.is_missing_cell()));
    assert!(store.is_empty(AUDIT));
}

#[tokio::test]
async fn test_audit_failure_keeps_local_edit() {
    let store = MemoryStore::new();
    let mut session = context(&store).load(june()).await.unwrap();
    store.fail_collection(AUDIT);

    let outcome = session.request_advance("Maria", 2).unwrap().wait().await;

    assert!(outcome.schedule.is_ok());
    assert!(outcome.audit.is_err());
    assert!(!outcome.is_complete());
    assert_eq!(session.schedule().get("Maria", 2), ShiftCode::Morning);
    assert!(store.is_empty(AUDIT));
}

#[tokio::test]
async fn test_schedule_failure_still_records_change() {
    let store = MemoryStore::new();
    let mut session = context(&store).load(june()).await.unwrap();
    store.fail_collection(SCHEDULES);

    let outcome = session.request_advance("Maria", 2).unwrap().wait().await;

    assert!(outcome.schedule.is_err());
    assert!(outcome.audit.is_ok());
    assert_eq!(session.schedule().get("Maria", 2), ShiftCode::Morning);

    store.restore_collection(SCHEDULES);
    let stored = store.get_document(SCHEDULES, "2025-6").await.unwrap().unwrap();
    assert_eq!(stored["Maria"][1], json!("N"));
}

#[tokio::test]
async fn test_load_fails_when_store_is_down() {
    let store = MemoryStore::new();
    store.fail_collection(SCHEDULES);

    let err = context(&store).load(june()).await.unwrap_err();
    assert!(err.is_store_error());
}

#[tokio::test]
async fn test_feed_delivers_newest_first_and_filters_period() {
    let store = MemoryStore::new();
    let ctx = context(&store);
    let mut session = ctx.load(june()).await.unwrap();

    // A record from another month and an untagged legacy record.
    let other = ChangeRecord {
        worker: "Diana".to_string(),
        day: 1,
        previous: ShiftCode::Day,
        next: ShiftCode::Evening,
        at: Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap(),
        period: Some(Period::new(2025, 5).unwrap()),
    };
    let legacy = ChangeRecord {
        period: None,
        at: Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
        ..other.clone()
    };
    store.insert_document(AUDIT, other.to_document().unwrap()).await.unwrap();
    store.insert_document(AUDIT, legacy.to_document().unwrap()).await.unwrap();
    store
        .insert_document(AUDIT, json!({ "persona": 7 }).as_object().cloned().unwrap())
        .await
        .unwrap();

    let mut feed = session.subscribe().await.unwrap();
    let initial = feed.next().await.unwrap().unwrap();
    assert_eq!(initial, vec![legacy.clone()]);

    session.request_advance("Tato", 1).unwrap().wait().await;

    let updated = tokio::time::timeout(Duration::from_secs(5), feed.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(updated.len(), 2);
    assert_eq!(updated[0].worker, "Tato");
    assert_eq!(updated[0].previous, ShiftCode::Night);
    assert_eq!(updated[0].next, ShiftCode::Morning);
    assert_eq!(updated[1], legacy);

    feed.cancel().await;
    assert!(!feed.is_active());
    assert!(feed.next().await.is_none());
    assert_eq!(store.listener_count(), 0);
}

#[tokio::test]
async fn test_dropping_feed_releases_listener() {
    let store = MemoryStore::new();
    let ctx = context(&store);

    let feed = ctx.subscribe(june()).await.unwrap();
    assert_eq!(store.listener_count(), 1);
    drop(feed);

    tokio::time::timeout(Duration::from_secs(5), async {
        while store.listener_count() > 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_custom_collections() {
    let store = MemoryStore::new();
    let ctx = context(&store).with_collections(Collections {
        schedules: "schedules".to_string(),
        audit: "changes".to_string(),
    });

    let mut session = ctx.load(june()).await.unwrap();
    session.request_advance("Diana", 1).unwrap().wait().await;

    assert_eq!(store.len("schedules"), 1);
    assert_eq!(store.len("changes"), 1);
    assert!(store.is_empty(SCHEDULES));
    assert!(store.is_empty(AUDIT));
}

#[tokio::test]
async fn test_sqlite_file_session_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roster.db");

    {
        let store: Arc<dyn DocumentStore> = Arc::new(SqliteStore::open(&path).unwrap());
        let mut session = RosterContext::new(store, Roster::reference())
            .load(june())
            .await
            .unwrap();
        assert!(session.request_advance("Dora", 3).unwrap().wait().await.is_complete());
    }

    let store: Arc<dyn DocumentStore> = Arc::new(SqliteStore::open(&path).unwrap());
    let ctx = RosterContext::new(store, Roster::reference());
    let session = ctx.load(june()).await.unwrap();
    assert_eq!(session.schedule().get("Dora", 3), ShiftCode::Night);

    let mut feed = session.subscribe().await.unwrap();
    let history = feed.next().await.unwrap().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].worker, "Dora");
    feed.cancel().await;
}
