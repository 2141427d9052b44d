//! Integration tests for the data store over mock and live sources

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use crmdesk::testing::assertions::{assert_fell_back, assert_gated, assert_mock_dataset};
use crmdesk::{
    DataSource, DataStore, DealStage, MemoryPreferences, MockRemoteStore, NewContact, NewDeal,
    NewTask, PreferenceStore, SaveOutcome, Table, TaskSave, TaskStatus,
};

async fn mock_store() -> DataStore {
    let mut store = DataStore::new(None, Arc::new(MemoryPreferences::new()));
    store.load().await;
    store
}

#[tokio::test]
async fn test_switch_to_unreachable_live_reverts_to_mock() {
    let remote = Arc::new(MockRemoteStore::new().with_error("connection refused"));
    let prefs = Arc::new(MemoryPreferences::new());
    let mut store = DataStore::new(Some(remote), prefs.clone());
    store.load().await;

    let report = store.set_mode(DataSource::Live).await.unwrap();

    assert_fell_back(&report);
    assert_eq!(store.mode(), DataSource::Mock);
    assert_mock_dataset(store.collections());
    assert_eq!(prefs.get("dataSource").as_deref(), Some("mock"));
}

#[tokio::test]
async fn test_one_failing_table_fails_whole_live_load() {
    let remote = MockRemoteStore::new()
        .with_dataset()
        .with_failing_table(Table::Tasks, "timeout");
    let prefs = MemoryPreferences::new().with_value("dataSource", "live");
    let mut store = DataStore::new(Some(Arc::new(remote)), Arc::new(prefs));

    let report = store.load().await;

    assert_fell_back(&report);
    assert_mock_dataset(store.collections());
}

#[tokio::test]
async fn test_mock_add_yields_fresh_ids() {
    let mut store = mock_store().await;

    let before: HashSet<String> = store.contacts().iter().map(|c| c.id.clone()).collect();
    let first = store
        .add_contact(NewContact {
            name: "Grace Hopper".to_string(),
            email: "grace@example.com".to_string(),
            company: "Navy".to_string(),
            app_ids: vec!["app_1".to_string()],
        })
        .await
        .unwrap();
    let second = store
        .add_contact(NewContact {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            company: "Analytical".to_string(),
            app_ids: vec!["app_2".to_string()],
        })
        .await
        .unwrap();

    assert!(!before.contains(&first.id));
    assert!(!before.contains(&second.id));
    assert_ne!(first.id, second.id);
    assert_eq!(store.contacts()[0].id, second.id);
    assert_eq!(store.contacts()[1].id, first.id);
    assert!(first.avatar_url.starts_with("https://"));
}

#[tokio::test]
async fn test_mock_delete_removes_from_listing() {
    let mut store = mock_store().await;

    let deal = store
        .add_deal(NewDeal {
            title: "Pilot".to_string(),
            amount: 1200.0,
            stage: DealStage::LeadIn,
            contact_id: "contact_2".to_string(),
            app_id: "app_2".to_string(),
            close_date: Utc.with_ymd_and_hms(2023, 9, 1, 0, 0, 0).unwrap(),
            probability: 20,
            next_step: String::new(),
        })
        .await
        .unwrap();
    assert!(store.deals().iter().any(|d| d.id == deal.id));

    store.delete_deal(&deal.id).await.unwrap();
    store.delete_deal("deal_3").await.unwrap();

    assert!(store.deals().iter().all(|d| d.id != deal.id && d.id != "deal_3"));
    assert_eq!(store.deals().len(), 7);
}

#[tokio::test]
async fn test_completing_task_2_is_gated_then_forced() {
    let mut store = mock_store().await;

    let mut task_2 = store.tasks()[1].clone();
    task_2.status = TaskStatus::Done;
    let outcome = store.save_task(TaskSave::Update(task_2)).await.unwrap();
    assert_gated(&outcome, &["task_1"]);

    // Nothing persisted yet
    assert_eq!(store.tasks()[1].status, TaskStatus::ToDo);

    let SaveOutcome::NeedsConfirmation(pending) = outcome else {
        panic!("expected a held save");
    };
    let saved = store.confirm_task_save(pending).await.unwrap();

    assert_eq!(saved.status, TaskStatus::Done);
    assert_eq!(store.tasks()[1].status, TaskStatus::Done);
    assert_eq!(store.tasks()[0].status, TaskStatus::InProgress);
}

#[tokio::test]
async fn test_new_done_task_with_open_prerequisite_is_gated() {
    let mut store = mock_store().await;
    let count = store.tasks().len();

    let draft = NewTask {
        title: "Close out Alice".to_string(),
        description: String::new(),
        due_date: Utc.with_ymd_and_hms(2023, 8, 1, 0, 0, 0).unwrap(),
        status: TaskStatus::Done,
        contact_id: "contact_1".to_string(),
        dependency_ids: vec!["task_3".to_string(), "task_1".to_string()],
    };
    let outcome = store.save_task(TaskSave::Create(draft)).await.unwrap();

    assert_gated(&outcome, &["task_1"]);
    assert_eq!(store.tasks().len(), count);
}

#[tokio::test]
async fn test_live_task_save_goes_through_backend() {
    let remote = Arc::new(MockRemoteStore::new().with_dataset());
    let prefs = MemoryPreferences::new().with_value("dataSource", "live");
    let mut store = DataStore::new(Some(remote.clone()), Arc::new(prefs));
    let report = store.load().await;
    assert_eq!(report.effective, DataSource::Live);

    let mut task_4 = store
        .tasks()
        .iter()
        .find(|t| t.id == "task_4")
        .cloned()
        .unwrap();
    task_4.status = TaskStatus::Done;
    let outcome = store.save_task(TaskSave::Update(task_4)).await.unwrap();
    assert!(matches!(outcome, SaveOutcome::Saved(_)));

    let row = remote
        .rows(Table::Tasks)
        .into_iter()
        .find(|r| r["id"] == "task_4")
        .unwrap();
    assert_eq!(row["status"], "Done");
}

#[tokio::test]
async fn test_mutations_after_fallback_stay_local() {
    let remote = MockRemoteStore::new()
        .with_dataset()
        .with_failing_table(Table::Deals, "503");
    let prefs = MemoryPreferences::new().with_value("dataSource", "live");
    let mut store = DataStore::new(Some(Arc::new(remote)), Arc::new(prefs));
    // The deals table fails on load too, so the store falls back to mock
    let report = store.load().await;
    assert_fell_back(&report);

    // Mock mutations after the fallback stay local
    let before = store.deals().len();
    store.delete_deal("deal_1").await.unwrap();
    assert_eq!(store.deals().len(), before - 1);
}

#[tokio::test]
async fn test_rejected_live_writes_keep_local_state() {
    let remote = Arc::new(MockRemoteStore::new().with_dataset());
    let prefs = MemoryPreferences::new().with_value("dataSource", "live");
    let mut store = DataStore::new(Some(remote.clone()), Arc::new(prefs));
    assert_eq!(store.load().await.effective, DataSource::Live);

    remote.set_failing_writes(true);
    let before = store.collections().clone();
    let draft = NewContact {
        name: "Grace Hopper".to_string(),
        email: "grace@example.com".to_string(),
        company: "Navy".to_string(),
        app_ids: vec!["app_1".to_string()],
    };
    assert!(store.add_contact(draft).await.unwrap_err().is_backend());
    assert!(store.delete_deal("deal_2").await.unwrap_err().is_backend());
    assert_eq!(store.collections(), &before);

    remote.set_failing_writes(false);
    store.delete_deal("deal_2").await.unwrap();
    assert!(store.deals().iter().all(|d| d.id != "deal_2"));
    assert!(remote.rows(Table::Deals).iter().all(|r| r["id"] != "deal_2"));
}
