//! Tests for state_db (use in-memory DB helper from db).

use crate::state_db::db::open_memory;
use crate::state_db::{JobDescriptor, JobExtras, MetricsPrefs, NetworkType};

#[tokio::test]
async fn empty_db_has_unset_metrics() {
    let db = open_memory().await.unwrap();
    let m = db.read_metrics().await.unwrap();
    assert_eq!(m, MetricsPrefs::default());
    assert!(m.is_empty());
}

#[tokio::test]
async fn write_metrics_replaces_and_clears_fields() {
    let db = open_memory().await.unwrap();
    let first = MetricsPrefs {
        seed_fetch_result: Some(200),
        seed_fetch_time: Some(10),
        last_job_start_time: Some(100),
        last_enqueue_time: Some(50),
        job_interval: Some(7),
        job_queue_time: Some(0),
    };
    db.write_metrics(&first).await.unwrap();
    assert_eq!(db.read_metrics().await.unwrap(), first);

    let second = MetricsPrefs {
        seed_fetch_result: Some(404),
        last_job_start_time: Some(300),
        ..MetricsPrefs::default()
    };
    db.write_metrics(&second).await.unwrap();
    let read = db.read_metrics().await.unwrap();
    assert_eq!(read, second);
    assert!(read.last_enqueue_time.is_none());
    assert!(read.job_queue_time.is_none());
}

#[tokio::test]
async fn zero_is_distinct_from_unset() {
    let db = open_memory().await.unwrap();
    db.set_last_enqueue_time(0).await.unwrap();
    let m = db.read_metrics().await.unwrap();
    assert_eq!(m.last_enqueue_time, Some(0));
    assert!(m.job_interval.is_none());
}

#[tokio::test]
async fn set_last_enqueue_time_keeps_other_keys() {
    let db = open_memory().await.unwrap();
    let base = MetricsPrefs {
        seed_fetch_result: Some(-1),
        last_job_start_time: Some(42),
        ..MetricsPrefs::default()
    };
    db.write_metrics(&base).await.unwrap();
    db.set_last_enqueue_time(99).await.unwrap();
    let m = db.read_metrics().await.unwrap();
    assert_eq!(m.seed_fetch_result, Some(-1));
    assert_eq!(m.last_job_start_time, Some(42));
    assert_eq!(m.last_enqueue_time, Some(99));
}

#[tokio::test]
async fn put_pending_job_replaces_and_bumps_generation() {
    let db = open_memory().await.unwrap();
    assert!(db.get_pending_job(83).await.unwrap().is_none());

    let stored = db
        .put_pending_job(&JobDescriptor::new(83, JobExtras::default()), 1000)
        .await
        .unwrap();
    assert_eq!(stored.generation, 1);
    assert_eq!(stored.scheduled_at, 1000);

    let fetched = db.get_pending_job(83).await.unwrap().expect("descriptor");
    assert_eq!(fetched, stored);
    assert_eq!(fetched.network, NetworkType::Any);
    assert!(fetched.requires_charging);
    assert_eq!(fetched.extras.request_count, 0);

    let replaced = db
        .put_pending_job(
            &JobDescriptor::new(83, JobExtras { request_count: 2 }).with_not_before(5000),
            2000,
        )
        .await
        .unwrap();
    assert_eq!(replaced.generation, 2);
    let fetched = db.get_pending_job(83).await.unwrap().expect("descriptor");
    assert_eq!(fetched.extras.request_count, 2);
    assert_eq!(fetched.not_before, Some(5000));
    assert!(db.get_pending_job(84).await.unwrap().is_none());
}

#[tokio::test]
async fn take_ready_job_honors_not_before() {
    let db = open_memory().await.unwrap();
    db.put_pending_job(&JobDescriptor::new(83, JobExtras::default()).with_not_before(500), 0)
        .await
        .unwrap();

    assert!(db.take_ready_job(83, 499).await.unwrap().is_none());
    assert!(db.get_pending_job(83).await.unwrap().is_some());

    let taken = db.take_ready_job(83, 500).await.unwrap().expect("ready");
    assert_eq!(taken.job_id, 83);
    assert!(db.get_pending_job(83).await.unwrap().is_none());
    assert!(db.take_ready_job(83, 1000).await.unwrap().is_none());
}

#[tokio::test]
async fn remove_pending_job_reports_existence() {
    let db = open_memory().await.unwrap();
    assert!(!db.remove_pending_job(83).await.unwrap());
    db.put_pending_job(&JobDescriptor::new(83, JobExtras::default()), 0)
        .await
        .unwrap();
    assert!(db.remove_pending_job(83).await.unwrap());
    assert!(db.get_pending_job(83).await.unwrap().is_none());
}

#[test]
fn network_type_reads_back_stored_names() {
    for network in [NetworkType::None, NetworkType::Any, NetworkType::Unmetered] {
        assert_eq!(NetworkType::parse_stored(network.as_str()), network);
    }
    assert_eq!(NetworkType::parse_stored("cellular"), NetworkType::Any);
}
