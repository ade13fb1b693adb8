//! Lifecycle contract: fail-fast before init, first-wins idempotent init,
//! flush-on-shutdown.

use std::sync::Arc;
use tempfile::tempdir;
use visit_tracker::core::config::CounterConfig;
use visit_tracker::core::errors::CounterError;
use visit_tracker::counter::lifecycle::CounterLifecycle;
use visit_tracker::counter::store;

#[tokio::test]
async fn test_use_before_init_fails_fast() {
    let lifecycle = CounterLifecycle::new(CounterConfig::default());
    match lifecycle.counter() {
        Err(CounterError::NotInitialized) => {}
        other => panic!("expected NotInitialized, got {:?}", other.map(|c| c.current())),
    }
}

#[tokio::test]
async fn test_init_is_idempotent_and_first_path_wins() {
    let dir = tempdir().unwrap();
    let first_path = dir.path().join("first.json");
    let second_path = dir.path().join("second.json");

    let lifecycle = CounterLifecycle::new(CounterConfig::default());
    let first = lifecycle.init(first_path.clone());
    first.increment();

    let second = lifecycle.init(second_path.clone());
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.current(), 1);
    assert!(!second_path.exists());

    lifecycle.shutdown().await;
}

#[tokio::test]
async fn test_init_loads_pre_existing_count() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("visit_count.json");
    std::fs::write(
        &path,
        br#"{"total_visits": 41, "last_update": "2026-01-01 00:00:00"}"#,
    )
    .unwrap();

    let lifecycle = CounterLifecycle::new(CounterConfig::default());
    let counter = lifecycle.init(path);
    assert_eq!(counter.current(), 41);
    assert_eq!(counter.increment(), 42);

    lifecycle.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_flushes_final_count() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("visit_count.json");

    let lifecycle = CounterLifecycle::new(CounterConfig::default());
    let counter = lifecycle.init(path.clone());
    assert_eq!(counter.increment(), 1);

    lifecycle.shutdown().await;
    assert_eq!(store::load(&path), 1);
}

#[tokio::test]
async fn test_shutdown_without_init_is_harmless() {
    let lifecycle = CounterLifecycle::new(CounterConfig::default());
    lifecycle.shutdown().await;
}
