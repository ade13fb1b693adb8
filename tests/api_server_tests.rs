//! HTTP layer: counting middleware with the delegated exclusion policy,
//! the count query endpoint and the administrative reset.

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use visit_tracker::api::server::VisitServer;
use visit_tracker::core::config::AppConfig;
use visit_tracker::counter::lifecycle::CounterLifecycle;
use visit_tracker::counter::store;

fn test_config(data_dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.counter.data_dir = data_dir.to_string_lossy().into_owned();
    config
}

fn create_test_server(config: AppConfig) -> TestServer {
    let lifecycle = Arc::new(CounterLifecycle::new(config.counter.clone()));
    lifecycle.init(config.counter.backing_file());
    TestServer::new(VisitServer::new(config, lifecycle).create_router()).unwrap()
}

async fn current_count(server: &TestServer) -> u64 {
    let response = server.get("/visit-count").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    body["total_visits"].as_u64().unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let dir = tempfile::tempdir().unwrap();
    let server = create_test_server(test_config(dir.path()));

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_qualifying_requests_bump_the_count() {
    let dir = tempfile::tempdir().unwrap();
    let server = create_test_server(test_config(dir.path()));

    assert_eq!(current_count(&server).await, 0);

    for _ in 0..3 {
        let response = server.get("/").await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }
    assert_eq!(current_count(&server).await, 3);

    // the count query itself never counts
    assert_eq!(current_count(&server).await, 3);
}

#[tokio::test]
async fn test_visit_count_payload_shape() {
    let dir = tempfile::tempdir().unwrap();
    let server = create_test_server(test_config(dir.path()));
    server.get("/").await;

    let response = server.get("/visit-count").await;
    let body: Value = response.json();
    assert_eq!(body["count"], 1);
    assert_eq!(body["total_visits"], 1);
    assert!(body["update_time"].is_string());
}

#[tokio::test]
async fn test_static_assets_and_operational_paths_are_excluded() {
    let dir = tempfile::tempdir().unwrap();
    let server = create_test_server(test_config(dir.path()));

    server.get("/banner.png").await;
    server.get("/style.css").await;
    server.get("/health").await;
    assert_eq!(current_count(&server).await, 0);

    // unknown non-asset pages still count, 404 or not
    let response = server.get("/some-old-post").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(current_count(&server).await, 1);
}

#[tokio::test]
async fn test_admin_reset_zeroes_count_and_backing_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let backing_file = config.counter.backing_file();
    let server = create_test_server(config);

    for _ in 0..4 {
        server.get("/").await;
    }
    assert_eq!(current_count(&server).await, 4);

    let response = server.post("/admin/reset-visits").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["count"], 0);
    assert_eq!(body["flushed"], true);

    assert_eq!(current_count(&server).await, 0);
    assert_eq!(store::load(&backing_file), 0);
}

#[tokio::test]
async fn test_failed_startup_still_flushes_counter() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());

    // Occupy a port so start() fails at bind time.
    let occupied = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = occupied.local_addr().unwrap().port();

    let backing_file = config.counter.backing_file();
    let lifecycle = Arc::new(CounterLifecycle::new(config.counter.clone()));
    let counter = lifecycle.init(config.counter.backing_file());
    assert_eq!(counter.increment(), 1);

    let result = VisitServer::new(config, lifecycle).start().await;
    assert!(result.is_err());

    // Even an error exit goes through the final forced flush.
    assert_eq!(store::load(&backing_file), 1);
}

#[tokio::test]
async fn test_uninitialized_counter_reports_service_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    // lifecycle deliberately not initialized
    let lifecycle = Arc::new(CounterLifecycle::new(config.counter.clone()));
    let server = TestServer::new(VisitServer::new(config, lifecycle).create_router()).unwrap();

    let response = server.get("/visit-count").await;
    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}
