#![allow(dead_code)]

pub mod contract;

use axum::http::{HeaderName, HeaderValue, header::COOKIE};
use axum_test::TestServer;
use std::sync::Arc;
use shortener::application::services::TokenSigner;
use shortener::config::{Config, StorageBackend};
use shortener::domain::delete_worker::DeleteWorker;
use shortener::domain::repositories::UrlStorage;
use shortener::infrastructure::persistence::MemoryStorage;
use shortener::routes::router;
use shortener::server::build_state;
use shortener::state::AppState;

pub const TEST_SECRET: &str = "test-signing-secret";
pub const BASE_URL: &str = "http://short.test";

pub fn test_config() -> Config {
    Config {
        listen_addr: "127.0.0.1:0".to_string(),
        base_url: BASE_URL.to_string(),
        storage: StorageBackend::Memory,
        log_level: "info".to_string(),
        log_format: "text".to_string(),
        user_signing_secret: Some(TEST_SECRET.to_string()),
        trusted_subnet: Some("10.0.0.0/8".to_string()),
        delete_queue_capacity: 100,
        delete_chunk_size: 10,
        delete_flush_interval_secs: 10,
        delete_retry_delay_secs: 5,
        delete_shutdown_timeout_secs: 30,
        db_max_connections: 10,
        db_connect_timeout: 30,
    }
}

pub fn memory_storage() -> Arc<dyn UrlStorage> {
    Arc::new(MemoryStorage::new())
}

/// Test server over `storage`. The delete worker is returned unstarted.
pub fn test_server(storage: Arc<dyn UrlStorage>) -> (TestServer, DeleteWorker, AppState) {
    let (state, worker) = build_state(&test_config(), storage).unwrap();
    let server = TestServer::new(router(state.clone())).unwrap();
    (server, worker, state)
}

pub fn token_for(user_id: i64) -> String {
    TokenSigner::new(TEST_SECRET).sign(user_id)
}

pub fn cookie(token: &str) -> (HeaderName, HeaderValue) {
    (
        COOKIE,
        HeaderValue::from_str(&format!("token={token}")).unwrap(),
    )
}

/// Extracts the token from a `Set-Cookie: token=...; ...` header value.
pub fn token_from_set_cookie(value: &HeaderValue) -> String {
    value
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .and_then(|pair| pair.strip_prefix("token="))
        .unwrap()
        .to_string()
}
