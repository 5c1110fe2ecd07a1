//! Behavior when no backend answers.

#![allow(clippy::unwrap_used)]

use secrecy::SecretString;
use vunjabei_client::error::SERVICE_UNAVAILABLE;
use vunjabei_client::{
    ApiClient, CatalogService, ClientConfig, ClientError, DashboardStats, ErrorKind, FileStorage,
    SessionStore,
};

/// Config for a port nothing listens on.
async fn dead_backend(state: &tempfile::TempDir) -> ClientConfig {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut config = ClientConfig::new(&format!("http://{addr}/api/")).unwrap();
    config.state_dir = state.path().to_path_buf();
    config
}

#[tokio::test]
async fn test_login_reports_outage_not_bad_credentials() {
    let state = tempfile::tempdir().unwrap();
    let config = dead_backend(&state).await;
    let api = ApiClient::new(&config).unwrap();
    let sessions = SessionStore::open(api, FileStorage::new(config.session_file()));

    let err = sessions
        .login("alice", &SecretString::from("Kanga#2024".to_string()))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Unreachable(_)));
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(err.user_message(), SERVICE_UNAVAILABLE);
    assert!(sessions.current().is_none());
    assert!(!config.session_file().exists());
}

#[tokio::test]
async fn test_catalog_reads_fail_as_transport_errors() {
    let state = tempfile::tempdir().unwrap();
    let config = dead_backend(&state).await;
    let catalog = CatalogService::new(ApiClient::new(&config).unwrap());

    let err = catalog.list_products().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(!catalog.submit_guard().is_busy());
}

#[tokio::test]
async fn test_dashboard_degrades_to_zero() {
    let state = tempfile::tempdir().unwrap();
    let config = dead_backend(&state).await;
    let api = ApiClient::new(&config).unwrap();

    let stats = DashboardStats::load(&api).await;
    assert_eq!(stats, DashboardStats::default());
}
