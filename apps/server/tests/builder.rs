use silo_kernel::domain::config::{ApiConfig, SslConfig};
use silo_server::Server;

#[tokio::test]
async fn test_build_creates_storage_root() {
    let tmp = tempfile::tempdir().unwrap();
    let data_dir = tmp.path().join("objects");

    let server = Server::builder().data_dir(&data_dir).build().await.unwrap();

    assert!(data_dir.is_dir());
    assert_eq!(server.state().storage.root(), data_dir.canonicalize().unwrap());
}

#[tokio::test]
async fn test_build_without_create_requires_existing_root() {
    let tmp = tempfile::tempdir().unwrap();
    let mut cfg = ApiConfig::default();
    cfg.storage.data_dir = tmp.path().join("missing");
    cfg.storage.create = false;

    let err = Server::builder().config(cfg).build().await.unwrap_err();

    assert!(err.to_string().contains("Failed to open storage root"));
    assert!(!tmp.path().join("missing").exists());
}

#[tokio::test]
async fn test_build_rejects_missing_certificate() {
    let tmp = tempfile::tempdir().unwrap();
    let mut cfg = ApiConfig::default();
    cfg.storage.data_dir = tmp.path().join("objects");
    cfg.server.ssl =
        Some(SslConfig { cert: tmp.path().join("cert.pem"), key: tmp.path().join("key.pem") });

    let err = Server::builder().config(cfg).build().await.unwrap_err();

    assert!(err.to_string().contains("SSL certificate not found"));
}

#[tokio::test]
async fn test_port_override_is_kept() {
    let tmp = tempfile::tempdir().unwrap();

    let server = Server::builder().data_dir(tmp.path()).port(9999).build().await.unwrap();

    assert_eq!(server.state().config.server.port, 9999);
}
