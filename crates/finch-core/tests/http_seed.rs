//! Integration tests: HttpSeedDownloader against a local server.

mod common;

use finch_core::downloader::{
    DownloadError, Downloader, HttpSeedDownloader, SeedRequest, VariationsPlatform, SEED_FILE_NAME,
};

fn request() -> SeedRequest {
    SeedRequest {
        platform: VariationsPlatform::AndroidWebview,
        restrict_mode: None,
        milestone: 120,
        channel: "beta".into(),
    }
}

#[tokio::test]
async fn ok_response_stores_seed() {
    let server = common::seed_server::start(200, b"seed-bytes".to_vec());
    let dir = tempfile::tempdir().unwrap();
    let seed_path = dir.path().join(SEED_FILE_NAME);
    let d = HttpSeedDownloader::new(Some(server.url.clone()), &seed_path);

    let info = tokio::task::spawn_blocking(move || d.download(&request()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(info.result_code, 200);
    assert_eq!(info.payload.as_deref(), Some(&b"seed-bytes"[..]));
    assert_eq!(std::fs::read(&seed_path).unwrap(), b"seed-bytes");
    assert_eq!(
        server.targets(),
        vec!["/seed?osname=android_webview&milestone=120&channel=beta".to_string()]
    );
}

#[tokio::test]
async fn error_status_is_returned_without_storing() {
    let server = common::seed_server::start(503, Vec::new());
    let dir = tempfile::tempdir().unwrap();
    let seed_path = dir.path().join(SEED_FILE_NAME);
    let d = HttpSeedDownloader::new(Some(server.url.clone()), &seed_path);

    let info = tokio::task::spawn_blocking(move || d.download(&request()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(info.result_code, 503);
    assert!(info.payload.is_none());
    assert!(!seed_path.exists());
}

#[tokio::test]
async fn refused_connection_is_transport_error() {
    let port = {
        let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let dir = tempfile::tempdir().unwrap();
    let d = HttpSeedDownloader::new(
        Some(format!("http://127.0.0.1:{port}/seed")),
        dir.path().join(SEED_FILE_NAME),
    );
    let err = tokio::task::spawn_blocking(move || d.download(&request()))
        .await
        .unwrap()
        .unwrap_err();
    assert!(matches!(err, DownloadError::Transport(_)));
}
