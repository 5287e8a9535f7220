//! Integration tests for net crate

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::tempdir;
    use tokio_util::sync::CancellationToken;
    use url::Url;
    use vernal_errors::{Error, NetworkError};
    use vernal_events::{channel, AppEvent, DownloadEvent};
    use vernal_net::*;
    use vernal_types::{Credentials, LoginResponse};

    const SUCCESS_BODY: &str = r#"{
        "message": {
            "download_url": "https://downloads.example.com/vernal_falls.tar.gz",
            "vernal_falls_version": "2.0.1"
        },
        "vernal_falls_config": {"api_key": "abc"},
        "org": {"id": 7, "name": "Sparta"}
    }"#;

    fn quick_client() -> NetClient {
        NetClient::new(NetConfig {
            retry_count: 0,
            timeout: Duration::from_secs(10),
            ..NetConfig::default()
        })
        .unwrap()
    }

    fn credentials(server: &MockServer) -> Credentials {
        Credentials::new("mike", "secret", Url::parse(&server.base_url()).unwrap())
    }

    fn recording_progress() -> (ProgressCallback, Arc<Mutex<Vec<DownloadProgress>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: ProgressCallback = Arc::new(move |p| sink.lock().unwrap().push(p));
        (callback, seen)
    }

    #[test]
    fn test_login_request_url() {
        let creds = Credentials::new(
            "mike@example.com",
            "p&ss word",
            Url::parse("https://home.spartascience.com").unwrap(),
        );
        let url = login_request_url(&creds, "delete-me-please-test");
        assert_eq!(url.path(), "/api/app-setup");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("email".to_string(), "mike@example.com".to_string()),
                ("password".to_string(), "p&ss word".to_string()),
                ("client-id".to_string(), "delete-me-please-test".to_string()),
            ]
        );
        assert_eq!(
            redacted(&url),
            "https://home.spartascience.com/api/app-setup"
        );
    }

    #[tokio::test]
    async fn test_login_success() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/app-setup")
                    .query_param("email", "mike")
                    .query_param("password", "secret")
                    .query_param("client-id", "test-client");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(SUCCESS_BODY);
            })
            .await;

        let response = login(&quick_client(), &credentials(&server), "test-client")
            .await
            .unwrap();

        mock.assert_async().await;
        let LoginResponse::Success(success) = response else {
            panic!("expected success");
        };
        assert_eq!(success.message.distribution_version, "2.0.1");
        assert_eq!(success.config.get("api_key").map(String::as_str), Some("abc"));
    }

    #[tokio::test]
    async fn test_login_failure_payload_with_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/app-setup");
                then.status(401).body(r#"{"error": "Invalid email or password"}"#);
            })
            .await;

        let response = login(&quick_client(), &credentials(&server), "id")
            .await
            .unwrap();
        match response {
            LoginResponse::Failure(failure) => {
                assert_eq!(failure.error, "Invalid email or password");
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_login_timeout_is_not_retried() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/app-setup");
                then.status(200)
                    .delay(Duration::from_millis(400))
                    .body(SUCCESS_BODY);
            })
            .await;

        // Retries are configured; login must still go out once.
        let client = NetClient::new(NetConfig {
            timeout: Duration::from_millis(100),
            retry_delay: Duration::from_millis(10),
            ..NetConfig::default()
        })
        .unwrap();

        let err = login(&client, &credentials(&server), "id").await.unwrap_err();
        match err {
            Error::Network(NetworkError::Timeout { url }) => {
                assert!(!url.contains("secret"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(mock.hits_async().await, 1);
    }

    #[tokio::test]
    async fn test_login_undecodable_bodies() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/app-setup");
                then.status(502).body("<html>Bad gateway</html>");
            })
            .await;

        let err = login(&quick_client(), &credentials(&server), "id")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Network(NetworkError::HttpError { status: 502, .. })
        ));

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/app-setup");
                then.status(200).body(r#"{"unexpected": true}"#);
            })
            .await;

        let err = login(&quick_client(), &credentials(&server), "id")
            .await
            .unwrap_err();
        match err {
            Error::Network(NetworkError::DecodeFailed { url, message }) => {
                assert!(!url.contains("secret"));
                assert!(message.contains("success payload"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_download() {
        let server = MockServer::start_async().await;
        let (tx, mut rx) = channel();
        let content = vec![7u8; 64 * 1024];
        let body = content.clone();
        let mock = server
            .mock_async(move |when, then| {
                when.method(GET).path("/vernal_falls.tar.gz");
                then.status(200)
                    .header("content-length", body.len().to_string())
                    .body(body);
            })
            .await;

        let temp = tempdir().unwrap();
        let dest = temp.path().join("install").join("vernal_falls.tar.gz");
        let downloader = HttpDownloader::new(quick_client()).with_event_sender(tx);
        let (progress, seen) = recording_progress();
        let url = Url::parse(&server.url("/vernal_falls.tar.gz")).unwrap();

        let stored = downloader
            .download(&url, &dest, progress, &CancellationToken::new())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(stored, dest);
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), content);
        assert!(!temp
            .path()
            .join("install")
            .join("vernal_falls.tar.gz.part")
            .exists());

        let seen = seen.lock().unwrap().clone();
        let last = seen.last().unwrap();
        assert_eq!(last.downloaded, content.len() as u64);
        assert_eq!(last.total, Some(content.len() as u64));
        assert!(seen.windows(2).all(|w| w[0].downloaded <= w[1].downloaded));

        let mut completed_hash = None;
        while let Ok(message) = rx.try_recv() {
            if let AppEvent::Download(DownloadEvent::Completed { hash, .. }) = message.event {
                completed_hash = Some(hash);
            }
        }
        assert_eq!(
            completed_hash,
            Some(blake3::hash(&content).to_hex().to_string())
        );
    }

    #[tokio::test]
    async fn test_http_download_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/missing.tar.gz");
                then.status(404).body("Not Found");
            })
            .await;

        let temp = tempdir().unwrap();
        let dest = temp.path().join("vernal_falls.tar.gz");
        let (progress, seen) = recording_progress();
        let url = Url::parse(&server.url("/missing.tar.gz")).unwrap();

        let err = HttpDownloader::new(quick_client())
            .download(&url, &dest, progress, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Network(NetworkError::HttpError { status: 404, .. })
        ));
        assert!(!dest.exists());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_download() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("source.tar.gz");
        tokio::fs::write(&source, b"archive bytes").await.unwrap();
        let dest = temp.path().join("out").join("vernal_falls.tar.gz");
        let (progress, _seen) = recording_progress();

        HttpDownloader::new(quick_client())
            .download(
                &Url::from_file_path(&source).unwrap(),
                &dest,
                progress,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"archive bytes");
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("source.tar.gz");
        tokio::fs::write(&source, b"archive bytes").await.unwrap();
        let dest = temp.path().join("vernal_falls.tar.gz");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let (progress, seen) = recording_progress();

        let err = HttpDownloader::new(quick_client())
            .download(&Url::from_file_path(&source).unwrap(), &dest, progress, &cancel)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(!dest.exists());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_mid_stream_leaves_nothing_behind() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("source.tar.gz");
        // Several reader chunks so the token is checked after the first one.
        tokio::fs::write(&source, vec![1u8; 256 * 1024]).await.unwrap();
        let dest = temp.path().join("vernal_falls.tar.gz");

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let reports = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&reports);
        let progress: ProgressCallback = Arc::new(move |_| {
            *counter.lock().unwrap() += 1;
            trigger.cancel();
        });

        let (tx, mut rx) = channel();
        let err = HttpDownloader::new(quick_client())
            .with_event_sender(tx)
            .download(&Url::from_file_path(&source).unwrap(), &dest, progress, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        assert_eq!(*reports.lock().unwrap(), 1);
        assert!(!dest.exists());
        assert!(!temp.path().join("vernal_falls.tar.gz.part").exists());

        let mut saw_cancelled = false;
        while let Ok(message) = rx.try_recv() {
            if matches!(message.event, AppEvent::Download(DownloadEvent::Cancelled { .. })) {
                saw_cancelled = true;
            }
        }
        assert!(saw_cancelled);
    }

    #[tokio::test]
    async fn test_unsupported_scheme() {
        let temp = tempdir().unwrap();
        let (progress, _) = recording_progress();
        let err = HttpDownloader::new(quick_client())
            .download(
                &Url::parse("ftp://example.com/a.tar.gz").unwrap(),
                &temp.path().join("a"),
                progress,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Network(NetworkError::UnsupportedProtocol { .. })
        ));
    }

    #[tokio::test]
    async fn test_connection_monitor() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/health-check");
                then.status(200).body(r#"{"status": "ok"}"#);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/not-json");
                then.status(200).body("ok");
            })
            .await;

        let client = quick_client();
        let url = |path: &str| Url::parse(&server.url(path)).unwrap();

        assert!(ConnectionMonitor::new(client.clone(), url("/api/health-check"))
            .update()
            .await);
        assert!(!ConnectionMonitor::new(client.clone(), url("/not-json"))
            .update()
            .await);
        assert!(!ConnectionMonitor::new(client.clone(), url("/missing"))
            .update()
            .await);

        let temp = tempdir().unwrap();
        let health = temp.path().join("health-check-success.json");
        tokio::fs::write(&health, br#"{"healthy": true}"#).await.unwrap();
        assert!(
            ConnectionMonitor::new(client.clone(), Url::from_file_path(&health).unwrap())
                .update()
                .await
        );
        assert!(!ConnectionMonitor::new(
            client,
            Url::from_file_path(temp.path().join("not-found.json")).unwrap()
        )
        .update()
        .await);
    }
}
