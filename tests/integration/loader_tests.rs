//! Revocation loader integration tests
//!
//! Exercises the loader against real collaborators: an HTTP source backed by
//! wiremock and a file source on disk, including the fail-last-good policy
//! observed through the resolve endpoint.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use certgate::revocation::{
    FileRevocationSource, HttpRevocationSource, RevocationCache, RevocationLoader,
    RevocationSource,
};

use crate::common::{test_config, TestApp};

fn loader(cache: &Arc<RevocationCache>, source: Arc<dyn RevocationSource>) -> RevocationLoader {
    RevocationLoader::new(
        Arc::clone(cache),
        source,
        Duration::from_millis(20),
        Duration::from_secs(2),
    )
}

#[tokio::test]
async fn test_http_source_fetches_and_publishes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/revocations"))
        .respond_with(ResponseTemplate::new(200).set_body_string("h1\nh2\nh3\n"))
        .mount(&server)
        .await;

    let cache = Arc::new(RevocationCache::new());
    let source = Arc::new(HttpRevocationSource::new(format!(
        "{}/revocations",
        server.uri()
    )));

    loader(&cache, source).refresh_once().await.unwrap();
    assert!(cache.is_revoked("h1"));
    assert!(cache.is_revoked("h3"));
    assert!(!cache.is_revoked("unknown"));
}

#[tokio::test]
async fn test_http_error_status_is_a_refresh_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/revocations"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let cache = Arc::new(RevocationCache::new());
    cache.replace(std::iter::once("h1".to_string()).collect());

    let source = Arc::new(HttpRevocationSource::new(format!(
        "{}/revocations",
        server.uri()
    )));
    assert!(loader(&cache, source).refresh_once().await.is_err());

    // last known-good set retained
    assert!(cache.is_revoked("h1"));
    assert_eq!(cache.generation(), 1);
}

#[tokio::test]
async fn test_polling_loop_picks_up_list_changes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/revocations"))
        .respond_with(ResponseTemplate::new(200).set_body_string("h1\n"))
        .mount(&server)
        .await;

    let cache = Arc::new(RevocationCache::new());
    let source = Arc::new(HttpRevocationSource::new(format!(
        "{}/revocations",
        server.uri()
    )));

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(loader(&cache, source).run(shutdown.clone()));

    // wait for the initial load
    for _ in 0..50 {
        if cache.has_loaded() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(cache.is_revoked("h1"));

    // swap the served list and wait for the next poll to publish it
    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/revocations"))
        .respond_with(ResponseTemplate::new(200).set_body_string("h2\n"))
        .mount(&server)
        .await;

    for _ in 0..100 {
        if cache.is_revoked("h2") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(cache.is_revoked("h2"));
    assert!(!cache.is_revoked("h1"));

    shutdown.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_fail_last_good_observed_through_resolve_endpoint() {
    // Scenario: successful initial load of {h1}, then the source disappears;
    // two failed refreshes later the certificate must still be rejected.
    let dir = tempfile::tempdir().unwrap();
    let list_path = dir.path().join("revocations.txt");
    tokio::fs::write(&list_path, "h1\n").await.unwrap();

    let cache = Arc::new(RevocationCache::new());
    let app = TestApp::with_parts(test_config(), Arc::clone(&cache));

    let source: Arc<dyn RevocationSource> = Arc::new(FileRevocationSource::new(&list_path));
    let loader = loader(&cache, source);

    loader.refresh_once().await.unwrap();
    let response = app
        .resolve("Hash=h1;Subject=\"C=PL,O=Org,OU=OrgUnit,CN=svc-1\"")
        .await;
    response.assert_status(401);

    // source goes away; refreshes fail but the set survives
    tokio::fs::remove_file(&list_path).await.unwrap();
    assert!(loader.refresh_once().await.is_err());
    assert!(loader.refresh_once().await.is_err());

    let response = app
        .resolve("Hash=h1;Subject=\"C=PL,O=Org,OU=OrgUnit,CN=svc-1\"")
        .await;
    response.assert_status(401);
    assert!(cache.is_revoked("h1"));

    // the source returns with the hash removed; access is restored
    tokio::fs::write(&list_path, "other\n").await.unwrap();
    loader.refresh_once().await.unwrap();
    let response = app
        .resolve("Hash=h1;Subject=\"C=PL,O=Org,OU=OrgUnit,CN=svc-1\"")
        .await;
    response.assert_status(200);
}
