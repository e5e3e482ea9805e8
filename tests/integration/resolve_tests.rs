//! Resolve endpoint integration tests
//!
//! Drives the full router through the resolve endpoint: trust-domain
//! ordering, revocation rejection, header-order determinism and the error
//! taxonomy for missing or malformed headers.

use crate::common::{test_config, TestApp};

const INTERNAL_SVC1: &str = "Hash=h1;Subject=\"C=PL,O=Org,OU=OrgUnit,CN=svc-1\"";
const EXTERNAL_CONSUMER42: &str = "Hash=h2;Subject=\"C=DE,O=Org,OU=Region,OU=consumer-42,CN=x\"";

#[tokio::test]
async fn test_internal_certificate_accepted() {
    let app = TestApp::new();
    let response = app.resolve(INTERNAL_SVC1).await;

    response.assert_status(200);
    let json = response.json();
    assert_eq!(json["consumer_id"], "svc-1");
    assert_eq!(json["consumer_type"], "internal_service");
}

#[tokio::test]
async fn test_revoked_internal_certificate_rejected() {
    let app = TestApp::new();
    app.revoke(&["h1"]);

    let response = app.resolve(INTERNAL_SVC1).await;
    response.assert_status(401);

    let json = response.json();
    assert_eq!(json["error"], "unauthorized");
    // the body must not echo certificate contents
    let body = String::from_utf8_lossy(&response.body).to_string();
    assert!(!body.contains("svc-1"));
    assert!(!body.contains("h1"));
}

#[tokio::test]
async fn test_external_certificate_accepted_ignoring_revocations() {
    let app = TestApp::new();
    // the external hash being in the set must not matter
    app.revoke(&["h2"]);

    let response = app.resolve(EXTERNAL_CONSUMER42).await;
    response.assert_status(200);
    let json = response.json();
    assert_eq!(json["consumer_id"], "consumer-42");
    assert_eq!(json["consumer_type"], "external_consumer");
    assert_eq!(
        json["auth_session_extra"]["organizational_unit"],
        "consumer-42"
    );
}

#[tokio::test]
async fn test_missing_header_is_bad_request() {
    let app = TestApp::new();
    let response = app.resolve_without_header().await;
    response.assert_status(400);
    assert_eq!(response.json()["error"], "bad_request");
}

#[tokio::test]
async fn test_malformed_header_is_bad_request() {
    let app = TestApp::new();
    let response = app.resolve("Hash=h1").await;
    response.assert_status(400);
}

#[tokio::test]
async fn test_unmatched_certificate_is_unauthorized() {
    let app = TestApp::new();
    let response = app
        .resolve("Hash=h9;Subject=\"C=US,O=Nobody,CN=stranger\"")
        .await;
    response.assert_status(401);
}

#[tokio::test]
async fn test_first_matching_entry_wins() {
    let app = TestApp::new();
    let header = format!("{},{}", EXTERNAL_CONSUMER42, INTERNAL_SVC1);

    // the external entry comes first in header order; the internal parser
    // skips it, so the internal certificate still resolves
    let response = app.resolve(&header).await;
    response.assert_status(200);
    assert_eq!(response.json()["consumer_id"], "svc-1");

    // two internal entries: the first one must win even though both match
    let header = "Hash=ha;Subject=\"C=PL,O=Org,OU=OrgUnit,CN=first\",\
                  Hash=hb;Subject=\"C=PL,O=Org,OU=OrgUnit,CN=second\"";
    let response = app.resolve(header).await;
    response.assert_status(200);
    assert_eq!(response.json()["consumer_id"], "first");
}

#[tokio::test]
async fn test_first_matching_entry_revocation_applies_to_that_entry() {
    let app = TestApp::new();
    app.revoke(&["ha"]);
    let header = "Hash=ha;Subject=\"C=PL,O=Org,OU=OrgUnit,CN=first\",\
                  Hash=hb;Subject=\"C=PL,O=Org,OU=OrgUnit,CN=second\"";
    // first match wins, so the revoked first entry rejects the request even
    // though a clean entry follows
    let response = app.resolve(header).await;
    response.assert_status(401);
}

#[tokio::test]
async fn test_custom_header_name() {
    let mut config = test_config();
    config.hydrator.certificate_header = "X-Client-Cert-Data".to_string();
    let app = TestApp::with_config(config);

    let response = app
        .resolve_with_header("X-Client-Cert-Data", INTERNAL_SVC1)
        .await;
    response.assert_status(200);

    // the default header name is no longer trusted
    let response = app.resolve(INTERNAL_SVC1).await;
    response.assert_status(400);
}

#[tokio::test]
async fn test_trusted_prefix_stripping_over_http() {
    let mut config = test_config();
    config.hydrator.trusted_prefixes = vec!["cmp-".to_string()];
    let app = TestApp::with_config(config);

    let response = app
        .resolve("Hash=h3;Subject=\"C=DE,O=Org,OU=Region,OU=cmp-consumer-42,CN=x\"")
        .await;
    response.assert_status(200);
    assert_eq!(response.json()["consumer_id"], "consumer-42");
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new();
    let response = app.get("/health").await;
    response.assert_status(200);
    assert_eq!(response.json()["status"], "healthy");
}

#[tokio::test]
async fn test_detailed_health_reports_revocation_state() {
    let app = TestApp::new();

    let response = app.get("/health/detailed").await;
    response.assert_status(200);
    let json = response.json();
    assert_eq!(json["revocation"]["generation"], 0);
    assert_eq!(json["revocation"]["initial_load_complete"], false);

    app.revoke(&["h1", "h2"]);
    let json = app.get("/health/detailed").await.json();
    assert_eq!(json["revocation"]["generation"], 1);
    assert_eq!(json["revocation"]["entries"], 2);
    assert_eq!(json["revocation"]["initial_load_complete"], true);
}
