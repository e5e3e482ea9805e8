//! Test application setup utilities
//!
//! Builds an in-process router around a configurable revocation cache so
//! tests can drive the resolve endpoint without a network listener.

use std::sync::Arc;

use axum::{body::Body, http::Request, Router};
use tower::ServiceExt;

use certgate::config::{AppConfig, ExternalSubjectConfig, InternalSubjectConfig};
use certgate::{AppState, RevocationCache, ValidationHydrator};

/// Configuration used by most tests: literal internal pattern, external
/// pattern capturing the second OU segment.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.hydrator.internal_subject = InternalSubjectConfig {
        country: "PL".to_string(),
        organization: "Org".to_string(),
        organizational_unit: "OrgUnit".to_string(),
        locality: None,
        province: None,
    };
    config.hydrator.external_subject = ExternalSubjectConfig {
        country: "DE".to_string(),
        organization: "Org".to_string(),
        organizational_unit_pattern: "Region,*".to_string(),
    };
    config
}

/// Test application wrapper for integration testing
pub struct TestApp {
    pub router: Router,
    pub revocations: Arc<RevocationCache>,
}

impl TestApp {
    /// Create a test application with an empty revocation cache
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// Create a test application with custom configuration
    pub fn with_config(config: AppConfig) -> Self {
        let revocations = Arc::new(RevocationCache::new());
        Self::with_parts(config, revocations)
    }

    /// Create a test application around an existing cache
    pub fn with_parts(config: AppConfig, revocations: Arc<RevocationCache>) -> Self {
        config.validate().expect("test config must be valid");
        let hydrator = Arc::new(
            ValidationHydrator::from_config(&config.hydrator, Arc::clone(&revocations))
                .expect("failed to build hydrator"),
        );
        let state = AppState {
            config: Arc::new(config),
            revocations: Arc::clone(&revocations),
            hydrator,
        };

        Self {
            router: certgate::app(state),
            revocations,
        }
    }

    /// Mark a set of hashes as revoked
    pub fn revoke(&self, hashes: &[&str]) {
        self.revocations
            .replace(hashes.iter().map(|h| h.to_string()).collect());
    }

    /// Make a GET request to the test application
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// POST to the resolve endpoint with the given certificate data header
    pub async fn resolve(&self, header_value: &str) -> TestResponse {
        self.resolve_with_header("Certificate-Data", header_value)
            .await
    }

    /// POST to the resolve endpoint with a custom header name
    pub async fn resolve_with_header(&self, name: &str, value: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("POST")
                .uri("/v1/certificate/data/resolve")
                .header(name, value)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// POST to the resolve endpoint without any certificate data header
    pub async fn resolve_without_header(&self) -> TestResponse {
        self.request(
            Request::builder()
                .method("POST")
                .uri("/v1/certificate/data/resolve")
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Make an arbitrary request
    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");

        TestResponse { status, body }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: axum::http::StatusCode,
    pub body: axum::body::Bytes,
}

impl TestResponse {
    pub fn assert_status(&self, expected: u16) {
        assert_eq!(
            self.status.as_u16(),
            expected,
            "unexpected status, body: {}",
            String::from_utf8_lossy(&self.body)
        );
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("response body is not valid JSON")
    }
}
