//! Revocation-source collaborators.
//!
//! A source returns the current raw revocation blob: a delimited list of
//! revoked certificate fingerprints. How the blob is produced and stored is
//! owned by the operator; this module only reads it, either over HTTP or from
//! a local file.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;

/// Reader for the authoritative revocation list.
#[async_trait]
pub trait RevocationSource: Send + Sync {
    /// Fetch the current raw revocation blob.
    async fn fetch(&self) -> Result<String>;

    /// Human-readable location of the source, for logging.
    fn describe(&self) -> String;
}

/// Parse a revocation blob into a set of fingerprints.
///
/// Fingerprints are separated by whitespace or commas; blank tokens and
/// `#`-prefixed comment lines are ignored.
pub fn parse_revocation_blob(blob: &str) -> HashSet<String> {
    blob.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split([',', ' ', '\t']))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Revocation list served over HTTP, e.g. by an internal config service.
pub struct HttpRevocationSource {
    client: reqwest::Client,
    url: String,
}

impl HttpRevocationSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl RevocationSource for HttpRevocationSource {
    async fn fetch(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("failed to fetch revocation list from {}", self.url))?
            .error_for_status()
            .with_context(|| format!("revocation source {} returned an error", self.url))?;
        response
            .text()
            .await
            .context("failed to read revocation list body")
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Revocation list read from a local file, e.g. a mounted ConfigMap volume.
pub struct FileRevocationSource {
    path: PathBuf,
}

impl FileRevocationSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RevocationSource for FileRevocationSource {
    async fn fetch(&self) -> Result<String> {
        tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read revocation list from {:?}", self.path))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
