//! Configuration management
//!
//! YAML-based configuration with environment variable overrides and default
//! values for all settings. Subject patterns and the trusted header name are
//! loaded once at startup and are immutable for the process lifetime.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cert::{ConsumerMapping, OuPattern, Subject};

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub hydrator: HydratorConfig,
    #[serde(default)]
    pub revocation: RevocationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

/// Trust-domain patterns and identity extraction settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HydratorConfig {
    /// Name of the trusted header carrying forwarded certificate data
    #[serde(default = "default_certificate_header")]
    pub certificate_header: String,
    #[serde(default)]
    pub internal_subject: InternalSubjectConfig,
    #[serde(default)]
    pub external_subject: ExternalSubjectConfig,
    /// Prefixes stripped from the captured external consumer segment
    #[serde(default)]
    pub trusted_prefixes: Vec<String>,
    /// Known external consumers keyed by full subject DN
    #[serde(default)]
    pub consumer_mappings: Vec<ConsumerMapping>,
}

impl Default for HydratorConfig {
    fn default() -> Self {
        Self {
            certificate_header: default_certificate_header(),
            internal_subject: InternalSubjectConfig::default(),
            external_subject: ExternalSubjectConfig::default(),
            trusted_prefixes: Vec::new(),
            consumer_mappings: Vec::new(),
        }
    }
}

fn default_certificate_header() -> String {
    "Certificate-Data".to_string()
}

/// Fully literal subject pattern for internally issued certificates.
/// The CommonName is the caller and is deliberately not part of the pattern.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InternalSubjectConfig {
    pub country: String,
    pub organization: String,
    pub organizational_unit: String,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
}

impl Default for InternalSubjectConfig {
    fn default() -> Self {
        Self {
            country: "PL".to_string(),
            organization: "Org".to_string(),
            organizational_unit: "OrgUnit".to_string(),
            locality: Some("Locality".to_string()),
            province: Some("State".to_string()),
        }
    }
}

/// Subject template for externally issued certificates; the OU pattern must
/// contain exactly one `*` segment capturing the consumer identifier.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExternalSubjectConfig {
    pub country: String,
    pub organization: String,
    pub organizational_unit_pattern: String,
}

impl Default for ExternalSubjectConfig {
    fn default() -> Self {
        Self {
            country: "DE".to_string(),
            organization: "Org".to_string(),
            organizational_unit_pattern: "*".to_string(),
        }
    }
}

/// Revocation list polling configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RevocationConfig {
    #[serde(default)]
    pub source: RevocationSourceConfig,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

impl RevocationConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for RevocationConfig {
    fn default() -> Self {
        Self {
            source: RevocationSourceConfig::default(),
            poll_interval_secs: default_poll_interval(),
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

fn default_poll_interval() -> u64 {
    30
}

fn default_fetch_timeout() -> u64 {
    10
}

/// Location of the authoritative revocation list
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RevocationSourceConfig {
    /// Local file, e.g. a mounted ConfigMap volume
    File { path: PathBuf },
    /// HTTP endpoint serving the raw revocation blob
    Http { url: String },
}

impl Default for RevocationSourceConfig {
    fn default() -> Self {
        RevocationSourceConfig::File {
            path: PathBuf::from("./data/revocations.txt"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides
    /// earlier): default values, configuration file (YAML), environment
    /// variables prefixed with CERTGATE_.
    pub fn load() -> Result<Self> {
        // Pick up a .env file if one exists
        let _ = dotenvy::dotenv();

        let config_path = std::env::var("CERTGATE_CONFIG")
            .map(PathBuf::from)
            .ok()
            .or_else(Self::find_config_file);

        let mut config = if let Some(ref path) = config_path {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            serde_norway::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            AppConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let paths = [
            PathBuf::from("config.yaml"),
            PathBuf::from("config/config.yaml"),
            PathBuf::from("/etc/certgate/config.yaml"),
        ];
        paths.into_iter().find(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("CERTGATE_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("CERTGATE_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(header) = std::env::var("CERTGATE_CERTIFICATE_HEADER") {
            self.hydrator.certificate_header = header;
        }
        if let Ok(url) = std::env::var("CERTGATE_REVOCATION_URL") {
            self.revocation.source = RevocationSourceConfig::Http { url };
        }
        if let Ok(path) = std::env::var("CERTGATE_REVOCATION_FILE") {
            self.revocation.source = RevocationSourceConfig::File {
                path: PathBuf::from(path),
            };
        }
        if let Ok(level) = std::env::var("CERTGATE_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.hydrator.certificate_header.trim().is_empty() {
            anyhow::bail!("hydrator.certificate_header must not be empty");
        }

        let internal_ou = OuPattern::parse(&self.hydrator.internal_subject.organizational_unit)
            .context("hydrator.internal_subject.organizational_unit is invalid")?;
        if !internal_ou.is_literal() {
            anyhow::bail!(
                "hydrator.internal_subject.organizational_unit must not contain a wildcard"
            );
        }

        let external_ou =
            OuPattern::parse(&self.hydrator.external_subject.organizational_unit_pattern)
                .context("hydrator.external_subject.organizational_unit_pattern is invalid")?;
        if external_ou.is_literal() {
            anyhow::bail!(
                "hydrator.external_subject.organizational_unit_pattern must contain exactly one wildcard segment"
            );
        }

        for mapping in &self.hydrator.consumer_mappings {
            Subject::parse(&mapping.subject).with_context(|| {
                format!(
                    "hydrator.consumer_mappings contains an unparsable subject: {:?}",
                    mapping.subject
                )
            })?;
        }

        if self.revocation.poll_interval_secs == 0 {
            anyhow::bail!("revocation.poll_interval_secs must be greater than zero");
        }
        if self.revocation.fetch_timeout_secs == 0 {
            anyhow::bail!("revocation.fetch_timeout_secs must be greater than zero");
        }

        Ok(())
    }
}
