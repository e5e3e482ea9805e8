//! Caller identity derivation from a matched certificate subject.
//!
//! Extractors are only invoked after a successful subject match, so they never
//! fail on their own; whatever they derive is returned to the caller verbatim.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::subject::Subject;

/// Kind of caller a certificate identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumerType {
    /// Internally issued certificate, consumer id taken from the CommonName.
    InternalService,
    /// Externally issued certificate, consumer id taken from the captured
    /// Organizational Unit segment.
    ExternalConsumer,
}

/// Identity derived from a matched certificate. Produced fresh per request
/// and handed to downstream authorization, never persisted.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Identity {
    pub consumer_id: String,
    pub consumer_type: ConsumerType,
    pub auth_session_extra: HashMap<String, String>,
}

/// Statically configured mapping from a full subject DN to additional
/// session attributes for known external consumers.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ConsumerMapping {
    /// Subject DN this mapping applies to, compared in normalized form.
    pub subject: String,
    /// Consumer type marker surfaced to downstream authorization.
    pub consumer_type: String,
    /// Tenant access levels granted to this consumer.
    #[serde(default)]
    pub tenant_access_levels: Vec<String>,
}

/// Per-trust-domain identity extraction rules.
///
/// The two trust domains share one parser type and differ only in pattern and
/// extractor, so the extractor is tagged configuration rather than a trait
/// object.
#[derive(Debug, Clone)]
pub enum IdentityExtractor {
    /// Internal domain: consumer id is the certificate CommonName, no extra
    /// session attributes.
    CommonName,
    /// External domain: consumer id is derived from the captured OU segment,
    /// optionally stripped of a trusted prefix; session extras carry the raw
    /// segment and any matching consumer mapping.
    CapturedOu {
        trusted_prefixes: Vec<String>,
        mappings: Vec<ConsumerMapping>,
    },
}

impl IdentityExtractor {
    /// Derive the identity for a matched subject. `captured` is the wildcard
    /// OU value when the domain's pattern has one.
    pub fn identity(&self, subject: &Subject, captured: Option<&str>) -> Identity {
        match self {
            IdentityExtractor::CommonName => Identity {
                consumer_id: subject.common_name.clone().unwrap_or_default(),
                consumer_type: ConsumerType::InternalService,
                auth_session_extra: HashMap::new(),
            },
            IdentityExtractor::CapturedOu {
                trusted_prefixes,
                mappings,
            } => {
                let raw = captured.unwrap_or_default();
                let consumer_id = strip_trusted_prefix(raw, trusted_prefixes).to_string();

                let mut extra = HashMap::new();
                extra.insert("organizational_unit".to_string(), raw.to_string());

                let normalized = subject.normalized();
                if let Some(mapping) = mappings
                    .iter()
                    .find(|m| normalize_mapping_subject(&m.subject) == normalized)
                {
                    extra.insert("consumer_type".to_string(), mapping.consumer_type.clone());
                    if !mapping.tenant_access_levels.is_empty() {
                        extra.insert(
                            "tenant_access_levels".to_string(),
                            mapping.tenant_access_levels.join(","),
                        );
                    }
                }

                Identity {
                    consumer_id,
                    consumer_type: ConsumerType::ExternalConsumer,
                    auth_session_extra: extra,
                }
            }
        }
    }
}

/// Strip the first configured prefix found at the start of `value`.
fn strip_trusted_prefix<'a>(value: &'a str, prefixes: &[String]) -> &'a str {
    for prefix in prefixes {
        if let Some(rest) = value.strip_prefix(prefix.as_str()) {
            return rest;
        }
    }
    value
}

/// Normalize a configured mapping subject through the same DN parser used for
/// incoming certificates; unparsable mapping subjects never match.
fn normalize_mapping_subject(subject: &str) -> String {
    Subject::parse(subject)
        .map(|s| s.normalized())
        .unwrap_or_default()
}
