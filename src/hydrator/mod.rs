//! Validation hydrator
//!
//! Per-request orchestration of the two trust-domain parsers and the
//! revocation check. The internal domain is tried first; a domain mismatch
//! falls through to the external domain, while a structurally bad header
//! short-circuits to a 400 without trying the other domain. External
//! certificates are not internally administered and are therefore never
//! checked against the internal revocation list.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cert::{
    HeaderParser, Identity, IdentityExtractor, OuPattern, ParseError, SubjectPattern, TrustDomain,
};
use crate::config::HydratorConfig;
use crate::revocation::RevocationCache;
use crate::utils::error::AppError;

pub struct ValidationHydrator {
    internal: HeaderParser,
    external: HeaderParser,
    revocations: Arc<RevocationCache>,
}

impl ValidationHydrator {
    pub fn new(
        internal: HeaderParser,
        external: HeaderParser,
        revocations: Arc<RevocationCache>,
    ) -> Self {
        Self {
            internal,
            external,
            revocations,
        }
    }

    /// Build both domain parsers from configuration. Patterns are fixed for
    /// the process lifetime.
    pub fn from_config(
        config: &HydratorConfig,
        revocations: Arc<RevocationCache>,
    ) -> anyhow::Result<Self> {
        let internal_ou = OuPattern::parse(&config.internal_subject.organizational_unit)?;
        if !internal_ou.is_literal() {
            anyhow::bail!("internal subject pattern must not contain a wildcard segment");
        }
        let internal = HeaderParser::new(
            TrustDomain::Internal,
            SubjectPattern {
                country: config.internal_subject.country.clone(),
                organization: config.internal_subject.organization.clone(),
                organizational_unit: internal_ou,
                locality: config.internal_subject.locality.clone(),
                province: config.internal_subject.province.clone(),
            },
            IdentityExtractor::CommonName,
        );

        let external_ou = OuPattern::parse(&config.external_subject.organizational_unit_pattern)?;
        if external_ou.is_literal() {
            anyhow::bail!("external subject pattern must contain exactly one wildcard segment");
        }
        let external = HeaderParser::new(
            TrustDomain::External,
            SubjectPattern {
                country: config.external_subject.country.clone(),
                organization: config.external_subject.organization.clone(),
                organizational_unit: external_ou,
                locality: None,
                province: None,
            },
            IdentityExtractor::CapturedOu {
                trusted_prefixes: config.trusted_prefixes.clone(),
                mappings: config.consumer_mappings.clone(),
            },
        );

        Ok(Self::new(internal, external, revocations))
    }

    /// Decide whether the forwarded certificate data identifies an accepted
    /// caller. Reads shared state only through the revocation cache snapshot;
    /// mutates nothing.
    pub fn resolve(&self, header_value: Option<&str>) -> Result<Identity, AppError> {
        let value = header_value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::BadRequest("certificate data header is missing".to_string()))?;

        match self.internal.parse(value) {
            Ok((identity, hash)) => {
                if self.revocations.is_revoked(&hash) {
                    warn!(hash = %hash, "Rejecting revoked internal certificate");
                    return Err(AppError::Unauthorized(
                        "certificate has been revoked".to_string(),
                    ));
                }
                debug!(
                    consumer_id = %identity.consumer_id,
                    domain = %self.internal.domain(),
                    "Certificate accepted"
                );
                Ok(identity)
            }
            Err(ParseError::NoMatch) => match self.external.parse(value) {
                Ok((identity, _hash)) => {
                    debug!(
                        consumer_id = %identity.consumer_id,
                        domain = %self.external.domain(),
                        "Certificate accepted"
                    );
                    Ok(identity)
                }
                Err(ParseError::NoMatch) => Err(AppError::Unauthorized(
                    "certificate does not match any configured trust domain".to_string(),
                )),
                Err(ParseError::Malformed(msg)) => Err(AppError::BadRequest(msg)),
            },
            Err(ParseError::Malformed(msg)) => Err(AppError::BadRequest(msg)),
        }
    }
}
