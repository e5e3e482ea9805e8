//! Forwarded-certificate header decoding and per-trust-domain parsing.
//!
//! The TLS-terminating proxy forwards verified client-certificate data in a
//! single trusted header. The header carries one or more certificate elements
//! separated by commas; each element is a semicolon-separated list of
//! `Key=Value` pairs, with the subject DN double-quoted to protect embedded
//! commas:
//!
//! ```text
//! Certificate-Data: Hash=a1b2c3;Subject="C=PL,O=Org,OU=OrgUnit,CN=svc-1",
//!                   Hash=d4e5f6;Subject="C=DE,O=Org,OU=Region,OU=consumer-42,CN=x"
//! ```
//!
//! Recognized keys are `Hash` (certificate fingerprint) and `Subject`; any
//! other keys the proxy forwards are ignored. Elements are scanned in header
//! order and the first subject matching the domain's pattern wins, even if a
//! later element would also match.

use thiserror::Error;

use super::identity::{Identity, IdentityExtractor};
use super::subject::{match_subject, Subject, SubjectPattern};
use super::{split_outside_quotes, unquote, TrustDomain};

/// One certificate element decoded from the forwarded header.
/// Constructed once per parse, never mutated.
#[derive(Debug, Clone)]
pub struct CertificateEntry {
    pub subject: Subject,
    pub hash: String,
}

/// Errors produced while parsing the forwarded-certificate header.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Header absent or structurally unparsable; not retried, surfaced to
    /// the caller as a 400.
    #[error("malformed certificate data header: {0}")]
    Malformed(String),
    /// Header parses but no entry matches this domain's subject pattern;
    /// the caller may try the other trust domain.
    #[error("no certificate entry matches the configured subject pattern")]
    NoMatch,
}

/// Decode the raw header value into an ordered sequence of entries.
pub fn decode_header(value: &str) -> Result<Vec<CertificateEntry>, ParseError> {
    if value.trim().is_empty() {
        return Err(ParseError::Malformed("header value is empty".to_string()));
    }

    let mut entries = Vec::new();
    for element in split_outside_quotes(value, ',') {
        let element = element.trim();
        if element.is_empty() {
            continue;
        }

        let mut hash = None;
        let mut subject_dn = None;
        for pair in split_outside_quotes(element, ';') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            // messages must stay generic, the header may carry certificate
            // contents that a 400 body must not echo
            let (key, raw_value) = pair
                .split_once('=')
                .ok_or_else(|| ParseError::Malformed("expected Key=Value pair".to_string()))?;
            match key.trim() {
                "Hash" => hash = Some(raw_value.trim().to_string()),
                "Subject" => subject_dn = Some(unquote(raw_value)),
                _ => {}
            }
        }

        let hash =
            hash.ok_or_else(|| ParseError::Malformed("entry is missing Hash".to_string()))?;
        let subject_dn = subject_dn
            .ok_or_else(|| ParseError::Malformed("entry is missing Subject".to_string()))?;
        if hash.is_empty() {
            return Err(ParseError::Malformed("entry has an empty Hash".to_string()));
        }
        let subject = Subject::parse(&subject_dn)
            .map_err(|_| ParseError::Malformed("entry has an invalid subject DN".to_string()))?;

        entries.push(CertificateEntry { subject, hash });
    }

    if entries.is_empty() {
        return Err(ParseError::Malformed(
            "header contains no certificate entries".to_string(),
        ));
    }
    Ok(entries)
}

/// Parser for one trust domain.
///
/// Both domains share this type; they differ only in the configured subject
/// pattern and the identity extractor.
#[derive(Debug, Clone)]
pub struct HeaderParser {
    domain: TrustDomain,
    pattern: SubjectPattern,
    extractor: IdentityExtractor,
}

impl HeaderParser {
    pub fn new(domain: TrustDomain, pattern: SubjectPattern, extractor: IdentityExtractor) -> Self {
        Self {
            domain,
            pattern,
            extractor,
        }
    }

    pub fn domain(&self) -> TrustDomain {
        self.domain
    }

    /// Parse the header and derive the identity of the first entry whose
    /// subject matches this domain's pattern, along with that entry's hash
    /// for the revocation lookup.
    pub fn parse(&self, header_value: &str) -> Result<(Identity, String), ParseError> {
        let entries = decode_header(header_value)?;
        for entry in &entries {
            if let Some(outcome) = match_subject(&entry.subject, &self.pattern) {
                let identity = self
                    .extractor
                    .identity(&entry.subject, outcome.captured.as_deref());
                return Ok((identity, entry.hash.clone()));
            }
        }
        Err(ParseError::NoMatch)
    }
}
