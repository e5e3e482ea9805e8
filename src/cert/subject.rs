//! Subject Distinguished Name parsing and pattern matching.
//!
//! A subject is matched against exactly one pattern per trust domain.
//! Internal-domain patterns are fully literal; external-domain patterns may
//! carry a single `*` segment in the Organizational Unit list that captures
//! the variable consumer segment. Matching is case-sensitive exact equality,
//! the certificate issuance process is assumed to control casing.

use thiserror::Error;

use super::{split_outside_quotes, unquote};

/// Parsed Subject Distinguished Name.
///
/// Attribute order within the OU list is preserved as it appears in the DN;
/// for the scalar attributes the first occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subject {
    pub country: Option<String>,
    pub organization: Option<String>,
    pub organizational_units: Vec<String>,
    pub locality: Option<String>,
    pub province: Option<String>,
    pub common_name: Option<String>,
}

/// Errors produced while parsing a Subject DN.
#[derive(Debug, Error)]
pub enum SubjectError {
    #[error("subject DN is empty")]
    Empty,
    #[error("malformed DN attribute: {0:?}")]
    MalformedAttribute(String),
}

impl Subject {
    /// Parse an RFC 2253 style DN string such as
    /// `C=DE,O=Org,OU=Region,OU=consumer-42,CN=some-name`.
    ///
    /// Values may be double-quoted to protect embedded commas; unknown
    /// attribute types are ignored.
    pub fn parse(dn: &str) -> Result<Self, SubjectError> {
        if dn.trim().is_empty() {
            return Err(SubjectError::Empty);
        }

        let mut subject = Subject::default();
        let mut seen_any = false;

        for part in split_outside_quotes(dn, ',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| SubjectError::MalformedAttribute(part.to_string()))?;
            let key = key.trim();
            let value = unquote(value);

            seen_any = true;
            match key.to_ascii_uppercase().as_str() {
                "C" => subject.country.get_or_insert(value),
                "O" => subject.organization.get_or_insert(value),
                "OU" => {
                    subject.organizational_units.push(value);
                    continue;
                }
                "L" => subject.locality.get_or_insert(value),
                "ST" => subject.province.get_or_insert(value),
                "CN" => subject.common_name.get_or_insert(value),
                _ => continue,
            };
        }

        if !seen_any {
            return Err(SubjectError::Empty);
        }
        Ok(subject)
    }

    /// Canonical string form used to compare subjects against configured
    /// consumer mappings. Attributes are emitted in a fixed order so that two
    /// DNs with the same content always normalize identically.
    pub fn normalized(&self) -> String {
        let mut parts = Vec::new();
        if let Some(ref c) = self.country {
            parts.push(format!("C={}", c));
        }
        if let Some(ref o) = self.organization {
            parts.push(format!("O={}", o));
        }
        for ou in &self.organizational_units {
            parts.push(format!("OU={}", ou));
        }
        if let Some(ref l) = self.locality {
            parts.push(format!("L={}", l));
        }
        if let Some(ref st) = self.province {
            parts.push(format!("ST={}", st));
        }
        if let Some(ref cn) = self.common_name {
            parts.push(format!("CN={}", cn));
        }
        parts.join(", ")
    }
}

/// Errors produced while building a subject pattern from configuration.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("organizational unit pattern is empty")]
    EmptyOuPattern,
    #[error("organizational unit pattern contains more than one wildcard segment")]
    MultipleWildcards,
    #[error("internal subject pattern must not contain a wildcard segment")]
    WildcardNotAllowed,
}

/// Organizational Unit portion of a subject pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OuPattern {
    /// Every OU segment must match exactly, in order.
    Literal(Vec<String>),
    /// Exactly one `*` segment captures the variable consumer segment;
    /// segments before and after it must match exactly.
    Template {
        prefix: Vec<String>,
        suffix: Vec<String>,
    },
}

impl OuPattern {
    /// Parse a comma-separated OU template, e.g. `Region,*` or `OrgUnit`.
    /// At most one segment may be the wildcard `*`.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let segments: Vec<String> = pattern
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if segments.is_empty() {
            return Err(PatternError::EmptyOuPattern);
        }

        let wildcards = segments.iter().filter(|s| s.as_str() == "*").count();
        match wildcards {
            0 => Ok(OuPattern::Literal(segments)),
            1 => {
                let pos = segments.iter().position(|s| s == "*").unwrap_or(0);
                Ok(OuPattern::Template {
                    prefix: segments[..pos].to_vec(),
                    suffix: segments[pos + 1..].to_vec(),
                })
            }
            _ => Err(PatternError::MultipleWildcards),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, OuPattern::Literal(_))
    }
}

/// A configured template over DN attributes for one trust domain.
#[derive(Debug, Clone)]
pub struct SubjectPattern {
    pub country: String,
    pub organization: String,
    pub organizational_unit: OuPattern,
    pub locality: Option<String>,
    pub province: Option<String>,
}

/// Result of a successful subject match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Value of the wildcard OU segment, if the pattern has one.
    pub captured: Option<String>,
}

/// Match a subject against a pattern.
///
/// Literal fields require exact string equality; a mismatch on any of them is
/// an immediate non-match. A wildcard OU segment accepts the corresponding
/// subject value as-is and returns it as the captured value. Pure and
/// deterministic.
pub fn match_subject(subject: &Subject, pattern: &SubjectPattern) -> Option<MatchOutcome> {
    if subject.country.as_deref() != Some(pattern.country.as_str()) {
        return None;
    }
    if subject.organization.as_deref() != Some(pattern.organization.as_str()) {
        return None;
    }
    if let Some(ref locality) = pattern.locality {
        if subject.locality.as_deref() != Some(locality.as_str()) {
            return None;
        }
    }
    if let Some(ref province) = pattern.province {
        if subject.province.as_deref() != Some(province.as_str()) {
            return None;
        }
    }

    let ous = &subject.organizational_units;
    match &pattern.organizational_unit {
        OuPattern::Literal(expected) => {
            if ous == expected {
                Some(MatchOutcome { captured: None })
            } else {
                None
            }
        }
        OuPattern::Template { prefix, suffix } => {
            if ous.len() != prefix.len() + suffix.len() + 1 {
                return None;
            }
            if ous[..prefix.len()] != prefix[..] {
                return None;
            }
            if ous[prefix.len() + 1..] != suffix[..] {
                return None;
            }
            Some(MatchOutcome {
                captured: Some(ous[prefix.len()].clone()),
            })
        }
    }
}
