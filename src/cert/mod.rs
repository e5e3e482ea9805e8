//! Certificate subject handling
//!
//! This module covers everything the hydrator needs to know about the
//! certificates forwarded by the TLS-terminating proxy: parsing Subject
//! Distinguished Names, matching them against per-trust-domain patterns,
//! decoding the forwarded-certificate header, and deriving a caller
//! identity from a matched subject.

pub mod header;
pub mod identity;
pub mod subject;

pub use header::{CertificateEntry, HeaderParser, ParseError};
pub use identity::{ConsumerMapping, ConsumerType, Identity, IdentityExtractor};
pub use subject::{MatchOutcome, OuPattern, PatternError, Subject, SubjectPattern};

use serde::Serialize;

/// Origin of a client certificate, each with its own subject-matching rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustDomain {
    /// Certificates issued by the internally administered CA.
    Internal,
    /// Certificates issued by an external, trusted issuer.
    External,
}

impl std::fmt::Display for TrustDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrustDomain::Internal => write!(f, "internal"),
            TrustDomain::External => write!(f, "external"),
        }
    }
}

/// Split `input` on `separator`, ignoring separators inside double-quoted
/// sections. A backslash escapes the following character.
pub(crate) fn split_outside_quotes(input: &str, separator: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for c in input.chars() {
        if escaped {
            current.push('\\');
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            c if c == separator && !in_quotes => {
                parts.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }
    if escaped {
        current.push('\\');
    }
    parts.push(current);
    parts
}

/// Remove surrounding double quotes and resolve backslash escapes.
pub(crate) fn unquote(value: &str) -> String {
    let trimmed = value.trim();
    let inner = trimmed
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(trimmed);

    let mut out = String::with_capacity(inner.len());
    let mut escaped = false;
    for c in inner.chars() {
        if escaped {
            out.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else {
            out.push(c);
        }
    }
    out
}
