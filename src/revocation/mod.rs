//! Revoked-certificate tracking
//!
//! The authoritative revocation list lives in an external store. A background
//! loader polls it and atomically republishes the in-memory set; request
//! handlers check membership lock-free. On refresh failure the last
//! known-good set is retained.

pub mod cache;
pub mod loader;
pub mod source;

pub use cache::{RevocationCache, RevocationSet};
pub use loader::RevocationLoader;
pub use source::{
    parse_revocation_blob, FileRevocationSource, HttpRevocationSource, RevocationSource,
};
