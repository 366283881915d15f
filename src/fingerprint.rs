//! Fingerprint Calculator.
//!
//! The digest covers `version`, `routes`, `middlewares` and `metadata` only.
//! All mappings involved are key-sorted, so the canonical JSON encoding does
//! not depend on insertion order.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::{Metadata, Value, bundle::ConfigBundle};

#[derive(Serialize)]
struct Canonical<'a> {
    version: &'a str,
    routes: &'a [Value],
    middlewares: &'a [Value],
    metadata: &'a Metadata,
}

/// Lowercase hex SHA-256 of the bundle's canonical encoding.
pub fn fingerprint(bundle: &ConfigBundle) -> Result<String, serde_json::Error> {
    let canonical = Canonical {
        version: &bundle.version,
        routes: &bundle.routes,
        middlewares: &bundle.middlewares,
        metadata: &bundle.metadata,
    };

    let mut hasher = Sha256::new();
    serde_json::to_writer(&mut hasher, &canonical)?;
    Ok(hex::encode(hasher.finalize()))
}
