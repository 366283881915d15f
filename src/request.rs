//! Turns request headers and query strings into engine inputs.

use base64::{Engine, engine::general_purpose::STANDARD};
use xitca_web::http::{HeaderMap, header::AUTHORIZATION};

use crate::{RequestMetadata, authorizer::Credentials};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Collects request metadata from the query string and from headers starting
/// with `prefix` (compared case-insensitively). Keys are lower-cased; header
/// values win over query parameters with the same key. Only the first value
/// of a repeated key is kept.
pub fn extract_metadata(headers: &HeaderMap, query: Option<&str>, prefix: &str) -> RequestMetadata {
    let mut metadata = RequestMetadata::new();

    for (key, value) in query.map(parse_query).unwrap_or_default() {
        metadata.entry(key.to_lowercase()).or_insert(value);
    }

    let prefix = prefix.to_ascii_lowercase();
    let mut from_headers = RequestMetadata::new();
    for (name, value) in headers {
        // header names are stored lower-cased
        let Some(key) = name.as_str().strip_prefix(prefix.as_str()) else {
            continue;
        };
        if key.is_empty() {
            continue;
        }
        if let Ok(value) = value.to_str() {
            from_headers
                .entry(key.to_string())
                .or_insert_with(|| value.to_string());
        }
    }
    metadata.extend(from_headers);

    metadata
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            let k = urlencoding::decode(&k.replace('+', " ")).ok()?.into_owned();
            let v = urlencoding::decode(&v.replace('+', " ")).ok()?.into_owned();
            (!k.is_empty()).then_some((k, v))
        })
        .collect()
}

pub fn extract_credentials(headers: &HeaderMap) -> Credentials {
    let api_key = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let basic = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_basic_auth);

    Credentials { api_key, basic }
}

/// Decodes an `Authorization: Basic <base64(user:password)>` value.
pub fn parse_basic_auth(header: &str) -> Option<(String, String)> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}
