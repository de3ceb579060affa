//! Upload API request signing
//!
//! Upload API calls (upload, rename, destroy) are authenticated with a
//! signature instead of HTTP basic auth. The signature is a hex digest over
//! the request parameters sorted by name, serialised as `k=v` pairs joined
//! with `&`, with the API secret appended.
//!
//! Parameters with an empty value and the parameters the API never signs
//! (`file`, `api_key`, `resource_type`, `cloud_name`) are left out of the
//! string to sign.

use std::collections::BTreeMap;

use cloudfs_core::config::SignatureAlgorithm;
use sha1::{Digest, Sha1};
use sha2::Sha256;

/// Parameters that are sent with a request but never signed
const UNSIGNED_PARAMS: &[&str] = &["file", "api_key", "resource_type", "cloud_name"];

/// Builds the canonical `k=v&k=v` string for `params`
pub fn string_to_sign(params: &BTreeMap<&str, String>) -> String {
    params
        .iter()
        .filter(|(key, value)| !value.is_empty() && !UNSIGNED_PARAMS.contains(*key))
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Signs `params` with `api_secret`, returning the lowercase hex digest
pub fn sign(
    params: &BTreeMap<&str, String>,
    api_secret: &str,
    algorithm: SignatureAlgorithm,
) -> String {
    let payload = format!("{}{api_secret}", string_to_sign(params));
    match algorithm {
        SignatureAlgorithm::Sha1 => hex::encode(Sha1::digest(payload.as_bytes())),
        SignatureAlgorithm::Sha256 => hex::encode(Sha256::digest(payload.as_bytes())),
    }
}
