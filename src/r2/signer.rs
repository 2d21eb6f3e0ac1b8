//! AWS Signature Version 4 signer for R2 requests
//!
//! The signer is pure computation: given a method, path, header set, payload
//! and timestamp it produces the `Authorization` header value. Timestamp
//! acquisition and all I/O live in the client, so fixed inputs always yield
//! the same signature.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

type HmacSha256 = Hmac<Sha256>;

/// Hex lookup table for zero-allocation percent encoding
static HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// Pre-computed SHA256 hash of an empty payload (DELETE and other body-less requests)
pub const EMPTY_PAYLOAD_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// R2 requests are always scoped to the literal `auto` region
const REGION: &str = "auto";
const SERVICE: &str = "s3";
const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// AWS Signature Version 4 signer
#[derive(Clone)]
pub struct SigV4Signer {
    access_key_id: String,
    /// Pre-computed "AWS4" + secret_key bytes, the root of the key derivation chain
    aws4_secret: Vec<u8>,
}

impl SigV4Signer {
    pub fn new(access_key_id: String, secret_access_key: &str) -> Self {
        Self {
            access_key_id,
            aws4_secret: format!("AWS4{}", secret_access_key).into_bytes(),
        }
    }

    /// Compute the `Authorization` header value for one request.
    ///
    /// `headers` must contain every header that participates in signing.
    /// Names are lowercased and sorted internally, so callers may supply them
    /// in any order or case. `timestamp` must be the same instant placed in
    /// the `x-amz-date` header; any skew breaks verification.
    pub fn authorization_header(
        &self,
        method: &str,
        path: &str,
        headers: &BTreeMap<String, String>,
        payload: &[u8],
        timestamp: DateTime<Utc>,
    ) -> String {
        let amz_date = format_amz_date(timestamp);
        let date_stamp = timestamp.format("%Y%m%d").to_string();

        let canonical: BTreeMap<String, &str> = headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.as_str()))
            .collect();

        let canonical_uri = uri_encode(path, false);
        // This core never signs query parameters
        let canonical_query = "";

        let mut canonical_headers = String::with_capacity(canonical.len() * 64);
        for (name, value) in &canonical {
            canonical_headers.push_str(name);
            canonical_headers.push(':');
            canonical_headers.push_str(value.trim());
            canonical_headers.push('\n');
        }

        let signed_headers = canonical
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(";");

        let payload_hash = payload_sha256(payload);

        // The canonical headers block keeps its trailing newline, so a blank
        // line separates it from the signed-headers list. The verifier hashes
        // this exact byte sequence.
        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            method, canonical_uri, canonical_query, canonical_headers, signed_headers, payload_hash
        );

        let credential_scope = format!("{}/{}/{}/aws4_request", date_stamp, REGION, SERVICE);
        let canonical_request_hash = hex::encode(Sha256::digest(canonical_request.as_bytes()));
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM, amz_date, credential_scope, canonical_request_hash
        );

        let signing_key = self.derive_signing_key(&date_stamp);
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

        format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, self.access_key_id, credential_scope, signed_headers, signature
        )
    }

    /// Derive the signing key for a date stamp (4 chained HMAC operations).
    ///
    /// Derived fresh on every call: the key only changes daily, but the four
    /// HMACs are cheap and the scope must never go stale across midnight UTC.
    fn derive_signing_key(&self, date_stamp: &str) -> [u8; 32] {
        let k_date = hmac_sha256(&self.aws4_secret, date_stamp.as_bytes());
        let k_region = hmac_sha256(&k_date, REGION.as_bytes());
        let k_service = hmac_sha256(&k_region, SERVICE.as_bytes());
        hmac_sha256(&k_service, b"aws4_request")
    }
}

/// ISO8601 basic timestamp used in `x-amz-date` and the string to sign
pub fn format_amz_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Hex-encoded SHA-256 of the payload.
///
/// A zero-length payload hashes to the well-known empty digest; the constant
/// avoids re-hashing for the common DELETE case.
pub fn payload_sha256(payload: &[u8]) -> String {
    if payload.is_empty() {
        EMPTY_PAYLOAD_SHA256.to_string()
    } else {
        hex::encode(Sha256::digest(payload))
    }
}

/// HMAC-SHA256 returning fixed-size array (no heap allocation)
fn hmac_sha256(key: &[u8], msg: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(msg);
    let result = mac.finalize().into_bytes();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// URI encode a string (RFC 3986) using the hex lookup table.
/// With `encode_slash` false, `/` is kept as a literal path separator.
pub fn uri_encode(s: &str, encode_slash: bool) -> String {
    let mut result = String::with_capacity(s.len() + 16);
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            b'/' if !encode_slash => {
                result.push('/');
            }
            _ => {
                result.push('%');
                result.push(HEX_UPPER[(byte >> 4) as usize] as char);
                result.push(HEX_UPPER[(byte & 0xf) as usize] as char);
            }
        }
    }
    result
}
