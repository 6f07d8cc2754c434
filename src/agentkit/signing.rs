//! HMAC-SHA256 request signing for the AgentKit OpenAPI.
//!
//! The scheme follows the SigV4 layout: a canonical request over the method,
//! query, four signed headers and the body hash is hashed into a string to
//! sign, which is signed with a key derived from the secret by chaining
//! HMACs over the date, region, service and the literal `request`.
//!
//! Signing is a pure function of its inputs, including the timestamp.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HMAC-SHA256";
const CONTENT_TYPE: &str = "application/json";
const SIGNED_HEADERS: [&str; 4] = ["host", "x-date", "x-content-sha256", "content-type"];

/// Everything the signature covers.
#[derive(Debug, Clone)]
pub struct SigningInput<'a> {
    pub method: &'a str,
    /// Host as sent in the `Host` header (with `:port` when non-default).
    pub host: &'a str,
    /// Encoded query string, see [`canonical_query`].
    pub query: &'a str,
    pub body: &'a [u8],
    pub access_key_id: &'a str,
    pub secret_access_key: &'a str,
    pub region: &'a str,
    pub service: &'a str,
    pub timestamp: DateTime<Utc>,
}

/// Headers to attach to the signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub x_date: String,
    pub x_content_sha256: String,
    pub content_type: &'static str,
    pub authorization: String,
}

impl SignedHeaders {
    /// Header name/value pairs, in the order they are applied.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("X-Date", self.x_date.as_str()),
            ("X-Content-Sha256", self.x_content_sha256.as_str()),
            ("Content-Type", self.content_type),
            ("Authorization", self.authorization.as_str()),
        ]
        .into_iter()
    }
}

/// Encode query parameters sorted by key, with spaces as `%20`.
pub fn canonical_query(params: &[(&str, &str)]) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(sorted)
        .finish()
        .replace('+', "%20")
}

/// Sign a request.
pub fn sign(input: &SigningInput<'_>) -> SignedHeaders {
    let date = input.timestamp.format("%Y%m%dT%H%M%SZ").to_string();
    let auth_date = &date[..8];
    let payload_hash = hex::encode(Sha256::digest(input.body));

    let canonical = canonical_request(input, &date, &payload_hash);
    let credential_scope = format!(
        "{auth_date}/{}/{}/request",
        input.region, input.service
    );
    let hashed_canonical = hex::encode(Sha256::digest(canonical.as_bytes()));
    let string_to_sign = [
        ALGORITHM,
        date.as_str(),
        credential_scope.as_str(),
        hashed_canonical.as_str(),
    ]
    .join("\n");

    let signing_key = derive_signing_key(
        input.secret_access_key,
        auth_date,
        input.region,
        input.service,
    );
    let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

    let authorization = format!(
        "{ALGORITHM} Credential={}/{credential_scope}, SignedHeaders={}, Signature={signature}",
        input.access_key_id,
        SIGNED_HEADERS.join(";"),
    );

    SignedHeaders {
        x_date: date,
        x_content_sha256: payload_hash,
        content_type: CONTENT_TYPE,
        authorization,
    }
}

/// Build the canonical request string.
///
/// The path is always `/`; the header block ends with an empty line.
pub fn canonical_request(input: &SigningInput<'_>, date: &str, payload_hash: &str) -> String {
    let headers = SIGNED_HEADERS
        .iter()
        .map(|name| {
            let value = match *name {
                "host" => input.host,
                "x-date" => date,
                "x-content-sha256" => payload_hash,
                _ => CONTENT_TYPE,
            };
            format!("{name}:{}", value.trim())
        })
        .collect::<Vec<_>>()
        .join("\n");
    let header_block = format!("{headers}\n");
    let signed_headers = SIGNED_HEADERS.join(";");

    [
        input.method,
        "/",
        input.query,
        header_block.as_str(),
        signed_headers.as_str(),
        payload_hash,
    ]
    .join("\n")
}

fn derive_signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(secret.as_bytes(), date.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
