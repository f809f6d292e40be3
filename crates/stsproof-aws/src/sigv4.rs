//! AWS Signature Version 4 for the identity-check request.
//!
//! Only what STS `GetCallerIdentity` needs: a single POST with no query
//! string on the root path, signed over the fixed header set from
//! [`stsproof_types::signed_header_names`].

use crate::credentials::Credentials;
use chrono::{DateTime, NaiveDateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use stsproof_core::{IdentityRequest, NamedHandler};
use stsproof_types::{signed_header_names, AUTHORIZATION, DATE};
use thiserror::Error;
use url::Url;

/// Signing algorithm identifier.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Service name in the credential scope.
pub const SERVICE: &str = "sts";

/// Name of the signing step in a request pipeline.
pub const SIGV4_HANDLER: &str = "sigv4.sign";

/// Format of the `X-Amz-Date` header.
pub const AMZ_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

const SCOPE_TERMINATOR: &str = "aws4_request";

type HmacSha256 = Hmac<Sha256>;

/// Errors raised while signing a request.
#[derive(Debug, Error)]
pub enum SigningError {
    /// The request URL could not be parsed.
    #[error("invalid request url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A header the signature must cover is missing from the request.
    #[error("request is missing signed header `{0}`")]
    MissingHeader(String),
}

/// Errors raised while parsing an `Authorization` value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthorizationParseError {
    #[error("authorization does not use AWS4-HMAC-SHA256")]
    Algorithm,
    #[error("authorization is missing `{0}`")]
    MissingComponent(&'static str),
    #[error("malformed credential scope: {0}")]
    Scope(String),
}

/// Errors raised while parsing an `X-Amz-Date` value.
#[derive(Debug, Error)]
#[error("invalid x-amz-date `{value}`: {source}")]
pub struct AmzDateError {
    value: String,
    #[source]
    source: chrono::ParseError,
}

/// Formats `at` as an `X-Amz-Date` value.
pub fn format_amz_date(at: DateTime<Utc>) -> String {
    at.format(AMZ_DATE_FORMAT).to_string()
}

/// Parses an `X-Amz-Date` value.
///
/// # Errors
///
/// Returns [`AmzDateError`] if `value` is not `YYYYMMDDTHHMMSSZ`.
pub fn parse_amz_date(value: &str) -> Result<DateTime<Utc>, AmzDateError> {
    NaiveDateTime::parse_from_str(value, AMZ_DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|source| AmzDateError {
            value: value.to_string(),
            source,
        })
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC key length is valid");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Collapses runs of whitespace and trims, as SigV4 canonical headers require.
fn canonical_value(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The canonical form of a request that SigV4 hashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    method: String,
    path: String,
    query: String,
    headers: Vec<(String, String)>,
    payload_hash: String,
}

impl CanonicalRequest {
    /// Builds the canonical request.
    ///
    /// Header names are lowercased, values trimmed with inner whitespace
    /// collapsed, and the list sorted by name. `query` must already be in
    /// canonical (sorted, encoded) form.
    pub fn new<I, K, V>(method: &str, path: &str, query: &str, headers: I, body: &[u8]) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut headers: Vec<(String, String)> = headers
            .into_iter()
            .map(|(name, value)| {
                (
                    name.as_ref().to_ascii_lowercase(),
                    canonical_value(value.as_ref()),
                )
            })
            .collect();
        headers.sort();

        Self {
            method: method.to_string(),
            path: if path.is_empty() { "/" } else { path }.to_string(),
            query: query.to_string(),
            headers,
            payload_hash: sha256_hex(body),
        }
    }

    /// The `SignedHeaders` list: lowercased names joined by `;`.
    pub fn signed_headers(&self) -> String {
        self.headers
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(";")
    }

    /// The canonical request text.
    pub fn render(&self) -> String {
        let mut out = format!("{}\n{}\n{}\n", self.method, self.path, self.query);
        for (name, value) in &self.headers {
            out.push_str(name);
            out.push(':');
            out.push_str(value);
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.signed_headers());
        out.push('\n');
        out.push_str(&self.payload_hash);
        out
    }

    /// Hex SHA-256 of [`CanonicalRequest::render`].
    pub fn digest(&self) -> String {
        sha256_hex(self.render().as_bytes())
    }
}

/// Derives the SigV4 signing key for a day, region and service.
pub fn derive_signing_key(secret: &str, day: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{secret}").as_bytes(), day.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, SCOPE_TERMINATOR.as_bytes())
}

/// Computes the hex signature of `canonical` stamped at `amz_date`.
///
/// The credential-scope day is taken from the first eight characters of
/// `amz_date`.
pub fn signature(
    secret: &str,
    amz_date: &str,
    region: &str,
    service: &str,
    canonical: &CanonicalRequest,
) -> String {
    let day = amz_date.get(..8).unwrap_or(amz_date);
    let scope = format!("{day}/{region}/{service}/{SCOPE_TERMINATOR}");
    let string_to_sign = format!("{ALGORITHM}\n{amz_date}\n{scope}\n{}", canonical.digest());
    let key = derive_signing_key(secret, day, region, service);
    hex::encode(hmac_sha256(&key, string_to_sign.as_bytes()))
}

/// A parsed SigV4 `Authorization` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationHeader {
    pub access_key_id: String,
    /// Credential-scope day, `YYYYMMDD`.
    pub day: String,
    pub region: String,
    pub service: String,
    pub signed_headers: Vec<String>,
    pub signature: String,
}

impl AuthorizationHeader {
    /// Parses `AWS4-HMAC-SHA256 Credential=..., SignedHeaders=..., Signature=...`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizationParseError`] when the algorithm, any of the
    /// three components, or the credential scope is malformed.
    pub fn parse(value: &str) -> Result<Self, AuthorizationParseError> {
        let rest = value
            .strip_prefix(ALGORITHM)
            .and_then(|rest| rest.strip_prefix(' '))
            .ok_or(AuthorizationParseError::Algorithm)?;

        let mut credential = None;
        let mut signed_headers = None;
        let mut signature = None;
        for part in rest.split(',').map(str::trim) {
            if let Some(v) = part.strip_prefix("Credential=") {
                credential = Some(v);
            } else if let Some(v) = part.strip_prefix("SignedHeaders=") {
                signed_headers = Some(v);
            } else if let Some(v) = part.strip_prefix("Signature=") {
                signature = Some(v);
            }
        }

        let credential = credential.ok_or(AuthorizationParseError::MissingComponent("Credential"))?;
        let signed_headers =
            signed_headers.ok_or(AuthorizationParseError::MissingComponent("SignedHeaders"))?;
        let signature = signature.ok_or(AuthorizationParseError::MissingComponent("Signature"))?;

        let scope: Vec<&str> = credential.split('/').collect();
        let [access_key_id, day, region, service, terminator] = scope.as_slice() else {
            return Err(AuthorizationParseError::Scope(credential.to_string()));
        };
        if *terminator != SCOPE_TERMINATOR || access_key_id.is_empty() || day.len() != 8 {
            return Err(AuthorizationParseError::Scope(credential.to_string()));
        }

        Ok(Self {
            access_key_id: access_key_id.to_string(),
            day: day.to_string(),
            region: region.to_string(),
            service: service.to_string(),
            signed_headers: signed_headers.split(';').map(str::to_string).collect(),
            signature: signature.to_string(),
        })
    }
}

impl fmt::Display for AuthorizationHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{ALGORITHM} Credential={}/{}/{}/{}/{SCOPE_TERMINATOR}, SignedHeaders={}, Signature={}",
            self.access_key_id,
            self.day,
            self.region,
            self.service,
            self.signed_headers.join(";"),
            self.signature
        )
    }
}

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Signs identity-check requests with static credentials.
#[derive(Clone)]
pub struct SigV4Signer {
    credentials: Credentials,
    region: String,
    clock: Clock,
}

impl SigV4Signer {
    /// Creates a signer for `region` using the system clock.
    pub fn new(credentials: Credentials, region: impl Into<String>) -> Self {
        Self {
            credentials,
            region: region.into(),
            clock: Arc::new(Utc::now),
        }
    }

    /// Replaces the clock used to stamp `X-Amz-Date`.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Signing region.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Stamps `X-Amz-Date` with `at` and sets `Authorization`.
    ///
    /// The signature covers exactly the identity-check header set; any other
    /// header on the request is left unsigned.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError`] if the request URL is invalid or a covered
    /// header is missing.
    pub fn sign_at(
        &self,
        request: &mut IdentityRequest,
        at: DateTime<Utc>,
    ) -> Result<(), SigningError> {
        let amz_date = format_amz_date(at);
        request.headers_mut().remove(AUTHORIZATION);
        request.headers_mut().set(DATE, amz_date.clone());

        let url = Url::parse(request.url())?;
        let mut covered = Vec::new();
        for name in signed_header_names() {
            let value = request
                .headers()
                .get(&name)
                .ok_or_else(|| SigningError::MissingHeader(name.clone()))?;
            covered.push((name, value.to_string()));
        }

        let canonical = CanonicalRequest::new(
            request.method(),
            url.path(),
            url.query().unwrap_or_default(),
            covered,
            request.body().as_bytes(),
        );
        let header = AuthorizationHeader {
            access_key_id: self.credentials.access_key_id().to_string(),
            day: amz_date[..8].to_string(),
            region: self.region.clone(),
            service: SERVICE.to_string(),
            signed_headers: canonical
                .signed_headers()
                .split(';')
                .map(str::to_string)
                .collect(),
            signature: signature(
                self.credentials.secret_access_key(),
                &amz_date,
                &self.region,
                SERVICE,
                &canonical,
            ),
        };

        tracing::debug!(
            access_key_id = %header.access_key_id,
            region = %header.region,
            amz_date = %amz_date,
            "signed identity-check request"
        );
        request.headers_mut().set(AUTHORIZATION, header.to_string());
        Ok(())
    }

    /// Pipeline step that signs at the current clock time.
    pub fn handler(&self) -> NamedHandler {
        let signer = self.clone();
        NamedHandler::new(SIGV4_HANDLER, move |request: &mut IdentityRequest| {
            signer.sign_at(request, (signer.clock)())?;
            Ok(())
        })
    }
}

impl fmt::Debug for SigV4Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigV4Signer")
            .field("credentials", &self.credentials)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}
