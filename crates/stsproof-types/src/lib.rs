//! Shared wire contract for the stsproof caller-identity protocol.
//!
//! This crate holds the only value that crosses the trust boundary between
//! the asserting side and the verifying side ([`IdentityTuple`]), the
//! identity the provider hands back ([`CallerIdentity`]), and the closed
//! description of the identity-check request shape that both sides must
//! agree on byte for byte.
//!
//! The request shape lives here once. A signature is only valid for the
//! exact request it was computed over, so the extractor and the verifier both
//! read [`IDENTITY_CHECK_HEADERS`] instead of keeping their own copies.

use serde::{Deserialize, Serialize};

/// Header carrying the signed authorization value.
pub const AUTHORIZATION: &str = "Authorization";

/// Header carrying the signing timestamp.
pub const DATE: &str = "X-Amz-Date";

/// Header carrying the request body media type.
pub const CONTENT_TYPE: &str = "Content-Type";

/// Header carrying the request body length.
pub const CONTENT_LENGTH: &str = "Content-Length";

/// Header carrying the endpoint authority.
pub const HOST: &str = "Host";

/// Media type the identity-check endpoint signs over.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

/// HTTP method of the identity-check request.
pub const IDENTITY_CHECK_METHOD: &str = "POST";

/// Body of the identity-check request.
///
/// `GetCallerIdentity` takes no parameters, so the body is always the bare
/// action envelope.
pub const IDENTITY_CHECK_BODY: &str = "Action=GetCallerIdentity&Version=2011-06-15";

/// The two values extracted from a signed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TupleField {
    /// The `Authorization` header value.
    Authorization,
    /// The `X-Amz-Date` header value.
    Date,
}

/// Where the value of a header in the identity-check request comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderSource {
    /// Transferred inside the [`IdentityTuple`].
    Tuple(TupleField),
    /// A constant both sides set identically.
    Fixed(&'static str),
    /// Derived from the request itself (body length, endpoint authority).
    Computed,
}

/// One entry of the identity-check header set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderRule {
    /// Canonical header name.
    pub name: &'static str,
    /// Origin of the header value.
    pub source: HeaderSource,
}

/// The complete header set of the identity-check request.
///
/// Every header the signature covers appears here, together with the
/// `Authorization` header that carries the signature itself.
pub const IDENTITY_CHECK_HEADERS: [HeaderRule; 5] = [
    HeaderRule {
        name: AUTHORIZATION,
        source: HeaderSource::Tuple(TupleField::Authorization),
    },
    HeaderRule {
        name: DATE,
        source: HeaderSource::Tuple(TupleField::Date),
    },
    HeaderRule {
        name: CONTENT_TYPE,
        source: HeaderSource::Fixed(FORM_CONTENT_TYPE),
    },
    HeaderRule {
        name: CONTENT_LENGTH,
        source: HeaderSource::Computed,
    },
    HeaderRule {
        name: HOST,
        source: HeaderSource::Computed,
    },
];

/// Rules whose values travel inside the tuple.
pub fn transferred_headers() -> impl Iterator<Item = (&'static str, TupleField)> {
    IDENTITY_CHECK_HEADERS
        .iter()
        .filter_map(|rule| match rule.source {
            HeaderSource::Tuple(field) => Some((rule.name, field)),
            _ => None,
        })
}

/// Rules the verifier sets explicitly on a rebuilt request.
///
/// Yields the tuple-sourced headers and the fixed headers; computed headers
/// are left to the request pipeline and the transport.
pub fn injected_headers() -> impl Iterator<Item = HeaderRule> {
    IDENTITY_CHECK_HEADERS
        .iter()
        .copied()
        .filter(|rule| !matches!(rule.source, HeaderSource::Computed))
}

/// Lowercased, sorted names of the headers the signature must cover.
///
/// This is the `SignedHeaders` list a valid authorization value carries:
/// `content-length;content-type;host;x-amz-date`.
pub fn signed_header_names() -> Vec<String> {
    let mut names: Vec<String> = IDENTITY_CHECK_HEADERS
        .iter()
        .filter(|rule| rule.name != AUTHORIZATION)
        .map(|rule| rule.name.to_ascii_lowercase())
        .collect();
    names.sort();
    names
}

/// Proof of identity transferred from the asserting side to the verifier.
///
/// Both strings are inputs to a signature check and must be carried
/// verbatim. The tuple holds no request, connection or credential state and
/// is safe to serialize as plain text.
///
/// Example values:
///
/// ```text
/// authorization: AWS4-HMAC-SHA256 Credential=AKIAJW.../20190221/us-east-1/sts/aws4_request, SignedHeaders=content-length;content-type;host;x-amz-date, Signature=abcd...
/// date:          20190221T211905Z
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IdentityTuple {
    /// The signed `Authorization` header value.
    pub authorization: String,
    /// The `X-Amz-Date` signing timestamp.
    pub date: String,
}

impl IdentityTuple {
    /// Creates a tuple from its two header values.
    pub fn new(authorization: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            authorization: authorization.into(),
            date: date.into(),
        }
    }

    /// Returns the value held for `field`.
    pub fn field(&self, field: TupleField) -> &str {
        match field {
            TupleField::Authorization => &self.authorization,
            TupleField::Date => &self.date,
        }
    }
}

/// The identity the provider reports for a verified request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    /// Account that owns the signing principal.
    #[serde(rename = "Account")]
    pub account: String,
    /// ARN of the signing principal.
    #[serde(rename = "Arn")]
    pub arn: String,
    /// Unique identifier of the signing principal.
    #[serde(rename = "UserId")]
    pub user_id: String,
}
