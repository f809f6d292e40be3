//! STS `GetCallerIdentity` over blocking HTTP.

use crate::config::StsConfig;
use crate::credentials::Credentials;
use crate::sigv4::{AuthorizationHeader, SigV4Signer, SIGV4_HANDLER};
use serde::Deserialize;
use std::time::Duration;
use stsproof_core::{
    content_length_handler, BoxError, CallerIdentity, IdentityClient, IdentityRequest,
    IdentityTransport, NamedHandler, TransportError,
};
use stsproof_types::{AUTHORIZATION, CONTENT_LENGTH, HOST};
use thiserror::Error;
use url::Url;

/// Name of the build step asking STS for a JSON response.
pub const ACCEPT_JSON_HANDLER: &str = "protocol.accept-json";

/// Errors that can occur when constructing an [`StsClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configured endpoint is not a valid URL.
    #[error("invalid sts endpoint `{endpoint}`: {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },

    /// The configured endpoint has no host.
    #[error("sts endpoint `{0}` has no host")]
    EndpointWithoutHost(String),

    /// The HTTP client could not be built.
    #[error("failed to build http client: {0}")]
    Http(#[from] reqwest::Error),
}

/// STS client usable on both sides of the protocol.
///
/// As an [`IdentityClient`] it builds requests that sign themselves with the
/// configured credentials. As an [`IdentityTransport`] it posts requests to
/// the endpoint and decodes the caller identity.
#[derive(Debug)]
pub struct StsClient {
    endpoint: Url,
    host: String,
    signer: Option<SigV4Signer>,
    http: reqwest::blocking::Client,
}

impl StsClient {
    /// Creates a client that signs with `credentials`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the endpoint is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: &StsConfig, credentials: Option<Credentials>) -> Result<Self, ClientError> {
        let signer = credentials.map(|credentials| SigV4Signer::new(credentials, &config.region));
        Self::with_signer(config, signer)
    }

    /// Creates a client around an explicit signer.
    ///
    /// # Errors
    ///
    /// Same as [`StsClient::new`].
    pub fn with_signer(config: &StsConfig, signer: Option<SigV4Signer>) -> Result<Self, ClientError> {
        let endpoint = Url::parse(&config.endpoint).map_err(|source| ClientError::InvalidEndpoint {
            endpoint: config.endpoint.clone(),
            source,
        })?;
        let host = authority(&endpoint)
            .ok_or_else(|| ClientError::EndpointWithoutHost(config.endpoint.clone()))?;

        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            endpoint,
            host,
            signer,
            http,
        })
    }

    /// The endpoint requests are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// `host[:port]` as the transport will send it in the `Host` header.
fn authority(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

fn accept_json_handler() -> NamedHandler {
    NamedHandler::new(ACCEPT_JSON_HANDLER, |request: &mut IdentityRequest| {
        request.headers_mut().set("Accept", "application/json");
        Ok(())
    })
}

fn no_credentials_handler() -> NamedHandler {
    NamedHandler::new(SIGV4_HANDLER, |_: &mut IdentityRequest| -> Result<(), BoxError> {
        Err("no valid credential sources found".into())
    })
}

impl IdentityClient for StsClient {
    fn identity_request(&self) -> IdentityRequest {
        let mut request = IdentityRequest::new(self.endpoint.as_str(), self.host.as_str());
        request
            .build_handlers_mut()
            .push_back_named(accept_json_handler());

        let sign = request.sign_handlers_mut();
        sign.push_back_named(content_length_handler());
        match &self.signer {
            Some(signer) => sign.push_back_named(signer.handler()),
            None => sign.push_back_named(no_credentials_handler()),
        }

        request
    }
}

impl IdentityTransport for StsClient {
    fn send(&self, mut request: IdentityRequest) -> Result<CallerIdentity, TransportError> {
        request.sign()?;

        if let Some(auth) = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| AuthorizationHeader::parse(value).ok())
        {
            tracing::debug!(
                endpoint = %request.url(),
                access_key_id = %auth.access_key_id,
                region = %auth.region,
                "sending identity-check request"
            );
        }

        let method = reqwest::Method::from_bytes(request.method().as_bytes())
            .map_err(|e| TransportError::Network(Box::new(e)))?;
        let mut builder = self.http.request(method, request.url());
        for (name, value) in request.headers().iter() {
            // reqwest derives both from the URL and body.
            if name.eq_ignore_ascii_case(HOST) || name.eq_ignore_ascii_case(CONTENT_LENGTH) {
                continue;
            }
            builder = builder.header(name, value);
        }

        let response = builder
            .body(request.body().to_owned())
            .send()
            .map_err(|e| TransportError::Network(Box::new(e)))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| TransportError::Network(Box::new(e)))?;

        tracing::debug!(status = status.as_u16(), "identity provider responded");

        if !status.is_success() {
            return Err(provider_error(status.as_u16(), &body));
        }
        decode_identity(&body)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetCallerIdentityEnvelope {
    get_caller_identity_response: GetCallerIdentityResponse,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetCallerIdentityResponse {
    get_caller_identity_result: CallerIdentity,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorBody {
    code: String,
    #[serde(default)]
    message: String,
}

fn decode_identity(body: &str) -> Result<CallerIdentity, TransportError> {
    serde_json::from_str::<GetCallerIdentityEnvelope>(body)
        .map(|envelope| envelope.get_caller_identity_response.get_caller_identity_result)
        .map_err(|e| TransportError::Decode(e.to_string()))
}

fn provider_error(status: u16, body: &str) -> TransportError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => TransportError::Provider {
            status,
            code: envelope.error.code,
            message: envelope.error.message,
        },
        Err(_) => TransportError::Provider {
            status,
            code: "Unknown".to_string(),
            message: body.chars().take(256).collect(),
        },
    }
}
